pub mod scripted;
pub mod stub;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use scripted::ScriptedClassifier;
pub use stub::StubClassifier;

#[cfg(feature = "backend-tract")]
pub use tract::TractClassifier;
