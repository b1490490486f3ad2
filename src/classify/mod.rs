mod backends;
mod classifier;
mod pipeline;

pub use backends::{ScriptedClassifier, StubClassifier};
#[cfg(feature = "backend-tract")]
pub use backends::TractClassifier;
pub use classifier::{Classifier, LabelCandidate};
pub use pipeline::ClassificationPipeline;
