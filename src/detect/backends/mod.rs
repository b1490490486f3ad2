pub mod scripted;
pub mod stub;

pub use scripted::{ScriptedDetector, ScriptedFrame};
pub use stub::StubDetector;
