mod backend;
mod backends;
mod result;

pub use backend::ObjectDetector;
pub use backends::{ScriptedDetector, StubDetector};
pub use result::{BoundingBox, Detection};
