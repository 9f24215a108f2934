mod classify;
mod clean;
mod diff;
mod segment;

pub use classify::{LineClass, LineClassifier};
pub use clean::clean_response;
pub use diff::{DiffExtractor, Extraction, Strategy, DEFAULT_MIN_CONTENT_CHARS};
pub use segment::MessageSegmenter;
