pub mod id;
pub mod types;

pub use types::*;
