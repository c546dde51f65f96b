pub mod backend;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod placement;
pub mod resolve;

pub use error::InferenceError;
pub use pipeline::{LlamaPipeline, LlamaPipelineFactory};
