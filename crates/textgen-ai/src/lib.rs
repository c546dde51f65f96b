pub mod llm;
pub mod loaders;

pub use llm::{InferenceError, LlamaPipeline, LlamaPipelineFactory};
pub use loaders::{load_gemma, load_gemma_default, load_gpt_oss, load_gpt_oss_default};
