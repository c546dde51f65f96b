use thiserror::Error;

/// Failures raised by the llama.cpp side of the pipeline.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Unsupported device: {0}")]
    UnsupportedDevice(String),

    #[error("Failed to init llama backend: {0}")]
    BackendInit(String),

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Failed to create context: {0}")]
    Context(String),

    #[error("Tokenization failed: {0}")]
    Tokenize(String),

    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("Prompt of {prompt_tokens} tokens plus {max_new_tokens} new tokens exceeds context of {n_ctx}")]
    ContextOverflow {
        prompt_tokens: usize,
        max_new_tokens: u32,
        n_ctx: u32,
    },

    #[error("Chat template error: {0}")]
    Template(String),
}
