pub mod config;
pub mod interfaces;
pub mod lifecycle;
pub mod pipeline;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use interfaces::{PipelineFactory, TextGenerationPipeline};
pub use pipeline::{
    ChatMessage, DeviceSpec, GeneratedSequence, GeneratedText, GenerationOptions,
    GenerationOutput, GenerationRequest, ModelId, PipelineSpec, Precision, Role, Task,
};
