//! Capability seam between the loaders and the inference engine.
//!
//! The loaders only ever talk to these two traits, so the real llama.cpp
//! backend and the in-memory fake in [`crate::mock`] are interchangeable.

use crate::pipeline::{GenerationOptions, GenerationOutput, GenerationRequest, PipelineSpec};

/// A ready-to-call text-generation pipeline bound to one model and device.
pub trait TextGenerationPipeline {
    fn generate(
        &mut self,
        request: &GenerationRequest,
        options: &GenerationOptions,
    ) -> anyhow::Result<GenerationOutput>;
}

/// Builds text-generation pipelines from a [`PipelineSpec`].
pub trait PipelineFactory {
    type Pipeline: TextGenerationPipeline;

    fn build(&self, spec: PipelineSpec) -> anyhow::Result<Self::Pipeline>;
}

impl<P: TextGenerationPipeline + ?Sized> TextGenerationPipeline for Box<P> {
    fn generate(
        &mut self,
        request: &GenerationRequest,
        options: &GenerationOptions,
    ) -> anyhow::Result<GenerationOutput> {
        (**self).generate(request, options)
    }
}
