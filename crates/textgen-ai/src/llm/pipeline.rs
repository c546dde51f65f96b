//! llama.cpp implementation of the pipeline capabilities.

use std::path::Path;

use anyhow::Result;
use textgen_core::config::InferenceConfig;
use textgen_core::{
    ChatMessage, GeneratedText, GenerationOptions, GenerationOutput, GenerationRequest,
    PipelineFactory, PipelineSpec, TextGenerationPipeline,
};

use super::backend::{LlamaCppBackend, SamplingParams};
use super::error::InferenceError;
use super::format::{create_formatter, PromptFormat, PromptFormatter};
use super::placement::load_options;
use super::resolve::resolve_model;

/// Builds [`LlamaPipeline`]s from GGUF files under the configured model directory.
pub struct LlamaPipelineFactory {
    config: InferenceConfig,
}

impl LlamaPipelineFactory {
    pub fn new(config: InferenceConfig) -> Self {
        Self { config }
    }

    fn sampling(&self) -> SamplingParams {
        SamplingParams {
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            seed: self.config.seed,
        }
    }
}

impl PipelineFactory for LlamaPipelineFactory {
    type Pipeline = LlamaPipeline;

    fn build(&self, spec: PipelineSpec) -> Result<LlamaPipeline> {
        let path = resolve_model(Path::new(&self.config.model_dir), &spec.model, spec.precision)?;
        let options = load_options(&spec.device)?;

        tracing::info!(
            "Loading {} pipeline for {} ({}, precision={}) from {}",
            spec.task.as_str(),
            spec.model,
            spec.device,
            spec.precision,
            path.display()
        );

        let backend =
            LlamaCppBackend::load(&path, options, self.config.n_ctx, self.config.n_batch)?;

        let mut format = PromptFormat::detect(spec.model.as_str());
        if format == PromptFormat::ChatML {
            format = PromptFormat::detect(&path.to_string_lossy());
        }
        tracing::debug!("Using {format:?} chat template for {}", spec.model);

        Ok(LlamaPipeline {
            spec,
            backend,
            formatter: create_formatter(format),
            sampling: self.sampling(),
        })
    }
}

/// A loaded model ready to generate.
pub struct LlamaPipeline {
    spec: PipelineSpec,
    backend: LlamaCppBackend,
    formatter: Box<dyn PromptFormatter>,
    sampling: SamplingParams,
}

impl TextGenerationPipeline for LlamaPipeline {
    fn generate(
        &mut self,
        request: &GenerationRequest,
        options: &GenerationOptions,
    ) -> Result<GenerationOutput> {
        let completion = match request {
            GenerationRequest::Text(text) => {
                self.backend
                    .generate(text, true, options.max_new_tokens, &self.sampling)?
            }
            GenerationRequest::Chat(messages) => {
                if messages.is_empty() {
                    return Err(InferenceError::Template("Chat request has no messages".into()).into());
                }
                let prompt = self.formatter.format_conversation(messages);
                self.backend
                    .generate(&prompt, false, options.max_new_tokens, &self.sampling)?
            }
        };

        tracing::debug!(
            "{} generated {} chars (max_new_tokens={})",
            self.spec.model,
            completion.len(),
            options.max_new_tokens
        );

        Ok(shape_output(request, completion, options.return_full_text))
    }
}

/// Build the returned output from the raw completion.
///
/// With `return_full_text`, text requests get the prompt prepended and chat
/// requests get the conversation with the reply appended as an assistant turn.
pub fn shape_output(
    request: &GenerationRequest,
    completion: String,
    return_full_text: bool,
) -> GenerationOutput {
    let generated = match (request, return_full_text) {
        (GenerationRequest::Text(prompt), true) => GeneratedText::Text(format!("{prompt}{completion}")),
        (GenerationRequest::Chat(messages), true) => {
            let mut conversation = messages.clone();
            conversation.push(ChatMessage::assistant(completion.trim()));
            GeneratedText::Conversation(conversation)
        }
        (_, false) => GeneratedText::Text(completion),
    };
    GenerationOutput::single(generated)
}
