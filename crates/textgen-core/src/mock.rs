//! In-memory fake of the inference engine for testing.
//!
//! `RecordingFactory` records every `PipelineSpec` it is asked to build and
//! hands out `EchoPipeline`s that record every call and echo the input back.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::interfaces::{PipelineFactory, TextGenerationPipeline};
use crate::pipeline::{
    GeneratedText, GenerationOptions, GenerationOutput, GenerationRequest, PipelineSpec,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MockError {
    #[error("Model not found: {0}")]
    UnknownModel(String),
}

/// One call made to an `EchoPipeline`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub spec: PipelineSpec,
    pub request: GenerationRequest,
    pub options: GenerationOptions,
}

#[derive(Default)]
pub struct RecordingFactory {
    built: Mutex<Vec<PipelineSpec>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    live: Arc<AtomicUsize>,
    live_at_build: Mutex<Vec<usize>>,
    unknown_models: HashSet<String>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `build` fail with `MockError::UnknownModel` for this identifier.
    pub fn with_unknown_model(mut self, model_id: &str) -> Self {
        self.unknown_models.insert(model_id.to_string());
        self
    }

    /// Specs passed to `build`, in order, including failed ones.
    pub fn built(&self) -> Vec<PipelineSpec> {
        self.built.lock().unwrap().clone()
    }

    /// Number of pipelines still alive when each `build` was called.
    pub fn live_at_build(&self) -> Vec<usize> {
        self.live_at_build.lock().unwrap().clone()
    }

    /// Generation calls across every pipeline this factory handed out.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl PipelineFactory for RecordingFactory {
    type Pipeline = EchoPipeline;

    fn build(&self, spec: PipelineSpec) -> anyhow::Result<EchoPipeline> {
        self.built.lock().unwrap().push(spec.clone());
        self.live_at_build
            .lock()
            .unwrap()
            .push(self.live.load(Ordering::SeqCst));
        if self.unknown_models.contains(spec.model.as_str()) {
            return Err(MockError::UnknownModel(spec.model.to_string()).into());
        }
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(EchoPipeline {
            spec,
            calls: self.calls.clone(),
            live: self.live.clone(),
        })
    }
}

/// Pipeline that returns its input unchanged.
pub struct EchoPipeline {
    spec: PipelineSpec,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    live: Arc<AtomicUsize>,
}

impl Drop for EchoPipeline {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl EchoPipeline {
    pub fn spec(&self) -> &PipelineSpec {
        &self.spec
    }
}

impl TextGenerationPipeline for EchoPipeline {
    fn generate(
        &mut self,
        request: &GenerationRequest,
        options: &GenerationOptions,
    ) -> anyhow::Result<GenerationOutput> {
        self.calls.lock().unwrap().push(RecordedCall {
            spec: self.spec.clone(),
            request: request.clone(),
            options: *options,
        });

        let echoed = match request {
            GenerationRequest::Text(text) => GeneratedText::Text(text.clone()),
            GenerationRequest::Chat(messages) => GeneratedText::Conversation(messages.clone()),
        };
        Ok(GenerationOutput::single(echoed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{DeviceSpec, Precision, Task};

    fn spec(model: &str) -> PipelineSpec {
        PipelineSpec {
            task: Task::TextGeneration,
            model: model.into(),
            device: DeviceSpec::Index(0),
            precision: Precision::Auto,
        }
    }

    #[test]
    fn echo_returns_input_and_records_call() {
        let factory = RecordingFactory::new();
        let mut pipe = factory.build(spec("m")).unwrap();

        let out = pipe
            .generate(&"ping".into(), &GenerationOptions::max_new_tokens(5))
            .unwrap();
        assert_eq!(out, GenerationOutput::single(GeneratedText::Text("ping".into())));

        let calls = factory.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].spec.model.as_str(), "m");
        assert_eq!(calls[0].options.max_new_tokens, 5);
    }

    #[test]
    fn unknown_model_fails_but_is_recorded() {
        let factory = RecordingFactory::new().with_unknown_model("nope/missing");
        let err = factory.build(spec("nope/missing")).err().unwrap();
        assert_eq!(
            err.downcast_ref::<MockError>(),
            Some(&MockError::UnknownModel("nope/missing".into()))
        );
        assert_eq!(factory.built().len(), 1);
    }

    #[test]
    fn live_count_follows_drops() {
        let factory = RecordingFactory::new();
        let first = factory.build(spec("a")).unwrap();
        let _second = factory.build(spec("b")).unwrap();
        drop(first);
        let _third = factory.build(spec("c")).unwrap();
        assert_eq!(factory.live_at_build(), vec![0, 1, 1]);
    }
}
