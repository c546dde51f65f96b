//! The two pipeline loaders.
//!
//! Both are thin factories: they assemble a [`PipelineSpec`] and hand it to
//! the engine. Nothing is validated or wrapped here; errors from
//! [`PipelineFactory::build`] reach the caller exactly as raised.

use anyhow::Result;
use textgen_core::{DeviceSpec, ModelId, PipelineFactory, PipelineSpec, Precision, Task};

/// Instruction-tuned Gemma checkpoint.
pub const GEMMA_MODEL_ID: &str = "google/gemma-3-4b-it";
/// First accelerator.
pub const GEMMA_DEVICE: i32 = 0;

/// Open-weight gpt-oss checkpoint, 120b parameters.
pub const GPT_OSS_MODEL_ID: &str = "openai/gpt-oss-120b";
/// Spread layers over every available device.
pub const GPT_OSS_DEVICE_MAP: &str = "auto";

/// Spec for a Gemma pipeline: the given device, fixed bfloat16 precision.
pub fn gemma_spec(model_id: &str, device: i32) -> PipelineSpec {
    PipelineSpec {
        task: Task::TextGeneration,
        model: ModelId::new(model_id),
        device: DeviceSpec::Index(device),
        precision: Precision::BFloat16,
    }
}

/// Spec for a gpt-oss pipeline: the given placement, automatic precision.
pub fn gpt_oss_spec(model_id: &str, device_map: &str) -> PipelineSpec {
    PipelineSpec {
        task: Task::TextGeneration,
        model: ModelId::new(model_id),
        device: DeviceSpec::Map(device_map.to_string()),
        precision: Precision::Auto,
    }
}

/// Load a Gemma text-generation pipeline.
///
/// `device` is an accelerator index, or `-1` for the CPU.
pub fn load_gemma<F: PipelineFactory>(
    factory: &F,
    model_id: &str,
    device: i32,
) -> Result<F::Pipeline> {
    factory.build(gemma_spec(model_id, device))
}

/// [`load_gemma`] with [`GEMMA_MODEL_ID`] on [`GEMMA_DEVICE`].
pub fn load_gemma_default<F: PipelineFactory>(factory: &F) -> Result<F::Pipeline> {
    load_gemma(factory, GEMMA_MODEL_ID, GEMMA_DEVICE)
}

/// Load a gpt-oss text-generation pipeline.
///
/// `device_map` is a placement strategy such as `"auto"`, `"cpu"` or `"cuda:1"`.
pub fn load_gpt_oss<F: PipelineFactory>(
    factory: &F,
    model_id: &str,
    device_map: &str,
) -> Result<F::Pipeline> {
    factory.build(gpt_oss_spec(model_id, device_map))
}

/// [`load_gpt_oss`] with [`GPT_OSS_MODEL_ID`] and [`GPT_OSS_DEVICE_MAP`].
pub fn load_gpt_oss_default<F: PipelineFactory>(factory: &F) -> Result<F::Pipeline> {
    load_gpt_oss(factory, GPT_OSS_MODEL_ID, GPT_OSS_DEVICE_MAP)
}
