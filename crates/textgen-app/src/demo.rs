//! The example sequence: one Gemma text prompt, then one gpt-oss chat prompt.

use std::io::Write;

use anyhow::Result;
use textgen_ai::loaders::{
    load_gemma, load_gemma_default, load_gpt_oss, load_gpt_oss_default, GEMMA_DEVICE,
    GEMMA_MODEL_ID, GPT_OSS_DEVICE_MAP, GPT_OSS_MODEL_ID,
};
use textgen_core::config::DemoConfig;
use textgen_core::{
    ChatMessage, GenerationOptions, GenerationRequest, PipelineFactory, TextGenerationPipeline,
};

/// Run both example generations, writing each result to `out`.
/// The first failure aborts the sequence.
pub fn run<F: PipelineFactory, W: Write>(factory: &F, demo: &DemoConfig, out: &mut W) -> Result<()> {
    let mut gemma = match (&demo.gemma_model, demo.gemma_device) {
        (None, None) => load_gemma_default(factory)?,
        (model, device) => load_gemma(
            factory,
            model.as_deref().unwrap_or(GEMMA_MODEL_ID),
            device.unwrap_or(GEMMA_DEVICE),
        )?,
    };
    let gemma_output = gemma.generate(
        &GenerationRequest::Text(demo.gemma_prompt.clone()),
        &GenerationOptions::max_new_tokens(demo.gemma_max_new_tokens),
    )?;
    writeln!(out, "Gemma output: {gemma_output}")?;
    // Free the Gemma weights before the 120b model loads.
    drop(gemma);

    let mut gpt_oss = match (&demo.gpt_oss_model, &demo.gpt_oss_device_map) {
        (None, None) => load_gpt_oss_default(factory)?,
        (model, device_map) => load_gpt_oss(
            factory,
            model.as_deref().unwrap_or(GPT_OSS_MODEL_ID),
            device_map.as_deref().unwrap_or(GPT_OSS_DEVICE_MAP),
        )?,
    };
    let messages = vec![ChatMessage::user(demo.gpt_oss_prompt.clone())];
    let gpt_oss_output = gpt_oss.generate(
        &GenerationRequest::Chat(messages),
        &GenerationOptions::max_new_tokens(demo.gpt_oss_max_new_tokens),
    )?;
    writeln!(out, "GPT-OSS output: {gpt_oss_output}")?;

    Ok(())
}
