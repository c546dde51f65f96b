use std::num::NonZeroU32;
use std::path::Path;
use std::sync::OnceLock;

use llama_cpp_2::context::params::LlamaContextParams;
use llama_cpp_2::context::LlamaContext;
use llama_cpp_2::llama_backend::LlamaBackend;
use llama_cpp_2::llama_batch::LlamaBatch;
use llama_cpp_2::model::params::{LlamaModelParams, LlamaSplitMode};
use llama_cpp_2::model::{AddBos, LlamaModel};
use llama_cpp_2::sampling::LlamaSampler;

use super::error::InferenceError;
use super::placement::{LoadOptions, SplitMode};

/// Global llama.cpp backend — initialized once, never freed until process exit.
/// llama_backend_init() is a global operation; calling it twice or freeing it
/// while models are live causes crashes.
static LLAMA_BACKEND: OnceLock<LlamaBackend> = OnceLock::new();

fn get_or_init_backend() -> Result<&'static LlamaBackend, InferenceError> {
    if let Some(backend) = LLAMA_BACKEND.get() {
        return Ok(backend);
    }
    let backend =
        LlamaBackend::init().map_err(|e| InferenceError::BackendInit(format!("{e:?}")))?;
    Ok(LLAMA_BACKEND.get_or_init(|| backend))
}

/// Reject a request whose prompt plus generated tokens cannot fit in `n_ctx`.
fn check_context(prompt_tokens: usize, max_new_tokens: u32, n_ctx: u32) -> Result<(), InferenceError> {
    if prompt_tokens + max_new_tokens as usize > n_ctx as usize {
        return Err(InferenceError::ContextOverflow {
            prompt_tokens,
            max_new_tokens,
            n_ctx,
        });
    }
    Ok(())
}

/// Sampler settings applied to every generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub seed: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            seed: 42,
        }
    }
}

/// Synchronous llama.cpp backend. Wraps model + cached context.
///
/// Field order matters: Rust drops fields in declaration order.
/// `ctx` must drop before `model`.
pub struct LlamaCppBackend {
    // SAFETY: `ctx` borrows `model` via a transmuted `'static` lifetime.
    // This is sound because `ctx` is declared first, so it drops before `model`.
    ctx: Option<LlamaContext<'static>>,
    model: LlamaModel,
    n_ctx: u32,
    n_batch: u32,
}

impl LlamaCppBackend {
    /// Load a GGUF model file with the given placement.
    /// Creates and caches a `LlamaContext` so the KV cache is allocated once.
    pub fn load(
        path: &Path,
        options: LoadOptions,
        n_ctx: u32,
        n_batch: u32,
    ) -> Result<Self, InferenceError> {
        let backend = get_or_init_backend()?;

        let split_mode = match options.split_mode {
            SplitMode::None => LlamaSplitMode::None,
            SplitMode::Layer => LlamaSplitMode::Layer,
        };
        let mut model_params = LlamaModelParams::default()
            .with_n_gpu_layers(options.n_gpu_layers)
            .with_split_mode(split_mode);
        // main_gpu only pins the model when the split mode is None.
        if let Some(main_gpu) = options.main_gpu {
            model_params = model_params.with_main_gpu(main_gpu);
        }

        tracing::debug!(
            "Loading {} (n_gpu_layers={}, main_gpu={:?}, split={:?})",
            path.display(),
            options.n_gpu_layers,
            options.main_gpu,
            options.split_mode
        );

        let model = LlamaModel::load_from_file(backend, path, &model_params)
            .map_err(|e| InferenceError::ModelLoad(format!("{}: {e:?}", path.display())))?;

        let ctx_params = LlamaContextParams::default()
            .with_n_ctx(NonZeroU32::new(n_ctx))
            .with_n_batch(n_batch);

        let ctx = model
            .new_context(backend, ctx_params)
            .map_err(|e| InferenceError::Context(format!("{e:?}")))?;

        // SAFETY: `ctx` borrows `model`, but both live in this struct.
        // `ctx` is declared before `model`, so Rust drops it first — the borrow is always valid.
        let ctx: LlamaContext<'static> = unsafe { std::mem::transmute(ctx) };

        Ok(Self {
            ctx: Some(ctx),
            model,
            n_ctx,
            n_batch,
        })
    }

    /// Generate a completion for `prompt`. Reuses the cached context (clears KV cache between calls).
    ///
    /// `add_bos` should be false when the prompt already carries the model's BOS marker.
    pub fn generate(
        &mut self,
        prompt: &str,
        add_bos: bool,
        max_tokens: u32,
        sampling: &SamplingParams,
    ) -> Result<String, InferenceError> {
        let ctx = self
            .ctx
            .as_mut()
            .ok_or_else(|| InferenceError::Context("Context not initialized".into()))?;

        ctx.clear_kv_cache();

        let add_bos = if add_bos { AddBos::Always } else { AddBos::Never };
        let tokens_list = self
            .model
            .str_to_token(prompt, add_bos)
            .map_err(|e| InferenceError::Tokenize(format!("{e:?}")))?;

        if tokens_list.is_empty() {
            return Err(InferenceError::Tokenize("Prompt produced no tokens".into()));
        }
        check_context(tokens_list.len(), max_tokens, self.n_ctx)?;

        // Prompts longer than one batch are decoded in chunks; only the final
        // token of the final chunk needs logits.
        let n_batch = self.n_batch.max(1) as usize;
        let mut batch = LlamaBatch::new(n_batch, 1);
        let last_index = tokens_list.len() as i32 - 1;
        for chunk in (0_i32..).zip(tokens_list).collect::<Vec<_>>().chunks(n_batch) {
            batch.clear();
            for &(i, token) in chunk {
                batch
                    .add(token, i, &[0], i == last_index)
                    .map_err(|e| InferenceError::Decode(format!("Batch add failed: {e:?}")))?;
            }
            ctx.decode(&mut batch)
                .map_err(|e| InferenceError::Decode(format!("Initial decode failed: {e:?}")))?;
        }

        let mut sampler = LlamaSampler::chain_simple([
            LlamaSampler::temp(sampling.temperature),
            LlamaSampler::top_p(sampling.top_p, 1),
            LlamaSampler::dist(sampling.seed),
        ]);

        let mut decoder = encoding_rs::UTF_8.new_decoder();
        let mut output = String::new();
        let mut n_cur = last_index + 1;

        for _ in 0..max_tokens {
            let token = sampler.sample(ctx, batch.n_tokens() - 1);
            sampler.accept(token);

            if self.model.is_eog_token(token) {
                break;
            }

            // Render special tokens rather than failing; skip anything still undecodable.
            match self.model.token_to_piece(token, &mut decoder, true, None) {
                Ok(piece) => output.push_str(&piece),
                Err(e) => {
                    tracing::debug!("Skipping undecodable token {}: {:?}", token.0, e);
                }
            }

            batch.clear();
            batch
                .add(token, n_cur, &[0], true)
                .map_err(|e| InferenceError::Decode(format!("Batch add failed: {e:?}")))?;
            n_cur += 1;

            ctx.decode(&mut batch)
                .map_err(|e| InferenceError::Decode(format!("{e:?}")))?;
        }

        Ok(output)
    }
}
