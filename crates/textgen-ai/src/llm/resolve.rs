//! Model identifier → GGUF file resolution.
//!
//! Lookup order for an identifier like `google/gemma-3-4b-it`:
//!  1. the identifier itself, if it is a path to an existing file
//!  2. `*.gguf` files inside `<model_dir>/google/gemma-3-4b-it/`
//!  3. `*.gguf` files directly in `<model_dir>` whose name contains `gemma-3-4b-it`
//!
//! Candidates carrying the requested precision tag win. Only the first shard
//! of a split model is ever returned; llama.cpp picks up the rest itself.

use std::fs;
use std::path::{Path, PathBuf};

use textgen_core::{ModelId, Precision};

use super::error::InferenceError;

pub fn resolve_model(
    model_dir: &Path,
    model: &ModelId,
    precision: Precision,
) -> Result<PathBuf, InferenceError> {
    let direct = Path::new(model.as_str());
    if direct.is_file() {
        return Ok(direct.to_path_buf());
    }

    let mut candidates = gguf_files(&model_dir.join(model.as_str()));
    if candidates.is_empty() {
        let needle = model.name().to_lowercase();
        candidates = gguf_files(model_dir)
            .into_iter()
            .filter(|p| file_name_lower(p).contains(&needle))
            .collect();
    }
    candidates.retain(|p| !is_secondary_shard(&file_name_lower(p)));
    candidates.sort();

    let Some(tag) = precision.file_tag() else {
        return candidates
            .into_iter()
            .next()
            .ok_or_else(|| InferenceError::ModelNotFound(model.to_string()));
    };

    if let Some(tagged) = candidates.iter().find(|p| has_tag(&file_name_lower(p), tag)) {
        return Ok(tagged.clone());
    }

    match candidates.into_iter().next() {
        Some(fallback) => {
            tracing::warn!(
                "No {tag} weights for {model}, using {}",
                fallback.display()
            );
            Ok(fallback)
        }
        None => Err(InferenceError::ModelNotFound(model.to_string())),
    }
}

fn gguf_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("gguf"))
        })
        .collect()
}

fn file_name_lower(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// `true` when `tag` appears as a whole `-`/`_`/`.`-separated segment.
fn has_tag(file_name: &str, tag: &str) -> bool {
    file_name.split(['-', '_', '.']).any(|seg| seg == tag)
}

/// `model-00002-of-00003.gguf` and later shards.
fn is_secondary_shard(file_name: &str) -> bool {
    let Some(idx) = file_name.find("-of-") else {
        return false;
    };
    let shard = file_name[..idx].rsplit('-').next().unwrap_or("");
    !shard.is_empty() && shard.chars().all(|c| c.is_ascii_digit()) && shard.trim_start_matches('0') != "1"
}
