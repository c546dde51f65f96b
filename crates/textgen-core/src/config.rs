use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

/// llama.cpp runtime settings shared by every pipeline the factory builds.
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    /// Directory searched for GGUF files when a model identifier is not a path.
    #[serde(default = "default_model_dir")]
    pub model_dir: String,
    /// Context window in tokens (prompt + generated).
    #[serde(default = "default_n_ctx")]
    pub n_ctx: u32,
    #[serde(default = "default_n_batch")]
    pub n_batch: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_seed")]
    pub seed: u32,
}

fn default_model_dir() -> String {
    "models".into()
}
fn default_n_ctx() -> u32 {
    4096
}
fn default_n_batch() -> u32 {
    2048
}
fn default_temperature() -> f32 {
    0.7
}
fn default_top_p() -> f32 {
    0.9
}
fn default_seed() -> u32 {
    42
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            n_ctx: default_n_ctx(),
            n_batch: default_n_batch(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            seed: default_seed(),
        }
    }
}

/// Overrides for the demo sequence run by the binary.
///
/// Unset model/device fields mean "use the loader's own defaults".
#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    #[serde(default)]
    pub gemma_model: Option<String>,
    #[serde(default)]
    pub gemma_device: Option<i32>,
    #[serde(default = "default_gemma_prompt")]
    pub gemma_prompt: String,
    #[serde(default = "default_gemma_max_new_tokens")]
    pub gemma_max_new_tokens: u32,
    #[serde(default)]
    pub gpt_oss_model: Option<String>,
    #[serde(default)]
    pub gpt_oss_device_map: Option<String>,
    #[serde(default = "default_gpt_oss_prompt")]
    pub gpt_oss_prompt: String,
    #[serde(default = "default_gpt_oss_max_new_tokens")]
    pub gpt_oss_max_new_tokens: u32,
}

fn default_gemma_prompt() -> String {
    "Hello, world!".into()
}
fn default_gemma_max_new_tokens() -> u32 {
    50
}
fn default_gpt_oss_prompt() -> String {
    "Explain quantum mechanics clearly and concisely.".into()
}
fn default_gpt_oss_max_new_tokens() -> u32 {
    256
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            gemma_model: None,
            gemma_device: None,
            gemma_prompt: default_gemma_prompt(),
            gemma_max_new_tokens: default_gemma_max_new_tokens(),
            gpt_oss_model: None,
            gpt_oss_device_map: None,
            gpt_oss_prompt: default_gpt_oss_prompt(),
            gpt_oss_max_new_tokens: default_gpt_oss_max_new_tokens(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback chain: explicit path → ./config/default.toml → hardcoded defaults.
    pub fn load_or_default(explicit_path: Option<&Path>) -> Self {
        Self::load_with_fallback(explicit_path, Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Same chain as [`AppConfig::load_or_default`] with the default file at `default_path`.
    pub fn load_with_fallback(explicit_path: Option<&Path>, default_path: &Path) -> Self {
        if let Some(path) = explicit_path {
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {e}", path.display());
                }
            }
        }

        if default_path.exists() {
            match Self::load(default_path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!("Failed to load default config: {e}");
                }
            }
        }

        tracing::info!("Using hardcoded default configuration");
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.inference.model_dir, "models");
        assert_eq!(cfg.inference.n_ctx, 4096);
        assert_eq!(cfg.inference.seed, 42);
        assert!(cfg.demo.gemma_model.is_none());
        assert!(cfg.demo.gpt_oss_device_map.is_none());
        assert_eq!(cfg.demo.gemma_prompt, "Hello, world!");
        assert_eq!(cfg.demo.gemma_max_new_tokens, 50);
        assert_eq!(cfg.demo.gpt_oss_max_new_tokens, 256);
    }

    #[test]
    fn partial_tables_keep_remaining_defaults() {
        let cfg: AppConfig = toml::from_str(
            "[inference]\nmodel_dir = \"/srv/gguf\"\nn_ctx = 8192\n\n\
             [demo]\ngemma_device = -1\ngpt_oss_device_map = \"cpu\"\n",
        )
        .unwrap();
        assert_eq!(cfg.inference.model_dir, "/srv/gguf");
        assert_eq!(cfg.inference.n_ctx, 8192);
        assert_eq!(cfg.inference.n_batch, 2048);
        assert_eq!(cfg.demo.gemma_device, Some(-1));
        assert_eq!(cfg.demo.gpt_oss_device_map.as_deref(), Some("cpu"));
        assert!(cfg.demo.gpt_oss_model.is_none());
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("textgen-config-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    const DEFAULT_TOML: &str = "[inference]\nmodel_dir = \"/srv/gguf\"\n\n\
                                [demo]\ngemma_model = \"google/gemma-2-2b-it\"\ngpt_oss_device_map = \"cpu\"\n";

    #[test]
    fn default_file_used_without_explicit_path() {
        let dir = scratch_dir("default-only");
        let default_path = dir.join("default.toml");
        std::fs::write(&default_path, DEFAULT_TOML).unwrap();

        let cfg = AppConfig::load_with_fallback(None, &default_path);
        assert_eq!(cfg.inference.model_dir, "/srv/gguf");
        assert_eq!(cfg.demo.gemma_model.as_deref(), Some("google/gemma-2-2b-it"));
        assert_eq!(cfg.demo.gpt_oss_device_map.as_deref(), Some("cpu"));
        assert_eq!(cfg.demo.gemma_max_new_tokens, 50);
    }

    #[test]
    fn malformed_explicit_file_falls_back_to_default_file() {
        let dir = scratch_dir("malformed");
        let default_path = dir.join("default.toml");
        std::fs::write(&default_path, DEFAULT_TOML).unwrap();
        let broken = dir.join("broken.toml");
        std::fs::write(&broken, "[demo\ngemma_device = ").unwrap();

        let cfg = AppConfig::load_with_fallback(Some(&broken), &default_path);
        assert_eq!(cfg.demo.gemma_model.as_deref(), Some("google/gemma-2-2b-it"));
        assert_eq!(cfg.inference.model_dir, "/srv/gguf");
    }

    #[test]
    fn explicit_file_beats_default_file() {
        let dir = scratch_dir("explicit");
        let default_path = dir.join("default.toml");
        std::fs::write(&default_path, DEFAULT_TOML).unwrap();
        let explicit = dir.join("mine.toml");
        std::fs::write(&explicit, "[demo]\ngemma_device = -1\n").unwrap();

        let cfg = AppConfig::load_with_fallback(Some(&explicit), &default_path);
        assert_eq!(cfg.demo.gemma_device, Some(-1));
        assert!(cfg.demo.gemma_model.is_none());
        assert_eq!(cfg.inference.model_dir, "models");
    }

    #[test]
    fn no_files_gives_builtin_defaults() {
        let dir = scratch_dir("none");
        let cfg = AppConfig::load_with_fallback(None, &dir.join("absent.toml"));
        assert_eq!(cfg.inference.model_dir, "models");
        assert!(cfg.demo.gemma_model.is_none());
    }

    #[test]
    fn missing_explicit_file_falls_back() {
        let cfg = AppConfig::load_or_default(Some(Path::new("/nonexistent/textgen.toml")));
        assert_eq!(cfg.demo.gemma_prompt, "Hello, world!");
    }
}
