//! Maps a [`DeviceSpec`] onto llama.cpp model placement parameters.

use textgen_core::DeviceSpec;

use super::error::InferenceError;

/// Offload every layer; llama.cpp clamps this to the model's layer count.
pub const ALL_LAYERS: u32 = 999;

/// How offloaded layers are distributed across accelerators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// Whole model on `main_gpu`.
    None,
    /// Layers spread over every visible device.
    Layer,
}

/// How a model is placed when loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub n_gpu_layers: u32,
    /// Accelerator the model is pinned to. Only honoured with `SplitMode::None`.
    pub main_gpu: Option<i32>,
    pub split_mode: SplitMode,
}

impl LoadOptions {
    pub fn cpu() -> Self {
        Self {
            n_gpu_layers: 0,
            main_gpu: None,
            split_mode: SplitMode::None,
        }
    }

    pub fn gpu(index: i32) -> Self {
        Self {
            n_gpu_layers: ALL_LAYERS,
            main_gpu: Some(index),
            split_mode: SplitMode::None,
        }
    }

    pub fn auto() -> Self {
        Self {
            n_gpu_layers: ALL_LAYERS,
            main_gpu: None,
            split_mode: SplitMode::Layer,
        }
    }
}

/// Translate a device spec. `-1` / `"cpu"` keep weights in host memory,
/// `n` / `"cuda:n"` pin to accelerator `n`, `"auto"` spreads across all.
pub fn load_options(device: &DeviceSpec) -> Result<LoadOptions, InferenceError> {
    match device {
        DeviceSpec::Index(-1) => Ok(LoadOptions::cpu()),
        DeviceSpec::Index(i) if *i >= 0 => Ok(LoadOptions::gpu(*i)),
        DeviceSpec::Index(i) => Err(InferenceError::UnsupportedDevice(i.to_string())),
        DeviceSpec::Map(map) => {
            let lower = map.trim().to_lowercase();
            match lower.as_str() {
                "auto" | "balanced" => Ok(LoadOptions::auto()),
                "cpu" => Ok(LoadOptions::cpu()),
                other => {
                    let index = other.strip_prefix("cuda:").unwrap_or(other);
                    index
                        .parse::<i32>()
                        .ok()
                        .filter(|i| *i >= 0)
                        .map(LoadOptions::gpu)
                        .ok_or_else(|| InferenceError::UnsupportedDevice(map.clone()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_mapping() {
        assert_eq!(load_options(&DeviceSpec::Index(-1)).unwrap(), LoadOptions::cpu());
        assert_eq!(load_options(&DeviceSpec::Index(0)).unwrap(), LoadOptions::gpu(0));
        assert_eq!(load_options(&DeviceSpec::Index(3)).unwrap(), LoadOptions::gpu(3));

        let pinned = load_options(&DeviceSpec::Index(1)).unwrap();
        assert_eq!(pinned.main_gpu, Some(1));
        assert_eq!(pinned.split_mode, SplitMode::None);
        assert_eq!(pinned.n_gpu_layers, ALL_LAYERS);

        let cpu = load_options(&DeviceSpec::Index(-1)).unwrap();
        assert_eq!(cpu.n_gpu_layers, 0);
        assert!(matches!(
            load_options(&DeviceSpec::Index(-2)),
            Err(InferenceError::UnsupportedDevice(_))
        ));
    }

    #[test]
    fn map_mapping() {
        assert_eq!(load_options(&DeviceSpec::Map("auto".into())).unwrap(), LoadOptions::auto());
        assert_eq!(load_options(&DeviceSpec::Map("CPU".into())).unwrap(), LoadOptions::cpu());
        assert_eq!(load_options(&DeviceSpec::Map("cuda:1".into())).unwrap(), LoadOptions::gpu(1));
        assert_eq!(load_options(&DeviceSpec::Map("2".into())).unwrap(), LoadOptions::gpu(2));

        let auto = load_options(&DeviceSpec::Map("auto".into())).unwrap();
        assert_eq!(auto.split_mode, SplitMode::Layer);
        assert_eq!(auto.main_gpu, None);

        let pinned = load_options(&DeviceSpec::Map("cuda:1".into())).unwrap();
        assert_eq!(pinned.split_mode, SplitMode::None);
        assert_eq!(pinned.main_gpu, Some(1));
        assert_ne!(pinned, auto);
    }

    #[test]
    fn unknown_map_is_rejected() {
        let err = load_options(&DeviceSpec::Map("tpu:0".into())).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported device: tpu:0");
        assert!(load_options(&DeviceSpec::Map("cuda:-1".into())).is_err());
    }
}
