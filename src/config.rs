//! Configuration
//!
//! Everything a `CycleGan` needs to be built: channel counts, depth of the
//! residual bottleneck, normalization and initialization settings, the
//! adversarial label targets and the compute device. Loadable from JSON,
//! every field falls back to its default when absent.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tch::Device;

use crate::neural::generator::DEFAULT_RESIDUAL_BLOCKS;
use crate::neural::init::DEFAULT_INIT_STD;
use crate::CycleGanError;

/// Regression targets of the least-squares adversarial loss
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LossLabels {
    pub real: f64,
    pub fake: f64,
}

impl Default for LossLabels {
    fn default() -> Self {
        Self {
            real: 1.0,
            fake: 0.0,
        }
    }
}

/// Device selection as it appears in a config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceChoice {
    #[default]
    Cpu,
    Cuda,
    /// CUDA device 0 when available, CPU otherwise
    Auto,
}

impl DeviceChoice {
    pub fn device(self) -> Device {
        match self {
            DeviceChoice::Cpu => Device::Cpu,
            DeviceChoice::Cuda => Device::Cuda(0),
            DeviceChoice::Auto => Device::cuda_if_available(),
        }
    }
}

/// Configuration for CycleGAN network construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleGanConfig {
    /// Channels of domain X images
    pub input_nc: i64,
    /// Channels of domain Y images
    pub output_nc: i64,
    /// Residual blocks in each generator's bottleneck
    pub n_residual_blocks: usize,
    /// Learnable scale/shift in instance normalization layers
    pub affine_norm: bool,
    /// Standard deviation of the normal weight initialization
    pub init_std: f64,
    pub labels: LossLabels,
    pub device: DeviceChoice,
}

impl Default for CycleGanConfig {
    fn default() -> Self {
        Self {
            input_nc: 3,
            output_nc: 3,
            n_residual_blocks: DEFAULT_RESIDUAL_BLOCKS,
            affine_norm: false,
            init_std: DEFAULT_INIT_STD,
            labels: LossLabels::default(),
            device: DeviceChoice::Cpu,
        }
    }
}

impl CycleGanConfig {
    /// Read and validate a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading config from {}", path.display());

        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.input_nc <= 0 || self.output_nc <= 0 {
            return Err(CycleGanError::Config(format!(
                "channel counts must be positive (input_nc={}, output_nc={})",
                self.input_nc, self.output_nc
            )));
        }
        if !self.init_std.is_finite() || self.init_std <= 0.0 {
            return Err(CycleGanError::Config(format!(
                "init_std must be a positive finite number, got {}",
                self.init_std
            )));
        }
        if !self.labels.real.is_finite() || !self.labels.fake.is_finite() {
            return Err(CycleGanError::Config(format!(
                "labels must be finite, got {:?}",
                self.labels
            )));
        }
        if self.labels.real == self.labels.fake {
            return Err(CycleGanError::Config(format!(
                "real and fake labels must differ, both are {}",
                self.labels.real
            )));
        }
        if self.device == DeviceChoice::Cuda && !tch::Cuda::is_available() {
            return Err(CycleGanError::Config(
                "device \"cuda\" requested but no CUDA device is available".to_string(),
            ));
        }
        Ok(())
    }

    pub fn device(&self) -> Device {
        self.device.device()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CycleGanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.n_residual_blocks, 9);
        assert_eq!(config.labels, LossLabels { real: 1.0, fake: 0.0 });
        assert_eq!(config.device(), Device::Cpu);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CycleGanConfig =
            serde_json::from_str(r#"{ "output_nc": 1, "labels": { "real": 0.9 } }"#).unwrap();
        assert_eq!(config.input_nc, 3);
        assert_eq!(config.output_nc, 1);
        assert_eq!(config.labels.real, 0.9);
        assert_eq!(config.labels.fake, 0.0);
    }

    #[test]
    fn test_device_choice_names() {
        let choice: DeviceChoice = serde_json::from_str(r#""auto""#).unwrap();
        assert_eq!(choice, DeviceChoice::Auto);
    }

    #[test]
    fn test_cuda_device_requires_cuda() {
        let config = CycleGanConfig {
            device: DeviceChoice::Cuda,
            ..Default::default()
        };
        if tch::Cuda::is_available() {
            assert!(config.validate().is_ok());
        } else {
            let err = config.validate().unwrap_err();
            assert!(matches!(err, CycleGanError::Config(ref msg) if msg.contains("cuda")));
        }
    }

    #[test]
    fn test_auto_device_always_valid() {
        let config = CycleGanConfig {
            device: DeviceChoice::Auto,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_equal_labels() {
        let config = CycleGanConfig {
            labels: LossLabels { real: 0.5, fake: 0.5 },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_init_std() {
        for std in [0.0, -0.02, f64::NAN] {
            let config = CycleGanConfig {
                init_std: std,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "init_std={std} accepted");
        }
    }
}
