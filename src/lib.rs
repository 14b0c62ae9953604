//! # CycleGAN Library
//!
//! Network architecture and loss computation for unpaired image-to-image
//! translation between two visual domains X and Y.
//!
//! ## Features
//!
//! - **Generators**: encoder / residual / decoder networks translating X→Y and Y→X
//! - **Discriminators**: PatchGAN classifiers producing a spatial realism map
//! - **Losses**: least-squares adversarial loss and L1 cycle-consistency loss
//! - **Initialization**: per-layer initialization policies applied at construction
//!
//! ## Usage
//!
//! ```no_run
//! use cycle_gan::{CycleGan, CycleGanConfig};
//! use tch::{Device, Kind, Tensor};
//!
//! let gan = CycleGan::new(CycleGanConfig::default())?;
//! let real_x = Tensor::zeros([1, 3, 256, 256], (Kind::Float, Device::Cpu));
//! let fake_y = gan.translate_x_to_y(&real_x);
//! assert_eq!(fake_y.size(), vec![1, 3, 256, 256]);
//! # Ok::<(), cycle_gan::CycleGanError>(())
//! ```

// ============================================================================
// PUBLIC API MODULES
// ============================================================================

/// Configuration of networks, labels and device
pub mod config;

/// Logging backend setup
pub mod logging;

/// Neural network components: layers, networks, losses
pub mod neural;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use config::{CycleGanConfig, DeviceChoice, LossLabels};
pub use neural::*;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Main error type for the CycleGAN library
#[derive(Debug, thiserror::Error)]
pub enum CycleGanError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Torch error: {0}")]
    Torch(#[from] tch::TchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Logger error: {0}")]
    Logger(#[from] flexi_logger::FlexiLoggerError),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CycleGanError>;

// ============================================================================
// LIBRARY VERSION INFO
// ============================================================================

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
