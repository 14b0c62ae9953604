use tch::{nn, Tensor};

use crate::neural::init::{WeightInit, DEFAULT_INIT_STD};
use crate::neural::layers::{ConvLayer, InstanceNorm};

/// Residual block with reflection padding and instance normalization
#[derive(Debug)]
pub struct ResidualBlock {
    pub(crate) conv1: ConvLayer,
    pub(crate) norm1: InstanceNorm,
    pub(crate) conv2: ConvLayer,
    pub(crate) norm2: InstanceNorm,
}

impl ResidualBlock {
    pub fn new(vs: &nn::VarStore, channels: i64) -> Self {
        Self::new_path(&vs.root(), channels, false, DEFAULT_INIT_STD)
    }

    pub fn new_path(path: &nn::Path, channels: i64, affine_norm: bool, init_std: f64) -> Self {
        Self {
            conv1: ConvLayer::reflect(&(path / "conv1"), channels, channels, 3, 1, init_std),
            norm1: InstanceNorm::new(&(path / "norm1"), channels, affine_norm, init_std),
            conv2: ConvLayer::reflect(&(path / "conv2"), channels, channels, 3, 1, init_std),
            norm2: InstanceNorm::new(&(path / "norm2"), channels, affine_norm, init_std),
        }
    }
}

impl nn::Module for ResidualBlock {
    fn forward(&self, x: &Tensor) -> Tensor {
        let out = x.apply(&self.conv1).apply(&self.norm1).relu();

        // No activation after the second norm, the skip is added as is
        let out = out.apply(&self.conv2).apply(&self.norm2);

        x + out
    }
}

impl WeightInit for ResidualBlock {
    fn init_weights(&mut self) -> crate::Result<()> {
        self.conv1.init_weights()?;
        self.norm1.init_weights()?;
        self.conv2.init_weights()?;
        self.norm2.init_weights()
    }
}
