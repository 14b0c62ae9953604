use tch::{nn, Tensor};

use crate::neural::init::{WeightInit, DEFAULT_INIT_STD};
use crate::neural::layers::{ConvLayer, InstanceNorm, UpConvLayer};
use crate::neural::residual_block::ResidualBlock;

/// Channels after the initial 7×7 convolution
const BASE_CHANNELS: i64 = 64;
/// Stride-2 steps on each side of the bottleneck
const SAMPLING_STEPS: usize = 2;
pub const DEFAULT_RESIDUAL_BLOCKS: usize = 9;

/// Encoder / residual / decoder image-to-image generator.
///
/// Output has `output_nc` channels, the same spatial size as the input
/// (when height and width are divisible by 4) and values in [-1, 1].
#[derive(Debug)]
pub struct Generator {
    input_conv: ConvLayer,
    input_norm: InstanceNorm,
    down: Vec<(ConvLayer, InstanceNorm)>,
    res_blocks: Vec<ResidualBlock>,
    up: Vec<(UpConvLayer, InstanceNorm)>,
    output_conv: ConvLayer,
}

impl Generator {
    pub fn new(
        path: &nn::Path,
        input_nc: i64,
        output_nc: i64,
        n_residual_blocks: usize,
    ) -> crate::Result<Self> {
        Self::with_options(
            path,
            input_nc,
            output_nc,
            n_residual_blocks,
            false,
            DEFAULT_INIT_STD,
        )
    }

    pub fn with_options(
        path: &nn::Path,
        input_nc: i64,
        output_nc: i64,
        n_residual_blocks: usize,
        affine_norm: bool,
        init_std: f64,
    ) -> crate::Result<Self> {
        let input_conv =
            ConvLayer::reflect(&(path / "input_conv"), input_nc, BASE_CHANNELS, 7, 3, init_std);
        let input_norm =
            InstanceNorm::new(&(path / "input_norm"), BASE_CHANNELS, affine_norm, init_std);

        let mut down = Vec::with_capacity(SAMPLING_STEPS);
        let mut channels = BASE_CHANNELS;
        for idx in 0..SAMPLING_STEPS {
            let p = path / format!("down_{idx}");
            down.push((
                ConvLayer::new(&(&p / "conv"), channels, channels * 2, 3, 2, 1, init_std),
                InstanceNorm::new(&(&p / "norm"), channels * 2, affine_norm, init_std),
            ));
            channels *= 2;
        }

        let res_blocks = (0..n_residual_blocks)
            .map(|idx| {
                let p = path / format!("res_block_{idx}");
                ResidualBlock::new_path(&p, channels, affine_norm, init_std)
            })
            .collect();

        let mut up = Vec::with_capacity(SAMPLING_STEPS);
        for idx in 0..SAMPLING_STEPS {
            let p = path / format!("up_{idx}");
            up.push((
                UpConvLayer::new(&(&p / "conv"), channels, channels / 2, init_std),
                InstanceNorm::new(&(&p / "norm"), channels / 2, affine_norm, init_std),
            ));
            channels /= 2;
        }

        let output_conv =
            ConvLayer::reflect(&(path / "output_conv"), channels, output_nc, 7, 3, init_std);

        let mut generator = Self {
            input_conv,
            input_norm,
            down,
            res_blocks,
            up,
            output_conv,
        };
        generator.init_weights()?;

        log::debug!(
            "Generator built: {} -> {} channels, {} residual blocks",
            input_nc,
            output_nc,
            n_residual_blocks
        );
        Ok(generator)
    }

    pub fn num_residual_blocks(&self) -> usize {
        self.res_blocks.len()
    }
}

impl nn::Module for Generator {
    fn forward(&self, xs: &Tensor) -> Tensor {
        let mut h = xs.apply(&self.input_conv).apply(&self.input_norm).relu();

        for (conv, norm) in &self.down {
            h = h.apply(conv).apply(norm).relu();
        }
        for block in &self.res_blocks {
            h = h.apply(block);
        }
        for (conv, norm) in &self.up {
            h = h.apply(conv).apply(norm).relu();
        }

        h.apply(&self.output_conv).tanh()
    }
}

impl WeightInit for Generator {
    fn init_weights(&mut self) -> crate::Result<()> {
        self.input_conv.init_weights()?;
        self.input_norm.init_weights()?;
        for (conv, norm) in self.down.iter_mut() {
            conv.init_weights()?;
            norm.init_weights()?;
        }
        self.res_blocks.init_weights()?;
        for (conv, norm) in self.up.iter_mut() {
            conv.init_weights()?;
            norm.init_weights()?;
        }
        self.output_conv.init_weights()
    }
}
