use tch::{nn, Tensor};

use crate::neural::init::{WeightInit, DEFAULT_INIT_STD};
use crate::neural::layers::{ConvLayer, InstanceNorm};

const LEAKY_SLOPE: f64 = 0.2;
/// (out_channels, stride) of each feature stage; all kernels are 4×4 with padding 1
const STAGES: &[(i64, i64)] = &[(64, 2), (128, 2), (256, 2), (512, 1)];
const KERNEL: i64 = 4;
const PADDING: i64 = 1;

/// PatchGAN discriminator.
///
/// Returns one unbounded score per overlapping input patch as a
/// `(N, 1, H', W')` map; a 256×256 image yields a 30×30 map.
#[derive(Debug)]
pub struct Discriminator {
    /// The first stage has no normalization
    stages: Vec<(ConvLayer, Option<InstanceNorm>)>,
    classifier: ConvLayer,
}

impl Discriminator {
    pub fn new(path: &nn::Path, input_nc: i64) -> crate::Result<Self> {
        Self::with_options(path, input_nc, false, DEFAULT_INIT_STD)
    }

    pub fn with_options(
        path: &nn::Path,
        input_nc: i64,
        affine_norm: bool,
        init_std: f64,
    ) -> crate::Result<Self> {
        let mut stages = Vec::with_capacity(STAGES.len());
        let mut channels = input_nc;

        for (idx, &(out_channels, stride)) in STAGES.iter().enumerate() {
            let p = path / format!("stage_{idx}");
            let conv = ConvLayer::new(
                &(&p / "conv"),
                channels,
                out_channels,
                KERNEL,
                stride,
                PADDING,
                init_std,
            );
            let norm = (idx > 0)
                .then(|| InstanceNorm::new(&(&p / "norm"), out_channels, affine_norm, init_std));
            stages.push((conv, norm));
            channels = out_channels;
        }

        let classifier =
            ConvLayer::new(&(path / "classifier"), channels, 1, KERNEL, 1, PADDING, init_std);

        let mut discriminator = Self { stages, classifier };
        discriminator.init_weights()?;

        log::debug!("Discriminator built for {} input channels", input_nc);
        Ok(discriminator)
    }

    /// Spatial size of the score map for a `height`×`width` input, `None`
    /// when the input is too small for every stage to produce a pixel.
    pub fn score_map_size(height: i64, width: i64) -> Option<(i64, i64)> {
        Some((map_side(height)?, map_side(width)?))
    }
}

fn map_side(side: i64) -> Option<i64> {
    STAGES
        .iter()
        .map(|&(_, stride)| stride)
        .chain(std::iter::once(1))
        .try_fold(side, |side, stride| {
            let span = side + 2 * PADDING - KERNEL;
            (span >= 0).then(|| span / stride + 1)
        })
}

impl nn::Module for Discriminator {
    fn forward(&self, xs: &Tensor) -> Tensor {
        let mut h = xs.shallow_clone();
        for (conv, norm) in &self.stages {
            h = h.apply(conv);
            if let Some(norm) = norm {
                h = h.apply(norm);
            }
            h = leaky_relu(&h);
        }
        h.apply(&self.classifier)
    }
}

/// max(x, 0.2·x), valid since the slope is below 1
fn leaky_relu(xs: &Tensor) -> Tensor {
    xs.maximum(&(xs * LEAKY_SLOPE))
}

impl WeightInit for Discriminator {
    fn init_weights(&mut self) -> crate::Result<()> {
        for (conv, norm) in self.stages.iter_mut() {
            conv.init_weights()?;
            if let Some(norm) = norm {
                norm.init_weights()?;
            }
        }
        self.classifier.init_weights()
    }
}

#[cfg(test)]
mod tests {
    use tch::nn::Module;
    use tch::{Device, Kind};

    use super::*;

    #[test]
    fn test_patch_map_shape() {
        let vs = nn::VarStore::new(Device::Cpu);
        let discriminator = Discriminator::new(&vs.root(), 3).unwrap();

        let input = Tensor::rand([2, 3, 64, 64], (Kind::Float, Device::Cpu));
        // 64 -> 32 -> 16 -> 8 -> 7 -> 6
        assert_eq!(discriminator.forward(&input).size(), vec![2, 1, 6, 6]);
    }

    #[test]
    fn test_score_map_size_matches_forward() {
        let vs = nn::VarStore::new(Device::Cpu);
        let discriminator = Discriminator::new(&vs.root(), 1).unwrap();

        for (h, w) in [(24, 24), (64, 40), (100, 36)] {
            let input = Tensor::rand([1, 1, h, w], (Kind::Float, Device::Cpu));
            let size = discriminator.forward(&input).size();
            assert_eq!(Discriminator::score_map_size(h, w), Some((size[2], size[3])));
        }
    }

    #[test]
    fn test_score_map_size_limits() {
        assert_eq!(Discriminator::score_map_size(256, 256), Some((30, 30)));
        // 24 -> 12 -> 6 -> 3 -> 2 -> 1
        assert_eq!(Discriminator::score_map_size(24, 24), Some((1, 1)));
        assert_eq!(Discriminator::score_map_size(20, 256), None);
        assert_eq!(Discriminator::score_map_size(256, 16), None);
        assert_eq!(Discriminator::score_map_size(0, 0), None);
    }

    #[test]
    fn test_first_stage_has_no_norm() {
        let vs = nn::VarStore::new(Device::Cpu);
        let discriminator = Discriminator::with_options(&vs.root(), 1, true, 0.02).unwrap();

        let normed: Vec<bool> = discriminator
            .stages
            .iter()
            .map(|(_, norm)| norm.is_some())
            .collect();
        assert_eq!(normed, vec![false, true, true, true]);
    }

    #[test]
    fn test_leaky_relu_slope() {
        let xs = Tensor::from_slice(&[-1.0f32, 0.0, 2.0]);
        assert_eq!(Vec::<f32>::try_from(&leaky_relu(&xs)).unwrap(), vec![-0.2, 0.0, 2.0]);
    }
}
