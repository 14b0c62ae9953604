//! CycleGAN Manager
//!
//! Owns the four networks of a CycleGAN and the VarStores holding their
//! parameters, and computes the losses of one translation step.
//!
//! Domain X images have `input_nc` channels, domain Y images `output_nc`.
//! `g_xy` maps X→Y, `g_yx` maps Y→X, `d_x` and `d_y` judge each domain.
//! Both generators share one VarStore and both discriminators another, so an
//! external optimizer can be built per side.

use tch::{nn, Tensor};

use crate::config::CycleGanConfig;
use crate::CycleGanError;
use crate::neural::discriminator::Discriminator;
use crate::neural::generator::Generator;
use crate::neural::loss::{cycle_loss, gan_loss, generator_adversarial_loss};

/// Losses of one step, each a scalar tensor
#[derive(Debug)]
pub struct CycleGanLosses {
    /// Adversarial loss of `g_xy` against `d_y` plus `g_yx` against `d_x`
    pub generator_adversarial: Tensor,
    /// Reconstruction loss over both round trips
    pub cycle: Tensor,
    pub discriminator_x: Tensor,
    pub discriminator_y: Tensor,
}

/// Parameter counts per network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSummary {
    pub g_xy: i64,
    pub g_yx: i64,
    pub d_x: i64,
    pub d_y: i64,
}

impl ParameterSummary {
    pub fn total(&self) -> i64 {
        self.g_xy + self.g_yx + self.d_x + self.d_y
    }
}

pub struct CycleGan {
    config: CycleGanConfig,
    vs_generators: nn::VarStore,
    vs_discriminators: nn::VarStore,
    g_xy: Generator,
    g_yx: Generator,
    d_x: Discriminator,
    d_y: Discriminator,
}

impl CycleGan {
    pub fn new(config: CycleGanConfig) -> crate::Result<Self> {
        config.validate()?;
        log::info!("Initializing CycleGAN networks...");
        log::debug!("CycleGAN config: {:?}", config);

        let device = config.device();
        let vs_generators = nn::VarStore::new(device);
        let vs_discriminators = nn::VarStore::new(device);

        let (g_xy, g_yx) = {
            let root = vs_generators.root();
            let g_xy = Generator::with_options(
                &(&root / "g_xy"),
                config.input_nc,
                config.output_nc,
                config.n_residual_blocks,
                config.affine_norm,
                config.init_std,
            )?;
            let g_yx = Generator::with_options(
                &(&root / "g_yx"),
                config.output_nc,
                config.input_nc,
                config.n_residual_blocks,
                config.affine_norm,
                config.init_std,
            )?;
            (g_xy, g_yx)
        };

        let (d_x, d_y) = {
            let root = vs_discriminators.root();
            let d_x = Discriminator::with_options(
                &(&root / "d_x"),
                config.input_nc,
                config.affine_norm,
                config.init_std,
            )?;
            let d_y = Discriminator::with_options(
                &(&root / "d_y"),
                config.output_nc,
                config.affine_norm,
                config.init_std,
            )?;
            (d_x, d_y)
        };

        let gan = Self {
            config,
            vs_generators,
            vs_discriminators,
            g_xy,
            g_yx,
            d_x,
            d_y,
        };

        let summary = gan.parameter_summary();
        log::info!(
            "CycleGAN ready on {:?}: {} parameters (generators {} + {}, discriminators {} + {})",
            device,
            summary.total(),
            summary.g_xy,
            summary.g_yx,
            summary.d_x,
            summary.d_y
        );
        Ok(gan)
    }

    pub fn config(&self) -> &CycleGanConfig {
        &self.config
    }

    pub fn g_xy(&self) -> &Generator {
        &self.g_xy
    }

    pub fn g_yx(&self) -> &Generator {
        &self.g_yx
    }

    pub fn d_x(&self) -> &Discriminator {
        &self.d_x
    }

    pub fn d_y(&self) -> &Discriminator {
        &self.d_y
    }

    /// VarStore of both generators
    pub fn generator_varstore(&self) -> &nn::VarStore {
        &self.vs_generators
    }

    pub fn generator_varstore_mut(&mut self) -> &mut nn::VarStore {
        &mut self.vs_generators
    }

    /// VarStore of both discriminators
    pub fn discriminator_varstore(&self) -> &nn::VarStore {
        &self.vs_discriminators
    }

    pub fn discriminator_varstore_mut(&mut self) -> &mut nn::VarStore {
        &mut self.vs_discriminators
    }

    /// Check that a `batch`×`height`×`width` input runs through every
    /// network: generators need sides divisible by 4 to give back the input
    /// size, discriminators need at least one score per image.
    pub fn check_image_size(&self, batch: i64, height: i64, width: i64) -> crate::Result<()> {
        if batch <= 0 || height <= 0 || width <= 0 {
            return Err(CycleGanError::Validation(format!(
                "batch and image sides must be positive, got {batch}x{height}x{width}"
            )));
        }
        if height % 4 != 0 || width % 4 != 0 {
            return Err(CycleGanError::Validation(format!(
                "image height and width must be divisible by 4, got {height}x{width}"
            )));
        }
        if Discriminator::score_map_size(height, width).is_none() {
            return Err(CycleGanError::Validation(format!(
                "{height}x{width} images are too small for the discriminators (24x24 minimum)"
            )));
        }
        Ok(())
    }

    pub fn translate_x_to_y(&self, real_x: &Tensor) -> Tensor {
        real_x.apply(&self.g_xy)
    }

    pub fn translate_y_to_x(&self, real_y: &Tensor) -> Tensor {
        real_y.apply(&self.g_yx)
    }

    /// Run both translation directions and compute every loss of the step.
    ///
    /// The discriminator losses see the fakes detached, so backpropagating
    /// them leaves the generator gradients untouched.
    pub fn losses(&self, real_x: &Tensor, real_y: &Tensor) -> CycleGanLosses {
        let labels = &self.config.labels;
        let fake_y = self.translate_x_to_y(real_x);
        let fake_x = self.translate_y_to_x(real_y);

        let generator_adversarial = generator_adversarial_loss(&self.d_y, &fake_y, labels)
            + generator_adversarial_loss(&self.d_x, &fake_x, labels);
        let cycle =
            cycle_loss(&self.g_yx, real_x, &fake_y) + cycle_loss(&self.g_xy, real_y, &fake_x);

        let discriminator_x = gan_loss(&self.d_x, real_x, &fake_x, labels);
        let discriminator_y = gan_loss(&self.d_y, real_y, &fake_y, labels);

        CycleGanLosses {
            generator_adversarial,
            cycle,
            discriminator_x,
            discriminator_y,
        }
    }

    pub fn parameter_summary(&self) -> ParameterSummary {
        ParameterSummary {
            g_xy: count_parameters(&self.vs_generators, "g_xy"),
            g_yx: count_parameters(&self.vs_generators, "g_yx"),
            d_x: count_parameters(&self.vs_discriminators, "d_x"),
            d_y: count_parameters(&self.vs_discriminators, "d_y"),
        }
    }
}

/// Trainable parameter count of the variables under `prefix`
fn count_parameters(vs: &nn::VarStore, prefix: &str) -> i64 {
    let scope = format!("{prefix}.");
    vs.variables()
        .iter()
        .filter(|(name, tensor)| name.starts_with(&scope) && tensor.requires_grad())
        .map(|(_, tensor)| tensor.size().iter().product::<i64>())
        .sum()
}
