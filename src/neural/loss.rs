//! Adversarial and cycle-consistency losses.
//!
//! Label targets are built with the shape of each prediction, so batch size
//! and score-map size are free.

use tch::{nn, Reduction, Tensor};

use crate::config::LossLabels;

fn target_like(pred: &Tensor, label: f64) -> Tensor {
    pred.ones_like() * label
}

/// Least-squares discriminator loss.
///
/// `0.5 * (MSE(d(real), labels.real) + MSE(d(fake), labels.fake))`. `fake` is
/// detached first: the generator that produced it gets no gradient from here.
pub fn gan_loss<D>(d: &D, real: &Tensor, fake: &Tensor, labels: &LossLabels) -> Tensor
where
    D: nn::Module + ?Sized,
{
    let pred_real = d.forward(real);
    let pred_fake = d.forward(&fake.detach());

    let loss_real = pred_real.mse_loss(&target_like(&pred_real, labels.real), Reduction::Mean);
    let loss_fake = pred_fake.mse_loss(&target_like(&pred_fake, labels.fake), Reduction::Mean);

    (loss_real + loss_fake) * 0.5
}

/// Least-squares generator loss: how far `d(fake)` is from being judged real.
pub fn generator_adversarial_loss<D>(d: &D, fake: &Tensor, labels: &LossLabels) -> Tensor
where
    D: nn::Module + ?Sized,
{
    let pred_fake = d.forward(fake);
    pred_fake.mse_loss(&target_like(&pred_fake, labels.real), Reduction::Mean)
}

/// L1 distance between `real` and its reconstruction `net(fake)`.
///
/// `fake` is the image translated out of `real`'s domain and `net` the
/// generator mapping back into it.
pub fn cycle_loss<N>(net: &N, real: &Tensor, fake: &Tensor) -> Tensor
where
    N: nn::Module + ?Sized,
{
    real.l1_loss(&net.forward(fake), Reduction::Mean)
}
