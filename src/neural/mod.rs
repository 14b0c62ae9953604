pub mod discriminator;
pub mod generator;
pub mod init;
pub mod layers;
pub mod loss;
pub mod manager;
pub mod residual_block;

// Re-export key components for convenience
pub use discriminator::Discriminator;
pub use generator::{Generator, DEFAULT_RESIDUAL_BLOCKS};
pub use init::{InitPolicy, WeightInit, DEFAULT_INIT_STD};
pub use loss::{cycle_loss, gan_loss, generator_adversarial_loss};
pub use manager::{CycleGan, CycleGanLosses, ParameterSummary};
pub use residual_block::ResidualBlock;
