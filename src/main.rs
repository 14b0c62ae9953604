use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tch::{Kind, Tensor};

use cycle_gan::logging::setup_logging;
use cycle_gan::{CycleGan, CycleGanConfig, CycleGanError};

#[derive(Parser, Debug)]
#[command(name = "cycle_gan", version, about = cycle_gan::DESCRIPTION)]
struct Cli {
    /// JSON config file; defaults are used when absent
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write rotated log files here instead of stderr
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build all four networks and report their parameter counts
    Summary,

    /// Push an all-zero batch through the full translation cycle
    Smoke {
        #[arg(long, default_value_t = 1)]
        batch: i64,

        /// Image height, divisible by 4 and at least 24
        #[arg(long, default_value_t = 256)]
        height: i64,

        /// Image width, divisible by 4 and at least 24
        #[arg(long, default_value_t = 256)]
        width: i64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _logger = setup_logging(&cli.log_level, cli.log_dir.as_deref())?;

    let config = match &cli.config {
        Some(path) => CycleGanConfig::from_json_file(path)?,
        None => CycleGanConfig::default(),
    };
    let gan = CycleGan::new(config)?;

    match cli.command {
        Command::Summary => summary(&gan),
        Command::Smoke {
            batch,
            height,
            width,
        } => smoke(&gan, batch, height, width)?,
    }
    Ok(())
}

fn summary(gan: &CycleGan) {
    let config = gan.config();
    let params = gan.parameter_summary();

    log::info!(
        "Domains: X has {} channels, Y has {} channels; {} residual blocks per generator",
        config.input_nc,
        config.output_nc,
        config.n_residual_blocks
    );
    log::info!("g_xy (X -> Y): {:>12} parameters", params.g_xy);
    log::info!("g_yx (Y -> X): {:>12} parameters", params.g_yx);
    log::info!("d_x          : {:>12} parameters", params.d_x);
    log::info!("d_y          : {:>12} parameters", params.d_y);
    log::info!("total        : {:>12} parameters", params.total());
}

fn smoke(gan: &CycleGan, batch: i64, height: i64, width: i64) -> cycle_gan::Result<()> {
    gan.check_image_size(batch, height, width)?;

    let config = gan.config();
    let options = (Kind::Float, config.device());
    let real_x = Tensor::zeros([batch, config.input_nc, height, width], options);
    let real_y = Tensor::zeros([batch, config.output_nc, height, width], options);

    tch::no_grad(|| -> cycle_gan::Result<()> {
        let fake_y = gan.translate_x_to_y(&real_x);
        let fake_x = gan.translate_y_to_x(&real_y);
        check_translation("g_xy", &fake_y, &[batch, config.output_nc, height, width])?;
        check_translation("g_yx", &fake_x, &[batch, config.input_nc, height, width])?;

        let score_map = fake_y.apply(gan.d_y());
        log::info!("d_y score map: {:?}", score_map.size());

        let losses = gan.losses(&real_x, &real_y);
        log::info!(
            "losses: adversarial={:.6} cycle={:.6} d_x={:.6} d_y={:.6}",
            losses.generator_adversarial.double_value(&[]),
            losses.cycle.double_value(&[]),
            losses.discriminator_x.double_value(&[]),
            losses.discriminator_y.double_value(&[])
        );
        Ok(())
    })
}

fn check_translation(name: &str, output: &Tensor, expected: &[i64]) -> cycle_gan::Result<()> {
    if output.size() != expected {
        return Err(CycleGanError::Validation(format!(
            "{name} produced {:?}, expected {:?}",
            output.size(),
            expected
        )));
    }

    let finite = output.isfinite().all().to_kind(Kind::Int64).int64_value(&[]) != 0;
    let bound = output.abs().max().double_value(&[]);
    if !finite || bound > 1.0 {
        return Err(CycleGanError::Validation(format!(
            "{name} output out of range (finite={finite}, max |x|={bound})"
        )));
    }

    log::info!("{name}: {:?}, max |x| = {:.4}", output.size(), bound);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::Device;

    #[test]
    fn test_check_translation_accepts_bounded_output() {
        let output = Tensor::full([1, 3, 8, 8], 0.5, (Kind::Float, Device::Cpu));
        assert!(check_translation("g_xy", &output, &[1, 3, 8, 8]).is_ok());
    }

    #[test]
    fn test_check_translation_rejects_wrong_shape() {
        let output = Tensor::zeros([1, 3, 8, 8], (Kind::Float, Device::Cpu));
        assert!(matches!(
            check_translation("g_xy", &output, &[1, 1, 8, 8]),
            Err(CycleGanError::Validation(_))
        ));
    }

    #[test]
    fn test_check_translation_rejects_out_of_range() {
        let output = Tensor::full([1, 1, 4, 4], 1.5, (Kind::Float, Device::Cpu));
        assert!(check_translation("g_yx", &output, &[1, 1, 4, 4]).is_err());

        let output = Tensor::full([1, 1, 4, 4], f64::NAN, (Kind::Float, Device::Cpu));
        assert!(check_translation("g_yx", &output, &[1, 1, 4, 4]).is_err());
    }

    #[test]
    fn test_smoke_rejects_collapsing_size() {
        let config = CycleGanConfig {
            n_residual_blocks: 1,
            ..Default::default()
        };
        let gan = CycleGan::new(config).unwrap();
        assert!(matches!(smoke(&gan, 1, 20, 20), Err(CycleGanError::Validation(_))));
        assert!(smoke(&gan, 1, 24, 24).is_ok());
    }
}
