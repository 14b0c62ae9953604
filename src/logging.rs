use std::path::Path;

use flexi_logger::{
    colored_default_format, opt_format, Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming,
};

/// Start the global logger.
///
/// `level` is used unless `RUST_LOG` is set. Without a directory, logs go to
/// stderr; with one, they go to size-rotated files inside it.
/// The returned handle must be kept alive for the duration of the program.
pub fn setup_logging(level: &str, log_dir: Option<&Path>) -> crate::Result<LoggerHandle> {
    let logger = Logger::try_with_env_or_str(level)?;

    let handle = match log_dir {
        Some(dir) => logger
            .log_to_file(FileSpec::default().directory(dir))
            .format(opt_format)
            .rotate(
                Criterion::Size(10 * 1024 * 1024), // 10 MB per file
                Naming::Numbers,
                Cleanup::KeepLogFiles(3),
            )
            .start()?,
        None => logger.format(colored_default_format).start()?,
    };

    Ok(handle)
}
