//! Console and file logging setup.
use std::path::Path;

use eyre::WrapErr;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::FILE_GUARD;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber.
///
/// Filter precedence: `RUST_LOG`, then `--log-level`, then `[logging].level`,
/// then `info`. Console output goes to stderr so stdout stays machine-readable.
pub fn init(json: bool, cli_level: Option<&str>, cfg: Option<&sprayer_config::Logging>) -> eyre::Result<()> {
    let level = cli_level
        .or_else(|| cfg.and_then(|c| c.level.as_deref()))
        .unwrap_or("info");
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        layers.push(console.json().with_filter(filter()).boxed());
    } else {
        layers.push(console.with_filter(filter()).boxed());
    }

    if let Some(file) = cfg.and_then(|c| c.file.as_deref()) {
        let rotation = cfg.and_then(|c| c.rotation.as_deref()).unwrap_or("never");
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)
            .wrap_err_with(|| format!("create log directory {}", dir.display()))?;
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file has no file name: {file}"))?;
        let appender = match rotation {
            "daily" => rolling::daily(dir, name),
            "hourly" => rolling::hourly(dir, name),
            _ => rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .json()
                .with_filter(filter())
                .boxed(),
        );
    }

    Registry::default()
        .with(layers)
        .try_init()
        .wrap_err("install tracing subscriber")
}
