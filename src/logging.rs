use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the logging system with both console and file output.
///
/// The console layer writes to stderr so `export` output on stdout stays clean.
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes and closes the file writer.
pub fn init_logging(log_dir: &Path) -> Option<WorkerGuard> {
    let filter = env_filter();

    // Without a writable log dir fall back to console only
    if fs::create_dir_all(log_dir).is_err() {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init();
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, "kiddos.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();

    Some(guard)
}

/// `RUST_LOG` plus info-level defaults for the library and the `kiddos` binary.
fn env_filter() -> EnvFilter {
    ["kiddos_pipeline=info", "kiddos=info"]
        .iter()
        .filter_map(|d| d.parse::<Directive>().ok())
        .fold(EnvFilter::from_default_env(), |filter, directive| {
            filter.add_directive(directive)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_covers_library_and_binary() {
        let rendered = env_filter().to_string();
        assert!(rendered.contains("kiddos_pipeline=info"));
        assert!(rendered.contains("kiddos=info"));
    }
}
