// src/utils/logging.rs
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::utils::config::NodeConfig;
use crate::utils::error::{NodeError, Result};

/// Installs the global subscriber. `RUST_LOG` wins over `node.log_level`.
///
/// When `node.log_dir` is set a daily rolling file is written alongside
/// stdout; the returned guard must live until the process exits or buffered
/// lines are lost.
pub fn init_tracing(node: &NodeConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&node.log_level))
        .map_err(|e| NodeError::Logging(e.to_string()))?;

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .with_file(true)
        .with_line_number(true);

    match &node.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(Path::new(dir), format!("{}.log", node.id));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = fmt::layer().with_ansi(false).with_writer(writer);

            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .with(file_layer)
                .try_init()
                .map_err(|e| NodeError::Logging(e.to_string()))?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .try_init()
                .map_err(|e| NodeError::Logging(e.to_string()))?;
            Ok(None)
        }
    }
}
