use cfg_if::cfg_if;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        /// Route `tracing` output to the browser console. Calling it twice is harmless.
        pub fn init() {
            let wasm_layer = tracing_wasm::WASMLayer::new(tracing_wasm::WASMLayerConfig::default());

            if tracing_subscriber::registry()
                .with(env_filter())
                .with(wasm_layer)
                .try_init()
                .is_err()
            {
                return;
            }

            #[cfg(feature = "console_error_panic_hook")]
            console_error_panic_hook::set_once();

            tracing::info!("roomwalk logging ready (wasm)");
        }
    } else {
        use once_cell::sync::OnceCell;
        use std::path::Path;
        use tracing_appender::non_blocking::WorkerGuard;
        use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
        use tracing_subscriber::fmt;

        /// Set once a subscriber is installed; holds the file writer's guard if there is one.
        static FILE_GUARD: OnceCell<Option<WorkerGuard>> = OnceCell::new();

        /// Daily-rolling appender writing `<dir>/<name>.<date>`.
        fn rolling_file(log_path: &Path) -> Result<RollingFileAppender, InitError> {
            let dir = log_path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let prefix = log_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "roomwalk.log".to_string());
            RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(prefix)
                .build(dir)
        }

        /// Log to stderr and to a daily-rolling file.
        ///
        /// `RUST_LOG` selects the filter, `ROOMWALK_LOG_FILE` the file
        /// (default `logs/roomwalk.log`). If the file cannot be opened only
        /// stderr is used. Calling it twice is harmless.
        pub fn init() {
            if FILE_GUARD.get().is_some() {
                return;
            }

            let log_path = std::env::var("ROOMWALK_LOG_FILE").unwrap_or_else(|_| "logs/roomwalk.log".to_string());
            let log_path = Path::new(&log_path);
            let (file_writer, guard, file_error) = match rolling_file(log_path) {
                Ok(appender) => {
                    let (writer, guard) = tracing_appender::non_blocking(appender);
                    (Some(writer), Some(guard), None)
                }
                Err(e) => (None, None, Some(e)),
            };

            let console_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .compact();

            let file_layer = file_writer.map(|writer| {
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .compact()
            });

            if tracing_subscriber::registry()
                .with(env_filter())
                .with(console_layer)
                .with(file_layer)
                .try_init()
                .is_err()
            {
                return;
            }
            let _ = FILE_GUARD.set(guard);

            std::panic::set_hook(Box::new(|info| {
                let location = info
                    .location()
                    .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                    .unwrap_or_else(|| "<unknown>".to_string());
                let payload = info
                    .payload()
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| info.payload().downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "<non-string panic>".to_string());
                let bt = std::backtrace::Backtrace::force_capture();
                tracing::error!(%location, "panic: {payload}\nBacktrace:\n{bt:?}");
            }));

            match file_error {
                None => tracing::info!(file = %log_path.display(), "roomwalk logging ready"),
                Some(e) => tracing::warn!(file = %log_path.display(), error = %e, "log file unavailable, logging to stderr only"),
            }
        }
    }
}
