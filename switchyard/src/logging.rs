// Logging for switchyard
//
// Built on the `tracing` ecosystem. Runtime components emit structured events;
// an application picks how they are rendered by initializing a subscriber
// once, early in `main`.
//
// ```rust
// use switchyard::logging;
//
// // INFO level, human-readable console output
// logging::init_default();
//
// // Or a custom configuration
// let config = logging::LogConfig {
//     level: tracing::Level::DEBUG,
//     json_format: false,
//     ..Default::default()
// };
// logging::init(config);
// ```
//
// Loops and pools log lifecycle events at INFO, per-message and per-job events
// at DEBUG, recovered faults at WARN and panics at ERROR.

use std::io;
use std::sync::Once;
use tracing::{Level, Subscriber};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Whether to use JSON format for logs
    pub json_format: bool,
    /// Whether to include file and line information
    pub show_file_line: bool,
    /// Whether to include thread name/id
    pub show_thread_info: bool,
    /// Whether to include timestamps
    pub show_time: bool,
    /// Target filter expressions (format: "target=level,target2=level2,...")
    pub target_filters: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_file_line: true,
            show_thread_info: true,
            show_time: true,
            target_filters: None,
        }
    }
}

// Initialization guard to ensure we only initialize once
static INIT: Once = Once::new();

fn env_filter(config: &LogConfig) -> EnvFilter {
    let mut env_filter = EnvFilter::from_default_env().add_directive(config.level.into());

    if let Some(filters) = &config.target_filters {
        for filter in filters.split(',') {
            if let Ok(directive) = filter.parse() {
                env_filter = env_filter.add_directive(directive);
            }
        }
    }
    env_filter
}

/// Initialize the logging system with the given configuration.
///
/// Safe to call multiple times; only the first call takes effect.
pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let registry = tracing_subscriber::registry().with(env_filter(&config));

        let subscriber: Box<dyn Subscriber + Send + Sync> = if config.json_format {
            Box::new(registry.with(fmt::layer().json().flatten_event(true)))
        } else {
            let layer = fmt::layer()
                .with_ansi(atty::is(atty::Stream::Stdout))
                .with_file(config.show_file_line)
                .with_line_number(config.show_file_line)
                .with_thread_names(config.show_thread_info)
                .with_thread_ids(config.show_thread_info);
            if config.show_time {
                Box::new(registry.with(layer))
            } else {
                Box::new(registry.with(layer.without_time()))
            }
        };

        set_global_subscriber(subscriber);
    });
}

fn set_global_subscriber<S>(subscriber: S)
where
    S: Subscriber + Send + Sync + 'static,
{
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error setting global tracing subscriber: {}", err);
    }
}

/// Opens `path` in append mode, creating it if needed.
pub fn file_writer(path: &str) -> io::Result<Box<dyn io::Write + Send + Sync + 'static>> {
    use std::fs::OpenOptions;

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Box::new(file))
}

/// Initialize logging to both the console and `log_file`.
///
/// The file is checked up front so a bad path is reported instead of being
/// silently replaced by stderr later.
pub fn init_with_file(config: LogConfig, log_file: &str) -> io::Result<()> {
    file_writer(log_file)?;

    INIT.call_once(|| {
        let console_layer = fmt::layer()
            .with_ansi(atty::is(atty::Stream::Stdout))
            .with_file(config.show_file_line)
            .with_line_number(config.show_file_line)
            .with_thread_names(config.show_thread_info)
            .with_thread_ids(config.show_thread_info);

        let log_file_path = log_file.to_string();
        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(move || match file_writer(&log_file_path) {
                Ok(writer) => writer,
                Err(_) => Box::new(io::stderr()),
            })
            .with_file(true)
            .with_line_number(true)
            .with_thread_names(true)
            .with_thread_ids(true);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter(&config))
            .with(console_layer)
            .with(file_layer);

        set_global_subscriber(subscriber);
    });

    Ok(())
}

/// INFO level, human-readable console output.
pub fn init_default() {
    init(LogConfig::default());
}

/// DEBUG level with TRACE for the actor loop, for local development.
pub fn init_development() {
    init(LogConfig {
        level: Level::DEBUG,
        target_filters: Some("switchyard=debug,switchyard::actor=trace".to_string()),
        ..Default::default()
    });
}

/// JSON output without file/line information, for log aggregators.
pub fn init_production() {
    init(LogConfig {
        level: Level::INFO,
        json_format: true,
        show_file_line: false,
        show_thread_info: true,
        show_time: true,
        target_filters: None,
    });
}

/// Warnings and errors only, compact, for test binaries.
///
/// ```rust
/// #[test]
/// fn my_test() {
///     switchyard::logging::init_test();
/// }
/// ```
pub fn init_test() {
    init(LogConfig {
        level: Level::WARN,
        json_format: false,
        show_file_line: true,
        show_thread_info: false,
        show_time: false,
        target_filters: None,
    });
}

/// Span wrapping the whole life of one actor loop.
///
/// ```rust
/// let span = switchyard::loop_span!(uuid::Uuid::new_v4());
/// let _guard = span.enter();
/// ```
#[macro_export]
macro_rules! loop_span {
    ($loop_id:expr) => {
        $crate::tracing::info_span!("actor_loop", id = %$loop_id)
    };
    ($loop_id:expr, $($fields:tt)*) => {
        $crate::tracing::info_span!("actor_loop", id = %$loop_id, $($fields)*)
    };
}

/// Span wrapping one pool worker.
#[macro_export]
macro_rules! worker_span {
    ($worker_id:expr) => {
        $crate::tracing::debug_span!("worker", id = $worker_id)
    };
    ($worker_id:expr, $($fields:tt)*) => {
        $crate::tracing::debug_span!("worker", id = $worker_id, $($fields)*)
    };
}

/// Lifecycle events of loops and pools.
///
/// ```rust
/// switchyard::log_lifecycle!("actor_loop", "loop-1", "started");
/// switchyard::log_lifecycle!("pool", "pool-7", "finished", processed = 10);
/// ```
#[macro_export]
macro_rules! log_lifecycle {
    ($component:expr, $id:expr, $event:expr) => {
        $crate::tracing::info!(component = $component, id = %$id, event = $event);
    };
    ($component:expr, $id:expr, $event:expr, $($fields:tt)*) => {
        $crate::tracing::info!(component = $component, id = %$id, event = $event, $($fields)*);
    };
}

/// Current tracing dispatcher, for threads spawned outside the runtime.
#[inline]
pub fn current_subscriber() -> tracing::Dispatch {
    tracing::dispatcher::get_default(|d| d.clone())
}

pub use tracing::{debug, error, info, trace, warn};
