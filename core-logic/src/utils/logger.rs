use chrono::Local;
use nu_ansi_term::{Color, Style};
use std::fmt;
use std::path::PathBuf;
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::Targets,
    fmt::{format::Writer, FmtContext, FormatEvent, FormatFields},
    prelude::*,
    registry::LookupSpan,
    EnvFilter, Layer,
};

/// Where and how much to log.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Used when `RUST_LOG` is not set, e.g. `"info"` or `"thorchain_spammer=debug"`.
    pub default_directive: String,
    /// Hourly rolling `spam.log.*` files are written here when set.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            default_directive: "info".to_string(),
            log_dir: None,
        }
    }
}

/// Installs the global subscriber. The returned guard flushes the file
/// writer and must be kept alive by the caller for the whole run.
pub fn setup_logger(config: &LoggerConfig) -> Option<WorkerGuard> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_directive));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .event_format(TerminalFormatter)
        .with_filter(console_filter);

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).ok();
            let file_appender = tracing_appender::rolling::hourly(dir, "spam.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .event_format(FileFormatter)
                .with_filter(file_targets());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init();

    guard
}

/// The file keeps per-send debug lines from the chain crate regardless of
/// `RUST_LOG`; everything else is INFO and up.
fn file_targets() -> Targets {
    Targets::new()
        .with_target("thorchain_spammer", Level::DEBUG)
        .with_default(Level::INFO)
}

// --- Formatters ---

struct MessageVisitor {
    message: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

fn event_message(event: &Event<'_>) -> String {
    let mut visitor = MessageVisitor {
        message: String::new(),
    };
    event.record(&mut visitor);
    visitor.message
}

/// `[WK 003 spam-7]` style prefix from the innermost `worker` span
fn worker_prefix<S, N>(ctx: &FmtContext<'_, S, N>) -> String
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    let Some(scope) = ctx.event_scope() else {
        return String::new();
    };
    for span in scope {
        if span.name() == "worker" {
            let ext = span.extensions();
            if let Some(fields) = ext.get::<tracing_subscriber::fmt::FormattedFields<N>>() {
                return format!("[{}] ", fields.fields);
            }
        }
    }
    String::new()
}

fn paint_level(level: &Level) -> String {
    let style = match *level {
        Level::ERROR => Style::new().fg(Color::LightRed).bold(),
        Level::WARN => Style::new().fg(Color::Yellow),
        Level::INFO => Style::new().fg(Color::Green),
        Level::DEBUG => Style::new().fg(Color::Blue),
        Level::TRACE => Style::new().fg(Color::White),
    };
    style.paint(format!("{:>5}", level)).to_string()
}

fn highlight_outcome(msg: String) -> String {
    if msg.contains("SUCCESS") {
        let green = Style::new().fg(Color::LightGreen).bold();
        msg.replace("SUCCESS", &green.paint("SUCCESS").to_string())
    } else if msg.contains("FAILED") {
        let red = Style::new().fg(Color::LightRed).bold();
        msg.replace("FAILED", &red.paint("FAILED").to_string())
    } else {
        msg
    }
}

pub struct TerminalFormatter;

impl<S, N> FormatEvent<S, N> for TerminalFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let time = Local::now().format("%H:%M:%S%.3f");
        let level = paint_level(event.metadata().level());
        let prefix = worker_prefix(ctx);
        let msg = highlight_outcome(event_message(event));

        writeln!(writer, "{} {} {}{}", time, level, prefix, msg)
    }
}

pub struct FileFormatter;

impl<S, N> FormatEvent<S, N> for FileFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let level = event.metadata().level();
        let prefix = worker_prefix(ctx);

        writeln!(
            writer,
            "{} [{}] {}{}",
            timestamp,
            level,
            prefix,
            event_message(event)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_outcome() {
        let plain = highlight_outcome("nothing to see".to_string());
        assert_eq!(plain, "nothing to see");

        let ok = highlight_outcome("send SUCCESS seq=4".to_string());
        assert!(ok.contains("\u{1b}["));
        assert!(ok.ends_with(" seq=4"));
    }

    #[test]
    fn test_file_targets() {
        let targets = file_targets();
        assert!(targets.would_enable("thorchain_spammer::spammer", &Level::DEBUG));
        assert!(targets.would_enable("spam_stats", &Level::INFO));
        assert!(!targets.would_enable("spam_stats", &Level::DEBUG));
        assert!(!targets.would_enable("reqwest", &Level::DEBUG));
    }

    #[test]
    fn test_setup_twice_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggerConfig {
            default_directive: "debug".to_string(),
            log_dir: Some(dir.path().to_path_buf()),
        };
        let guard = setup_logger(&config);
        assert!(guard.is_some());
        let _ = setup_logger(&LoggerConfig::default());
    }
}
