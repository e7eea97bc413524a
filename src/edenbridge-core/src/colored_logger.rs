//! Colored logging with per-component prefixes
//!
//! The controller, the camera backends and the notifier log through the same
//! subscriber; each line is prefixed with the component derived from the
//! event's target module.

use owo_colors::{OwoColorize, Style};
use std::fmt;
use std::io;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::{
    format::{Writer, FormatEvent, FormatFields},
    FmtContext,
};
use tracing_subscriber::registry::LookupSpan;

/// Component identifier for prefixing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Main,
    Control,
    Camera,
    Notify,
}

impl Component {
    /// Map a tracing target (module path) to the component that emitted it
    pub fn from_target(target: &str) -> Self {
        if target.starts_with("edenbridge_capture") {
            Component::Camera
        } else if target.starts_with("edenbridge_core::controller") {
            Component::Control
        } else if target.starts_with("edenbridge_core::notifier") {
            Component::Notify
        } else {
            Component::Main
        }
    }

    /// Get the string representation for logging prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Main => "MAIN",
            Component::Control => "CONTROL",
            Component::Camera => "CAMERA",
            Component::Notify => "NOTIFY",
        }
    }

    /// Get the color style for this component
    pub fn color_style(&self) -> Style {
        match self {
            Component::Main => Style::new().cyan().bold(),
            Component::Control => Style::new().green().bold(),
            Component::Camera => Style::new().yellow().bold(),
            Component::Notify => Style::new().magenta().bold(),
        }
    }
}

/// Formatter with component prefixes and colors
pub struct ColoredFormatter;

impl<S, N> FormatEvent<S, N> for ColoredFormatter
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
        let metadata = event.metadata();

        // Timestamp (HH:MM:SS format)
        let now = chrono::Local::now();
        write!(writer, "{} ", now.format("%H:%M:%S").dimmed())?;

        let component = Component::from_target(metadata.target());
        let prefix = format!("[{:7}]", component.as_str());
        write!(writer, "{} ", prefix.style(component.color_style()))?;

        let level = metadata.level();
        match *level {
            Level::ERROR => write!(writer, "{} ", "ERROR".red().bold())?,
            Level::WARN => write!(writer, "{} ", "WARN ".yellow().bold())?,
            Level::INFO => write!(writer, "{} ", "INFO ".green().bold())?,
            Level::DEBUG => write!(writer, "{} ", "DEBUG".blue().bold())?,
            Level::TRACE => write!(writer, "{} ", "TRACE".dimmed().bold())?,
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Initialize colored logging on stderr
///
/// `RUST_LOG` directives are honoured; `verbose` lowers the default level
/// from INFO to DEBUG. Call once per process.
pub fn init_component_logger(verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .event_format(ColoredFormatter)
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(level.into()))
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
