//! Startup tasks
//!
//! Includes:
//! - Logger initialization
//! - Configuration loading into the managed service state

use anstyle::{AnsiColor, Style};
use env_logger::{Builder, WriteStyle};
use log::kv::Key;
use log::{error, info};
use std::io::Write;

use crate::api::ServiceState;
use crate::config::load_config;
use crate::workflow::Orchestrator;

// ────────────────────────────────────────────────────────────────
// Logger Initialization
// ────────────────────────────────────────────────────────────────

const DIM: Style = AnsiColor::BrightBlack.on_default();
const ITEM: Style = AnsiColor::Magenta.on_default();
const DURATION: Style = AnsiColor::Cyan.on_default();

/// Extract the `duration` key and format it to 2 decimal places.
fn format_duration(record: &log::Record<'_>) -> String {
    record
        .key_values()
        .get(Key::from("duration"))
        .map(|v| {
            let s = format!("{}", v);
            if let Some(idx) = s.find(|c: char| c.is_alphabetic()) {
                let (num, unit) = (&s[..idx], &s[idx..]);
                if let Ok(val) = num.parse::<f32>() {
                    return format!("{:.2} {}", val, unit);
                }
            }
            s
        })
        .unwrap_or_default()
}

/// Initialize the global logger. `RUST_LOG` overrides the default filters.
pub fn initialize_logger() {
    Builder::new()
        .write_style(WriteStyle::Auto)
        .format(|buf, record| {
            let ts = buf.timestamp();
            let level_style = buf.default_level_style(record.level());

            let item = record
                .key_values()
                .get(Key::from("item_id"))
                .map(|v| format!(" [{}]", v))
                .unwrap_or_default();

            let dur = format_duration(record);
            let dur = if dur.is_empty() {
                " ".repeat(10)
            } else {
                format!("{:>10}", dur)
            };

            writeln!(
                buf,
                "{}{}{} {}{:<5}{} {}{}{}{}{}{} {}{}{} {}",
                DIM.render(),
                ts,
                DIM.render_reset(),
                level_style.render(),
                record.level(),
                level_style.render_reset(),
                DIM.render(),
                record.target(),
                DIM.render_reset(),
                ITEM.render(),
                item,
                ITEM.render_reset(),
                DURATION.render(),
                dur,
                DURATION.render_reset(),
                record.args()
            )
        })
        // Only show INFO+ globally, WARN+ for Rocket
        .filter(None, log::LevelFilter::Info)
        .filter(Some("rocket"), log::LevelFilter::Warn)
        .parse_default_env()
        .init();
}

// ────────────────────────────────────────────────────────────────
// Service State
// ────────────────────────────────────────────────────────────────

/// Validate configuration once and build the state the routes serve from.
///
/// A missing variable does not stop the server: the endpoint answers `500`
/// until the environment is fixed, while `OPTIONS` keeps working.
pub fn initialize_state() -> anyhow::Result<ServiceState> {
    match load_config() {
        Ok(config) => {
            info!("Loaded configuration: {:?}", config);
            let orchestrator = Orchestrator::from_config(&config)?;
            info!("Pipeline settings: {:?}", orchestrator.settings());
            Ok(ServiceState::Ready(orchestrator))
        }
        Err(err) => {
            error!("Server misconfigured: {}", err);
            Ok(ServiceState::Misconfigured(err.to_string()))
        }
    }
}
