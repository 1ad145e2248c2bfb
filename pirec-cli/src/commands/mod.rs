//! CLI command implementations

mod config;
mod direct;
mod info;
mod presets;
mod record;

pub use config::{config, ConfigArgs};
pub use direct::{direct, DirectArgs};
pub use info::info;
pub use presets::{presets, PresetsArgs};
pub use record::{record, RecordArgs};

use std::process::ExitCode;

use pirec_core::error::PirecError;

/// Print the failure block shared by both recording commands to stderr
pub(crate) fn report_failure(err: &PirecError) -> ExitCode {
    eprintln!();
    eprintln!("Recording failed.");
    eprintln!("  {}", err);
    if let Some(stderr) = err.diagnostics() {
        eprintln!();
        eprintln!("--- stderr ---");
        eprintln!("{}", stderr);
        eprintln!("--------------");
    }
    if let Some(hint) = err.user_hint() {
        eprintln!();
        eprintln!("{}", hint);
    }
    if !err.is_user_recoverable() {
        eprintln!();
        eprintln!("Re-run with -vv for the full command lines and process output.");
    }
    ExitCode::FAILURE
}
