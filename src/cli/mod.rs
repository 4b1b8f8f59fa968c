//! Command-line interface.

pub mod commands;
pub mod context;
pub mod output;
pub mod types;

use std::process::ExitCode;

use console::style;

pub use context::AppContext;
pub use types::{Cli, Commands};

/// Report a failed command on stderr (or stdout as JSON) and map it to a
/// non-zero exit code.
pub fn handle_error(err: &anyhow::Error, json_mode: bool) -> ExitCode {
    if json_mode {
        let causes: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({
            "error": err.to_string(),
            "causes": causes,
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {err}", style("error:").red().bold());
        for cause in err.chain().skip(1) {
            eprintln!("  {} {cause}", style("caused by:").dim());
        }
    }
    ExitCode::FAILURE
}
