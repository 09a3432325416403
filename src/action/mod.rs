//! Classification and execution of model-proposed actions.
//!
//! A model reply that starts with [`ACTION_MARKER`] is a request to run a
//! shell command. Everything else is plain text for the user. The marker is
//! trusted as-is; the [`gate`] and the confirmation prompt are what stand
//! between the model and the shell.

pub mod executor;
pub mod gate;

pub use executor::{ExecError, Executor};
pub use gate::{CommandGate, GateDecision};

/// Prefix that marks a reply as a command request.
pub const ACTION_MARKER: &str = "ACTION:";

/// Code fence language tags dropped when a command arrives fenced.
const FENCE_TAGS: &[&str] = &["sh", "bash", "shell", "zsh", "fish", "console", "shell-session"];

/// What to do with a model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Show the text to the user.
    Display(String),
    /// Ask the user to run this command.
    Execute(String),
}

/// Decide whether a reply is plain text or a command request.
pub fn route(reply: &str) -> Action {
    let Some(rest) = reply.trim().strip_prefix(ACTION_MARKER) else {
        return Action::Display(reply.to_string());
    };

    let command = clean_command(rest);
    if command.is_empty() {
        // Marker with nothing usable after it.
        return Action::Display(rest.trim().to_string());
    }
    Action::Execute(command)
}

/// Strip markdown fences, backticks and whitespace around a command.
fn clean_command(raw: &str) -> String {
    let mut command = raw.trim();

    if let Some(rest) = command.strip_prefix("```") {
        command = rest;
        if let Some((first, remainder)) = command.split_once('\n') {
            if FENCE_TAGS.contains(&first.trim().to_lowercase().as_str()) {
                command = remainder;
            }
        }
    }

    if let Some(rest) = command.trim_end().strip_suffix("```") {
        command = rest;
    }

    command
        .trim_matches(|c: char| c == '`' || c.is_whitespace())
        .to_string()
}
