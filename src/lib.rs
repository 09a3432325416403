//! synax - a terminal chat client for local LLMs.
//!
//! Relays each line to an Ollama server and prints the reply. Replies of the
//! form `ACTION: <command>` are offered for execution: the user confirms, a
//! keyword denylist screens the command, and the captured output is shown.

pub mod action;
pub mod client;
pub mod config;
pub mod context;
pub mod history;
pub mod llm;
pub mod prompt;
pub mod protocol;
pub mod session;
