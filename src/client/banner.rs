//! Startup banner and help text.

use super::paint;
use crossterm::style::Color;

const ASCII_ART: &str = r#"
   ____  __  __  _   _     _    __  __
  / ___| \ \/ / | \ | |   / \   \ \/ /
  \___ \  \  /  |  \| |  / _ \   \  /
   ___) | /  \  | |\  | / ___ \  /  \
  |____/ /_/\_\ |_| \_|/_/   \_\/_/\_\
"#;

/// Print the banner with the connection details.
pub fn print_banner(host: &str, model: &str, is_default_model: bool) {
    println!("{}", paint(ASCII_ART, Color::Blue));
    println!("{}", paint(format!(" Connected to: {}", host), Color::DarkGrey));
    let default_note = if is_default_model { " (default)" } else { "" };
    println!("{}", paint(format!(" Model: {}{}", model, default_note), Color::DarkGrey));
    println!(
        "{}",
        paint(" Type \"exit\" or \"quit\" to quit, \"clear\" to clear history", Color::DarkGrey)
    );
    println!("{}", paint(" Type \"help\" to see available commands\n", Color::DarkGrey));
}

/// Commands listed by `help`.
const COMMANDS: [(&str, &str); 4] = [
    ("exit/quit", "Quit the program"),
    ("clear", "Clear conversation history"),
    ("help", "Display this help"),
    ("status", "Check connection to the model"),
];

pub fn print_help() {
    println!("{}", paint("\nAvailable commands:", Color::Cyan));
    for (name, description) in COMMANDS {
        println!("{}", paint(format!("  {:<10} - {}", name, description), Color::DarkGrey));
    }
    println!();
}
