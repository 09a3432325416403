//! Terminal side of synax.
//!
//! - Reads user lines (`input`)
//! - Asks for confirmation before running an action (`confirm`)
//! - Shows a spinner while the model works (`spinner`)
//! - Prints the startup banner (`banner`)
//!
//! Interactive widgets draw into a small ratatui inline viewport below the
//! cursor, so the conversation scrollback stays intact.

pub mod banner;
pub mod confirm;
pub mod input;
pub mod spinner;

pub use confirm::{Confirmer, TerminalConfirmer};
pub use input::{InputEvent, LineSource, TerminalInput};
pub use spinner::Spinner;

use anyhow::Result;
use crossterm::{
    cursor::{MoveTo, Show},
    execute,
    style::{Color, Print, Stylize},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{backend::CrosstermBackend, Terminal, TerminalOptions, Viewport};
use std::fmt::Display;
use std::io::{self, Stdout};
use std::sync::LazyLock;

pub(crate) type InlineTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Whether both stdin and stdout are attached to a terminal.
pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout)
}

static COLOR_ENABLED: LazyLock<bool> = LazyLock::new(is_interactive);

/// Color `text` when attached to a terminal, plain text otherwise.
pub fn paint(text: impl Display, color: Color) -> String {
    colorize(*COLOR_ENABLED, text, color)
}

fn colorize(enabled: bool, text: impl Display, color: Color) -> String {
    if enabled {
        crossterm::style::style(text).with(color).to_string()
    } else {
        text.to_string()
    }
}

/// Raw mode for as long as the guard lives.
pub(crate) struct RawModeGuard;

impl RawModeGuard {
    pub(crate) fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Run `f` in raw mode against an inline viewport `height` rows tall.
///
/// Raw mode is released on every exit path, and the cursor is left on the
/// line below the viewport.
pub(crate) fn with_inline_terminal<T>(
    height: u16,
    f: impl FnOnce(&mut InlineTerminal) -> Result<T>,
) -> Result<T> {
    let _raw = RawModeGuard::enable()?;
    let mut terminal = Terminal::with_options(
        CrosstermBackend::new(io::stdout()),
        TerminalOptions {
            viewport: Viewport::Inline(height.max(1)),
        },
    )?;

    let result = f(&mut terminal);

    let bottom = terminal.get_frame().area().bottom();
    drop(terminal);
    execute!(
        io::stdout(),
        MoveTo(0, bottom.saturating_sub(1)),
        Print("\r\n"),
        Show
    )?;

    result
}
