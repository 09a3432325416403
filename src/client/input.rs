//! Main input prompt.
//!
//! On a terminal this renders a one-line `> ` editor in an inline viewport.
//! Piped input is read line by line instead.

use super::{is_interactive, with_inline_terminal};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::io::{self, BufRead};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

const PROMPT: &str = "> ";

/// One result of reading the input prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A submitted line, without its newline.
    Line(String),
    /// Ctrl-C at the prompt.
    Interrupted,
    /// Ctrl-D on an empty line, or end of piped input.
    Eof,
}

/// Where the session gets its lines from.
pub trait LineSource {
    fn next_line(&mut self) -> Result<InputEvent>;
}

/// Lines from the process's terminal or stdin.
pub struct TerminalInput {
    interactive: bool,
}

impl TerminalInput {
    pub fn new() -> Self {
        Self {
            interactive: is_interactive(),
        }
    }
}

impl Default for TerminalInput {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSource for TerminalInput {
    fn next_line(&mut self) -> Result<InputEvent> {
        if self.interactive {
            read_interactive()
        } else {
            Ok(read_piped(&mut io::stdin().lock())?)
        }
    }
}

fn read_interactive() -> Result<InputEvent> {
    with_inline_terminal(1, |terminal| {
        let mut input = Input::default();
        loop {
            terminal.draw(|frame| draw_input(frame, &input))?;

            if let Event::Key(key) = event::read()? {
                if let Some(done) = handle_key(&mut input, key) {
                    return Ok(done);
                }
            }
        }
    })
}

/// Apply one key to the editor. Returns an event once the line is done.
fn handle_key(input: &mut Input, key: KeyEvent) -> Option<InputEvent> {
    // Only handle key press events (not release)
    if key.kind != KeyEventKind::Press {
        return None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => Some(InputEvent::Line(input.value().to_string())),
        KeyCode::Char('c') if ctrl => Some(InputEvent::Interrupted),
        KeyCode::Char('d') if ctrl && input.value().is_empty() => Some(InputEvent::Eof),
        _ => {
            input.handle_event(&Event::Key(key));
            None
        }
    }
}

fn read_piped<R: BufRead>(reader: &mut R) -> io::Result<InputEvent> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(InputEvent::Eof);
    }
    let trimmed = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed);
    Ok(InputEvent::Line(line))
}

fn draw_input(frame: &mut Frame, input: &Input) {
    let area = frame.area();
    let prompt_width = PROMPT.len() as u16;
    let input_width = area.width.saturating_sub(prompt_width).max(1) as usize;

    // Scroll the input if cursor is beyond visible area
    let cursor_pos = input.visual_cursor();
    let scroll = if cursor_pos >= input_width {
        cursor_pos - input_width + 1
    } else {
        0
    };
    let visible: String = input.value().chars().skip(scroll).take(input_width).collect();

    let line = Line::from(vec![
        Span::styled(PROMPT, Style::default().fg(Color::Blue)),
        Span::styled(visible, Style::default().fg(Color::White)),
    ]);
    frame.render_widget(Paragraph::new(line), Rect { height: 1, ..area });

    let cursor_x = area.x + prompt_width + (cursor_pos - scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y));
}
