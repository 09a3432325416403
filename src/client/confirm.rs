//! Execute/Cancel confirmation before running an action.
//!
//! On a terminal the user moves a cursor between the two choices with the
//! arrow keys and picks one with Enter; Ctrl-C or Esc cancel. Without a
//! terminal the prompt falls back to a `(y/N)` question on stdin.

use super::{is_interactive, paint, with_inline_terminal};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Color as TermColor;
use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Style},
    text::Line,
    widgets::Paragraph,
    Frame,
};
use std::io::{self, BufRead, Write};
use tracing::debug;
use unicode_width::UnicodeWidthChar;

const HEADER: &str = "Authorize execution of:";

/// The two choices, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Execute,
    Cancel,
}

const CHOICES: [Choice; 2] = [Choice::Execute, Choice::Cancel];

impl Choice {
    pub fn label(self) -> &'static str {
        match self {
            Choice::Execute => "Execute command",
            Choice::Cancel => "Cancel",
        }
    }
}

/// Answers accepted as "yes" by the line fallback, English and French.
const AFFIRMATIVE: &[&str] = &["y", "yes", "o", "oui"];

/// Result of feeding one key to the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Cursor moved; the prompt needs a redraw.
    Moved,
    /// Key has no meaning here.
    Ignored,
    /// The prompt is over; `true` means run the command.
    Resolved(bool),
}

/// Cursor over [`CHOICES`]. Starts on Execute.
#[derive(Debug, Default)]
pub struct Selector {
    cursor: usize,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Choice {
        CHOICES[self.cursor]
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Step {
        if key.kind != KeyEventKind::Press {
            return Step::Ignored;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Step::Resolved(false)
            }
            KeyCode::Esc => Step::Resolved(false),
            KeyCode::Enter => Step::Resolved(self.selected() == Choice::Execute),
            KeyCode::Left | KeyCode::Up => {
                self.cursor = (self.cursor + CHOICES.len() - 1) % CHOICES.len();
                Step::Moved
            }
            KeyCode::Right | KeyCode::Down => {
                self.cursor = (self.cursor + 1) % CHOICES.len();
                Step::Moved
            }
            _ => Step::Ignored,
        }
    }
}

/// Source of key presses for the selector.
pub trait KeySource {
    fn next_key(&mut self) -> io::Result<KeyEvent>;
}

/// Keys read from the terminal. Only valid while raw mode is on.
struct TerminalKeys;

impl KeySource for TerminalKeys {
    fn next_key(&mut self) -> io::Result<KeyEvent> {
        loop {
            if let Event::Key(key) = event::read()? {
                return Ok(key);
            }
        }
    }
}

/// Drive a selector until Enter or cancel, rendering after every move.
pub fn run_selector<K, R>(keys: &mut K, mut render: R) -> Result<bool>
where
    K: KeySource,
    R: FnMut(&Selector) -> Result<()>,
{
    let mut selector = Selector::new();
    render(&selector)?;

    loop {
        match selector.handle_key(keys.next_key()?) {
            Step::Moved => render(&selector)?,
            Step::Ignored => {}
            Step::Resolved(answer) => return Ok(answer),
        }
    }
}

/// Asks before an action runs. One prompt at a time.
pub trait Confirmer {
    fn confirm(&mut self, command: &str) -> Result<bool>;
}

/// Confirmer backed by the real terminal.
#[derive(Debug, Default)]
pub struct TerminalConfirmer;

impl Confirmer for TerminalConfirmer {
    fn confirm(&mut self, command: &str) -> Result<bool> {
        confirm(command)
    }
}

/// Ask whether to run `command`, interactively when possible.
pub fn confirm(command: &str) -> Result<bool> {
    let answer = if is_interactive() {
        confirm_interactive(command)?
    } else {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        confirm_line(command, &mut stdin.lock(), &mut stdout)?
    };
    debug!("Confirmation for {:?}: {}", command, answer);
    Ok(answer)
}

fn confirm_interactive(command: &str) -> Result<bool> {
    let (width, height) = crossterm::terminal::size()?;
    let rows = wrap_command(command, width);

    // A prompt taller than the terminal would be clipped, so the command is
    // printed into the scrollback and only the choices stay inline.
    let inline_rows = if fits_inline(&rows, height) {
        println!();
        Some(rows.as_slice())
    } else {
        let mut stdout = io::stdout();
        write_command_block(&mut stdout, &rows)?;
        stdout.flush()?;
        None
    };

    with_inline_terminal(prompt_height(inline_rows), |terminal| {
        run_selector(&mut TerminalKeys, |selector| {
            terminal.draw(|frame| draw_prompt(frame, inline_rows, selector))?;
            Ok(())
        })
    })
}

/// Line-based fallback: `true` only for an affirmative answer.
///
/// Only used without a terminal, so the question is written unstyled.
pub fn confirm_line<R, W>(command: &str, input: &mut R, output: &mut W) -> io::Result<bool>
where
    R: BufRead,
    W: Write,
{
    write!(output, "\nAuthorize execution of \"{}\"? (y/N): ", command)?;
    output.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        return Ok(false);
    }
    Ok(is_affirmative(&answer))
}

fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    AFFIRMATIVE.contains(&answer.as_str())
}

/// Split the quoted command into rows no wider than `width` columns.
///
/// Widths are display columns, so double-width characters count twice.
fn wrap_command(command: &str, width: u16) -> Vec<String> {
    let width = usize::from(width.max(1));
    let quoted = format!("\"{}\"", command);

    let mut rows = Vec::new();
    for line in quoted.lines() {
        let mut row = String::new();
        let mut row_width = 0;
        for c in line.chars() {
            let w = c.width().unwrap_or(0);
            if row_width + w > width && !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }
            row.push(c);
            row_width += w;
        }
        rows.push(row);
    }
    rows
}

/// Header, command rows, then one row per choice. `None` means the command
/// was printed above the viewport and only the choices are drawn.
fn prompt_height(command_rows: Option<&[String]>) -> u16 {
    let rows = match command_rows {
        Some(rows) => 1 + rows.len() + CHOICES.len(),
        None => CHOICES.len(),
    };
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn fits_inline(command_rows: &[String], terminal_height: u16) -> bool {
    prompt_height(Some(command_rows)) <= terminal_height
}

/// Header and command rows printed straight to the output.
fn write_command_block<W: Write>(output: &mut W, command_rows: &[String]) -> io::Result<()> {
    write!(output, "\r\n{}\r\n", paint(HEADER, TermColor::Magenta))?;
    for row in command_rows {
        write!(output, "{}\r\n", paint(row, TermColor::DarkGrey))?;
    }
    Ok(())
}

fn draw_prompt(frame: &mut Frame, command_rows: Option<&[String]>, selector: &Selector) {
    let choices_area = match command_rows {
        Some(rows) => {
            let [header_area, command_area, choices_area] = Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(rows.len() as u16),
                Constraint::Length(CHOICES.len() as u16),
            ])
            .areas(frame.area());

            frame.render_widget(
                Paragraph::new(HEADER).style(Style::default().fg(Color::Magenta)),
                header_area,
            );

            let command_lines: Vec<Line> = rows.iter().map(|r| Line::from(r.as_str())).collect();
            frame.render_widget(
                Paragraph::new(command_lines).style(Style::default().fg(Color::DarkGray)),
                command_area,
            );
            choices_area
        }
        None => frame.area(),
    };

    let choice_lines: Vec<Line> = CHOICES
        .iter()
        .enumerate()
        .map(|(i, choice)| {
            if i == selector.cursor() {
                Line::styled(format!("> {}", choice.label()), Style::default().fg(Color::Blue))
            } else {
                Line::from(format!("  {}", choice.label()))
            }
        })
        .collect();
    frame.render_widget(Paragraph::new(choice_lines), choices_area);
}
