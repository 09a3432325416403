//! Loading indicator shown while waiting for the model.

use crossterm::{
    cursor::{Hide, MoveToColumn, Show},
    execute, queue,
    style::{Print, Stylize},
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const FRAMES: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const FRAME_INTERVAL: Duration = Duration::from_millis(80);

/// Braille spinner drawn at the start of the current line.
///
/// Must be stopped before anything else is printed.
pub struct Spinner {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Spinner {
    /// Start spinning. When `enabled` is false nothing is drawn.
    pub fn start(enabled: bool) -> Self {
        if !enabled {
            return Self {
                stop: None,
                task: None,
            };
        }

        let (tx, mut rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let mut stdout = io::stdout();
            let _ = execute!(stdout, Hide);
            let mut interval = tokio::time::interval(FRAME_INTERVAL);
            let mut frame = 0;
            loop {
                tokio::select! {
                    _ = &mut rx => break,
                    _ = interval.tick() => {
                        let _ = queue!(stdout, MoveToColumn(0), Print(FRAMES[frame].blue()));
                        let _ = stdout.flush();
                        frame = (frame + 1) % FRAMES.len();
                    }
                }
            }
            clear_line();
        });

        Self {
            stop: Some(tx),
            task: Some(task),
        }
    }

    /// Stop and erase the spinner, waiting until the line is clean.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            clear_line();
        }
    }
}

fn clear_line() {
    let _ = execute!(io::stdout(), MoveToColumn(0), Clear(ClearType::CurrentLine), Show);
}
