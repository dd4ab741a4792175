//! Terminal stand-ins for the display and response-capture collaborators.
//!
//! A real deployment drives a calibrated display; this renderer presents
//! the stream symbols in the terminal centre and reports the LogMAR size
//! in a status line, which is enough for dry runs and timing rehearsal.

use acuity_core::{LogMar, StimulusFrame};
use acuity_experiment::{CancelToken, InputError, RenderError, Renderer, ResponseEvent, ResponseInput};
use acuity_timing::Timer;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, event, execute, queue, terminal};
use std::io::{self, Stdout, Write};
use std::time::Duration;

/// RAII guard for raw mode and the alternate screen.
pub struct TermGuard;

impl TermGuard {
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(
            io::stdout(),
            terminal::EnterAlternateScreen,
            cursor::Hide
        )?;
        Ok(TermGuard)
    }
}

impl Drop for TermGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

pub struct TermRenderer<T: Timer> {
    out: Stdout,
    timer: T,
}

impl<T: Timer> TermRenderer<T> {
    pub fn new(timer: T) -> Self {
        Self {
            out: io::stdout(),
            timer,
        }
    }

    fn show_centered(&mut self, text: &str, status: &str) -> io::Result<()> {
        let (cols, rows) = terminal::size()?;
        queue!(
            self.out,
            Clear(ClearType::All),
            cursor::MoveTo(cols / 2, rows / 2),
            Print(text),
            cursor::MoveTo(0, rows.saturating_sub(1)),
            Print(status)
        )?;
        self.out.flush()
    }
}

impl<T: Timer> Renderer for TermRenderer<T> {
    fn present_frame(&mut self, frame: &StimulusFrame, size: LogMar) -> Result<(), RenderError> {
        let status = format!("LogMAR {size} ({:.3} deg)", size.to_degrees());
        self.show_centered(&frame.symbol.to_string(), &status)?;
        self.timer.sleep(frame.duration);
        Ok(())
    }

    fn present_fixation(&mut self, duration: Duration) -> Result<(), RenderError> {
        self.show_centered("+", "")?;
        self.timer.sleep(duration);
        Ok(())
    }
}

/// Keyboard capture. Escape requests an operator abort through the
/// scheduler's cancel token and counts as no response for the trial.
pub struct TermInput<T: Timer> {
    timer: T,
    cancel: CancelToken,
}

impl<T: Timer> TermInput<T> {
    pub fn new(timer: T, cancel: CancelToken) -> Self {
        Self { timer, cancel }
    }
}

impl<T: Timer> ResponseInput for TermInput<T> {
    fn is_connected(&self) -> bool {
        true
    }

    fn await_response(&mut self, window: Duration) -> Result<Option<ResponseEvent>, InputError> {
        let deadline = self.timer.now_ns() + window.as_nanos() as u64;
        loop {
            let now = self.timer.now_ns();
            if now >= deadline {
                return Ok(None);
            }
            let remaining = Duration::from_nanos(deadline - now);
            if !event::poll(remaining)? {
                return Ok(None);
            }
            match event::read()? {
                Event::Key(KeyEvent {
                    code: KeyCode::Char(key),
                    kind: KeyEventKind::Press,
                    ..
                }) => {
                    return Ok(Some(ResponseEvent {
                        key,
                        at_ns: self.timer.now_ns(),
                    }));
                }
                Event::Key(KeyEvent {
                    code: KeyCode::Esc,
                    kind: KeyEventKind::Press,
                    ..
                }) => {
                    self.cancel.cancel();
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}
