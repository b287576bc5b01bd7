//! Terminal front ends.
//!
//! Two ways to drive a [`Session`]:
//!
//! - [`run_interactive`]: raw-mode crossterm loop for a tty.  Keys feed
//!   the session, a budgeted executor slice runs every poll interval, and
//!   finished lines scroll above a live input block.
//! - [`run_batch`]: line loop for pipes and scripts.  Lines accumulate
//!   until they form a complete command; program output goes to the
//!   writer, suppressed errors to whatever logger the session carries.
//!
//! The session never touches the terminal itself.  It talks to a shared
//! [`ConsoleSink`], and the loop here moves sink contents onto the screen.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::mem;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::Print,
    terminal::{self, Clear, ClearType},
};

use crate::config::ConsoleConfig;
use crate::exec::{InstructionBudget, StackCpu};
use crate::session::{Console, Key, Logger, Session};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

// ── Sinks ─────────────────────────────────────────────────────────────────────

/// Buffer between the session and the interactive loop.
///
/// The session pushes finished lines and input-display updates in here
/// (through the [`Console`] and [`Logger`] impls); the loop drains them
/// once per iteration and paints the screen.
#[derive(Default)]
pub struct ConsoleSink {
    lines: Vec<String>,
    input: String,
    cursor: usize,
    input_changed: bool,
}

impl ConsoleSink {
    pub fn new() -> ConsoleSink {
        ConsoleSink::default()
    }

    /// Drain the lines queued since the last call.
    pub fn take_lines(&mut self) -> Vec<String> {
        mem::take(&mut self.lines)
    }

    /// The input display, if it changed since the last call.
    pub fn take_input_change(&mut self) -> Option<(String, usize)> {
        if !self.input_changed {
            return None;
        }
        self.input_changed = false;
        Some((self.input.clone(), self.cursor))
    }
}

impl Console for ConsoleSink {
    fn print(&mut self, text: &str) {
        self.lines.push(text.to_owned());
    }

    fn replace_input(&mut self, text: &str, cursor: usize) {
        self.input = text.to_owned();
        self.cursor = cursor;
        self.input_changed = true;
    }
}

impl Logger for ConsoleSink {
    fn log(&mut self, message: &str) {
        self.lines.push(format!("% {message}"));
    }
}

/// Batch-mode logger: suppressed errors go to stderr so stdout stays
/// pure program output.
pub struct StderrLogger;

impl Logger for StderrLogger {
    fn log(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

// ── Raw mode ──────────────────────────────────────────────────────────────────

/// RAII guard for terminal raw mode.  Restores the cursor and cooked mode
/// on drop, including during a panic unwind.
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn enter() -> io::Result<RawModeGuard> {
        terminal::enable_raw_mode()?;
        Ok(RawModeGuard)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let mut out = io::stdout();
        let _ = execute!(out, cursor::Show);
        let _ = terminal::disable_raw_mode();
    }
}

// ── Screen ────────────────────────────────────────────────────────────────────

/// Build the display rows for the input block: the first row carries the
/// prompt, continuation rows are bare.
fn input_rows(prompt: &str, text: &str) -> Vec<String> {
    text.split('\n')
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                format!("{prompt}{line}")
            } else {
                line.to_owned()
            }
        })
        .collect()
}

/// Map a char index into the edit buffer to a (row, column) position in
/// the display rows, accounting for the prompt on row 0.
fn locate_cursor(prompt: &str, text: &str, cursor: usize) -> (usize, usize) {
    let mut row = 0;
    let mut col = 0;
    for (i, ch) in text.chars().enumerate() {
        if i == cursor {
            break;
        }
        if ch == '\n' {
            row += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    if row == 0 {
        col += prompt.chars().count();
    }
    (row, col)
}

/// Fit one display row into `width` columns.  When the cursor would fall
/// off the right edge, show the window that ends at the cursor.
fn window_row(row: &str, cursor: usize, width: usize) -> (String, u16) {
    if cursor + 1 > width {
        let start = cursor + 1 - width;
        let shown: String = row.chars().skip(start).take(width).collect();
        (shown, (width - 1) as u16)
    } else {
        let shown: String = row.chars().take(width).collect();
        (shown, cursor as u16)
    }
}

/// Inline terminal renderer.  Scrollback lines are written with `\r\n`
/// (required in raw mode) and the live input block is redrawn in place at
/// the bottom.  Drawing is best-effort; only `flush` reports failure.
pub struct Screen {
    out: Box<dyn Write>,
    width: u16,
    /// Input-block rows above the terminal cursor after the last redraw.
    rows_above: u16,
}

impl Screen {
    pub fn new(out: impl Write + 'static) -> Screen {
        let width = terminal::size().map(|(w, _)| w).unwrap_or(80);
        Screen { out: Box::new(out), width, rows_above: 0 }
    }

    pub fn set_width(&mut self, width: u16) {
        self.width = width.max(1);
    }

    /// Move to the top of the input block and erase it.
    fn clear_input(&mut self) {
        if self.rows_above > 0 {
            let _ = queue!(self.out, cursor::MoveUp(self.rows_above));
        }
        let _ = queue!(
            self.out,
            cursor::MoveToColumn(0),
            Clear(ClearType::FromCursorDown)
        );
        self.rows_above = 0;
    }

    /// Append one line of scrollback, pushing the input block aside.
    /// Embedded newlines become rows of their own.
    pub fn print_line(&mut self, text: &str) {
        self.clear_input();
        for part in text.split('\n') {
            let _ = queue!(self.out, Print(part), Print("\r\n"));
        }
    }

    /// Redraw the live input block and park the terminal cursor at the
    /// session's cursor position.
    pub fn render_input(&mut self, prompt: &str, text: &str, cursor: usize) {
        self.clear_input();
        let width = self.width.max(1) as usize;
        let rows = input_rows(prompt, text);
        let (crow, ccol) = locate_cursor(prompt, text, cursor);

        let _ = queue!(self.out, cursor::Hide);
        let mut cursor_x = 0u16;
        for (r, row) in rows.iter().enumerate() {
            let shown = if r == crow {
                let (shown, x) = window_row(row, ccol, width);
                cursor_x = x;
                shown
            } else {
                row.chars().take(width).collect()
            };
            let _ = queue!(self.out, Print(shown));
            if r + 1 < rows.len() {
                let _ = queue!(self.out, Print("\r\n"));
            }
        }
        let below = (rows.len() - 1 - crow) as u16;
        if below > 0 {
            let _ = queue!(self.out, cursor::MoveUp(below));
        }
        let _ = queue!(self.out, cursor::MoveToColumn(cursor_x), cursor::Show);
        self.rows_above = crow as u16;
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

// ── Interactive loop ──────────────────────────────────────────────────────────

/// Feed one key event to the session.  Returns `true` when the loop
/// should end (Ctrl-D on an empty line).
fn apply_key(session: &mut Session, key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            session.break_execution(true);
        }
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            if session.input_text().is_empty() {
                return true;
            }
            session.special_key(Key::Delete);
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            session.type_char(c);
        }
        KeyCode::Enter => session.special_key(Key::Enter),
        KeyCode::Up => session.special_key(Key::Up),
        KeyCode::Down => session.special_key(Key::Down),
        KeyCode::Left => session.special_key(Key::Left),
        KeyCode::Right => session.special_key(Key::Right),
        KeyCode::Home => session.special_key(Key::Home),
        KeyCode::End => session.special_key(Key::End),
        KeyCode::Backspace => session.special_key(Key::Backspace),
        KeyCode::Delete => session.special_key(Key::Delete),
        _ => {}
    }
    false
}

/// Drive a wired session from the terminal until Ctrl-D on an empty line.
///
/// Each iteration drains pending key events, runs one budgeted executor
/// slice, then paints: queued sink lines first, then program output, then
/// any fault from the slice, and finally the input block.
pub fn run_interactive(
    session: &mut Session,
    cpu: &Rc<RefCell<StackCpu>>,
    sink: &Rc<RefCell<ConsoleSink>>,
    config: &ConsoleConfig,
) -> io::Result<()> {
    let mut screen = Screen::new(io::stdout());
    let _raw = RawModeGuard::enter()?;

    let mut input = (String::new(), 0usize);
    let mut dirty = true;
    let mut quit = false;

    while !quit {
        // Wait for the first event only; drain the rest without blocking
        // so pasted text arrives in one iteration.
        let mut wait = POLL_INTERVAL;
        while event::poll(wait)? {
            wait = Duration::ZERO;
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    if apply_key(session, &key) {
                        quit = true;
                    }
                }
                Event::Resize(w, _) => {
                    screen.set_width(w);
                    dirty = true;
                }
                _ => {}
            }
        }

        let ticked = cpu
            .borrow_mut()
            .tick(InstructionBudget::new(config.instructions_per_update));
        let mut lines = sink.borrow_mut().take_lines();
        lines.extend(cpu.borrow_mut().take_output());
        if let Err(err) = ticked {
            lines.push(format!("% {err}"));
        }

        if let Some(change) = sink.borrow_mut().take_input_change() {
            input = change;
            dirty = true;
        }
        if !lines.is_empty() {
            for line in &lines {
                screen.print_line(line);
            }
            dirty = true;
        }
        if dirty {
            screen.render_input(&config.prompt, &input.0, input.1);
            dirty = false;
        }
        screen.flush()?;
    }

    // Leave the shell prompt on a fresh line below the session.
    screen.print_line("");
    screen.flush()
}

// ── Batch loop ────────────────────────────────────────────────────────────────

/// Tick until the machine goes idle, sleeping through `wait` stalls.
fn drain_cpu(
    cpu: &Rc<RefCell<StackCpu>>,
    out: &mut impl Write,
    budget: usize,
) -> io::Result<()> {
    loop {
        let ticked = cpu.borrow_mut().tick(InstructionBudget::new(budget));
        for line in cpu.borrow_mut().take_output() {
            writeln!(out, "{line}")?;
        }
        if let Err(err) = ticked {
            writeln!(out, "% {err}")?;
        }
        out.flush()?;
        let stalled = {
            let cpu = cpu.borrow();
            if cpu.idle() {
                return Ok(());
            }
            cpu.instructions_last_tick() == 0
        };
        if stalled {
            thread::sleep(Duration::from_millis(5));
        }
    }
}

/// Drive a wired session from a line source, without a terminal.
///
/// Lines accumulate until [`Session::is_command_complete`] says the text
/// is submittable, so block statements can span lines here too.  Each
/// submission runs to completion before the next line is read.  A leftover
/// incomplete chunk at end of input is submitted as-is.
pub fn run_batch(
    session: &mut Session,
    cpu: &Rc<RefCell<StackCpu>>,
    input: impl BufRead,
    out: &mut impl Write,
    budget: usize,
) -> io::Result<()> {
    // Anything queued before we were called (boot script, -c command).
    drain_cpu(cpu, out, budget)?;

    let mut pending = String::new();
    for line in input.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if !pending.is_empty() {
            pending.push('\n');
        }
        pending.push_str(line);
        if !session.is_command_complete(&pending) {
            continue;
        }
        let text = mem::take(&mut pending);
        session.process_command(&text);
        drain_cpu(cpu, out, budget)?;
    }
    if !pending.is_empty() {
        session.process_command(&pending);
        drain_cpu(cpu, out, budget)?;
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
