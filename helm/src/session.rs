//! Interactive session controller.
//!
//! Owns the line editor, command history, and program builder, and drives
//! the per-submission pipeline: compile the text under the stable unit
//! name `"console"`, append the fragments, rebuild interactively, and hand
//! the grown program to the execution boundary.  Compile failures are
//! logged once and suppressed; the previously adopted program stays valid.
//!
//! Collaborators (compiler, cpu, logger, console surface) are optional
//! slots.  An absent collaborator is a silent no-op, so the session can be
//! driven headless in tests or partially wired during startup.

use std::cell::RefCell;
use std::rc::Rc;

use crate::compile::ScriptCompiler;
use crate::editor::LineEditor;
use crate::exec::Cpu;
use crate::history::CommandHistory;
use crate::program::ProgramBuilder;
use crate::scanner::Scanner;
use crate::token::TokenKind;

/// Compilation-context name for everything submitted through the session.
const UNIT: &str = "console";

// ── Collaborator traits ───────────────────────────────────────────────────────

/// Best-effort message sink for suppressed errors.
pub trait Logger {
    fn log(&mut self, message: &str);
}

impl<T: Logger> Logger for Rc<RefCell<T>> {
    fn log(&mut self, message: &str) {
        self.borrow_mut().log(message);
    }
}

/// Display surface: finished output lines plus the live input line.
pub trait Console {
    /// Append one line to the scrollback.
    fn print(&mut self, text: &str);

    /// Replace the live input display.  `cursor` is a char index into
    /// `text`.
    fn replace_input(&mut self, text: &str, cursor: usize);
}

impl<T: Console> Console for Rc<RefCell<T>> {
    fn print(&mut self, text: &str) {
        self.borrow_mut().print(text);
    }

    fn replace_input(&mut self, text: &str, cursor: usize) {
        self.borrow_mut().replace_input(text, cursor);
    }
}

// ── Keys and state ────────────────────────────────────────────────────────────

/// Editing keys the session understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    Backspace,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Submitting,
}

// ── Session ───────────────────────────────────────────────────────────────────

pub struct Session {
    editor: LineEditor,
    history: CommandHistory,
    builder: ProgramBuilder,
    compiler: Option<Box<dyn ScriptCompiler>>,
    cpu: Option<Box<dyn Cpu>>,
    logger: Option<Box<dyn Logger>>,
    console: Option<Box<dyn Console>>,
    prompt: String,
    locked: bool,
    state: SessionState,
}

impl Default for Session {
    fn default() -> Session {
        Session::new()
    }
}

impl Session {
    pub fn new() -> Session {
        Session {
            editor: LineEditor::new(),
            history: CommandHistory::new(),
            builder: ProgramBuilder::new(),
            compiler: None,
            cpu: None,
            logger: None,
            console: None,
            prompt: "> ".to_owned(),
            locked: false,
            state: SessionState::Idle,
        }
    }

    // ── Wiring ────────────────────────────────────────────────────────────────

    pub fn set_compiler(&mut self, compiler: impl ScriptCompiler + 'static) {
        self.compiler = Some(Box::new(compiler));
    }

    pub fn set_cpu(&mut self, cpu: impl Cpu + 'static) {
        self.cpu = Some(Box::new(cpu));
    }

    pub fn set_logger(&mut self, logger: impl Logger + 'static) {
        self.logger = Some(Box::new(logger));
    }

    pub fn set_console(&mut self, console: impl Console + 'static) {
        self.console = Some(Box::new(console));
    }

    pub fn set_prompt(&mut self, prompt: &str) {
        self.prompt = prompt.to_owned();
    }

    // ── Key handling ──────────────────────────────────────────────────────────

    /// Insert a typed character at the cursor.  Ignored while locked.
    pub fn type_char(&mut self, ch: char) {
        if self.locked {
            return;
        }
        self.editor.insert_char(ch);
        self.refresh_input();
    }

    /// Handle an editing key.  Ignored while locked.
    ///
    /// `Enter` submits when the buffer's `{` blocks are all closed and
    /// inserts a literal newline otherwise, so block statements can span
    /// lines.
    pub fn special_key(&mut self, key: Key) {
        if self.locked {
            return;
        }
        match key {
            Key::Enter => {
                let text = self.editor.text();
                if self.is_command_complete(&text) {
                    self.submit_line();
                } else {
                    self.editor.insert_char('\n');
                    self.refresh_input();
                }
            }
            Key::Up => self.recall(-1),
            Key::Down => self.recall(1),
            Key::Left => {
                self.editor.move_left(1);
                self.refresh_input();
            }
            Key::Right => {
                self.editor.move_right(1);
                self.refresh_input();
            }
            Key::Home => {
                self.editor.move_home();
                self.refresh_input();
            }
            Key::End => {
                self.editor.move_end();
                self.refresh_input();
            }
            Key::Backspace => {
                if self.editor.delete_before() {
                    self.refresh_input();
                }
            }
            Key::Delete => {
                if self.editor.delete_at() {
                    self.refresh_input();
                }
            }
        }
    }

    // ── Submission pipeline ───────────────────────────────────────────────────

    /// Take the edit buffer, echo it, run the pipeline, and record it in
    /// history (resetting the recall cursor).
    pub fn submit_line(&mut self) {
        let line = self.editor.take_line();
        self.refresh_input();
        let echo = format!("{}{}", self.prompt, line);
        if let Some(console) = self.console.as_mut() {
            console.print(&echo);
        }
        self.process_command(&line);
        self.history.record(&line);
    }

    /// Run the compile → build → adopt pipeline for text that did not come
    /// through the editor (batch lines, boot scripts).  Does not touch
    /// history.
    pub fn process_command(&mut self, text: &str) {
        self.state = SessionState::Submitting;
        self.run_pipeline(text);
        self.state = SessionState::Idle;
    }

    fn run_pipeline(&mut self, text: &str) {
        let Some(compiler) = self.compiler.as_mut() else {
            return;
        };
        match compiler.compile(text, UNIT) {
            Ok(Some(fragments)) => {
                self.builder.add_range(fragments);
                let program = self.builder.build_program(true);
                if !program.is_empty() {
                    if let Some(cpu) = self.cpu.as_mut() {
                        cpu.update_program(program);
                    }
                }
            }
            Ok(None) => {}
            Err(err) => {
                if let Some(logger) = self.logger.as_mut() {
                    logger.log(&err.to_string());
                }
            }
        }
    }

    // ── History recall ────────────────────────────────────────────────────────

    fn recall(&mut self, delta: i32) {
        let replaced_len = self.editor.len();
        let Some(entry) = self.history.recall(delta) else {
            return;
        };
        let entry = entry.to_owned();

        // Buffer gets the verbatim entry; the cursor sits after its
        // trailing-whitespace-trimmed end.
        self.editor.set_text(&entry);
        let cursor = entry.trim_end().chars().count();
        self.editor.move_to(cursor);

        // The display is padded so a longer replaced line is fully
        // overwritten.
        let mut display = entry;
        let shown = display.chars().count();
        if shown < replaced_len {
            display.push_str(&" ".repeat(replaced_len - shown));
        }
        if let Some(console) = self.console.as_mut() {
            console.replace_input(&display, cursor);
        }
    }

    // ── Locking and reset ─────────────────────────────────────────────────────

    /// Gate character and key editing.  Submission through
    /// [`Session::process_command`] and [`Session::reset`] stay available.
    pub fn set_input_lock(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Abandon the session's program: fresh builder, compiler context
    /// dropped, history and edit buffer cleared.  Honored even while
    /// locked; the lock itself is left as it was.
    pub fn reset(&mut self) {
        self.builder = ProgramBuilder::new();
        if let Some(compiler) = self.compiler.as_mut() {
            compiler.clear_context(UNIT);
        }
        self.history.clear();
        self.editor.clear();
        self.state = SessionState::Idle;
        self.refresh_input();
    }

    // ── Probes and forwarding ─────────────────────────────────────────────────

    /// Whether `text` is structurally ready to submit: every `{` block is
    /// closed.  Used to decide between submitting and continuing on the
    /// next line.
    pub fn is_command_complete(&self, text: &str) -> bool {
        let mut scanner = Scanner::new(text, UNIT);
        let mut depth: i64 = 0;
        loop {
            match scanner.scan(&[]).kind {
                TokenKind::CurlyOpen => depth += 1,
                TokenKind::CurlyClose => depth -= 1,
                TokenKind::EndOfFile => break,
                _ => {}
            }
        }
        depth <= 0
    }

    /// Forward an abort to the execution boundary, if one is wired.
    pub fn break_execution(&mut self, manual: bool) {
        if let Some(cpu) = self.cpu.as_mut() {
            cpu.break_execution(manual);
        }
    }

    /// Current edit-buffer contents.
    pub fn input_text(&mut self) -> String {
        self.editor.text()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn refresh_input(&mut self) {
        let cursor = self.editor.pos;
        let text = self.editor.text();
        if let Some(console) = self.console.as_mut() {
            console.replace_input(&text, cursor);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::LineCompiler;
    use crate::exec::{InstructionBudget, StackCpu};

    #[derive(Default)]
    struct RecordingLog {
        lines: Vec<String>,
    }

    impl Logger for RecordingLog {
        fn log(&mut self, message: &str) {
            self.lines.push(message.to_owned());
        }
    }

    #[derive(Default)]
    struct RecordingConsole {
        printed: Vec<String>,
        inputs: Vec<(String, usize)>,
    }

    impl Console for RecordingConsole {
        fn print(&mut self, text: &str) {
            self.printed.push(text.to_owned());
        }

        fn replace_input(&mut self, text: &str, cursor: usize) {
            self.inputs.push((text.to_owned(), cursor));
        }
    }

    type Rigged = (
        Session,
        Rc<RefCell<StackCpu>>,
        Rc<RefCell<RecordingLog>>,
        Rc<RefCell<RecordingConsole>>,
    );

    fn rigged() -> Rigged {
        let mut session = Session::new();
        session.set_compiler(LineCompiler::new());
        let cpu = Rc::new(RefCell::new(StackCpu::new()));
        session.set_cpu(Rc::clone(&cpu));
        let log = Rc::new(RefCell::new(RecordingLog::default()));
        session.set_logger(Rc::clone(&log));
        let console = Rc::new(RefCell::new(RecordingConsole::default()));
        session.set_console(Rc::clone(&console));
        (session, cpu, log, console)
    }

    fn drain(cpu: &Rc<RefCell<StackCpu>>) -> Vec<String> {
        let mut cpu = cpu.borrow_mut();
        let _ = cpu.tick(InstructionBudget::new(10_000));
        cpu.take_output()
    }

    fn type_line(session: &mut Session, line: &str) {
        for ch in line.chars() {
            session.type_char(ch);
        }
        session.special_key(Key::Enter);
    }

    // -- Pipeline -------------------------------------------------------------

    #[test]
    fn submission_reaches_the_cpu() {
        let (mut session, cpu, _, _) = rigged();
        session.process_command("print 1 + 2.");
        assert_eq!(drain(&cpu), ["3"]);
    }

    #[test]
    fn typed_submission_echoes_and_records() {
        let (mut session, cpu, _, console) = rigged();
        type_line(&mut session, "print 4.");
        assert_eq!(drain(&cpu), ["4"]);
        assert!(console
            .borrow()
            .printed
            .contains(&"> print 4.".to_owned()));
        assert_eq!(session.history.len(), 1);
        // The input display ended empty after the submit.
        let inputs = &console.borrow().inputs;
        assert_eq!(inputs.last().map(|(t, c)| (t.as_str(), *c)), Some(("", 0)));
    }

    #[test]
    fn symbols_persist_across_submissions() {
        let (mut session, cpu, _, _) = rigged();
        session.process_command("set x to 5.");
        session.process_command("print x.");
        assert_eq!(drain(&cpu), ["5"]);
    }

    #[test]
    fn compile_failure_is_logged_once_and_suppressed() {
        let (mut session, cpu, log, _) = rigged();
        session.process_command("set x to 5.");
        session.process_command("print nope.");
        session.process_command("print x * 2.");

        assert_eq!(log.borrow().lines.len(), 1);
        assert!(log.borrow().lines[0].contains("undefined variable 'nope'"));
        // The failed line added nothing; the rest of the session ran.
        assert_eq!(drain(&cpu), ["10"]);
    }

    #[test]
    fn failure_leaves_previous_program_running() {
        let (mut session, cpu, _, _) = rigged();
        session.process_command("print 1.");
        assert_eq!(drain(&cpu), ["1"]);
        session.process_command("print );");
        assert_eq!(drain(&cpu), Vec::<String>::new());
        session.process_command("print 2.");
        // Resumes past the already executed prefix.
        assert_eq!(drain(&cpu), ["2"]);
    }

    #[test]
    fn blank_input_adds_nothing() {
        let (mut session, cpu, log, _) = rigged();
        session.process_command("   ");
        session.process_command("// just a remark\n");
        assert_eq!(drain(&cpu), Vec::<String>::new());
        assert!(log.borrow().lines.is_empty());
    }

    // -- History --------------------------------------------------------------

    #[test]
    fn adjacent_repeat_stored_once() {
        let (mut session, _, _, _) = rigged();
        type_line(&mut session, "print 1.");
        type_line(&mut session, "print 1.");
        assert_eq!(session.history.len(), 1);
    }

    #[test]
    fn interleaved_repeat_stored_each_time() {
        let (mut session, _, _, _) = rigged();
        type_line(&mut session, "print 1.");
        type_line(&mut session, "print 2.");
        type_line(&mut session, "print 1.");
        assert_eq!(session.history.len(), 3);
    }

    #[test]
    fn recall_overwrites_buffer_and_pads_display() {
        let (mut session, _, _, console) = rigged();
        type_line(&mut session, "hi.   ");   // compile fails; history keeps it
        for ch in "a considerably longer line".chars() {
            session.type_char(ch);
        }
        session.special_key(Key::Up);

        assert_eq!(session.input_text(), "hi.   ");
        assert_eq!(session.editor.pos, 3);
        let (display, cursor) = console.borrow().inputs.last().cloned().unwrap();
        assert_eq!(display.chars().count(), "a considerably longer line".len());
        assert!(display.starts_with("hi.   "));
        assert!(display.ends_with(' '));
        assert_eq!(cursor, 3);
    }

    #[test]
    fn recall_cursor_resets_after_submission() {
        let (mut session, _, _, _) = rigged();
        type_line(&mut session, "print 1.");
        type_line(&mut session, "print 2.");
        session.special_key(Key::Up);
        session.special_key(Key::Up);
        assert_eq!(session.input_text(), "print 1.");
        session.special_key(Key::Enter);
        session.special_key(Key::Up);
        // One step up from the live line is the newest entry again.
        assert_eq!(session.input_text(), "print 1.");
    }

    #[test]
    fn recall_with_no_history_changes_nothing() {
        let (mut session, _, _, console) = rigged();
        session.type_char('a');
        let before = console.borrow().inputs.len();
        session.special_key(Key::Up);
        assert_eq!(console.borrow().inputs.len(), before);
        assert_eq!(session.input_text(), "a");
    }

    // -- Locking and reset ----------------------------------------------------

    #[test]
    fn lock_gates_typing_and_keys() {
        let (mut session, _, _, console) = rigged();
        session.set_input_lock(true);
        session.type_char('x');
        session.special_key(Key::Enter);
        assert_eq!(session.input_text(), "");
        assert_eq!(session.history.len(), 0);
        assert!(console.borrow().inputs.is_empty());

        session.set_input_lock(false);
        session.type_char('x');
        assert_eq!(session.input_text(), "x");
    }

    #[test]
    fn reset_works_while_locked_and_keeps_the_lock() {
        let (mut session, _, _, _) = rigged();
        type_line(&mut session, "print 1.");
        session.set_input_lock(true);
        session.reset();
        assert!(session.is_locked());
        assert_eq!(session.history.len(), 0);
    }

    #[test]
    fn reset_forgets_symbols_and_program() {
        let (mut session, cpu, log, _) = rigged();
        session.process_command("set x to 5.");
        session.process_command("print x.");
        assert_eq!(drain(&cpu), ["5"]);

        session.reset();

        // Symbols are gone.
        session.process_command("print x.");
        assert_eq!(log.borrow().lines.len(), 1);
        assert!(log.borrow().lines[0].contains("undefined variable"));

        // The next adopted program starts from scratch; earlier output
        // does not reappear.
        session.process_command("print 7.");
        assert_eq!(drain(&cpu), ["7"]);
    }

    #[test]
    fn reset_clears_the_edit_buffer() {
        let (mut session, _, _, console) = rigged();
        session.type_char('a');
        session.type_char('b');
        session.reset();
        assert_eq!(session.input_text(), "");
        let (text, cursor) = console.borrow().inputs.last().cloned().unwrap();
        assert_eq!((text.as_str(), cursor), ("", 0));
    }

    // -- Multi-line continuation ----------------------------------------------

    #[test]
    fn open_block_is_incomplete() {
        let (session, _, _, _) = rigged();
        assert!(!session.is_command_complete("if x > 0 {"));
        assert!(session.is_command_complete("if x > 0 { print 1. }"));
        assert!(session.is_command_complete("print 1."));
        assert!(session.is_command_complete(""));
    }

    #[test]
    fn enter_on_open_block_continues_the_line() {
        let (mut session, _, _, _) = rigged();
        for ch in "if x > 0 {".chars() {
            session.type_char(ch);
        }
        session.special_key(Key::Enter);
        assert_eq!(session.history.len(), 0);
        assert_eq!(session.input_text(), "if x > 0 {\n");

        session.type_char('}');
        session.special_key(Key::Enter);
        // Now submitted (the statement itself is rejected by the line
        // compiler, which is fine here).
        assert_eq!(session.history.len(), 1);
        assert_eq!(session.input_text(), "");
    }

    // -- Degraded wiring ------------------------------------------------------

    #[test]
    fn absent_collaborators_are_silent_noops() {
        let mut session = Session::new();
        session.type_char('p');
        session.special_key(Key::Enter);
        session.process_command("print 1.");
        session.special_key(Key::Up);
        session.break_execution(true);
        session.reset();
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn state_settles_back_to_idle() {
        let (mut session, _, _, _) = rigged();
        session.process_command("print 1.");
        assert_eq!(session.state(), SessionState::Idle);
        session.reset();
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn manual_break_reaches_the_cpu() {
        let (mut session, cpu, _, _) = rigged();
        session.process_command("wait 3600. print 1.");
        let _ = cpu.borrow_mut().tick(InstructionBudget::new(100));
        session.break_execution(true);
        let out = cpu.borrow_mut().take_output();
        assert_eq!(out.last().map(String::as_str), Some("program aborted."));
    }
}
