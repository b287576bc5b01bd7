use std::cell::RefCell;
use std::fs;
use std::io;
use std::rc::Rc;

use helm::cli::{self, ConfigFile};
use helm::compile::LineCompiler;
use helm::config::ConsoleConfig;
use helm::console::{self, ConsoleSink, StderrLogger};
use helm::exec::StackCpu;
use helm::scanner;
use helm::session::Session;

/// Load the helmrc named by the CLI choice, reporting problems to stderr.
/// A missing or unreadable file downgrades to defaults with a warning.
fn load_config(choice: &ConfigFile) -> ConsoleConfig {
    let (path, loaded) = match choice {
        ConfigFile::Skip => return ConsoleConfig::default(),
        ConfigFile::Explicit(path) => (path.clone(), ConsoleConfig::load_file(path)),
        ConfigFile::Search => match ConsoleConfig::discover() {
            Some(path) => {
                let loaded = ConsoleConfig::load_file(&path);
                (path, loaded)
            }
            None => return ConsoleConfig::default(),
        },
    };
    match loaded {
        Ok((config, problems)) => {
            for problem in &problems {
                eprintln!("helm: {}: {problem}", path.display());
            }
            config
        }
        Err(e) => {
            eprintln!("helm: warning: {}: {e}", path.display());
            ConsoleConfig::default()
        }
    }
}

fn on_a_tty() -> bool {
    // SAFETY: isatty only inspects the descriptor.
    unsafe {
        libc::isatty(libc::STDIN_FILENO) != 0 && libc::isatty(libc::STDOUT_FILENO) != 0
    }
}

fn main() {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("helm: {e}");
            eprintln!("{}", cli::usage());
            std::process::exit(1);
        }
    };

    let config = load_config(&args.config);
    let interactive = !args.batch && on_a_tty();

    if !args.quiet && config.banner {
        println!("helm flight console, version {}", env!("CARGO_PKG_VERSION"));
        println!("Proceed.");
    }

    // ── Wire the session ──────────────────────────────────────────────────────
    let cpu = Rc::new(RefCell::new(StackCpu::new()));
    let sink = Rc::new(RefCell::new(ConsoleSink::new()));

    let mut session = Session::new();
    session.set_compiler(LineCompiler::new());
    session.set_cpu(Rc::clone(&cpu));
    session.set_prompt(&config.prompt);
    if interactive {
        session.set_logger(Rc::clone(&sink));
        session.set_console(Rc::clone(&sink));
    } else {
        session.set_logger(StderrLogger);
    }

    // ── Boot script and startup command ───────────────────────────────────────
    if let Some(path) = &args.boot_script {
        match fs::read_to_string(path) {
            Ok(text) => {
                // The directive makes diagnostics name the file instead of
                // the console unit.
                let preamble = scanner::directive_line(&path.to_string_lossy(), 1);
                session.process_command(&format!("{preamble}{text}"));
            }
            Err(e) => {
                eprintln!("helm: {}: {e}", path.display());
                std::process::exit(1);
            }
        }
    }
    if let Some(command) = &args.command {
        session.process_command(command);
    }

    // ── Run ───────────────────────────────────────────────────────────────────
    let result = if interactive {
        console::run_interactive(&mut session, &cpu, &sink, &config)
    } else {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        console::run_batch(
            &mut session,
            &cpu,
            stdin.lock(),
            &mut stdout,
            config.instructions_per_update,
        )
    };
    if let Err(e) = result {
        eprintln!("helm: {e}");
        std::process::exit(1);
    }
}
