//! Command-line argument parsing.
//!
//! Usage:
//!   helm [-bqn] [-f <rcfile>] [-c <command>] [<script>]

use std::path::PathBuf;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Force line-at-a-time batch mode even on a tty (`-b`).
    pub batch: bool,
    /// Suppress the startup banner (`-q`).
    pub quiet: bool,
    /// Command to submit after startup (`-c <command>`).
    pub command: Option<String>,
    /// helmrc selection.
    pub config: ConfigFile,
    /// Boot script submitted before input is read.
    pub boot_script: Option<PathBuf>,
}

/// How to choose the helmrc.
#[derive(Debug, Default)]
pub enum ConfigFile {
    /// Search `./helmrc`, then `$HOME/.helmrc` (default).
    #[default]
    Search,
    /// `-n`: load no helmrc at all.
    Skip,
    /// `-f <file>`: load this specific file.
    Explicit(PathBuf),
}

pub fn usage() -> &'static str {
    "usage: helm [-bqn] [-f <rcfile>] [-c <command>] [<script>]"
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(&raw[1..])
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing.
        if arg == "--" {
            i += 1;
            positional.extend(argv[i..].iter().cloned());
            break;
        }

        // Non-flag argument.
        if !arg.starts_with('-') || arg == "-" {
            positional.push(arg.to_owned());
            i += 1;
            continue;
        }

        // Flag argument: iterate over characters after the leading `-`.
        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'b' => args.batch = true,
                'q' => args.quiet = true,
                'n' => args.config = ConfigFile::Skip,

                // -f[<file>] / -f <file>
                'f' => {
                    let file = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err("-f requires a file argument".to_owned());
                    };
                    args.config = ConfigFile::Explicit(PathBuf::from(file));
                }

                // -c[<command>] / -c <command>
                'c' => {
                    let cmd = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err("-c requires a command argument".to_owned());
                    };
                    args.command = Some(cmd);
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    match positional.len() {
        0 => {}
        1 => args.boot_script = Some(PathBuf::from(positional.remove(0))),
        n => return Err(format!("too many arguments ({n})")),
    }

    Ok(args)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
