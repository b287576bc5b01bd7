use proptest::prelude::*;

use helm::compile::{LineCompiler, ScriptCompiler};
use helm::exec::{Cpu, InstructionBudget, StackCpu};
use helm::program::ProgramBuilder;
use helm::scanner::Scanner;
use helm::token::{Token, TokenKind};

fn scan_all(input: &str) -> Vec<Token> {
    let mut scanner = Scanner::new(input, "prop");
    let mut tokens = Vec::new();
    loop {
        let tok = scanner.scan(&[]);
        let done = tok.kind == TokenKind::EndOfFile;
        tokens.push(tok);
        if done {
            break;
        }
    }
    tokens
}

/// One plausible HelmScript lexeme.
fn lexeme() -> impl Strategy<Value = String> {
    let fixed = proptest::sample::select(vec![
        "set", "to", "print", "toggle", "wait", "if", "until", "lock", "on",
        "off", "true", "false", "and", "or", "+", "-", "*", "/", "^", "<",
        ">", "<=", ">=", "=", "(", ")", "{", "}", ",", ".",
    ])
    .prop_map(str::to_owned);
    prop_oneof![
        4 => fixed,
        2 => "[a-z][a-z0-9_]{0,8}",
        1 => "[0-9]{1,6}",
        1 => "[0-9]{1,3}\\.[0-9]{1,3}",
        1 => "\"[a-z ]{0,8}\"",
    ]
}

fn script() -> impl Strategy<Value = String> {
    prop::collection::vec(lexeme(), 0..24).prop_map(|words| words.join(" "))
}

proptest! {
    /// The scanner terminates on anything and emits at most one token per
    /// input byte plus the final end marker.
    #[test]
    fn forward_progress_on_arbitrary_input(s in "\\PC*") {
        let tokens = scan_all(&s);
        prop_assert!(tokens.len() <= s.len() + 1);
        prop_assert_eq!(tokens.last().unwrap().kind, TokenKind::EndOfFile);
    }
}

proptest! {
    /// Peeking is idempotent and agrees with the scan that follows.
    #[test]
    fn peek_is_idempotent(s in "\\PC*") {
        let mut scanner = Scanner::new(&s, "prop");
        let first = scanner.look_ahead(&[]).clone();
        let second = scanner.look_ahead(&[]).clone();
        prop_assert_eq!(&first, &second);
        let scanned = scanner.scan(&[]);
        prop_assert_eq!(&first, &scanned);
    }
}

proptest! {
    /// Spans never move backwards, and trivia fills every gap, so splicing
    /// skipped and token texts back together re-yields the input.
    #[test]
    fn tokens_reconstruct_the_input(s in "\\PC*") {
        let tokens = scan_all(&s);
        let mut rebuilt = String::new();
        let mut high_water = 0;
        for tok in &tokens {
            for trivia in &tok.skipped {
                rebuilt.push_str(&trivia.text);
            }
            rebuilt.push_str(&tok.text);
            prop_assert!(tok.start >= high_water);
            prop_assert!(tok.end >= tok.start);
            high_water = tok.end;
        }
        prop_assert_eq!(rebuilt, s);
    }
}

proptest! {
    /// Scanning with the true kind as the only candidate produces the same
    /// tokens as the full table, token for token.
    #[test]
    fn subset_scan_matches_full_scan(s in script()) {
        let full = scan_all(&s);
        let mut scanner = Scanner::new(&s, "prop");
        for tok in full.iter().filter(|t| t.kind != TokenKind::EndOfFile) {
            let again = scanner.scan(&[tok.kind]);
            prop_assert_eq!(again.kind, tok.kind);
            prop_assert_eq!(&again.text, &tok.text);
        }
        prop_assert_eq!(scanner.scan(&[]).kind, TokenKind::EndOfFile);
    }
}

proptest! {
    /// A tick never runs more instructions than its budget allows, for any
    /// budget size.
    #[test]
    fn tick_never_exceeds_its_budget(budget in 1usize..50) {
        let mut compiler = LineCompiler::new();
        let fragments = compiler
            .compile("print 1 + 2 + 3 + 4 + 5 + 6 + 7 + 8. print 9.", "prop")
            .unwrap()
            .unwrap();
        let mut builder = ProgramBuilder::new();
        builder.add_range(fragments);
        let mut cpu = StackCpu::new();
        cpu.update_program(builder.build_program(true));

        while !cpu.idle() {
            cpu.tick(InstructionBudget::new(budget)).unwrap();
            prop_assert!(cpu.instructions_last_tick() <= budget);
        }
        prop_assert_eq!(cpu.take_output(), vec!["36".to_owned(), "9".to_owned()]);
    }
}

proptest! {
    /// Compiled arithmetic agrees with host arithmetic.
    #[test]
    fn printed_sums_match(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
        let mut compiler = LineCompiler::new();
        let fragments = compiler
            .compile(&format!("print {a} + {b}."), "prop")
            .unwrap()
            .unwrap();
        let mut builder = ProgramBuilder::new();
        builder.add_range(fragments);
        let mut cpu = StackCpu::new();
        cpu.update_program(builder.build_program(true));
        cpu.tick(InstructionBudget::new(10_000)).unwrap();
        prop_assert_eq!(cpu.take_output(), vec![(a + b).to_string()]);
    }
}
