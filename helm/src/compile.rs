//! Script-compiler boundary and the bundled line compiler.
//!
//! The session talks to any [`ScriptCompiler`]; the [`LineCompiler`] here
//! implements the console statement subset (`set`, `print`, `toggle`,
//! `wait`) with full expression support.  Symbol state is keyed by unit
//! name, so successive submissions to the same unit share variable slots
//! until the context is dropped.

use std::collections::HashMap;
use std::fmt;

use crate::program::{BinOp, CodeFragment, Instruction};
use crate::scanner::Scanner;
use crate::token::{Token, TokenKind};

// ── Boundary ──────────────────────────────────────────────────────────────────

/// Turns submitted text into compiled code fragments.
pub trait ScriptCompiler {
    /// Compile `text` under the symbol context named `unit`.
    ///
    /// `Ok(None)` means there was nothing to compile (blank or trivia-only
    /// input); `Ok(Some(..))` carries the fragments for the program builder.
    fn compile(
        &mut self,
        text: &str,
        unit: &str,
    ) -> Result<Option<Vec<CodeFragment>>, CompileError>;

    /// Drop all symbol/context state retained for `unit`.
    fn clear_context(&mut self, unit: &str);
}

/// Compilation failure with source position.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub message: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl CompileError {
    fn at(message: impl Into<String>, tok: &Token) -> CompileError {
        CompileError {
            message: message.into(),
            file: tok.file.clone(),
            line: tok.line,
            column: tok.column,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.file, self.line, self.column, self.message
        )
    }
}

impl std::error::Error for CompileError {}

// ── Line compiler ─────────────────────────────────────────────────────────────

/// Reference compiler for console input.
///
/// Grammar:
///
/// ```text
/// program    := statement* EOF
/// statement  := 'set' name 'to' expr '.'
///             | 'print' expr '.'
///             | 'toggle' name '.'
///             | 'wait' expr '.'
/// expr       := or-expr, with the usual precedence ladder down to
///               power (right-associative), unary +/-, and atoms
/// atom       := literal | name | '(' expr ')'
/// ```
///
/// Names are case-insensitive.  Reading a name that no earlier submission
/// assigned is a compile error; assigning (`set`, `toggle`) allocates the
/// slot.
#[derive(Debug, Default)]
pub struct LineCompiler {
    contexts: HashMap<String, UnitContext>,
}

#[derive(Debug, Default)]
struct UnitContext {
    slots: HashMap<String, u16>,
}

impl UnitContext {
    fn define(&mut self, name: &str) -> u16 {
        let key = name.to_ascii_lowercase();
        if let Some(&slot) = self.slots.get(&key) {
            return slot;
        }
        let slot = self.slots.len() as u16;
        self.slots.insert(key, slot);
        slot
    }

    fn lookup(&self, name: &str) -> Option<u16> {
        self.slots.get(&name.to_ascii_lowercase()).copied()
    }
}

impl LineCompiler {
    pub fn new() -> LineCompiler {
        LineCompiler::default()
    }
}

impl ScriptCompiler for LineCompiler {
    fn compile(
        &mut self,
        text: &str,
        unit: &str,
    ) -> Result<Option<Vec<CodeFragment>>, CompileError> {
        let symbols = self.contexts.entry(unit.to_owned()).or_default();
        // Slots defined by a failed submission roll back with its code.
        let saved = symbols.slots.clone();
        let mut parser = LineParser {
            scanner: Scanner::new(text, unit),
            symbols,
            code: Vec::new(),
            statements: 0,
        };
        if let Err(err) = parser.parse_program() {
            parser.symbols.slots = saved;
            return Err(err);
        }
        if parser.statements == 0 {
            return Ok(None);
        }
        Ok(Some(vec![CodeFragment::from_main(parser.code)]))
    }

    fn clear_context(&mut self, unit: &str) {
        self.contexts.remove(unit);
    }
}

// ── Parser ────────────────────────────────────────────────────────────────────

struct LineParser<'a, 'src> {
    scanner: Scanner<'src>,
    symbols: &'a mut UnitContext,
    code: Vec<Instruction>,
    statements: usize,
}

impl LineParser<'_, '_> {
    fn parse_program(&mut self) -> Result<(), CompileError> {
        loop {
            match self.scanner.look_ahead(&[]).kind {
                TokenKind::Set => self.parse_set()?,
                TokenKind::Print => self.parse_print()?,
                TokenKind::Toggle => self.parse_toggle()?,
                TokenKind::Wait => self.parse_wait()?,
                TokenKind::EndOfFile => return Ok(()),
                TokenKind::Unknown => {
                    let tok = self.scanner.scan(&[]);
                    return Err(CompileError::at(
                        format!("unrecognized character '{}'", tok.text),
                        &tok,
                    ));
                }
                _ => {
                    let tok = self.scanner.scan(&[]);
                    return Err(CompileError::at(
                        format!("unknown statement, found {}", token_blurb(&tok)),
                        &tok,
                    ));
                }
            }
            self.statements += 1;
        }
    }

    fn parse_set(&mut self) -> Result<(), CompileError> {
        self.scanner.scan(&[]); // 'set'
        let name = self.expect_name()?;
        self.expect(TokenKind::To)?;
        self.parse_expr()?;
        self.expect(TokenKind::EndOfInstruction)?;
        let slot = self.symbols.define(&name.text);
        self.code.push(Instruction::Store(slot));
        Ok(())
    }

    fn parse_print(&mut self) -> Result<(), CompileError> {
        self.scanner.scan(&[]); // 'print'
        self.parse_expr()?;
        self.expect(TokenKind::EndOfInstruction)?;
        self.code.push(Instruction::Print);
        Ok(())
    }

    fn parse_toggle(&mut self) -> Result<(), CompileError> {
        self.scanner.scan(&[]); // 'toggle'
        let name = self.expect_name()?;
        self.expect(TokenKind::EndOfInstruction)?;
        let slot = self.symbols.define(&name.text);
        self.code.push(Instruction::Toggle(slot));
        Ok(())
    }

    fn parse_wait(&mut self) -> Result<(), CompileError> {
        self.scanner.scan(&[]); // 'wait'
        self.parse_expr()?;
        self.expect(TokenKind::EndOfInstruction)?;
        self.code.push(Instruction::Wait);
        Ok(())
    }

    // -- Expressions, highest function = loosest binding ----------------------

    fn parse_expr(&mut self) -> Result<(), CompileError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<(), CompileError> {
        self.parse_and()?;
        while self.scanner.look_ahead(&[]).kind == TokenKind::Or {
            self.scanner.scan(&[]);
            self.parse_and()?;
            self.code.push(Instruction::Binary(BinOp::Or));
        }
        Ok(())
    }

    fn parse_and(&mut self) -> Result<(), CompileError> {
        self.parse_compare()?;
        while self.scanner.look_ahead(&[]).kind == TokenKind::And {
            self.scanner.scan(&[]);
            self.parse_compare()?;
            self.code.push(Instruction::Binary(BinOp::And));
        }
        Ok(())
    }

    fn parse_compare(&mut self) -> Result<(), CompileError> {
        self.parse_additive()?;
        while self.scanner.look_ahead(&[]).kind == TokenKind::Comparator {
            let tok = self.scanner.scan(&[]);
            let op = match tok.text.as_str() {
                "=" => BinOp::Eq,
                "<" => BinOp::Lt,
                ">" => BinOp::Gt,
                "<=" => BinOp::Le,
                ">=" => BinOp::Ge,
                other => {
                    return Err(CompileError::at(
                        format!("unsupported comparator '{other}'"),
                        &tok,
                    ))
                }
            };
            self.parse_additive()?;
            self.code.push(Instruction::Binary(op));
        }
        Ok(())
    }

    fn parse_additive(&mut self) -> Result<(), CompileError> {
        self.parse_multiplicative()?;
        while self.scanner.look_ahead(&[]).kind == TokenKind::PlusMinus {
            let tok = self.scanner.scan(&[]);
            let op = if tok.text == "+" { BinOp::Add } else { BinOp::Sub };
            self.parse_multiplicative()?;
            self.code.push(Instruction::Binary(op));
        }
        Ok(())
    }

    fn parse_multiplicative(&mut self) -> Result<(), CompileError> {
        self.parse_power()?;
        loop {
            let op = match self.scanner.look_ahead(&[]).kind {
                TokenKind::Mult => BinOp::Mul,
                TokenKind::Div => BinOp::Div,
                _ => return Ok(()),
            };
            self.scanner.scan(&[]);
            self.parse_power()?;
            self.code.push(Instruction::Binary(op));
        }
    }

    fn parse_power(&mut self) -> Result<(), CompileError> {
        self.parse_unary()?;
        if self.scanner.look_ahead(&[]).kind == TokenKind::Power {
            self.scanner.scan(&[]);
            // Right-associative: 2 ^ 3 ^ 2 is 2 ^ (3 ^ 2).
            self.parse_power()?;
            self.code.push(Instruction::Binary(BinOp::Pow));
        }
        Ok(())
    }

    fn parse_unary(&mut self) -> Result<(), CompileError> {
        if self.scanner.look_ahead(&[]).kind == TokenKind::PlusMinus {
            let tok = self.scanner.scan(&[]);
            self.parse_unary()?;
            if tok.text == "-" {
                self.code.push(Instruction::Negate);
            }
            return Ok(());
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<(), CompileError> {
        let tok = self.scanner.scan(&[]);
        match tok.kind {
            TokenKind::Integer | TokenKind::Double | TokenKind::Str | TokenKind::TrueFalse => {
                match tok.value.clone() {
                    Some(value) => {
                        self.code.push(Instruction::Push(value));
                        Ok(())
                    }
                    None => Err(CompileError::at(
                        format!("{} out of range: '{}'", tok.kind, tok.text),
                        &tok,
                    )),
                }
            }
            TokenKind::Identifier | TokenKind::VarIdentifier => {
                match self.symbols.lookup(&tok.text) {
                    Some(slot) => {
                        self.code.push(Instruction::Load(slot));
                        Ok(())
                    }
                    None => Err(CompileError::at(
                        format!("undefined variable '{}'", tok.text),
                        &tok,
                    )),
                }
            }
            TokenKind::BracketOpen => {
                self.parse_expr()?;
                self.expect(TokenKind::BracketClose)?;
                Ok(())
            }
            TokenKind::Unknown => Err(CompileError::at(
                format!("unrecognized character '{}'", tok.text),
                &tok,
            )),
            _ => Err(CompileError::at(
                format!("expected a value, found {}", token_blurb(&tok)),
                &tok,
            )),
        }
    }

    // -- Token plumbing -------------------------------------------------------

    /// Consume one token that must be `kind`.
    ///
    /// Peeks the full table first so a mismatch can name the token that is
    /// actually there, then commits through the candidate path.
    fn expect(&mut self, kind: TokenKind) -> Result<Token, CompileError> {
        if self.scanner.look_ahead(&[]).kind == kind {
            Ok(self.scanner.scan(&[kind]))
        } else {
            let tok = self.scanner.scan(&[]);
            Err(Self::mismatch(&format!("{kind}"), &tok))
        }
    }

    fn expect_name(&mut self) -> Result<Token, CompileError> {
        match self.scanner.look_ahead(&[]).kind {
            TokenKind::Identifier | TokenKind::VarIdentifier => Ok(self
                .scanner
                .scan(&[TokenKind::Identifier, TokenKind::VarIdentifier])),
            _ => {
                let tok = self.scanner.scan(&[]);
                Err(Self::mismatch("a name", &tok))
            }
        }
    }

    fn mismatch(wanted: &str, tok: &Token) -> CompileError {
        if tok.kind == TokenKind::Unknown {
            CompileError::at(format!("unrecognized character '{}'", tok.text), tok)
        } else {
            CompileError::at(
                format!("expected {wanted}, found {}", token_blurb(tok)),
                tok,
            )
        }
    }
}

/// How a token reads inside an error message.
fn token_blurb(tok: &Token) -> String {
    if tok.text.is_empty() {
        tok.kind.to_string()
    } else {
        format!("'{}'", tok.text)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
