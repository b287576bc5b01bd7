//! Program model: executable instructions, compiled code fragments, and the
//! incremental builder that turns fragments into one linear program.
//!
//! The builder is append-only for the life of a session.  Each rebuild
//! flattens every accumulated fragment in arrival order, so an interactive
//! build is always a strict prefix of the next one; that is what lets an
//! executor keep its place while the program grows underneath it.

use std::fmt;

use crate::value::Value;

// ── Instructions ──────────────────────────────────────────────────────────────

/// Binary operators of the instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Pow => "^",
            BinOp::Eq => "=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}

/// One executable operation of the stack machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Push a constant.
    Push(Value),
    /// Push the value of global slot `n`.
    Load(u16),
    /// Pop into global slot `n`.
    Store(u16),
    /// Pop two operands, push the result.
    Binary(BinOp),
    /// Pop one operand, push its numeric negation.
    Negate,
    /// Pop one value and emit it as console output.
    Print,
    /// Pop a duration in seconds and pause execution until it has elapsed.
    Wait,
    /// Invert the truthiness of global slot `n`.
    Toggle(u16),
    /// Terminal marker; only non-interactive builds carry one.
    EndOfProgram,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Push(v) => write!(f, "push {v}"),
            Instruction::Load(n) => write!(f, "load {n}"),
            Instruction::Store(n) => write!(f, "store {n}"),
            Instruction::Binary(op) => write!(f, "binop {}", op.symbol()),
            Instruction::Negate => write!(f, "negate"),
            Instruction::Print => write!(f, "print"),
            Instruction::Wait => write!(f, "wait"),
            Instruction::Toggle(n) => write!(f, "toggle {n}"),
            Instruction::EndOfProgram => write!(f, "end"),
        }
    }
}

// ── Code fragments ────────────────────────────────────────────────────────────

/// Compiled-but-unlinked output of one submission.
///
/// The three sections flatten in a fixed order: function bodies first, then
/// one-time initialization, then the main code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeFragment {
    pub functions: Vec<Instruction>,
    pub initialization: Vec<Instruction>,
    pub main: Vec<Instruction>,
}

impl CodeFragment {
    /// Fragment with main code only, the common case for console input.
    pub fn from_main(main: Vec<Instruction>) -> CodeFragment {
        CodeFragment {
            main,
            ..CodeFragment::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.initialization.is_empty() && self.main.is_empty()
    }

    fn flatten_into(&self, out: &mut Vec<Instruction>) {
        out.extend_from_slice(&self.functions);
        out.extend_from_slice(&self.initialization);
        out.extend_from_slice(&self.main);
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Accumulates code fragments across submissions and flattens them on
/// demand.  Never discards a fragment; a session drops the whole builder to
/// start over.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    fragments: Vec<CodeFragment>,
}

impl ProgramBuilder {
    pub fn new() -> ProgramBuilder {
        ProgramBuilder::default()
    }

    /// Append newly compiled fragments after all earlier ones.
    pub fn add_range(&mut self, fragments: Vec<CodeFragment>) {
        self.fragments.extend(fragments);
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Flatten every fragment into one linear program.
    ///
    /// Interactive builds omit the [`Instruction::EndOfProgram`] marker so
    /// the executor parks at the end of the sequence and resumes when the
    /// next submission extends it; non-interactive builds self-terminate.
    pub fn build_program(&self, interactive: bool) -> Vec<Instruction> {
        let mut program = Vec::new();
        for fragment in &self.fragments {
            fragment.flatten_into(&mut program);
        }
        if !interactive {
            program.push(Instruction::EndOfProgram);
        }
        program
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn push(n: i64) -> Instruction {
        Instruction::Push(Value::Int(n))
    }

    #[test]
    fn flatten_orders_sections_within_fragment() {
        let mut builder = ProgramBuilder::new();
        builder.add_range(vec![CodeFragment {
            functions: vec![push(1)],
            initialization: vec![push(2)],
            main: vec![push(3)],
        }]);
        assert_eq!(
            builder.build_program(true),
            vec![push(1), push(2), push(3)]
        );
    }

    #[test]
    fn fragments_flatten_in_arrival_order() {
        let mut builder = ProgramBuilder::new();
        builder.add_range(vec![CodeFragment::from_main(vec![push(1)])]);
        builder.add_range(vec![
            CodeFragment::from_main(vec![push(2)]),
            CodeFragment::from_main(vec![push(3)]),
        ]);
        assert_eq!(
            builder.build_program(true),
            vec![push(1), push(2), push(3)]
        );
        assert_eq!(builder.fragment_count(), 3);
    }

    #[test]
    fn interactive_build_omits_terminal_marker() {
        let mut builder = ProgramBuilder::new();
        builder.add_range(vec![CodeFragment::from_main(vec![push(1)])]);
        assert_eq!(builder.build_program(true), vec![push(1)]);
        assert_eq!(
            builder.build_program(false),
            vec![push(1), Instruction::EndOfProgram]
        );
    }

    #[test]
    fn earlier_build_is_prefix_of_later() {
        let mut builder = ProgramBuilder::new();
        builder.add_range(vec![CodeFragment::from_main(vec![push(1), push(2)])]);
        let first = builder.build_program(true);
        builder.add_range(vec![CodeFragment {
            functions: vec![push(9)],
            initialization: Vec::new(),
            main: vec![push(3)],
        }]);
        let second = builder.build_program(true);
        assert!(second.starts_with(&first));
        assert_eq!(second.len(), 4);
    }

    #[test]
    fn empty_builder_builds_empty_interactive_program() {
        let builder = ProgramBuilder::new();
        assert!(builder.is_empty());
        assert!(builder.build_program(true).is_empty());
        assert_eq!(
            builder.build_program(false),
            vec![Instruction::EndOfProgram]
        );
    }

    #[test]
    fn instruction_display() {
        assert_eq!(push(5).to_string(), "push 5");
        assert_eq!(Instruction::Binary(BinOp::Pow).to_string(), "binop ^");
        assert_eq!(Instruction::Load(2).to_string(), "load 2");
    }
}
