//! Execution boundary and the budgeted reference executor.
//!
//! The session hands compiled programs to anything implementing [`Cpu`].
//! [`StackCpu`] is the bundled machine: a value stack, a global store, and
//! an instruction pointer driven in cooperative slices.  Because the
//! program builder only ever extends the instruction sequence, the machine
//! keeps its pointer when a newly adopted program starts with the old one
//! and restarts from scratch when it does not.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::program::{BinOp, Instruction};
use crate::value::Value;

// ── Boundary ──────────────────────────────────────────────────────────────────

/// Consumer of built instruction sequences.
pub trait Cpu {
    /// Adopt a freshly built program.  Called repeatedly over a session,
    /// usually with a sequence extending the previous one.
    fn update_program(&mut self, program: Vec<Instruction>);

    /// Abort whatever is running.  `manual` marks an operator interrupt
    /// rather than an internal stop.
    fn break_execution(&mut self, manual: bool);
}

impl<T: Cpu> Cpu for Rc<RefCell<T>> {
    fn update_program(&mut self, program: Vec<Instruction>) {
        self.borrow_mut().update_program(program);
    }

    fn break_execution(&mut self, manual: bool) {
        self.borrow_mut().break_execution(manual);
    }
}

/// Runtime fault.  Halts the current program; the session survives.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecError {
    pub message: String,
}

impl ExecError {
    fn new(message: impl Into<String>) -> ExecError {
        ExecError { message: message.into() }
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ExecError {}

impl From<String> for ExecError {
    fn from(message: String) -> ExecError {
        ExecError { message }
    }
}

// ── Instruction budget ────────────────────────────────────────────────────────

/// How many instructions one tick may retire.  Built fresh for every tick
/// and passed in by value; the executor spends it, never stores it.
#[derive(Debug, Clone, Copy)]
pub struct InstructionBudget {
    limit: usize,
    used: usize,
}

impl InstructionBudget {
    pub fn new(limit: usize) -> InstructionBudget {
        InstructionBudget { limit, used: 0 }
    }

    /// Account one instruction; false once the slice is spent.
    fn try_spend(&mut self) -> bool {
        if self.used < self.limit {
            self.used += 1;
            true
        } else {
            false
        }
    }

    pub fn used(&self) -> usize {
        self.used
    }
}

// ── Stack machine ─────────────────────────────────────────────────────────────

/// Longest `wait` the machine will honor (one year, in seconds).
const MAX_WAIT_SECONDS: f64 = 365.0 * 24.0 * 3600.0;

/// The reference executor.
#[derive(Debug, Default)]
pub struct StackCpu {
    program: Vec<Instruction>,
    ip: usize,
    stack: Vec<Value>,
    globals: HashMap<u16, Value>,
    out: Vec<String>,
    wait_until: Option<Instant>,
    last_tick_used: usize,
}

impl StackCpu {
    pub fn new() -> StackCpu {
        StackCpu::default()
    }

    /// Run one budgeted slice.  A fault halts the current program and is
    /// returned for the front end to report; already queued output stays.
    pub fn tick(&mut self, mut budget: InstructionBudget) -> Result<(), ExecError> {
        let result = self.run_slice(&mut budget);
        self.last_tick_used = budget.used();
        if result.is_err() {
            self.halt();
        }
        result
    }

    fn run_slice(&mut self, budget: &mut InstructionBudget) -> Result<(), ExecError> {
        if let Some(deadline) = self.wait_until {
            if Instant::now() < deadline {
                return Ok(());
            }
            self.wait_until = None;
        }
        while self.ip < self.program.len() && self.wait_until.is_none() && budget.try_spend() {
            self.step()?;
        }
        Ok(())
    }

    fn step(&mut self) -> Result<(), ExecError> {
        let instr = self.program[self.ip].clone();
        self.ip += 1;
        match instr {
            Instruction::Push(value) => self.stack.push(value),
            Instruction::Load(slot) => match self.globals.get(&slot) {
                Some(value) => self.stack.push(value.clone()),
                None => return Err(ExecError::new("variable read before assignment")),
            },
            Instruction::Store(slot) => {
                let value = self.pop()?;
                self.globals.insert(slot, value);
            }
            Instruction::Binary(op) => {
                let rhs = self.pop()?;
                let lhs = self.pop()?;
                let value = apply_binary(&lhs, op, &rhs)?;
                self.stack.push(value);
            }
            Instruction::Negate => {
                let value = self.pop()?;
                self.stack.push(value.arith_neg());
            }
            Instruction::Print => {
                let value = self.pop()?;
                self.out.push(value.to_string());
            }
            Instruction::Wait => {
                let seconds = self.pop()?.as_float();
                if seconds.is_finite() && seconds > 0.0 {
                    // Cap the park: `Duration::from_secs_f64` rejects
                    // astronomic values outright.
                    let capped = seconds.min(MAX_WAIT_SECONDS);
                    self.wait_until = Some(Instant::now() + Duration::from_secs_f64(capped));
                }
            }
            Instruction::Toggle(slot) => {
                let current = self.globals.get(&slot).map(Value::as_bool).unwrap_or(false);
                self.globals.insert(slot, Value::Bool(!current));
            }
            Instruction::EndOfProgram => self.halt(),
        }
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, ExecError> {
        self.stack.pop().ok_or_else(|| ExecError::new("stack underflow"))
    }

    fn halt(&mut self) {
        self.ip = self.program.len();
        self.stack.clear();
        self.wait_until = None;
    }

    /// Nothing left to run and not waiting.
    pub fn idle(&self) -> bool {
        self.ip >= self.program.len() && self.wait_until.is_none()
    }

    pub fn instructions_last_tick(&self) -> usize {
        self.last_tick_used
    }

    /// Drain queued `print` output.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.out)
    }
}

impl Cpu for StackCpu {
    fn update_program(&mut self, program: Vec<Instruction>) {
        if !program.starts_with(&self.program) {
            self.ip = 0;
            self.stack.clear();
            self.globals.clear();
            self.wait_until = None;
        }
        self.program = program;
    }

    fn break_execution(&mut self, manual: bool) {
        self.halt();
        if manual {
            self.out.push("program aborted.".to_owned());
        }
    }
}

fn apply_binary(lhs: &Value, op: BinOp, rhs: &Value) -> Result<Value, ExecError> {
    Ok(match op {
        BinOp::Add => lhs.arith_add(rhs),
        BinOp::Sub => lhs.arith_sub(rhs),
        BinOp::Mul => lhs.arith_mul(rhs),
        BinOp::Div => lhs.arith_div(rhs)?,
        BinOp::Pow => lhs.arith_pow(rhs),
        BinOp::Eq => Value::Bool(lhs.eq_value(rhs)),
        BinOp::Lt => Value::Bool(lhs.cmp_value(rhs) == Ordering::Less),
        BinOp::Gt => Value::Bool(lhs.cmp_value(rhs) == Ordering::Greater),
        BinOp::Le => Value::Bool(lhs.cmp_value(rhs) != Ordering::Greater),
        BinOp::Ge => Value::Bool(lhs.cmp_value(rhs) != Ordering::Less),
        BinOp::And => Value::Bool(lhs.as_bool() && rhs.as_bool()),
        BinOp::Or => Value::Bool(lhs.as_bool() || rhs.as_bool()),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
