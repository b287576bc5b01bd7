//! Runtime value type for HelmScript programs.
//!
//! HelmScript is loosely typed: booleans, integers, reals, and strings
//! coerce to one another where an operation calls for it.  The same type
//! doubles as the literal payload of a scanned token, so the scanner,
//! compiler, and executor all trade in one representation.

use std::fmt;

/// A HelmScript scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Default for Value {
    fn default() -> Self {
        Value::Int(0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => {
                // Keep one decimal on round reals so they stay visibly real.
                if x.fract() == 0.0 && x.abs() < 1e15 {
                    write!(f, "{:.1}", x)
                } else {
                    write!(f, "{x}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

impl Value {
    /// Coerce to boolean: `false`, `0`, `0.0`, `""`, and `"0"` are falsy.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty() && s != "0",
        }
    }

    /// Coerce to `i64` (0 for a non-numeric string).
    pub fn as_int(&self) -> i64 {
        match self {
            Value::Bool(b) => i64::from(*b),
            Value::Int(n) => *n,
            Value::Float(x) => *x as i64,
            Value::Str(s) => s.trim().parse().unwrap_or(0),
        }
    }

    /// Coerce to `f64`.
    pub fn as_float(&self) -> f64 {
        match self {
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Int(n) => *n as f64,
            Value::Float(x) => *x,
            Value::Str(s) => s.trim().parse().unwrap_or(0.0),
        }
    }

    /// Name of the type, as used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "real",
            Value::Str(_) => "string",
        }
    }

    // ── Arithmetic helpers ────────────────────────────────────────────────────

    /// Common numeric form for a binary operation: `(lhs, rhs, is_real)`.
    fn numeric_promote(a: &Value, b: &Value) -> (f64, f64, bool) {
        let is_real = matches!(a, Value::Float(_))
            || matches!(b, Value::Float(_))
            || matches!(a, Value::Str(s) if s.contains('.'))
            || matches!(b, Value::Str(s) if s.contains('.'));
        (a.as_float(), b.as_float(), is_real)
    }

    fn make_numeric(f: f64, is_real: bool) -> Value {
        if is_real {
            Value::Float(f)
        } else {
            Value::Int(f as i64)
        }
    }

    /// `+` concatenates when either operand is a string, adds otherwise.
    pub fn arith_add(&self, rhs: &Value) -> Value {
        if matches!(self, Value::Str(_)) || matches!(rhs, Value::Str(_)) {
            return Value::Str(format!("{self}{rhs}"));
        }
        let (a, b, is_real) = Self::numeric_promote(self, rhs);
        Self::make_numeric(a + b, is_real)
    }

    pub fn arith_sub(&self, rhs: &Value) -> Value {
        let (a, b, is_real) = Self::numeric_promote(self, rhs);
        Self::make_numeric(a - b, is_real)
    }

    pub fn arith_mul(&self, rhs: &Value) -> Value {
        let (a, b, is_real) = Self::numeric_promote(self, rhs);
        Self::make_numeric(a * b, is_real)
    }

    pub fn arith_div(&self, rhs: &Value) -> Result<Value, String> {
        let (a, b, is_real) = Self::numeric_promote(self, rhs);
        if b == 0.0 {
            return Err("division by zero".into());
        }
        // Integer division that doesn't divide evenly falls through to real.
        let q = a / b;
        Ok(Self::make_numeric(q, is_real || q.fract() != 0.0))
    }

    /// `^` stays integral for non-negative integer exponents, real otherwise.
    pub fn arith_pow(&self, rhs: &Value) -> Value {
        if let (Value::Int(base), Value::Int(exp)) = (self, rhs) {
            if *exp >= 0 {
                if let Ok(e) = u32::try_from(*exp) {
                    if let Some(n) = base.checked_pow(e) {
                        return Value::Int(n);
                    }
                }
            }
        }
        Value::Float(self.as_float().powf(rhs.as_float()))
    }

    pub fn arith_neg(&self) -> Value {
        match self {
            // i64::MIN has no integer negation; fall through to real.
            Value::Int(n) => match n.checked_neg() {
                Some(m) => Value::Int(m),
                None => Value::Float(-(*n as f64)),
            },
            Value::Float(x) => Value::Float(-x),
            other => Self::make_numeric(-other.as_float(), false),
        }
    }

    /// Relational comparison; strings compare numerically when both parse.
    pub fn cmp_value(&self, rhs: &Value) -> std::cmp::Ordering {
        match (self, rhs) {
            (Value::Str(a), Value::Str(b)) => {
                match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
                    (Ok(af), Ok(bf)) => af.partial_cmp(&bf).unwrap_or(std::cmp::Ordering::Equal),
                    _ => a.cmp(b),
                }
            }
            _ => {
                let (a, b, _) = Self::numeric_promote(self, rhs);
                a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
            }
        }
    }

    /// Equality under the same coercions as [`Value::cmp_value`].
    pub fn eq_value(&self, rhs: &Value) -> bool {
        match (self, rhs) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => {
                a == b || self.cmp_value(rhs) == std::cmp::Ordering::Equal
            }
            _ => self.cmp_value(rhs) == std::cmp::Ordering::Equal,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Float(3.14).to_string(), "3.14");
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Str("hello".into()).to_string(), "hello");
    }

    #[test]
    fn as_bool() {
        assert!(Value::Bool(true).as_bool());
        assert!(Value::Int(1).as_bool());
        assert!(!Value::Int(0).as_bool());
        assert!(!Value::Float(0.0).as_bool());
        assert!(Value::Str("hi".into()).as_bool());
        assert!(!Value::Str("".into()).as_bool());
        assert!(!Value::Str("0".into()).as_bool());
    }

    #[test]
    fn as_int_coercions() {
        assert_eq!(Value::Bool(true).as_int(), 1);
        assert_eq!(Value::Float(3.9).as_int(), 3);
        assert_eq!(Value::Str("42".into()).as_int(), 42);
        assert_eq!(Value::Str("abc".into()).as_int(), 0);
    }

    #[test]
    fn arithmetic() {
        let a = Value::Int(10);
        let b = Value::Int(3);
        assert_eq!(a.arith_add(&b), Value::Int(13));
        assert_eq!(a.arith_sub(&b), Value::Int(7));
        assert_eq!(a.arith_mul(&b), Value::Int(30));
        assert_eq!(Value::Int(10).arith_div(&Value::Int(2)), Ok(Value::Int(5)));
    }

    #[test]
    fn uneven_division_goes_real() {
        assert_eq!(
            Value::Int(10).arith_div(&Value::Int(4)),
            Ok(Value::Float(2.5))
        );
    }

    #[test]
    fn div_by_zero() {
        assert!(Value::Int(1).arith_div(&Value::Int(0)).is_err());
    }

    #[test]
    fn string_concat_on_add() {
        let v = Value::Str("t+".into()).arith_add(&Value::Int(10));
        assert_eq!(v, Value::Str("t+10".into()));
    }

    #[test]
    fn pow() {
        assert_eq!(Value::Int(2).arith_pow(&Value::Int(10)), Value::Int(1024));
        assert_eq!(
            Value::Int(2).arith_pow(&Value::Int(-1)),
            Value::Float(0.5)
        );
    }

    #[test]
    fn float_promotion() {
        assert_eq!(
            Value::Int(7).arith_add(&Value::Float(2.0)),
            Value::Float(9.0)
        );
    }

    #[test]
    fn comparisons() {
        use std::cmp::Ordering;
        assert_eq!(Value::Int(1).cmp_value(&Value::Int(2)), Ordering::Less);
        assert_eq!(
            Value::Str("10".into()).cmp_value(&Value::Str("9".into())),
            Ordering::Greater
        );
        assert!(Value::Str("5".into()).eq_value(&Value::Int(5)));
        assert!(Value::Bool(true).eq_value(&Value::Bool(true)));
    }

    #[test]
    fn from_impls() {
        let v: Value = 42i64.into();
        assert_eq!(v, Value::Int(42));
        let v: Value = true.into();
        assert_eq!(v, Value::Bool(true));
        let v: Value = "hi".into();
        assert_eq!(v, Value::Str("hi".into()));
    }
}
