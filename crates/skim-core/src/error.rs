use std::fmt;

/// Check arity of a primitive's argument slice, returning `SkimError::Arity`
/// on mismatch.
///
/// # Forms
///
/// ```ignore
/// check_arity!(args, "car", 1);        // exactly 1
/// check_arity!(args, "substring", 2..=3); // 2 to 3 inclusive
/// check_arity!(args, "+", 0..);        // 0 or more
/// ```
#[macro_export]
macro_rules! check_arity {
    ($args:expr, $name:expr, $exact:literal) => {
        if $args.len() != $exact {
            return Err($crate::SkimError::arity(
                $name,
                stringify!($exact),
                $args.len(),
            ));
        }
    };
    ($args:expr, $name:expr, $lo:literal ..= $hi:literal) => {
        if $args.len() < $lo || $args.len() > $hi {
            return Err($crate::SkimError::arity(
                $name,
                concat!(stringify!($lo), "-", stringify!($hi)),
                $args.len(),
            ));
        }
    };
    ($args:expr, $name:expr, $lo:literal ..) => {
        if $args.len() < $lo {
            return Err($crate::SkimError::arity(
                $name,
                concat!(stringify!($lo), "+"),
                $args.len(),
            ));
        }
    };
}

/// Source position of a token, for reader diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

impl Span {
    pub fn point(line: usize, col: usize) -> Self {
        Span { line, col }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SkimError {
    #[error("parse error at {span}: {message}")]
    Parse { message: String, span: Span },

    #[error("eval error: {0}")]
    Eval(String),

    #[error("unbound variable: {0}")]
    Unbound(String),

    #[error("type error: expected {expected}, got {got}")]
    Type { expected: String, got: String },

    #[error("arity error: {name} expects {expected} args, got {got}")]
    Arity {
        name: String,
        expected: String,
        got: usize,
    },

    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("range error: {name} index {index} out of bounds for length {len}")]
    Range {
        name: String,
        index: i64,
        len: usize,
    },
}

impl SkimError {
    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        SkimError::Parse {
            message: message.into(),
            span,
        }
    }

    pub fn eval(msg: impl Into<String>) -> Self {
        SkimError::Eval(msg.into())
    }

    pub fn type_error(expected: impl Into<String>, got: impl Into<String>) -> Self {
        SkimError::Type {
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub fn arity(name: impl Into<String>, expected: impl Into<String>, got: usize) -> Self {
        SkimError::Arity {
            name: name.into(),
            expected: expected.into(),
            got,
        }
    }

    pub fn range(name: impl Into<String>, index: i64, len: usize) -> Self {
        SkimError::Range {
            name: name.into(),
            index,
            len,
        }
    }
}

impl From<std::io::Error> for SkimError {
    fn from(e: std::io::Error) -> Self {
        SkimError::Io(e.to_string())
    }
}
