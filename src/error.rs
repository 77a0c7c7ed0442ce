use inkwell::builder::BuilderError;
use thiserror::Error;

pub type Result<T, E = CompileError> = std::result::Result<T, E>;

/// Fatal errors raised by any stage of the Jam front end.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("lex error on line {line}: {message}")]
    Lex { line: usize, message: String },
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("unknown type `{0}`")]
    UnknownType(String),
    #[error("unknown variable name `{0}`")]
    UnknownVariable(String),
    #[error("unknown function referenced: `{0}`")]
    UnknownFunction(String),
    #[error("function `{0}` is already defined")]
    DuplicateFunction(String),
    #[error("incorrect number of arguments passed to `{callee}`: expected {expected}, found {found}")]
    ArityMismatch {
        callee: String,
        expected: usize,
        found: usize,
    },
    #[error("invalid binary operator `{0}`")]
    InvalidOperator(String),
    #[error("`{0}` is not inside a loop")]
    LoopControlOutsideLoop(&'static str),
    #[error("type mismatch in for loop range")]
    RangeTypeMismatch,
    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
    },
    #[error("operand width mismatch for `{op}`: {lhs} vs {rhs}")]
    OperandWidthMismatch {
        op: String,
        lhs: String,
        rhs: String,
    },
    #[error("`{0}` is taken by the C runtime function behind print/println")]
    RuntimeNameClash(String),
    #[error("complex formatting not yet implemented for `{0}`")]
    UnimplementedBuiltin(String),
    #[error("function `{0}` failed verification")]
    InvalidFunction(String),
    #[error("backend error: {0}")]
    Backend(String),
}

impl CompileError {
    /// Short classification string used for logging.
    pub fn category(&self) -> &'static str {
        match self {
            CompileError::Lex { .. } => "lex",
            CompileError::Parse { .. } => "parse",
            CompileError::UnknownType(_) => "type",
            CompileError::Backend(_) | CompileError::InvalidFunction(_) => "backend",
            _ => "codegen",
        }
    }

    pub(crate) fn mismatch(
        context: impl Into<String>,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        CompileError::TypeMismatch {
            context: context.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

impl From<BuilderError> for CompileError {
    fn from(err: BuilderError) -> Self {
        CompileError::Backend(err.to_string())
    }
}
