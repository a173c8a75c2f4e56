use thiserror::Error;

/// Errors raised while building or compiling an expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
	#[error("division by zero")]
	DivideByZero,

	#[error("exponent must be a positive integer, got {0}")]
	InvalidExponent(u32),

	#[error("penalty strength must be positive, got {0}")]
	InvalidStrength(f64),

	#[error("internal error: {0}")]
	Internal(String),
}

/// Errors raised while evaluating a compiled model against placeholder
/// bindings or a sample.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
	#[error("no value bound for placeholder '{0}'")]
	UnknownPlaceholder(String),

	#[error("sample is missing variable '{0}'")]
	MissingVariable(String),

	#[error("variable index {index} out of range for {len} variables")]
	IndexOutOfRange { index: usize, len: usize },

	#[error("invalid vartype '{0}', expected BINARY or SPIN")]
	InvalidVartype(String),

	#[error("internal error: {0}")]
	Internal(String),
}
