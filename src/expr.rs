use crate::coeff::CoeffExpr;
use crate::compiled::CompiledModel;
use crate::error::CompileError;
use crate::expand::Expander;
use crate::reduce;
use crate::vars::VariableTable;
use std::fmt;
use std::ops::{Add, BitXor, Div, Mul, Neg, Sub};
use std::sync::Arc;

/// Predicate deciding whether a constraint energy counts as satisfied.
#[derive(Clone)]
pub struct Condition(Arc<dyn Fn(f64) -> bool + Send + Sync>);

impl Condition {
	pub fn new(condition: impl Fn(f64) -> bool + Send + Sync + 'static) -> Self {
		Self(Arc::new(condition))
	}

	pub fn check(&self, energy: f64) -> bool {
		(self.0)(energy)
	}
}

impl fmt::Debug for Condition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Condition(..)")
	}
}

/// Algebraic expression over binary/spin variables, numbers and
/// placeholders, with optional sub-Hamiltonian / constraint / penalty
/// annotations.
///
/// `+` and `*` fold two `Number` operands eagerly and otherwise build the
/// tree as written; in particular `Add` is n-ary and keeps its children
/// in construction order, and equality is position-sensitive.
#[derive(Clone, Debug)]
pub enum Expr {
	Number(f64),
	Placeholder(String),
	Binary(String),
	Spin(String),
	Add(Vec<Expr>),
	Mul(Box<Expr>, Box<Expr>),
	Pow(Box<Expr>, u32),
	SubH {
		label: String,
		expr: Box<Expr>,
	},
	Constraint {
		label: String,
		expr: Box<Expr>,
		condition: Condition,
	},
	WithPenalty {
		label: String,
		expr: Box<Expr>,
		penalty: Box<Expr>,
	},
	UserDefined(Box<Expr>),
}

impl Expr {
	pub fn number(value: f64) -> Self {
		Expr::Number(value)
	}

	pub fn binary(label: impl Into<String>) -> Self {
		Expr::Binary(label.into())
	}

	pub fn spin(label: impl Into<String>) -> Self {
		Expr::Spin(label.into())
	}

	pub fn placeholder(label: impl Into<String>) -> Self {
		Expr::Placeholder(label.into())
	}

	/// Tags `expr` so its energy is reported separately during decoding.
	pub fn subh(expr: Expr, label: impl Into<String>) -> Self {
		Expr::SubH {
			label: label.into(),
			expr: Box::new(expr),
		}
	}

	/// Tags `expr` as a constraint; `condition` receives the constraint
	/// energy of a decoded sample and returns whether it is satisfied.
	pub fn constraint(
		expr: Expr,
		label: impl Into<String>,
		condition: impl Fn(f64) -> bool + Send + Sync + 'static,
	) -> Self {
		Expr::Constraint {
			label: label.into(),
			expr: Box::new(expr),
			condition: Condition::new(condition),
		}
	}

	/// Attaches `penalty` to `expr`; the penalty is added to the total
	/// Hamiltonian before reduction, once per label.
	pub fn with_penalty(expr: Expr, penalty: Expr, label: impl Into<String>) -> Self {
		Expr::WithPenalty {
			label: label.into(),
			expr: Box::new(expr),
			penalty: Box::new(penalty),
		}
	}

	/// Transparent wrapper for expressions assembled by user-level
	/// abstractions.
	pub fn user_defined(expr: Expr) -> Self {
		Expr::UserDefined(Box::new(expr))
	}

	/// `self` raised to a positive integer power. An exponent of 1
	/// returns `self` unchanged; 0 is rejected.
	pub fn pow(self, exponent: u32) -> Result<Expr, CompileError> {
		match exponent {
			0 => Err(CompileError::InvalidExponent(0)),
			1 => Ok(self),
			_ => Ok(Expr::Pow(Box::new(self), exponent)),
		}
	}

	/// `self` divided by a non-zero constant.
	pub fn div(self, divisor: f64) -> Result<Expr, CompileError> {
		if divisor == 0.0 {
			Err(CompileError::DivideByZero)
		} else {
			Ok(self * (1.0 / divisor))
		}
	}

	/// Compiles the expression into a quadratic model with a numeric
	/// penalty strength. The strength must be positive, otherwise the
	/// reducer's AND penalties would not bind auxiliary variables.
	pub fn compile(&self, strength: f64) -> Result<CompiledModel, CompileError> {
		if strength <= 0.0 {
			return Err(CompileError::InvalidStrength(strength));
		}
		self.compile_with(CoeffExpr::Num(strength))
	}

	/// Compiles with the penalty strength deferred to a placeholder,
	/// bound later through the feed dict.
	pub fn compile_param(&self, strength_label: &str) -> Result<CompiledModel, CompileError> {
		self.compile_with(CoeffExpr::placeholder(strength_label))
	}

	fn compile_with(&self, strength: CoeffExpr) -> Result<CompiledModel, CompileError> {
		let mut variables = VariableTable::new();
		let expanded = Expander::expand(self, &mut variables);
		let quadratic = reduce::make_quadratic(expanded.hamiltonian, &strength, &mut variables)?;
		Ok(CompiledModel::new(
			quadratic,
			expanded.sub_hamiltonians,
			expanded.constraints,
			variables,
		))
	}
}

impl PartialEq for Expr {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Expr::Number(lhs), Expr::Number(rhs)) => lhs == rhs,
			(Expr::Placeholder(lhs), Expr::Placeholder(rhs)) => lhs == rhs,
			(Expr::Binary(lhs), Expr::Binary(rhs)) => lhs == rhs,
			(Expr::Spin(lhs), Expr::Spin(rhs)) => lhs == rhs,
			(Expr::Add(lhs), Expr::Add(rhs)) => lhs == rhs,
			(Expr::Mul(ll, lr), Expr::Mul(rl, rr)) => ll == rl && lr == rr,
			(Expr::Pow(lhs, le), Expr::Pow(rhs, re)) => le == re && lhs == rhs,
			(Expr::SubH { label: ll, expr: le }, Expr::SubH { label: rl, expr: re }) => {
				ll == rl && le == re
			}
			(
				Expr::Constraint { label: ll, expr: le, .. },
				Expr::Constraint { label: rl, expr: re, .. },
			) => ll == rl && le == re,
			(
				Expr::WithPenalty { label: ll, expr: le, penalty: lp },
				Expr::WithPenalty { label: rl, expr: re, penalty: rp },
			) => ll == rl && le == re && lp == rp,
			(Expr::UserDefined(lhs), Expr::UserDefined(rhs)) => lhs == rhs,
			_ => false,
		}
	}
}

impl fmt::Display for Expr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Expr::Number(value) => write!(f, "{}", value),
			Expr::Placeholder(label) => write!(f, "Placeholder('{}')", label),
			Expr::Binary(label) => write!(f, "Binary('{}')", label),
			Expr::Spin(label) => write!(f, "Spin('{}')", label),
			Expr::Add(children) => {
				f.write_str("(")?;
				for (i, child) in children.iter().enumerate() {
					if i > 0 {
						f.write_str(" + ")?;
					}
					write!(f, "{}", child)?;
				}
				f.write_str(")")
			}
			Expr::Mul(lhs, rhs) => write!(f, "({} * {})", lhs, rhs),
			Expr::Pow(expr, exponent) => write!(f, "({} ^ {})", expr, exponent),
			Expr::SubH { label, expr } => write!(f, "SubH({}, '{}')", expr, label),
			Expr::Constraint { label, expr, .. } => {
				write!(f, "Constraint({}, '{}')", expr, label)
			}
			Expr::WithPenalty { label, expr, penalty } => {
				write!(f, "WithPenalty({}, {}, '{}')", expr, penalty, label)
			}
			Expr::UserDefined(expr) => write!(f, "{}", expr),
		}
	}
}

impl Add for Expr {
	type Output = Expr;

	#[inline]
	fn add(self, other: Expr) -> Self::Output {
		match (self, other) {
			(Expr::Number(lhs), Expr::Number(rhs)) => Expr::Number(lhs + rhs),
			(Expr::Add(mut children), rhs) => {
				children.push(rhs);
				Expr::Add(children)
			}
			(lhs, rhs) => Expr::Add(vec![lhs, rhs]),
		}
	}
}

impl Sub for Expr {
	type Output = Expr;

	#[inline]
	fn sub(self, other: Expr) -> Self::Output {
		self + other.neg()
	}
}

impl Mul for Expr {
	type Output = Expr;

	#[inline]
	fn mul(self, other: Expr) -> Self::Output {
		match (self, other) {
			(Expr::Number(lhs), Expr::Number(rhs)) => Expr::Number(lhs * rhs),
			(lhs, rhs) => Expr::Mul(Box::new(lhs), Box::new(rhs)),
		}
	}
}

impl Neg for Expr {
	type Output = Expr;

	#[inline]
	fn neg(self) -> Self::Output {
		Expr::Number(-1.0) * self
	}
}

/// Division by a constant; panics on zero, use [`Expr::div`] for the
/// checked form.
impl Div<f64> for Expr {
	type Output = Expr;

	#[inline]
	fn div(self, divisor: f64) -> Self::Output {
		match Expr::div(self, divisor) {
			Ok(expr) => expr,
			Err(err) => panic!("{}", err),
		}
	}
}

/// Power operator; panics on a zero exponent, use [`Expr::pow`] for the
/// checked form.
impl BitXor<u32> for Expr {
	type Output = Expr;

	#[inline]
	fn bitxor(self, exponent: u32) -> Self::Output {
		match self.pow(exponent) {
			Ok(expr) => expr,
			Err(err) => panic!("{}", err),
		}
	}
}

macro_rules! impl_numeric_op {
	($($typ:ty),*) => {$(
		impl Add<$typ> for Expr {
			type Output = Expr;
			#[inline]
			fn add(self, other: $typ) -> Self::Output {
				self + Expr::Number(other as f64)
			}
		}

		impl Add<Expr> for $typ {
			type Output = Expr;
			#[inline]
			fn add(self, other: Expr) -> Self::Output {
				Expr::Number(self as f64) + other
			}
		}

		impl Sub<$typ> for Expr {
			type Output = Expr;
			#[inline]
			fn sub(self, other: $typ) -> Self::Output {
				self + Expr::Number(-(other as f64))
			}
		}

		impl Sub<Expr> for $typ {
			type Output = Expr;
			#[inline]
			fn sub(self, other: Expr) -> Self::Output {
				Expr::Number(self as f64) - other
			}
		}

		impl Mul<$typ> for Expr {
			type Output = Expr;
			#[inline]
			fn mul(self, other: $typ) -> Self::Output {
				self * Expr::Number(other as f64)
			}
		}

		impl Mul<Expr> for $typ {
			type Output = Expr;
			#[inline]
			fn mul(self, other: Expr) -> Self::Output {
				Expr::Number(self as f64) * other
			}
		}
	)*};
}

impl_numeric_op!(i8, i16, i32, i64, f32, f64);
