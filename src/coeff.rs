use crate::error::EvalError;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Placeholder bindings supplied at evaluation time.
pub type FeedDict = HashMap<String, f64>;

/// Symbolic coefficient of a polynomial term.
///
/// Two `Num` operands combine eagerly in `add`/`mul`; symbolic subtrees
/// are never rewritten, so structural equality is preserved.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum CoeffExpr {
	Num(f64),
	Placeholder(String),
	Add(Arc<CoeffExpr>, Arc<CoeffExpr>),
	Mul(Arc<CoeffExpr>, Arc<CoeffExpr>),
}

impl CoeffExpr {
	pub(crate) fn placeholder(label: impl Into<String>) -> Self {
		Self::Placeholder(label.into())
	}

	pub(crate) fn add(self, other: CoeffExpr) -> CoeffExpr {
		match (self, other) {
			(CoeffExpr::Num(lhs), CoeffExpr::Num(rhs)) => CoeffExpr::Num(lhs + rhs),
			(lhs, rhs) => CoeffExpr::Add(Arc::new(lhs), Arc::new(rhs)),
		}
	}

	pub(crate) fn mul(self, other: CoeffExpr) -> CoeffExpr {
		match (self, other) {
			(CoeffExpr::Num(lhs), CoeffExpr::Num(rhs)) => CoeffExpr::Num(lhs * rhs),
			(lhs, rhs) => CoeffExpr::Mul(Arc::new(lhs), Arc::new(rhs)),
		}
	}

	/// Collapses the tree to a number using `feed_dict`.
	pub(crate) fn evaluate(&self, feed_dict: &FeedDict) -> Result<f64, EvalError> {
		match self {
			CoeffExpr::Num(value) => Ok(*value),
			CoeffExpr::Placeholder(label) => feed_dict
				.get(label)
				.copied()
				.ok_or_else(|| EvalError::UnknownPlaceholder(label.clone())),
			CoeffExpr::Add(lhs, rhs) => Ok(lhs.evaluate(feed_dict)? + rhs.evaluate(feed_dict)?),
			CoeffExpr::Mul(lhs, rhs) => Ok(lhs.evaluate(feed_dict)? * rhs.evaluate(feed_dict)?),
		}
	}

	/// Distributes the tree into a sum of placeholder monomials.
	pub(crate) fn expand(&self) -> CoeffPoly {
		match self {
			CoeffExpr::Num(value) => CoeffPoly::constant(*value),
			CoeffExpr::Placeholder(label) => {
				CoeffPoly::monomial(CoeffProd::placeholder(label.clone()), 1.0)
			}
			CoeffExpr::Add(lhs, rhs) => lhs.expand().sum(rhs.expand()),
			CoeffExpr::Mul(lhs, rhs) => lhs.expand().product(&rhs.expand()),
		}
	}

	pub(crate) fn collect_placeholders(&self, out: &mut BTreeSet<String>) {
		match self {
			CoeffExpr::Num(_) => {}
			CoeffExpr::Placeholder(label) => {
				out.insert(label.clone());
			}
			CoeffExpr::Add(lhs, rhs) | CoeffExpr::Mul(lhs, rhs) => {
				lhs.collect_placeholders(out);
				rhs.collect_placeholders(out);
			}
		}
	}
}

impl fmt::Display for CoeffExpr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CoeffExpr::Num(value) => write!(f, "{}", value),
			CoeffExpr::Placeholder(label) => write!(f, "Placeholder('{}')", label),
			CoeffExpr::Add(lhs, rhs) => write!(f, "({} + {})", lhs, rhs),
			CoeffExpr::Mul(lhs, rhs) => write!(f, "({} * {})", lhs, rhs),
		}
	}
}

/// Multiset of placeholder labels with integer exponents.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct CoeffProd {
	exponents: BTreeMap<String, u32>,
}

impl CoeffProd {
	fn placeholder(label: String) -> Self {
		let mut exponents = BTreeMap::new();
		exponents.insert(label, 1);
		Self { exponents }
	}

	fn mul(&self, other: &CoeffProd) -> CoeffProd {
		let mut exponents = self.exponents.clone();
		for (label, exponent) in &other.exponents {
			*exponents.entry(label.clone()).or_insert(0) += exponent;
		}
		CoeffProd { exponents }
	}

	fn evaluate(&self, feed_dict: &FeedDict) -> Result<f64, EvalError> {
		let mut out = 1.0;
		for (label, exponent) in &self.exponents {
			let value = feed_dict
				.get(label)
				.copied()
				.ok_or_else(|| EvalError::UnknownPlaceholder(label.clone()))?;
			out *= value.powi(*exponent as i32);
		}
		Ok(out)
	}
}

/// Sparse sum of placeholder monomials with numeric coefficients.
///
/// A coefficient expression shared across many polynomial terms is
/// expanded once into this form, so that re-scoring a model against many
/// samples does not re-walk the symbolic tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct CoeffPoly {
	terms: FxHashMap<CoeffProd, f64>,
}

impl CoeffPoly {
	fn constant(value: f64) -> Self {
		Self::monomial(CoeffProd::default(), value)
	}

	fn monomial(prod: CoeffProd, coeff: f64) -> Self {
		let mut terms = FxHashMap::default();
		terms.insert(prod, coeff);
		Self { terms }
	}

	fn insert(&mut self, prod: CoeffProd, coeff: f64) {
		*self.terms.entry(prod).or_insert(0.0) += coeff;
	}

	fn sum(mut self, other: CoeffPoly) -> CoeffPoly {
		for (prod, coeff) in other.terms {
			self.insert(prod, coeff);
		}
		self
	}

	fn product(&self, other: &CoeffPoly) -> CoeffPoly {
		let mut out = CoeffPoly::default();
		for (prod_l, coeff_l) in &self.terms {
			for (prod_r, coeff_r) in &other.terms {
				out.insert(prod_l.mul(prod_r), coeff_l * coeff_r);
			}
		}
		out
	}

	pub(crate) fn evaluate(&self, feed_dict: &FeedDict) -> Result<f64, EvalError> {
		let mut out = 0.0;
		for (prod, coeff) in &self.terms {
			out += prod.evaluate(feed_dict)? * coeff;
		}
		Ok(out)
	}
}
