//! Integer variables encoded over binary vectors.

use crate::expr::Expr;

/// An integer in `[lower, upper]` under one-hot encoding: one binary
/// variable per value, named `"<label>[i]"`, with the one-hot condition
/// attached both as a reported constraint and as a penalty scaled by
/// `strength`.
///
/// The integer's value is published as the sub-Hamiltonian `<label>`, so
/// decoded solutions report it directly.
#[derive(Clone, Debug)]
pub struct OneHotInteger {
	label: String,
	lower: i64,
	upper: i64,
	expr: Expr,
}

impl OneHotInteger {
	/// `strength` is the penalty multiplier, a number or a placeholder.
	pub fn new(label: impl Into<String>, lower: i64, upper: i64, strength: Expr) -> Self {
		assert!(upper > lower, "upper value should be larger than lower value");
		let label = label.into();
		let bits: Vec<Expr> = (0..=(upper - lower))
			.map(|i| Expr::binary(format!("{}[{}]", label, i)))
			.collect();

		let mut value = Expr::number(lower as f64);
		for (i, bit) in bits.iter().enumerate() {
			value = value + bit.clone() * (i as f64);
		}

		let mut bit_sum = Expr::number(-1.0);
		for bit in &bits {
			bit_sum = bit_sum + bit.clone();
		}
		let one_hot = Expr::constraint(
			bit_sum ^ 2,
			format!("{}_const", label),
			|energy| energy == 0.0,
		);

		let expr = Expr::with_penalty(
			Expr::subh(value, label.clone()),
			one_hot * strength,
			label.clone(),
		);
		Self {
			label,
			lower,
			upper,
			expr,
		}
	}

	pub fn label(&self) -> &str {
		&self.label
	}

	pub fn value_range(&self) -> (i64, i64) {
		(self.lower, self.upper)
	}

	/// The integer as an expression; uses of the same integer share one
	/// penalty through its label.
	pub fn expr(&self) -> Expr {
		self.expr.clone()
	}

	/// The binary variable that is 1 exactly when the integer equals `k`.
	pub fn equal_to(&self, k: i64) -> Expr {
		assert!(
			self.lower <= k && k <= self.upper,
			"this integer never takes {}",
			k
		);
		Expr::binary(format!("{}[{}]", self.label, k - self.lower))
	}
}

impl From<OneHotInteger> for Expr {
	fn from(integer: OneHotInteger) -> Self {
		integer.expr
	}
}
