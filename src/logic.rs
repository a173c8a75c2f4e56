//! Logic-gate building blocks over binary expressions.
//!
//! The gate functions return plain expressions whose energy equals the
//! gate's truth value; the `*_const` functions return labeled
//! sub-Hamiltonians whose energy is zero exactly when the gate relation
//! holds, for use as soft constraints.

use crate::expr::Expr;

/// `1 - a`: energy 1 when `a` is 0, energy 0 when `a` is 1.
pub fn not(bit: Expr) -> Expr {
	Expr::user_defined(1.0 - bit)
}

/// `a * b`.
pub fn and(bit_a: Expr, bit_b: Expr) -> Expr {
	Expr::user_defined(bit_a * bit_b)
}

/// De Morgan form `not(not(a) * not(b))`.
pub fn or(bit_a: Expr, bit_b: Expr) -> Expr {
	Expr::user_defined(not(and(not(bit_a), not(bit_b))))
}

/// Penalty for `not(a) = b`; zero when the relation holds, otherwise 1.
pub fn not_const(a: Expr, b: Expr, label: impl Into<String>) -> Expr {
	let expr = 2.0 * a.clone() * b.clone() - a - b + 1.0;
	Expr::subh(expr, label)
}

/// Penalty for `and(a, b) = c`.
pub fn and_const(a: Expr, b: Expr, c: Expr, label: impl Into<String>) -> Expr {
	let expr = a.clone() * b.clone() - 2.0 * (a + b) * c.clone() + 3.0 * c;
	Expr::subh(expr, label)
}

/// Penalty for `or(a, b) = c`.
pub fn or_const(a: Expr, b: Expr, c: Expr, label: impl Into<String>) -> Expr {
	let expr = a.clone() * b.clone() + (a + b) * (1.0 - 2.0 * c.clone()) + c;
	Expr::subh(expr, label)
}

/// Penalty for `xor(a, b) = c`. Introduces the helper variable
/// `"aux_<label>"`, which must equal `a * b` in a satisfying assignment.
pub fn xor_const(a: Expr, b: Expr, c: Expr, label: impl Into<String>) -> Expr {
	let label = label.into();
	let aux = Expr::binary(format!("aux_{}", label));
	let expr = 2.0 * a.clone() * b.clone() - 2.0 * (a.clone() + b.clone()) * c.clone()
		- 4.0 * (a.clone() + b.clone()) * aux.clone()
		+ 4.0 * aux.clone() * c.clone()
		+ a + b + c
		+ 4.0 * aux;
	Expr::subh(expr, label)
}
