use crate::coeff::CoeffExpr;
use crate::expr::{Condition, Expr};
use crate::poly::{Polynomial, Product};
use crate::vars::VariableTable;
use indexmap::IndexMap;
use rustc_hash::FxHashSet;

/// Result of lowering an AST to polynomial form.
pub(crate) struct Expanded {
	/// Main polynomial with all penalties merged in.
	pub(crate) hamiltonian: Polynomial,
	pub(crate) sub_hamiltonians: IndexMap<String, Polynomial>,
	pub(crate) constraints: IndexMap<String, (Polynomial, Condition)>,
}

/// Visitor lowering an expression tree to a [`Polynomial`].
///
/// Each visit returns `(polynomial, penalty)`. Penalties never multiply;
/// they are summands of the final Hamiltonian and flow upward additively
/// through every node. A `WithPenalty` label contributes its penalty
/// polynomial once, no matter how many AST paths reach it.
pub(crate) struct Expander<'a> {
	variables: &'a mut VariableTable,
	sub_hamiltonians: IndexMap<String, Polynomial>,
	constraints: IndexMap<String, (Polynomial, Condition)>,
	seen_penalties: FxHashSet<String>,
}

impl<'a> Expander<'a> {
	pub(crate) fn expand(expr: &Expr, variables: &'a mut VariableTable) -> Expanded {
		let mut expander = Expander {
			variables,
			sub_hamiltonians: IndexMap::new(),
			constraints: IndexMap::new(),
			seen_penalties: FxHashSet::default(),
		};
		let (mut hamiltonian, penalty) = expander.visit(expr);
		hamiltonian += penalty;
		tracing::debug!(
			terms = hamiltonian.len(),
			degree = hamiltonian.degree(),
			sub_hamiltonians = expander.sub_hamiltonians.len(),
			constraints = expander.constraints.len(),
			"expanded expression"
		);
		Expanded {
			hamiltonian,
			sub_hamiltonians: expander.sub_hamiltonians,
			constraints: expander.constraints,
		}
	}

	fn visit(&mut self, expr: &Expr) -> (Polynomial, Polynomial) {
		match expr {
			Expr::Number(value) => (
				Polynomial::monomial(Product::unit(), CoeffExpr::Num(*value)),
				Polynomial::new(),
			),
			Expr::Placeholder(label) => (
				Polynomial::monomial(Product::unit(), CoeffExpr::placeholder(label.clone())),
				Polynomial::new(),
			),
			Expr::Binary(label) => {
				let index = self.variables.index(label);
				(
					Polynomial::monomial(Product::var(index), CoeffExpr::Num(1.0)),
					Polynomial::new(),
				)
			}
			Expr::Spin(label) => {
				// s = 2b - 1
				let index = self.variables.index(label);
				let mut poly = Polynomial::new();
				poly.insert(Product::var(index), CoeffExpr::Num(2.0));
				poly.insert(Product::unit(), CoeffExpr::Num(-1.0));
				(poly, Polynomial::new())
			}
			Expr::Add(children) => {
				let mut poly = Polynomial::new();
				let mut penalty = Polynomial::new();
				for child in children {
					let (child_poly, child_penalty) = self.visit(child);
					poly += child_poly;
					penalty += child_penalty;
				}
				(poly, penalty)
			}
			Expr::Mul(lhs, rhs) => {
				let (l_poly, l_penalty) = self.visit(lhs);
				let (r_poly, r_penalty) = self.visit(rhs);
				let mut penalty = l_penalty;
				penalty += r_penalty;
				(&l_poly * &r_poly, penalty)
			}
			Expr::Pow(base, exponent) => {
				let (base_poly, penalty) = self.visit(base);
				if *exponent == 0 {
					// unreachable through the factories, but algebraically x^0 = 1
					return (
						Polynomial::monomial(Product::unit(), CoeffExpr::Num(1.0)),
						penalty,
					);
				}
				let mut poly = base_poly.clone();
				for _ in 1..*exponent {
					poly = &poly * &base_poly;
				}
				(poly, penalty)
			}
			Expr::SubH { label, expr } => {
				let (poly, penalty) = self.visit(expr);
				self.sub_hamiltonians
					.entry(label.clone())
					.or_insert_with(|| poly.clone());
				(poly, penalty)
			}
			Expr::Constraint { label, expr, condition } => {
				let (poly, penalty) = self.visit(expr);
				self.constraints
					.entry(label.clone())
					.or_insert_with(|| (poly.clone(), condition.clone()));
				(poly, penalty)
			}
			Expr::WithPenalty { label, expr, penalty } => {
				let (e_poly, e_penalty) = self.visit(expr);
				let (p_poly, p_penalty) = self.visit(penalty);
				let mut out_penalty = e_penalty;
				out_penalty += p_penalty;
				if self.seen_penalties.insert(label.clone()) {
					out_penalty += p_poly;
				}
				(e_poly, out_penalty)
			}
			Expr::UserDefined(expr) => self.visit(expr),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::coeff::FeedDict;
	use crate::poly::Indexes;

	fn expand(expr: &Expr) -> (Expanded, VariableTable) {
		let mut variables = VariableTable::new();
		let expanded = Expander::expand(expr, &mut variables);
		(expanded, variables)
	}

	fn coeff_of(poly: &Polynomial, indexes: &[u32]) -> Option<f64> {
		let key = Product::from_indexes(indexes.iter().copied().collect::<Indexes>());
		poly.iter()
			.find(|(product, _)| **product == key)
			.map(|(_, coeff)| coeff.evaluate(&FeedDict::new()).unwrap())
	}

	#[test]
	fn spin_encodes_as_two_binary_minus_one() {
		let (expanded, _) = expand(&Expr::spin("s"));
		assert_eq!(coeff_of(&expanded.hamiltonian, &[0]), Some(2.0));
		assert_eq!(coeff_of(&expanded.hamiltonian, &[]), Some(-1.0));
	}

	#[test]
	fn binary_products_are_idempotent() {
		// (a * b) * (a * b) has the same products as a * b
		let ab = Expr::binary("a") * Expr::binary("b");
		let (squared, _) = expand(&(ab.clone() * ab.clone()));
		let (plain, _) = expand(&ab);
		assert_eq!(squared.hamiltonian.len(), plain.hamiltonian.len());
		assert_eq!(coeff_of(&squared.hamiltonian, &[0, 1]), Some(1.0));
	}

	#[test]
	fn the_offset_term_is_unique() {
		let expr = (Expr::binary("a") + 1.0 + Expr::binary("b") + 2.5) * Expr::number(2.0);
		let (expanded, _) = expand(&expr);
		let offsets = expanded
			.hamiltonian
			.iter()
			.filter(|(product, _)| product.degree() == 0)
			.count();
		assert_eq!(offsets, 1);
		assert_eq!(coeff_of(&expanded.hamiltonian, &[]), Some(7.0));
	}

	#[test]
	fn indices_follow_encounter_order() {
		let expr = Expr::binary("a") * Expr::binary("b") * Expr::binary("c")
			+ Expr::binary("b") * Expr::binary("c") * Expr::binary("d");
		let (_, variables) = expand(&expr);
		assert_eq!(variables.names(), &["a", "b", "c", "d"]);
	}

	#[test]
	fn sub_hamiltonians_keep_a_copy_of_their_polynomial() {
		let expr = Expr::subh(Expr::binary("a") + Expr::binary("b"), "h1") * Expr::binary("c");
		let (expanded, _) = expand(&expr);
		let sub = &expanded.sub_hamiltonians["h1"];
		// the recorded polynomial is the child's expansion, untouched by
		// the enclosing multiplication
		assert_eq!(sub.len(), 2);
		assert_eq!(coeff_of(sub, &[0]), Some(1.0));
		assert_eq!(expanded.hamiltonian.len(), 2);
		assert_eq!(coeff_of(&expanded.hamiltonian, &[0, 2]), Some(1.0));
	}

	#[test]
	fn penalties_add_instead_of_multiplying() {
		let lhs = Expr::with_penalty(Expr::binary("a"), Expr::binary("p"), "pen1");
		let expr = lhs * Expr::binary("b");
		let (expanded, variables) = expand(&expr);
		// main part is a*b, penalty p enters additively
		let p = variables.lookup("p").unwrap();
		assert_eq!(coeff_of(&expanded.hamiltonian, &[0, variables.lookup("b").unwrap()]), Some(1.0));
		assert_eq!(coeff_of(&expanded.hamiltonian, &[p]), Some(1.0));
	}

	#[test]
	fn repeated_penalty_labels_contribute_once() {
		let once = Expr::with_penalty(Expr::binary("a"), Expr::binary("p") * 3.0, "pen1");
		let expr = once.clone() + once;
		let (expanded, variables) = expand(&expr);
		let p = variables.lookup("p").unwrap();
		assert_eq!(coeff_of(&expanded.hamiltonian, &[p]), Some(3.0));
	}

	#[test]
	fn with_penalty_accumulates_nested_penalties() {
		// the penalty expression itself carries a penalty; both are added
		let inner = Expr::with_penalty(Expr::binary("p"), Expr::binary("q"), "inner");
		let expr = Expr::with_penalty(Expr::binary("a"), inner, "outer");
		let (expanded, variables) = expand(&expr);
		let p = variables.lookup("p").unwrap();
		let q = variables.lookup("q").unwrap();
		assert_eq!(coeff_of(&expanded.hamiltonian, &[p]), Some(1.0));
		assert_eq!(coeff_of(&expanded.hamiltonian, &[q]), Some(1.0));
	}

	#[test]
	fn user_defined_is_transparent() {
		let (wrapped, _) = expand(&Expr::user_defined(Expr::binary("a") + 1.0));
		let (plain, _) = expand(&(Expr::binary("a") + 1.0));
		assert_eq!(coeff_of(&wrapped.hamiltonian, &[0]), coeff_of(&plain.hamiltonian, &[0]));
		assert_eq!(coeff_of(&wrapped.hamiltonian, &[]), coeff_of(&plain.hamiltonian, &[]));
	}

	#[test]
	fn pow_multiplies_independent_copies() {
		// (a + b)^2 = a + 2ab + b on binary variables
		let expr = (Expr::binary("a") + Expr::binary("b")) ^ 2;
		let (expanded, _) = expand(&expr);
		assert_eq!(coeff_of(&expanded.hamiltonian, &[0]), Some(1.0));
		assert_eq!(coeff_of(&expanded.hamiltonian, &[1]), Some(1.0));
		assert_eq!(coeff_of(&expanded.hamiltonian, &[0, 1]), Some(2.0));
	}
}
