use crate::coeff::CoeffExpr;
use crate::error::CompileError;
use crate::poly::{fold_term, Polynomial, Product, Terms};
use crate::vars::VariableTable;
use itertools::Itertools;
use std::collections::BTreeMap;

/// Picks the unordered index pair occurring in the most products of
/// degree > 2. Ties go to the lexicographically smallest pair.
fn find_replacing_pair(terms: &Terms) -> Option<(u32, u32)> {
	let mut counts: BTreeMap<(u32, u32), usize> = BTreeMap::new();
	for product in terms.keys() {
		if product.degree() <= 2 {
			continue;
		}
		for pair in product.indexes().iter().copied().tuple_combinations::<(u32, u32)>() {
			*counts.entry(pair).or_insert(0) += 1;
		}
	}

	let mut best: Option<((u32, u32), usize)> = None;
	for (pair, count) in counts {
		match best {
			Some((_, best_count)) if count <= best_count => {}
			_ => best = Some((pair, count)),
		}
	}
	best.map(|(pair, _)| pair)
}

/// Rewrites `polynomial` into an equivalent polynomial of degree <= 2.
///
/// Every iteration substitutes the most frequent variable pair `(i, j)`
/// inside higher-degree products with a fresh auxiliary variable `a`,
/// then adds the AND penalty `strength * (3a - 2ia - 2ja + ij)`, which is
/// zero exactly when `a = i * j` on binary assignments. Each iteration
/// shrinks the summed excess degree by at least one, so the loop runs at
/// most sum(degree - 2) times.
pub(crate) fn make_quadratic(
	polynomial: Polynomial,
	strength: &CoeffExpr,
	variables: &mut VariableTable,
) -> Result<Polynomial, CompileError> {
	let mut terms = polynomial.into_terms();
	let bound: usize = terms
		.keys()
		.map(|product| product.degree().saturating_sub(2))
		.sum();

	let mut iterations = 0usize;
	while let Some((first, second)) = find_replacing_pair(&terms) {
		iterations += 1;
		if iterations > bound {
			return Err(CompileError::Internal(format!(
				"order reduction failed to converge after {} iterations",
				bound
			)));
		}

		let aux_label = format!("{} * {}", variables.name(first), variables.name(second));
		let aux = variables.index(&aux_label);
		tracing::debug!(
			first = variables.name(first),
			second = variables.name(second),
			aux = %aux_label,
			"substituting variable pair"
		);

		// replace every product containing the pair
		let replaced: Vec<Product> = terms
			.keys()
			.filter(|product| product.contains(first) && product.contains(second))
			.cloned()
			.collect();
		for product in replaced {
			let coeff = terms.remove(&product).unwrap();
			fold_term(&mut terms, product.substitute(first, second, aux), coeff);
		}

		// AND penalty forcing aux = first * second at optimality
		fold_term(
			&mut terms,
			Product::var(aux),
			CoeffExpr::Num(3.0).mul(strength.clone()),
		);
		fold_term(
			&mut terms,
			Product::pair(first, aux),
			CoeffExpr::Num(-2.0).mul(strength.clone()),
		);
		fold_term(
			&mut terms,
			Product::pair(second, aux),
			CoeffExpr::Num(-2.0).mul(strength.clone()),
		);
		fold_term(&mut terms, Product::pair(first, second), strength.clone());
	}

	Ok(Polynomial::from_terms(terms))
}
