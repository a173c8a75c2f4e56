//! Property tests for the compiler's universal invariants: reducer
//! soundness on brute-forced assignments, the spin encoding, placeholder
//! evaluation, and the QUBO/Ising round trip.

use polyqubo::{Expr, FeedDict, Vartype};
use proptest::prelude::*;
use std::collections::HashMap;

const VARS: [&str; 6] = ["a", "b", "c", "d", "e", "f"];

fn feed() -> FeedDict {
	FeedDict::new()
}

/// A random Hamiltonian as a list of (variable subset, coefficient)
/// monomials over the fixed pool.
fn monomials() -> impl Strategy<Value = Vec<(Vec<&'static str>, i32)>> {
	proptest::collection::vec(
		(proptest::sample::subsequence(VARS.to_vec(), 1..=4), -3..=3i32),
		1..=4,
	)
}

fn build(terms: &[(Vec<&'static str>, i32)]) -> Expr {
	let mut hmlt = Expr::number(0.0);
	for (names, coeff) in terms {
		let mut term = Expr::number(*coeff as f64);
		for name in names {
			term = term * Expr::binary(*name);
		}
		hmlt = hmlt + term;
	}
	hmlt
}

fn direct_energy(terms: &[(Vec<&'static str>, i32)], bits: &HashMap<&str, i32>) -> f64 {
	terms
		.iter()
		.map(|(names, coeff)| {
			let product: i32 = names.iter().map(|name| bits[name]).product();
			(coeff * product) as f64
		})
		.sum()
}

/// Assigns every model variable, deriving auxiliary values from their
/// `"x * y"` labels so that each aux equals the product it stands for.
fn full_sample(model: &polyqubo::CompiledModel, bits: &HashMap<&str, i32>) -> HashMap<String, i32> {
	model
		.variables()
		.iter()
		.map(|name| {
			let value: i32 = name.split(" * ").map(|part| bits[part]).product();
			(name.clone(), value)
		})
		.collect()
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(128))]

	/// With every auxiliary variable fixed to the product it replaces,
	/// the reduced quadratic model scores exactly like the original
	/// polynomial on all 2^n assignments.
	#[test]
	fn reducer_is_sound_on_feasible_assignments(terms in monomials()) {
		let model = build(&terms).compile(10.0).unwrap();
		for assignment in 0..(1u32 << VARS.len()) {
			let bits: HashMap<&str, i32> = VARS
				.iter()
				.enumerate()
				.map(|(i, name)| (*name, ((assignment >> i) & 1) as i32))
				.collect();
			let sample = full_sample(&model, &bits);
			let energy = model.energy(&sample, Vartype::Binary, &feed()).unwrap();
			prop_assert_eq!(energy, direct_energy(&terms, &bits));
		}
	}

	/// Compiled models never emit a term above degree two.
	#[test]
	fn compiled_models_are_quadratic(terms in monomials()) {
		let model = build(&terms).compile(10.0).unwrap();
		// to_bqm errors on any surviving higher-degree term
		model.to_bqm::<u32>(&feed()).unwrap();
	}

	/// A spin Hamiltonian scored through the compiler matches the direct
	/// Ising evaluation under s = 2b - 1.
	#[test]
	fn spin_variables_encode_as_two_binary_minus_one(
		coeffs in proptest::collection::vec(-3..=3i32, 3),
		assignment in 0u32..8,
	) {
		let names = ["s", "t", "u"];
		let mut hmlt = Expr::number(0.0);
		for ((first, second), coeff) in
			[("s", "t"), ("t", "u"), ("s", "u")].iter().zip(&coeffs)
		{
			hmlt = hmlt + Expr::spin(*first) * Expr::spin(*second) * (*coeff as f64);
		}
		let model = hmlt.compile(10.0).unwrap();

		let spins: HashMap<&str, i32> = names
			.iter()
			.enumerate()
			.map(|(i, name)| (*name, if (assignment >> i) & 1 == 1 { 1 } else { -1 }))
			.collect();
		let sample: HashMap<String, i32> =
			spins.iter().map(|(k, v)| (k.to_string(), *v)).collect();
		let energy = model.energy(&sample, Vartype::Spin, &feed()).unwrap();

		let direct: f64 = [("s", "t"), ("t", "u"), ("s", "u")]
			.iter()
			.zip(&coeffs)
			.map(|((first, second), coeff)| (coeff * spins[first] * spins[second]) as f64)
			.sum();
		prop_assert_eq!(energy, direct);
	}

	/// Placeholder coefficients pass through evaluation untouched.
	#[test]
	fn placeholders_evaluate_to_their_bindings(k in -64i32..=64, m in -64i32..=64) {
		let hmlt = Expr::placeholder("k") * Expr::binary("a")
			+ Expr::placeholder("m") * Expr::binary("b");
		let model = hmlt.compile(1.0).unwrap();
		let bindings: FeedDict = [
			("k".to_string(), k as f64),
			("m".to_string(), m as f64),
		]
		.into_iter()
		.collect();
		let (qubo, _) = model.to_qubo::<String>(&bindings).unwrap();
		prop_assert_eq!(qubo[&("a".to_string(), "a".to_string())], k as f64);
		prop_assert_eq!(qubo[&("b".to_string(), "b".to_string())], m as f64);
	}

	/// Converting a model to spin and back preserves every assignment's
	/// energy exactly (coefficients stay dyadic).
	#[test]
	fn vartype_conversion_round_trips(terms in monomials()) {
		let model = build(&terms).compile(10.0).unwrap();
		let bqm = model.to_bqm::<u32>(&feed()).unwrap();
		let round_tripped = bqm
			.change_vartype(Vartype::Spin)
			.change_vartype(Vartype::Binary);
		let n = model.variables().len();
		// cap the brute force at the assignments of the first 10 vars
		for assignment in 0..(1u32 << n.min(10)) {
			let sample: HashMap<u32, i32> = (0..n as u32)
				.map(|i| (i, ((assignment >> i) & 1) as i32))
				.collect();
			prop_assert_eq!(
				bqm.energy(&sample).unwrap(),
				round_tripped.energy(&sample).unwrap()
			);
		}
	}
}
