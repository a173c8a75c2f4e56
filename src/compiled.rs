use crate::bqm::{Bqm, VariableKey, Vartype};
use crate::coeff::FeedDict;
use crate::error::EvalError;
use crate::expr::Condition;
use crate::poly::{Polynomial, Product};
use crate::solution::DecodedSolution;
use crate::vars::VariableTable;
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};

/// A sample assignment in one of the three accepted shapes: a map keyed
/// by label, a map keyed by dense index, or a dense sequence.
pub trait Sample {
	/// Checks the sample covers exactly the model's variables.
	fn validate(&self, variables: &VariableTable) -> Result<(), EvalError>;

	/// The raw value assigned to `index`. Only called after `validate`.
	fn value(&self, index: u32, variables: &VariableTable) -> i32;
}

impl Sample for HashMap<String, i32> {
	fn validate(&self, variables: &VariableTable) -> Result<(), EvalError> {
		for name in variables.names() {
			if !self.contains_key(name) {
				return Err(EvalError::MissingVariable(name.clone()));
			}
		}
		Ok(())
	}

	fn value(&self, index: u32, variables: &VariableTable) -> i32 {
		self[variables.name(index)]
	}
}

impl Sample for HashMap<u32, i32> {
	fn validate(&self, variables: &VariableTable) -> Result<(), EvalError> {
		let len = variables.len();
		for &index in self.keys() {
			if index as usize >= len {
				return Err(EvalError::IndexOutOfRange {
					index: index as usize,
					len,
				});
			}
		}
		for index in 0..len as u32 {
			if !self.contains_key(&index) {
				return Err(EvalError::MissingVariable(variables.name(index).to_string()));
			}
		}
		Ok(())
	}

	fn value(&self, index: u32, _variables: &VariableTable) -> i32 {
		self[&index]
	}
}

impl Sample for [i32] {
	fn validate(&self, variables: &VariableTable) -> Result<(), EvalError> {
		let len = variables.len();
		if self.len() > len {
			return Err(EvalError::IndexOutOfRange {
				index: self.len() - 1,
				len,
			});
		}
		if self.len() < len {
			return Err(EvalError::MissingVariable(
				variables.name(self.len() as u32).to_string(),
			));
		}
		Ok(())
	}

	fn value(&self, index: u32, _variables: &VariableTable) -> i32 {
		self[index as usize]
	}
}

impl Sample for Vec<i32> {
	fn validate(&self, variables: &VariableTable) -> Result<(), EvalError> {
		self.as_slice().validate(variables)
	}

	fn value(&self, index: u32, variables: &VariableTable) -> i32 {
		self.as_slice().value(index, variables)
	}
}

/// A polynomial with its coefficients collapsed against one feed dict,
/// ready to be scored against many samples.
struct BoundPoly {
	terms: Vec<(Product, f64)>,
}

impl BoundPoly {
	fn new(polynomial: &Polynomial, feed_dict: &FeedDict) -> Result<Self, EvalError> {
		let terms = polynomial
			.iter()
			.map(|(product, coeff)| Ok((product.clone(), coeff.expand().evaluate(feed_dict)?)))
			.collect::<Result<Vec<_>, EvalError>>()?;
		Ok(Self { terms })
	}

	fn score(&self, binary: &[i32]) -> f64 {
		self.terms
			.iter()
			.map(|(product, coeff)| {
				let vars: f64 = product
					.indexes()
					.iter()
					.map(|&index| binary[index as usize] as f64)
					.product();
				coeff * vars
			})
			.sum()
	}
}

/// Outcome of compiling an expression: the quadratic Hamiltonian, the
/// recorded sub-Hamiltonians and constraints, and the variable table.
///
/// Evaluation is deferred: every method takes a feed dict binding the
/// placeholders that appear in the coefficients.
#[derive(Debug)]
pub struct CompiledModel {
	quadratic: Polynomial,
	sub_hamiltonians: IndexMap<String, Polynomial>,
	constraints: IndexMap<String, (Polynomial, Condition)>,
	variables: VariableTable,
}

impl CompiledModel {
	pub(crate) fn new(
		quadratic: Polynomial,
		sub_hamiltonians: IndexMap<String, Polynomial>,
		constraints: IndexMap<String, (Polynomial, Condition)>,
		variables: VariableTable,
	) -> Self {
		Self {
			quadratic,
			sub_hamiltonians,
			constraints,
			variables,
		}
	}

	/// Variable labels in index order, auxiliary variables included.
	pub fn variables(&self) -> &[String] {
		self.variables.names()
	}

	/// Labels of the placeholders that must be bound for evaluation.
	pub fn placeholders(&self) -> BTreeSet<String> {
		let mut out = BTreeSet::new();
		for (_, coeff) in self.quadratic.iter() {
			coeff.collect_placeholders(&mut out);
		}
		for poly in self.sub_hamiltonians.values() {
			for (_, coeff) in poly.iter() {
				coeff.collect_placeholders(&mut out);
			}
		}
		for (poly, _) in self.constraints.values() {
			for (_, coeff) in poly.iter() {
				coeff.collect_placeholders(&mut out);
			}
		}
		out
	}

	/// Evaluates the quadratic Hamiltonian into a binary-vartype BQM,
	/// keyed by label (`String`) or by dense index (`u32`).
	pub fn to_bqm<K: VariableKey>(&self, feed_dict: &FeedDict) -> Result<Bqm<K>, EvalError> {
		let mut linear = IndexMap::new();
		let mut quadratic = IndexMap::new();
		let mut offset = 0.0;
		for (product, coeff) in self.quadratic.iter() {
			let value = coeff.evaluate(feed_dict)?;
			match product.indexes() {
				&[] => offset = value,
				&[index] => {
					linear.insert(K::from_index(index, &self.variables), value);
				}
				&[first, second] => {
					quadratic.insert(
						(
							K::from_index(first, &self.variables),
							K::from_index(second, &self.variables),
						),
						value,
					);
				}
				_ => {
					return Err(EvalError::Internal(format!(
						"term of degree {} survived order reduction",
						product.degree()
					)));
				}
			}
		}
		Ok(Bqm::new(linear, quadratic, offset, Vartype::Binary))
	}

	/// QUBO coefficients and offset; diagonal entries carry the linear
	/// part.
	pub fn to_qubo<K: VariableKey>(
		&self,
		feed_dict: &FeedDict,
	) -> Result<(IndexMap<(K, K), f64>, f64), EvalError> {
		Ok(self.to_bqm::<K>(feed_dict)?.to_qubo())
	}

	/// Ising `(h, J, offset)` over spin variables.
	pub fn to_ising<K: VariableKey>(
		&self,
		feed_dict: &FeedDict,
	) -> Result<(IndexMap<K, f64>, IndexMap<(K, K), f64>, f64), EvalError> {
		Ok(self.to_bqm::<K>(feed_dict)?.to_ising())
	}

	/// Scores a sample; `vartype` states how the sample's values are
	/// encoded, and spin samples are converted with `b = (s + 1) / 2`.
	pub fn energy<S: Sample + ?Sized>(
		&self,
		sample: &S,
		vartype: Vartype,
		feed_dict: &FeedDict,
	) -> Result<f64, EvalError> {
		sample.validate(&self.variables)?;
		let bqm = self.to_bqm::<String>(feed_dict)?;
		self.energy_with(sample, vartype, &bqm)
	}

	fn energy_with<S: Sample + ?Sized>(
		&self,
		sample: &S,
		vartype: Vartype,
		bqm: &Bqm<String>,
	) -> Result<f64, EvalError> {
		let binary: HashMap<String, i32> = self
			.variables
			.names()
			.iter()
			.enumerate()
			.map(|(index, name)| {
				let value = sample.value(index as u32, &self.variables);
				(name.clone(), to_binary(value, vartype))
			})
			.collect();
		bqm.energy(&binary)
	}

	/// Scores and decodes one sample: total energy, per-sub-Hamiltonian
	/// energies, and per-constraint (satisfied, energy) pairs. The
	/// sub-Hamiltonian and constraint energies are computed from the
	/// original polynomials, which may exceed degree 2.
	pub fn decode_sample<S: Sample + ?Sized>(
		&self,
		sample: &S,
		vartype: Vartype,
		feed_dict: &FeedDict,
	) -> Result<DecodedSolution, EvalError> {
		sample.validate(&self.variables)?;
		let scorer = self.scorer(feed_dict)?;
		self.decode_with(sample, vartype, &scorer)
	}

	/// Decodes a batch of samples against one feed dict, preserving
	/// order. Coefficients are evaluated once and shared across samples.
	pub fn decode_samples<S: Sample>(
		&self,
		samples: &[S],
		vartype: Vartype,
		feed_dict: &FeedDict,
	) -> Result<Vec<DecodedSolution>, EvalError> {
		for sample in samples {
			sample.validate(&self.variables)?;
		}
		let scorer = self.scorer(feed_dict)?;
		samples
			.iter()
			.map(|sample| self.decode_with(sample, vartype, &scorer))
			.collect()
	}

	fn scorer(&self, feed_dict: &FeedDict) -> Result<Scorer, EvalError> {
		Ok(Scorer {
			bqm: self.to_bqm::<String>(feed_dict)?,
			sub_hamiltonians: self
				.sub_hamiltonians
				.iter()
				.map(|(label, poly)| Ok((label.clone(), BoundPoly::new(poly, feed_dict)?)))
				.collect::<Result<Vec<_>, EvalError>>()?,
			constraints: self
				.constraints
				.iter()
				.map(|(label, (poly, condition))| {
					Ok((label.clone(), BoundPoly::new(poly, feed_dict)?, condition.clone()))
				})
				.collect::<Result<Vec<_>, EvalError>>()?,
		})
	}

	fn decode_with<S: Sample + ?Sized>(
		&self,
		sample: &S,
		vartype: Vartype,
		scorer: &Scorer,
	) -> Result<DecodedSolution, EvalError> {
		let energy = self.energy_with(sample, vartype, &scorer.bqm)?;
		let binary: Vec<i32> = (0..self.variables.len() as u32)
			.map(|index| to_binary(sample.value(index, &self.variables), vartype))
			.collect();

		let sub_hamiltonians: IndexMap<String, f64> = scorer
			.sub_hamiltonians
			.iter()
			.map(|(label, poly)| (label.clone(), poly.score(&binary)))
			.collect();
		let constraints: IndexMap<String, (bool, f64)> = scorer
			.constraints
			.iter()
			.map(|(label, poly, condition)| {
				let constraint_energy = poly.score(&binary);
				(
					label.clone(),
					(condition.check(constraint_energy), constraint_energy),
				)
			})
			.collect();
		let named_sample: IndexMap<String, i32> = self
			.variables
			.names()
			.iter()
			.enumerate()
			.map(|(index, name)| {
				(name.clone(), sample.value(index as u32, &self.variables))
			})
			.collect();

		Ok(DecodedSolution::new(
			named_sample,
			energy,
			sub_hamiltonians,
			constraints,
		))
	}
}

struct Scorer {
	bqm: Bqm<String>,
	sub_hamiltonians: Vec<(String, BoundPoly)>,
	constraints: Vec<(String, BoundPoly, Condition)>,
}

fn to_binary(value: i32, vartype: Vartype) -> i32 {
	match vartype {
		Vartype::Binary => value,
		Vartype::Spin => (value + 1) / 2,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::expr::Expr;

	fn feed() -> FeedDict {
		FeedDict::new()
	}

	fn labeled(values: &[(&str, i32)]) -> HashMap<String, i32> {
		values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
	}

	#[test]
	fn to_bqm_dispatches_on_product_degree() {
		// (a + b + 2)^2 = 5a + 5b + 2ab + 4
		let expr = (Expr::binary("a") + Expr::binary("b") + 2.0f64) ^ 2;
		let model = expr.compile(5.0).unwrap();
		let bqm = model.to_bqm::<u32>(&feed()).unwrap();
		assert_eq!(bqm.linear()[&0], 5.0);
		assert_eq!(bqm.linear()[&1], 5.0);
		assert_eq!(bqm.quadratic()[&(0, 1)], 2.0);
		assert_eq!(bqm.offset(), 4.0);
	}

	#[test]
	fn samples_can_be_keyed_by_label_index_or_position() {
		let expr = Expr::binary("a") + Expr::binary("b") * 2.0f64;
		let model = expr.compile(1.0).unwrap();
		let by_label = model
			.energy(&labeled(&[("a", 1), ("b", 1)]), Vartype::Binary, &feed())
			.unwrap();
		let by_index: HashMap<u32, i32> = [(0, 1), (1, 1)].into_iter().collect();
		let dense = vec![1, 1];
		assert_eq!(by_label, 3.0);
		assert_eq!(
			model.energy(&by_index, Vartype::Binary, &feed()).unwrap(),
			3.0
		);
		assert_eq!(model.energy(&dense, Vartype::Binary, &feed()).unwrap(), 3.0);
	}

	#[test]
	fn label_samples_must_cover_every_variable() {
		let expr = Expr::binary("a") + Expr::binary("b");
		let model = expr.compile(1.0).unwrap();
		assert_eq!(
			model.energy(&labeled(&[("a", 1)]), Vartype::Binary, &feed()),
			Err(EvalError::MissingVariable("b".to_string()))
		);
	}

	#[test]
	fn index_samples_must_stay_in_range() {
		let expr = Expr::binary("a");
		let model = expr.compile(1.0).unwrap();
		let sample: HashMap<u32, i32> = [(0, 1), (7, 0)].into_iter().collect();
		assert_eq!(
			model.energy(&sample, Vartype::Binary, &feed()),
			Err(EvalError::IndexOutOfRange { index: 7, len: 1 })
		);
	}

	#[test]
	fn dense_samples_must_match_the_variable_count() {
		let expr = Expr::binary("a") + Expr::binary("b");
		let model = expr.compile(1.0).unwrap();
		assert_eq!(
			model.energy(&vec![1], Vartype::Binary, &feed()),
			Err(EvalError::MissingVariable("b".to_string()))
		);
		assert!(matches!(
			model.energy(&vec![1, 0, 1], Vartype::Binary, &feed()),
			Err(EvalError::IndexOutOfRange { .. })
		));
	}

	#[test]
	fn placeholders_are_reported_and_required() {
		let expr = Expr::placeholder("k") * Expr::binary("a");
		let model = expr.compile(1.0).unwrap();
		assert!(model.placeholders().contains("k"));
		assert_eq!(
			model.to_bqm::<String>(&feed()),
			Err(EvalError::UnknownPlaceholder("k".to_string()))
		);
		let bound: FeedDict = [("k".to_string(), 3.5)].into_iter().collect();
		let (qubo, _) = model.to_qubo::<String>(&bound).unwrap();
		assert_eq!(qubo[&("a".to_string(), "a".to_string())], 3.5);
	}

	#[test]
	fn spin_samples_are_converted_before_scoring() {
		let expr = Expr::spin("s");
		let model = expr.compile(1.0).unwrap();
		// s = -1 maps to b = 0, energy 2b - 1 = -1
		assert_eq!(
			model
				.energy(&labeled(&[("s", -1)]), Vartype::Spin, &feed())
				.unwrap(),
			-1.0
		);
		assert_eq!(
			model
				.energy(&labeled(&[("s", 1)]), Vartype::Spin, &feed())
				.unwrap(),
			1.0
		);
	}
}
