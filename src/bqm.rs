use crate::error::EvalError;
use crate::vars::VariableTable;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

/// Variable domain of a binary quadratic model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vartype {
	/// Variables take values in {0, 1}.
	Binary,
	/// Variables take values in {-1, +1}.
	Spin,
}

impl FromStr for Vartype {
	type Err = EvalError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"BINARY" => Ok(Vartype::Binary),
			"SPIN" => Ok(Vartype::Spin),
			other => Err(EvalError::InvalidVartype(other.to_string())),
		}
	}
}

/// How a model names its variables in a BQM: by label or by dense index.
pub trait VariableKey: Clone + Eq + Hash + fmt::Display + fmt::Debug {
	fn from_index(index: u32, variables: &VariableTable) -> Self;
}

impl VariableKey for String {
	fn from_index(index: u32, variables: &VariableTable) -> Self {
		variables.name(index).to_string()
	}
}

impl VariableKey for u32 {
	fn from_index(index: u32, _variables: &VariableTable) -> Self {
		index
	}
}

/// Binary quadratic model: linear and quadratic coefficients plus a
/// constant offset, under a fixed vartype.
#[derive(Clone, Debug, PartialEq)]
pub struct Bqm<K: VariableKey> {
	linear: IndexMap<K, f64>,
	quadratic: IndexMap<(K, K), f64>,
	offset: f64,
	vartype: Vartype,
}

impl<K: VariableKey> Bqm<K> {
	pub fn new(
		linear: IndexMap<K, f64>,
		quadratic: IndexMap<(K, K), f64>,
		offset: f64,
		vartype: Vartype,
	) -> Self {
		Self {
			linear,
			quadratic,
			offset,
			vartype,
		}
	}

	pub fn linear(&self) -> &IndexMap<K, f64> {
		&self.linear
	}

	pub fn quadratic(&self) -> &IndexMap<(K, K), f64> {
		&self.quadratic
	}

	pub fn offset(&self) -> f64 {
		self.offset
	}

	pub fn vartype(&self) -> Vartype {
		self.vartype
	}

	/// Every variable mentioned by the model, in first-seen order.
	pub fn variables(&self) -> Vec<K> {
		let mut out: Vec<K> = Vec::new();
		let mut push = |key: &K, out: &mut Vec<K>| {
			if !out.contains(key) {
				out.push(key.clone());
			}
		};
		for key in self.linear.keys() {
			push(key, &mut out);
		}
		for (first, second) in self.quadratic.keys() {
			push(first, &mut out);
			push(second, &mut out);
		}
		out
	}

	/// Scores `sample`, whose values must match the model's vartype.
	pub fn energy(&self, sample: &HashMap<K, i32>) -> Result<f64, EvalError> {
		let value = |key: &K| -> Result<f64, EvalError> {
			sample
				.get(key)
				.map(|&v| v as f64)
				.ok_or_else(|| EvalError::MissingVariable(key.to_string()))
		};
		let mut energy = self.offset;
		for (key, coeff) in &self.linear {
			energy += coeff * value(key)?;
		}
		for ((first, second), coeff) in &self.quadratic {
			energy += coeff * value(first)? * value(second)?;
		}
		Ok(energy)
	}

	/// Multiplies all coefficients and the offset uniformly.
	pub fn scale(&mut self, factor: f64) {
		for coeff in self.linear.values_mut() {
			*coeff *= factor;
		}
		for coeff in self.quadratic.values_mut() {
			*coeff *= factor;
		}
		self.offset *= factor;
	}

	/// Re-expresses the model under `vartype` without changing the
	/// energy of any assignment.
	pub fn change_vartype(&self, vartype: Vartype) -> Bqm<K> {
		match (self.vartype, vartype) {
			(Vartype::Binary, Vartype::Spin) => self.binary_to_spin(),
			(Vartype::Spin, Vartype::Binary) => self.spin_to_binary(),
			_ => self.clone(),
		}
	}

	/// QUBO form: a quadratic map whose diagonal carries the linear
	/// part, plus the offset.
	pub fn to_qubo(&self) -> (IndexMap<(K, K), f64>, f64) {
		let binary = self.change_vartype(Vartype::Binary);
		let mut quadratic = IndexMap::new();
		for (key, coeff) in &binary.linear {
			quadratic.insert((key.clone(), key.clone()), *coeff);
		}
		for (pair, coeff) in &binary.quadratic {
			quadratic.insert(pair.clone(), *coeff);
		}
		(quadratic, binary.offset)
	}

	/// Ising form: `(h, J, offset)` over spin variables.
	pub fn to_ising(&self) -> (IndexMap<K, f64>, IndexMap<(K, K), f64>, f64) {
		let spin = self.change_vartype(Vartype::Spin);
		(spin.linear, spin.quadratic, spin.offset)
	}

	// x = (s + 1) / 2
	fn binary_to_spin(&self) -> Bqm<K> {
		let mut linear: IndexMap<K, f64> = IndexMap::new();
		let mut quadratic: IndexMap<(K, K), f64> = IndexMap::new();
		let mut offset = self.offset;
		for (key, &coeff) in &self.linear {
			*linear.entry(key.clone()).or_insert(0.0) += coeff / 2.0;
			offset += coeff / 2.0;
		}
		for ((first, second), &coeff) in &self.quadratic {
			*quadratic.entry((first.clone(), second.clone())).or_insert(0.0) += coeff / 4.0;
			*linear.entry(first.clone()).or_insert(0.0) += coeff / 4.0;
			*linear.entry(second.clone()).or_insert(0.0) += coeff / 4.0;
			offset += coeff / 4.0;
		}
		Bqm::new(linear, quadratic, offset, Vartype::Spin)
	}

	// s = 2x - 1
	fn spin_to_binary(&self) -> Bqm<K> {
		let mut linear: IndexMap<K, f64> = IndexMap::new();
		let mut quadratic: IndexMap<(K, K), f64> = IndexMap::new();
		let mut offset = self.offset;
		for (key, &coeff) in &self.linear {
			*linear.entry(key.clone()).or_insert(0.0) += 2.0 * coeff;
			offset -= coeff;
		}
		for ((first, second), &coeff) in &self.quadratic {
			*quadratic.entry((first.clone(), second.clone())).or_insert(0.0) += 4.0 * coeff;
			*linear.entry(first.clone()).or_insert(0.0) -= 2.0 * coeff;
			*linear.entry(second.clone()).or_insert(0.0) -= 2.0 * coeff;
			offset += coeff;
		}
		Bqm::new(linear, quadratic, offset, Vartype::Binary)
	}
}
