use indexmap::IndexMap;

/// A scored and decoded sample: the assignment, its total energy, the
/// energy of every sub-Hamiltonian, and the state of every constraint.
#[derive(Clone, Debug)]
pub struct DecodedSolution {
	sample: IndexMap<String, i32>,
	energy: f64,
	sub_hamiltonians: IndexMap<String, f64>,
	constraints: IndexMap<String, (bool, f64)>,
}

impl DecodedSolution {
	pub(crate) fn new(
		sample: IndexMap<String, i32>,
		energy: f64,
		sub_hamiltonians: IndexMap<String, f64>,
		constraints: IndexMap<String, (bool, f64)>,
	) -> Self {
		Self {
			sample,
			energy,
			sub_hamiltonians,
			constraints,
		}
	}

	/// The decoded assignment, keyed by label, values as given.
	pub fn sample(&self) -> &IndexMap<String, i32> {
		&self.sample
	}

	pub fn energy(&self) -> f64 {
		self.energy
	}

	/// Energies of the labeled sub-Hamiltonians, evaluated on their
	/// original polynomials.
	pub fn sub_hamiltonians(&self) -> &IndexMap<String, f64> {
		&self.sub_hamiltonians
	}

	pub fn subh(&self, label: &str) -> Option<f64> {
		self.sub_hamiltonians.get(label).copied()
	}

	/// Constraint states as `(satisfied, energy)` pairs; with
	/// `only_broken` the result is filtered down to violations.
	pub fn constraints(&self, only_broken: bool) -> IndexMap<String, (bool, f64)> {
		self.constraints
			.iter()
			.filter(|(_, (satisfied, _))| !only_broken || !satisfied)
			.map(|(label, state)| (label.clone(), *state))
			.collect()
	}

	/// Whether every constraint is satisfied.
	pub fn is_feasible(&self) -> bool {
		self.constraints.values().all(|(satisfied, _)| *satisfied)
	}
}
