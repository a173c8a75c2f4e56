use crate::coeff::CoeffExpr;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::hash::{Hash, Hasher};
use std::ops::{AddAssign, Mul};

pub(crate) type Indexes = SmallVec<[u32; 2]>;

const HASH_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

fn hash_indexes(indexes: &[u32]) -> u64 {
	let mut hash = HASH_SEED;
	for &index in indexes {
		hash = (hash.rotate_left(5) ^ u64::from(index)).wrapping_mul(0x0100_0000_01b3);
	}
	hash
}

/// The variable part of a monomial: a sorted, duplicate-free sequence of
/// variable indices. The empty product is the multiplicative identity.
///
/// Variables are binary, so merging two products takes the set union of
/// their indices (`x * x = x`). The hash is precomputed at construction.
#[derive(Clone, Debug)]
pub(crate) struct Product {
	indexes: Indexes,
	hash: u64,
}

impl Product {
	fn from_sorted(indexes: Indexes) -> Self {
		debug_assert!(indexes.windows(2).all(|w| w[0] < w[1]));
		let hash = hash_indexes(&indexes);
		Self { indexes, hash }
	}

	pub(crate) fn unit() -> Self {
		Self::from_sorted(Indexes::new())
	}

	pub(crate) fn var(index: u32) -> Self {
		let mut indexes = Indexes::new();
		indexes.push(index);
		Self::from_sorted(indexes)
	}

	pub(crate) fn pair(first: u32, second: u32) -> Self {
		let mut indexes = Indexes::new();
		if first <= second {
			indexes.push(first);
			indexes.push(second);
		} else {
			indexes.push(second);
			indexes.push(first);
		}
		indexes.dedup();
		Self::from_sorted(indexes)
	}

	pub(crate) fn from_indexes(mut indexes: Indexes) -> Self {
		indexes.sort_unstable();
		indexes.dedup();
		Self::from_sorted(indexes)
	}

	pub(crate) fn indexes(&self) -> &[u32] {
		&self.indexes
	}

	pub(crate) fn degree(&self) -> usize {
		self.indexes.len()
	}

	pub(crate) fn contains(&self, index: u32) -> bool {
		self.indexes.binary_search(&index).is_ok()
	}

	/// Set union with `other`.
	pub(crate) fn merge(&self, other: &Product) -> Product {
		let (lhs, rhs) = (self.indexes(), other.indexes());
		let mut indexes = Indexes::with_capacity(lhs.len() + rhs.len());
		let (mut i, mut j) = (0, 0);
		while i < lhs.len() && j < rhs.len() {
			match lhs[i].cmp(&rhs[j]) {
				Ordering::Less => {
					indexes.push(lhs[i]);
					i += 1;
				}
				Ordering::Greater => {
					indexes.push(rhs[j]);
					j += 1;
				}
				Ordering::Equal => {
					indexes.push(lhs[i]);
					i += 1;
					j += 1;
				}
			}
		}
		indexes.extend_from_slice(&lhs[i..]);
		indexes.extend_from_slice(&rhs[j..]);
		Product::from_sorted(indexes)
	}

	/// Removes `first` and `second` and inserts `aux` in their place.
	pub(crate) fn substitute(&self, first: u32, second: u32, aux: u32) -> Product {
		let mut indexes: Indexes = self
			.indexes
			.iter()
			.copied()
			.filter(|&index| index != first && index != second)
			.collect();
		indexes.push(aux);
		Product::from_indexes(indexes)
	}
}

impl PartialEq for Product {
	fn eq(&self, other: &Self) -> bool {
		self.indexes == other.indexes
	}
}

impl Eq for Product {}

impl Hash for Product {
	fn hash<H: Hasher>(&self, state: &mut H) {
		state.write_u64(self.hash);
	}
}

impl PartialOrd for Product {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Product {
	fn cmp(&self, other: &Self) -> Ordering {
		self.indexes.cmp(&other.indexes)
	}
}

pub(crate) type Terms = FxHashMap<Product, CoeffExpr>;

/// Sparse polynomial over binary variables with symbolic coefficients.
///
/// Most AST nodes expand to a single term, so the single-term case is
/// kept inline and the map is materialized on the first heterogeneous
/// add. No two entries share a product; the empty product carries the
/// offset.
#[derive(Clone, Debug)]
pub(crate) enum Polynomial {
	Zero,
	Mono(Product, CoeffExpr),
	Terms(Terms),
}

impl Default for Polynomial {
	fn default() -> Self {
		Polynomial::Zero
	}
}

impl Polynomial {
	pub(crate) fn new() -> Self {
		Polynomial::Zero
	}

	pub(crate) fn monomial(product: Product, coeff: CoeffExpr) -> Self {
		Polynomial::Mono(product, coeff)
	}

	/// Folds a term in, combining coefficients on an existing product.
	pub(crate) fn insert(&mut self, product: Product, coeff: CoeffExpr) {
		match std::mem::take(self) {
			Polynomial::Zero => *self = Polynomial::Mono(product, coeff),
			Polynomial::Mono(first_product, first_coeff) => {
				let mut terms = Terms::default();
				terms.insert(first_product, first_coeff);
				fold_term(&mut terms, product, coeff);
				*self = Polynomial::Terms(terms);
			}
			Polynomial::Terms(mut terms) => {
				fold_term(&mut terms, product, coeff);
				*self = Polynomial::Terms(terms);
			}
		}
	}

	pub(crate) fn iter(&self) -> Iter<'_> {
		match self {
			Polynomial::Zero => Iter::Empty,
			Polynomial::Mono(product, coeff) => Iter::Once(Some((product, coeff))),
			Polynomial::Terms(terms) => Iter::Map(terms.iter()),
		}
	}

	pub(crate) fn len(&self) -> usize {
		match self {
			Polynomial::Zero => 0,
			Polynomial::Mono(_, _) => 1,
			Polynomial::Terms(terms) => terms.len(),
		}
	}

	pub(crate) fn degree(&self) -> usize {
		self.iter().map(|(product, _)| product.degree()).max().unwrap_or(0)
	}

	pub(crate) fn into_terms(self) -> Terms {
		match self {
			Polynomial::Zero => Terms::default(),
			Polynomial::Mono(product, coeff) => {
				let mut terms = Terms::default();
				terms.insert(product, coeff);
				terms
			}
			Polynomial::Terms(terms) => terms,
		}
	}

	pub(crate) fn from_terms(terms: Terms) -> Self {
		if terms.is_empty() {
			Polynomial::Zero
		} else {
			Polynomial::Terms(terms)
		}
	}
}

pub(crate) fn fold_term(terms: &mut Terms, product: Product, coeff: CoeffExpr) {
	match terms.entry(product) {
		Entry::Occupied(mut occupied) => {
			let merged = occupied.get().clone().add(coeff);
			occupied.insert(merged);
		}
		Entry::Vacant(vacant) => {
			vacant.insert(coeff);
		}
	}
}

impl AddAssign for Polynomial {
	fn add_assign(&mut self, other: Polynomial) {
		match other {
			Polynomial::Zero => {}
			Polynomial::Mono(product, coeff) => self.insert(product, coeff),
			Polynomial::Terms(terms) => {
				for (product, coeff) in terms {
					self.insert(product, coeff);
				}
			}
		}
	}
}

impl Mul for &Polynomial {
	type Output = Polynomial;

	fn mul(self, other: &Polynomial) -> Polynomial {
		let mut result = Polynomial::new();
		for (product_l, coeff_l) in self.iter() {
			for (product_r, coeff_r) in other.iter() {
				result.insert(product_l.merge(product_r), coeff_l.clone().mul(coeff_r.clone()));
			}
		}
		result
	}
}

pub(crate) enum Iter<'a> {
	Empty,
	Once(Option<(&'a Product, &'a CoeffExpr)>),
	Map(std::collections::hash_map::Iter<'a, Product, CoeffExpr>),
}

impl<'a> Iterator for Iter<'a> {
	type Item = (&'a Product, &'a CoeffExpr);

	fn next(&mut self) -> Option<Self::Item> {
		match self {
			Iter::Empty => None,
			Iter::Once(item) => item.take(),
			Iter::Map(iter) => iter.next(),
		}
	}
}
