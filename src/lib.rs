//! polyqubo compiles polynomial Hamiltonians over binary and spin
//! variables into QUBO models, with deferred placeholders, labeled
//! sub-Hamiltonians, constraints and penalties.
//!
//! Expressions are built with ordinary operators, compiled once, and
//! evaluated any number of times against placeholder bindings. Compiling
//! expands the expression symbolically, reduces it to degree two by
//! introducing auxiliary AND variables, and returns a [`CompiledModel`]
//! that produces QUBO/Ising coefficients and decodes solver samples.
//!
//! # Examples
//!
//! ## Compile and inspect a QUBO
//! ```
//! use polyqubo::{Expr, FeedDict};
//!
//! let hmlt = (Expr::binary("a") + Expr::binary("b") + 2.0f64) ^ 2u32;
//! let model = hmlt.compile(5.0).unwrap();
//! let (qubo, offset) = model.to_qubo::<String>(&FeedDict::new()).unwrap();
//! assert_eq!(offset, 4.0);
//! assert_eq!(qubo[&("a".to_string(), "a".to_string())], 5.0);
//! assert_eq!(qubo[&("a".to_string(), "b".to_string())], 2.0);
//! ```
//!
//! ## Decode a sample against a constraint
//! ```
//! use polyqubo::{Expr, FeedDict, Vartype};
//! use std::collections::HashMap;
//!
//! let one_hot = (Expr::binary("a") + Expr::binary("b") - 1.0f64) ^ 2u32;
//! let hmlt = Expr::constraint(one_hot, "one_hot", |e| e == 0.0);
//! let model = hmlt.compile(5.0).unwrap();
//!
//! let sample: HashMap<String, i32> =
//! 	[("a".to_string(), 1), ("b".to_string(), 0)].into_iter().collect();
//! let solution = model
//! 	.decode_sample(&sample, Vartype::Binary, &FeedDict::new())
//! 	.unwrap();
//! assert_eq!(solution.energy(), 0.0);
//! assert!(solution.constraints(true).is_empty());
//! ```

mod bqm;
mod coeff;
mod compiled;
mod error;
mod expand;
mod expr;
pub mod integer;
pub mod logic;
mod poly;
mod reduce;
mod solution;
mod vars;

pub use bqm::{Bqm, VariableKey, Vartype};
pub use coeff::FeedDict;
pub use compiled::{CompiledModel, Sample};
pub use error::{CompileError, EvalError};
pub use expr::{Condition, Expr};
pub use solution::DecodedSolution;
pub use vars::VariableTable;
