//! Mutable incidence graph of a CNF formula, as used by a top-down knowledge compiler.
//!
//! The [`IncidenceGraph`] connects variables with the clauses they occur in. A compiler driver
//! assigns literals, splits the remaining formula into connected components, looks up each
//! component in a [`ComponentCache`](cache::ComponentCache) and undoes the assignments when
//! backtracking. Component graphs can also be checked for being renamable Horn.

#[macro_use]
mod error;

pub mod cache;
pub mod config;
pub mod graph;
pub mod horn;
pub mod stats;

mod backup;
mod context;
mod occurrence;
mod store;

#[cfg(test)]
mod test;

pub use kcgraph_formula::{cnf, lit, CnfFormula, Lit, Var};

pub use error::{BackupChannel, GraphError, Result};
pub use graph::{GraphSnapshot, IncidenceGraph, Node, RedundancyPolicy};
pub use store::{ClauseId, ClauseStore, LitSet};
