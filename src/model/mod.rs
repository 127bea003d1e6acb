//! Core data structures for superposed macromolecular structures.
//!
//! Atoms, residues, chains and structures are kept deliberately small: enough to carry
//! coordinates, B-factors and residue identity from the readers through the matcher and back
//! out through the writers.

pub mod atom;
pub mod chain;
pub mod residue;
pub mod structure;
pub mod types;
