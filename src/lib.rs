//! # resmatch
//!
//! **resmatch** pairs the residues of two already-superposed macromolecular structures by the
//! distance between their representative atoms (alpha carbons by default) and partitions both
//! structures into aligned and unaligned residue sets. It answers the question a structural
//! alignment leaves open: after superposition, which residues actually sit on top of each other?
//!
//! ## Features
//!
//! - **Nearest-neighbour matching** – Each reference residue is paired with its closest target
//!   residue when the two lie strictly closer than a cutoff (2.0 Å by default).
//! - **Integrity-checked inputs** – `PointSet` rejects duplicate residue identifiers and
//!   non-finite coordinates instead of silently repairing them.
//! - **Pluggable seams** – `StructureProvider` resolves structure handles into point sets and
//!   `Marker` hands the resulting partitions to a visualization back-end, whether that is a
//!   PyMOL script or B-factor annotations written back into the structure.
//! - **Buffered I/O** – PDB and mmCIF readers with residue alias normalization, and a PDB
//!   writer that preserves B-factor annotations.

mod model;

pub mod io;
pub mod ops;

pub use model::atom::Atom;
pub use model::chain::Chain;
pub use model::residue::Residue;
pub use model::structure::Structure;
pub use model::types::{Element, Point, ResidueCategory, StandardResidue};
