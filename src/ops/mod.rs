//! Residue matching operations and the seams around them.
//!
//! `points` defines the integrity-checked inputs, `matcher` pairs residues by nearest
//! neighbour, `provider` turns structure handles into point sets, `marker` hands the
//! resulting partitions to visualization back-ends, and `compare` chains provider and matcher
//! into a single call. All submodules share one error type.

mod compare;
mod error;
mod marker;
mod matcher;
mod points;
mod provider;

pub use points::{PointSet, ResidueId, ResiduePoint};

pub use matcher::{AlignedPair, MatchResult, match_residues};

pub use provider::{ALPHA_CARBON, StructureHandle, StructureProvider, StructureStore, extract_points};

pub use marker::{MarkCategory, Marker, PymolScriptMarker, mark_partition};

pub use compare::{CompareConfig, DEFAULT_CUTOFF, compare_structures, format_pair};

pub use error::Error;
