//! End-to-end residue comparison between two structures held by a provider.
//!
//! The workflow extracts representative points for both handles, runs the nearest-neighbour
//! matcher, and returns the partition. Marking and reporting stay with the caller so that the
//! same provider can also act as a marker once extraction is done.

use crate::ops::error::Error;
use crate::ops::matcher::{AlignedPair, MatchResult, match_residues};
use crate::ops::provider::{ALPHA_CARBON, StructureHandle, StructureProvider};

/// Distance cutoff used when none is supplied, in ångströms.
pub const DEFAULT_CUTOFF: f64 = 2.0;

/// Parameters controlling a comparison run.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareConfig {
    /// Exclusive distance threshold for accepting a pair.
    pub cutoff: f64,
    /// Name of the atom representing each residue.
    pub atom_name: String,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
            atom_name: ALPHA_CARBON.to_string(),
        }
    }
}

/// Matches the residues of `target` against those of `reference`.
///
/// Coordinates are used as stored; the caller is responsible for any prior superposition.
///
/// # Arguments
///
/// * `provider` - Source of representative coordinates for both handles.
/// * `reference` - Handle of the reference structure.
/// * `target` - Handle of the target structure.
/// * `config` - Cutoff and representative atom.
///
/// # Errors
///
/// Propagates provider resolution failures and point-set integrity errors.
pub fn compare_structures<P: StructureProvider + ?Sized>(
    provider: &P,
    reference: &StructureHandle,
    target: &StructureHandle,
    config: &CompareConfig,
) -> Result<MatchResult, Error> {
    let reference_points = provider.representative_points(reference, &config.atom_name)?;
    let target_points = provider.representative_points(target, &config.atom_name)?;

    log::info!(
        "matching {} residues of {} against {} residues of {} (cutoff {:.2} Å)",
        reference_points.len(),
        reference,
        target_points.len(),
        target,
        config.cutoff
    );

    let result = match_residues(&reference_points, &target_points, config.cutoff);

    log::info!(
        "{} aligned pairs; {} reference and {} target residues unaligned",
        result.pairs.len(),
        result.unaligned_reference.len(),
        result.unaligned_target.len()
    );

    Ok(result)
}

/// Renders the per-pair report line, e.g. `Aligned: Ref ALA1 - Target ALA1 (Distance: 0.50 Å)`.
pub fn format_pair(pair: &AlignedPair) -> String {
    format!(
        "Aligned: Ref {}{} - Target {}{} (Distance: {:.2} Å)",
        pair.reference_name,
        pair.reference.resi(),
        pair.target_name,
        pair.target.resi(),
        pair.distance
    )
}
