//! Nearest-neighbour residue matching between two superposed point sets.
//!
//! Every reference residue is paired with the closest target residue when that distance falls
//! strictly below the cutoff. Matching is greedy from the reference side: nothing prevents
//! several reference residues from claiming the same target residue, and no one-to-one
//! assignment is attempted. Both structures are then partitioned into aligned and unaligned
//! residue sets.
//!
//! The search is a plain quadratic scan. Operands are bounded by the residue count of a
//! protein chain, so no spatial index is used.

use crate::ops::points::{PointSet, ResidueId, ResiduePoint};
use serde::Serialize;
use std::collections::BTreeSet;

/// Correspondence between one reference residue and its nearest target residue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedPair {
    /// Reference residue identifier.
    pub reference: ResidueId,
    /// Reference residue type label.
    pub reference_name: String,
    /// Target residue identifier.
    pub target: ResidueId,
    /// Target residue type label.
    pub target_name: String,
    /// Euclidean distance between the two representative atoms in ångströms.
    pub distance: f64,
}

/// Aligned pairs together with the aligned/unaligned partition of both structures.
///
/// For each structure the aligned and unaligned sets are disjoint and their union is exactly
/// the set of residue identifiers that were supplied to the matcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchResult {
    /// Accepted pairs in reference iteration order.
    pub pairs: Vec<AlignedPair>,
    pub aligned_reference: BTreeSet<ResidueId>,
    pub unaligned_reference: BTreeSet<ResidueId>,
    pub aligned_target: BTreeSet<ResidueId>,
    pub unaligned_target: BTreeSet<ResidueId>,
}

impl MatchResult {
    /// Mean distance over all aligned pairs, or `None` when no pair was accepted.
    pub fn mean_distance(&self) -> Option<f64> {
        if self.pairs.is_empty() {
            return None;
        }
        let total: f64 = self.pairs.iter().map(|p| p.distance).sum();
        Some(total / self.pairs.len() as f64)
    }
}

/// Matches reference residues to their nearest target residues within `cutoff`.
///
/// The cutoff is not validated: a non-positive or NaN cutoff simply accepts nothing. Empty
/// point sets on either side are valid and yield empty or fully unaligned partitions.
///
/// # Arguments
///
/// * `reference` - Point set of the reference structure.
/// * `target` - Point set of the target structure, in the same frame as `reference`.
/// * `cutoff` - Exclusive distance threshold in ångströms.
///
/// # Returns
///
/// A [`MatchResult`] holding the accepted pairs and the four residue partitions.
pub fn match_residues(reference: &PointSet, target: &PointSet, cutoff: f64) -> MatchResult {
    let mut result = MatchResult::default();

    for ref_point in reference {
        let Some((nearest, distance)) = nearest_point(ref_point, target) else {
            continue;
        };

        if distance < cutoff {
            result.aligned_reference.insert(ref_point.id.clone());
            result.aligned_target.insert(nearest.id.clone());
            result.pairs.push(AlignedPair {
                reference: ref_point.id.clone(),
                reference_name: ref_point.name.clone(),
                target: nearest.id.clone(),
                target_name: nearest.name.clone(),
                distance,
            });
        }
    }

    result.unaligned_reference = unaligned_ids(reference, &result.aligned_reference);
    result.unaligned_target = unaligned_ids(target, &result.aligned_target);

    result
}

/// Finds the target point closest to `query`; ties keep the first one encountered.
fn nearest_point<'a>(
    query: &ResiduePoint,
    candidates: &'a PointSet,
) -> Option<(&'a ResiduePoint, f64)> {
    let mut best: Option<(&ResiduePoint, f64)> = None;

    for candidate in candidates {
        let dist_sq = nalgebra::distance_squared(&query.pos, &candidate.pos);
        match best {
            Some((_, best_sq)) if dist_sq >= best_sq => {}
            _ => best = Some((candidate, dist_sq)),
        }
    }

    best.map(|(point, dist_sq)| (point, dist_sq.sqrt()))
}

fn unaligned_ids(points: &PointSet, aligned: &BTreeSet<ResidueId>) -> BTreeSet<ResidueId> {
    points
        .ids()
        .filter(|id| !aligned.contains(*id))
        .cloned()
        .collect()
}
