//! Delivery of residue partitions to visualization back-ends.
//!
//! A [`Marker`] receives one residue set per [`MarkCategory`]. Two back-ends exist:
//! [`PymolScriptMarker`] renders PyMOL `select`/`color` commands, and [`StructureStore`]
//! stamps a category code into the B-factor column of the marked residues so any viewer can
//! colour by B-factor after the structure is written out.

use crate::ops::error::Error;
use crate::ops::matcher::MatchResult;
use crate::ops::points::ResidueId;
use crate::ops::provider::{StructureHandle, StructureStore};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Write;

/// Visual category assigned to a residue set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkCategory {
    AlignedReference,
    AlignedTarget,
    UnalignedReference,
    UnalignedTarget,
}

impl MarkCategory {
    /// Selection name used when the category is rendered as a named selection.
    pub fn selection_name(&self) -> &'static str {
        match self {
            MarkCategory::AlignedReference => "aligned_ref",
            MarkCategory::AlignedTarget => "aligned_tgt",
            MarkCategory::UnalignedReference => "unaligned_ref",
            MarkCategory::UnalignedTarget => "unaligned_tgt",
        }
    }

    /// PyMOL colour name. Both aligned categories share the "matched" colour.
    pub fn color(&self) -> &'static str {
        match self {
            MarkCategory::AlignedReference | MarkCategory::AlignedTarget => "grey80",
            MarkCategory::UnalignedReference => "red",
            MarkCategory::UnalignedTarget => "blue",
        }
    }

    /// B-factor code written by the structure marker.
    pub fn b_factor(&self) -> f64 {
        match self {
            MarkCategory::AlignedReference | MarkCategory::AlignedTarget => 0.0,
            MarkCategory::UnalignedReference => 1.0,
            MarkCategory::UnalignedTarget => 2.0,
        }
    }
}

impl fmt::Display for MarkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.selection_name())
    }
}

/// Receiver of categorized residue sets.
pub trait Marker {
    /// Marks `residues` of the structure behind `handle` with `category`.
    ///
    /// # Errors
    ///
    /// Output failures and unknown structures are returned as errors. Residues that cannot be
    /// located inside a known structure are reported with `log::warn!` and skipped, so the
    /// remaining residues of the set are still marked.
    fn mark_residues(
        &mut self,
        handle: &StructureHandle,
        residues: &BTreeSet<ResidueId>,
        category: MarkCategory,
    ) -> Result<(), Error>;
}

/// Hands every non-empty partition of `result` to `marker`.
///
/// Calls are issued in the order unaligned-reference, unaligned-target, aligned-reference,
/// aligned-target. Empty partitions are skipped.
pub fn mark_partition<M: Marker + ?Sized>(
    marker: &mut M,
    reference: &StructureHandle,
    target: &StructureHandle,
    result: &MatchResult,
) -> Result<(), Error> {
    let partitions = [
        (reference, &result.unaligned_reference, MarkCategory::UnalignedReference),
        (target, &result.unaligned_target, MarkCategory::UnalignedTarget),
        (reference, &result.aligned_reference, MarkCategory::AlignedReference),
        (target, &result.aligned_target, MarkCategory::AlignedTarget),
    ];

    for (handle, residues, category) in partitions {
        if residues.is_empty() {
            continue;
        }
        log::debug!("marking {} residues of {} as {}", residues.len(), handle, category);
        marker.mark_residues(handle, residues, category)?;
    }

    Ok(())
}

/// Writes PyMOL commands that select and colour each marked residue set.
pub struct PymolScriptMarker<W: Write> {
    writer: W,
}

impl<W: Write> PymolScriptMarker<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(mut self) -> Result<W, Error> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> Marker for PymolScriptMarker<W> {
    fn mark_residues(
        &mut self,
        handle: &StructureHandle,
        residues: &BTreeSet<ResidueId>,
        category: MarkCategory,
    ) -> Result<(), Error> {
        if residues.is_empty() {
            return Ok(());
        }

        let name = category.selection_name();
        writeln!(
            self.writer,
            "select {}, {}",
            name,
            selection_expression(handle, residues)
        )?;
        writeln!(self.writer, "color {}, {}", category.color(), name)?;
        Ok(())
    }
}

/// Builds `/obj//A/1+2+5` style selectors, one per chain, joined with `or`.
fn selection_expression(handle: &StructureHandle, residues: &BTreeSet<ResidueId>) -> String {
    let mut by_chain: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for id in residues {
        by_chain
            .entry(id.chain.as_str())
            .or_default()
            .push(selector_resi(id));
    }

    let selectors: Vec<String> = by_chain
        .into_iter()
        .map(|(chain, resis)| {
            let chain = if chain.is_empty() {
                handle.chain.as_deref().unwrap_or("")
            } else {
                chain
            };
            format!("/{}//{}/{}", handle.object, chain, resis.join("+"))
        })
        .collect();

    match selectors.as_slice() {
        [single] => single.clone(),
        _ => format!("({})", selectors.join(" or ")),
    }
}

/// PyMOL reads a bare `-` inside `resi` as a range operator, so negative numbers are escaped.
fn selector_resi(id: &ResidueId) -> String {
    let resi = id.resi();
    match resi.strip_prefix('-') {
        Some(rest) => format!("\\-{}", rest),
        None => resi,
    }
}

impl Marker for StructureStore {
    fn mark_residues(
        &mut self,
        handle: &StructureHandle,
        residues: &BTreeSet<ResidueId>,
        category: MarkCategory,
    ) -> Result<(), Error> {
        let structure = self
            .get_mut(&handle.object)
            .ok_or_else(|| Error::unknown_structure(&handle.object))?;

        let b_factor = category.b_factor();
        for id in residues {
            match structure.find_residue_mut(&id.chain, id.number, id.insertion_code) {
                Some(residue) => residue.set_b_factor(b_factor),
                None => log::warn!("{}: residue {} not found, cannot mark", handle, id),
            }
        }
        Ok(())
    }
}
