//! Representation of multi-chain biomolecular assemblies.
//!
//! The `Structure` type aggregates polymer chains in file order and provides the lookup and
//! traversal helpers used by point-set extraction and by the B-factor marker.

use super::atom::Atom;
use super::chain::Chain;
use super::residue::Residue;
use std::fmt;

/// High-level biomolecular assembly composed of zero or more chains.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    /// Internal collection of polymer chains preserving insertion order.
    chains: Vec<Chain>,
    /// Optional periodic box represented as crystallographic basis vectors.
    pub box_vectors: Option<[[f64; 3]; 3]>,
}

impl Structure {
    /// Creates an empty structure with no chains or box vectors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chain to the structure, asserting unique chain IDs in debug builds.
    ///
    /// # Arguments
    ///
    /// * `chain` - Chain instance whose `id` must be unique within the structure.
    pub fn add_chain(&mut self, chain: Chain) {
        debug_assert!(
            self.chain(&chain.id).is_none(),
            "Attempted to add a duplicate chain ID '{}'",
            chain.id
        );
        self.chains.push(chain);
    }

    /// Retrieves an immutable chain by identifier.
    pub fn chain(&self, id: &str) -> Option<&Chain> {
        self.chains.iter().find(|c| c.id == id)
    }

    /// Retrieves a mutable chain by identifier.
    pub fn chain_mut(&mut self, id: &str) -> Option<&mut Chain> {
        self.chains.iter_mut().find(|c| c.id == id)
    }

    /// Finds a residue using chain ID, residue number, and optional insertion code.
    ///
    /// # Arguments
    ///
    /// * `chain_id` - Identifier of the chain to search.
    /// * `residue_id` - Numeric residue index (typically PDB `resSeq`).
    /// * `insertion_code` - Optional insertion code differentiating duplicate IDs.
    ///
    /// # Returns
    ///
    /// `Some(&Residue)` when the residue is located, otherwise `None`.
    pub fn find_residue(
        &self,
        chain_id: &str,
        residue_id: i32,
        insertion_code: Option<char>,
    ) -> Option<&Residue> {
        self.chain(chain_id)
            .and_then(|c| c.residue(residue_id, insertion_code))
    }

    /// Finds a mutable residue reference using chain and residue identifiers.
    pub fn find_residue_mut(
        &mut self,
        chain_id: &str,
        residue_id: i32,
        insertion_code: Option<char>,
    ) -> Option<&mut Residue> {
        self.chain_mut(chain_id)
            .and_then(|c| c.residue_mut(residue_id, insertion_code))
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    pub fn residue_count(&self) -> usize {
        self.chains.iter().map(|c| c.residue_count()).sum()
    }

    pub fn atom_count(&self) -> usize {
        self.chains.iter().map(|c| c.iter_atoms().count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn iter_chains(&self) -> std::slice::Iter<'_, Chain> {
        self.chains.iter()
    }

    pub fn iter_chains_mut(&mut self) -> std::slice::IterMut<'_, Chain> {
        self.chains.iter_mut()
    }

    pub fn iter_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.chains.iter().flat_map(|c| c.iter_atoms())
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Structure {{ chains: {}, residues: {}, atoms: {} }}",
            self.chain_count(),
            self.residue_count(),
            self.atom_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{Element, Point, ResidueCategory, StandardResidue};

    fn chain_with_residues(id: &str, residue_ids: &[i32]) -> Chain {
        let mut chain = Chain::new(id);
        for &res_id in residue_ids {
            let mut residue = Residue::new(
                res_id,
                None,
                "GLY",
                Some(StandardResidue::GLY),
                ResidueCategory::Standard,
            );
            residue.add_atom(Atom::new("N", Element::N, Point::origin()));
            residue.add_atom(Atom::new("CA", Element::C, Point::new(1.0, 0.0, 0.0)));
            chain.add_residue(residue);
        }
        chain
    }

    #[test]
    fn structure_new_creates_empty_structure() {
        let structure = Structure::new();

        assert!(structure.is_empty());
        assert_eq!(structure.chain_count(), 0);
        assert_eq!(structure.residue_count(), 0);
        assert_eq!(structure.atom_count(), 0);
        assert!(structure.box_vectors.is_none());
    }

    #[test]
    fn structure_counts_aggregate_across_chains() {
        let mut structure = Structure::new();
        structure.add_chain(chain_with_residues("A", &[1, 2, 3]));
        structure.add_chain(chain_with_residues("B", &[1]));

        assert_eq!(structure.chain_count(), 2);
        assert_eq!(structure.residue_count(), 4);
        assert_eq!(structure.atom_count(), 8);
    }

    #[test]
    fn structure_find_residue_resolves_by_chain_and_number() {
        let mut structure = Structure::new();
        structure.add_chain(chain_with_residues("A", &[1, 2]));
        structure.add_chain(chain_with_residues("B", &[5]));

        assert!(structure.find_residue("A", 2, None).is_some());
        assert!(structure.find_residue("B", 5, None).is_some());
        assert!(structure.find_residue("B", 2, None).is_none());
        assert!(structure.find_residue("Z", 1, None).is_none());
    }

    #[test]
    fn structure_find_residue_mut_allows_annotation() {
        let mut structure = Structure::new();
        structure.add_chain(chain_with_residues("A", &[1]));

        structure
            .find_residue_mut("A", 1, None)
            .unwrap()
            .set_b_factor(2.0);

        assert!(
            structure
                .iter_atoms()
                .all(|atom| (atom.b_factor - 2.0).abs() < 1e-10)
        );
    }

    #[test]
    fn structure_display_formats_correctly() {
        let mut structure = Structure::new();
        structure.add_chain(chain_with_residues("A", &[1, 2]));

        assert_eq!(
            structure.to_string(),
            "Structure { chains: 1, residues: 2, atoms: 4 }"
        );
    }
}
