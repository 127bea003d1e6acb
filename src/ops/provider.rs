//! Resolution of structure handles into residue point sets.
//!
//! [`StructureProvider`] is the seam between the matcher and wherever structures live. The
//! crate ships [`StructureStore`], an in-memory provider over parsed [`Structure`]s keyed by
//! object name. Handles use the PyMOL macro notation (`/object//A`) so selections written for
//! a viewer session can be reused verbatim.

use crate::model::residue::Residue;
use crate::model::structure::Structure;
use crate::model::types::ResidueCategory;
use crate::ops::error::Error;
use crate::ops::points::{PointSet, ResidueId, ResiduePoint};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Name of the backbone atom used as the default residue representative.
pub const ALPHA_CARBON: &str = "CA";

/// Reference to a loaded structure object, optionally restricted to a single chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructureHandle {
    /// Object name under which the structure was registered.
    pub object: String,
    /// Chain filter; `None` selects every chain.
    pub chain: Option<String>,
}

impl StructureHandle {
    pub fn new(object: &str) -> Self {
        Self {
            object: object.to_string(),
            chain: None,
        }
    }

    pub fn with_chain(mut self, chain: &str) -> Self {
        self.chain = Some(chain.to_string());
        self
    }

    /// Returns `true` when the handle selects the chain with the given identifier.
    pub fn selects_chain(&self, chain_id: &str) -> bool {
        self.chain.as_deref().is_none_or(|c| c == chain_id)
    }
}

impl fmt::Display for StructureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.chain {
            Some(chain) => write!(f, "/{}//{}", self.object, chain),
            None => write!(f, "/{}", self.object),
        }
    }
}

impl FromStr for StructureHandle {
    type Err = Error;

    /// Parses `object`, `/object`, `object//A`, or `/object/segment/A`.
    ///
    /// The segment component is accepted for compatibility and ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let body = trimmed.strip_prefix('/').unwrap_or(trimmed);
        let parts: Vec<&str> = body.split('/').map(str::trim).collect();

        if parts.len() > 3 {
            return Err(Error::invalid_handle(
                s,
                "expected at most object, segment and chain components",
            ));
        }

        let object = parts[0];
        if object.is_empty() {
            return Err(Error::invalid_handle(s, "object name is empty"));
        }

        let mut handle = StructureHandle::new(object);
        if let Some(chain) = parts.get(2).filter(|c| !c.is_empty()) {
            handle = handle.with_chain(chain);
        }
        Ok(handle)
    }
}

/// Source of per-residue representative coordinates.
pub trait StructureProvider {
    /// Extracts one point per residue carrying an atom named `atom_name`.
    ///
    /// # Errors
    ///
    /// Implementations return [`Error::UnknownStructure`] or [`Error::UnknownChain`] when the
    /// handle cannot be resolved, and propagate point-set integrity errors.
    fn representative_points(
        &self,
        handle: &StructureHandle,
        atom_name: &str,
    ) -> Result<PointSet, Error>;

    /// Extracts the alpha-carbon point set of the structure selected by `handle`.
    fn alpha_carbons(&self, handle: &StructureHandle) -> Result<PointSet, Error> {
        self.representative_points(handle, ALPHA_CARBON)
    }
}

/// In-memory collection of named structures.
#[derive(Debug, Clone, Default)]
pub struct StructureStore {
    structures: HashMap<String, Structure>,
}

impl StructureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a structure under `name`, returning any structure it replaces.
    pub fn insert(&mut self, name: &str, structure: Structure) -> Option<Structure> {
        self.structures.insert(name.to_string(), structure)
    }

    pub fn get(&self, name: &str) -> Option<&Structure> {
        self.structures.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Structure> {
        self.structures.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.structures.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    /// Resolves `handle` to its structure, checking the chain filter.
    pub(crate) fn resolve(&self, handle: &StructureHandle) -> Result<&Structure, Error> {
        let structure = self
            .get(&handle.object)
            .ok_or_else(|| Error::unknown_structure(&handle.object))?;

        if let Some(chain) = &handle.chain {
            if structure.chain(chain).is_none() {
                return Err(Error::unknown_chain(&handle.object, chain));
            }
        }

        Ok(structure)
    }
}

impl StructureProvider for StructureStore {
    fn representative_points(
        &self,
        handle: &StructureHandle,
        atom_name: &str,
    ) -> Result<PointSet, Error> {
        let structure = self.resolve(handle)?;
        extract_points(structure, handle, atom_name)
    }
}

/// Walks `structure` in file order and collects one point per eligible residue.
///
/// Ions and waters never contribute, which keeps calcium ions named `CA` out of alpha-carbon
/// sets. Residues lacking `atom_name` are skipped.
pub fn extract_points(
    structure: &Structure,
    handle: &StructureHandle,
    atom_name: &str,
) -> Result<PointSet, Error> {
    let mut points = PointSet::new();
    let mut skipped = 0usize;

    for chain in structure
        .iter_chains()
        .filter(|c| handle.selects_chain(&c.id))
    {
        for residue in chain.iter_residues().filter(|r| is_eligible(r)) {
            match residue.atom(atom_name) {
                Some(atom) => {
                    let id = ResidueId::new(&chain.id, residue.id, residue.insertion_code);
                    points.push(ResiduePoint::new(id, &residue.name, atom.pos))?;
                }
                None => {
                    skipped += 1;
                    log::debug!(
                        "{}: residue {} {}/{}{} has no '{}' atom, skipping",
                        handle,
                        residue.name,
                        chain.id,
                        residue.id,
                        residue.insertion_code.map(String::from).unwrap_or_default(),
                        atom_name
                    );
                }
            }
        }
    }

    if points.is_empty() {
        log::warn!("{}: no residues carry a '{}' atom", handle, atom_name);
    } else {
        log::debug!(
            "{}: extracted {} '{}' points ({} residues skipped)",
            handle,
            points.len(),
            atom_name,
            skipped
        );
    }

    Ok(points)
}

fn is_eligible(residue: &Residue) -> bool {
    residue.category != ResidueCategory::Ion && !residue.is_water()
}
