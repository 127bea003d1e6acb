//! Fundamental atom representation comprising name, chemical element, Cartesian position,
//! and the per-atom B-factor column.
//!
//! Atoms are instantiated by the IO readers, sampled by point-set extraction, and annotated by
//! markers that encode residue categories into the B-factor before the structure is written
//! back out.

use super::types::{Element, Point};
use smol_str::SmolStr;
use std::fmt;

/// Labeled atom with immutable element identity and mutable position.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Atom name as it appears in crystallographic or modeling files (e.g., `CA`).
    pub name: SmolStr,
    /// Chemical element derived from the file or inferred from the atom name.
    pub element: Element,
    /// Cartesian coordinates measured in ångströms.
    pub pos: Point,
    /// Temperature factor column; markers overwrite it with category codes.
    pub b_factor: f64,
}

impl Atom {
    /// Creates a new atom from a name, element, and position.
    ///
    /// The B-factor starts at zero; readers assign the parsed value afterwards.
    ///
    /// # Arguments
    ///
    /// * `name` - Atom label such as `"CA"` or `"OXT"`.
    /// * `element` - `Element` variant describing the chemical identity.
    /// * `pos` - `Point` describing the Cartesian coordinates in ångströms.
    ///
    /// # Returns
    ///
    /// A fully initialized `Atom` instance.
    pub fn new(name: &str, element: Element, pos: Point) -> Self {
        Self {
            name: SmolStr::new(name),
            element,
            pos,
            b_factor: 0.0,
        }
    }

    /// Builder-style setter for the B-factor column.
    pub fn with_b_factor(mut self, b_factor: f64) -> Self {
        self.b_factor = b_factor;
        self
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Atom {{ name: \"{}\", element: {}, pos: [{:.3}, {:.3}, {:.3}], b: {:.2} }}",
            self.name, self.element, self.pos.x, self.pos.y, self.pos.z, self.b_factor
        )
    }
}
