use super::atom::Atom;
use super::types::{ResidueCategory, StandardResidue};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    pub id: i32,
    pub insertion_code: Option<char>,
    pub name: String,
    pub standard_name: Option<StandardResidue>,
    pub category: ResidueCategory,
    atoms: Vec<Atom>,
}

impl Residue {
    pub fn new(
        id: i32,
        insertion_code: Option<char>,
        name: &str,
        standard_name: Option<StandardResidue>,
        category: ResidueCategory,
    ) -> Self {
        Self {
            id,
            insertion_code,
            name: name.to_string(),
            standard_name,
            category,
            atoms: Vec::new(),
        }
    }

    pub fn is_water(&self) -> bool {
        self.standard_name == Some(StandardResidue::HOH)
    }

    pub fn add_atom(&mut self, atom: Atom) {
        debug_assert!(
            self.atom(&atom.name).is_none(),
            "Attempted to add a duplicate atom name '{}' to residue '{}'",
            atom.name,
            self.name
        );
        self.atoms.push(atom);
    }

    pub fn atom(&self, name: &str) -> Option<&Atom> {
        self.atoms.iter().find(|a| a.name == name)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn iter_atoms(&self) -> std::slice::Iter<'_, Atom> {
        self.atoms.iter()
    }

    pub fn iter_atoms_mut(&mut self) -> std::slice::IterMut<'_, Atom> {
        self.atoms.iter_mut()
    }

    /// Overwrites the B-factor of every atom in the residue.
    pub fn set_b_factor(&mut self, b_factor: f64) {
        for atom in self.iter_atoms_mut() {
            atom.b_factor = b_factor;
        }
    }
}

impl fmt::Display for Residue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let icode = self.insertion_code.map(String::from).unwrap_or_default();
        if let Some(std_name) = self.standard_name {
            write!(
                f,
                "Residue {{ id: {}{}, name: \"{}\" ({}), category: {}, atoms: {} }}",
                self.id,
                icode,
                self.name,
                std_name,
                self.category,
                self.atom_count()
            )
        } else {
            write!(
                f,
                "Residue {{ id: {}{}, name: \"{}\", category: {}, atoms: {} }}",
                self.id,
                icode,
                self.name,
                self.category,
                self.atom_count()
            )
        }
    }
}
