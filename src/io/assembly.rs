use crate::io::context::IoContext;
use crate::model::{
    atom::Atom,
    chain::Chain,
    residue::Residue,
    structure::Structure,
    types::{ResidueCategory, StandardResidue},
};
use std::collections::{BTreeMap, HashMap};
use std::collections::hash_map::Entry;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct ResKey {
    res_seq: i32,
    i_code: Option<char>,
}

struct TempResidue {
    raw_name: String,
    is_hetatm: bool,
    atoms: HashMap<String, (f64, Atom)>,
}

/// One parsed coordinate record, independent of the file format it came from.
pub(crate) struct AtomRecord<'a> {
    pub chain_id: &'a str,
    pub res_seq: i32,
    pub i_code: Option<char>,
    pub res_name: &'a str,
    pub is_hetatm: bool,
    pub occupancy: f64,
    pub atom: Atom,
}

/// Collects atom records into residues and chains while keeping file order for chains.
///
/// When an atom name repeats inside a residue (alternate locations) the record with the
/// highest occupancy is kept; the first one wins on equal occupancy.
#[derive(Default)]
pub(crate) struct StructureAssembler {
    chain_order: Vec<String>,
    chain_map: HashMap<String, BTreeMap<ResKey, TempResidue>>,
}

impl StructureAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: AtomRecord<'_>) {
        let residues = match self.chain_map.entry(record.chain_id.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                self.chain_order.push(record.chain_id.to_string());
                entry.insert(BTreeMap::new())
            }
        };

        let key = ResKey {
            res_seq: record.res_seq,
            i_code: record.i_code,
        };
        let temp_res = residues.entry(key).or_insert_with(|| TempResidue {
            raw_name: record.res_name.to_string(),
            is_hetatm: record.is_hetatm,
            atoms: HashMap::new(),
        });

        match temp_res.atoms.get(record.atom.name.as_str()) {
            Some((old_occ, _)) if record.occupancy <= *old_occ => {}
            _ => {
                temp_res.atoms.insert(
                    record.atom.name.to_string(),
                    (record.occupancy, record.atom),
                );
            }
        }
    }

    pub fn atom_count(&self) -> usize {
        self.chain_map
            .values()
            .flat_map(|residues| residues.values())
            .map(|res| res.atoms.len())
            .sum()
    }

    pub fn finish(mut self, mut structure: Structure, context: &IoContext) -> Structure {
        for chain_id in self.chain_order {
            let Some(residues) = self.chain_map.remove(&chain_id) else {
                continue;
            };
            let mut chain = Chain::new(&chain_id);

            for (key, temp_res) in residues {
                let std_enum = context.classify_residue(&temp_res.raw_name);
                let category =
                    determine_category(temp_res.is_hetatm, std_enum, temp_res.atoms.len());

                let mut residue = Residue::new(
                    key.res_seq,
                    key.i_code,
                    &temp_res.raw_name,
                    std_enum,
                    category,
                );

                let mut sorted_atoms: Vec<Atom> =
                    temp_res.atoms.into_values().map(|v| v.1).collect();
                sorted_atoms.sort_by(|a, b| a.name.cmp(&b.name));

                for atom in sorted_atoms {
                    residue.add_atom(atom);
                }

                chain.add_residue(residue);
            }
            structure.add_chain(chain);
        }

        structure
    }
}

fn determine_category(
    is_hetatm: bool,
    std_enum: Option<StandardResidue>,
    atom_count: usize,
) -> ResidueCategory {
    match std_enum {
        Some(_) => ResidueCategory::Standard,
        None if is_hetatm && atom_count == 1 => ResidueCategory::Ion,
        None => {
            if !is_hetatm {
                log::debug!("treating unrecognized polymer residue as hetero group");
            }
            ResidueCategory::Hetero
        }
    }
}

/// Converts unit cell lengths and angles (radians) into lattice vectors with `a` along x.
pub(crate) fn cell_vectors(
    a: f64,
    b: f64,
    c: f64,
    alpha: f64,
    beta: f64,
    gamma: f64,
) -> [[f64; 3]; 3] {
    let (cos_a, cos_b, cos_g) = (alpha.cos(), beta.cos(), gamma.cos());
    let sin_g = gamma.sin();

    let term = (cos_a - cos_b * cos_g) / sin_g;

    [
        [a, 0.0, 0.0],
        [b * cos_g, b * sin_g, 0.0],
        [
            c * cos_b,
            c * term,
            c * (1.0 - cos_b * cos_b - term * term).sqrt(),
        ],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{Element, Point};

    fn record<'a>(
        chain_id: &'a str,
        res_seq: i32,
        res_name: &'a str,
        is_hetatm: bool,
        atom_name: &str,
        occupancy: f64,
        x: f64,
    ) -> AtomRecord<'a> {
        AtomRecord {
            chain_id,
            res_seq,
            i_code: None,
            res_name,
            is_hetatm,
            occupancy,
            atom: Atom::new(atom_name, Element::C, Point::new(x, 0.0, 0.0)),
        }
    }

    #[test]
    fn assembler_keeps_chain_order_and_sorts_residues() {
        let mut assembler = StructureAssembler::new();
        assembler.push(record("B", 2, "GLY", false, "CA", 1.0, 0.0));
        assembler.push(record("A", 5, "ALA", false, "CA", 1.0, 1.0));
        assembler.push(record("B", 1, "SER", false, "CA", 1.0, 2.0));

        let structure = assembler.finish(Structure::new(), &IoContext::default());
        let chain_ids: Vec<_> = structure.iter_chains().map(|c| c.id.as_str()).collect();
        let b_ids: Vec<_> = structure
            .chain("B")
            .unwrap()
            .iter_residues()
            .map(|r| r.id)
            .collect();

        assert_eq!(chain_ids, vec!["B", "A"]);
        assert_eq!(b_ids, vec![1, 2]);
    }

    #[test]
    fn highest_occupancy_alternate_location_wins() {
        let mut assembler = StructureAssembler::new();
        assembler.push(record("A", 1, "ALA", false, "CA", 0.3, 1.0));
        assembler.push(record("A", 1, "ALA", false, "CA", 0.7, 2.0));
        assembler.push(record("A", 1, "ALA", false, "CA", 0.7, 3.0));

        assert_eq!(assembler.atom_count(), 1);
        let structure = assembler.finish(Structure::new(), &IoContext::default());
        let ca = structure.find_residue("A", 1, None).unwrap().atom("CA").unwrap();

        assert_eq!(ca.pos.x, 2.0);
    }

    #[test]
    fn categories_follow_record_type_and_atom_count() {
        let mut assembler = StructureAssembler::new();
        assembler.push(record("A", 1, "MSE", true, "CA", 1.0, 0.0));
        assembler.push(record("A", 2, "ZN", true, "ZN", 1.0, 0.0));
        assembler.push(record("A", 3, "LIG", true, "C1", 1.0, 0.0));
        assembler.push(record("A", 3, "LIG", true, "C2", 1.0, 0.0));
        assembler.push(record("A", 4, "UNK", false, "CA", 1.0, 0.0));

        let structure = assembler.finish(Structure::new(), &IoContext::default());
        let category = |id| structure.find_residue("A", id, None).unwrap().category;

        assert_eq!(category(1), ResidueCategory::Standard);
        assert_eq!(category(2), ResidueCategory::Ion);
        assert_eq!(category(3), ResidueCategory::Hetero);
        assert_eq!(category(4), ResidueCategory::Hetero);
        assert_eq!(
            structure.find_residue("A", 1, None).unwrap().name,
            "MSE"
        );
    }
}
