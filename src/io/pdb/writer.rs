use crate::io::error::Error;
use crate::model::{atom::Atom, residue::Residue, structure::Structure, types::Element};
use std::io::Write;

/// Writes `structure` as a single-model PDB file.
///
/// Atom B-factors are written verbatim, so annotations placed there (for example alignment
/// categories) survive the round trip into any viewer that can color by B-factor.
///
/// Chain identifiers longer than one character and residue numbers outside `-999..=9999` do not
/// fit the fixed PDB columns. They are shortened to fit and a warning is logged, so the written
/// file may no longer tell those residues apart.
pub fn write_structure<W: Write>(writer: W, structure: &Structure) -> Result<(), Error> {
    let mut ctx = WriterContext::new(writer);

    ctx.write_cryst1(structure.box_vectors)?;

    ctx.write_atoms(structure)?;

    ctx.write_end()?;

    ctx.flush()
}

struct WriterContext<W> {
    writer: W,
    current_serial: usize,
}

impl<W: Write> WriterContext<W> {
    fn new(writer: W) -> Self {
        Self {
            writer,
            current_serial: 1,
        }
    }

    fn write_cryst1(&mut self, box_vectors: Option<[[f64; 3]; 3]>) -> Result<(), Error> {
        if let Some(vectors) = box_vectors {
            let v1 = nalgebra::Vector3::from(vectors[0]);
            let v2 = nalgebra::Vector3::from(vectors[1]);
            let v3 = nalgebra::Vector3::from(vectors[2]);

            let alpha = v2.angle(&v3).to_degrees();
            let beta = v1.angle(&v3).to_degrees();
            let gamma = v1.angle(&v2).to_degrees();

            writeln!(
                self.writer,
                "CRYST1{:9.3}{:9.3}{:9.3}{:7.2}{:7.2}{:7.2} P 1           1",
                v1.norm(),
                v2.norm(),
                v3.norm(),
                alpha,
                beta,
                gamma
            )
            .map_err(|e| Error::from_io(e, None))?;
        }
        Ok(())
    }

    fn write_atoms(&mut self, structure: &Structure) -> Result<(), Error> {
        let mut wrapped_residues = 0usize;

        for chain in structure.iter_chains() {
            let (chain_col, chain_fits) = chain_column(&chain.id);
            if !chain_fits {
                log::warn!(
                    "chain '{}' does not fit the PDB chain column, written as '{}'",
                    chain.id,
                    chain_col
                );
            }

            for residue in chain.iter_residues() {
                if !residue_number_column(residue.id).1 {
                    wrapped_residues += 1;
                }

                let record_type = match residue.standard_name {
                    Some(std) if std.is_polymer() => "ATOM  ",
                    _ => "HETATM",
                };

                for atom in residue.iter_atoms() {
                    let serial = self.current_serial;
                    self.write_atom_record(record_type, serial, atom, residue, &chain.id)?;
                    self.current_serial += 1;
                }
            }

            if let Some(last_polymer) = chain
                .iter_residues()
                .rev()
                .find(|res| res.standard_name.is_some_and(|std| std.is_polymer()))
            {
                let serial = self.current_serial;
                self.write_ter_record(serial, last_polymer, &chain.id)?;
                self.current_serial += 1;
            }
        }

        if wrapped_residues > 0 {
            log::warn!(
                "{wrapped_residues} residue numbers do not fit the PDB sequence column and were wrapped"
            );
        }
        Ok(())
    }

    fn write_atom_record(
        &mut self,
        record_type: &str,
        serial: usize,
        atom: &Atom,
        residue: &Residue,
        chain_id: &str,
    ) -> Result<(), Error> {
        let element_str = match atom.element {
            Element::Unknown => String::new(),
            element => element.symbol().to_uppercase(),
        };

        // Two-letter elements start in column 13 so readers can tell Ca from a C-alpha.
        let atom_name = if atom.name.len() >= 4 || element_str.len() == 2 {
            format!("{:<4}", truncate(&atom.name, 4))
        } else {
            format!(" {:<3}", atom.name)
        };

        writeln!(
            self.writer,
            "{:6}{:5} {:4}{:1}{:>3} {:1}{:4}{:1}   {:8.3}{:8.3}{:8.3}{:6.2}{:6.2}          {:>2}",
            record_type,
            serial % 100000,
            atom_name,
            ' ',
            truncate(&residue.name, 3),
            chain_column(chain_id).0,
            residue_number_column(residue.id).0,
            residue.insertion_code.unwrap_or(' '),
            atom.pos.x,
            atom.pos.y,
            atom.pos.z,
            1.00,
            atom.b_factor,
            element_str
        )
        .map_err(|e| Error::from_io(e, None))
    }

    fn write_ter_record(
        &mut self,
        serial: usize,
        residue: &Residue,
        chain_id: &str,
    ) -> Result<(), Error> {
        writeln!(
            self.writer,
            "TER   {:5}      {:>3} {:1}{:4}{:1}",
            serial % 100000,
            truncate(&residue.name, 3),
            chain_column(chain_id).0,
            residue_number_column(residue.id).0,
            residue.insertion_code.unwrap_or(' ')
        )
        .map_err(|e| Error::from_io(e, None))
    }

    fn write_end(&mut self) -> Result<(), Error> {
        writeln!(self.writer, "END   ").map_err(|e| Error::from_io(e, None))
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.writer.flush().map_err(|e| Error::from_io(e, None))
    }
}

/// Single-character chain column and whether the identifier fit unchanged.
fn chain_column(chain_id: &str) -> (char, bool) {
    let mut chars = chain_id.chars();
    match (chars.next(), chars.next()) {
        (Some(first), None) => (first, true),
        (Some(first), Some(_)) => (first, false),
        (None, _) => (' ', true),
    }
}

/// Four-column residue number and whether it fit unchanged.
fn residue_number_column(number: i32) -> (i32, bool) {
    if (-999..=9999).contains(&number) {
        (number, true)
    } else {
        (number.rem_euclid(10000), false)
    }
}

fn truncate(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::context::IoContext;
    use crate::io::pdb::reader;
    use crate::model::chain::Chain;
    use crate::model::types::{Point, ResidueCategory, StandardResidue};
    use std::io::Cursor;

    fn parse_float(slice: &str) -> f64 {
        slice.trim().parse::<f64>().expect("valid float")
    }

    fn sample_structure() -> Structure {
        let mut structure = Structure::new();
        structure.box_vectors = Some([[10.0, 0.0, 0.0], [0.0, 11.0, 0.0], [0.0, 0.0, 12.0]]);

        let mut chain = Chain::new("A");

        let mut gly = Residue::new(
            1,
            None,
            "GLY",
            Some(StandardResidue::GLY),
            ResidueCategory::Standard,
        );
        gly.add_atom(Atom::new("N", Element::N, Point::new(1.0, 2.0, 3.0)));
        gly.add_atom(Atom::new("CA", Element::C, Point::new(1.5, 2.5, 3.5)).with_b_factor(2.0));

        let mut ion = Residue::new(2, None, "CA", None, ResidueCategory::Ion);
        ion.add_atom(Atom::new("CA", Element::Ca, Point::new(4.0, 5.0, 6.0)));

        chain.add_residue(gly);
        chain.add_residue(ion);
        structure.add_chain(chain);
        structure
    }

    fn render(structure: &Structure) -> String {
        let mut buffer = Vec::new();
        write_structure(&mut buffer, structure).expect("writer should succeed");
        String::from_utf8(buffer).expect("valid UTF-8")
    }

    #[test]
    fn write_structure_emits_cryst1_atoms_ter_and_end() {
        let output = render(&sample_structure());
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 6, "unexpected number of lines: {lines:?}");
        assert!(lines[0].starts_with("CRYST1"));
        assert!((parse_float(&lines[0][6..15]) - 10.0).abs() < 1e-3);
        assert!((parse_float(&lines[0][33..40]) - 90.0).abs() < 1e-2);

        assert_eq!(&lines[1][0..6], "ATOM  ");
        assert_eq!(&lines[1][12..16], " N  ");
        assert_eq!(&lines[2][12..16], " CA ");
        assert_eq!(&lines[2][17..20], "GLY");
        assert_eq!(lines[2].chars().nth(21), Some('A'));
        assert!((parse_float(&lines[2][30..38]) - 1.5).abs() < 1e-3);
        assert!((parse_float(&lines[2][60..66]) - 2.0).abs() < 1e-3);
        assert_eq!(lines[2][76..78].trim(), "C");

        assert_eq!(&lines[3][0..6], "HETATM");
        assert_eq!(&lines[3][12..16], "CA  ");
        assert_eq!(lines[3][76..78].trim(), "CA");

        assert!(lines[4].starts_with("TER   "));
        assert_eq!(lines[4][17..20].trim(), "GLY");
        assert_eq!(lines[5], "END   ");
    }

    #[test]
    fn write_structure_without_box_starts_with_atom_records() {
        let mut structure = sample_structure();
        structure.box_vectors = None;

        let output = render(&structure);

        assert!(output.lines().next().unwrap().starts_with("ATOM"));
    }

    #[test]
    fn water_is_written_as_hetatm_without_ter() {
        let mut structure = Structure::new();
        let mut chain = Chain::new("W");
        let mut water = Residue::new(
            42,
            Some('B'),
            "HOH",
            Some(StandardResidue::HOH),
            ResidueCategory::Standard,
        );
        water.add_atom(Atom::new("O", Element::O, Point::new(0.0, 0.0, 0.0)));
        chain.add_residue(water);
        structure.add_chain(chain);

        let output = render(&structure);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(&lines[0][0..6], "HETATM");
        assert_eq!(lines[0].chars().nth(26), Some('B'));
        assert!(!output.contains("TER"));
    }

    #[test]
    fn oversized_chain_and_residue_ids_are_flagged_and_keep_columns_aligned() {
        assert_eq!(chain_column("A"), ('A', true));
        assert_eq!(chain_column(""), (' ', true));
        assert_eq!(chain_column("AB"), ('A', false));
        assert_eq!(residue_number_column(9999), (9999, true));
        assert_eq!(residue_number_column(-999), (-999, true));
        assert_eq!(residue_number_column(10005), (5, false));
        assert_eq!(residue_number_column(-1500), (8500, false));

        let mut structure = Structure::new();
        let mut chain = Chain::new("AB");
        let mut residue = Residue::new(
            -1500,
            None,
            "ALA",
            Some(StandardResidue::ALA),
            ResidueCategory::Standard,
        );
        residue.add_atom(Atom::new("CA", Element::C, Point::new(1.0, 2.0, 3.0)));
        chain.add_residue(residue);
        structure.add_chain(chain);

        let output = render(&structure);
        let line = output.lines().next().unwrap();

        assert_eq!(line.chars().nth(21), Some('A'));
        assert_eq!(line[22..26].trim(), "8500");
        assert!((parse_float(&line[30..38]) - 1.0).abs() < 1e-3);
        assert_eq!(line.len(), 78);
    }

    #[test]
    fn written_structure_reads_back_with_b_factors_and_elements() {
        let output = render(&sample_structure());

        let structure = reader::read(Cursor::new(output), &IoContext::default()).unwrap();

        let gly = structure.find_residue("A", 1, None).unwrap();
        assert_eq!(gly.atom("CA").unwrap().b_factor, 2.0);
        let ion = structure.find_residue("A", 2, None).unwrap();
        assert_eq!(ion.category, ResidueCategory::Ion);
        assert_eq!(ion.atom("CA").unwrap().element, Element::Ca);
        assert_eq!(structure.box_vectors.map(|v| v[1][1].round()), Some(11.0));
    }
}
