use crate::io::assembly::{AtomRecord, StructureAssembler, cell_vectors};
use crate::io::context::IoContext;
use crate::io::error::Error;
use crate::model::{
    atom::Atom,
    structure::Structure,
    types::{Element, Point},
};
use std::io::BufRead;
use std::str::FromStr;

/// Reads the first model of a PDB file.
///
/// Records after the first `ENDMDL` are ignored. Only `CRYST1`, `ATOM` and `HETATM` lines are
/// interpreted; everything else is skipped.
pub fn read<R: BufRead>(reader: R, context: &IoContext) -> Result<Structure, Error> {
    let mut structure = Structure::new();
    let mut assembler = StructureAssembler::new();

    let mut line_num = 0;

    for line in reader.lines() {
        line_num += 1;
        let line = line.map_err(|e| Error::from_io(e, None))?;

        if line.starts_with("ENDMDL") {
            log::debug!("stopping PDB read at end of first model (line {line_num})");
            break;
        }

        if line.starts_with("CRYST1") {
            structure.box_vectors = Some(parse_cryst1(&line, line_num)?);
            continue;
        }

        let is_atom = line.starts_with("ATOM  ");
        let is_hetatm = line.starts_with("HETATM");

        if is_atom || is_hetatm {
            parse_atom_record(&line, line_num, is_hetatm, &mut assembler)?;
        }
    }

    log::debug!("read {} PDB atoms", assembler.atom_count());

    Ok(assembler.finish(structure, context))
}

fn column(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    line.get(start..end).unwrap_or("")
}

fn parse_atom_record(
    line: &str,
    line_num: usize,
    is_hetatm: bool,
    assembler: &mut StructureAssembler,
) -> Result<(), Error> {
    if !line.is_ascii() {
        return Err(Error::parse("PDB", None, line_num, "Atom record is not ASCII"));
    }
    if line.len() < 54 {
        return Err(Error::parse("PDB", None, line_num, "Atom record too short"));
    }

    let raw_atom_name = column(line, 12, 16);
    let atom_name = raw_atom_name.trim();
    let res_name = column(line, 17, 20).trim();
    let chain_id = column(line, 21, 22).trim();
    let i_code = column(line, 26, 27).chars().next().filter(|c| *c != ' ');

    let res_seq = column(line, 22, 26)
        .trim()
        .parse::<i32>()
        .map_err(|_| Error::parse("PDB", None, line_num, "Invalid residue sequence number"))?;

    let x = parse_coordinate(column(line, 30, 38), "X", line_num)?;
    let y = parse_coordinate(column(line, 38, 46), "Y", line_num)?;
    let z = parse_coordinate(column(line, 46, 54), "Z", line_num)?;

    let occupancy = column(line, 54, 60).trim().parse::<f64>().unwrap_or(1.0);
    let b_factor = column(line, 60, 66).trim().parse::<f64>().unwrap_or(0.0);

    let element_str = column(line, 76, 78).trim();
    let element = if element_str.is_empty() {
        element_from_name_field(raw_atom_name)
    } else {
        Element::from_str(element_str).unwrap_or(Element::Unknown)
    };

    assembler.push(AtomRecord {
        chain_id,
        res_seq,
        i_code,
        res_name,
        is_hetatm,
        occupancy,
        atom: Atom::new(atom_name, element, Point::new(x, y, z)).with_b_factor(b_factor),
    });

    Ok(())
}

fn parse_coordinate(value: &str, axis: &str, line_num: usize) -> Result<f64, Error> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::parse("PDB", None, line_num, format!("Invalid {axis} coordinate")))
}

/// Infers the element from the four-character atom name field.
///
/// Single-letter elements are right-justified into the second column (` CA ` is an alpha
/// carbon) while two-letter elements start in the first (`CA  ` is calcium).
fn element_from_name_field(field: &str) -> Element {
    let chars: Vec<char> = field.chars().collect();
    let letter = |i: usize| chars.get(i).copied().filter(|c| c.is_ascii_alphabetic());

    match (chars.first().copied(), letter(1)) {
        (Some(first), Some(second)) if first.is_ascii_alphabetic() => {
            if chars.len() >= 4 && !chars[3].is_whitespace() && first == 'H' {
                return Element::H;
            }
            let pair: String = [first, second].iter().collect();
            match Element::from_str(&pair) {
                Ok(Element::Unknown) | Err(_) => {
                    Element::from_str(&first.to_string()).unwrap_or(Element::Unknown)
                }
                Ok(element) => element,
            }
        }
        (Some(first), _) if first.is_ascii_alphabetic() => {
            Element::from_str(&first.to_string()).unwrap_or(Element::Unknown)
        }
        (_, Some(second)) => Element::from_str(&second.to_string()).unwrap_or(Element::Unknown),
        _ => Element::Unknown,
    }
}

fn parse_cryst1(line: &str, line_num: usize) -> Result<[[f64; 3]; 3], Error> {
    if line.len() < 54 || !line.is_ascii() {
        return Err(Error::parse(
            "PDB",
            None,
            line_num,
            "CRYST1 record too short",
        ));
    }

    let length = |start, end| column(line, start, end).trim().parse::<f64>().unwrap_or(0.0);
    let angle = |start, end| {
        column(line, start, end)
            .trim()
            .parse::<f64>()
            .unwrap_or(90.0)
            .to_radians()
    };

    let (a, b, c) = (length(6, 15), length(15, 24), length(24, 33));
    let (alpha, beta, gamma) = (angle(33, 40), angle(40, 47), angle(47, 54));

    if a <= 0.0 || b <= 0.0 || c <= 0.0 {
        return Err(Error::inconsistent_data(
            "PDB",
            None,
            "Invalid unit cell dimensions",
        ));
    }

    Ok(cell_vectors(a, b, c, alpha, beta, gamma))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{ResidueCategory, StandardResidue};
    use std::io::Cursor;

    fn read_str(content: &str) -> Result<Structure, Error> {
        read(Cursor::new(content), &IoContext::default())
    }

    const SMALL: &str = "\
CRYST1   50.000   60.000   70.000  90.00  90.00  90.00 P 1           1
ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00 12.50           N
ATOM      2  CA  ALA A   1      11.639   6.071  -5.147  1.00 13.25           C
ATOM      3  CA  GLY A   2      14.000   6.000  -5.000  1.00 20.00           C
ATOM      4  CA  SER B  14A      1.000   2.000   3.000  1.00  5.00           C
HETATM    5 CA    CA A 101      20.000  20.000  20.000  1.00 30.00          CA
HETATM    6  O   HOH A 201      30.000  30.000  30.000  1.00 40.00           O
END
";

    #[test]
    fn read_parses_chains_residues_and_atoms() {
        let structure = read_str(SMALL).unwrap();

        assert_eq!(structure.chain_count(), 2);
        assert_eq!(structure.chain("A").unwrap().residue_count(), 4);
        assert_eq!(structure.atom_count(), 6);

        let ala = structure.find_residue("A", 1, None).unwrap();
        assert_eq!(ala.name, "ALA");
        assert_eq!(ala.standard_name, Some(StandardResidue::ALA));
        let ca = ala.atom("CA").unwrap();
        assert_eq!(ca.element, Element::C);
        assert!((ca.pos.x - 11.639).abs() < 1e-10);
        assert!((ca.b_factor - 13.25).abs() < 1e-10);
    }

    #[test]
    fn read_keeps_insertion_codes() {
        let structure = read_str(SMALL).unwrap();

        let ser = structure.find_residue("B", 14, Some('A')).unwrap();
        assert_eq!(ser.name, "SER");
        assert!(structure.find_residue("B", 14, None).is_none());
    }

    #[test]
    fn calcium_ion_is_not_mistaken_for_alpha_carbon() {
        let structure = read_str(SMALL).unwrap();

        let ion = structure.find_residue("A", 101, None).unwrap();
        assert_eq!(ion.category, ResidueCategory::Ion);
        assert_eq!(ion.atom("CA").unwrap().element, Element::Ca);
    }

    #[test]
    fn read_parses_cryst1_box() {
        let structure = read_str(SMALL).unwrap();
        let vectors = structure.box_vectors.unwrap();

        assert!((vectors[0][0] - 50.0).abs() < 1e-6);
        assert!((vectors[1][1] - 60.0).abs() < 1e-6);
        assert!((vectors[2][2] - 70.0).abs() < 1e-6);
    }

    #[test]
    fn read_stops_after_first_model() {
        let content = "\
MODEL        1
ATOM      1  CA  ALA A   1       1.000   1.000   1.000  1.00  0.00           C
ENDMDL
MODEL        2
ATOM      1  CA  ALA A   1       9.000   9.000   9.000  1.00  0.00           C
ATOM      2  CA  GLY A   2       9.000   9.000   9.000  1.00  0.00           C
ENDMDL
";
        let structure = read_str(content).unwrap();

        assert_eq!(structure.residue_count(), 1);
        let ca = structure.find_residue("A", 1, None).unwrap().atom("CA").unwrap();
        assert_eq!(ca.pos.x, 1.0);
    }

    #[test]
    fn read_keeps_highest_occupancy_alternate_location() {
        let content = "\
ATOM      1  CA AALA A   1       1.000   1.000   1.000  0.40  0.00           C
ATOM      2  CA BALA A   1       2.000   2.000   2.000  0.60  0.00           C
";
        let structure = read_str(content).unwrap();
        let residue = structure.find_residue("A", 1, None).unwrap();

        assert_eq!(residue.atom_count(), 1);
        assert_eq!(residue.atom("CA").unwrap().pos.x, 2.0);
    }

    #[test]
    fn unknown_atom_residue_is_read_as_hetero() {
        let content =
            "ATOM      1  CA  XYZ A   1       1.000   1.000   1.000  1.00  0.00           C\n";
        let structure = read_str(content).unwrap();

        let residue = structure.find_residue("A", 1, None).unwrap();
        assert_eq!(residue.category, ResidueCategory::Hetero);
        assert_eq!(residue.standard_name, None);
    }

    #[test]
    fn read_infers_element_when_column_is_missing() {
        let content = "\
ATOM      1  CA  ALA A   1       1.000   1.000   1.000
ATOM      2 HB11 ALA A   1       1.000   1.000   1.000
HETATM    3 FE   HEM A   2       1.000   1.000   1.000
";
        let structure = read_str(content).unwrap();

        let ala = structure.find_residue("A", 1, None).unwrap();
        assert_eq!(ala.atom("CA").unwrap().element, Element::C);
        assert_eq!(ala.atom("HB11").unwrap().element, Element::H);
        assert_eq!(ala.atom("CA").unwrap().b_factor, 0.0);
        let hem = structure.find_residue("A", 2, None).unwrap();
        assert_eq!(hem.atom("FE").unwrap().element, Element::Fe);
    }

    #[test]
    fn short_atom_record_is_a_parse_error() {
        let result = read_str("ATOM      1  CA  ALA A   1       1.000\n");

        assert!(matches!(result, Err(Error::Parse { line_number: 1, .. })));
    }

    #[test]
    fn bad_coordinate_reports_axis_and_line() {
        let content = "\
REMARK ok
ATOM      1  CA  ALA A   1       1.000   abcdefg   1.000  1.00  0.00           C
";
        let err = read_str(content).unwrap_err();

        match err {
            Error::Parse {
                line_number,
                details,
                ..
            } => {
                assert_eq!(line_number, 2);
                assert!(details.contains('Y'));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn zero_length_cell_is_inconsistent() {
        let content = "CRYST1    0.000   60.000   70.000  90.00  90.00  90.00 P 1           1\n";

        assert!(matches!(
            read_str(content),
            Err(Error::InconsistentData { .. })
        ));
    }
}
