use crate::io::assembly::{AtomRecord, StructureAssembler, cell_vectors};
use crate::io::context::IoContext;
use crate::io::error::Error;
use crate::model::{
    atom::Atom,
    structure::Structure,
    types::{Element, Point},
};
use std::collections::HashMap;
use std::io::BufRead;
use std::str::FromStr;

#[derive(Default)]
struct AtomSiteIndices {
    group_pdb: Option<usize>,
    auth_atom_id: Option<usize>,
    label_atom_id: Option<usize>,
    auth_comp_id: Option<usize>,
    label_comp_id: Option<usize>,
    auth_asym_id: Option<usize>,
    label_asym_id: Option<usize>,
    auth_seq_id: Option<usize>,
    label_seq_id: Option<usize>,
    pdbx_pdb_ins_code: Option<usize>,
    cartn_x: Option<usize>,
    cartn_y: Option<usize>,
    cartn_z: Option<usize>,
    occupancy: Option<usize>,
    b_iso: Option<usize>,
    type_symbol: Option<usize>,
    model_num: Option<usize>,
}

/// Column positions that every `_atom_site` row must provide.
struct RequiredColumns {
    atom_name: usize,
    res_name: usize,
    chain_id: usize,
    seq_id: usize,
    x: usize,
    y: usize,
    z: usize,
}

enum ParserState {
    Base,
    InLoopHeader,
    InAtomSiteLoop(AtomSiteIndices, RequiredColumns),
    InOtherLoop,
}

/// Reads the first model of an mmCIF file.
///
/// Author-assigned identifiers (`auth_*`) are preferred over label identifiers so residue
/// numbers agree with the PDB-format rendition of the same entry. Rows belonging to any model
/// other than the first one encountered are skipped. A row whose coordinates are unknown (`?`
/// or `.`) is a parse error, matching the PDB reader's handling of blank coordinate columns.
pub fn read<R: BufRead>(reader: R, context: &IoContext) -> Result<Structure, Error> {
    let mut structure = Structure::new();
    let mut assembler = StructureAssembler::new();

    let mut state = ParserState::Base;
    let mut current_loop_headers = Vec::new();
    let mut first_model: Option<String> = None;
    let mut skipped_rows = 0usize;
    let mut line_num = 0;

    let mut cell_params = HashMap::new();

    for line in reader.lines() {
        line_num += 1;
        let line = line.map_err(|e| Error::from_io(e, None))?;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let tokens = tokenize_mmcif_line(trimmed);
        if tokens.is_empty() {
            continue;
        }

        if tokens[0] == "loop_" {
            state = ParserState::InLoopHeader;
            current_loop_headers.clear();
            continue;
        }

        if tokens[0].starts_with("_cell.") {
            if tokens.len() >= 2 {
                cell_params.insert(tokens[0].clone(), tokens[1].clone());
            }
            continue;
        }

        let is_data_row = !tokens[0].starts_with('_') && !tokens[0].starts_with("data_");

        match state {
            ParserState::Base => {}
            ParserState::InLoopHeader if !is_data_row => {
                current_loop_headers.push(tokens[0].clone());
            }
            ParserState::InLoopHeader => {
                if current_loop_headers
                    .iter()
                    .any(|h| h.starts_with("_atom_site."))
                {
                    let indices = map_atom_site_indices(&current_loop_headers);
                    let columns = indices.required(line_num)?;
                    if !process_atom_line(
                        &tokens,
                        &indices,
                        &columns,
                        line_num,
                        &mut first_model,
                        &mut assembler,
                    )? {
                        skipped_rows += 1;
                    }
                    state = ParserState::InAtomSiteLoop(indices, columns);
                } else {
                    state = ParserState::InOtherLoop;
                }
            }
            ParserState::InAtomSiteLoop(ref indices, ref columns) if is_data_row => {
                if !process_atom_line(
                    &tokens,
                    indices,
                    columns,
                    line_num,
                    &mut first_model,
                    &mut assembler,
                )? {
                    skipped_rows += 1;
                }
            }
            ParserState::InAtomSiteLoop(..) | ParserState::InOtherLoop => {
                if !is_data_row {
                    state = ParserState::Base;
                }
            }
        }
    }

    if skipped_rows > 0 {
        log::debug!("skipped {skipped_rows} mmCIF atom rows outside the first model");
    }

    if let Some(box_vectors) = process_cell_parameters(&cell_params) {
        structure.box_vectors = Some(box_vectors);
    }

    Ok(assembler.finish(structure, context))
}

fn tokenize_mmcif_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quote = None;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match in_quote {
            Some(q) => {
                let closes = c == q && chars.peek().is_none_or(|next| next.is_whitespace());
                if closes {
                    in_quote = None;
                    tokens.push(std::mem::take(&mut current));
                } else {
                    current.push(c);
                }
            }
            None => {
                if c.is_whitespace() {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                } else if (c == '\'' || c == '"') && current.is_empty() {
                    in_quote = Some(c);
                } else {
                    current.push(c);
                }
            }
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn map_atom_site_indices(headers: &[String]) -> AtomSiteIndices {
    let mut indices = AtomSiteIndices::default();
    for (i, header) in headers.iter().enumerate() {
        match header.as_str() {
            "_atom_site.group_PDB" => indices.group_pdb = Some(i),
            "_atom_site.auth_atom_id" => indices.auth_atom_id = Some(i),
            "_atom_site.label_atom_id" => indices.label_atom_id = Some(i),
            "_atom_site.auth_comp_id" => indices.auth_comp_id = Some(i),
            "_atom_site.label_comp_id" => indices.label_comp_id = Some(i),
            "_atom_site.auth_asym_id" => indices.auth_asym_id = Some(i),
            "_atom_site.label_asym_id" => indices.label_asym_id = Some(i),
            "_atom_site.auth_seq_id" => indices.auth_seq_id = Some(i),
            "_atom_site.label_seq_id" => indices.label_seq_id = Some(i),
            "_atom_site.pdbx_PDB_ins_code" => indices.pdbx_pdb_ins_code = Some(i),
            "_atom_site.Cartn_x" => indices.cartn_x = Some(i),
            "_atom_site.Cartn_y" => indices.cartn_y = Some(i),
            "_atom_site.Cartn_z" => indices.cartn_z = Some(i),
            "_atom_site.occupancy" => indices.occupancy = Some(i),
            "_atom_site.B_iso_or_equiv" => indices.b_iso = Some(i),
            "_atom_site.type_symbol" => indices.type_symbol = Some(i),
            "_atom_site.pdbx_PDB_model_num" => indices.model_num = Some(i),
            _ => {}
        }
    }
    indices
}

impl AtomSiteIndices {
    fn required(&self, line_num: usize) -> Result<RequiredColumns, Error> {
        let missing = |what: &str| {
            Error::parse(
                "mmCIF",
                None,
                line_num,
                format!("_atom_site loop is missing {what} columns"),
            )
        };

        Ok(RequiredColumns {
            atom_name: self
                .auth_atom_id
                .or(self.label_atom_id)
                .ok_or_else(|| missing("atom identifier"))?,
            res_name: self
                .auth_comp_id
                .or(self.label_comp_id)
                .ok_or_else(|| missing("residue identifier"))?,
            chain_id: self
                .auth_asym_id
                .or(self.label_asym_id)
                .ok_or_else(|| missing("chain identifier"))?,
            seq_id: self
                .auth_seq_id
                .or(self.label_seq_id)
                .ok_or_else(|| missing("residue sequence"))?,
            x: self.cartn_x.ok_or_else(|| missing("Cartn_x"))?,
            y: self.cartn_y.ok_or_else(|| missing("Cartn_y"))?,
            z: self.cartn_z.ok_or_else(|| missing("Cartn_z"))?,
        })
    }
}

fn token<'a>(tokens: &'a [String], idx: usize, line_num: usize) -> Result<&'a str, Error> {
    tokens.get(idx).map(|s| s.as_str()).ok_or_else(|| {
        Error::parse(
            "mmCIF",
            None,
            line_num,
            "Atom record is shorter than declared _atom_site headers",
        )
    })
}

fn optional_token<'a>(
    tokens: &'a [String],
    idx: Option<usize>,
    line_num: usize,
) -> Result<Option<&'a str>, Error> {
    match idx {
        Some(idx) => token(tokens, idx, line_num).map(Some),
        None => Ok(None),
    }
}

fn is_null(value: &str) -> bool {
    matches!(value, "." | "?")
}

fn parse_coordinate(value: &str, axis: &str, line_num: usize) -> Result<f64, Error> {
    if is_null(value) {
        return Err(Error::parse(
            "mmCIF",
            None,
            line_num,
            format!("Missing {axis} coordinate"),
        ));
    }
    f64::from_str(value).map_err(|_| {
        Error::parse(
            "mmCIF",
            None,
            line_num,
            format!("Invalid {axis} coordinate"),
        )
    })
}

/// Parses one `_atom_site` row. Returns `false` when the row belongs to a later model.
fn process_atom_line(
    tokens: &[String],
    indices: &AtomSiteIndices,
    columns: &RequiredColumns,
    line_num: usize,
    first_model: &mut Option<String>,
    assembler: &mut StructureAssembler,
) -> Result<bool, Error> {
    if let Some(model) = optional_token(tokens, indices.model_num, line_num)? {
        match first_model.as_deref() {
            Some(first) if first != model => return Ok(false),
            Some(_) => {}
            None => *first_model = Some(model.to_string()),
        }
    }

    let group_pdb = optional_token(tokens, indices.group_pdb, line_num)?;
    let is_hetatm = matches!(group_pdb, Some(val) if val.eq_ignore_ascii_case("HETATM"));

    let atom_name = token(tokens, columns.atom_name, line_num)?;
    let res_name = token(tokens, columns.res_name, line_num)?;
    let chain_id_raw = token(tokens, columns.chain_id, line_num)?;
    let seq_id_str = token(tokens, columns.seq_id, line_num)?;
    let ins_code_str = optional_token(tokens, indices.pdbx_pdb_ins_code, line_num)?;

    let x_str = token(tokens, columns.x, line_num)?;
    let y_str = token(tokens, columns.y, line_num)?;
    let z_str = token(tokens, columns.z, line_num)?;

    let x = parse_coordinate(x_str, "X", line_num)?;
    let y = parse_coordinate(y_str, "Y", line_num)?;
    let z = parse_coordinate(z_str, "Z", line_num)?;

    let res_seq = if is_null(seq_id_str) {
        1
    } else {
        seq_id_str.parse::<i32>().map_err(|_| {
            Error::parse("mmCIF", None, line_num, "Invalid residue sequence number")
        })?
    };

    let i_code = ins_code_str
        .filter(|code| !is_null(code))
        .and_then(|code| code.chars().next());

    let optional_f64 = |value: Option<&str>| {
        value
            .filter(|v| !is_null(v))
            .and_then(|v| f64::from_str(v).ok())
    };
    let occupancy = optional_f64(optional_token(tokens, indices.occupancy, line_num)?).unwrap_or(1.0);
    let b_factor = optional_f64(optional_token(tokens, indices.b_iso, line_num)?).unwrap_or(0.0);

    let element = optional_token(tokens, indices.type_symbol, line_num)?
        .filter(|elem| !is_null(elem))
        .and_then(|elem| Element::from_str(elem).ok())
        .unwrap_or(Element::Unknown);

    let chain_id = if is_null(chain_id_raw) { "?" } else { chain_id_raw };

    assembler.push(AtomRecord {
        chain_id,
        res_seq,
        i_code,
        res_name,
        is_hetatm,
        occupancy,
        atom: Atom::new(atom_name, element, Point::new(x, y, z)).with_b_factor(b_factor),
    });

    Ok(true)
}

fn process_cell_parameters(params: &HashMap<String, String>) -> Option<[[f64; 3]; 3]> {
    let get_f64 = |key: &str, def: f64| -> f64 {
        params
            .get(key)
            .and_then(|s| f64::from_str(s).ok())
            .unwrap_or(def)
    };

    let a = get_f64("_cell.length_a", 0.0);
    let b = get_f64("_cell.length_b", 0.0);
    let c = get_f64("_cell.length_c", 0.0);

    if a <= 0.0 || b <= 0.0 || c <= 0.0 {
        return None;
    }

    Some(cell_vectors(
        a,
        b,
        c,
        get_f64("_cell.angle_alpha", 90.0).to_radians(),
        get_f64("_cell.angle_beta", 90.0).to_radians(),
        get_f64("_cell.angle_gamma", 90.0).to_radians(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{ResidueCategory, StandardResidue};
    use std::io::Cursor;

    fn read_str(content: &str) -> Result<Structure, Error> {
        read(Cursor::new(content), &IoContext::default())
    }

    const TWO_MODELS: &str = r#"data_test
#
_cell.length_a 40.0
_cell.length_b 50.0
_cell.length_c 60.0
_cell.angle_alpha 90.0
_cell.angle_beta 90.0
_cell.angle_gamma 90.0
#
loop_
_atom_site.group_PDB
_atom_site.id
_atom_site.type_symbol
_atom_site.label_atom_id
_atom_site.label_comp_id
_atom_site.label_asym_id
_atom_site.label_seq_id
_atom_site.pdbx_PDB_ins_code
_atom_site.Cartn_x
_atom_site.Cartn_y
_atom_site.Cartn_z
_atom_site.occupancy
_atom_site.B_iso_or_equiv
_atom_site.auth_seq_id
_atom_site.auth_comp_id
_atom_site.auth_asym_id
_atom_site.auth_atom_id
_atom_site.pdbx_PDB_model_num
ATOM   1 N N   ALA A 1 ? 1.000 2.000 3.000 1.00 10.00 11 ALA A N   1
ATOM   2 C CA  ALA A 1 ? 1.500 2.000 3.000 1.00 11.00 11 ALA A CA  1
ATOM   3 C CA  GLY A 2 A 5.000 2.000 3.000 1.00 12.00 12 GLY A CA  1
HETATM 4 ZN ZN ZN B . ? 9.000 9.000 9.000 1.00 30.00 501 ZN B ZN 1
ATOM   5 C CA  ALA A 1 ? 7.000 7.000 7.000 1.00 10.00 11 ALA A CA  2
#
loop_
_struct_conf.id
_struct_conf.pdbx_PDB_helix_id
HELX1 1
"#;

    #[test]
    fn read_prefers_author_numbering_and_parses_b_factors() {
        let structure = read_str(TWO_MODELS).unwrap();

        let ala = structure.find_residue("A", 11, None).unwrap();
        assert_eq!(ala.standard_name, Some(StandardResidue::ALA));
        let ca = ala.atom("CA").unwrap();
        assert_eq!(ca.element, Element::C);
        assert!((ca.pos.x - 1.5).abs() < 1e-10);
        assert!((ca.b_factor - 11.0).abs() < 1e-10);

        assert!(structure.find_residue("A", 12, Some('A')).is_some());
    }

    #[test]
    fn read_ignores_later_models() {
        let structure = read_str(TWO_MODELS).unwrap();

        assert_eq!(structure.atom_count(), 4);
        let ca = structure.find_residue("A", 11, None).unwrap().atom("CA").unwrap();
        assert_eq!(ca.pos.x, 1.5);
    }

    #[test]
    fn read_classifies_single_atom_hetero_groups_as_ions() {
        let structure = read_str(TWO_MODELS).unwrap();

        let zinc = structure.find_residue("B", 501, None).unwrap();
        assert_eq!(zinc.category, ResidueCategory::Ion);
        assert_eq!(zinc.atom("ZN").unwrap().element, Element::Zn);
    }

    #[test]
    fn read_parses_cell_parameters() {
        let structure = read_str(TWO_MODELS).unwrap();
        let vectors = structure.box_vectors.unwrap();

        assert!((vectors[0][0] - 40.0).abs() < 1e-6);
        assert!((vectors[2][2] - 60.0).abs() < 1e-6);
    }

    #[test]
    fn missing_coordinate_column_is_a_parse_error() {
        let content = "\
loop_
_atom_site.label_atom_id
_atom_site.label_comp_id
_atom_site.label_asym_id
_atom_site.label_seq_id
_atom_site.Cartn_x
_atom_site.Cartn_y
CA ALA A 1 1.0 2.0
";
        let result = read_str(content);

        assert!(matches!(result, Err(Error::Parse { line_number: 8, .. })));
    }

    #[test]
    fn short_row_is_a_parse_error() {
        let content = "\
loop_
_atom_site.label_atom_id
_atom_site.label_comp_id
_atom_site.label_asym_id
_atom_site.label_seq_id
_atom_site.Cartn_x
_atom_site.Cartn_y
_atom_site.Cartn_z
CA ALA A 1 1.0 2.0
";

        assert!(matches!(read_str(content), Err(Error::Parse { .. })));
    }

    #[test]
    fn rows_with_unknown_coordinates_are_a_parse_error() {
        let content = "\
loop_
_atom_site.label_atom_id
_atom_site.label_comp_id
_atom_site.label_asym_id
_atom_site.label_seq_id
_atom_site.Cartn_x
_atom_site.Cartn_y
_atom_site.Cartn_z
CA ALA A 1 ? ? ?
CA GLY A 2 1.0 2.0 3.0
";
        let result = read_str(content);

        match result {
            Err(Error::Parse {
                line_number,
                details,
                ..
            }) => {
                assert_eq!(line_number, 9);
                assert!(details.contains("Missing X coordinate"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn later_atom_site_loops_resolve_their_own_columns() {
        let content = "\
loop_
_atom_site.label_atom_id
_atom_site.label_comp_id
_atom_site.label_asym_id
_atom_site.label_seq_id
_atom_site.Cartn_x
_atom_site.Cartn_y
_atom_site.Cartn_z
CA ALA A 1 1.0 2.0 3.0
CA GLY A 2 4.0 5.0 6.0
#
loop_
_atom_site.Cartn_x
_atom_site.label_atom_id
_atom_site.label_comp_id
_atom_site.label_asym_id
_atom_site.label_seq_id
_atom_site.Cartn_y
_atom_site.Cartn_z
7.0 CA SER B 3 8.0 9.0
";
        let structure = read_str(content).unwrap();

        assert_eq!(structure.residue_count(), 3);
        let ser = structure.find_residue("B", 3, None).unwrap();
        assert_eq!(ser.atom("CA").unwrap().pos, Point::new(7.0, 8.0, 9.0));
        let gly = structure.find_residue("A", 2, None).unwrap();
        assert_eq!(gly.atom("CA").unwrap().pos, Point::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn tokenizer_handles_quoted_primes() {
        assert_eq!(
            tokenize_mmcif_line(r#"ATOM "O5'" 'C 1' O3'"#),
            vec!["ATOM", "O5'", "C 1", "O3'"]
        );
    }
}
