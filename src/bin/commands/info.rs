use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use prettytable::{Table, format, row};

use resmatch::ops::{ALPHA_CARBON, StructureHandle, extract_points};
use resmatch::{Chain, ResidueCategory, Structure};

use crate::commands::{
    StructureFormat, load_structure, object_name, print_boxed_label, run_with_spinner,
};

/// Summarizes a structure the way `compare` will see it.
#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Structure to inspect (`-` reads stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
    /// Atom that represents each residue.
    #[arg(long, value_name = "NAME", default_value = ALPHA_CARBON)]
    pub atom: String,
}

pub fn run(args: &InfoArgs, format: Option<StructureFormat>) -> Result<()> {
    let name = object_name(&args.input);
    let reports = run_with_spinner("Analyzing structure", || {
        let structure = load_structure(&args.input, format)?;
        collect_chain_reports(&structure, &name, &args.atom)
    })?;

    print_table(&name, &args.atom, &reports)
}

#[derive(Debug, PartialEq)]
struct ChainReport {
    id: String,
    residues: usize,
    hetero: usize,
    atoms: usize,
    representatives: usize,
}

fn collect_chain_reports(
    structure: &Structure,
    object: &str,
    atom_name: &str,
) -> Result<Vec<ChainReport>> {
    structure
        .iter_chains()
        .map(|chain| {
            let handle = StructureHandle::new(object).with_chain(&chain.id);
            let points = extract_points(structure, &handle, atom_name)
                .with_context(|| format!("Chain {} cannot be matched", chain.id))?;
            Ok(ChainReport {
                id: chain.id.clone(),
                residues: chain.residue_count(),
                hetero: count_non_polymer(chain),
                atoms: chain.iter_atoms().count(),
                representatives: points.len(),
            })
        })
        .collect()
}

fn count_non_polymer(chain: &Chain) -> usize {
    chain
        .iter_residues()
        .filter(|r| r.category != ResidueCategory::Standard || r.is_water())
        .count()
}

fn print_table(object: &str, atom_name: &str, reports: &[ChainReport]) -> Result<()> {
    let mut stderr = io::stderr().lock();

    print_boxed_label(&mut stderr, &format!("Structure {object}"))?;

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.set_titles(row![
        "Chain",
        "Residues",
        "Non-polymer",
        "Atoms",
        format!("{atom_name} Points")
    ]);
    for report in reports {
        table.add_row(row![
            report.id,
            report.residues,
            report.hetero,
            report.atoms,
            report.representatives
        ]);
    }
    table
        .print(&mut stderr)
        .context("Failed to render chain summary")?;
    writeln!(&mut stderr)?;

    Ok(())
}
