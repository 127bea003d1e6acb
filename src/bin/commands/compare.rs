use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use prettytable::{Table, format, row};
use serde::Serialize;

use resmatch::Structure;
use resmatch::io::write_pdb_structure;
use resmatch::ops::{
    ALPHA_CARBON, CompareConfig, DEFAULT_CUTOFF, MatchResult, PymolScriptMarker, StructureHandle,
    StructureStore, compare_structures, format_pair, mark_partition,
};

use crate::commands::{
    StructureFormat, create_output, is_stdin, load_structure, object_name, print_boxed_label,
    run_with_spinner,
};

/// Pairs residues of two superposed structures and reports the aligned/unaligned partition.
#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Reference structure (`-` reads stdin).
    #[arg(value_name = "REFERENCE")]
    pub reference: PathBuf,
    /// Target structure (`-` reads stdin).
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,
    /// Restrict the reference to a single chain.
    #[arg(long, value_name = "CHAIN")]
    pub ref_chain: Option<String>,
    /// Restrict the target to a single chain.
    #[arg(long, value_name = "CHAIN")]
    pub tgt_chain: Option<String>,
    /// Exclusive distance cutoff in ångströms.
    #[arg(short, long, default_value_t = DEFAULT_CUTOFF)]
    pub cutoff: f64,
    /// Atom that represents each residue.
    #[arg(long, value_name = "NAME", default_value = ALPHA_CARBON)]
    pub atom: String,
    /// Object name for the reference (defaults to the file stem).
    #[arg(long, value_name = "NAME")]
    pub ref_name: Option<String>,
    /// Object name for the target (defaults to the file stem).
    #[arg(long, value_name = "NAME")]
    pub tgt_name: Option<String>,
    /// Write a PyMOL script selecting and colouring the partitions.
    #[arg(long, value_name = "FILE")]
    pub pml: Option<PathBuf>,
    /// Write the reference as PDB with partition codes in the B-factor column.
    #[arg(long, value_name = "FILE")]
    pub annotate_ref: Option<PathBuf>,
    /// Write the target as PDB with partition codes in the B-factor column.
    #[arg(long, value_name = "FILE")]
    pub annotate_tgt: Option<PathBuf>,
    /// Write the full result as JSON.
    #[arg(long, value_name = "FILE")]
    pub json: Option<PathBuf>,
    /// Also print unaligned residues on stdout.
    #[arg(long)]
    pub list_unaligned: bool,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    reference: String,
    target: String,
    cutoff: f64,
    atom: &'a str,
    mean_distance: Option<f64>,
    #[serde(flatten)]
    result: &'a MatchResult,
}

pub fn run(args: &CompareArgs, format: Option<StructureFormat>) -> Result<()> {
    if is_stdin(&args.reference) && is_stdin(&args.target) {
        bail!("Only one of REFERENCE and TARGET can be read from stdin.");
    }

    let reference = handle_for(&args.reference, args.ref_name.as_deref(), args.ref_chain.as_deref());
    let target = handle_for(&args.target, args.tgt_name.as_deref(), args.tgt_chain.as_deref());
    if reference.object == target.object {
        bail!(
            "Both structures resolve to the object name '{}'. Use --ref-name or --tgt-name to tell them apart.",
            reference.object
        );
    }

    if !(args.cutoff.is_finite() && args.cutoff > 0.0) {
        log::warn!("cutoff {} admits no pairs", args.cutoff);
    }

    let mut store = run_with_spinner("Loading structures", || {
        let mut store = StructureStore::new();
        store.insert(&reference.object, load_structure(&args.reference, format)?);
        store.insert(&target.object, load_structure(&args.target, format)?);
        Ok(store)
    })?;

    let config = CompareConfig {
        cutoff: args.cutoff,
        atom_name: args.atom.clone(),
    };
    let result = run_with_spinner("Matching residues", || {
        compare_structures(&store, &reference, &target, &config).context("Residue matching failed")
    })?;

    print_pairs(&result, args.list_unaligned)?;
    print_summary(&reference, &target, &config, &result)?;

    if let Some(path) = &args.pml {
        write_pymol_script(path, &reference, &target, &result)?;
    }

    if args.annotate_ref.is_some() || args.annotate_tgt.is_some() {
        for handle in [&reference, &target] {
            if let Some(structure) = store.get_mut(&handle.object) {
                clear_b_factors(structure);
            }
        }
        mark_partition(&mut store, &reference, &target, &result)
            .context("Failed to annotate structures")?;
        if let Some(path) = &args.annotate_ref {
            write_annotated(&store, &reference, path)?;
        }
        if let Some(path) = &args.annotate_tgt {
            write_annotated(&store, &target, path)?;
        }
    }

    if let Some(path) = &args.json {
        let report = JsonReport {
            reference: reference.to_string(),
            target: target.to_string(),
            cutoff: config.cutoff,
            atom: &config.atom_name,
            mean_distance: result.mean_distance(),
            result: &result,
        };
        let mut writer = create_output(path)?;
        serde_json::to_writer_pretty(&mut writer, &report)
            .with_context(|| format!("Failed to write JSON report to {}", path.display()))?;
        writeln!(writer)?;
        writer.flush().context("Failed to flush JSON report")?;
    }

    Ok(())
}

/// B-factor left on residues that took no part in matching (ions, waters, chains filtered out).
const UNMARKED_B_FACTOR: f64 = -1.0;

fn clear_b_factors(structure: &mut Structure) {
    for chain in structure.iter_chains_mut() {
        for residue in chain.iter_residues_mut() {
            residue.set_b_factor(UNMARKED_B_FACTOR);
        }
    }
}

fn handle_for(path: &Path, name: Option<&str>, chain: Option<&str>) -> StructureHandle {
    let object = name.map(str::to_string).unwrap_or_else(|| object_name(path));
    let handle = StructureHandle::new(&object);
    match chain {
        Some(chain) => handle.with_chain(chain),
        None => handle,
    }
}

fn print_pairs(result: &MatchResult, list_unaligned: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    write_pair_lines(&mut out, result, list_unaligned)?;
    out.flush().context("Failed to flush stdout")
}

fn write_pair_lines<W: Write>(out: &mut W, result: &MatchResult, list_unaligned: bool) -> io::Result<()> {
    for pair in &result.pairs {
        writeln!(out, "{}", format_pair(pair))?;
    }

    if list_unaligned {
        for id in &result.unaligned_reference {
            writeln!(out, "Unaligned: Ref {}", id)?;
        }
        for id in &result.unaligned_target {
            writeln!(out, "Unaligned: Target {}", id)?;
        }
    }
    Ok(())
}

fn summary_table(
    reference: &StructureHandle,
    target: &StructureHandle,
    config: &CompareConfig,
    result: &MatchResult,
) -> Table {
    let reference_total = result.aligned_reference.len() + result.unaligned_reference.len();
    let target_total = result.aligned_target.len() + result.unaligned_target.len();

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.set_titles(row!["Metric", "Value"]);
    table.add_row(row!["Reference", format!("{reference} ({reference_total} residues)")]);
    table.add_row(row!["Target", format!("{target} ({target_total} residues)")]);
    table.add_row(row!["Representative Atom", config.atom_name]);
    table.add_row(row!["Cutoff (Å)", format!("{:.2}", config.cutoff)]);
    table.add_row(row!["Aligned Pairs", result.pairs.len()]);
    table.add_row(row![
        "Aligned Ref / Target",
        format!(
            "{} / {}",
            result.aligned_reference.len(),
            result.aligned_target.len()
        )
    ]);
    table.add_row(row![
        "Unaligned Ref / Target",
        format!(
            "{} / {}",
            result.unaligned_reference.len(),
            result.unaligned_target.len()
        )
    ]);
    table.add_row(row![
        "Mean Distance (Å)",
        result
            .mean_distance()
            .map(|d| format!("{d:.2}"))
            .unwrap_or_else(|| "n/a".to_string())
    ]);
    table
}

fn print_summary(
    reference: &StructureHandle,
    target: &StructureHandle,
    config: &CompareConfig,
    result: &MatchResult,
) -> Result<()> {
    let mut stderr = io::stderr().lock();

    writeln!(&mut stderr)?;
    print_boxed_label(&mut stderr, "Residue Match Summary")?;
    summary_table(reference, target, config, result)
        .print(&mut stderr)
        .context("Failed to render match summary")?;

    Ok(())
}

fn write_pymol_script(
    path: &Path,
    reference: &StructureHandle,
    target: &StructureHandle,
    result: &MatchResult,
) -> Result<()> {
    let mut marker = PymolScriptMarker::new(create_output(path)?);
    mark_partition(&mut marker, reference, target, result)
        .with_context(|| format!("Failed to write PyMOL script to {}", path.display()))?;
    marker
        .into_inner()
        .with_context(|| format!("Failed to flush PyMOL script {}", path.display()))?;
    log::info!("wrote PyMOL script to {}", path.display());
    Ok(())
}

fn write_annotated(store: &StructureStore, handle: &StructureHandle, path: &Path) -> Result<()> {
    let structure = store
        .get(&handle.object)
        .with_context(|| format!("Structure '{}' is not loaded", handle.object))?;
    let writer = create_output(path)?;
    write_pdb_structure(writer, structure)
        .map_err(|e| e.with_path(path))
        .with_context(|| format!("Failed to write annotated {}", handle))?;
    log::info!("wrote B-factor annotated {} to {}", handle, path.display());
    Ok(())
}
