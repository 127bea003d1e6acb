use std::fmt;
use std::fs::File;
use std::io::{self as stdio, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;

use resmatch::Structure;
use resmatch::io::{self, IoContext, read_mmcif_structure, read_pdb_structure};

pub mod compare;
pub mod info;

/// Path placeholder that selects stdin.
pub const STDIN_PATH: &str = "-";

/// Formats supported by the CLI when reading structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StructureFormat {
    /// Legacy PDB format.
    #[value(name = "pdb")]
    Pdb,
    /// mmCIF format.
    #[value(name = "mmcif")]
    Mmcif,
}

impl StructureFormat {
    /// Attempts to infer a format from a file path extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdb" | "ent" => Some(Self::Pdb),
            "cif" | "mmcif" => Some(Self::Mmcif),
            _ => None,
        }
    }
}

impl fmt::Display for StructureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureFormat::Pdb => write!(f, "PDB"),
            StructureFormat::Mmcif => write!(f, "mmCIF"),
        }
    }
}

pub fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == STDIN_PATH
}

/// Loads a structure from `path`, or from stdin when `path` is `-`.
pub fn load_structure(path: &Path, forced: Option<StructureFormat>) -> Result<Structure> {
    let format = resolve_input_format(path, forced)?;
    let io_context = IoContext::new_default();

    if is_stdin(path) {
        let stdin = stdio::stdin();
        if stdin.is_terminal() {
            bail!("stdin is a TTY. Pipe a structure into resmatch or pass a file path instead of '-'.");
        }
        let reader = BufReader::new(stdin.lock());
        read_structure(reader, format, &io_context)
            .with_context(|| format!("Failed to parse {} input from stdin", format))
    } else {
        let file = File::open(path)
            .with_context(|| format!("Failed to open input file {}", path.display()))?;
        let reader = BufReader::new(file);
        read_structure(reader, format, &io_context)
            .map_err(|e| e.with_path(path))
            .with_context(|| format!("Failed to parse {} input", format))
    }
}

fn resolve_input_format(path: &Path, forced: Option<StructureFormat>) -> Result<StructureFormat> {
    if let Some(explicit) = forced {
        Ok(explicit)
    } else if is_stdin(path) {
        Ok(StructureFormat::Pdb)
    } else {
        StructureFormat::from_path(path).ok_or_else(|| {
            anyhow!(
                "Unable to infer input format from '{}'. Please specify --format.",
                path.display()
            )
        })
    }
}

fn read_structure<R: BufRead>(
    reader: R,
    format: StructureFormat,
    ctx: &IoContext,
) -> Result<Structure, io::Error> {
    match format {
        StructureFormat::Pdb => read_pdb_structure(reader, ctx),
        StructureFormat::Mmcif => read_mmcif_structure(reader, ctx),
    }
}

/// Derives the object name a structure is loaded under in a viewer: the file stem.
pub fn object_name(path: &Path) -> String {
    if is_stdin(path) {
        return "stdin".to_string();
    }
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Opens `path` for buffered writing, creating or truncating it.
pub fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Wraps long-running operations with a spinner rendered to stderr.
pub fn run_with_spinner<T, F>(message: &str, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message.to_string());

    let result = work();

    match &result {
        Ok(_) => spinner.finish_with_message(format!("{} ✓", message)),
        Err(_) => spinner.abandon_with_message(format!("{} ✗", message)),
    }

    result
}

pub fn print_boxed_label<W: Write>(writer: &mut W, title: &str) -> stdio::Result<()> {
    let inner = format!(" {title} ");
    let width = inner.chars().count();
    writeln!(writer, "╭{}╮", "─".repeat(width))?;
    writeln!(writer, "│{}│", inner)?;
    writeln!(writer, "╰{}╯", "─".repeat(width))?;
    Ok(())
}
