//! Structure file readers and writers.
//!
//! Readers take any [`std::io::BufRead`] and an [`IoContext`] carrying residue naming rules;
//! they return errors without a path, which callers attach with [`Error::with_path`].

mod assembly;
mod context;
mod error;
mod mmcif;
mod pdb;

pub use pdb::reader::read as read_pdb_structure;
pub use pdb::writer::write_structure as write_pdb_structure;

pub use mmcif::reader::read as read_mmcif_structure;

pub use context::IoContext;

pub use error::Error;
