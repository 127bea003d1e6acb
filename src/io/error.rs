use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "I/O error for {path_desc}: {source}",
        path_desc = PathDisplay(path)
    )]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "failed to parse {format} {path_desc}: {details} (line {line_number})",
        path_desc = PathDisplay(path)
    )]
    Parse {
        format: &'static str,
        path: Option<PathBuf>,
        line_number: usize,
        details: String,
    },

    #[error(
        "inconsistent data in {format} {path_desc}: {details}",
        path_desc = PathDisplay(path)
    )]
    InconsistentData {
        format: &'static str,
        path: Option<PathBuf>,
        details: String,
    },
}

impl Error {
    pub fn from_io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { path, source }
    }

    pub fn parse(
        format: &'static str,
        path: Option<PathBuf>,
        line_number: usize,
        details: impl Into<String>,
    ) -> Self {
        Self::Parse {
            format,
            path,
            line_number,
            details: details.into(),
        }
    }

    pub fn inconsistent_data(
        format: &'static str,
        path: Option<PathBuf>,
        details: impl Into<String>,
    ) -> Self {
        Self::InconsistentData {
            format,
            path,
            details: details.into(),
        }
    }

    /// Attaches a file path to errors raised while reading an anonymous stream.
    pub fn with_path(self, new_path: impl Into<PathBuf>) -> Self {
        let new_path = Some(new_path.into());
        match self {
            Self::Io { source, .. } => Self::Io {
                path: new_path,
                source,
            },
            Self::Parse {
                format,
                line_number,
                details,
                ..
            } => Self::Parse {
                format,
                path: new_path,
                line_number,
                details,
            },
            Self::InconsistentData {
                format, details, ..
            } => Self::InconsistentData {
                format,
                path: new_path,
                details,
            },
        }
    }
}

struct PathDisplay<'a>(&'a Option<PathBuf>);

impl<'a> fmt::Display for PathDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(p) => write!(f, "file '{}'", p.display()),
            None => write!(f, "stream source"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_mentions_stream_source_without_path() {
        let err = Error::parse("PDB", None, 7, "Invalid X coordinate");

        assert_eq!(
            err.to_string(),
            "failed to parse PDB stream source: Invalid X coordinate (line 7)"
        );
    }

    #[test]
    fn with_path_rewrites_source_description() {
        let err = Error::inconsistent_data("mmCIF", None, "bad cell").with_path("model.cif");

        assert_eq!(
            err.to_string(),
            "inconsistent data in mmCIF file 'model.cif': bad cell"
        );
    }

    #[test]
    fn io_error_keeps_underlying_source() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::from_io(source, Some(PathBuf::from("missing.pdb")));

        assert!(err.to_string().contains("file 'missing.pdb'"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
