use std::{error, fmt::Display, path::PathBuf};

use crate::Format;

#[derive(Debug)]
pub enum Error {
    Io(PathBuf, std::io::Error),
    Parse {
        format: Format,
        line: usize,
        details: String,
    },
    InvalidAtom(String),
    UnknownElement(String),
    InvalidSymOp(String),
    InvalidCell(String),
    UnsupportedFormat(PathBuf),
    AtomOutOfRange {
        index: usize,
        natoms: usize,
    },
    InvalidRadius(f64),
    FragmentOutOfRange {
        index: usize,
        nfrags: usize,
    },
}

impl Error {
    pub(crate) fn parse(
        format: Format,
        line: usize,
        details: impl Into<String>,
    ) -> Self {
        Self::Parse {
            format,
            line,
            details: details.into(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(path, e) => {
                write!(f, "failed to access {} with {e}", path.display())
            }
            Error::Parse {
                format,
                line,
                details,
            } => {
                write!(
                    f,
                    "failed to parse {format} data at line {line}: {details}"
                )
            }
            Error::InvalidAtom(s) => write!(f, "invalid atom: {s}"),
            Error::UnknownElement(s) => write!(f, "unknown element `{s}`"),
            Error::InvalidSymOp(s) => {
                write!(f, "invalid symmetry operation `{s}`")
            }
            Error::InvalidCell(s) => write!(f, "invalid unit cell: {s}"),
            Error::UnsupportedFormat(path) => write!(
                f,
                "unable to infer a periodic structure format for {}",
                path.display()
            ),
            Error::AtomOutOfRange { index, natoms } => write!(
                f,
                "atom index {index} out of range for a structure with \
                 {natoms} atoms"
            ),
            Error::InvalidRadius(r) => {
                write!(f, "cutoff radius must be finite and >= 0, got {r}")
            }
            Error::FragmentOutOfRange { index, nfrags } => write!(
                f,
                "only {nfrags} molecules found; cannot pick index {index}"
            ),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(_, e) => Some(e),
            _ => None,
        }
    }
}
