use std::{
    error::Error,
    fmt::Display,
    fs::read_to_string,
    path::Path,
    sync::OnceLock,
};

use log::{debug, info};
use regex::Regex;
use xtal::{Atom, Molecule, NUMBER_TO_SYMBOL};


#[derive(Debug, PartialEq)]
pub enum LogError {
    FileNotFound(String),
    ReadFileError(String, std::io::ErrorKind),
    /// the log contains no geometry frames
    GeomNotFound(String),
    /// a malformed atom line in a geometry frame, with its line number
    GeomParseError(String, usize),
    ErrorTermination(String),
    Incomplete(String),
    NotConverged(String),
}

impl Display for LogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogError::FileNotFound(s) => write!(f, "{s} not found"),
            LogError::ReadFileError(s, kind) => {
                write!(f, "failed to read {s}: {kind}")
            }
            LogError::GeomNotFound(s) => {
                write!(f, "no geometry frames found in {s}")
            }
            LogError::GeomParseError(s, line) => {
                write!(f, "malformed geometry on line {line} of {s}")
            }
            LogError::ErrorTermination(s) => {
                write!(f, "{s} ended in an error termination")
            }
            LogError::Incomplete(s) => {
                write!(f, "{s} has no termination line; is the job finished?")
            }
            LogError::NotConverged(s) => {
                write!(f, "the geometry optimization in {s} did not converge")
            }
        }
    }
}

impl Error for LogError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Normal,
    Error,
    /// no termination line, either because the job is still running or
    /// because it was killed
    Incomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptStatus {
    Converged,
    NotConverged,
    /// no optimization status lines, as in a single-point log
    Unknown,
}

/// The parts of a Gaussian log this crate cares about
#[derive(Debug)]
pub struct LogFile {
    /// the name used in error messages
    pub name: String,

    /// every geometry frame in the log, in order
    pub frames: Vec<Molecule>,

    pub termination: Termination,
    pub optimization: OptStatus,
}

static CELL: OnceLock<[Regex; 6]> = OnceLock::new();

/// which orientation block an atom line belongs to
#[derive(Clone, Copy, PartialEq)]
enum Orientation {
    Input,
    Standard,
}

impl LogFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let path = path.as_ref();
        let name = path.display().to_string();
        if !path.exists() {
            return Err(LogError::FileNotFound(name));
        }
        let contents = match read_to_string(path) {
            Ok(s) => s,
            Err(e) => return Err(LogError::ReadFileError(name, e.kind())),
        };
        let ret = Self::parse(&contents, &name)?;
        info!(
            "read {} geometry frames from {name}",
            ret.frames.len()
        );
        Ok(ret)
    }

    /// parse the contents of a Gaussian log. Frames are taken from `Input
    /// orientation:` blocks, or from `Standard orientation:` blocks if the log
    /// has no input orientations. `name` is only used for error messages
    pub fn parse(contents: &str, name: &str) -> Result<Self, LogError> {
        let [input_re, standard_re, normal_re, error_re, conv_re, noconv_re] =
            CELL.get_or_init(|| {
                [
                    Regex::new(r"^\s+Input orientation:").unwrap(),
                    Regex::new(r"^\s+Standard orientation:").unwrap(),
                    Regex::new(r"^ Normal termination of Gaussian").unwrap(),
                    Regex::new(r"^ Error termination").unwrap(),
                    Regex::new(
                        r"Optimization completed\.|Stationary point found\.",
                    )
                    .unwrap(),
                    Regex::new(
                        r"Optimization stopped\.|Number of steps exceeded",
                    )
                    .unwrap(),
                ]
            });

        let mut input = Vec::new();
        let mut standard = Vec::new();
        let mut termination = Termination::Incomplete;
        let mut optimization = OptStatus::Unknown;

        let mut skip = 0;
        let mut frame: Option<Orientation> = None;
        let mut atoms = Vec::new();
        for (i, line) in contents.lines().enumerate() {
            if skip > 0 {
                skip -= 1;
            } else if let Some(orient) = frame {
                if line.trim_start().starts_with("---") {
                    let mol = Molecule::new(std::mem::take(&mut atoms));
                    match orient {
                        Orientation::Input => input.push(mol),
                        Orientation::Standard => standard.push(mol),
                    }
                    frame = None;
                } else if is_placeholder(line) {
                    debug!("skipping ghost or dummy atom on line {}", i + 1);
                } else {
                    atoms.push(parse_atom(line).ok_or_else(|| {
                        LogError::GeomParseError(name.to_owned(), i + 1)
                    })?);
                }
            } else if input_re.is_match(line) {
                // dashes, two header lines, dashes
                skip = 4;
                frame = Some(Orientation::Input);
            } else if standard_re.is_match(line) {
                skip = 4;
                frame = Some(Orientation::Standard);
            } else if normal_re.is_match(line) {
                termination = Termination::Normal;
            } else if error_re.is_match(line) {
                termination = Termination::Error;
            } else if conv_re.is_match(line) {
                optimization = OptStatus::Converged;
            } else if noconv_re.is_match(line) {
                optimization = OptStatus::NotConverged;
            }
        }
        if frame.is_some() {
            debug!("dropping a truncated geometry frame at the end of {name}");
        }

        debug!(
            "{name}: {} input and {} standard orientation frames",
            input.len(),
            standard.len()
        );
        let frames = if input.is_empty() { standard } else { input };
        if frames.is_empty() {
            return Err(LogError::GeomNotFound(name.to_owned()));
        }
        Ok(Self {
            name: name.to_owned(),
            frames,
            termination,
            optimization,
        })
    }

    /// the final geometry in the log
    pub fn last_frame(&self) -> &Molecule {
        // parse guarantees at least one frame
        &self.frames[self.frames.len() - 1]
    }

    /// check that the job terminated normally with a converged optimization
    pub fn check(&self) -> Result<(), LogError> {
        let name = self.name.clone();
        match (self.termination, self.optimization) {
            (Termination::Error, _) => Err(LogError::ErrorTermination(name)),
            (Termination::Incomplete, _) => Err(LogError::Incomplete(name)),
            (Termination::Normal, OptStatus::Converged) => Ok(()),
            (Termination::Normal, _) => Err(LogError::NotConverged(name)),
        }
    }
}

/// ghost atoms (atomic number 0) and dummy atoms (-1) are printed in the
/// orientation blocks but are not part of the molecule
fn is_placeholder(line: &str) -> bool {
    line.split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<isize>().ok())
        .is_some_and(|z| z <= 0)
}

/// parse an orientation line like
///
/// ```text
///       1          8           0        0.000000    0.000000    0.119262
/// ```
///
/// very old logs omit the atomic type column, so the coordinates are always
/// taken from the end of the line
fn parse_atom(line: &str) -> Option<Atom> {
    let sp: Vec<_> = line.split_whitespace().collect();
    if !(5..=6).contains(&sp.len()) {
        return None;
    }
    let atomic_number: usize = sp[1].parse().ok()?;
    if atomic_number == 0 || atomic_number >= NUMBER_TO_SYMBOL.len() {
        return None;
    }
    let n = sp.len();
    Some(Atom::new(
        atomic_number,
        sp[n - 3].parse().ok()?,
        sp[n - 2].parse().ok()?,
        sp[n - 1].parse().ok()?,
    ))
}
