use std::{
    fmt::Display,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

pub use atom::*;
pub use error::Error;
pub use lattice::Lattice;
pub use select::{Bonding, Extraction, Fragment};
pub use structure::Structure;
pub use symop::SymOp;

use serde::{Deserialize, Serialize};


pub mod atom;
mod cif;
mod error;
pub mod lattice;
mod mol_traits;
mod poscar;
mod radii;
pub mod select;
pub mod structure;
pub mod symop;

use nalgebra as na;

pub type Vec3 = na::Vector3<f64>;
pub type Mat3 = na::Matrix3<f64>;

#[macro_export]
macro_rules! molecule {
    ($($num:ident $x:literal $y:literal $z:literal)+) => {
	$crate::Molecule::new(vec![
	    $($crate::Atom::new_from_label(stringify!($num), $x, $y, $z),)*
	    ])
    };
}

/// The file formats this crate knows how to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Xyz,
    Cif,
    Poscar,
}

impl Format {
    /// infer the format of `path` from its file name. `POSCAR` and `CONTCAR`
    /// are recognized anywhere in the name since VASP files rarely carry an
    /// extension
    pub fn infer(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        if name.ends_with(".cif") {
            Some(Self::Cif)
        } else if name.ends_with(".xyz") {
            Some(Self::Xyz)
        } else if name.contains("poscar")
            || name.contains("contcar")
            || name.ends_with(".vasp")
        {
            Some(Self::Poscar)
        } else {
            None
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Format::Xyz => "XYZ",
                Format::Cif => "CIF",
                Format::Poscar => "POSCAR",
            }
        )
    }
}

/// A non-periodic collection of atoms in Å
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Molecule {
    pub atoms: Vec<Atom>,
}

impl Molecule {
    pub fn new(atoms: Vec<Atom>) -> Self {
        Self { atoms }
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// return the atomic numbers of each atoms as a vector
    pub fn atomic_numbers(&self) -> Vec<usize> {
        self.atoms.iter().map(|a| a.atomic_number).collect()
    }

    /// the molecular formula in Hill order: C first, then H, then everything
    /// else alphabetically. Without carbon, every element is alphabetical
    pub fn formula(&self) -> String {
        let mut counts = [0usize; NUMBER_TO_SYMBOL.len()];
        for atom in &self.atoms {
            counts[atom.atomic_number] += 1;
        }
        let mut order: Vec<usize> =
            (0..counts.len()).filter(|&i| counts[i] > 0).collect();
        let has_carbon = counts[6] > 0;
        order.sort_by_key(|&i| match i {
            6 if has_carbon => (0, ""),
            1 if has_carbon => (1, ""),
            _ => (2, NUMBER_TO_SYMBOL[i]),
        });
        let mut ret = String::new();
        for i in order {
            ret.push_str(NUMBER_TO_SYMBOL[i]);
            if counts[i] > 1 {
                ret.push_str(&counts[i].to_string());
            }
        }
        ret
    }

    /// read a molecule from the XYZ file at `path`
    pub fn load_xyz(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Io(path.to_owned(), e))?;
        contents.parse()
    }

    /// write `self` in XYZ format with `comment` on the second line.
    /// `comment` must not contain a newline
    pub fn write_xyz<W: Write>(
        &self,
        w: &mut W,
        comment: &str,
    ) -> std::io::Result<()> {
        writeln!(w, "{}", self.atoms.len())?;
        writeln!(w, "{comment}")?;
        for atom in &self.atoms {
            writeln!(
                w,
                "{:<2} {:>15.8} {:>15.8} {:>15.8}",
                atom.label(),
                atom.x,
                atom.y,
                atom.z
            )?;
        }
        Ok(())
    }

    pub fn save_xyz(
        &self,
        path: impl AsRef<Path>,
        comment: &str,
    ) -> Result<(), Error> {
        let path = path.as_ref();
        let io_err = |e| Error::Io(path.to_owned(), e);
        let mut f = BufWriter::new(File::create(path).map_err(io_err)?);
        self.write_xyz(&mut f, comment).map_err(io_err)?;
        f.flush().map_err(io_err)
    }
}
