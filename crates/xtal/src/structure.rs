use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::{cif, poscar, Atom, Error, Format, Lattice, Vec3};

/// A periodic structure: the atoms of one unit cell in Cartesian coordinates
/// and the lattice that repeats them
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub lattice: Lattice,
    pub atoms: Vec<Atom>,
}

impl Structure {
    pub fn new(lattice: Lattice, atoms: Vec<Atom>) -> Self {
        Self { lattice, atoms }
    }

    /// load a periodic structure, inferring the format from the file name
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let format = match Format::infer(path) {
            Some(f @ (Format::Cif | Format::Poscar)) => f,
            Some(Format::Xyz) | None => {
                return Err(Error::UnsupportedFormat(path.to_owned()));
            }
        };
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Io(path.to_owned(), e))?;
        let ret = Self::parse(&contents, format)?;
        info!(
            "read {} atoms from {format} file {}",
            ret.atoms.len(),
            path.display()
        );
        Ok(ret)
    }

    /// parse `s` as a periodic structure in `format`
    pub fn parse(s: &str, format: Format) -> Result<Self, Error> {
        match format {
            Format::Cif => cif::read(s),
            Format::Poscar => poscar::read(s),
            Format::Xyz => Err(Error::parse(
                format,
                0,
                "XYZ files do not carry a unit cell",
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub(crate) fn check_index(&self, index: usize) -> Result<(), Error> {
        if index >= self.atoms.len() {
            return Err(Error::AtomOutOfRange {
                index,
                natoms: self.atoms.len(),
            });
        }
        Ok(())
    }

    pub fn position(&self, i: usize) -> Vec3 {
        self.atoms[i].position()
    }

    /// the minimum-image displacement from atom `i` to atom `j`
    pub fn displacement(&self, i: usize, j: usize) -> Vec3 {
        self.lattice
            .minimum_image(&(self.position(j) - self.position(i)))
    }

    /// the minimum-image distance between atoms `i` and `j`
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.displacement(i, j).norm()
    }
}
