//! Selecting a molecule out of a periodic structure, either by following bonds
//! from a seed atom or by taking every atom within a radius of a center atom.
//! Both selections unwrap the atoms they return so that a molecule spanning a
//! cell boundary comes out whole.

use std::collections::VecDeque;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{Atom, Error, Molecule, Structure, Vec3};

/// positions of the same atom reached along two bond paths further apart than
/// this belong to different periodic images
const IMAGE_TOL: f64 = 1e-4;

/// Two atoms are bonded when their minimum-image distance is strictly less
/// than `scale` times the sum of their covalent radii
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bonding {
    pub scale: f64,
}

impl Default for Bonding {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl Bonding {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    pub fn cutoff(&self, a: &Atom, b: &Atom) -> f64 {
        self.scale * (a.covalent_radius() + b.covalent_radius())
    }

    pub fn bonded(&self, s: &Structure, i: usize, j: usize) -> bool {
        i != j && s.distance(i, j) < self.cutoff(&s.atoms[i], &s.atoms[j])
    }
}

/// A subset of a [Structure]'s atoms. `indices` are ascending indices into the
/// structure, and `molecule.atoms[k]` is the unwrapped copy of atom
/// `indices[k]`
#[derive(Clone, Debug, PartialEq)]
pub struct Extraction {
    pub indices: Vec<usize>,
    pub molecule: Molecule,
}

impl Extraction {
    fn from_placed(s: &Structure, placed: &[Option<Vec3>]) -> Self {
        let mut indices = Vec::new();
        let mut atoms = Vec::new();
        for (i, pos) in placed.iter().enumerate() {
            if let Some(pos) = pos {
                indices.push(i);
                atoms.push(Atom::from_position(s.atoms[i].atomic_number, *pos));
            }
        }
        Self {
            indices,
            molecule: Molecule::new(atoms),
        }
    }
}

/// A connected component of the bond graph, as ascending atom indices
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    pub indices: Vec<usize>,
}

impl Structure {
    /// whether some cell axis is shorter than twice the longest possible bond,
    /// so that one atom could bond to two images of the same partner
    pub fn has_short_axis(&self, bonding: &Bonding) -> bool {
        let longest = self
            .atoms
            .iter()
            .map(|a| a.covalent_radius())
            .fold(0.0, f64::max);
        let cutoff = 2.0 * bonding.scale * longest;
        self.lattice.lengths().iter().any(|&l| l < 2.0 * cutoff)
    }

    /// the bonded neighbors of every atom. Bonds are decided from the single
    /// minimum image of each pair, so in a cell with a short axis (see
    /// [Structure::has_short_axis]) an atom bonded to two images of one
    /// partner keeps only one of those bonds
    pub fn neighbors(&self, bonding: &Bonding) -> Vec<Vec<usize>> {
        if self.has_short_axis(bonding) {
            debug!(
                "cell lengths {:?} allow bonds to more than one image of an \
                 atom; only the nearest image is used",
                self.lattice.lengths()
            );
        }
        let n = self.atoms.len();
        let mut ret = vec![Vec::new(); n];
        for i in 0..n {
            for j in i + 1..n {
                if bonding.bonded(self, i, j) {
                    ret[i].push(j);
                    ret[j].push(i);
                }
            }
        }
        ret
    }

    /// breadth-first search over `adj` from `seed`, placing each atom at its
    /// parent's position plus the minimum-image bond vector
    fn unwrap_component(
        &self,
        seed: usize,
        adj: &[Vec<usize>],
    ) -> Vec<Option<Vec3>> {
        let mut placed = vec![None; self.atoms.len()];
        placed[seed] = Some(self.position(seed));
        let mut queue = VecDeque::from([seed]);
        let mut periodic = false;
        while let Some(i) = queue.pop_front() {
            let Some(pi) = placed[i] else {
                continue;
            };
            for &j in &adj[i] {
                let pj = pi + self.displacement(i, j);
                match placed[j] {
                    Some(prev) => {
                        if (prev - pj).norm() > IMAGE_TOL {
                            periodic = true;
                        }
                    }
                    None => {
                        placed[j] = Some(pj);
                        queue.push_back(j);
                    }
                }
            }
        }
        if periodic {
            warn!(
                "the fragment containing atom {seed} is bonded to its own \
                 periodic image; the extracted molecule is one arbitrary cut \
                 of an extended network"
            );
        }
        placed
    }

    /// the connected component containing `seed` under `bonding`
    pub fn connected(
        &self,
        seed: usize,
        bonding: &Bonding,
    ) -> Result<Extraction, Error> {
        self.check_index(seed)?;
        let adj = self.neighbors(bonding);
        let placed = self.unwrap_component(seed, &adj);
        let ret = Extraction::from_placed(self, &placed);
        debug!(
            "found {} atoms connected to atom {seed}",
            ret.indices.len()
        );
        Ok(ret)
    }

    /// every atom whose minimum-image distance to `center` is strictly less
    /// than `radius`. The center atom itself is always included, so a radius
    /// of zero returns only the center
    pub fn within_radius(
        &self,
        center: usize,
        radius: f64,
    ) -> Result<Extraction, Error> {
        self.check_index(center)?;
        if !radius.is_finite() || radius < 0.0 {
            return Err(Error::InvalidRadius(radius));
        }
        let origin = self.position(center);
        let placed: Vec<_> = (0..self.atoms.len())
            .map(|j| {
                if j == center {
                    return Some(origin);
                }
                let d = self.displacement(center, j);
                (d.norm() < radius).then(|| origin + d)
            })
            .collect();
        Ok(Extraction::from_placed(self, &placed))
    }

    /// every connected component of the bond graph, ordered by their lowest
    /// atom index. Isolated atoms are single-atom fragments
    pub fn fragments(&self, bonding: &Bonding) -> Vec<Fragment> {
        let adj = self.neighbors(bonding);
        let mut seen = vec![false; self.atoms.len()];
        let mut ret = Vec::new();
        for start in 0..self.atoms.len() {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut indices = vec![start];
            let mut stack = vec![start];
            while let Some(i) = stack.pop() {
                for &j in &adj[i] {
                    if !seen[j] {
                        seen[j] = true;
                        indices.push(j);
                        stack.push(j);
                    }
                }
            }
            indices.sort_unstable();
            ret.push(Fragment { indices });
        }
        ret
    }

    /// the `index`-th fragment returned by [Structure::fragments], unwrapped
    /// from its lowest atom index
    pub fn fragment(
        &self,
        index: usize,
        bonding: &Bonding,
    ) -> Result<Extraction, Error> {
        let frags = self.fragments(bonding);
        let Some(frag) = frags.get(index) else {
            return Err(Error::FragmentOutOfRange {
                index,
                nfrags: frags.len(),
            });
        };
        self.connected(frag.indices[0], bonding)
    }
}
