use std::{fmt::Display, str::FromStr};

use approx::AbsDiffEq;
use serde::{Deserialize, Serialize};

use crate::{radii::COVALENT_RADII, Error, Vec3};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Atom {
    pub atomic_number: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        self.abs_diff_eq(other, Self::default_epsilon())
    }
}

impl AbsDiffEq for Atom {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        1e-8
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() < epsilon;
        self.atomic_number == other.atomic_number
            && close(self.x, other.x)
            && close(self.y, other.y)
            && close(self.z, other.z)
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:<2} {:15.8} {:15.8} {:15.8}",
            self.label(),
            self.x,
            self.y,
            self.z
        )
    }
}

impl FromStr for Atom {
    type Err = Error;

    /// parse an Atom from a line like
    ///  C 1.0 1.0 1.0
    /// any fields after the three coordinates are ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<_> = s.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(Error::InvalidAtom(format!(
                "expected a symbol and three coordinates, found `{}`",
                s.trim()
            )));
        }
        let mut coord = [0.0; 3];
        for (c, field) in coord.iter_mut().zip(&fields[1..4]) {
            *c = field.parse().map_err(|_| {
                Error::InvalidAtom(format!(
                    "failed to parse coordinate `{field}` as f64"
                ))
            })?;
        }
        let atomic_number = symbol_to_number(fields[0])
            .ok_or_else(|| Error::UnknownElement(fields[0].to_owned()))?;
        Ok(Self::new(atomic_number, coord[0], coord[1], coord[2]))
    }
}

pub const NUMBER_TO_SYMBOL: [&str; 87] = [
    "X", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg",
    "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn",
    "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb",
    "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm",
    "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta",
    "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl", "Pb", "Bi", "Po", "At",
    "Rn",
];

/// look up the atomic number of `s`, ignoring case. the dummy symbol `X` is
/// not accepted
pub fn symbol_to_number(s: &str) -> Option<usize> {
    if s.is_empty() {
        return None;
    }
    let s = titlecase(s);
    NUMBER_TO_SYMBOL
        .iter()
        .skip(1)
        .position(|&x| x == s)
        .map(|i| i + 1)
}

/// reduce a site label like `C12A`, `Cl3` or a typed symbol like `O2-` to the
/// element it names. Two-letter elements win over one-letter ones when the
/// label's leading letters allow both
pub fn element_from_label(label: &str) -> Option<usize> {
    let letters: String = label
        .chars()
        .take_while(char::is_ascii_alphabetic)
        .take(2)
        .collect();
    if letters.len() == 2 {
        if let Some(n) = symbol_to_number(&letters) {
            return Some(n);
        }
    }
    letters.get(..1).and_then(symbol_to_number)
}

fn titlecase(s: &str) -> String {
    let mut cs = s.chars();
    let mut ret = String::with_capacity(s.len());
    if let Some(c) = cs.next() {
        ret.extend(c.to_uppercase());
    }
    for c in cs {
        ret.extend(c.to_lowercase());
    }
    ret
}

impl Atom {
    pub fn new(atomic_number: usize, x: f64, y: f64, z: f64) -> Self {
        Self {
            atomic_number,
            x,
            y,
            z,
        }
    }

    /// panics if `atomic_symbol` is not a known element. use the [FromStr]
    /// implementation for fallible parsing
    pub fn new_from_label(atomic_symbol: &str, x: f64, y: f64, z: f64) -> Self {
        let sym = symbol_to_number(atomic_symbol).unwrap_or_else(|| {
            panic!("failed to locate atomic symbol {atomic_symbol}")
        });
        Self::new(sym, x, y, z)
    }

    pub fn from_position(atomic_number: usize, pos: Vec3) -> Self {
        Self::new(atomic_number, pos[0], pos[1], pos[2])
    }

    #[inline]
    pub const fn label(&self) -> &str {
        debug_assert!(self.atomic_number < NUMBER_TO_SYMBOL.len());
        NUMBER_TO_SYMBOL[self.atomic_number]
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// the covalent radius of the element in Å
    pub fn covalent_radius(&self) -> f64 {
        COVALENT_RADII[self.atomic_number]
    }
}
