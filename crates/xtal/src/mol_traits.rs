use crate::{Atom, Error, Format, Molecule};
use approx::AbsDiffEq;
use std::{fmt::Display, str::FromStr};

impl std::fmt::Debug for Molecule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

/// A Molecule is AbsDiffEq if each of its Atoms is, in order
impl AbsDiffEq for Molecule {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        1e-8
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.atoms.len() == other.atoms.len()
            && self
                .atoms
                .iter()
                .zip(&other.atoms)
                .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}

impl PartialEq for Molecule {
    fn eq(&self, other: &Self) -> bool {
        self.abs_diff_eq(other, Self::default_epsilon())
    }
}

impl FromStr for Molecule {
    type Err = Error;

    /// parse either a proper XYZ file, with the atom count and comment lines,
    /// or bare lines like
    ///      O           0.000000000    0.000000000   -0.124238453
    ///      H           0.000000000    1.431390207    0.986041184
    ///      H           0.000000000   -1.431390207    0.986041184
    /// into a molecule. Only the first frame of a multi-frame XYZ file is
    /// read, but atom lines beyond the count are an error
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l))
            .skip_while(|(_, l)| l.trim().is_empty())
            .peekable();
        let count = match lines.peek() {
            Some((_, l)) => l.trim().parse::<usize>().ok(),
            None => return Ok(Self::default()),
        };

        let mut ret = Self::default();
        let Some(count) = count else {
            for (n, line) in lines.filter(|(_, l)| !l.trim().is_empty()) {
                ret.atoms.push(parse_atom(n, line)?);
            }
            return Ok(ret);
        };

        // count and comment lines
        let header = lines.next().map_or(1, |(n, _)| n);
        lines.next();
        let mismatch = |found: usize| {
            Error::parse(
                Format::Xyz,
                header,
                format!("expected {count} atoms, found {found}"),
            )
        };
        while ret.atoms.len() < count {
            let Some((n, line)) = lines.next() else {
                return Err(mismatch(ret.atoms.len()));
            };
            ret.atoms.push(parse_atom(n, line)?);
        }
        // the next frame of a trajectory starts with a count, not an atom
        let extra = lines
            .filter(|(_, l)| !l.trim().is_empty())
            .take_while(|(_, l)| l.parse::<Atom>().is_ok())
            .count();
        if extra > 0 {
            return Err(mismatch(count + extra));
        }
        Ok(ret)
    }
}

fn parse_atom(n: usize, line: &str) -> Result<Atom, Error> {
    line.parse()
        .map_err(|e: Error| Error::parse(Format::Xyz, n, e.to_string()))
}

impl Display for Molecule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let precision = f.precision().unwrap_or(8);
        let width = f.width().unwrap_or(precision + 8);
        for atom in &self.atoms {
            writeln!(
                f,
                "{:<5}{:w$.p$}{:w$.p$}{:w$.p$}",
                atom.label(),
                atom.x,
                atom.y,
                atom.z,
                w = width,
                p = precision,
            )?;
        }
        Ok(())
    }
}
