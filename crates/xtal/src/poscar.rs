use crate::{symbol_to_number, Atom, Error, Format, Lattice, Structure, Vec3};

fn err(line: usize, details: impl Into<String>) -> Error {
    Error::parse(Format::Poscar, line, details)
}

fn floats<const N: usize>(line: &str, n: usize) -> Result<[f64; N], Error> {
    let mut ret = [0.0; N];
    let mut fields = line.split_whitespace();
    for r in ret.iter_mut() {
        let Some(f) = fields.next() else {
            return Err(err(n, format!("expected {N} numbers in `{line}`")));
        };
        *r = f
            .parse()
            .map_err(|_| err(n, format!("invalid number `{f}`")))?;
    }
    Ok(ret)
}

/// read a VASP 5 POSCAR/CONTCAR. The species line is required because there is
/// no other way to assign elements
pub(crate) fn read(s: &str) -> Result<Structure, Error> {
    let mut lines = s.lines().enumerate().map(|(i, l)| (i + 1, l));
    let mut next = |what: &str| {
        lines
            .next()
            .ok_or_else(|| err(0, format!("file ended before {what}")))
    };

    next("the comment line")?;
    let (n, line) = next("the scaling factor")?;
    let [scale] = floats(line, n)?;

    let mut vecs = [Vec3::zeros(); 3];
    for v in vecs.iter_mut() {
        let (n, line) = next("the lattice vectors")?;
        *v = Vec3::from(floats::<3>(line, n)?);
    }
    let lattice = Lattice::new(vecs[0], vecs[1], vecs[2])?;
    // a negative scaling factor is the target cell volume
    let scale = if scale < 0.0 {
        (-scale / lattice.volume()).cbrt()
    } else {
        scale
    };
    let lattice =
        Lattice::new(vecs[0] * scale, vecs[1] * scale, vecs[2] * scale)?;

    let (n, line) = next("the species line")?;
    let species = line
        .split_whitespace()
        .map(|s| {
            // VASP 6 writes POTCAR names like Fe_pv or H/a1b2
            let sym = s.split(['_', '/']).next().unwrap_or(s);
            symbol_to_number(sym).ok_or_else(|| {
                err(
                    n,
                    format!("unknown element `{s}`; a species line is required"),
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (n, line) = next("the species counts")?;
    let counts = line
        .split_whitespace()
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| err(n, format!("invalid count `{s}`")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if counts.len() != species.len() {
        return Err(err(
            n,
            format!(
                "{} species but {} counts",
                species.len(),
                counts.len()
            ),
        ));
    }
    let total = counts
        .iter()
        .try_fold(0usize, |acc, &c| acc.checked_add(c))
        .ok_or_else(|| err(n, "the species counts overflow"))?;
    log::debug!("reading {total} POSCAR atoms");

    let (mut n, mut line) = next("the coordinate mode")?;
    if line.trim_start().starts_with(['S', 's']) {
        (n, line) = next("the coordinate mode")?;
    }
    let direct = match line.trim_start().chars().next() {
        Some('D' | 'd') => true,
        Some('C' | 'c' | 'K' | 'k') => false,
        _ => {
            return Err(err(n, format!("unknown coordinate mode `{line}`")));
        }
    };

    let mut atoms = Vec::new();
    for (&z, &count) in species.iter().zip(&counts) {
        for _ in 0..count {
            let (n, line) = next("the last coordinate")?;
            let pos = Vec3::from(floats::<3>(line, n)?);
            let pos = if direct {
                lattice.to_cartesian(&pos)
            } else {
                pos * scale
            };
            atoms.push(Atom::from_position(z, pos));
        }
    }
    Ok(Structure::new(lattice, atoms))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn direct() {
        let s = "water in a box
1.0
  10.0 0.0 0.0
  0.0 10.0 0.0
  0.0 0.0 10.0
O H
1 2
Selective dynamics
Direct
 0.5 0.5 0.5 T T T
 0.5 0.576 0.559 T T T
 0.5 0.424 0.559 T T T
";
        let got = read(s).unwrap();
        assert_eq!(got.atoms.len(), 3);
        assert_eq!(got.atoms[0].atomic_number, 8);
        assert_eq!(got.atoms[2].atomic_number, 1);
        assert_abs_diff_eq!(
            got.atoms[1].position(),
            Vec3::new(5.0, 5.76, 5.59),
            epsilon = 1e-10
        );
    }

    #[test]
    fn cartesian_scaled() {
        let s = "scaled
2.0
 5.0 0.0 0.0
 0.0 5.0 0.0
 0.0 0.0 5.0
C
1
Cartesian
 1.0 2.0 3.0
";
        let got = read(s).unwrap();
        assert_abs_diff_eq!(got.lattice.lengths()[0], 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            got.atoms[0].position(),
            Vec3::new(2.0, 4.0, 6.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn truncated() {
        let s = "short
1.0
 5.0 0.0 0.0
 0.0 5.0 0.0
 0.0 0.0 5.0
C
2
Direct
 0.0 0.0 0.0
";
        assert!(read(s).is_err());
    }

    #[test]
    fn no_species() {
        let s = "vasp4
1.0
 5.0 0.0 0.0
 0.0 5.0 0.0
 0.0 0.0 5.0
2
Direct
 0.0 0.0 0.0
 0.5 0.5 0.5
";
        assert!(read(s).is_err());
    }

    #[test]
    fn huge_count() {
        let s = "huge
1.0
 5.0 0.0 0.0
 0.0 5.0 0.0
 0.0 0.0 5.0
C
999999999999999999
Direct
 0.0 0.0 0.0
";
        let got = read(s).unwrap_err().to_string();
        assert!(got.contains("file ended"), "{got}");
    }

    #[test]
    fn count_overflow() {
        let s = "overflow
1.0
 5.0 0.0 0.0
 0.0 5.0 0.0
 0.0 0.0 5.0
C H
18446744073709551615 1
Direct
 0.0 0.0 0.0
";
        let got = read(s).unwrap_err();
        assert!(matches!(got, Error::Parse { line: 7, .. }), "{got}");
        assert!(got.to_string().contains("overflow"), "{got}");
    }
}
