//! Unit cells and the minimum-image convention

use serde::{Deserialize, Serialize};

use crate::{Error, Mat3, Vec3};

/// A unit cell described by its three cell vectors in Å. The vectors are
/// stored as the rows of `vectors`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    vectors: Mat3,

    /// the transpose of `vectors`, converting fractional to Cartesian
    /// coordinates
    to_cart: Mat3,

    /// the inverse of `to_cart`
    to_frac: Mat3,
}

impl Lattice {
    /// build a lattice from the cell vectors `a`, `b`, and `c`. Returns
    /// [Error::InvalidCell] if the vectors are linearly dependent
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Result<Self, Error> {
        let vectors =
            Mat3::from_rows(&[a.transpose(), b.transpose(), c.transpose()]);
        let to_cart = vectors.transpose();
        if to_cart.determinant().abs() < 1e-8 {
            return Err(Error::InvalidCell(format!(
                "cell vectors are linearly dependent: {a:?}, {b:?}, {c:?}"
            )));
        }
        let to_frac = to_cart.try_inverse().ok_or_else(|| {
            Error::InvalidCell("cell matrix is not invertible".to_owned())
        })?;
        Ok(Self {
            vectors,
            to_cart,
            to_frac,
        })
    }

    /// build a lattice from the cell lengths in Å and angles in degrees, in
    /// the standard orientation with `a` along x and `b` in the xy-plane
    pub fn from_parameters(
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Result<Self, Error> {
        if [a, b, c].iter().any(|&l| !l.is_finite() || l <= 0.0) {
            return Err(Error::InvalidCell(format!(
                "cell lengths must be positive, got {a}, {b}, {c}"
            )));
        }
        let (ca, cb) = (alpha.to_radians().cos(), beta.to_radians().cos());
        let (cg, sg) = (gamma.to_radians().cos(), gamma.to_radians().sin());
        let cx = c * cb;
        let cy = c * (ca - cb * cg) / sg;
        let cz2 = c * c - cx * cx - cy * cy;
        if !cz2.is_finite() || cz2 <= 0.0 {
            return Err(Error::InvalidCell(format!(
                "cell angles {alpha}, {beta}, {gamma} do not form a cell"
            )));
        }
        Self::new(
            Vec3::new(a, 0.0, 0.0),
            Vec3::new(b * cg, b * sg, 0.0),
            Vec3::new(cx, cy, cz2.sqrt()),
        )
    }

    /// the cell vectors as the rows of a matrix
    pub fn vectors(&self) -> &Mat3 {
        &self.vectors
    }

    /// the cell lengths a, b, and c
    pub fn lengths(&self) -> [f64; 3] {
        [0, 1, 2].map(|i| self.vectors.row(i).norm())
    }

    pub fn volume(&self) -> f64 {
        self.vectors.determinant().abs()
    }

    pub fn to_cartesian(&self, frac: &Vec3) -> Vec3 {
        self.to_cart * frac
    }

    pub fn to_fractional(&self, cart: &Vec3) -> Vec3 {
        self.to_frac * cart
    }

    /// the shortest periodic image of the displacement `d`. The fractional
    /// displacement is first wrapped into [-0.5, 0.5], and then the
    /// neighboring images are searched, which is required for strongly
    /// skewed cells where the wrapped vector is not always the shortest
    pub fn minimum_image(&self, d: &Vec3) -> Vec3 {
        let frac = self.to_fractional(d);
        let frac = frac - frac.map(f64::round);
        let mut best = self.to_cartesian(&frac);
        let mut best_norm = best.norm_squared();
        for i in -1..=1 {
            for j in -1..=1 {
                for k in -1..=1 {
                    if i == 0 && j == 0 && k == 0 {
                        continue;
                    }
                    let shift = Vec3::new(i as f64, j as f64, k as f64);
                    let cand = self.to_cartesian(&(frac + shift));
                    let norm = cand.norm_squared();
                    if norm < best_norm {
                        best = cand;
                        best_norm = norm;
                    }
                }
            }
        }
        best
    }
}

/// wrap each component of the fractional coordinate `f` into [0, 1)
pub fn wrap(f: &Vec3) -> Vec3 {
    f.map(|x| {
        let w = x - x.floor();
        // x - floor(x) can round up to exactly 1.0 for tiny negative x
        if w >= 1.0 {
            0.0
        } else {
            w
        }
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn orthorhombic() {
        let l = Lattice::from_parameters(10.0, 12.0, 14.0, 90.0, 90.0, 90.0)
            .unwrap();
        assert_abs_diff_eq!(
            *l.vectors(),
            Mat3::from_diagonal(&Vec3::new(10.0, 12.0, 14.0)),
            epsilon = 1e-10
        );
        assert_abs_diff_eq!(l.volume(), 1680.0, epsilon = 1e-8);
        let got = l.minimum_image(&Vec3::new(9.0, -7.0, 1.0));
        assert_abs_diff_eq!(got, Vec3::new(-1.0, 5.0, 1.0), epsilon = 1e-10);
    }

    #[test]
    fn monoclinic_parameters() {
        // anthracene-like cell
        let l = Lattice::from_parameters(8.562, 6.038, 11.184, 90.0, 124.7, 90.0)
            .unwrap();
        let [a, b, c] = l.lengths();
        assert_abs_diff_eq!(a, 8.562, epsilon = 1e-10);
        assert_abs_diff_eq!(b, 6.038, epsilon = 1e-10);
        assert_abs_diff_eq!(c, 11.184, epsilon = 1e-10);
        let cos_beta = l.vectors().row(0).dot(&l.vectors().row(2)) / (a * c);
        assert_abs_diff_eq!(
            cos_beta,
            124.7f64.to_radians().cos(),
            epsilon = 1e-10
        );
        let f = Vec3::new(0.1, 0.7, 0.35);
        assert_abs_diff_eq!(
            l.to_fractional(&l.to_cartesian(&f)),
            f,
            epsilon = 1e-12
        );
    }

    #[test]
    fn skewed_minimum_image() {
        let l = Lattice::new(
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(9.0, 2.0, 0.0),
            Vec3::new(0.0, 0.0, 10.0),
        )
        .unwrap();
        let d = Vec3::new(1.0, 1.9, 0.0);
        let got = l.minimum_image(&d);
        // brute force over a wide range of images
        let mut want = d;
        for i in -3..=3 {
            for j in -3..=3 {
                let cand = d + l.to_cartesian(&Vec3::new(i as f64, j as f64, 0.0));
                if cand.norm() < want.norm() {
                    want = cand;
                }
            }
        }
        assert_abs_diff_eq!(got.norm(), want.norm(), epsilon = 1e-10);
    }

    #[test]
    fn invalid() {
        assert!(Lattice::from_parameters(1.0, 1.0, 1.0, 10.0, 120.0, 90.0)
            .is_err());
        assert!(Lattice::new(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0)
        )
        .is_err());
    }

    #[test]
    fn wrapping() {
        let got = wrap(&Vec3::new(-0.25, 1.5, -1e-20));
        assert_abs_diff_eq!(got, Vec3::new(0.75, 0.5, 0.0), epsilon = 1e-12);
    }
}
