//! Crystallographic symmetry operations in the Jones-faithful notation used by
//! CIF files, e.g. `-x+1/2, y+1/2, -z`

use std::str::FromStr;

use crate::{Error, Mat3, Vec3};

/// A symmetry operation acting on fractional coordinates as `rot * f +
/// trans`
#[derive(Clone, Debug, PartialEq)]
pub struct SymOp {
    pub rot: Mat3,
    pub trans: Vec3,
}

impl SymOp {
    pub fn identity() -> Self {
        Self {
            rot: Mat3::identity(),
            trans: Vec3::zeros(),
        }
    }

    pub fn apply(&self, frac: &Vec3) -> Vec3 {
        self.rot * frac + self.trans
    }
}

impl FromStr for SymOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || Error::InvalidSymOp(s.to_owned());
        let parts: Vec<_> = s.split(',').collect();
        if parts.len() != 3 {
            return Err(err());
        }
        let mut ret = Self {
            rot: Mat3::zeros(),
            trans: Vec3::zeros(),
        };
        for (row, part) in parts.iter().enumerate() {
            let expr: String = part
                .chars()
                .filter(|c| !c.is_whitespace())
                .flat_map(char::to_lowercase)
                .collect();
            if expr.is_empty() {
                return Err(err());
            }
            for term in terms(&expr) {
                let (sign, body) = match term.as_bytes()[0] {
                    b'-' => (-1.0, &term[1..]),
                    b'+' => (1.0, &term[1..]),
                    _ => (1.0, term),
                };
                match body.chars().last() {
                    Some(axis @ ('x' | 'y' | 'z')) => {
                        let col = match axis {
                            'x' => 0,
                            'y' => 1,
                            _ => 2,
                        };
                        let coeff = body[..body.len() - 1].trim_end_matches('*');
                        let coeff = if coeff.is_empty() {
                            1.0
                        } else {
                            number(coeff).ok_or_else(err)?
                        };
                        ret.rot[(row, col)] += sign * coeff;
                    }
                    Some(_) => {
                        ret.trans[row] += sign * number(body).ok_or_else(err)?;
                    }
                    None => return Err(err()),
                }
            }
        }
        Ok(ret)
    }
}

/// split `expr` before each sign that is not the first character
fn terms(expr: &str) -> Vec<&str> {
    let mut ret = Vec::new();
    let mut start = 0;
    for (i, c) in expr.char_indices() {
        if i > start && (c == '+' || c == '-') {
            ret.push(&expr[start..i]);
            start = i;
        }
    }
    ret.push(&expr[start..]);
    ret
}

/// parse a decimal or a fraction like `1/2`
fn number(s: &str) -> Option<f64> {
    match s.split_once('/') {
        Some((n, d)) => {
            let d: f64 = d.parse().ok()?;
            if d == 0.0 {
                return None;
            }
            Some(n.parse::<f64>().ok()? / d)
        }
        None => s.parse().ok(),
    }
}
