//! A reader for the subset of CIF 1.1 needed to rebuild a unit cell: the cell
//! parameters, the `_atom_site_` loop, and the symmetry operations

use std::collections::HashMap;

use log::debug;

use crate::{
    element_from_label,
    lattice::{wrap, Lattice},
    Atom, Error, Format, Structure, SymOp, Vec3,
};

/// fractional distance below which two generated sites are considered the same
/// site
const DUPLICATE_TOL: f64 = 1e-3;

const SYMOP_TAGS: [&str; 2] = [
    "_symmetry_equiv_pos_as_xyz",
    "_space_group_symop_operation_xyz",
];

#[derive(Debug)]
struct Token {
    line: usize,
    text: String,
    /// quoted strings and text fields are never keywords or tags
    quoted: bool,
}

/// split `s` into CIF tokens, dropping comments
fn tokenize(s: &str) -> Result<Vec<Token>, Error> {
    let mut ret = Vec::new();
    let mut lines = s.lines().enumerate().map(|(i, l)| (i + 1, l));
    while let Some((n, line)) = lines.next() {
        if let Some(first) = line.strip_prefix(';') {
            // multi-line text field, terminated by a line starting with ;
            let mut text = String::from(first);
            loop {
                let Some((_, l)) = lines.next() else {
                    return Err(Error::parse(
                        Format::Cif,
                        n,
                        "unterminated text field",
                    ));
                };
                if l.starts_with(';') {
                    break;
                }
                text.push('\n');
                text.push_str(l);
            }
            ret.push(Token {
                line: n,
                text,
                quoted: true,
            });
            continue;
        }
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() {
                i += 1;
            } else if c == '#' {
                break;
            } else if c == '\'' || c == '"' {
                // a quote only closes when followed by whitespace or the end
                // of the line
                let start = i + 1;
                let mut end = start;
                while end < chars.len()
                    && !(chars[end] == c
                        && chars.get(end + 1).is_none_or(|n| n.is_whitespace()))
                {
                    end += 1;
                }
                if end >= chars.len() {
                    return Err(Error::parse(
                        Format::Cif,
                        n,
                        "unterminated quoted string",
                    ));
                }
                ret.push(Token {
                    line: n,
                    text: chars[start..end].iter().collect(),
                    quoted: true,
                });
                i = end + 1;
            } else {
                let start = i;
                while i < chars.len() && !chars[i].is_whitespace() {
                    i += 1;
                }
                ret.push(Token {
                    line: n,
                    text: chars[start..i].iter().collect(),
                    quoted: false,
                });
            }
        }
    }
    Ok(ret)
}

#[derive(Debug, Default)]
struct Loop {
    line: usize,
    headers: Vec<String>,
    values: Vec<String>,
}

impl Loop {
    fn column(&self, tag: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == tag)
    }

    fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.values.chunks_exact(self.headers.len().max(1))
    }
}

/// The tags and loops of the first data block in a CIF file. Tags are
/// lowercased
#[derive(Debug, Default)]
struct DataBlock {
    tags: HashMap<String, (usize, String)>,
    loops: Vec<Loop>,
}

fn is_keyword(tok: &Token, word: &str) -> bool {
    !tok.quoted
        && tok
            .text
            .get(..word.len())
            .is_some_and(|p| p.eq_ignore_ascii_case(word))
}

fn is_tag(tok: &Token) -> bool {
    !tok.quoted && tok.text.starts_with('_')
}

fn parse_block(tokens: Vec<Token>) -> Result<DataBlock, Error> {
    let mut ret = DataBlock::default();
    let mut seen_data = false;
    let mut toks = tokens.into_iter().peekable();
    while let Some(tok) = toks.next() {
        if is_keyword(&tok, "data_") {
            if seen_data {
                debug!("ignoring data blocks after the first");
                break;
            }
            seen_data = true;
        } else if is_keyword(&tok, "loop_") {
            let mut lp = Loop {
                line: tok.line,
                ..Default::default()
            };
            while let Some(t) = toks.next_if(is_tag) {
                lp.headers.push(t.text.to_lowercase());
            }
            while let Some(t) = toks.next_if(|t| {
                !is_tag(t) && !is_keyword(t, "loop_") && !is_keyword(t, "data_")
            }) {
                lp.values.push(t.text);
            }
            if lp.headers.is_empty()
                || lp.values.len() % lp.headers.len() != 0
            {
                return Err(Error::parse(
                    Format::Cif,
                    lp.line,
                    format!(
                        "loop with {} columns has {} values",
                        lp.headers.len(),
                        lp.values.len()
                    ),
                ));
            }
            ret.loops.push(lp);
        } else if is_tag(&tok) {
            let Some(value) = toks.next_if(|t| !is_tag(t)) else {
                return Err(Error::parse(
                    Format::Cif,
                    tok.line,
                    format!("missing value for {}", tok.text),
                ));
            };
            ret.tags
                .insert(tok.text.to_lowercase(), (tok.line, value.text));
        } else {
            // global_, save frames, and other decorations we don't need
            debug!("skipping CIF token `{}` on line {}", tok.text, tok.line);
        }
    }
    Ok(ret)
}

/// parse a CIF number, dropping a standard uncertainty like `10.234(3)`
fn parse_number(s: &str, line: usize, tag: &str) -> Result<f64, Error> {
    let stripped = s.split('(').next().unwrap_or(s);
    stripped.parse().map_err(|_| {
        Error::parse(
            Format::Cif,
            line,
            format!("invalid number `{s}` for {tag}"),
        )
    })
}

impl DataBlock {
    fn number(&self, tag: &str) -> Result<f64, Error> {
        let Some((line, value)) = self.tags.get(tag) else {
            return Err(Error::parse(Format::Cif, 0, format!("missing {tag}")));
        };
        parse_number(value, *line, tag)
    }

    fn lattice(&self) -> Result<Lattice, Error> {
        Lattice::from_parameters(
            self.number("_cell_length_a")?,
            self.number("_cell_length_b")?,
            self.number("_cell_length_c")?,
            self.number("_cell_angle_alpha")?,
            self.number("_cell_angle_beta")?,
            self.number("_cell_angle_gamma")?,
        )
    }

    fn symops(&self) -> Result<Vec<SymOp>, Error> {
        for tag in SYMOP_TAGS {
            let found =
                self.loops.iter().find_map(|l| Some((l, l.column(tag)?)));
            if let Some((lp, col)) = found {
                return lp.rows().map(|row| row[col].parse()).collect();
            }
            if let Some((_, op)) = self.tags.get(tag) {
                return Ok(vec![op.parse()?]);
            }
        }
        debug!("no symmetry operations found, assuming P1");
        Ok(vec![SymOp::identity()])
    }

    /// the asymmetric unit as (atomic number, fractional position) pairs
    fn sites(&self) -> Result<Vec<(usize, Vec3)>, Error> {
        let Some(lp) = self
            .loops
            .iter()
            .find(|l| l.column("_atom_site_fract_x").is_some())
        else {
            return Err(Error::parse(
                Format::Cif,
                0,
                "missing _atom_site_fract_x loop",
            ));
        };
        let mut cols = [0; 3];
        for (c, tag) in cols.iter_mut().zip([
            "_atom_site_fract_x",
            "_atom_site_fract_y",
            "_atom_site_fract_z",
        ]) {
            *c = lp.column(tag).ok_or_else(|| {
                Error::parse(Format::Cif, lp.line, format!("missing {tag}"))
            })?;
        }
        let symbol = lp
            .column("_atom_site_type_symbol")
            .or_else(|| lp.column("_atom_site_label"))
            .ok_or_else(|| {
                Error::parse(
                    Format::Cif,
                    lp.line,
                    "missing _atom_site_type_symbol and _atom_site_label",
                )
            })?;
        let mut ret = Vec::new();
        for row in lp.rows() {
            let label = &row[symbol];
            let z = element_from_label(label)
                .ok_or_else(|| Error::UnknownElement(label.clone()))?;
            let mut frac = Vec3::zeros();
            for (i, &c) in cols.iter().enumerate() {
                frac[i] = parse_number(&row[c], lp.line, label)?;
            }
            ret.push((z, frac));
        }
        Ok(ret)
    }
}

/// read the full unit cell described by the CIF in `s`, applying every
/// symmetry operation to the asymmetric unit. Atoms are ordered by site, then
/// by symmetry operation
pub(crate) fn read(s: &str) -> Result<Structure, Error> {
    let block = parse_block(tokenize(s)?)?;
    let lattice = block.lattice()?;
    let ops = block.symops()?;
    let sites = block.sites()?;
    debug!(
        "applying {} symmetry operations to {} sites",
        ops.len(),
        sites.len()
    );
    let mut fracs: Vec<(usize, Vec3)> = Vec::new();
    for (z, site) in &sites {
        for op in &ops {
            let f = wrap(&op.apply(site));
            let dup = fracs.iter().any(|(_, g)| {
                let d = f - g;
                let d = d - d.map(f64::round);
                d.amax() < DUPLICATE_TOL
            });
            if !dup {
                fracs.push((*z, f));
            }
        }
    }
    let atoms = fracs
        .iter()
        .map(|(z, f)| Atom::from_position(*z, lattice.to_cartesian(f)))
        .collect();
    Ok(Structure::new(lattice, atoms))
}
