use std::{
    fmt::{Display, Write as _},
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use log::info;
use serde::{Deserialize, Serialize};
use xtal::Molecule;

#[cfg(test)]
mod tests;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Procedure {
    Opt,
    SinglePt,
}

/// A single route keyword like `Opt=Tight`, `Pop=Full`, or `Opt(Tight,
/// MaxCycles=100)`. Keywords are identified by the case-insensitive name
/// before any `=` or `(`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Keyword(String);

impl Keyword {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_owned())
    }

    /// the lowercased name of the keyword
    pub fn name(&self) -> String {
        self.0
            .split(['=', '('])
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }

    /// the lowercased option following the name, if any
    pub fn option(&self) -> Option<String> {
        let rest = &self.0[self.0.find(['=', '('])?..];
        Some(
            rest.trim_start_matches('=')
                .trim_matches(|c| c == '(' || c == ')')
                .to_lowercase(),
        )
    }

    pub fn is(&self, name: &str) -> bool {
        self.name() == name.to_lowercase()
    }
}

impl From<String> for Keyword {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Keyword {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<Keyword> for String {
    fn from(value: Keyword) -> Self {
        value.0
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The route section: a level of theory and the job keywords that follow it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub method: String,
    pub basis: String,
    keywords: Vec<Keyword>,
}

impl Route {
    pub fn new(method: impl Into<String>, basis: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            basis: basis.into(),
            keywords: Vec::new(),
        }
    }

    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    /// set `kw`, replacing any existing keyword with the same name in place
    pub fn set(&mut self, kw: impl Into<Keyword>) {
        let kw = kw.into();
        let name = kw.name();
        match self.keywords.iter().position(|k| k.name() == name) {
            Some(i) => self.keywords[i] = kw,
            None => self.keywords.push(kw),
        }
    }

    /// builder version of [Route::set]
    pub fn with(mut self, kw: impl Into<Keyword>) -> Self {
        self.set(kw);
        self
    }

    /// set `kw` unless a keyword with the same name is already present
    pub fn set_default(&mut self, kw: impl Into<Keyword>) {
        let kw = kw.into();
        if self.get(&kw.name()).is_none() {
            self.keywords.push(kw);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Keyword> {
        self.keywords.iter().find(|k| k.is(name))
    }

    pub fn remove(&mut self, name: &str) {
        self.keywords.retain(|k| !k.is(name));
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#P {}/{}", self.method, self.basis)?;
        for kw in &self.keywords {
            write!(f, " {kw}")?;
        }
        Ok(())
    }
}

/// A complete Gaussian input file, built section by section. Rendering
/// separates the sections with single blank lines and ends the file with the
/// blank line Gaussian requires
#[derive(Clone, Debug, PartialEq)]
pub struct Input {
    /// Link 0 commands, written as `%key=value`
    pub link0: Vec<(String, String)>,
    pub route: Route,
    pub title: String,
    pub charge: isize,
    pub multiplicity: usize,
    pub geom: Molecule,

    /// additional input sections following the molecule specification, such
    /// as the file name requested by `Output=WFX`
    pub sections: Vec<String>,
}

/// format the atoms of `geom` for a molecule specification
pub fn geom_string(geom: &Molecule) -> String {
    let mut ret = String::with_capacity(50 * geom.atoms.len());
    for atom in &geom.atoms {
        writeln!(
            ret,
            "{:5}{:15.10}{:15.10}{:15.10}",
            atom.label(),
            atom.x,
            atom.y,
            atom.z,
        )
        .unwrap();
    }
    ret
}

impl Display for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (key, value) in &self.link0 {
            writeln!(f, "%{key}={value}")?;
        }
        writeln!(f, "{}", self.route)?;
        writeln!(f)?;
        // a blank title would end the section early
        let title = self.title.split_whitespace().collect::<Vec<_>>().join(" ");
        writeln!(
            f,
            "{}",
            if title.is_empty() { "title" } else { title.as_str() }
        )?;
        writeln!(f)?;
        writeln!(f, "{} {}", self.charge, self.multiplicity)?;
        write!(f, "{}", geom_string(&self.geom))?;
        writeln!(f)?;
        for section in &self.sections {
            writeln!(f, "{}", section.trim_end())?;
            writeln!(f)?;
        }
        Ok(())
    }
}

/// A Gaussian job: everything needed to write one input file
#[derive(Clone, Debug, PartialEq)]
pub struct Gaussian {
    /// the input file to write, including its extension
    pub filename: PathBuf,

    /// value of `%chk`, if any
    pub checkpoint: Option<String>,

    /// value of `%mem`, like `16GB`
    pub mem: String,

    /// value of `%nprocshared`
    pub nprocs: usize,

    pub route: Route,
    pub title: String,
    pub charge: isize,
    pub multiplicity: usize,
    pub geom: Molecule,

    /// the wavefunction file to request with `Output=WFX`
    pub wfx: Option<String>,
}

impl Gaussian {
    pub fn new(
        filename: impl Into<PathBuf>,
        route: Route,
        charge: isize,
        multiplicity: usize,
        geom: Molecule,
    ) -> Self {
        Self {
            filename: filename.into(),
            checkpoint: None,
            mem: String::from("16GB"),
            nprocs: 16,
            route,
            title: String::from("title"),
            charge,
            multiplicity,
            geom,
            wfx: None,
        }
    }

    /// assemble the [Input] for `proc`. An `Opt` keyword is added to
    /// optimizations that lack one and removed from single points, which get
    /// an `SP` keyword instead. When `self.wfx` is set, `Output=WFX` is added
    /// to the route and the file name becomes the first section after the
    /// molecule specification, exactly once
    pub fn input(&self, proc: Procedure) -> Input {
        let mut route = self.route.clone();
        match proc {
            Procedure::Opt => {
                route.remove("sp");
                route.set_default("Opt");
            }
            Procedure::SinglePt => {
                route.remove("opt");
                if route.get("sp").is_none() {
                    // SP conventionally leads the job keywords
                    route.keywords.insert(0, Keyword::new("SP"));
                }
            }
        }
        let mut sections = Vec::new();
        match &self.wfx {
            Some(wfx) => {
                route.set("Output=WFX");
                sections.push(wfx.clone());
            }
            None => {
                if route.get("output").is_some_and(|k| {
                    k.option().as_deref() == Some("wfx")
                }) {
                    log::warn!(
                        "Output=WFX requested without a wavefunction file \
                         name; dropping it from the route"
                    );
                    route.remove("output");
                }
            }
        }

        let mut link0 = Vec::new();
        if let Some(chk) = &self.checkpoint {
            link0.push(("chk".to_owned(), chk.clone()));
        }
        link0.push(("mem".to_owned(), self.mem.clone()));
        link0.push(("nprocshared".to_owned(), self.nprocs.to_string()));

        Input {
            link0,
            route,
            title: self.title.clone(),
            charge: self.charge,
            multiplicity: self.multiplicity,
            geom: self.geom.clone(),
            sections,
        }
    }

    /// write the input file for `proc` to `self.filename`
    pub fn write_input(&self, proc: Procedure) -> std::io::Result<()> {
        let input = self.input(proc);
        let mut file = File::create(&self.filename)?;
        write!(file, "{input}")?;
        info!(
            "wrote {} input for {} atoms to {}",
            match proc {
                Procedure::Opt => "optimization",
                Procedure::SinglePt => "single-point",
            },
            self.geom.len(),
            self.filename.display()
        );
        Ok(())
    }

    /// the checkpoint name Gaussian would derive for `filename`: its stem
    /// with a `.chk` extension
    pub fn default_checkpoint(filename: impl AsRef<Path>) -> String {
        let stem = filename
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| String::from("job"));
        format!("{stem}.chk")
    }
}
