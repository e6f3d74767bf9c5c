//! Configuration settings for preparing a DDEC6 analysis

use std::{
    fmt::Display,
    fs::read_to_string,
    path::{Path, PathBuf},
};

use anyhow::Context;
use gauss::Gaussian;
use serde::{Deserialize, Serialize};


#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
struct RawExtract {
    /// The periodic structure to extract a molecule from. CIF and POSCAR files
    /// are accepted, and the format is inferred from the file name.
    structure: Option<PathBuf>,

    /// The XYZ file to write the extracted molecule to. Defaults to
    /// `<label>.xyz`.
    output: Option<PathBuf>,

    /// Select the molecule bonded to this atom index.
    seed: Option<usize>,

    /// Select every atom within `radius` Å of this atom index. Requires
    /// `radius`.
    center: Option<usize>,

    radius: Option<f64>,

    /// Select the connected fragment at this position when fragments are
    /// ordered by their lowest atom index. This is the default selection, with
    /// a value of 0, if no other selection is given.
    fragment: Option<usize>,

    /// The number of atoms the extracted molecule should have. A mismatch is
    /// reported as a warning.
    expected_atoms: Option<usize>,

    /// The multiplier applied to the sum of covalent radii when deciding
    /// whether two atoms are bonded. Defaults to 1.0.
    bond_scale: Option<f64>,
}

#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
struct RawOpt {
    /// The XYZ geometry to optimize. Defaults to `extract.output`.
    input: Option<PathBuf>,

    /// The Gaussian input file to write. Defaults to `<label>.com`.
    output: Option<PathBuf>,

    method: Option<String>,
    basis: Option<String>,

    /// The value of the `Opt=` route keyword. Defaults to `Tight`.
    convergence: Option<String>,

    /// The value of the `SCF=` route keyword. Defaults to `XQC`, which falls
    /// back to quadratic convergence when the regular SCF fails.
    scf: Option<String>,

    /// The `%chk` file. Defaults to the stem of `output` with a `.chk`
    /// extension.
    checkpoint: Option<String>,

    /// Additional route keywords. A keyword with the same name as one of the
    /// defaults replaces it.
    keywords: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
struct RawGeom {
    /// The Gaussian log file from the optimization. Defaults to `<label>.log`.
    log: Option<PathBuf>,

    /// The XYZ file to write the optimized geometry to. Defaults to
    /// `optimized.xyz`.
    output: Option<PathBuf>,

    /// Whether a log without normal termination and a converged optimization
    /// is an error. Defaults to true. When false, the problem is only reported
    /// as a warning.
    require_convergence: Option<bool>,
}

#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
struct RawWfn {
    /// The XYZ geometry for the single point. Defaults to `geom.output`.
    input: Option<PathBuf>,

    /// The Gaussian input file to write. Defaults to `<label>_wfn.com`.
    output: Option<PathBuf>,

    method: Option<String>,
    basis: Option<String>,
    checkpoint: Option<String>,

    /// The name of the wavefunction file Gaussian should write. Defaults to
    /// `<label>.wfx`.
    wfx: Option<String>,

    keywords: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    /// The base name for every derived file name. Defaults to `mol1`.
    label: Option<String>,

    /// The molecular charge.
    charge: Option<isize>,

    /// The spin multiplicity.
    multiplicity: Option<usize>,

    /// The Gaussian `%mem` value, like `16GB`.
    mem: Option<String>,

    /// The Gaussian `%nprocshared` value.
    nprocs: Option<usize>,

    #[serde(default)]
    extract: RawExtract,

    #[serde(default)]
    opt: RawOpt,

    #[serde(default)]
    geom: RawGeom,

    #[serde(default)]
    wfn: RawWfn,
}

/// How to pick a molecule out of a periodic structure
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// the atoms bonded to this atom, directly or indirectly
    Seed(usize),

    /// every atom closer than `radius` to `center`
    Radius { center: usize, radius: f64 },

    /// a connected fragment, by position in lowest-atom-index order
    Fragment(usize),
}

impl Default for Selection {
    fn default() -> Self {
        Self::Fragment(0)
    }
}

impl Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selection::Seed(s) => write!(f, "molecule bonded to atom {s}"),
            Selection::Radius { center, radius } => {
                write!(f, "atoms within {radius} Å of atom {center}")
            }
            Selection::Fragment(i) => write!(f, "fragment {i}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Extract {
    pub structure: Option<PathBuf>,
    pub output: PathBuf,
    pub selection: Selection,
    pub expected_atoms: Option<usize>,
    pub bond_scale: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Opt {
    pub input: PathBuf,
    pub output: PathBuf,
    pub method: String,
    pub basis: String,
    pub convergence: String,
    pub scf: String,

    /// the `%chk` file, or `None` to derive it from `output`
    pub checkpoint: Option<String>,
    pub keywords: Vec<String>,
}

impl Opt {
    /// the `%chk` file for the current `output`
    pub fn checkpoint_file(&self) -> String {
        self.checkpoint
            .clone()
            .unwrap_or_else(|| Gaussian::default_checkpoint(&self.output))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Geom {
    pub log: PathBuf,
    pub output: PathBuf,
    pub require_convergence: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Wfn {
    pub input: PathBuf,
    pub output: PathBuf,
    pub method: String,
    pub basis: String,
    pub checkpoint: Option<String>,
    pub wfx: String,
    pub keywords: Vec<String>,
}

impl Wfn {
    pub fn checkpoint_file(&self) -> String {
        self.checkpoint
            .clone()
            .unwrap_or_else(|| Gaussian::default_checkpoint(&self.output))
    }
}

/// Construct a full `Config` using [Config::load] on a TOML file, or start
/// from [Config::default] and set fields directly
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawConfig")]
pub struct Config {
    /// base name for derived file names
    pub label: String,

    /// charge on the molecule
    pub charge: isize,

    pub multiplicity: usize,

    /// memory to request from Gaussian, like `16GB`
    pub mem: String,

    /// processors to request from Gaussian
    pub nprocs: usize,

    pub extract: Extract,
    pub opt: Opt,
    pub geom: Geom,
    pub wfn: Wfn,
}

impl TryFrom<RawConfig> for Config {
    type Error = String;

    fn try_from(rc: RawConfig) -> Result<Self, Self::Error> {
        let label = rc.label.unwrap_or_else(|| String::from("mol1"));

        let ex = rc.extract;
        let selection = match (ex.seed, ex.center, ex.radius, ex.fragment) {
            (None, None, None, None) => Selection::default(),
            (Some(seed), None, None, None) => Selection::Seed(seed),
            (None, Some(center), Some(radius), None) => {
                Selection::Radius { center, radius }
            }
            (None, None, None, Some(i)) => Selection::Fragment(i),
            (None, Some(_), None, None) | (None, None, Some(_), None) => {
                return Err(String::from(
                    "extract.center and extract.radius must be given together",
                ));
            }
            _ => {
                return Err(String::from(
                    "at most one of extract.seed, extract.center/radius, and \
                     extract.fragment may be given",
                ));
            }
        };
        let extract = Extract {
            structure: ex.structure,
            output: ex
                .output
                .unwrap_or_else(|| PathBuf::from(format!("{label}.xyz"))),
            selection,
            expected_atoms: ex.expected_atoms,
            bond_scale: ex.bond_scale.unwrap_or(1.0),
        };

        let opt = Opt {
            input: rc.opt.input.unwrap_or_else(|| extract.output.clone()),
            output: rc
                .opt
                .output
                .unwrap_or_else(|| PathBuf::from(format!("{label}.com"))),
            checkpoint: rc.opt.checkpoint,
            method: rc.opt.method.unwrap_or_else(|| String::from("B3LYP")),
            basis: rc.opt.basis.unwrap_or_else(|| String::from("6-31G(d)")),
            convergence: rc
                .opt
                .convergence
                .unwrap_or_else(|| String::from("Tight")),
            scf: rc.opt.scf.unwrap_or_else(|| String::from("XQC")),
            keywords: rc.opt.keywords.unwrap_or_default(),
        };

        let geom = Geom {
            log: rc
                .geom
                .log
                .unwrap_or_else(|| PathBuf::from(format!("{label}.log"))),
            output: rc
                .geom
                .output
                .unwrap_or_else(|| PathBuf::from("optimized.xyz")),
            require_convergence: rc.geom.require_convergence.unwrap_or(true),
        };

        let wfn = Wfn {
            input: rc.wfn.input.unwrap_or_else(|| geom.output.clone()),
            output: rc
                .wfn
                .output
                .unwrap_or_else(|| PathBuf::from(format!("{label}_wfn.com"))),
            checkpoint: rc.wfn.checkpoint,
            method: rc.wfn.method.unwrap_or_else(|| String::from("B3LYP")),
            basis: rc.wfn.basis.unwrap_or_else(|| String::from("def2TZVP")),
            wfx: rc.wfn.wfx.unwrap_or_else(|| format!("{label}.wfx")),
            keywords: rc.wfn.keywords.unwrap_or_default(),
        };

        if let Selection::Radius { radius, .. } = extract.selection {
            if !radius.is_finite() || radius < 0.0 {
                return Err(format!(
                    "extract.radius must be finite and >= 0, got {radius}"
                ));
            }
        }
        if !extract.bond_scale.is_finite() || extract.bond_scale <= 0.0 {
            return Err(format!(
                "extract.bond_scale must be positive, got {}",
                extract.bond_scale
            ));
        }

        Ok(Self {
            label,
            charge: rc.charge.unwrap_or(0),
            multiplicity: rc.multiplicity.unwrap_or(1),
            mem: rc.mem.unwrap_or_else(|| String::from("16GB")),
            nprocs: rc.nprocs.unwrap_or(16),
            extract,
            opt,
            geom,
            wfn,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        // every field of RawConfig is optional, so the conversion only fails
        // on conflicting settings
        Self::try_from(RawConfig::default()).unwrap()
    }
}

impl Config {
    /// load a [Config] from the TOML file specified by `filename`
    pub fn load(filename: impl AsRef<Path>) -> anyhow::Result<Self> {
        let filename = filename.as_ref();
        let contents = read_to_string(filename).with_context(|| {
            format!("failed to read config file {}", filename.display())
        })?;
        toml::from_str(&contents).with_context(|| {
            format!("failed to deserialize config file {}", filename.display())
        })
    }
}

fn display_path(p: &Option<PathBuf>) -> String {
    match p {
        Some(p) => p.display().to_string(),
        None => String::from("none"),
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Config {
            label,
            charge,
            multiplicity,
            mem,
            nprocs,
            extract,
            opt,
            geom,
            wfn,
        } = self;
        write!(
            f,
            "
Configuration Options:
label = {label}
charge = {charge}
multiplicity = {multiplicity}
mem = {mem}
nprocs = {nprocs}
extract.structure = {}
extract.output = {}
extract.selection = {}
extract.expected_atoms = {:?}
extract.bond_scale = {}
opt.input = {}
opt.output = {}
opt.route = {}/{} Opt={} SCF={} {:?}
opt.checkpoint = {}
geom.log = {}
geom.output = {}
geom.require_convergence = {}
wfn.input = {}
wfn.output = {}
wfn.route = {}/{} {:?}
wfn.checkpoint = {}
wfn.wfx = {}
",
            display_path(&extract.structure),
            extract.output.display(),
            extract.selection,
            extract.expected_atoms,
            extract.bond_scale,
            opt.input.display(),
            opt.output.display(),
            opt.method,
            opt.basis,
            opt.convergence,
            opt.scf,
            opt.keywords,
            opt.checkpoint_file(),
            geom.log.display(),
            geom.output.display(),
            geom.require_convergence,
            wfn.input.display(),
            wfn.output.display(),
            wfn.method,
            wfn.basis,
            wfn.keywords,
            wfn.checkpoint_file(),
            wfn.wfx,
        )
    }
}
