//! Prepare a DDEC6 charge and bond-order analysis of one molecule taken out of
//! a molecular crystal. Each stage reads one file and writes one file; the
//! Gaussian jobs in between are run by hand.

use std::{io::Write, path::Path};

use anyhow::{bail, Context};
use gauss::{Gaussian, LogFile, Procedure, Route};
use log::{info, warn};
use xtal::{Bonding, Extraction, Fragment, Molecule, Structure};

use config::{Config, Selection};

pub mod config;


/// the comment line written to optimized geometries
pub const OPTIMIZED_COMMENT: &str = "Optimized geometry from Gaussian";

fn load_structure(config: &Config) -> anyhow::Result<(Structure, &Path)> {
    let Some(path) = config.extract.structure.as_deref() else {
        bail!(
            "no periodic structure given; set extract.structure or use --input"
        );
    };
    let s = Structure::load(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    if s.is_empty() {
        bail!("{} contains no atoms", path.display());
    }
    Ok((s, path))
}

/// extract the molecule selected by `config.extract` and write it to
/// `config.extract.output`
pub fn extract(config: &Config) -> anyhow::Result<Extraction> {
    let ex = &config.extract;
    let (structure, path) = load_structure(config)?;
    let bonding = Bonding::new(ex.bond_scale);
    let ret = match ex.selection {
        Selection::Seed(seed) => structure.connected(seed, &bonding),
        Selection::Radius { center, radius } => {
            structure.within_radius(center, radius)
        }
        Selection::Fragment(i) => structure.fragment(i, &bonding),
    }
    .with_context(|| {
        format!("failed to select the {} in {}", ex.selection, path.display())
    })?;

    let natoms = ret.molecule.len();
    if let Some(want) = ex.expected_atoms {
        if natoms != want {
            warn!(
                "extracted {natoms} atoms from {}, expected {want}. check the \
                 selection and bond_scale",
                path.display()
            );
        }
    }

    let comment = format!("{} from {}", ex.selection, path.display());
    ret.molecule
        .save_xyz(&ex.output, &comment)
        .with_context(|| format!("failed to write {}", ex.output.display()))?;
    info!(
        "wrote {natoms} atoms ({}) to {}",
        ret.molecule.formula(),
        ex.output.display()
    );
    Ok(ret)
}

/// write a table of every connected fragment in `config.extract.structure` to
/// `w`
pub fn fragments(
    config: &Config,
    w: &mut impl Write,
) -> anyhow::Result<Vec<Fragment>> {
    let (structure, path) = load_structure(config)?;
    let frags = structure.fragments(&Bonding::new(config.extract.bond_scale));
    info!("found {} fragments in {}", frags.len(), path.display());
    writeln!(
        w,
        "{:>5} {:>6} {:<12} {:>10}",
        "index", "atoms", "formula", "first atom"
    )?;
    for (i, frag) in frags.iter().enumerate() {
        let mol = Molecule::new(
            frag.indices.iter().map(|&j| structure.atoms[j]).collect(),
        );
        writeln!(
            w,
            "{i:>5} {:>6} {:<12} {:>10}",
            frag.indices.len(),
            mol.formula(),
            frag.indices[0]
        )?;
    }
    Ok(frags)
}

fn load_molecule(path: &Path) -> anyhow::Result<Molecule> {
    let mol = Molecule::load_xyz(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    if mol.is_empty() {
        bail!("{} contains no atoms", path.display());
    }
    Ok(mol)
}

/// a route for `method` and `basis` with the `defaults` keywords, overridden
/// and extended by `extra`
fn route(
    method: &str,
    basis: &str,
    defaults: &[String],
    extra: &[String],
) -> Route {
    let mut ret = Route::new(method, basis);
    for kw in defaults.iter().chain(extra) {
        ret.set(kw.as_str());
    }
    ret
}

/// write the Gaussian geometry optimization input described by `config.opt`
pub fn opt_input(config: &Config) -> anyhow::Result<Gaussian> {
    let opt = &config.opt;
    let mol = load_molecule(&opt.input)?;
    let route = route(
        &opt.method,
        &opt.basis,
        &[
            format!("Opt={}", opt.convergence),
            format!("SCF={}", opt.scf),
        ],
        &opt.keywords,
    );
    let mut job = Gaussian::new(
        &opt.output,
        route,
        config.charge,
        config.multiplicity,
        mol,
    );
    job.checkpoint = Some(opt.checkpoint_file());
    job.mem = config.mem.clone();
    job.nprocs = config.nprocs;
    job.title = format!("{} geometry optimization", config.label);
    job.write_input(Procedure::Opt)
        .with_context(|| format!("failed to write {}", opt.output.display()))?;
    Ok(job)
}

/// write the last geometry in `config.geom.log` to `config.geom.output`
pub fn geom(config: &Config) -> anyhow::Result<Molecule> {
    let g = &config.geom;
    let log = LogFile::load(&g.log)
        .with_context(|| format!("failed to read {}", g.log.display()))?;
    if let Err(e) = log.check() {
        if g.require_convergence {
            return Err(e).with_context(|| {
                format!(
                    "{} is not a converged optimization. set \
                     geom.require_convergence = false to use its last \
                     geometry anyway",
                    g.log.display()
                )
            });
        }
        warn!("{e}; writing its last geometry anyway");
    }
    let mol = log.last_frame().clone();

    // the optimization should not change the number of atoms
    if let Ok(input) = Molecule::load_xyz(&config.opt.input) {
        if input.len() != mol.len() {
            warn!(
                "{} has {} atoms, but the optimization input {} has {}",
                g.log.display(),
                mol.len(),
                config.opt.input.display(),
                input.len()
            );
        }
    }

    mol.save_xyz(&g.output, OPTIMIZED_COMMENT)
        .with_context(|| format!("failed to write {}", g.output.display()))?;
    info!("wrote {} atoms to {}", mol.len(), g.output.display());
    Ok(mol)
}

/// write the Gaussian single-point input described by `config.wfn`, requesting
/// a `.wfx` wavefunction file
pub fn wfn_input(config: &Config) -> anyhow::Result<Gaussian> {
    let wfn = &config.wfn;
    let mol = load_molecule(&wfn.input)?;
    let route = route(
        &wfn.method,
        &wfn.basis,
        &[String::from("Density=Current"), String::from("Pop=Full")],
        &wfn.keywords,
    );
    let mut job = Gaussian::new(
        &wfn.output,
        route,
        config.charge,
        config.multiplicity,
        mol,
    );
    job.checkpoint = Some(wfn.checkpoint_file());
    job.mem = config.mem.clone();
    job.nprocs = config.nprocs;
    job.title = format!("{} wavefunction", config.label);
    job.wfx = Some(wfn.wfx.clone());
    job.write_input(Procedure::SinglePt)
        .with_context(|| format!("failed to write {}", wfn.output.display()))?;
    Ok(job)
}
