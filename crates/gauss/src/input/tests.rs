use insta::assert_snapshot;
use tempfile::tempdir;
use xtal::{molecule, Molecule};

use super::*;

fn water() -> Molecule {
    molecule![
        O 0.0000000000 0.0000000000 -0.0657441568
        H 0.0000000000 0.7574590974 0.5217905143
        H 0.0000000000 -0.7574590974 0.5217905143
    ]
}

fn opt_job(filename: impl Into<PathBuf>) -> Gaussian {
    let route = Route::new("B3LYP", "6-31G(d)")
        .with("Opt=Tight")
        .with("SCF=XQC");
    let mut ret = Gaussian::new(filename, route, 0, 1, water());
    ret.checkpoint = Some(String::from("mol1.chk"));
    ret.title = String::from("mol1 geometry optimization");
    ret
}

fn wfn_job() -> Gaussian {
    let route = Route::new("B3LYP", "def2TZVP")
        .with("Density=Current")
        .with("Pop=Full");
    let mut ret = Gaussian::new("mol1_wfn.com", route, 0, 1, water());
    ret.checkpoint = Some(String::from("mol1_wfn.chk"));
    ret.title = String::from("mol1 wavefunction");
    ret.wfx = Some(String::from("mol1.wfx"));
    ret
}

#[test]
fn opt_input() {
    let got = opt_job("mol1.com").input(Procedure::Opt).to_string();
    assert_snapshot!(got);
}

#[test]
fn wfn_input() {
    let got = wfn_job().input(Procedure::SinglePt).to_string();
    assert_snapshot!(got);
}

#[test]
fn write_is_deterministic() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.com");
    let b = dir.path().join("b.com");
    opt_job(&a).write_input(Procedure::Opt).unwrap();
    opt_job(&b).write_input(Procedure::Opt).unwrap();
    let a = std::fs::read(a).unwrap();
    let b = std::fs::read(b).unwrap();
    assert!(!a.is_empty());
    assert_eq!(a, b);
}

#[test]
fn route_line() {
    let got = opt_job("mol1.com").input(Procedure::Opt).to_string();
    let route = got.lines().find(|l| l.starts_with('#')).unwrap();
    assert!(route.contains("B3LYP"));
    assert!(route.contains("6-31G(d)"));
    assert_eq!(got.lines().filter(|l| l.starts_with('#')).count(), 1);
}

/// the lines of the first section following the molecule specification
fn section_after_geom(input: &str, natoms: usize) -> Vec<&str> {
    let lines: Vec<_> = input.lines().collect();
    let charge = lines.iter().position(|l| *l == "0 1").unwrap();
    let blank = charge + natoms + 1;
    assert_eq!(lines[blank], "", "molecule specification is not terminated");
    lines[blank + 1..]
        .iter()
        .take_while(|l| !l.is_empty())
        .copied()
        .collect()
}

#[test]
fn wfx_section_once() {
    let mut job = wfn_job();
    // asking for Output=WFX explicitly must not duplicate anything
    job.route.set("output=wfx");
    job.title = String::from("  spaced\n\ntitle  ");
    let got = job.input(Procedure::SinglePt).to_string();
    assert_eq!(got.matches("mol1.wfx").count(), 1);
    assert_eq!(got.to_lowercase().matches("output=wfx").count(), 1);
    assert_eq!(section_after_geom(&got, 3), vec!["mol1.wfx"]);
    // the title collapses onto one line, so the section count is unchanged
    assert!(got.contains("\nspaced title\n"));
    assert!(got.ends_with("mol1.wfx\n\n"));
}

#[test]
fn no_wfx_without_name() {
    let mut job = opt_job("mol1.com");
    job.route.set("Output=WFX");
    let got = job.input(Procedure::SinglePt);
    assert!(got.route.get("output").is_none());
    assert!(got.sections.is_empty());
}

#[test]
fn procedure_keywords() {
    let got = opt_job("x.com").input(Procedure::SinglePt);
    assert!(got.route.get("opt").is_none());
    assert_eq!(got.route.keywords()[0], Keyword::new("SP"));

    let mut job = wfn_job();
    job.wfx = None;
    job.route.set("SP");
    let got = job.input(Procedure::Opt);
    assert!(got.route.get("sp").is_none());
    assert_eq!(got.route.get("opt"), Some(&Keyword::new("Opt")));
}

#[test]
fn keywords_dedup() {
    let route = Route::new("B3LYP", "6-31G(d)")
        .with("opt=tight")
        .with("Pop=Full")
        .with("Opt(VeryTight,MaxCycles=200)");
    assert_eq!(
        route.to_string(),
        "#P B3LYP/6-31G(d) Opt(VeryTight,MaxCycles=200) Pop=Full"
    );
    let kw = Keyword::new(" Output=WFX ");
    assert_eq!(kw.name(), "output");
    assert_eq!(kw.option().as_deref(), Some("wfx"));
    assert_eq!(Keyword::new("SP").option(), None);
}

#[test]
fn checkpoint_name() {
    assert_eq!(Gaussian::default_checkpoint("run/mol1.com"), "mol1.chk");
    assert_eq!(Gaussian::default_checkpoint("job"), "job.chk");
}
