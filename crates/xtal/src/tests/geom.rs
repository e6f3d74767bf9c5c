//! tests for reading and writing molecules

use std::str::FromStr;

use approx::assert_abs_diff_eq;
use tempfile::tempdir;

use crate::*;

#[test]
fn from_xyz() {
    let got = Molecule::from_str(
        "
3
water geometry
 H          0.0000000000        0.7574590974        0.5217905143
 O          0.0000000000        0.0000000000       -0.0657441568
 H          0.0000000000       -0.7574590974        0.5217905143
",
    )
    .unwrap();
    let want = molecule![
        H 0.0000000000 0.7574590974 0.5217905143
        O 0.0000000000 0.0000000000 -0.0657441568
        H 0.0000000000 -0.7574590974 0.5217905143
    ];
    assert_eq!(got, want);
}

#[test]
fn bare_lines() {
    let got = Molecule::from_str(
        "
    			H 0.0000000000 1.4313901416 0.9860410955
			O 0.0000000000 0.0000000000 -0.1242384417
			H 0.0000000000 -1.4313901416 0.9860410955
",
    )
    .unwrap();
    assert_eq!(got.atomic_numbers(), vec![1, 8, 1]);
}

#[test]
fn short_xyz() {
    let err = Molecule::from_str(
        "3
comment
O 0.0 0.0 0.0
H 0.0 0.0 1.0
",
    )
    .unwrap_err();
    assert!(err.to_string().contains("expected 3 atoms"), "{err}");
}

#[test]
fn long_xyz() {
    let err = Molecule::from_str(
        "2
comment
O 0.0 0.0 0.0
H 0.0 0.0 1.0
H 0.0 1.0 0.0
",
    )
    .unwrap_err();
    assert!(
        matches!(err, Error::Parse { line: 1, .. }),
        "wrong error: {err}"
    );
    assert!(err.to_string().contains("expected 2 atoms, found 3"), "{err}");
}

#[test]
fn huge_count() {
    let err = Molecule::from_str(
        "999999999999999999
comment
O 0.0 0.0 0.0
",
    )
    .unwrap_err();
    assert!(err.to_string().contains("found 1"), "{err}");
}

#[test]
fn first_frame() {
    let got = Molecule::from_str(
        "2
step 1
O 0.0 0.0 0.0
H 0.0 0.0 1.0
2
step 2
O 0.0 0.0 0.0
H 0.0 0.0 0.9
",
    )
    .unwrap();
    assert_eq!(got.len(), 2);
    assert_abs_diff_eq!(got.atoms[1].z, 1.0);
}

#[test]
fn bad_coordinate_line() {
    let err = Molecule::from_str(
        "2
comment
O 0.0 0.0 0.0
H 0.0 zero 1.0
",
    )
    .unwrap_err();
    assert!(
        matches!(err, Error::Parse { line: 4, .. }),
        "wrong error: {err}"
    );
}

#[test]
fn xyz_round_trip() {
    let want = molecule![
        C      0.12345678  -1.00000001   2.50000000
        Cl    -3.14159265   2.71828183  -0.00000001
        H     10.00000000   0.00000000  -7.77777777
    ];
    let dir = tempdir().unwrap();
    let path = dir.path().join("mol.xyz");
    want.save_xyz(&path, "round trip").unwrap();
    let got = Molecule::load_xyz(&path).unwrap();
    assert_eq!(got.len(), want.len());
    for (g, w) in got.atoms.iter().zip(&want.atoms) {
        assert_eq!(g.label(), w.label());
        assert_abs_diff_eq!(g.position(), w.position(), epsilon = 1e-6);
    }
    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("3"));
    assert_eq!(lines.next(), Some("round trip"));
}

#[test]
fn formula() {
    let mol = molecule![
        O 0.0 0.0 0.0
        H 0.0 0.0 1.0
        C 0.0 1.0 0.0
        H 1.0 0.0 0.0
        N 1.0 1.0 0.0
    ];
    assert_eq!(mol.formula(), "CH2NO");
    let water = molecule![
        O 0.0 0.0 0.0
        H 0.0 0.0 1.0
        H 1.0 0.0 0.0
    ];
    assert_eq!(water.formula(), "H2O");
}

#[test]
fn infer_format() {
    assert_eq!(Format::infer("a/b/anthracene.CIF"), Some(Format::Cif));
    assert_eq!(Format::infer("POSCAR"), Some(Format::Poscar));
    assert_eq!(Format::infer("run/CONTCAR_relaxed"), Some(Format::Poscar));
    assert_eq!(Format::infer("cell.vasp"), Some(Format::Poscar));
    assert_eq!(Format::infer("mol.xyz"), Some(Format::Xyz));
    assert_eq!(Format::infer("mol.pdb"), None);
    assert!(matches!(
        Structure::load("mol.xyz"),
        Err(Error::UnsupportedFormat(_))
    ));
}
