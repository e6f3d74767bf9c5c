//! tests for pulling molecules out of periodic structures

use approx::assert_abs_diff_eq;
use test_case::test_case;

use crate::*;

fn cubic(a: f64) -> Lattice {
    Lattice::from_parameters(a, a, a, 90.0, 90.0, 90.0).unwrap()
}

/// two waters, one split across the x boundary of the cell, and a lone sodium
fn waters() -> Structure {
    Structure::new(
        cubic(10.0),
        vec![
            Atom::new_from_label("O", 0.2, 5.0, 5.0),
            Atom::new_from_label("Na", 5.0, 7.0, 7.0),
            Atom::new_from_label("O", 5.0, 2.0, 2.0),
            Atom::new_from_label("H", 9.5, 5.0, 5.0),
            Atom::new_from_label("H", 5.9, 2.0, 2.0),
            Atom::new_from_label("H", 0.2, 5.9, 5.0),
            Atom::new_from_label("H", 5.0, 2.9, 2.0),
        ],
    )
}

/// every atom bonded to a member of `ext` is itself a member
fn assert_closed(s: &Structure, ext: &Extraction, bonding: &Bonding) {
    for &i in &ext.indices {
        for j in 0..s.len() {
            if bonding.bonded(s, i, j) {
                assert!(
                    ext.indices.contains(&j),
                    "atom {j} is bonded to {i} but missing"
                );
            }
        }
    }
}

#[test_case("testfiles/hexacene.cif"; "cif")]
#[test_case("testfiles/hexacene.POSCAR"; "poscar")]
fn hexacene(path: &str) {
    let s = Structure::load(path).unwrap();
    assert_eq!(s.len(), 42);
    let bonding = Bonding::default();
    let got = s.connected(0, &bonding).unwrap();
    assert_eq!(got.molecule.len(), 42);
    assert_eq!(got.molecule.formula(), "C26H16");
    assert_eq!(got.indices, (0..42).collect::<Vec<_>>());
    assert_closed(&s, &got, &bonding);

    // the molecule straddles the a boundary, so it is only whole if the
    // unwrapped bond vectors match the minimum-image ones
    for i in 0..s.len() {
        for j in i + 1..s.len() {
            let direct = (got.molecule.atoms[j].position()
                - got.molecule.atoms[i].position())
            .norm();
            if bonding.bonded(&s, i, j) {
                assert_abs_diff_eq!(direct, s.distance(i, j), epsilon = 1e-8);
            }
            assert!(direct < 17.0, "atoms {i} and {j} are {direct} Å apart");
        }
    }

    // the seed keeps its original position
    assert_abs_diff_eq!(
        got.molecule.atoms[0].position(),
        s.position(0),
        epsilon = 1e-12
    );
}

#[test]
fn fragments() {
    let s = waters();
    let got = s.fragments(&Bonding::default());
    let want = vec![
        Fragment {
            indices: vec![0, 3, 5],
        },
        Fragment { indices: vec![1] },
        Fragment {
            indices: vec![2, 4, 6],
        },
    ];
    assert_eq!(got, want);
}

#[test]
fn fragment_unwraps() {
    let s = waters();
    let got = s.fragment(0, &Bonding::default()).unwrap();
    assert_eq!(got.indices, vec![0, 3, 5]);
    let want = molecule![
        O  0.2 5.0 5.0
        H -0.5 5.0 5.0
        H  0.2 5.9 5.0
    ];
    assert_abs_diff_eq!(got.molecule, want, epsilon = 1e-10);
    assert_closed(&s, &got, &Bonding::default());
}

#[test]
fn fragment_out_of_range() {
    let s = waters();
    let err = s.fragment(3, &Bonding::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::FragmentOutOfRange {
            index: 3,
            nfrags: 3
        }
    ));
}

#[test]
fn seed_out_of_range() {
    let s = waters();
    assert!(matches!(
        s.connected(7, &Bonding::default()),
        Err(Error::AtomOutOfRange {
            index: 7,
            natoms: 7
        })
    ));
    assert!(matches!(
        s.within_radius(100, 1.0),
        Err(Error::AtomOutOfRange { index: 100, .. })
    ));
}

#[test]
fn bond_scale() {
    let s = waters();
    // shrinking the radii breaks every O-H bond
    let got = s.connected(0, &Bonding::new(0.5)).unwrap();
    assert_eq!(got.indices, vec![0]);
    // while a modest increase still leaves the sodium on its own
    let got = s.connected(1, &Bonding::new(1.2)).unwrap();
    assert_eq!(got.indices, vec![1]);
}

#[test]
fn radius_matches_brute_force() {
    let s = Structure::load("testfiles/hexacene.cif").unwrap();
    for radius in [0.5, 1.5, 2.5, 4.0, 7.5] {
        let got = s.within_radius(10, radius).unwrap();
        let want: Vec<_> = (0..s.len())
            .filter(|&j| j == 10 || s.distance(10, j) < radius)
            .collect();
        assert_eq!(got.indices, want, "radius = {radius}");
        for (k, &j) in got.indices.iter().enumerate() {
            let d = got.molecule.atoms[k].position() - s.position(10);
            assert_abs_diff_eq!(d.norm(), s.distance(10, j), epsilon = 1e-8);
        }
    }
}

#[test]
fn radius_boundary_excluded() {
    // powers of two keep the distances exact
    let lattice = Lattice::new(
        Vec3::new(16.0, 0.0, 0.0),
        Vec3::new(0.0, 16.0, 0.0),
        Vec3::new(0.0, 0.0, 16.0),
    )
    .unwrap();
    let s = Structure::new(
        lattice,
        vec![
            Atom::new_from_label("C", 0.0, 0.0, 0.0),
            Atom::new_from_label("C", 2.0, 0.0, 0.0),
            Atom::new_from_label("C", 0.0, 15.0, 0.0),
        ],
    );
    assert_eq!(s.distance(0, 1), 2.0);
    assert_eq!(s.within_radius(0, 2.0).unwrap().indices, vec![0]);
    assert_eq!(s.within_radius(0, 2.0 + 1e-9).unwrap().indices, vec![0, 1, 2]);
    let got = s.within_radius(0, 1.5).unwrap();
    assert_eq!(got.indices, vec![0, 2]);
    assert_abs_diff_eq!(
        got.molecule.atoms[1].position(),
        Vec3::new(0.0, -1.0, 0.0),
        epsilon = 1e-12
    );
}

#[test]
fn zero_radius() {
    let s = waters();
    let got = s.within_radius(2, 0.0).unwrap();
    assert_eq!(got.indices, vec![2]);
    assert_eq!(got.molecule.len(), 1);
}

#[test_case(-1.0; "negative")]
#[test_case(f64::NAN; "nan")]
#[test_case(f64::INFINITY; "infinite")]
fn invalid_radius(radius: f64) {
    assert!(matches!(
        waters().within_radius(0, radius),
        Err(Error::InvalidRadius(_))
    ));
}

#[test]
fn short_axis() {
    let bonding = Bonding::default();
    assert!(!waters().has_short_axis(&bonding));

    // a chain of carbons 1.5 Å apart in a 3 Å cell bonds each atom to both
    // images of the other
    let chain = Structure::new(
        Lattice::from_parameters(3.0, 10.0, 10.0, 90.0, 90.0, 90.0).unwrap(),
        vec![
            Atom::new_from_label("C", 0.0, 5.0, 5.0),
            Atom::new_from_label("C", 1.5, 5.0, 5.0),
        ],
    );
    assert!(chain.has_short_axis(&bonding));
    assert_eq!(chain.neighbors(&bonding), vec![vec![1], vec![0]]);
}
