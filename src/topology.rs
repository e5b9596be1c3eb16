//! Distance-heuristic bond inference and chain/residue topology.
//!
//! Used when a structure carries no explicit CONECT connectivity, which is
//! the common case for visualization-only input. The heuristic is
//! deliberately simple: intra-residue all-pairs within a covalent cutoff,
//! canonical peptide linking between consecutive residues, and two
//! progressively looser fallbacks so geometry is never left empty while
//! atoms exist.

use glam::DVec3;
use log::{debug, warn};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::structure::{Atom, Bond, StructureData};

/// Distance thresholds for bond inference.
///
/// Thresholds are squared Angstrom distances; comparisons avoid the sqrt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopologyParams {
    /// Squared covalent-bond cutoff for intra-residue pairs (and the grid
    /// fallback). Default 2.0.
    pub covalent_sq: f64,
    /// Squared cutoff for the closest-pair backbone link between consecutive
    /// residues. Looser than the covalent cutoff because backbone spacing
    /// and missing atoms need more tolerance. Default 25.0 (5 A).
    pub backbone_sq: f64,
}

impl Default for TopologyParams {
    fn default() -> Self {
        Self {
            covalent_sq: 2.0,
            backbone_sq: 25.0,
        }
    }
}

/// Infer bonds from atom coordinates using the default thresholds.
#[must_use]
pub fn infer_bonds(atoms: &[Atom]) -> Vec<Bond> {
    infer_bonds_with(atoms, &TopologyParams::default())
}

/// Infer bonds from atom coordinates.
///
/// 1. Intra-residue all-pairs within the covalent cutoff (residues are
///    small, so the per-residue O(n^2) is fine).
/// 2. Backbone links between consecutive residues of the same chain,
///    grouped per chain so interleaved chain records still pair up:
///    the canonical `C` -> `N` peptide bond when both atoms exist,
///    otherwise the closest pair within the backbone cutoff.
/// 3. If nothing bonded (e.g. residue metadata is missing), a uniform
///    spatial hash grid over all atoms applies the covalent cutoff in
///    near-linear time.
/// 4. If still nothing, consecutive atoms of each chain are linked
///    sequentially, ignoring distance, as a last-resort visualization aid.
#[must_use]
pub fn infer_bonds_with(atoms: &[Atom], params: &TopologyParams) -> Vec<Bond> {
    if atoms.is_empty() {
        return Vec::new();
    }

    let structure = StructureData {
        atoms: atoms.to_vec(),
        ..Default::default()
    };
    let residues = structure.residues();

    let mut seen: FxHashSet<(i32, i32)> = FxHashSet::default();
    let mut bonds: Vec<Bond> = Vec::new();
    let mut push = |bonds: &mut Vec<Bond>, seen: &mut FxHashSet<(i32, i32)>, bond: Bond| {
        if !bond.is_self_bond() && seen.insert(bond.key()) {
            bonds.push(bond);
        }
    };

    // Intra-residue pairs.
    for residue in &residues {
        let indices = &residue.atom_indices;
        for i in 0..indices.len() {
            for j in (i + 1)..indices.len() {
                let a = &atoms[indices[i]];
                let b = &atoms[indices[j]];
                if a.position.distance_squared(b.position) <= params.covalent_sq {
                    push(
                        &mut bonds,
                        &mut seen,
                        Bond {
                            a: a.serial,
                            b: b.serial,
                        },
                    );
                }
            }
        }
    }

    // Backbone links between consecutive residues of the same chain.
    // Residues are regrouped per chain first: chains may interleave in
    // file order, and a chain's consecutive residues must still link.
    let mut chain_order: Vec<&str> = Vec::new();
    let mut chain_residues: FxHashMap<&str, Vec<usize>> = FxHashMap::default();
    for (i, residue) in residues.iter().enumerate() {
        let entry = chain_residues.entry(residue.chain_id.as_str()).or_default();
        if entry.is_empty() {
            chain_order.push(&residue.chain_id);
        }
        entry.push(i);
    }
    for chain_id in chain_order {
        let Some(indices) = chain_residues.get(chain_id) else {
            continue;
        };
        for pair in indices.windows(2) {
            let (curr, next) = (&residues[pair[0]], &residues[pair[1]]);
            if next.res_seq - curr.res_seq != 1 {
                continue;
            }
            if let Some(bond) = backbone_link(atoms, &curr.atom_indices, &next.atom_indices, params)
            {
                push(&mut bonds, &mut seen, bond);
            }
        }
    }

    if !bonds.is_empty() {
        return bonds;
    }

    // Fallback: spatial hash grid over all atoms.
    debug!("residue-based inference found no bonds; trying spatial grid");
    let grid_bonds = grid_bonds(atoms, params.covalent_sq);
    if !grid_bonds.is_empty() {
        return grid_bonds;
    }

    // Last resort: sequential chain linking, ignoring distance.
    warn!("no bonds within distance thresholds; linking atoms sequentially");
    sequential_bonds(atoms)
}

/// Pick the bond linking two consecutive residues.
///
/// Prefers the canonical peptide bond (`C` of the first residue to `N` of
/// the second). Otherwise takes the closest pair within the backbone
/// cutoff; equal distances are broken by the lexicographically smaller
/// atom-name pairing so output is reproducible.
fn backbone_link(
    atoms: &[Atom],
    curr: &[usize],
    next: &[usize],
    params: &TopologyParams,
) -> Option<Bond> {
    let c = curr.iter().find(|&&i| atoms[i].name == "C");
    let n = next.iter().find(|&&i| atoms[i].name == "N");
    if let (Some(&ci), Some(&ni)) = (c, n) {
        return Some(Bond {
            a: atoms[ci].serial,
            b: atoms[ni].serial,
        });
    }

    let mut best: Option<(f64, (String, String), Bond)> = None;
    for &i in curr {
        for &j in next {
            let d2 = atoms[i].position.distance_squared(atoms[j].position);
            if d2 > params.backbone_sq {
                continue;
            }
            let names = (atoms[i].name.clone(), atoms[j].name.clone());
            let replace = match &best {
                None => true,
                Some((best_d2, best_names, _)) => {
                    d2 < *best_d2 || (d2 == *best_d2 && names < *best_names)
                }
            };
            if replace {
                best = Some((
                    d2,
                    names,
                    Bond {
                        a: atoms[i].serial,
                        b: atoms[j].serial,
                    },
                ));
            }
        }
    }
    best.map(|(_, _, bond)| bond)
}

/// Bond any atom pair within the covalent cutoff using a uniform hash grid
/// (cell size = cutoff distance), examining only same/adjacent cells.
fn grid_bonds(atoms: &[Atom], covalent_sq: f64) -> Vec<Bond> {
    let cell = covalent_sq.sqrt().max(f64::EPSILON);
    let key_of = |p: DVec3| -> (i64, i64, i64) {
        (
            (p.x / cell).floor() as i64,
            (p.y / cell).floor() as i64,
            (p.z / cell).floor() as i64,
        )
    };

    let mut grid: FxHashMap<(i64, i64, i64), Vec<usize>> = FxHashMap::default();
    for (i, atom) in atoms.iter().enumerate() {
        grid.entry(key_of(atom.position)).or_default().push(i);
    }

    let mut seen: FxHashSet<(i32, i32)> = FxHashSet::default();
    let mut bonds = Vec::new();
    for (i, atom) in atoms.iter().enumerate() {
        let (cx, cy, cz) = key_of(atom.position);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(neighbors) = grid.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &j in neighbors {
                        if j == i {
                            continue;
                        }
                        let other = &atoms[j];
                        if atom.position.distance_squared(other.position) <= covalent_sq {
                            let bond = Bond {
                                a: atom.serial,
                                b: other.serial,
                            };
                            if !bond.is_self_bond() && seen.insert(bond.key()) {
                                bonds.push(bond);
                            }
                        }
                    }
                }
            }
        }
    }
    bonds
}

/// Link each atom to the next atom of the same chain in input order.
fn sequential_bonds(atoms: &[Atom]) -> Vec<Bond> {
    let mut last_in_chain: FxHashMap<&str, usize> = FxHashMap::default();
    let mut bonds = Vec::new();
    for (i, atom) in atoms.iter().enumerate() {
        if let Some(&prev) = last_in_chain.get(atom.chain_id.as_str()) {
            let bond = Bond {
                a: atoms[prev].serial,
                b: atom.serial,
            };
            if !bond.is_self_bond() {
                bonds.push(bond);
            }
        }
        let _ = last_in_chain.insert(atom.chain_id.as_str(), i);
    }
    bonds
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    fn atom(serial: i32, name: &str, chain: &str, seq: i32, pos: (f64, f64, f64)) -> Atom {
        Atom {
            serial,
            name: name.to_owned(),
            res_name: "ALA".to_owned(),
            chain_id: chain.to_owned(),
            res_seq: seq,
            position: DVec3::new(pos.0, pos.1, pos.2),
            occupancy: 1.0,
            temp_factor: 0.0,
            element: name.chars().next().map(String::from).unwrap_or_default(),
        }
    }

    #[test]
    fn bonds_close_intra_residue_pairs_exactly_once() {
        // distance^2 = 1.96 <= 2.0
        let atoms = vec![
            atom(1, "CA", "A", 1, (0.0, 0.0, 0.0)),
            atom(2, "CB", "A", 1, (1.4, 0.0, 0.0)),
        ];
        let bonds = infer_bonds(&atoms);
        assert_eq!(bonds.len(), 1);
        assert_eq!(bonds[0].key(), (1, 2));

        // Order-independent.
        let reversed: Vec<Atom> = atoms.into_iter().rev().collect();
        let bonds = infer_bonds(&reversed);
        assert_eq!(bonds.len(), 1);
        assert_eq!(bonds[0].key(), (1, 2));
    }

    #[test]
    fn distant_intra_residue_pairs_are_not_bonded() {
        let atoms = vec![
            atom(1, "CA", "A", 1, (0.0, 0.0, 0.0)),
            atom(2, "CB", "A", 1, (1.5, 0.0, 0.0)), // d^2 = 2.25 > 2.0
        ];
        // Distance-based steps find nothing; the sequential fallback links
        // the two chain-mates instead.
        let bonds = infer_bonds(&atoms);
        assert_eq!(bonds.len(), 1);
    }

    #[test]
    fn canonical_peptide_bond_links_consecutive_residues() {
        let atoms = vec![
            atom(1, "N", "A", 1, (0.0, 0.0, 0.0)),
            atom(2, "CA", "A", 1, (1.4, 0.0, 0.0)),
            atom(3, "C", "A", 1, (2.8, 0.0, 0.0)),
            atom(4, "N", "A", 2, (4.1, 0.0, 0.0)),
            atom(5, "CA", "A", 2, (5.5, 0.0, 0.0)),
        ];
        let bonds = infer_bonds(&atoms);
        let keys: Vec<(i32, i32)> = bonds.iter().map(Bond::key).collect();
        assert!(keys.contains(&(3, 4)), "expected C->N peptide bond: {keys:?}");
    }

    #[test]
    fn interleaved_chain_records_keep_backbone_links() {
        // Chain B's residue sits between chain A's two residues in file
        // order; A's peptide bond must survive the interleaving.
        let atoms = vec![
            atom(1, "CA", "A", 1, (0.0, 0.0, 0.0)),
            atom(2, "C", "A", 1, (1.4, 0.0, 0.0)),
            atom(3, "CA", "B", 1, (20.0, 0.0, 0.0)),
            atom(4, "N", "B", 1, (21.4, 0.0, 0.0)),
            atom(5, "N", "A", 2, (2.73, 0.0, 0.0)),
            atom(6, "CA", "A", 2, (4.13, 0.0, 0.0)),
        ];
        let bonds = infer_bonds(&atoms);
        let keys: Vec<(i32, i32)> = bonds.iter().map(Bond::key).collect();
        assert!(keys.contains(&(2, 5)), "expected C->N peptide bond: {keys:?}");
        // Intra-residue pairs are still present.
        assert!(keys.contains(&(1, 2)));
        assert!(keys.contains(&(3, 4)));
        assert!(keys.contains(&(5, 6)));
    }

    #[test]
    fn ca_only_trace_uses_closest_pair_backbone_rule() {
        // Two CA-only residues 3.8 A apart: the canonical C/N atoms are
        // absent, so the looser closest-pair rule applies.
        let atoms = vec![
            atom(1, "CA", "A", 1, (11.104, 13.207, 2.123)),
            atom(2, "CA", "A", 2, (11.104 + 3.8, 13.207, 2.123)),
        ];
        let bonds = infer_bonds(&atoms);
        assert_eq!(bonds.len(), 1);
        assert_eq!(bonds[0].key(), (1, 2));
    }

    #[test]
    fn backbone_rule_respects_five_angstrom_cutoff() {
        let atoms = vec![
            atom(1, "CA", "A", 1, (0.0, 0.0, 0.0)),
            atom(2, "CA", "A", 2, (5.1, 0.0, 0.0)), // d^2 = 26.01 > 25
        ];
        // Closest-pair rule rejects the gap; sequential fallback still
        // links the chain so geometry is not empty.
        let bonds = infer_bonds(&atoms);
        assert_eq!(bonds.len(), 1);
    }

    #[test]
    fn closest_pair_tie_breaks_on_atom_names() {
        // Two equidistant candidate pairs; the lexicographically smaller
        // name pairing must win deterministically.
        let atoms = vec![
            atom(1, "CB", "A", 1, (0.0, 1.0, 0.0)),
            atom(2, "CA", "A", 1, (0.0, -1.0, 0.0)),
            atom(3, "CB", "A", 2, (3.0, 1.0, 0.0)),
            atom(4, "CA", "A", 2, (3.0, -1.0, 0.0)),
        ];
        let bonds = infer_bonds(&atoms);
        // CA-CA (2-4) and CB-CB (1-3) both have d^2 = 9; ("CA","CA") sorts
        // before ("CB","CB").
        let backbone: Vec<(i32, i32)> = bonds.iter().map(Bond::key).collect();
        assert!(backbone.contains(&(2, 4)), "got {backbone:?}");
        assert!(!backbone.contains(&(1, 3)));
    }

    #[test]
    fn grid_fallback_bonds_atoms_without_residue_metadata() {
        // Every atom sits in its own chain, so the residue-based steps
        // find nothing, but spatially adjacent atoms are within the
        // covalent cutoff.
        let atoms = vec![
            atom(1, "X1", "A", 10, (0.0, 0.0, 0.0)),
            atom(2, "X2", "B", 20, (1.0, 0.0, 0.0)),
            atom(3, "X3", "C", 30, (2.0, 0.0, 0.0)),
            atom(4, "X4", "D", 40, (50.0, 0.0, 0.0)),
        ];
        let bonds = infer_bonds(&atoms);
        let keys: Vec<(i32, i32)> = bonds.iter().map(Bond::key).collect();
        assert!(keys.contains(&(1, 2)));
        assert!(keys.contains(&(2, 3)));
        assert!(!keys.iter().any(|k| k.0 == 4 || k.1 == 4));
    }

    #[test]
    fn sequential_fallback_never_leaves_atoms_unlinked() {
        let atoms = vec![
            atom(1, "CA", "A", 1, (0.0, 0.0, 0.0)),
            atom(2, "CA", "A", 5, (100.0, 0.0, 0.0)),
            atom(3, "CA", "B", 1, (200.0, 0.0, 0.0)),
            atom(4, "CA", "B", 7, (300.0, 0.0, 0.0)),
        ];
        let bonds = infer_bonds(&atoms);
        let keys: Vec<(i32, i32)> = bonds.iter().map(Bond::key).collect();
        assert_eq!(keys, vec![(1, 2), (3, 4)]);
    }

    #[test]
    fn empty_input_yields_no_bonds() {
        assert!(infer_bonds(&[]).is_empty());
    }
}
