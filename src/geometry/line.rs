//! Line-segment geometry: one independent segment per bond.

use log::warn;

use crate::structure::{Atom, Bond};

use super::{ChainPalette, PrimitiveKind, RenderableGeometry};

/// Build line-segment geometry from atoms and bonds.
///
/// Each bond emits two position entries (duplicated endpoints, drawn as
/// independent pairs rather than a polyline) and two matching color entries
/// using the chain color of the first endpoint. Bonds referencing unknown
/// serials are skipped with a warning. Degenerate input (no atoms, or no
/// drawable bond) yields the diagnostic fallback mesh.
#[must_use]
pub fn build_line_geometry(
    atoms: &[Atom],
    bonds: &[Bond],
    palette: &mut ChainPalette,
) -> RenderableGeometry {
    if atoms.is_empty() {
        warn!("line geometry requested for zero atoms; using fallback");
        return RenderableGeometry::fallback();
    }

    let index = {
        let mut map = rustc_hash::FxHashMap::default();
        for (i, atom) in atoms.iter().enumerate() {
            let _ = map.entry(atom.serial).or_insert(i);
        }
        map
    };

    let mut positions = Vec::with_capacity(bonds.len() * 2);
    let mut colors = Vec::with_capacity(bonds.len() * 2);
    for bond in bonds {
        let (Some(&ia), Some(&ib)) = (index.get(&bond.a), index.get(&bond.b)) else {
            warn!("bond {}-{} references an unknown atom; skipped", bond.a, bond.b);
            continue;
        };
        let a = &atoms[ia];
        let b = &atoms[ib];
        let color = palette.color_of(&a.chain_id);
        positions.push(a.position.as_vec3().into());
        positions.push(b.position.as_vec3().into());
        colors.push(color);
        colors.push(color);
    }

    if positions.is_empty() {
        warn!("no drawable bonds; using fallback geometry");
        return RenderableGeometry::fallback();
    }

    RenderableGeometry {
        kind: PrimitiveKind::Lines,
        positions,
        colors,
        normals: None,
        indices: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{FALLBACK_COLOR, CHAIN_PALETTE};
    use glam::DVec3;

    fn atom(serial: i32, chain: &str, pos: (f64, f64, f64)) -> Atom {
        Atom {
            serial,
            name: "CA".to_owned(),
            res_name: "ALA".to_owned(),
            chain_id: chain.to_owned(),
            res_seq: serial,
            position: DVec3::new(pos.0, pos.1, pos.2),
            occupancy: 1.0,
            temp_factor: 0.0,
            element: "C".to_owned(),
        }
    }

    #[test]
    fn one_segment_per_bond() {
        let atoms = vec![
            atom(1, "A", (0.0, 0.0, 0.0)),
            atom(2, "A", (3.8, 0.0, 0.0)),
            atom(3, "B", (7.6, 0.0, 0.0)),
        ];
        let bonds = vec![Bond { a: 1, b: 2 }, Bond { a: 2, b: 3 }];
        let mut palette = ChainPalette::new();
        let geom = build_line_geometry(&atoms, &bonds, &mut palette);

        assert_eq!(geom.kind, PrimitiveKind::Lines);
        // 2 points x 3 coords per bond.
        assert_eq!(geom.positions.len() * 3, 6 * bonds.len());
        assert_eq!(geom.colors.len(), geom.positions.len());
        assert!(geom.validate().is_ok());
        // Color comes from the first endpoint's chain.
        assert_eq!(geom.colors[0], CHAIN_PALETTE[0]);
        assert_eq!(geom.colors[2], CHAIN_PALETTE[0]);
    }

    #[test]
    fn single_backbone_bond_emits_six_floats() {
        let atoms = vec![atom(1, "A", (11.104, 13.207, 2.123)), atom(2, "A", (14.904, 13.207, 2.123))];
        let bonds = vec![Bond { a: 1, b: 2 }];
        let mut palette = ChainPalette::new();
        let geom = build_line_geometry(&atoms, &bonds, &mut palette);
        assert_eq!(geom.positions.len(), 2);
        let flat: Vec<f32> = geom.positions.iter().flatten().copied().collect();
        assert_eq!(flat.len(), 6);
    }

    #[test]
    fn unknown_serials_are_skipped() {
        let atoms = vec![atom(1, "A", (0.0, 0.0, 0.0)), atom(2, "A", (1.0, 0.0, 0.0))];
        let bonds = vec![Bond { a: 1, b: 99 }, Bond { a: 1, b: 2 }];
        let mut palette = ChainPalette::new();
        let geom = build_line_geometry(&atoms, &bonds, &mut palette);
        assert_eq!(geom.positions.len(), 2);
    }

    #[test]
    fn zero_atoms_yield_fallback() {
        let mut palette = ChainPalette::new();
        let geom = build_line_geometry(&[], &[], &mut palette);
        assert_eq!(geom.kind, PrimitiveKind::Triangles);
        assert!(geom.colors.iter().all(|&c| c == FALLBACK_COLOR));
    }
}
