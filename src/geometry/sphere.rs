//! Sphere geometry: one low-resolution UV sphere per atom.

use log::warn;

use crate::structure::Atom;

use super::{ChainPalette, PrimitiveKind, RenderableGeometry};

/// Sphere instancing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereParams {
    /// Sphere radius per atom, in Angstroms.
    pub radius: f32,
}

impl Default for SphereParams {
    fn default() -> Self {
        Self { radius: 0.4 }
    }
}

// Low-poly: 6 stacks x 8 slices keeps large structures tractable.
const STACKS: usize = 6;
const SLICES: usize = 8;

/// Build sphere geometry with one chain-colored sphere per atom.
///
/// Zero atoms yield the diagnostic fallback mesh.
#[must_use]
pub fn build_sphere_geometry(
    atoms: &[Atom],
    palette: &mut ChainPalette,
    params: &SphereParams,
) -> RenderableGeometry {
    if atoms.is_empty() {
        warn!("sphere geometry requested for zero atoms; using fallback");
        return RenderableGeometry::fallback();
    }

    let (unit_positions, unit_normals, unit_indices) = unit_sphere(STACKS, SLICES);
    let verts_per_atom = unit_positions.len();

    let mut positions = Vec::with_capacity(atoms.len() * verts_per_atom);
    let mut normals = Vec::with_capacity(atoms.len() * verts_per_atom);
    let mut colors = Vec::with_capacity(atoms.len() * verts_per_atom);
    let mut indices = Vec::with_capacity(atoms.len() * unit_indices.len());

    for (i, atom) in atoms.iter().enumerate() {
        let color = palette.color_of(&atom.chain_id);
        let center = atom.position.as_vec3();
        let base = (i * verts_per_atom) as u32;
        for (p, n) in unit_positions.iter().zip(&unit_normals) {
            positions.push([
                center.x + p[0] * params.radius,
                center.y + p[1] * params.radius,
                center.z + p[2] * params.radius,
            ]);
            normals.push(*n);
            colors.push(color);
        }
        indices.extend(unit_indices.iter().map(|&idx| idx + base));
    }

    RenderableGeometry {
        kind: PrimitiveKind::Triangles,
        positions,
        colors,
        normals: Some(normals),
        indices: Some(indices),
    }
}

/// Generate a unit UV sphere: positions (== normals) and triangle indices.
pub(crate) fn unit_sphere(
    stacks: usize,
    slices: usize,
) -> (Vec<[f32; 3]>, Vec<[f32; 3]>, Vec<u32>) {
    let mut positions = Vec::with_capacity((stacks + 1) * (slices + 1));
    for stack in 0..=stacks {
        let phi = std::f32::consts::PI * stack as f32 / stacks as f32;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for slice in 0..=slices {
            let theta = std::f32::consts::TAU * slice as f32 / slices as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();
            positions.push([sin_phi * cos_theta, cos_phi, sin_phi * sin_theta]);
        }
    }

    let normals = positions.clone();

    let mut indices = Vec::new();
    let row = (slices + 1) as u32;
    for stack in 0..stacks as u32 {
        for slice in 0..slices as u32 {
            let v0 = stack * row + slice;
            let v1 = v0 + 1;
            let v2 = v0 + row;
            let v3 = v2 + 1;
            indices.extend_from_slice(&[v0, v2, v1]);
            indices.extend_from_slice(&[v1, v2, v3]);
        }
    }

    (positions, normals, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::CHAIN_PALETTE;
    use glam::DVec3;

    fn atom(serial: i32, chain: &str, x: f64) -> Atom {
        Atom {
            serial,
            name: "CA".to_owned(),
            res_name: "ALA".to_owned(),
            chain_id: chain.to_owned(),
            res_seq: serial,
            position: DVec3::new(x, 0.0, 0.0),
            occupancy: 1.0,
            temp_factor: 0.0,
            element: "C".to_owned(),
        }
    }

    #[test]
    fn one_sphere_per_atom() {
        let atoms = vec![atom(1, "A", 0.0), atom(2, "B", 10.0)];
        let mut palette = ChainPalette::new();
        let geom = build_sphere_geometry(&atoms, &mut palette, &SphereParams::default());
        assert!(geom.validate().is_ok());
        let per_atom = (STACKS + 1) * (SLICES + 1);
        assert_eq!(geom.positions.len(), 2 * per_atom);
        // Second atom's vertices carry the second chain's color.
        assert_eq!(geom.colors[per_atom], CHAIN_PALETTE[1]);
    }

    #[test]
    fn sphere_vertices_stay_within_radius_of_center() {
        let atoms = vec![atom(1, "A", 5.0)];
        let mut palette = ChainPalette::new();
        let params = SphereParams { radius: 0.4 };
        let geom = build_sphere_geometry(&atoms, &mut palette, &params);
        for p in &geom.positions {
            let d = glam::Vec3::from(*p).distance(glam::Vec3::new(5.0, 0.0, 0.0));
            assert!(d <= params.radius + 1e-4);
        }
    }

    #[test]
    fn unit_sphere_indices_reference_valid_vertices() {
        let (positions, normals, indices) = unit_sphere(4, 6);
        assert_eq!(positions.len(), normals.len());
        assert!(indices.iter().all(|&i| (i as usize) < positions.len()));
        assert_eq!(indices.len() % 3, 0);
    }
}
