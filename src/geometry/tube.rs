//! Tube geometry: a smooth spline through each chain's atoms, extruded
//! with a circular cross-section.
//!
//! Uses cubic Hermite interpolation with Catmull-Rom tangents and
//! rotation-minimizing frames (double reflection method, Wang et al. 2008)
//! for consistent tube orientation.

use glam::Vec3;
use log::warn;

use crate::structure::Atom;

use super::{ChainPalette, PrimitiveKind, RenderableGeometry};

/// Tube extrusion parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TubeParams {
    /// Cross-section radius in Angstroms.
    pub radius: f32,
    /// Number of vertices per cross-section ring (at least 3).
    pub radial_segments: usize,
}

impl Default for TubeParams {
    fn default() -> Self {
        Self {
            radius: 0.3,
            radial_segments: 8,
        }
    }
}

/// A point along the spline with position, tangent, and frame vectors.
#[derive(Clone, Copy)]
struct SplinePoint {
    pos: Vec3,
    tangent: Vec3,
    normal: Vec3,
    binormal: Vec3,
}

/// Build tube geometry, one tube per chain.
///
/// Per chain in first-seen order: atoms are stably ordered by residue
/// sequence, chains with fewer than two atoms are skipped, and the spline is
/// sampled with a ring count scaled to curve length
/// (`max(8, floor(length * 3))`) so visual smoothness matches size. All
/// per-chain buffers are merged into one; normals are recomputed from the
/// mesh if per-chain data does not merge cleanly. With no eligible chain,
/// the diagnostic fallback mesh is returned.
#[must_use]
pub fn build_tube_geometry(
    atoms: &[Atom],
    palette: &mut ChainPalette,
    params: &TubeParams,
) -> RenderableGeometry {
    let mut chain_order: Vec<&str> = Vec::new();
    for atom in atoms {
        if !chain_order.contains(&atom.chain_id.as_str()) {
            chain_order.push(&atom.chain_id);
        }
    }

    let mut parts = Vec::new();
    for chain_id in chain_order {
        let mut chain_atoms: Vec<&Atom> =
            atoms.iter().filter(|a| a.chain_id == chain_id).collect();
        chain_atoms.sort_by_key(|a| a.res_seq);
        if chain_atoms.len() < 2 {
            continue;
        }
        let control: Vec<Vec3> = chain_atoms.iter().map(|a| a.position.as_vec3()).collect();
        let color = palette.color_of(chain_id);
        parts.push(extrude_chain(&control, color, params));
    }

    if parts.is_empty() {
        warn!("no chain with two or more atoms; using fallback geometry");
        return RenderableGeometry::fallback();
    }
    RenderableGeometry::merge_triangles(parts)
}

/// Extrude one chain's spline into a triangle mesh.
fn extrude_chain(control: &[Vec3], color: [f32; 3], params: &TubeParams) -> RenderableGeometry {
    let length: f32 = control.windows(2).map(|w| w[0].distance(w[1])).sum();
    let rings = ((length * 3.0).floor() as usize).max(8);
    let points = sample_spline(control, rings);
    let radial = params.radial_segments.max(3);

    let mut positions = Vec::with_capacity(points.len() * radial);
    let mut normals = Vec::with_capacity(points.len() * radial);
    let mut colors = Vec::with_capacity(points.len() * radial);
    for point in &points {
        for k in 0..radial {
            let angle = (k as f32 / radial as f32) * std::f32::consts::TAU;
            let offset = point.normal * angle.cos() + point.binormal * angle.sin();
            positions.push((point.pos + offset * params.radius).into());
            normals.push(offset.normalize_or(Vec3::Z).into());
            colors.push(color);
        }
    }

    let mut indices = Vec::new();
    for i in 0..points.len() - 1 {
        let ring = i * radial;
        let next_ring = (i + 1) * radial;
        for k in 0..radial {
            let k_next = (k + 1) % radial;
            let v0 = (ring + k) as u32;
            let v1 = (ring + k_next) as u32;
            let v2 = (next_ring + k) as u32;
            let v3 = (next_ring + k_next) as u32;
            indices.extend_from_slice(&[v0, v2, v1]);
            indices.extend_from_slice(&[v1, v2, v3]);
        }
    }

    RenderableGeometry {
        kind: PrimitiveKind::Triangles,
        positions,
        colors,
        normals: Some(normals),
        indices: Some(indices),
    }
}

/// Sample an interpolating spline through the control points at `rings`
/// evenly spaced parameter values, with rotation-minimizing frames.
fn sample_spline(control: &[Vec3], rings: usize) -> Vec<SplinePoint> {
    let n = control.len();
    let samples = rings.max(2);

    // Catmull-Rom style tangents at the control points.
    let tangents: Vec<Vec3> = (0..n)
        .map(|i| {
            if i == 0 {
                control[1] - control[0]
            } else if i == n - 1 {
                control[n - 1] - control[n - 2]
            } else {
                (control[i + 1] - control[i - 1]) * 0.5
            }
        })
        .collect();

    let mut points = Vec::with_capacity(samples);
    for s in 0..samples {
        let t = s as f32 / (samples - 1) as f32;
        let x = t * (n - 1) as f32;
        let seg = (x.floor() as usize).min(n - 2);
        let u = x - seg as f32;

        let p0 = control[seg];
        let p1 = control[seg + 1];
        let m0 = tangents[seg];
        let m1 = tangents[seg + 1];
        points.push(SplinePoint {
            pos: hermite_point(p0, m0, p1, m1, u),
            tangent: hermite_tangent(p0, m0, p1, m1, u).normalize_or(Vec3::X),
            normal: Vec3::ZERO,
            binormal: Vec3::ZERO,
        });
    }

    compute_rmf(&mut points);
    points
}

/// Cubic Hermite interpolation for position.
fn hermite_point(p0: Vec3, m0: Vec3, p1: Vec3, m1: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    p0 * h00 + m0 * h10 + p1 * h01 + m1 * h11
}

/// Cubic Hermite interpolation for the tangent (derivative of position).
fn hermite_tangent(p0: Vec3, m0: Vec3, p1: Vec3, m1: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let dh00 = 6.0 * t2 - 6.0 * t;
    let dh10 = 3.0 * t2 - 4.0 * t + 1.0;
    let dh01 = -6.0 * t2 + 6.0 * t;
    let dh11 = 3.0 * t2 - 2.0 * t;
    p0 * dh00 + m0 * dh10 + p1 * dh01 + m1 * dh11
}

/// Compute rotation-minimizing frames using the double reflection method.
fn compute_rmf(points: &mut [SplinePoint]) {
    let Some(first) = points.first() else {
        return;
    };

    let t0 = first.tangent;
    let arbitrary = if t0.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let n0 = t0.cross(arbitrary).normalize_or(Vec3::Y);
    let b0 = t0.cross(n0).normalize_or(Vec3::Z);
    points[0].normal = n0;
    points[0].binormal = b0;

    for i in 0..points.len() - 1 {
        let x_i = points[i].pos;
        let x_i1 = points[i + 1].pos;
        let t_i = points[i].tangent;
        let t_i1 = points[i + 1].tangent;
        let r_i = points[i].normal;
        let s_i = points[i].binormal;

        let v1 = x_i1 - x_i;
        let c1 = v1.dot(v1);
        if c1 < 1e-10 {
            points[i + 1].normal = r_i;
            points[i + 1].binormal = s_i;
            continue;
        }

        let r_i_l = r_i - (2.0 / c1) * v1.dot(r_i) * v1;
        let t_i_l = t_i - (2.0 / c1) * v1.dot(t_i) * v1;

        let v2 = t_i1 - t_i_l;
        let c2 = v2.dot(v2);
        let r_i1 = if c2 < 1e-10 {
            r_i_l
        } else {
            r_i_l - (2.0 / c2) * v2.dot(r_i_l) * v2
        };

        let r_i1 = (r_i1 - t_i1 * t_i1.dot(r_i1)).normalize_or(Vec3::Y);
        let s_i1 = t_i1.cross(r_i1).normalize_or(Vec3::Z);
        points[i + 1].normal = r_i1;
        points[i + 1].binormal = s_i1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FALLBACK_COLOR;
    use glam::DVec3;

    fn atom(serial: i32, chain: &str, seq: i32, x: f64) -> Atom {
        Atom {
            serial,
            name: "CA".to_owned(),
            res_name: "ALA".to_owned(),
            chain_id: chain.to_owned(),
            res_seq: seq,
            position: DVec3::new(x, 0.0, 0.0),
            occupancy: 1.0,
            temp_factor: 0.0,
            element: "C".to_owned(),
        }
    }

    #[test]
    fn tube_buffers_are_consistent() {
        let atoms: Vec<Atom> = (0..5).map(|i| atom(i, "A", i, f64::from(i) * 3.8)).collect();
        let mut palette = ChainPalette::new();
        let geom = build_tube_geometry(&atoms, &mut palette, &TubeParams::default());
        assert_eq!(geom.kind, PrimitiveKind::Triangles);
        assert!(geom.validate().is_ok());
        assert_eq!(
            geom.normals.as_ref().map(Vec::len),
            Some(geom.positions.len())
        );
        assert!(geom.indices.as_ref().is_some_and(|i| i.len() % 3 == 0));
    }

    #[test]
    fn ring_count_scales_with_curve_length() {
        // Total polyline length 15.2 -> floor(45.6) = 45 rings of 8 verts.
        let atoms: Vec<Atom> = (0..5).map(|i| atom(i, "A", i, f64::from(i) * 3.8)).collect();
        let mut palette = ChainPalette::new();
        let geom = build_tube_geometry(&atoms, &mut palette, &TubeParams::default());
        assert_eq!(geom.positions.len(), 45 * 8);
    }

    #[test]
    fn short_curves_keep_a_minimum_ring_count() {
        let atoms = vec![atom(0, "A", 0, 0.0), atom(1, "A", 1, 0.5)];
        let mut palette = ChainPalette::new();
        let geom = build_tube_geometry(&atoms, &mut palette, &TubeParams::default());
        // length 0.5 -> floor(1.5) = 1, clamped to 8 rings.
        assert_eq!(geom.positions.len(), 8 * 8);
    }

    #[test]
    fn single_atom_chains_are_skipped() {
        let atoms = vec![
            atom(0, "A", 0, 0.0),
            atom(1, "B", 0, 10.0),
            atom(2, "B", 1, 13.8),
            atom(3, "B", 2, 17.6),
        ];
        let mut palette = ChainPalette::new();
        let geom = build_tube_geometry(&atoms, &mut palette, &TubeParams::default());
        assert!(geom.validate().is_ok());
        // Chain A (single atom) is skipped before color assignment, so
        // chain B takes the first palette entry.
        assert_eq!(geom.colors[0], crate::geometry::CHAIN_PALETTE[0]);
    }

    #[test]
    fn zero_atoms_yield_fallback() {
        let mut palette = ChainPalette::new();
        let geom = build_tube_geometry(&[], &mut palette, &TubeParams::default());
        assert!(geom.colors.iter().all(|&c| c == FALLBACK_COLOR));
    }

    #[test]
    fn tube_normals_are_unit_length_and_radial() {
        let atoms: Vec<Atom> = (0..4).map(|i| atom(i, "A", i, f64::from(i) * 2.0)).collect();
        let mut palette = ChainPalette::new();
        let geom = build_tube_geometry(&atoms, &mut palette, &TubeParams::default());
        for n in geom.normals.as_ref().unwrap() {
            let len = Vec3::from(*n).length();
            assert!((len - 1.0).abs() < 1e-4);
        }
    }
}
