//! CPU-side renderable geometry: vertex buffers for lines, tubes, and
//! spheres derived from atoms and bonds.
//!
//! Builders never return an empty result: degenerate input yields the
//! diagnostic fallback sphere so the caller always has a displayable
//! object.

mod line;
mod palette;
mod sphere;
mod tube;

pub use line::build_line_geometry;
pub use palette::{ChainPalette, CHAIN_PALETTE};
pub use sphere::{build_sphere_geometry, SphereParams};
pub use tube::{build_tube_geometry, TubeParams};

use glam::Vec3;
use log::warn;

use crate::error::GeometryError;

/// Diagnostic red used for the degenerate-input fallback geometry.
pub const FALLBACK_COLOR: [f32; 3] = [0.9, 0.15, 0.15];

/// Primitive topology of a geometry buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// Independent line segments: vertex pair `(2i, 2i+1)` is one bond.
    Lines,
    /// Triangle list (indexed when `indices` is present).
    Triangles,
}

/// Vertex buffers ready for upload.
///
/// Invariant: `colors.len() == positions.len()`, and `normals`, when
/// present, matches as well.
#[derive(Debug, Clone)]
pub struct RenderableGeometry {
    /// Primitive topology.
    pub kind: PrimitiveKind,
    /// Vertex positions.
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex colors, same length as `positions`.
    pub colors: Vec<[f32; 3]>,
    /// Optional per-vertex normals.
    pub normals: Option<Vec<[f32; 3]>>,
    /// Optional triangle indices.
    pub indices: Option<Vec<u32>>,
}

impl RenderableGeometry {
    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Check the buffer-length invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryError`] describing the first violated invariant.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.positions.is_empty() {
            return Err(GeometryError::Empty);
        }
        if self.colors.len() != self.positions.len() {
            return Err(GeometryError::ColorCountMismatch {
                positions: self.positions.len(),
                colors: self.colors.len(),
            });
        }
        if let Some(normals) = &self.normals {
            if normals.len() != self.positions.len() {
                return Err(GeometryError::NormalCountMismatch {
                    positions: self.positions.len(),
                    normals: normals.len(),
                });
            }
        }
        Ok(())
    }

    /// Concatenate triangle-mesh parts into one buffer, offsetting indices.
    ///
    /// If the merged per-part normals do not line up with the merged
    /// positions (a part missing them, or a count mismatch), the combined
    /// normals are recomputed from the triangle mesh rather than trusting
    /// partial data.
    #[must_use]
    pub fn merge_triangles(parts: Vec<Self>) -> Self {
        let mut positions = Vec::new();
        let mut colors = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut indices = Vec::new();

        for part in parts {
            let base = positions.len() as u32;
            if let Some(part_indices) = &part.indices {
                indices.extend(part_indices.iter().map(|&i| i + base));
            } else {
                // Non-indexed part: sequential triangles.
                indices.extend((0..part.positions.len() as u32).map(|i| i + base));
            }
            if let Some(part_normals) = &part.normals {
                normals.extend_from_slice(part_normals);
            }
            positions.extend_from_slice(&part.positions);
            colors.extend_from_slice(&part.colors);
        }

        let mut merged = Self {
            kind: PrimitiveKind::Triangles,
            positions,
            colors,
            normals: Some(normals),
            indices: Some(indices),
        };
        if merged
            .normals
            .as_ref()
            .is_some_and(|n| n.len() != merged.positions.len())
        {
            warn!("merged normals do not match positions; recomputing from mesh");
            merged.recompute_normals();
        }
        merged
    }

    /// Recompute smooth per-vertex normals from the triangle mesh by
    /// accumulating area-weighted face normals. No-op for line geometry.
    pub fn recompute_normals(&mut self) {
        if self.kind != PrimitiveKind::Triangles {
            self.normals = None;
            return;
        }
        let mut accum = vec![Vec3::ZERO; self.positions.len()];
        let tri_indices: Vec<u32> = self.indices.clone().unwrap_or_else(|| {
            (0..self.positions.len() as u32).collect()
        });
        for tri in tri_indices.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let p0 = Vec3::from(self.positions[i0]);
            let p1 = Vec3::from(self.positions[i1]);
            let p2 = Vec3::from(self.positions[i2]);
            let face = (p1 - p0).cross(p2 - p0);
            accum[i0] += face;
            accum[i1] += face;
            accum[i2] += face;
        }
        self.normals = Some(
            accum
                .into_iter()
                .map(|n| n.normalize_or(Vec3::Z).into())
                .collect(),
        );
    }

    /// Diagnostic fallback: a small red sphere at the origin, returned when
    /// a builder has nothing renderable to emit.
    #[must_use]
    pub fn fallback() -> Self {
        let (positions, normals, indices) = sphere::unit_sphere(8, 12);
        let colors = vec![FALLBACK_COLOR; positions.len()];
        Self {
            kind: PrimitiveKind::Triangles,
            positions,
            colors,
            normals: Some(normals),
            indices: Some(indices),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_a_valid_red_mesh() {
        let geom = RenderableGeometry::fallback();
        assert!(geom.validate().is_ok());
        assert_eq!(geom.kind, PrimitiveKind::Triangles);
        assert!(geom.colors.iter().all(|&c| c == FALLBACK_COLOR));
        assert!(!geom.positions.is_empty());
    }

    #[test]
    fn validate_rejects_color_mismatch() {
        let geom = RenderableGeometry {
            kind: PrimitiveKind::Lines,
            positions: vec![[0.0; 3], [1.0; 3]],
            colors: vec![[1.0; 3]],
            normals: None,
            indices: None,
        };
        assert_eq!(
            geom.validate(),
            Err(GeometryError::ColorCountMismatch {
                positions: 2,
                colors: 1
            })
        );
    }

    #[test]
    fn merge_recomputes_normals_when_a_part_lacks_them() {
        let with_normals = RenderableGeometry::fallback();
        let without_normals = RenderableGeometry {
            kind: PrimitiveKind::Triangles,
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            colors: vec![[0.5; 3]; 3],
            normals: None,
            indices: Some(vec![0, 1, 2]),
        };
        let merged =
            RenderableGeometry::merge_triangles(vec![with_normals, without_normals]);
        assert!(merged.validate().is_ok());
        let normals = merged.normals.as_ref().unwrap();
        assert_eq!(normals.len(), merged.positions.len());
        // The lone triangle's recomputed normal faces +Z.
        let last = Vec3::from(*normals.last().unwrap());
        assert!((last - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn recompute_normals_produces_unit_vectors() {
        let mut geom = RenderableGeometry::fallback();
        geom.normals = None;
        geom.recompute_normals();
        for n in geom.normals.as_ref().unwrap() {
            let len = Vec3::from(*n).length();
            assert!((len - 1.0).abs() < 1e-4, "normal length {len}");
        }
    }
}
