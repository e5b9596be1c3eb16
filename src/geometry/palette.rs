//! Deterministic per-chain color assignment.

use rustc_hash::FxHashMap;

/// Fixed chain color palette, cycled in first-seen chain order.
pub const CHAIN_PALETTE: [[f32; 3]; 10] = [
    [0.35, 0.55, 0.95], // blue
    [0.95, 0.55, 0.20], // orange
    [0.40, 0.80, 0.45], // green
    [0.90, 0.35, 0.40], // red
    [0.65, 0.45, 0.85], // purple
    [0.55, 0.40, 0.30], // brown
    [0.90, 0.55, 0.80], // pink
    [0.55, 0.60, 0.60], // gray
    [0.80, 0.80, 0.30], // olive
    [0.35, 0.80, 0.85], // cyan
];

/// Explicit chain-to-color state owned by the visualization controller.
///
/// The n-th chain ever queried gets `CHAIN_PALETTE[n % len]`, so the mapping
/// is stable across repeated calls as long as chain discovery order is
/// stable. Never a global: create with the controller, clear with
/// [`ChainPalette::reset`].
#[derive(Debug, Clone, Default)]
pub struct ChainPalette {
    assigned: FxHashMap<String, [f32; 3]>,
}

impl ChainPalette {
    /// New empty palette state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Color for `chain_id`, assigning the next palette entry on first
    /// sight. Idempotent for chains already seen.
    pub fn color_of(&mut self, chain_id: &str) -> [f32; 3] {
        if let Some(&color) = self.assigned.get(chain_id) {
            return color;
        }
        let color = CHAIN_PALETTE[self.assigned.len() % CHAIN_PALETTE.len()];
        let _ = self.assigned.insert(chain_id.to_owned(), color);
        color
    }

    /// Number of chains assigned so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    /// Whether no chain has been assigned yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    /// Forget all assignments.
    pub fn reset(&mut self) {
        self.assigned.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chains_get_palette_entries_in_first_seen_order() {
        let mut palette = ChainPalette::new();
        assert_eq!(palette.color_of("A"), CHAIN_PALETTE[0]);
        assert_eq!(palette.color_of("B"), CHAIN_PALETTE[1]);
        assert_eq!(palette.color_of("A"), CHAIN_PALETTE[0]);
    }

    #[test]
    fn assignment_is_idempotent_for_a_chain_set() {
        let mut first = ChainPalette::new();
        let mut second = ChainPalette::new();
        for id in ["C", "A", "B"] {
            let _ = first.color_of(id);
        }
        for id in ["C", "A", "B"] {
            assert_eq!(second.color_of(id), first.color_of(id));
        }
    }

    #[test]
    fn palette_wraps_after_exhaustion() {
        let mut palette = ChainPalette::new();
        for i in 0..CHAIN_PALETTE.len() {
            let _ = palette.color_of(&format!("chain{i}"));
        }
        assert_eq!(palette.color_of("overflow"), CHAIN_PALETTE[0]);
    }

    #[test]
    fn reset_clears_assignments() {
        let mut palette = ChainPalette::new();
        let _ = palette.color_of("Z");
        palette.reset();
        assert!(palette.is_empty());
        assert_eq!(palette.color_of("A"), CHAIN_PALETTE[0]);
    }
}
