//! Parsed molecular structure data model.
//!
//! Atoms are immutable after parsing. Chains and residues are derived
//! groupings computed on demand from the atom list; they are not stored
//! separately.

use glam::DVec3;
use rustc_hash::FxHashMap;

/// A single atom from an ATOM/HETATM record.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Serial number (columns 7-11). Unique within a structure.
    pub serial: i32,
    /// Atom name, trimmed (columns 13-16), e.g. `CA`, `N`, `OG1`.
    pub name: String,
    /// Three-letter residue name (columns 18-20), e.g. `ALA`.
    pub res_name: String,
    /// Chain identifier (column 22). Defaults to `A` when blank.
    pub chain_id: String,
    /// Residue sequence number (columns 23-26).
    pub res_seq: i32,
    /// Cartesian position in Angstroms.
    pub position: DVec3,
    /// Occupancy (columns 55-60). Defaults to 1.0.
    pub occupancy: f32,
    /// Temperature factor (columns 61-66). Defaults to 0.0.
    pub temp_factor: f32,
    /// Element symbol (columns 77-78), falling back to the first letter of
    /// the atom name, then `C`.
    pub element: String,
}

/// An undirected bond between two atoms, identified by serial number.
///
/// Both endpoints must reference existing atoms; self-bonds are forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    /// Serial of the first endpoint.
    pub a: i32,
    /// Serial of the second endpoint.
    pub b: i32,
}

impl Bond {
    /// Ordered `(min, max)` serial pair, used for deduplication.
    #[must_use]
    pub fn key(&self) -> (i32, i32) {
        if self.a <= self.b {
            (self.a, self.b)
        } else {
            (self.b, self.a)
        }
    }

    /// Whether the bond connects an atom to itself.
    #[must_use]
    pub fn is_self_bond(&self) -> bool {
        self.a == self.b
    }
}

/// A HELIX or SHEET record span. Descriptive only; geometry ignores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryStructure {
    /// Chain the span belongs to.
    pub chain_id: String,
    /// First residue sequence number of the span.
    pub start_seq: i32,
    /// Last residue sequence number of the span.
    pub end_seq: i32,
}

/// A parsed structure: atoms plus any explicit connectivity and annotated
/// secondary structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureData {
    /// All atoms in file order.
    pub atoms: Vec<Atom>,
    /// Explicit bonds from CONECT records (possibly empty).
    pub bonds: Vec<Bond>,
    /// HELIX record spans.
    pub helices: Vec<SecondaryStructure>,
    /// SHEET record spans.
    pub sheets: Vec<SecondaryStructure>,
    /// Chain identifiers in first-seen order.
    pub chains: Vec<String>,
}

impl StructureData {
    /// Map from atom serial to index into [`Self::atoms`].
    ///
    /// Later duplicates of a serial are ignored; serials are unique in
    /// well-formed input.
    #[must_use]
    pub fn serial_index(&self) -> FxHashMap<i32, usize> {
        let mut map = FxHashMap::default();
        for (i, atom) in self.atoms.iter().enumerate() {
            let _ = map.entry(atom.serial).or_insert(i);
        }
        map
    }

    /// Group atom indices into residues keyed by `(chain_id, res_seq)`,
    /// in first-seen order.
    #[must_use]
    pub fn residues(&self) -> Vec<Residue> {
        let mut order: Vec<(String, i32)> = Vec::new();
        let mut groups: FxHashMap<(String, i32), Vec<usize>> = FxHashMap::default();
        for (i, atom) in self.atoms.iter().enumerate() {
            let key = (atom.chain_id.clone(), atom.res_seq);
            let entry = groups.entry(key.clone()).or_default();
            if entry.is_empty() {
                order.push(key);
            }
            entry.push(i);
        }
        order
            .into_iter()
            .map(|key| {
                let atom_indices = groups.remove(&key).unwrap_or_default();
                Residue {
                    chain_id: key.0,
                    res_seq: key.1,
                    atom_indices,
                }
            })
            .collect()
    }
}

/// A residue view: the indices of the atoms sharing `(chain_id, res_seq)`.
#[derive(Debug, Clone)]
pub struct Residue {
    /// Chain the residue belongs to.
    pub chain_id: String,
    /// Residue sequence number.
    pub res_seq: i32,
    /// Indices into the structure's atom list.
    pub atom_indices: Vec<usize>,
}
