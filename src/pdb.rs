//! Fixed-column PDB text parser.
//!
//! Best-effort: any malformed line is skipped with a warning. The only
//! fatal conditions are empty input and zero parsed atoms.

use glam::DVec3;
use log::warn;
use rustc_hash::FxHashSet;

use crate::error::ParseError;
use crate::structure::{Atom, Bond, SecondaryStructure, StructureData};

/// Extract the 1-based column range `[start, end]` from a record line,
/// trimmed. Short lines and non-ASCII boundaries yield an empty field.
fn field(line: &str, start: usize, end: usize) -> &str {
    let lo = start - 1;
    let hi = end.min(line.len());
    if lo >= hi {
        return "";
    }
    line.get(lo..hi).map_or("", str::trim)
}

fn parse_i32(s: &str) -> Option<i32> {
    s.parse::<i32>().ok()
}

fn parse_f64_or(s: &str, default: f64) -> f64 {
    s.parse::<f64>().unwrap_or(default)
}

fn parse_f32_or(s: &str, default: f32) -> f32 {
    s.parse::<f32>().unwrap_or(default)
}

/// Parse PDB text into a [`StructureData`].
///
/// # Errors
///
/// Returns [`ParseError::EmptyInput`] for empty/whitespace-only input and
/// [`ParseError::NoAtoms`] when no ATOM/HETATM record could be parsed.
pub fn parse(text: &str) -> Result<StructureData, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let mut data = StructureData::default();
    let mut seen_chains: FxHashSet<String> = FxHashSet::default();

    for (line_no, line) in text.lines().enumerate() {
        let record = field(line, 1, 6);
        match record {
            "ATOM" | "HETATM" => {
                if let Some(atom) = parse_atom_line(line) {
                    if seen_chains.insert(atom.chain_id.clone()) {
                        data.chains.push(atom.chain_id.clone());
                    }
                    data.atoms.push(atom);
                } else {
                    warn!("skipping malformed {record} record at line {}", line_no + 1);
                }
            }
            "HELIX" => match parse_helix_line(line) {
                Some(ss) => data.helices.push(ss),
                None => warn!("skipping malformed HELIX record at line {}", line_no + 1),
            },
            "SHEET" => match parse_sheet_line(line) {
                Some(ss) => data.sheets.push(ss),
                None => warn!("skipping malformed SHEET record at line {}", line_no + 1),
            },
            "CONECT" => {
                let parsed = parse_conect_line(line);
                if parsed.is_empty() {
                    warn!("skipping malformed CONECT record at line {}", line_no + 1);
                } else {
                    data.bonds.extend(parsed);
                }
            }
            _ => {}
        }
    }

    if data.atoms.is_empty() {
        return Err(ParseError::NoAtoms);
    }

    sanitize_bonds(&mut data);
    Ok(data)
}

/// Parse a single ATOM/HETATM record. Returns `None` only for lines too
/// short to hold a record name; all other fields default per the format's
/// tolerant reading (numerics to 0, occupancy to 1.0, chain to "A").
fn parse_atom_line(line: &str) -> Option<Atom> {
    if line.len() < 6 {
        return None;
    }
    let serial = parse_i32(field(line, 7, 11)).unwrap_or(0);
    let name = field(line, 13, 16).to_owned();
    let res_name = field(line, 18, 20).to_owned();
    let chain_field = field(line, 22, 22);
    let chain_id = if chain_field.is_empty() {
        "A".to_owned()
    } else {
        chain_field.to_owned()
    };
    let res_seq = parse_i32(field(line, 23, 26)).unwrap_or(0);
    let x = parse_f64_or(field(line, 31, 38), 0.0);
    let y = parse_f64_or(field(line, 39, 46), 0.0);
    let z = parse_f64_or(field(line, 47, 54), 0.0);
    let occupancy = parse_f32_or(field(line, 55, 60), 1.0);
    let temp_factor = parse_f32_or(field(line, 61, 66), 0.0);

    let element_field = field(line, 77, 78);
    let element = if element_field.is_empty() {
        name.chars()
            .find(|c| c.is_ascii_alphabetic())
            .map_or_else(|| "C".to_owned(), |c| c.to_ascii_uppercase().to_string())
    } else {
        element_field.to_uppercase()
    };

    Some(Atom {
        serial,
        name,
        res_name,
        chain_id,
        res_seq,
        position: DVec3::new(x, y, z),
        occupancy,
        temp_factor,
        element,
    })
}

/// HELIX: initChainID col 20, initSeqNum cols 22-25, endSeqNum cols 34-37.
fn parse_helix_line(line: &str) -> Option<SecondaryStructure> {
    let chain_id = field(line, 20, 20);
    let start_seq = parse_i32(field(line, 22, 25))?;
    let end_seq = parse_i32(field(line, 34, 37))?;
    Some(SecondaryStructure {
        chain_id: if chain_id.is_empty() {
            "A".to_owned()
        } else {
            chain_id.to_owned()
        },
        start_seq,
        end_seq,
    })
}

/// SHEET: initChainID col 22, initSeqNum cols 23-26, endSeqNum cols 34-37.
fn parse_sheet_line(line: &str) -> Option<SecondaryStructure> {
    let chain_id = field(line, 22, 22);
    let start_seq = parse_i32(field(line, 23, 26))?;
    let end_seq = parse_i32(field(line, 34, 37))?;
    Some(SecondaryStructure {
        chain_id: if chain_id.is_empty() {
            "A".to_owned()
        } else {
            chain_id.to_owned()
        },
        start_seq,
        end_seq,
    })
}

/// CONECT: origin serial cols 7-11, bonded serials in four 5-column slots.
fn parse_conect_line(line: &str) -> Vec<Bond> {
    let Some(origin) = parse_i32(field(line, 7, 11)) else {
        return Vec::new();
    };
    let mut bonds = Vec::new();
    for slot in 0..4 {
        let start = 12 + slot * 5;
        if let Some(partner) = parse_i32(field(line, start, start + 4)) {
            bonds.push(Bond {
                a: origin,
                b: partner,
            });
        }
    }
    bonds
}

/// Enforce bond invariants: endpoints must exist and self-bonds are
/// forbidden. Also deduplicates by ordered serial pair.
fn sanitize_bonds(data: &mut StructureData) {
    if data.bonds.is_empty() {
        return;
    }
    let serials: FxHashSet<i32> = data.atoms.iter().map(|a| a.serial).collect();
    let mut seen: FxHashSet<(i32, i32)> = FxHashSet::default();
    let before = data.bonds.len();
    data.bonds.retain(|bond| {
        if bond.is_self_bond() || !serials.contains(&bond.a) || !serials.contains(&bond.b) {
            return false;
        }
        seen.insert(bond.key())
    });
    if data.bonds.len() < before {
        warn!(
            "dropped {} invalid or duplicate explicit bonds",
            before - data.bonds.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CA_LINE: &str =
        "ATOM      1  CA  ALA A   1      11.104  13.207   2.123  1.00 20.00           C";

    #[test]
    fn parses_single_atom_record() {
        let data = parse(CA_LINE).unwrap();
        assert_eq!(data.atoms.len(), 1);
        let atom = &data.atoms[0];
        assert_eq!(atom.serial, 1);
        assert_eq!(atom.name, "CA");
        assert_eq!(atom.res_name, "ALA");
        assert_eq!(atom.chain_id, "A");
        assert_eq!(atom.res_seq, 1);
        assert!((atom.position.x - 11.104).abs() < 1e-9);
        assert!((atom.position.y - 13.207).abs() < 1e-9);
        assert!((atom.position.z - 2.123).abs() < 1e-9);
        assert!((atom.occupancy - 1.0).abs() < 1e-6);
        assert!((atom.temp_factor - 20.0).abs() < 1e-6);
        assert_eq!(atom.element, "C");
        assert_eq!(data.chains, vec!["A".to_owned()]);
    }

    #[test]
    fn empty_input_is_a_parse_error() {
        assert_eq!(parse(""), Err(ParseError::EmptyInput));
        assert_eq!(parse("   \n  "), Err(ParseError::EmptyInput));
    }

    #[test]
    fn input_without_atoms_is_a_parse_error() {
        let text = "HEADER    HYDROLASE\nREMARK this file has no coordinates\nEND\n";
        assert_eq!(parse(text), Err(ParseError::NoAtoms));
    }

    #[test]
    fn blank_chain_defaults_to_a() {
        // Chain column (22) left blank.
        let line = "ATOM      1  CA  ALA     1      11.104  13.207   2.123  1.00 20.00           C";
        let data = parse(line).unwrap();
        assert_eq!(data.atoms[0].chain_id, "A");
    }

    #[test]
    fn missing_element_falls_back_to_name_letter() {
        // Truncated line: no element columns.
        let line = "ATOM      2  OG1 THR A   2      10.000  10.000  10.000";
        let data = parse(line).unwrap();
        assert_eq!(data.atoms[0].element, "O");
        // Missing occupancy defaults to 1.0, temp factor to 0.0.
        assert!((data.atoms[0].occupancy - 1.0).abs() < 1e-6);
        assert!((data.atoms[0].temp_factor).abs() < 1e-6);
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let text = format!("{CA_LINE}\nATOM xx\nHELIX garbage\nSHEET\nCONECT abc\n");
        let data = parse(&text).unwrap();
        assert_eq!(data.atoms.len(), 1);
        assert!(data.helices.is_empty());
        assert!(data.sheets.is_empty());
        assert!(data.bonds.is_empty());
    }

    #[test]
    fn helix_and_sheet_records_are_parsed() {
        let text = format!(
            "{CA_LINE}\n\
             HELIX    1   1 ALA A    2  LEU A   12  1                                  11\n\
             SHEET    1   A 2 THR A  14  GLY A  18  0\n"
        );
        let data = parse(&text).unwrap();
        assert_eq!(data.helices.len(), 1);
        assert_eq!(data.helices[0].chain_id, "A");
        assert_eq!(data.helices[0].start_seq, 2);
        assert_eq!(data.helices[0].end_seq, 12);
        assert_eq!(data.sheets.len(), 1);
        assert_eq!(data.sheets[0].start_seq, 14);
        assert_eq!(data.sheets[0].end_seq, 18);
    }

    #[test]
    fn conect_records_become_explicit_bonds() {
        let text = "\
ATOM      1  C1  LIG A   1       0.000   0.000   0.000  1.00  0.00           C
ATOM      2  C2  LIG A   1       1.200   0.000   0.000  1.00  0.00           C
ATOM      3  O1  LIG A   1       2.400   0.000   0.000  1.00  0.00           O
CONECT    1    2
CONECT    2    1    3
";
        let data = parse(text).unwrap();
        // 1-2 appears twice (both directions) and is deduplicated.
        assert_eq!(data.bonds.len(), 2);
        assert_eq!(data.bonds[0].key(), (1, 2));
        assert_eq!(data.bonds[1].key(), (2, 3));
    }

    #[test]
    fn invalid_explicit_bonds_are_dropped() {
        let text = "\
ATOM      1  C1  LIG A   1       0.000   0.000   0.000  1.00  0.00           C
ATOM      2  C2  LIG A   1       1.200   0.000   0.000  1.00  0.00           C
CONECT    1    1
CONECT    1    9
CONECT    2    1
";
        let data = parse(text).unwrap();
        // Self-bond 1-1 and dangling 1-9 removed; 2-1 kept.
        assert_eq!(data.bonds.len(), 1);
        assert_eq!(data.bonds[0].key(), (1, 2));
    }

    #[test]
    fn chains_are_listed_in_first_seen_order() {
        let text = "\
ATOM      1  CA  ALA B   1       0.000   0.000   0.000  1.00  0.00           C
ATOM      2  CA  ALA A   1       3.800   0.000   0.000  1.00  0.00           C
ATOM      3  CA  ALA B   2       7.600   0.000   0.000  1.00  0.00           C
";
        let data = parse(text).unwrap();
        assert_eq!(data.chains, vec!["B".to_owned(), "A".to_owned()]);
    }
}
