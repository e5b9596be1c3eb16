// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
// Tests may unwrap and compare floats directly
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::wildcard_imports))]

//! Headless 3D protein structure visualization built on wgpu.
//!
//! Provis parses PDB text, infers bonded topology from atomic
//! coordinates, tessellates line / tube / sphere representations with
//! per-chain coloring, and renders them offscreen with composable WGSL
//! materials. Rendered frames can be exported as raster images at a
//! multiple of the viewport resolution.
//!
//! # Key entry points
//!
//! - [`visualizer::Visualizer`] - the controller owning the GPU context
//!   and the displayed scene
//! - [`pdb::parse`] - PDB text to [`structure::StructureData`]
//! - [`topology::infer_bonds`] - distance-based bond inference
//! - [`options::Options`] - runtime configuration (display, geometry,
//!   export)
//!
//! # Architecture
//!
//! Parsing, topology inference, and tessellation are pure CPU stages that
//! never touch the GPU; the renderer uploads their output as a single
//! scene object per structure. State changes follow a strict
//! build-new-then-dispose-old discipline so a failed rebuild never leaves
//! the scene empty, and overlapping structure loads are serialized so
//! only the newest one publishes.

pub mod camera;
pub mod error;
pub mod export;
pub mod geometry;
pub mod gpu;
pub mod material;
pub mod options;
pub mod pdb;
pub mod renderer;
pub mod structure;
pub mod topology;
pub mod visualizer;
