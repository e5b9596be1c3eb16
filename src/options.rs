//! User-facing options: display, geometry, and export settings.
//!
//! All fields carry serde defaults so a partial TOML file (or an empty
//! one) deserializes into a fully usable configuration. A JSON schema
//! for the whole tree is exposed for editor tooling.

use std::fmt;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ProvisError;
use crate::material::ShaderVariant;

/// Default directory searched for external shader overrides.
pub const DEFAULT_SHADER_DIR: &str = "assets/shaders";

/// How the structure is drawn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    /// One line segment per bond.
    #[default]
    Lines,
    /// Swept tube along each chain's alpha-carbon trace.
    Tubes,
    /// One sphere per atom.
    Spheres,
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lines => "lines",
            Self::Tubes => "tubes",
            Self::Spheres => "spheres",
        };
        f.write_str(name)
    }
}

/// Where fragment color comes from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Per-vertex chain palette colors.
    #[default]
    Chain,
    /// Single uniform color for the whole structure.
    Solid,
}

/// Display settings: representation, shading, and viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DisplayOptions {
    /// Active representation.
    pub representation: Representation,
    /// Active shader variant.
    pub shader: ShaderVariant,
    /// Color source.
    pub color_mode: ColorMode,
    /// Uniform color used in solid mode (linear RGB).
    pub solid_color: [f32; 3],
    /// Background clear color (linear RGB).
    pub background: [f64; 3],
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
    /// Optional directory searched for external shader overrides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shader_dir: Option<PathBuf>,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            representation: Representation::default(),
            shader: ShaderVariant::default(),
            color_mode: ColorMode::default(),
            solid_color: [0.75, 0.75, 0.78],
            background: [0.08, 0.08, 0.1],
            width: 800,
            height: 600,
            shader_dir: Some(PathBuf::from(DEFAULT_SHADER_DIR)),
        }
    }
}

/// Geometry tessellation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GeometryOptions {
    /// Tube radius in angstroms.
    pub tube_radius: f32,
    /// Radial segments per tube ring.
    pub tube_radial_segments: usize,
    /// Sphere radius in angstroms.
    pub sphere_radius: f32,
}

impl Default for GeometryOptions {
    fn default() -> Self {
        Self {
            tube_radius: 0.3,
            tube_radial_segments: 8,
            sphere_radius: 0.4,
        }
    }
}

/// Image export settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExportOptions {
    /// Output size as a multiple of the viewport size.
    pub multiplier: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { multiplier: 2.0 }
    }
}

/// The full options tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Options {
    /// Display settings.
    pub display: DisplayOptions,
    /// Geometry tessellation settings.
    pub geometry: GeometryOptions,
    /// Image export settings.
    pub export: ExportOptions,
}

impl Options {
    /// Load options from a TOML file.
    ///
    /// # Errors
    ///
    /// [`ProvisError::Io`] if the file cannot be read,
    /// [`ProvisError::OptionsParse`] if the TOML does not match the schema.
    pub fn load(path: &Path) -> Result<Self, ProvisError> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| ProvisError::OptionsParse(e.to_string()))
    }

    /// Write options to a TOML file.
    ///
    /// # Errors
    ///
    /// [`ProvisError::OptionsParse`] on serialization failure,
    /// [`ProvisError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ProvisError> {
        let text =
            toml::to_string_pretty(self).map_err(|e| ProvisError::OptionsParse(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// JSON schema for the options tree, for editor completion.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }
}
