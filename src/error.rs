//! Crate-level error types.

use std::fmt;

use crate::gpu::render_context::RenderContextError;

/// Failure to parse PDB text into a structure.
///
/// Per-line problems are recovered by skipping the line; only whole-file
/// failures surface here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The input text was empty (or whitespace only).
    EmptyInput,
    /// No ATOM/HETATM record survived parsing.
    NoAtoms,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "input is empty"),
            Self::NoAtoms => write!(f, "no atoms found in input"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Internal geometry inconsistency.
///
/// Recovered locally by substituting the diagnostic fallback geometry;
/// callers normally only see this in logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// Color buffer length does not match the position buffer.
    ColorCountMismatch {
        /// Number of vertex positions.
        positions: usize,
        /// Number of vertex colors.
        colors: usize,
    },
    /// Normal buffer length does not match the position buffer.
    NormalCountMismatch {
        /// Number of vertex positions.
        positions: usize,
        /// Number of vertex normals.
        normals: usize,
    },
    /// No renderable vertices could be produced.
    Empty,
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColorCountMismatch { positions, colors } => write!(
                f,
                "color count {colors} does not match position count {positions}"
            ),
            Self::NormalCountMismatch { positions, normals } => write!(
                f,
                "normal count {normals} does not match position count {positions}"
            ),
            Self::Empty => write!(f, "geometry has no vertices"),
        }
    }
}

impl std::error::Error for GeometryError {}

/// Shader composition failure.
///
/// Unreadable external assets are logged and fall back to built-in
/// sources before this surfaces; never fatal short of the diagnostic
/// shader itself failing to compose.
#[derive(Debug)]
pub enum ShaderLoadError {
    /// WGSL composition failed.
    Compose(String),
}

impl fmt::Display for ShaderLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compose(msg) => write!(f, "shader composition failed: {msg}"),
        }
    }
}

impl std::error::Error for ShaderLoadError {}

/// Image export failure.
///
/// Invalid target dimensions are rejected before any renderer state is
/// touched; render state is left intact on every path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// The scale multiplier was zero, negative, or non-finite.
    InvalidMultiplier,
    /// Computed output width or height was zero.
    ZeroDimension,
    /// Computed output dimensions exceed the texture size limit.
    DimensionTooLarge {
        /// Requested output width.
        width: u32,
        /// Requested output height.
        height: u32,
        /// Maximum supported dimension.
        limit: u32,
    },
    /// No structure is loaded, so there is nothing to export.
    NoScene,
    /// GPU readback of the rendered frame failed.
    Readback(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMultiplier => {
                write!(f, "export scale multiplier must be finite and positive")
            }
            Self::ZeroDimension => write!(f, "export dimensions must be non-zero"),
            Self::DimensionTooLarge {
                width,
                height,
                limit,
            } => write!(
                f,
                "export dimensions {width}x{height} exceed the {limit} texel limit"
            ),
            Self::NoScene => write!(f, "no scene loaded to export"),
            Self::Readback(msg) => write!(f, "frame readback failed: {msg}"),
        }
    }
}

impl std::error::Error for ExportError {}

/// Errors produced by the provis crate.
#[derive(Debug)]
pub enum ProvisError {
    /// GPU context initialization failure.
    Gpu(RenderContextError),
    /// PDB parse failure.
    Parse(ParseError),
    /// Image export failure.
    Export(ExportError),
    /// Shader composition failure past the last fallback rung.
    Shader(ShaderLoadError),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
}

impl fmt::Display for ProvisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::Parse(e) => write!(f, "parse error: {e}"),
            Self::Export(e) => write!(f, "export error: {e}"),
            Self::Shader(e) => write!(f, "shader error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
        }
    }
}

impl std::error::Error for ProvisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Shader(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::OptionsParse(_) => None,
        }
    }
}

impl From<RenderContextError> for ProvisError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<ParseError> for ProvisError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<ExportError> for ProvisError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

impl From<ShaderLoadError> for ProvisError {
    fn from(e: ShaderLoadError) -> Self {
        Self::Shader(e)
    }
}

impl From<std::io::Error> for ProvisError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
