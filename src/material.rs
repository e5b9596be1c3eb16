//! Shader variants, material parameters, and WGSL composition with a
//! layered fallback.
//!
//! Resolution order for a variant's source: external file under the
//! configured shader directory, then the built-in source embedded in the
//! binary, then (only if composition itself fails) the unlit diagnostic
//! shader. A material is always produced; failures degrade, never
//! propagate.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use log::warn;
use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, NagaModuleDescriptor, ShaderLanguage, ShaderType,
};

use crate::error::ShaderLoadError;

const LIGHTING_MODULE: &str = include_str!("../assets/shaders/modules/lighting.wgsl");
const BASE_WGSL: &str = include_str!("../assets/shaders/base.wgsl");
const TOON_WGSL: &str = include_str!("../assets/shaders/toon.wgsl");
const METALLIC_WGSL: &str = include_str!("../assets/shaders/metallic.wgsl");
const DIAGNOSTIC_WGSL: &str = include_str!("../assets/shaders/diagnostic.wgsl");

/// The closed set of selectable shader effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ShaderVariant {
    /// Lambert diffuse with an ambient floor.
    #[default]
    Base,
    /// Quantized bands with silhouette outline.
    Toon,
    /// Diffuse plus tinted Blinn-Phong specular.
    Metallic,
}

impl ShaderVariant {
    /// All selectable variants.
    pub const ALL: [Self; 3] = [Self::Base, Self::Toon, Self::Metallic];

    /// Stable lowercase name, also the external asset file stem.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Toon => "toon",
            Self::Metallic => "metallic",
        }
    }

    /// Built-in WGSL source for this variant.
    #[must_use]
    pub fn builtin_source(self) -> &'static str {
        match self {
            Self::Base => BASE_WGSL,
            Self::Toon => TOON_WGSL,
            Self::Metallic => METALLIC_WGSL,
        }
    }
}

impl fmt::Display for ShaderVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a composed shader's source came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderOrigin {
    /// Loaded from an external asset file.
    External,
    /// Built-in source embedded in the binary.
    BuiltIn,
    /// Unlit diagnostic fallback after a composition failure.
    Diagnostic,
}

/// A composed shader ready for pipeline creation.
pub struct ComposedShader {
    /// The requested variant.
    pub variant: ShaderVariant,
    /// Which fallback rung produced the module.
    pub origin: ShaderOrigin,
    /// Composed naga IR.
    pub module: naga::Module,
}

/// Wraps [`naga_oil::compose::Composer`] with the shared lighting module
/// pre-registered. Owned by the visualizer; never a global.
pub struct ShaderComposer {
    composer: Composer,
}

impl ShaderComposer {
    /// Create a composer with the shared modules registered.
    ///
    /// # Errors
    ///
    /// Returns [`ShaderLoadError::Compose`] if a shared module fails to
    /// register (a build defect, covered by tests).
    pub fn new() -> Result<Self, ShaderLoadError> {
        let mut composer = Composer::default();
        let _ = composer
            .add_composable_module(ComposableModuleDescriptor {
                source: LIGHTING_MODULE,
                file_path: "modules/lighting.wgsl",
                language: ShaderLanguage::Wgsl,
                ..Default::default()
            })
            .map_err(|e| ShaderLoadError::Compose(e.to_string()))?;
        Ok(Self { composer })
    }

    /// Compose a WGSL source (which may contain `#import` directives) into
    /// naga IR.
    ///
    /// # Errors
    ///
    /// Returns [`ShaderLoadError::Compose`] when the source fails to parse
    /// or compose.
    pub fn compose(&mut self, source: &str, file_path: &str) -> Result<naga::Module, ShaderLoadError> {
        self.composer
            .make_naga_module(NagaModuleDescriptor {
                source,
                file_path,
                shader_type: ShaderType::Wgsl,
                ..Default::default()
            })
            .map_err(|e| ShaderLoadError::Compose(e.to_string()))
    }

    /// Compose `variant` through the full fallback chain: external asset,
    /// built-in source, diagnostic shader.
    ///
    /// # Errors
    ///
    /// Only if even the diagnostic shader fails to compose, which is
    /// unreachable for the shipped source and covered by tests.
    pub fn compose_variant(
        &mut self,
        variant: ShaderVariant,
        shader_dir: Option<&Path>,
    ) -> Result<ComposedShader, ShaderLoadError> {
        let (source, origin) = resolve_source(variant, shader_dir);
        let file_path = format!("{}.wgsl", variant.name());
        match self.compose(&source, &file_path) {
            Ok(module) => Ok(ComposedShader {
                variant,
                origin,
                module,
            }),
            Err(e) => {
                warn!("shader '{variant}' failed to compose ({e}); trying built-in");
                // The external source may be the broken rung; retry with the
                // built-in before degrading to the diagnostic shader.
                if origin == ShaderOrigin::External {
                    if let Ok(module) = self.compose(variant.builtin_source(), &file_path) {
                        return Ok(ComposedShader {
                            variant,
                            origin: ShaderOrigin::BuiltIn,
                            module,
                        });
                    }
                }
                warn!("shader '{variant}' degraded to the diagnostic material");
                let module = self.compose(DIAGNOSTIC_WGSL, "diagnostic.wgsl")?;
                Ok(ComposedShader {
                    variant,
                    origin: ShaderOrigin::Diagnostic,
                    module,
                })
            }
        }
    }
}

/// Resolve a variant's WGSL source: external file if readable, else the
/// built-in copy.
#[must_use]
pub fn resolve_source(
    variant: ShaderVariant,
    shader_dir: Option<&Path>,
) -> (Cow<'static, str>, ShaderOrigin) {
    if let Some(dir) = shader_dir {
        let path = dir.join(format!("{}.wgsl", variant.name()));
        match std::fs::read_to_string(&path) {
            Ok(source) => return (Cow::Owned(source), ShaderOrigin::External),
            Err(e) => {
                warn!(
                    "external shader {} unavailable ({e}); using built-in",
                    path.display()
                );
            }
        }
    }
    (Cow::Borrowed(variant.builtin_source()), ShaderOrigin::BuiltIn)
}

/// Typed shader uniform parameters.
///
/// One struct covers all variants; each variant reads the fields it uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialParams {
    /// Directional light direction (world space, toward the scene).
    pub light_dir: [f32; 3],
    /// Light color.
    pub light_color: [f32; 3],
    /// Uniform base color, used when `use_vertex_color` is false.
    pub base_color: [f32; 3],
    /// Surface roughness in `[0, 1]` (metallic variant).
    pub roughness: f32,
    /// Metallic factor in `[0, 1]` (metallic variant).
    pub metallic: f32,
    /// Number of toon bands (toon variant).
    pub toon_steps: f32,
    /// Outline tint (toon variant).
    pub outline_color: [f32; 3],
    /// Outline thickness in `[0, 1]` (toon variant).
    pub outline_thickness: f32,
    /// Whether per-vertex color is authoritative over `base_color`.
    ///
    /// This flag is the single source of truth for the color source; the
    /// controller toggles it on color-mode changes.
    pub use_vertex_color: bool,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            light_dir: [-0.4, -0.6, -0.7],
            light_color: [1.0, 1.0, 1.0],
            base_color: [0.75, 0.75, 0.78],
            roughness: 0.5,
            metallic: 0.0,
            toon_steps: 4.0,
            outline_color: [0.05, 0.05, 0.05],
            outline_thickness: 0.25,
            use_vertex_color: true,
        }
    }
}

impl MaterialParams {
    /// Per-variant defaults.
    #[must_use]
    pub fn for_variant(variant: ShaderVariant) -> Self {
        let mut params = Self::default();
        match variant {
            ShaderVariant::Base => {}
            ShaderVariant::Toon => params.toon_steps = 4.0,
            ShaderVariant::Metallic => {
                params.roughness = 0.35;
                params.metallic = 0.8;
            }
        }
        params
    }

    /// Pack into the GPU uniform layout.
    #[must_use]
    pub fn to_uniform(&self) -> MaterialUniform {
        MaterialUniform {
            light_dir: vec4(self.light_dir, 0.0),
            light_color: vec4(self.light_color, 0.0),
            base_color: vec4(self.base_color, if self.use_vertex_color { 1.0 } else { 0.0 }),
            outline_color: vec4(self.outline_color, self.outline_thickness),
            shading: [self.roughness, self.metallic, self.toon_steps, 0.0],
        }
    }
}

fn vec4(v: [f32; 3], w: f32) -> [f32; 4] {
    [v[0], v[1], v[2], w]
}

/// Optional overrides merged over a variant's default parameters.
/// Set fields win; unset fields keep the defaults. Coercion from external
/// representations happens here, once, at the boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MaterialOverrides {
    /// Override the light direction.
    pub light_dir: Option<[f32; 3]>,
    /// Override the light color.
    pub light_color: Option<[f32; 3]>,
    /// Override the uniform base color.
    pub base_color: Option<[f32; 3]>,
    /// Override the roughness factor.
    pub roughness: Option<f32>,
    /// Override the metallic factor.
    pub metallic: Option<f32>,
    /// Override the toon band count.
    pub toon_steps: Option<f32>,
    /// Override the outline tint.
    pub outline_color: Option<[f32; 3]>,
    /// Override the outline thickness.
    pub outline_thickness: Option<f32>,
    /// Override the color-source flag.
    pub use_vertex_color: Option<bool>,
}

impl MaterialOverrides {
    /// Variant defaults with these overrides applied.
    #[must_use]
    pub fn merged(&self, variant: ShaderVariant) -> MaterialParams {
        let mut p = MaterialParams::for_variant(variant);
        if let Some(v) = self.light_dir {
            p.light_dir = v;
        }
        if let Some(v) = self.light_color {
            p.light_color = v;
        }
        if let Some(v) = self.base_color {
            p.base_color = v;
        }
        if let Some(v) = self.roughness {
            p.roughness = v;
        }
        if let Some(v) = self.metallic {
            p.metallic = v;
        }
        if let Some(v) = self.toon_steps {
            p.toon_steps = v;
        }
        if let Some(v) = self.outline_color {
            p.outline_color = v;
        }
        if let Some(v) = self.outline_thickness {
            p.outline_thickness = v;
        }
        if let Some(v) = self.use_vertex_color {
            p.use_vertex_color = v;
        }
        p
    }
}

/// GPU-side uniform block shared by every shader variant.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MaterialUniform {
    /// xyz: light direction.
    pub light_dir: [f32; 4],
    /// rgb: light color.
    pub light_color: [f32; 4],
    /// rgb: base color; w: 1.0 when per-vertex color is authoritative.
    pub base_color: [f32; 4],
    /// rgb: outline tint; w: outline thickness.
    pub outline_color: [f32; 4],
    /// x: roughness, y: metallic, z: toon steps.
    pub shading: [f32; 4],
}

/// Face culling for a material: mesh geometry renders front faces only;
/// line geometry has no meaningful front and renders both sides.
#[must_use]
pub fn cull_mode(is_mesh_geometry: bool) -> Option<wgpu::Face> {
    if is_mesh_geometry {
        Some(wgpu::Face::Back)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_variant_composes() {
        let mut composer = ShaderComposer::new().unwrap();
        for variant in ShaderVariant::ALL {
            let composed = composer.compose_variant(variant, None).unwrap();
            assert_eq!(composed.origin, ShaderOrigin::BuiltIn, "{variant}");
        }
    }

    #[test]
    fn diagnostic_shader_composes_standalone() {
        let mut composer = ShaderComposer::new().unwrap();
        assert!(composer.compose(DIAGNOSTIC_WGSL, "diagnostic.wgsl").is_ok());
    }

    #[test]
    fn missing_asset_dir_falls_back_to_builtin() {
        // Scenario: external shader fetch fails; a usable material source
        // must still be produced.
        let mut composer = ShaderComposer::new().unwrap();
        let missing = Path::new("/definitely/not/a/shader/dir");
        let composed = composer
            .compose_variant(ShaderVariant::Toon, Some(missing))
            .unwrap();
        assert_eq!(composed.origin, ShaderOrigin::BuiltIn);
    }

    #[test]
    fn broken_source_degrades_to_diagnostic() {
        let mut composer = ShaderComposer::new().unwrap();
        let result = composer.compose("not wgsl at all {", "broken.wgsl");
        assert!(result.is_err());

        // compose_variant never surfaces the breakage: write a corrupt
        // external override and confirm the chain lands on a usable module.
        let dir = std::env::temp_dir().join("provis-shader-test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("base.wgsl"), "garbage {{{").unwrap();
        let composed = composer
            .compose_variant(ShaderVariant::Base, Some(&dir))
            .unwrap();
        assert_ne!(composed.origin, ShaderOrigin::External);
    }

    #[test]
    fn overrides_win_over_defaults() {
        let overrides = MaterialOverrides {
            base_color: Some([1.0, 0.0, 0.0]),
            toon_steps: Some(7.0),
            ..Default::default()
        };
        let params = overrides.merged(ShaderVariant::Toon);
        assert_eq!(params.base_color, [1.0, 0.0, 0.0]);
        assert!((params.toon_steps - 7.0).abs() < f32::EPSILON);
        // Untouched fields keep variant defaults.
        assert_eq!(params.light_color, [1.0, 1.0, 1.0]);
        assert!(params.use_vertex_color);
    }

    #[test]
    fn vertex_color_flag_packs_into_uniform() {
        let mut params = MaterialParams::for_variant(ShaderVariant::Base);
        params.use_vertex_color = false;
        assert!((params.to_uniform().base_color[3]).abs() < f32::EPSILON);
        params.use_vertex_color = true;
        assert!((params.to_uniform().base_color[3] - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn mesh_materials_cull_back_faces_lines_do_not() {
        assert_eq!(cull_mode(true), Some(wgpu::Face::Back));
        assert_eq!(cull_mode(false), None);
    }
}
