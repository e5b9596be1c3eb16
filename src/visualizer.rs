//! The visualization controller: owns the GPU context, the current
//! structure, and the single scene object, and applies user-driven
//! changes (representation, shader, color mode, export, reload).
//!
//! Replacement is always build-new-then-dispose-old, so a failed rebuild
//! leaves the previous scene intact. Concurrent loads are serialized by
//! generation: only the most recently started load may publish its
//! result.

use log::info;

use crate::camera::{bounding_sphere, OrbitCamera};
use crate::error::{ExportError, ProvisError};
use crate::export::{self, ImageData};
use crate::geometry::{
    build_line_geometry, build_sphere_geometry, build_tube_geometry, ChainPalette,
    RenderableGeometry, SphereParams, TubeParams,
};
use crate::gpu::{RenderContext, RenderTarget};
use crate::material::{MaterialParams, ShaderComposer, ShaderVariant};
use crate::options::{ColorMode, Options, Representation};
use crate::pdb;
use crate::renderer::{Renderer, SceneObject};
use crate::structure::StructureData;
use crate::topology;

/// Ticket for one load request. Compare against the sequencer to decide
/// whether the result is still wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadToken {
    generation: u64,
}

/// Serializes overlapping load requests: each `begin` invalidates every
/// earlier token, so only the newest load may publish.
#[derive(Debug, Default)]
pub struct LoadSequencer {
    generation: u64,
}

impl LoadSequencer {
    /// Start a new load, invalidating all outstanding tokens.
    pub fn begin(&mut self) -> LoadToken {
        self.generation += 1;
        LoadToken {
            generation: self.generation,
        }
    }

    /// Whether `token` belongs to the most recently started load.
    #[must_use]
    pub fn is_current(&self, token: LoadToken) -> bool {
        token.generation == self.generation
    }
}

/// Result of finishing a load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The structure was parsed and is now displayed.
    Loaded {
        /// Number of atoms in the loaded structure.
        atoms: usize,
        /// Number of bonds after topology inference.
        bonds: usize,
    },
    /// A newer load started before this one finished; the result was
    /// discarded without touching the scene.
    Superseded,
}

/// Material parameters derived from the current options: the color mode
/// decides whether per-vertex colors or the uniform solid color win.
#[must_use]
pub fn material_for(options: &Options) -> MaterialParams {
    let mut params = MaterialParams::for_variant(options.display.shader);
    match options.display.color_mode {
        ColorMode::Chain => params.use_vertex_color = true,
        ColorMode::Solid => {
            params.use_vertex_color = false;
            params.base_color = options.display.solid_color;
        }
    }
    params
}

/// Owns the rendering stack and the currently displayed structure.
pub struct Visualizer {
    context: RenderContext,
    renderer: Renderer,
    composer: ShaderComposer,
    options: Options,
    palette: ChainPalette,
    sequencer: LoadSequencer,
    structure: Option<StructureData>,
    object: Option<SceneObject>,
    camera: OrbitCamera,
    target: RenderTarget,
}

impl Visualizer {
    /// Create a visualizer with its own headless GPU context.
    ///
    /// # Errors
    ///
    /// [`ProvisError::Gpu`] when no adapter or device is available,
    /// [`ProvisError::Shader`] when the shared shader modules fail to
    /// register.
    pub fn new(options: Options) -> Result<Self, ProvisError> {
        let context = RenderContext::new_blocking()?;
        let renderer = Renderer::new(&context.device);
        let composer = ShaderComposer::new()?;
        let target = RenderTarget::new(
            &context.device,
            options.display.width.max(1),
            options.display.height.max(1),
        );
        Ok(Self {
            context,
            renderer,
            composer,
            options,
            palette: ChainPalette::default(),
            sequencer: LoadSequencer::default(),
            structure: None,
            object: None,
            camera: OrbitCamera::default(),
            target,
        })
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Whether a structure is currently displayed.
    #[must_use]
    pub fn has_structure(&self) -> bool {
        self.structure.is_some()
    }

    /// Start a load request; pass the token to [`Self::finish_load`].
    pub fn begin_load(&mut self) -> LoadToken {
        self.sequencer.begin()
    }

    /// Finish a load request started with [`Self::begin_load`].
    ///
    /// The staleness check runs before any parsing: a superseded request
    /// returns [`LoadOutcome::Superseded`] without touching the scene.
    ///
    /// # Errors
    ///
    /// [`ProvisError::Parse`] when the PDB text is unusable; the previous
    /// scene stays displayed.
    pub fn finish_load(&mut self, token: LoadToken, text: &str) -> Result<LoadOutcome, ProvisError> {
        if !self.sequencer.is_current(token) {
            info!("discarding superseded structure load");
            return Ok(LoadOutcome::Superseded);
        }
        self.load_structure(text)
    }

    /// Parse PDB text and replace the displayed structure.
    ///
    /// Bonds come from CONECT records when present, otherwise from
    /// distance-based inference. The camera refits to the new structure.
    ///
    /// # Errors
    ///
    /// [`ProvisError::Parse`] when the text yields no atoms; the previous
    /// scene stays displayed.
    pub fn load_structure(&mut self, text: &str) -> Result<LoadOutcome, ProvisError> {
        let mut structure = pdb::parse(text)?;
        if structure.bonds.is_empty() {
            structure.bonds = topology::infer_bonds(&structure.atoms);
        }
        let atoms = structure.atoms.len();
        let bonds = structure.bonds.len();
        info!(
            "loaded structure: {atoms} atoms, {bonds} bonds, {} chains",
            structure.chains.len()
        );

        self.palette.reset();
        self.structure = Some(structure);
        self.rebuild_scene(true)?;
        Ok(LoadOutcome::Loaded { atoms, bonds })
    }

    /// Switch the displayed representation, rebuilding the scene object.
    ///
    /// # Errors
    ///
    /// [`ProvisError::Shader`] when shader composition fails past the
    /// last fallback rung.
    pub fn on_representation_change(
        &mut self,
        representation: Representation,
    ) -> Result<(), ProvisError> {
        if self.options.display.representation == representation {
            return Ok(());
        }
        self.options.display.representation = representation;
        self.rebuild_scene(false)
    }

    /// Switch the shader variant, rebuilding the pipeline.
    ///
    /// # Errors
    ///
    /// Same as [`Self::on_representation_change`].
    pub fn on_shader_change(&mut self, shader: ShaderVariant) -> Result<(), ProvisError> {
        if self.options.display.shader == shader {
            return Ok(());
        }
        self.options.display.shader = shader;
        self.rebuild_scene(false)
    }

    /// Switch between chain colors and the uniform solid color.
    ///
    /// Updates the material uniform in place; geometry and pipeline are
    /// untouched.
    pub fn on_color_mode_change(&mut self, color_mode: ColorMode) {
        self.options.display.color_mode = color_mode;
        if let Some(object) = &self.object {
            object.write_material(&self.context.queue, &material_for(&self.options));
        }
    }

    /// Resize the persistent viewport target.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.options.display.width = width.max(1);
        self.options.display.height = height.max(1);
        let next = RenderTarget::new(
            &self.context.device,
            self.options.display.width,
            self.options.display.height,
        );
        let old = std::mem::replace(&mut self.target, next);
        old.dispose();
    }

    /// Draw the current scene (or just the background) into the
    /// persistent viewport target.
    pub fn render_frame(&self) {
        let background = self.options.display.background;
        match &self.object {
            Some(object) => {
                let aspect =
                    self.options.display.width as f32 / self.options.display.height as f32;
                self.renderer.render(
                    &self.context,
                    object,
                    &self.camera.to_uniform(aspect),
                    &self.target,
                    background,
                );
            }
            None => self.renderer.clear(&self.context, &self.target, background),
        }
    }

    /// Render the scene at `viewport x multiplier` resolution and read the
    /// pixels back.
    ///
    /// Dimensions are validated before any GPU resource is created, and
    /// the export draws into its own transient target, so the persistent
    /// viewport is never disturbed.
    ///
    /// # Errors
    ///
    /// [`ProvisError::Export`] for invalid dimensions, a missing scene, or
    /// a readback failure.
    pub fn on_export_request(&self, multiplier: f32) -> Result<ImageData, ProvisError> {
        let (width, height) = export::validate_dimensions(
            (self.options.display.width, self.options.display.height),
            multiplier,
        )?;
        let Some(object) = &self.object else {
            return Err(ExportError::NoScene.into());
        };

        let target = RenderTarget::new(&self.context.device, width, height);
        let aspect = width as f32 / height as f32;
        self.renderer.render(
            &self.context,
            object,
            &self.camera.to_uniform(aspect),
            &target,
            self.options.display.background,
        );
        let image = export::read_pixels(&self.context, &target);
        target.dispose();
        Ok(image?)
    }

    /// Drop the displayed structure and release its GPU resources.
    pub fn reset(&mut self) {
        if let Some(object) = self.object.take() {
            object.dispose();
        }
        self.structure = None;
        self.palette.reset();
    }

    /// Rebuild the scene object from the current structure and options.
    /// The new object is created before the old one is disposed.
    fn rebuild_scene(&mut self, refit_camera: bool) -> Result<(), ProvisError> {
        let Some(structure) = &self.structure else {
            return Ok(());
        };
        let geometry = build_geometry(structure, &self.options, &mut self.palette);
        if refit_camera {
            let (center, radius) = bounding_sphere(&geometry.positions);
            self.camera.fit(center, radius);
        }
        let shader = self
            .composer
            .compose_variant(self.options.display.shader, self.options.display.shader_dir.as_deref())?;
        let object = self.renderer.create_scene_object(
            &self.context,
            &geometry,
            shader,
            &material_for(&self.options),
        );
        if let Some(old) = self.object.replace(object) {
            old.dispose();
        }
        Ok(())
    }
}

impl Drop for Visualizer {
    fn drop(&mut self) {
        self.reset();
    }
}

fn build_geometry(
    structure: &StructureData,
    options: &Options,
    palette: &mut ChainPalette,
) -> RenderableGeometry {
    match options.display.representation {
        Representation::Lines => build_line_geometry(&structure.atoms, &structure.bonds, palette),
        Representation::Tubes => build_tube_geometry(
            &structure.atoms,
            palette,
            &TubeParams {
                radius: options.geometry.tube_radius,
                radial_segments: options.geometry.tube_radial_segments,
            },
        ),
        Representation::Spheres => build_sphere_geometry(
            &structure.atoms,
            palette,
            &SphereParams {
                radius: options.geometry.sphere_radius,
            },
        ),
    }
}
