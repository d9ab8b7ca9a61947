//! Serializable scene description

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::device::{Light, LightModelParameters, Material};
use crate::rasterizer::{
    IntRect, Mat4, PrimitiveType, RasterizerOptions, Vec2, Vec3, Vec4, Vertex, WindingOrder,
};
use crate::texture::{FixedFunctionTextureEnvironment, TextureFilter, WrapMode};

/// A single vertex as written in scene files
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneVertex {
    pub position: Vec3,
    pub color: Vec4,
    pub normal: Vec3,
    pub tex_coord: Vec2,
}

impl Default for SceneVertex {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            color: Vec4::ONE,
            normal: Vec3::new(0.0, 0.0, 1.0),
            tex_coord: Vec2::default(),
        }
    }
}

impl SceneVertex {
    pub fn new(position: Vec3, color: Vec4) -> Self {
        Self { position, color, ..Default::default() }
    }

    pub fn to_vertex(&self) -> Vertex {
        Vertex::new(self.position.extend(1.0), self.color)
            .with_normal(self.normal)
            .with_tex_coord(0, Vec4::new(self.tex_coord.x, self.tex_coord.y, 0.0, 1.0))
    }
}

/// One `draw_primitives` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawCall {
    pub primitive: PrimitiveType,
    pub vertices: Vec<SceneVertex>,
    /// Replaces the scene options for this draw only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<RasterizerOptions>,
}

/// Texture bound to unit 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneTexture {
    /// Relative paths resolve against the scene file's directory
    pub path: PathBuf,
    #[serde(default = "default_wrap")]
    pub wrap: WrapMode,
    #[serde(default = "default_filter")]
    pub filter: TextureFilter,
    #[serde(default)]
    pub environment: FixedFunctionTextureEnvironment,
}

fn default_wrap() -> WrapMode {
    WrapMode::Repeat
}

fn default_filter() -> TextureFilter {
    TextureFilter::Nearest
}

/// Everything needed to render one frame headlessly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub width: usize,
    pub height: usize,
    pub clear_color: Vec4,
    pub clear_depth: f32,
    pub clear_stencil: u8,
    /// An empty viewport or scissor box is replaced by the full output rect
    pub options: RasterizerOptions,
    pub model_view: Mat4,
    pub projection: Mat4,
    pub light_model: LightModelParameters,
    pub lights: Vec<Light>,
    pub material: Material,
    pub texture: Option<SceneTexture>,
    pub clip_planes: Vec<Vec4>,
    pub draw_calls: Vec<DrawCall>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            clear_depth: 1.0,
            clear_stencil: 0,
            options: RasterizerOptions::default(),
            model_view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            light_model: LightModelParameters::default(),
            lights: Vec::new(),
            material: Material::default(),
            texture: None,
            clip_planes: Vec::new(),
            draw_calls: Vec::new(),
        }
    }
}

/// Fill in an unset viewport and scissor box with the output rect
pub(crate) fn fit_to_output(mut options: RasterizerOptions, width: usize, height: usize) -> RasterizerOptions {
    let output = IntRect::new(0, 0, width as i32, height as i32);
    if options.viewport.is_empty() {
        options.viewport = output;
    }
    if options.scissor_box.is_empty() {
        options.scissor_box = output;
    }
    options
}

impl Scene {
    /// A lit, rotated cube with one colored face per side
    pub fn demo() -> Self {
        let p = |x: f32, y: f32, z: f32| Vec3::new(x, y, z);
        // (normal, color, corners counter-clockwise seen from outside)
        let faces = [
            (p(0.0, 0.0, 1.0), Vec4::new(0.9, 0.2, 0.2, 1.0),
             [p(-1.0, -1.0, 1.0), p(1.0, -1.0, 1.0), p(1.0, 1.0, 1.0), p(-1.0, 1.0, 1.0)]),
            (p(0.0, 0.0, -1.0), Vec4::new(0.2, 0.9, 0.2, 1.0),
             [p(1.0, -1.0, -1.0), p(-1.0, -1.0, -1.0), p(-1.0, 1.0, -1.0), p(1.0, 1.0, -1.0)]),
            (p(0.0, 1.0, 0.0), Vec4::new(0.2, 0.2, 0.9, 1.0),
             [p(-1.0, 1.0, 1.0), p(1.0, 1.0, 1.0), p(1.0, 1.0, -1.0), p(-1.0, 1.0, -1.0)]),
            (p(0.0, -1.0, 0.0), Vec4::new(0.9, 0.9, 0.2, 1.0),
             [p(-1.0, -1.0, -1.0), p(1.0, -1.0, -1.0), p(1.0, -1.0, 1.0), p(-1.0, -1.0, 1.0)]),
            (p(1.0, 0.0, 0.0), Vec4::new(0.9, 0.2, 0.9, 1.0),
             [p(1.0, -1.0, 1.0), p(1.0, -1.0, -1.0), p(1.0, 1.0, -1.0), p(1.0, 1.0, 1.0)]),
            (p(-1.0, 0.0, 0.0), Vec4::new(0.2, 0.9, 0.9, 1.0),
             [p(-1.0, -1.0, -1.0), p(-1.0, -1.0, 1.0), p(-1.0, 1.0, 1.0), p(-1.0, 1.0, -1.0)]),
        ];

        let vertices = faces
            .iter()
            .flat_map(|(normal, color, corners)| {
                corners.iter().map(move |&position| SceneVertex {
                    position,
                    color: *color,
                    normal: *normal,
                    tex_coord: Vec2::default(),
                })
            })
            .collect();

        let options = RasterizerOptions {
            enable_depth_test: true,
            enable_culling: true,
            cull_back: true,
            front_face: WindingOrder::CounterClockwise,
            lighting_enabled: true,
            color_material_enabled: true,
            normalization_enabled: true,
            ..Default::default()
        };

        let model_view = Mat4::translation(Vec3::new(0.0, 0.0, -5.0))
            * Mat4::rotation(30.0, Vec3::new(1.0, 0.0, 0.0))
            * Mat4::rotation(40.0, Vec3::new(0.0, 1.0, 0.0));

        let key_light = Light {
            is_enabled: true,
            ambient_intensity: Vec4::new(0.0, 0.0, 0.0, 1.0),
            diffuse_intensity: Vec4::new(1.0, 1.0, 1.0, 1.0),
            specular_intensity: Vec4::new(0.5, 0.5, 0.5, 1.0),
            position: Vec4::new(0.3, 0.5, 1.0, 0.0),
            ..Default::default()
        };

        let (width, height) = (320, 240);
        Self {
            width,
            height,
            clear_color: Vec4::new(0.1, 0.1, 0.15, 1.0),
            options,
            model_view,
            projection: Mat4::perspective(45.0, width as f32 / height as f32, 0.1, 100.0),
            lights: vec![key_light],
            material: Material { shininess: 16.0, specular: Vec4::new(0.3, 0.3, 0.3, 1.0), ..Default::default() },
            draw_calls: vec![DrawCall { primitive: PrimitiveType::Quads, vertices, options: None }],
            ..Default::default()
        }
    }
}
