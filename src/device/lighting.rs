//! Per-vertex fixed-function lighting
//!
//! Lights and materials follow the classic fixed-function model: an emissive
//! term, a global ambient term, and per light ambient + diffuse + specular
//! contributions scaled by distance attenuation and a spotlight cone.

use serde::{Deserialize, Serialize};

use crate::rasterizer::{ColorMaterialFace, ColorMaterialMode, Vec3, Vec4};

/// One light source; positions and directions are in eye space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Light {
    pub is_enabled: bool,
    pub ambient_intensity: Vec4,
    pub diffuse_intensity: Vec4,
    pub specular_intensity: Vec4,
    /// w = 0 makes this a directional light
    pub position: Vec4,
    pub spotlight_direction: Vec3,
    pub spotlight_exponent: f32,
    /// Degrees; 180 disables the cone
    pub spotlight_cutoff_angle: f32,
    pub constant_attenuation: f32,
    pub linear_attenuation: f32,
    pub quadratic_attenuation: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            is_enabled: false,
            ambient_intensity: Vec4::new(0.0, 0.0, 0.0, 1.0),
            diffuse_intensity: Vec4::new(0.0, 0.0, 0.0, 1.0),
            specular_intensity: Vec4::new(0.0, 0.0, 0.0, 1.0),
            position: Vec4::new(0.0, 0.0, 1.0, 0.0),
            spotlight_direction: Vec3::new(0.0, 0.0, -1.0),
            spotlight_exponent: 0.0,
            spotlight_cutoff_angle: 180.0,
            constant_attenuation: 1.0,
            linear_attenuation: 0.0,
            quadratic_attenuation: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub emissive: Vec4,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: Vec4::new(0.2, 0.2, 0.2, 1.0),
            diffuse: Vec4::new(0.8, 0.8, 0.8, 1.0),
            specular: Vec4::new(0.0, 0.0, 0.0, 1.0),
            emissive: Vec4::new(0.0, 0.0, 0.0, 1.0),
            shininess: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightModelParameters {
    pub scene_ambient_color: Vec4,
    pub viewer_at_infinity: bool,
    pub two_sided_lighting: bool,
}

impl Default for LightModelParameters {
    fn default() -> Self {
        Self {
            scene_ambient_color: Vec4::new(0.2, 0.2, 0.2, 1.0),
            viewer_at_infinity: false,
            two_sided_lighting: false,
        }
    }
}

/// Vector from `p1` to `p2` for homogeneous points, where w = 0 points lie at infinity
fn sgi_arrow_operator(p1: Vec4, p2: Vec4) -> Vec3 {
    if p1.w != 0.0 && p2.w == 0.0 {
        return p2.xyz();
    }
    if p1.w == 0.0 && p2.w != 0.0 {
        return -p1.xyz();
    }
    if p1.w == 0.0 && p2.w == 0.0 {
        return p2.xyz() - p1.xyz();
    }
    p2.xyz().scale(1.0 / p2.w) - p1.xyz().scale(1.0 / p1.w)
}

/// Substitute the vertex color into the material terms selected by color material
pub fn apply_color_material(
    material: &Material,
    vertex_color: Vec4,
    face: ColorMaterialFace,
    mode: ColorMaterialMode,
) -> Material {
    if face == ColorMaterialFace::Back {
        return *material;
    }
    let mut material = *material;
    match mode {
        ColorMaterialMode::Ambient => material.ambient = vertex_color,
        ColorMaterialMode::AmbientAndDiffuse => {
            material.ambient = vertex_color;
            material.diffuse = vertex_color;
        }
        ColorMaterialMode::Diffuse => material.diffuse = vertex_color,
        ColorMaterialMode::Emissive => material.emissive = vertex_color,
        ColorMaterialMode::Specular => material.specular = vertex_color,
    }
    material
}

/// Lit vertex color clamped to [0, 1]. `eye` is the eye-space position and
/// `normal` the eye-space normal.
pub fn light_vertex(
    eye: Vec4,
    normal: Vec3,
    material: &Material,
    model: &LightModelParameters,
    lights: &[Light],
) -> Vec4 {
    let mut color = material.emissive + material.ambient.modulate(model.scene_ambient_color);

    for light in lights.iter().filter(|light| light.is_enabled) {
        let vertex_to_light = sgi_arrow_operator(eye, light.position);
        let distance = vertex_to_light.len();
        let light_direction = vertex_to_light.normalize();

        let attenuation = if light.position.w != 0.0 {
            1.0 / (light.constant_attenuation
                + light.linear_attenuation * distance
                + light.quadratic_attenuation * distance * distance)
        } else {
            1.0
        };

        let spotlight_factor = if light.spotlight_cutoff_angle != 180.0 {
            let spot_dot = (-light_direction).dot(light.spotlight_direction.normalize());
            if spot_dot >= light.spotlight_cutoff_angle.to_radians().cos() {
                spot_dot.max(0.0).powf(light.spotlight_exponent)
            } else {
                0.0
            }
        } else {
            1.0
        };

        let ambient = material.ambient.modulate(light.ambient_intensity);

        let n_dot_l = normal.dot(light_direction).max(0.0);
        let diffuse = material.diffuse.modulate(light.diffuse_intensity) * n_dot_l;

        let specular = if n_dot_l > 0.0 {
            let to_viewer = if model.viewer_at_infinity {
                Vec3::new(0.0, 0.0, 1.0)
            } else {
                (-eye.xyz()).normalize()
            };
            let half_vector = (light_direction + to_viewer).normalize();
            let n_dot_h = normal.dot(half_vector).max(0.0);
            material.specular.modulate(light.specular_intensity) * n_dot_h.powf(material.shininess)
        } else {
            Vec4::ZERO
        };

        color += (ambient + diffuse + specular) * (attenuation * spotlight_factor);
    }

    color.w = material.diffuse.w;
    color.clamp(0.0, 1.0)
}
