//! Texture unit state and texture coordinate generation

use serde::{Deserialize, Serialize};

use crate::rasterizer::{Mat4, Vec3, Vec4};

/// Coordinate bits of [`TextureUnitConfiguration::tex_coord_generation_enabled`]
pub const TEX_COORD_S: u8 = 1 << 0;
pub const TEX_COORD_T: u8 = 1 << 1;
pub const TEX_COORD_R: u8 = 1 << 2;
pub const TEX_COORD_Q: u8 = 1 << 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TexCoordGenerationMode {
    ObjectLinear,
    EyeLinear,
    SphereMap,
    ReflectionMap,
    NormalMap,
}

/// Generation rule for one of s, t, r, q
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TexCoordGeneration {
    pub mode: TexCoordGenerationMode,
    /// Plane for the linear modes
    pub coefficients: Vec4,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureUnitConfiguration {
    pub enabled: bool,
    pub transformation_matrix: Mat4,
    pub tex_coord_generation: [TexCoordGeneration; 4],
    pub tex_coord_generation_enabled: u8,
}

impl Default for TextureUnitConfiguration {
    fn default() -> Self {
        let generation = |coefficients| TexCoordGeneration { mode: TexCoordGenerationMode::EyeLinear, coefficients };
        Self {
            enabled: false,
            transformation_matrix: Mat4::IDENTITY,
            tex_coord_generation: [
                generation(Vec4::new(1.0, 0.0, 0.0, 0.0)),
                generation(Vec4::new(0.0, 1.0, 0.0, 0.0)),
                generation(Vec4::ZERO),
                generation(Vec4::ZERO),
            ],
            tex_coord_generation_enabled: 0,
        }
    }
}

fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - normal.scale(2.0 * normal.dot(incident))
}

/// Generate a single texture coordinate component (0 = s .. 3 = q)
pub fn generate_coordinate(
    generation: &TexCoordGeneration,
    component: usize,
    position: Vec4,
    eye: Vec4,
    normal: Vec3,
) -> f32 {
    match generation.mode {
        TexCoordGenerationMode::ObjectLinear => generation.coefficients.dot(position),
        TexCoordGenerationMode::EyeLinear => generation.coefficients.dot(eye),
        TexCoordGenerationMode::SphereMap => {
            let reflection = reflect(eye.xyz().normalize(), normal);
            let m = 2.0
                * (reflection.x * reflection.x
                    + reflection.y * reflection.y
                    + (reflection.z + 1.0) * (reflection.z + 1.0))
                    .sqrt();
            if m == 0.0 {
                return 0.5;
            }
            match component {
                0 => reflection.x / m + 0.5,
                1 => reflection.y / m + 0.5,
                _ => 0.0,
            }
        }
        TexCoordGenerationMode::ReflectionMap => reflect(eye.xyz().normalize(), normal).get(component.min(2)),
        TexCoordGenerationMode::NormalMap => normal.get(component.min(2)),
    }
}

impl TextureUnitConfiguration {
    /// Apply generation to the enabled components, then the texture matrix
    pub fn transform_tex_coord(&self, tex_coord: Vec4, position: Vec4, eye: Vec4, normal: Vec3) -> Vec4 {
        let mut result = tex_coord;
        if self.tex_coord_generation_enabled != 0 {
            let component = |i: usize, current: f32| {
                if self.tex_coord_generation_enabled & (1 << i) != 0 {
                    generate_coordinate(&self.tex_coord_generation[i], i, position, eye, normal)
                } else {
                    current
                }
            };
            result = Vec4::new(
                component(0, result.x),
                component(1, result.y),
                component(2, result.z),
                component(3, result.w),
            );
        }
        self.transformation_matrix * result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_generation_only_applies_matrix() {
        let config = TextureUnitConfiguration {
            transformation_matrix: Mat4::scaling(Vec3::new(2.0, 2.0, 1.0)),
            ..Default::default()
        };
        let out = config.transform_tex_coord(Vec4::new(0.25, 0.5, 0.0, 1.0), Vec4::ZERO, Vec4::ZERO, Vec3::ZERO);
        assert_eq!(out, Vec4::new(0.5, 1.0, 0.0, 1.0));
    }

    #[test]
    fn test_object_linear_generation() {
        let mut config = TextureUnitConfiguration {
            tex_coord_generation_enabled: TEX_COORD_S | TEX_COORD_T,
            ..Default::default()
        };
        config.tex_coord_generation[0] = TexCoordGeneration {
            mode: TexCoordGenerationMode::ObjectLinear,
            coefficients: Vec4::new(0.5, 0.0, 0.0, 0.5),
        };
        config.tex_coord_generation[1] = TexCoordGeneration {
            mode: TexCoordGenerationMode::ObjectLinear,
            coefficients: Vec4::new(0.0, 0.0, 1.0, 0.0),
        };
        let position = Vec4::new(1.0, 7.0, 3.0, 1.0);
        let out = config.transform_tex_coord(Vec4::new(9.0, 9.0, 9.0, 1.0), position, Vec4::ZERO, Vec3::ZERO);
        // r and q are not generated and keep their values
        assert_eq!(out, Vec4::new(1.0, 3.0, 9.0, 1.0));
    }

    #[test]
    fn test_sphere_map_facing_viewer() {
        let generation = TexCoordGeneration { mode: TexCoordGenerationMode::SphereMap, coefficients: Vec4::ZERO };
        let eye = Vec4::new(0.0, 0.0, -1.0, 1.0);
        let normal = Vec3::new(0.0, 0.0, 1.0);
        assert_eq!(generate_coordinate(&generation, 0, Vec4::ZERO, eye, normal), 0.5);
        assert_eq!(generate_coordinate(&generation, 1, Vec4::ZERO, eye, normal), 0.5);
    }

    #[test]
    fn test_normal_map_copies_normal() {
        let generation = TexCoordGeneration { mode: TexCoordGenerationMode::NormalMap, coefficients: Vec4::ZERO };
        let normal = Vec3::new(0.1, 0.2, 0.3);
        assert_eq!(generate_coordinate(&generation, 2, Vec4::ZERO, Vec4::ZERO, normal), 0.3);
    }
}
