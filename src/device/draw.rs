//! Vertex processing, primitive assembly and the draw entry point

use super::clipper::is_inside_frustum;
use super::lighting::{apply_color_material, light_vertex};
use super::Device;
use crate::rasterizer::{Face, Mat3, PrimitiveType, Triangle, Vec4, Vertex};

/// Current raster position used by pixel rectangle blits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterPosition {
    pub window_coordinates: Vec4,
    pub eye_coordinate_distance: f32,
    /// False when the last position set fell outside the view volume
    pub valid: bool,
}

impl Default for RasterPosition {
    fn default() -> Self {
        Self {
            window_coordinates: Vec4::new(0.0, 0.0, 0.0, 1.0),
            eye_coordinate_distance: 0.0,
            valid: true,
        }
    }
}

/// Vertex index triples for a triangle topology. Incomplete trailing
/// primitives are dropped.
pub fn triangle_indices(primitive_type: PrimitiveType, count: usize) -> Vec<[usize; 3]> {
    match primitive_type {
        PrimitiveType::Triangles => (0..count / 3).map(|i| [3 * i, 3 * i + 1, 3 * i + 2]).collect(),
        PrimitiveType::Quads => (0..count / 4)
            .flat_map(|q| {
                let i = 4 * q;
                [[i, i + 1, i + 2], [i + 2, i + 3, i]]
            })
            .collect(),
        PrimitiveType::TriangleFan => (1..count.saturating_sub(1)).map(|i| [0, i, i + 1]).collect(),
        // Odd triangles swap their first two vertices to keep a consistent winding
        PrimitiveType::TriangleStrip => (0..count.saturating_sub(2))
            .map(|i| if i % 2 == 0 { [i, i + 1, i + 2] } else { [i + 1, i, i + 2] })
            .collect(),
        _ => Vec::new(),
    }
}

/// Index of the vertex whose color a flat-shaded triangle takes: the last
/// vertex of the primitive it was assembled from
pub fn provoking_vertex(primitive_type: PrimitiveType, [a, b, c]: [usize; 3]) -> usize {
    match primitive_type {
        PrimitiveType::Quads => a - a % 4 + 3,
        _ => a.max(b).max(c),
    }
}

/// Vertex index pairs for a line topology
pub fn line_indices(primitive_type: PrimitiveType, count: usize) -> Vec<[usize; 2]> {
    match primitive_type {
        PrimitiveType::Lines => (0..count / 2).map(|i| [2 * i, 2 * i + 1]).collect(),
        PrimitiveType::LineStrip => (0..count.saturating_sub(1)).map(|i| [i, i + 1]).collect(),
        PrimitiveType::LineLoop => {
            let mut segments: Vec<[usize; 2]> = (0..count.saturating_sub(1)).map(|i| [i, i + 1]).collect();
            if count >= 2 {
                segments.push([count - 1, 0]);
            }
            segments
        }
        _ => Vec::new(),
    }
}

impl Device {
    /// Transform, light, assemble, clip and rasterize a batch of vertices
    pub fn draw_primitives(&mut self, primitive_type: PrimitiveType, vertices: &[Vertex]) {
        if vertices.is_empty() {
            return;
        }
        self.statistics.num_draw_calls += 1;
        log::debug!("draw {:?} with {} vertices", primitive_type, vertices.len());

        let transformed = self.process_vertices(vertices);

        match primitive_type {
            PrimitiveType::Points => self.draw_points(transformed),
            PrimitiveType::Lines | PrimitiveType::LineLoop | PrimitiveType::LineStrip => {
                self.draw_lines(primitive_type, &transformed)
            }
            PrimitiveType::Triangles
            | PrimitiveType::TriangleStrip
            | PrimitiveType::TriangleFan
            | PrimitiveType::Quads => self.draw_triangles(primitive_type, &transformed),
        }
    }

    /// Eye, clip and texture coordinates plus lit colors for every vertex
    fn process_vertices(&self, vertices: &[Vertex]) -> Vec<Vertex> {
        let normal_transform = match self.model_view_transform.top_left_3x3().inverse() {
            Some(inverse) => inverse.transpose(),
            None => {
                log::debug!("model-view matrix is singular, normals are not transformed");
                Mat3::IDENTITY
            }
        };

        let front_material = &self.materials[Face::Front as usize];
        let options = &self.options;

        vertices
            .iter()
            .map(|vertex| {
                let mut v = *vertex;
                v.eye_coordinates = self.model_view_transform * v.position;

                v.normal = normal_transform * v.normal;
                if options.normalization_enabled {
                    v.normal = v.normal.normalize();
                }

                if options.lighting_enabled {
                    let material = if options.color_material_enabled {
                        apply_color_material(
                            front_material,
                            v.color,
                            options.color_material_face,
                            options.color_material_mode,
                        )
                    } else {
                        *front_material
                    };
                    v.color = light_vertex(v.eye_coordinates, v.normal, &material, &self.lighting_model, &self.lights);
                }

                v.clip_coordinates = self.projection_transform * v.eye_coordinates;

                for (tex_coord, configuration) in v.tex_coords.iter_mut().zip(&self.texture_unit_configuration) {
                    *tex_coord = configuration.transform_tex_coord(*tex_coord, v.position, v.eye_coordinates, v.normal);
                }
                v
            })
            .collect()
    }

    /// Perspective divide and viewport transform; w holds 1 / clip w
    pub(crate) fn window_coordinates(&self, clip_coordinates: Vec4) -> Vec4 {
        let viewport = self.options.viewport;
        let half_width = viewport.width as f32 / 2.0;
        let half_height = viewport.height as f32 / 2.0;
        let center_x = viewport.x as f32 + half_width;
        let center_y = viewport.y as f32 + half_height;
        let depth_half_range = (self.options.depth_max - self.options.depth_min) / 2.0;
        let depth_halfway = (self.options.depth_min + self.options.depth_max) / 2.0;

        let one_over_w = 1.0 / clip_coordinates.w;
        let ndc = clip_coordinates.xyz().scale(one_over_w);
        Vec4::new(
            center_x + ndc.x * half_width,
            center_y + ndc.y * half_height,
            depth_halfway + ndc.z * depth_half_range,
            one_over_w,
        )
    }

    fn draw_points(&mut self, mut points: Vec<Vertex>) {
        self.clipper.clip_points_against_frustum(&mut points);
        for mut point in points {
            point.window_coordinates = self.window_coordinates(point.clip_coordinates);
            self.rasterize_point(&point);
        }
    }

    fn draw_lines(&mut self, primitive_type: PrimitiveType, vertices: &[Vertex]) {
        for [a, b] in line_indices(primitive_type, vertices.len()) {
            let (mut from, mut to) = (vertices[a], vertices[b]);
            if !self.options.shade_smooth {
                // Clipping must not move the provoking vertex's color
                from.color = to.color;
            }
            if !self.clipper.clip_line_against_frustum(&mut from, &mut to) {
                continue;
            }
            from.window_coordinates = self.window_coordinates(from.clip_coordinates);
            to.window_coordinates = self.window_coordinates(to.clip_coordinates);
            self.rasterize_line(&from, &to);
        }
    }

    fn draw_triangles(&mut self, primitive_type: PrimitiveType, vertices: &[Vertex]) {
        let mut polygon = Vec::with_capacity(8);
        for indices @ [a, b, c] in triangle_indices(primitive_type, vertices.len()) {
            polygon.clear();
            polygon.extend([vertices[a], vertices[b], vertices[c]]);

            self.clipper.clip_triangle_against_frustum(&mut polygon);
            if !self.clip_planes.is_empty() {
                self.clipper
                    .clip_triangle_against_user_defined(&mut polygon, &self.clip_planes);
            }
            if polygon.len() < 3 {
                continue;
            }

            let flat_color = (!self.options.shade_smooth).then(|| vertices[provoking_vertex(primitive_type, indices)].color);
            for vertex in polygon.iter_mut() {
                vertex.window_coordinates = self.window_coordinates(vertex.clip_coordinates);
                if let Some(color) = flat_color {
                    vertex.color = color;
                }
            }

            // Clipping can produce a convex polygon; draw it as a fan
            for i in 1..polygon.len() - 1 {
                self.rasterize_triangle(&Triangle::new(polygon[0], polygon[i], polygon[i + 1]));
            }
        }
    }

    /// Run `position` through the vertex transforms to place pixel rectangles
    pub fn set_raster_position(&mut self, position: Vec4) {
        let eye_coordinates = self.model_view_transform * position;
        let clip_coordinates = self.projection_transform * eye_coordinates;
        let valid = is_inside_frustum(clip_coordinates);
        self.raster_position = RasterPosition {
            window_coordinates: if valid {
                self.window_coordinates(clip_coordinates)
            } else {
                self.raster_position.window_coordinates
            },
            eye_coordinate_distance: eye_coordinates.xyz().len(),
            valid,
        };
    }
}
