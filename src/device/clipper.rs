//! Homogeneous clipping of points, segments and polygons
//!
//! Frustum planes are tested in clip space (`-w <= x, y, z <= w`), user planes
//! in eye space (`plane . eye >= 0`). Polygons are clipped plane by plane with
//! Sutherland-Hodgman; new vertices interpolate every attribute.

use crate::rasterizer::{Vec4, Vertex};

/// Frustum planes as clip-space equations: left, right, bottom, top, near, far
const FRUSTUM_PLANES: [Vec4; 6] = [
    Vec4::new(1.0, 0.0, 0.0, 1.0),
    Vec4::new(-1.0, 0.0, 0.0, 1.0),
    Vec4::new(0.0, 1.0, 0.0, 1.0),
    Vec4::new(0.0, -1.0, 0.0, 1.0),
    Vec4::new(0.0, 0.0, 1.0, 1.0),
    Vec4::new(0.0, 0.0, -1.0, 1.0),
];

/// Vertex at `t` along the edge `a` → `b`
fn interpolate_vertex(a: &Vertex, b: &Vertex, t: f32) -> Vertex {
    Vertex {
        position: a.position.mix(b.position, t),
        eye_coordinates: a.eye_coordinates.mix(b.eye_coordinates, t),
        clip_coordinates: a.clip_coordinates.mix(b.clip_coordinates, t),
        window_coordinates: a.window_coordinates.mix(b.window_coordinates, t),
        color: a.color.mix(b.color, t),
        tex_coords: std::array::from_fn(|i| a.tex_coords[i].mix(b.tex_coords[i], t)),
        normal: a.normal + (b.normal - a.normal) * t,
    }
}

/// True when a clip-space position lies inside the view volume
pub fn is_inside_frustum(clip_coordinates: Vec4) -> bool {
    FRUSTUM_PLANES.iter().all(|plane| plane.dot(clip_coordinates) >= 0.0)
}

fn frustum_distance(plane: Vec4) -> impl Fn(&Vertex) -> f32 {
    move |vertex| plane.dot(vertex.clip_coordinates)
}

fn user_plane_distance(plane: Vec4) -> impl Fn(&Vertex) -> f32 {
    move |vertex| plane.dot(vertex.eye_coordinates)
}

/// Polygon clipper with a reusable scratch buffer
#[derive(Debug, Default)]
pub struct Clipper {
    scratch: Vec<Vertex>,
}

impl Clipper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop points outside the view volume
    pub fn clip_points_against_frustum(&mut self, points: &mut Vec<Vertex>) {
        points.retain(|point| is_inside_frustum(point.clip_coordinates));
    }

    /// Clip a segment in place. Returns false when it lies entirely outside.
    pub fn clip_line_against_frustum(&self, from: &mut Vertex, to: &mut Vertex) -> bool {
        for plane in FRUSTUM_PLANES {
            let distance = frustum_distance(plane);
            let (d_from, d_to) = (distance(from), distance(to));
            let (from_inside, to_inside) = (d_from >= 0.0, d_to >= 0.0);

            if !from_inside && !to_inside {
                return false;
            }
            if from_inside && to_inside {
                continue;
            }

            let t = d_from / (d_from - d_to);
            let intersection = interpolate_vertex(from, to, t);
            if from_inside {
                *to = intersection;
            } else {
                *from = intersection;
            }
        }
        true
    }

    /// Clip a convex polygon against the view volume; it may grow or become empty
    pub fn clip_triangle_against_frustum(&mut self, polygon: &mut Vec<Vertex>) {
        for plane in FRUSTUM_PLANES {
            self.clip_polygon(polygon, frustum_distance(plane));
            if polygon.is_empty() {
                return;
            }
        }
    }

    /// Clip a convex polygon against eye-space user planes
    pub fn clip_triangle_against_user_defined(&mut self, polygon: &mut Vec<Vertex>, planes: &[Vec4]) {
        for plane in planes {
            self.clip_polygon(polygon, user_plane_distance(*plane));
            if polygon.is_empty() {
                return;
            }
        }
    }

    fn clip_polygon(&mut self, polygon: &mut Vec<Vertex>, distance: impl Fn(&Vertex) -> f32) {
        self.scratch.clear();
        let count = polygon.len();
        for i in 0..count {
            let current = &polygon[i];
            let next = &polygon[(i + 1) % count];
            let (d_current, d_next) = (distance(current), distance(next));
            let current_inside = d_current >= 0.0;

            if current_inside {
                self.scratch.push(*current);
            }
            if current_inside != (d_next >= 0.0) {
                self.scratch
                    .push(interpolate_vertex(current, next, d_current / (d_current - d_next)));
            }
        }
        std::mem::swap(polygon, &mut self.scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip_vertex(x: f32, y: f32, z: f32, w: f32) -> Vertex {
        Vertex {
            clip_coordinates: Vec4::new(x, y, z, w),
            eye_coordinates: Vec4::new(x, y, z, 1.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_inside_triangle_is_untouched() {
        let mut clipper = Clipper::new();
        let mut polygon = vec![
            clip_vertex(-0.5, -0.5, 0.0, 1.0),
            clip_vertex(0.5, -0.5, 0.0, 1.0),
            clip_vertex(0.0, 0.5, 0.0, 1.0),
        ];
        let original = polygon.clone();
        clipper.clip_triangle_against_frustum(&mut polygon);
        assert_eq!(polygon, original);
    }

    #[test]
    fn test_straddling_triangle_gains_vertex() {
        let mut clipper = Clipper::new();
        // One vertex past the right plane: the corner is cut off, leaving a quad
        let mut polygon = vec![
            clip_vertex(0.0, -0.5, 0.0, 1.0),
            clip_vertex(2.0, 0.0, 0.0, 1.0),
            clip_vertex(0.0, 0.5, 0.0, 1.0),
        ];
        clipper.clip_triangle_against_frustum(&mut polygon);
        assert_eq!(polygon.len(), 4);
        for vertex in &polygon {
            assert!(vertex.clip_coordinates.x <= 1.0 + 1e-6);
        }
    }

    #[test]
    fn test_outside_triangle_is_removed() {
        let mut clipper = Clipper::new();
        let mut polygon = vec![
            clip_vertex(2.0, 0.0, 0.0, 1.0),
            clip_vertex(3.0, 0.0, 0.0, 1.0),
            clip_vertex(2.5, 1.0, 0.0, 1.0),
        ];
        clipper.clip_triangle_against_frustum(&mut polygon);
        assert!(polygon.is_empty());
    }

    #[test]
    fn test_line_clipping_interpolates_attributes() {
        let clipper = Clipper::new();
        let mut from = clip_vertex(0.0, 0.0, 0.0, 1.0);
        from.color = Vec4::new(0.0, 0.0, 0.0, 1.0);
        let mut to = clip_vertex(3.0, 0.0, 0.0, 1.0);
        to.color = Vec4::new(1.0, 1.0, 1.0, 1.0);

        assert!(clipper.clip_line_against_frustum(&mut from, &mut to));
        assert!((to.clip_coordinates.x - 1.0).abs() < 1e-6);
        assert!((to.color.x - 1.0 / 3.0).abs() < 1e-6);

        let mut a = clip_vertex(2.0, 0.0, 0.0, 1.0);
        let mut b = clip_vertex(3.0, 0.0, 0.0, 1.0);
        assert!(!clipper.clip_line_against_frustum(&mut a, &mut b));
    }

    #[test]
    fn test_points_outside_are_dropped() {
        let mut clipper = Clipper::new();
        let mut points = vec![clip_vertex(0.0, 0.0, 0.0, 1.0), clip_vertex(0.0, 0.0, -2.0, 1.0)];
        clipper.clip_points_against_frustum(&mut points);
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_user_plane_clips_in_eye_space() {
        let mut clipper = Clipper::new();
        let mut polygon = vec![
            clip_vertex(-1.0, 0.0, 0.0, 1.0),
            clip_vertex(1.0, 0.0, 0.0, 1.0),
            clip_vertex(1.0, 1.0, 0.0, 1.0),
        ];
        // Keep x >= 0
        clipper.clip_triangle_against_user_defined(&mut polygon, &[Vec4::new(1.0, 0.0, 0.0, 0.0)]);
        assert!(!polygon.is_empty());
        for vertex in &polygon {
            assert!(vertex.eye_coordinates.x >= -1e-6);
        }
    }
}
