//! Core rendering functions
//! Quad rasterization with stencil/depth/alpha tests, blending and the
//! triangle, line and point coverage strategies that drive it.

use std::cell::Cell;

use super::math::{IntRect, Vec3, Vec4};
use super::options::{AlphaTestFunction, DepthTestFunction, StencilConfiguration, StencilOperation, StencilTestFunction, WindingOrder};
use super::quad::{PixelQuad, SHADER_INPUT_FIRST_TEXCOORD, SHADER_INPUT_VERTEX_COLOR, SHADER_OUTPUT_FIRST_COLOR};
use super::simd::{F32x4, Mask4, Vec2x4, Vec3x4, Vec4x4};
use super::types::{from_argb32, to_argb32, Face, Triangle, Vertex};
use super::{MAX_ALIASED_POINT_SIZE, NUM_TEXTURE_UNITS, SUBPIXEL_BITS};
use crate::device::Device;

const SUBPIXEL_FACTOR: i64 = 1 << SUBPIXEL_BITS;

/// A window-space point in fixed-point subpixel units
type SubpixelPoint = [i64; 2];

/// Twice the signed area of triangle (a, b, c); positive for counter-clockwise
/// winding with y pointing up. Also the edge value of `c` against edge a→b.
pub fn edge_function(a: SubpixelPoint, b: SubpixelPoint, c: SubpixelPoint) -> i64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

fn to_subpixel(window_coordinates: Vec4) -> SubpixelPoint {
    [
        (window_coordinates.x * SUBPIXEL_FACTOR as f32).round() as i64,
        (window_coordinates.y * SUBPIXEL_FACTOR as f32).round() as i64,
    ]
}

/// Bias for the edge a→b of a counter-clockwise triangle: 0 for top and left
/// edges (pixels on the edge are drawn), 1 otherwise (turns `>= 0` into `> 0`).
fn top_left_bias(a: SubpixelPoint, b: SubpixelPoint) -> i64 {
    let is_top_left = b[1] < a[1] || (b[1] == a[1] && b[0] < a[0]);
    if is_top_left { 0 } else { 1 }
}

/// Re-weight screen-space barycentrics by each vertex's 1/w and renormalize
pub fn perspective_correct_barycentrics(barycentrics: Vec3x4, reciprocal_w: Vec3x4) -> Vec3x4 {
    let weighted = barycentrics * reciprocal_w;
    let interpolated_reciprocal_w = weighted.x + weighted.y + weighted.z;
    weighted / interpolated_reciprocal_w
}

/// New stencil value after applying `op`, honoring the write mask
pub fn apply_stencil_operation(value: u8, op: StencilOperation, reference: u8, write_mask: u8) -> u8 {
    let new_value = match op {
        StencilOperation::Keep => return value,
        StencilOperation::Zero => 0,
        StencilOperation::Replace => reference,
        StencilOperation::Increment => value.saturating_add(1),
        StencilOperation::IncrementWrap => value.wrapping_add(1),
        StencilOperation::Decrement => value.saturating_sub(1),
        StencilOperation::DecrementWrap => value.wrapping_sub(1),
        StencilOperation::Invert => !value,
    };
    (value & !write_mask) | (new_value & write_mask)
}

/// `reference OP stored`, both already masked with the test mask
fn stencil_test(func: StencilTestFunction, reference: u8, stored: [u8; 4]) -> Mask4 {
    Mask4::from_fn(|i| {
        let value = stored[i];
        match func {
            StencilTestFunction::Always => true,
            StencilTestFunction::Never => false,
            StencilTestFunction::Equal => reference == value,
            StencilTestFunction::NotEqual => reference != value,
            StencilTestFunction::Less => reference < value,
            StencilTestFunction::LessOrEqual => reference <= value,
            StencilTestFunction::Greater => reference > value,
            StencilTestFunction::GreaterOrEqual => reference >= value,
        }
    })
}

/// `incoming OP stored`
fn depth_test(func: DepthTestFunction, incoming: F32x4, stored: F32x4) -> Mask4 {
    match func {
        DepthTestFunction::Always => Mask4::ALL,
        DepthTestFunction::Never => Mask4::NONE,
        DepthTestFunction::Equal => incoming.bits_eq(stored),
        DepthTestFunction::NotEqual => !incoming.bits_eq(stored),
        DepthTestFunction::Less => incoming.lt(stored),
        DepthTestFunction::LessOrEqual => incoming.le(stored),
        DepthTestFunction::Greater => incoming.gt(stored),
        DepthTestFunction::GreaterOrEqual => incoming.ge(stored),
    }
}

impl Device {
    /// Walk every 2x2 quad intersecting `render_bounds` and run the per-fragment
    /// pipeline on it. The three callbacks supply coverage, depth and
    /// interpolated attributes for the primitive being drawn.
    pub(crate) fn rasterize<C, D, A>(
        &mut self,
        mut render_bounds: IntRect,
        face: Face,
        mut set_coverage_mask: C,
        mut set_quad_depth: D,
        mut set_quad_attributes: A,
    ) where
        C: FnMut(&mut PixelQuad),
        D: FnMut(&mut PixelQuad),
        A: FnMut(&mut PixelQuad),
    {
        if self.options.alpha_test_rejects_all() {
            return;
        }

        let stencil_configuration = self.stencil_configuration[face as usize];
        let stencil_reference_value = stencil_configuration.reference_value & stencil_configuration.test_mask;

        // Limit rendering to framebuffer and scissor rects
        render_bounds.intersect(&self.frame_buffer.rect());
        if self.options.scissor_enabled {
            render_bounds.intersect(&self.options.scissor_box);
        }
        if render_bounds.is_empty() {
            return;
        }

        let left = F32x4::splat(render_bounds.min_x() as f32);
        let right = F32x4::splat(render_bounds.max_x() as f32);
        let top = F32x4::splat(render_bounds.min_y() as f32);
        let bottom = F32x4::splat(render_bounds.max_y() as f32);

        let qx0 = render_bounds.min_x() & !1;
        let qx1 = render_bounds.max_x() & !1;
        let qy0 = render_bounds.min_y() & !1;
        let qy1 = render_bounds.max_y() & !1;

        for qy in (qy0..=qy1).step_by(2) {
            for qx in (qx0..=qx1).step_by(2) {
                let mut quad = PixelQuad::new(qx, qy);

                // Coverage, limited to the render bounds
                set_coverage_mask(&mut quad);
                let x = quad.screen_coordinates.x.to_f32();
                let y = quad.screen_coordinates.y.to_f32();
                quad.narrow_mask(x.ge(left) & x.le(right) & y.ge(top) & y.le(bottom));
                if quad.mask().none() {
                    continue;
                }

                self.statistics.num_quads += 1;
                self.statistics.num_pixels += quad.mask().count();

                let (xs, ys) = quad.xs_ys();

                // Stencil testing
                let mut stencil_value = [0u8; 4];
                if self.options.enable_stencil_test {
                    stencil_value = self.frame_buffer.stencil_buffer().load4(xs, ys, quad.mask().0);
                    let masked = stencil_value.map(|v| v & stencil_configuration.test_mask);
                    let passed = stencil_test(stencil_configuration.test_function, stencil_reference_value, masked);

                    let failed = quad.mask() & !passed;
                    self.write_stencil(xs, ys, stencil_value, stencil_configuration.on_stencil_test_fail, &stencil_configuration, failed);

                    quad.narrow_mask(passed);
                    if quad.mask().none() {
                        continue;
                    }
                }

                // Depth testing
                if self.options.enable_depth_test {
                    set_quad_depth(&mut quad);
                    let stored = F32x4(self.frame_buffer.depth_buffer().load4(xs, ys, quad.mask().0));
                    let passed = depth_test(self.options.depth_func, quad.depth, stored);

                    if self.options.enable_stencil_test {
                        let failed = quad.mask() & !passed;
                        self.write_stencil(xs, ys, stencil_value, stencil_configuration.on_depth_test_fail, &stencil_configuration, failed);
                    }

                    quad.narrow_mask(passed);
                    if quad.mask().none() {
                        continue;
                    }
                }

                // Stencil pass operation for fragments that survived both tests
                if self.options.enable_stencil_test {
                    self.write_stencil(xs, ys, stencil_value, stencil_configuration.on_pass, &stencil_configuration, quad.mask());
                }

                self.statistics.num_pixels_shaded += quad.mask().count();

                set_quad_attributes(&mut quad);
                self.shade_fragments(&mut quad);

                if self.options.enable_alpha_test {
                    self.test_alpha(&mut quad);
                    if quad.mask().none() {
                        continue;
                    }
                }

                if self.options.enable_depth_test && self.options.enable_depth_write {
                    self.frame_buffer
                        .depth_buffer_mut()
                        .store4(xs, ys, quad.depth.0, quad.mask().0);
                }

                let color_mask = self.options.color_mask;
                if !self.options.enable_color_write || color_mask == 0 {
                    continue;
                }

                let destination = if self.options.enable_blending || color_mask != 0xffff_ffff {
                    self.frame_buffer.color_buffer().load4(xs, ys, quad.mask().0)
                } else {
                    [0; 4]
                };

                let mut out_color = quad.output_vec4(SHADER_OUTPUT_FIRST_COLOR);
                if self.options.enable_blending {
                    self.statistics.num_pixels_blended += quad.mask().count();
                    out_color = self.alpha_blend_factors.blend(&out_color, &from_argb32(destination));
                }

                let mut argb = to_argb32(&out_color);
                if color_mask != 0xffff_ffff {
                    argb = std::array::from_fn(|i| (argb[i] & color_mask) | (destination[i] & !color_mask));
                }
                self.frame_buffer.color_buffer_mut().store4(xs, ys, argb, quad.mask().0);
            }
        }
    }

    fn write_stencil(
        &mut self,
        xs: [i32; 4],
        ys: [i32; 4],
        stencil_value: [u8; 4],
        op: StencilOperation,
        configuration: &StencilConfiguration,
        lanes: Mask4,
    ) {
        if configuration.write_mask == 0 || op == StencilOperation::Keep || lanes.none() {
            return;
        }
        let new_values = stencil_value.map(|v| {
            apply_stencil_operation(v, op, configuration.reference_value, configuration.write_mask)
        });
        self.statistics.num_stencil_writes += lanes.count();
        self.frame_buffer
            .stencil_buffer_mut()
            .store4(xs, ys, new_values, lanes.0);
    }

    fn test_alpha(&self, quad: &mut PixelQuad) {
        let alpha = quad.output(SHADER_OUTPUT_FIRST_COLOR + 3);
        let reference = F32x4::splat(self.options.alpha_test_ref_value);
        let passed = match self.options.alpha_test_func {
            AlphaTestFunction::Always => Mask4::ALL,
            AlphaTestFunction::Never => Mask4::NONE,
            AlphaTestFunction::Equal => alpha.float_eq(reference),
            AlphaTestFunction::NotEqual => !alpha.float_eq(reference),
            AlphaTestFunction::Less => alpha.lt(reference),
            AlphaTestFunction::LessOrEqual => alpha.le(reference),
            AlphaTestFunction::Greater => alpha.gt(reference),
            AlphaTestFunction::GreaterOrEqual => alpha.ge(reference),
        };
        quad.narrow_mask(passed);
    }

    /// Rasterize a single triangle whose window coordinates are set
    pub(crate) fn rasterize_triangle(&mut self, triangle: &Triangle) {
        if self.options.alpha_test_rejects_all() {
            return;
        }

        let mut vertices = triangle.vertices;
        let mut v = vertices.map(|vertex| to_subpixel(vertex.window_coordinates));

        let mut area = edge_function(v[0], v[1], v[2]);
        if area == 0 {
            return;
        }

        let is_front = match self.options.front_face {
            WindingOrder::CounterClockwise => area > 0,
            WindingOrder::Clockwise => area < 0,
        };
        if self.options.enable_culling
            && ((is_front && self.options.cull_front) || (!is_front && self.options.cull_back))
        {
            return;
        }
        let face = if is_front { Face::Front } else { Face::Back };

        self.statistics.num_rasterized_triangles += 1;

        // Flat shading takes the color of the provoking (last) vertex; primitive
        // assembly copies it to every vertex of quads and clipped polygons
        let flat_color = vertices[2].color;

        // Force counter-clockwise ordering of vertices
        if area < 0 {
            vertices.swap(0, 1);
            v.swap(0, 1);
            area = -area;
        }

        let one_over_area = 1.0 / area as f32;
        let bias = [
            top_left_bias(v[1], v[2]),
            top_left_bias(v[2], v[0]),
            top_left_bias(v[0], v[1]),
        ];

        let min_x = v.iter().map(|p| p[0]).min().unwrap_or(0) >> SUBPIXEL_BITS;
        let max_x = v.iter().map(|p| p[0]).max().unwrap_or(0) >> SUBPIXEL_BITS;
        let min_y = v.iter().map(|p| p[1]).min().unwrap_or(0) >> SUBPIXEL_BITS;
        let max_y = v.iter().map(|p| p[1]).max().unwrap_or(0) >> SUBPIXEL_BITS;
        let render_bounds = IntRect::from_corners(min_x as i32, min_y as i32, max_x as i32, max_y as i32);

        let [vertex0, vertex1, vertex2] = vertices;
        let window_z = Vec3::new(
            vertex0.window_coordinates.z,
            vertex1.window_coordinates.z,
            vertex2.window_coordinates.z,
        );

        // Slope-scaled depth offset, approximating the maximum slope by the
        // largest depth delta over the bounds
        let depth_offset = if self.options.depth_offset_enabled {
            let delta_z = (window_z.x - window_z.y)
                .abs()
                .max((window_z.y - window_z.z).abs())
                .max((window_z.z - window_z.x).abs());
            let max_slope = (delta_z / render_bounds.width as f32).max(delta_z / render_bounds.height as f32);
            max_slope * self.options.depth_offset_factor + f32::EPSILON * self.options.depth_offset_constant
        } else {
            0.0
        };

        let window_z = Vec3x4::splat(window_z);
        let reciprocal_w = Vec3x4::splat(Vec3::new(
            vertex0.window_coordinates.w,
            vertex1.window_coordinates.w,
            vertex2.window_coordinates.w,
        ));

        // Eye-space |z| approximates the fragment's distance to the eye for fog
        let fog_enabled = self.options.fog_enabled;
        let fog_depth = Vec3x4::splat(Vec3::new(
            vertex0.eye_coordinates.z.abs(),
            vertex1.eye_coordinates.z.abs(),
            vertex2.eye_coordinates.z.abs(),
        ));
        let shade_smooth = self.options.shade_smooth;

        self.rasterize(
            render_bounds,
            face,
            |quad| {
                let mut covered = [false; 4];
                let mut barycentrics = Vec3x4::default();
                for lane in 0..4 {
                    let p = [
                        quad.screen_coordinates.x.lane(lane) as i64 * SUBPIXEL_FACTOR + SUBPIXEL_FACTOR / 2,
                        quad.screen_coordinates.y.lane(lane) as i64 * SUBPIXEL_FACTOR + SUBPIXEL_FACTOR / 2,
                    ];
                    let edges = [
                        edge_function(v[1], v[2], p),
                        edge_function(v[2], v[0], p),
                        edge_function(v[0], v[1], p),
                    ];
                    covered[lane] = edges[0] >= bias[0] && edges[1] >= bias[1] && edges[2] >= bias[2];
                    barycentrics.x.0[lane] = edges[0] as f32 * one_over_area;
                    barycentrics.y.0[lane] = edges[1] as f32 * one_over_area;
                    barycentrics.z.0[lane] = edges[2] as f32 * one_over_area;
                }
                quad.set_coverage_mask(Mask4(covered));
                quad.barycentrics = barycentrics;
            },
            |quad| {
                // Window z was divided by w already, so screen-space weights apply
                quad.depth = window_z.dot(quad.barycentrics) + depth_offset;
            },
            |quad| {
                let weights = perspective_correct_barycentrics(quad.barycentrics, reciprocal_w);

                let color = if shade_smooth {
                    Vec4x4::interpolate(vertex0.color, vertex1.color, vertex2.color, weights)
                } else {
                    Vec4x4::splat(flat_color)
                };
                quad.set_input_vec4(SHADER_INPUT_VERTEX_COLOR, color);

                for unit in 0..NUM_TEXTURE_UNITS {
                    let tex_coords = Vec4x4::interpolate(
                        vertex0.tex_coords[unit],
                        vertex1.tex_coords[unit],
                        vertex2.tex_coords[unit],
                        weights,
                    );
                    quad.set_input_vec4(SHADER_INPUT_FIRST_TEXCOORD + unit * 4, tex_coords);
                }

                if fog_enabled {
                    quad.fog_depth = fog_depth.dot(weights);
                }
            },
        );
    }

    /// Rasterize a segment whose window coordinates are set
    pub(crate) fn rasterize_line(&mut self, from: &Vertex, to: &Vertex) {
        let from_coords = from.window_coordinates.xy();
        let to_coords = to.window_coordinates.xy();
        let line_width = self.options.line_width.max(1.0);
        let line_radius = line_width / 2.0;
        let antialiased = self.options.line_smooth;

        let render_bounds = IntRect::from_corners(
            from_coords.x.min(to_coords.x).floor() as i32,
            from_coords.y.min(to_coords.y).floor() as i32,
            from_coords.x.max(to_coords.x).ceil() as i32,
            from_coords.y.max(to_coords.y).ceil() as i32,
        )
        .inflated(line_width.ceil() as i32);

        let from4 = Vec2x4::splat(from_coords);
        let line_vector = to_coords - from_coords;
        let line_vector4 = Vec2x4::splat(line_vector);
        let line_dot = line_vector.dot(line_vector);
        let line_length = line_dot.sqrt();

        let from_depth = F32x4::splat(from.window_coordinates.z);
        let to_depth = F32x4::splat(to.window_coordinates.z);
        let (from_color, to_color) = (Vec4x4::splat(from.color), Vec4x4::splat(to.color));
        let shade_smooth = self.options.shade_smooth;
        let from_tex: [Vec4x4; NUM_TEXTURE_UNITS] = std::array::from_fn(|i| Vec4x4::splat(from.tex_coords[i]));
        let to_tex: [Vec4x4; NUM_TEXTURE_UNITS] = std::array::from_fn(|i| Vec4x4::splat(to.tex_coords[i]));
        let from_fog = F32x4::splat(from.eye_coordinates.z.abs());
        let to_fog = F32x4::splat(to.eye_coordinates.z.abs());

        // Position along the segment (0 at `from`, 1 at `to`) shared by the callbacks
        let distance_along_line = Cell::new(F32x4::ZERO);

        self.rasterize(
            render_bounds,
            Face::Front,
            |quad| {
                let (cx, cy) = quad.pixel_centers();
                let pixel_vector = Vec2x4 { x: cx, y: cy } - from4;
                let along = if line_dot > 0.0 {
                    pixel_vector.dot(line_vector4) / line_dot
                } else {
                    F32x4::ZERO
                };
                let clamped = along.clamp(0.0, 1.0);
                distance_along_line.set(clamped);

                if antialiased {
                    // Signed distance to a capsule; the +0.5 centers the coverage ramp on the border
                    let distance_to_line = (pixel_vector - line_vector4 * clamped).len() - line_radius;
                    quad.coverage = 1.0 - (distance_to_line + 0.5).clamp(0.0, 1.0);
                    quad.set_coverage_mask(quad.coverage.gt(F32x4::ZERO));
                } else {
                    // Solid rectangle of `line_width` along the segment
                    if line_length == 0.0 {
                        quad.set_coverage_mask(Mask4::NONE);
                        return;
                    }
                    let perpendicular = ((pixel_vector.x * line_vector.y - pixel_vector.y * line_vector.x) / line_length).abs();
                    let inside = along.ge(F32x4::ZERO) & along.le(F32x4::ONE) & perpendicular.le(F32x4::splat(line_radius));
                    quad.coverage = F32x4::ONE;
                    quad.set_coverage_mask(inside);
                }
            },
            |quad| {
                quad.depth = F32x4::mix(from_depth, to_depth, distance_along_line.get());
            },
            |quad| {
                let t = distance_along_line.get();
                let color = if shade_smooth { Vec4x4::mix(from_color, to_color, t) } else { to_color };
                quad.set_input_vec4(SHADER_INPUT_VERTEX_COLOR, color);
                for unit in 0..NUM_TEXTURE_UNITS {
                    quad.set_input_vec4(
                        SHADER_INPUT_FIRST_TEXCOORD + unit * 4,
                        Vec4x4::mix(from_tex[unit], to_tex[unit], t),
                    );
                }
                quad.fog_depth = F32x4::mix(from_fog, to_fog, t);
            },
        );
    }

    /// Rasterize a point whose window coordinates are set
    pub(crate) fn rasterize_point(&mut self, point: &Vertex) {
        let center = point.window_coordinates.xy();
        let antialiased = self.options.point_smooth;

        let render_bounds = if antialiased {
            let radius = self.options.point_size / 2.0;
            IntRect::from_corners(
                (center.x - radius).floor() as i32,
                (center.y - radius).floor() as i32,
                (center.x + radius).ceil() as i32,
                (center.y + radius).ceil() as i32,
            )
        } else {
            // Odd widths center on the nearest pixel center, even widths on the nearest corner
            let width = (self.options.point_size.round() as i32).clamp(1, MAX_ALIASED_POINT_SIZE);
            let (x, y) = if width % 2 == 1 {
                (center.x.floor() as i32, center.y.floor() as i32)
            } else {
                (center.x.round() as i32, center.y.round() as i32)
            };
            IntRect::new(x - width / 2, y - width / 2, width, width)
        };

        let center4 = Vec2x4::splat(center);
        let radius = self.options.point_size / 2.0;
        let depth = F32x4::splat(point.window_coordinates.z);
        let color = Vec4x4::splat(point.color);
        let tex_coords: [Vec4x4; NUM_TEXTURE_UNITS] = std::array::from_fn(|i| Vec4x4::splat(point.tex_coords[i]));
        let fog_depth = F32x4::splat(point.eye_coordinates.z.abs());

        self.rasterize(
            render_bounds,
            Face::Front,
            |quad| {
                if antialiased {
                    let (cx, cy) = quad.pixel_centers();
                    let distance_to_point = (Vec2x4 { x: cx, y: cy } - center4).len();
                    // The +0.5 moves the coverage ramp to straddle the disc border
                    quad.coverage = 1.0 - (distance_to_point - radius + 0.5).clamp(0.0, 1.0);
                    quad.set_coverage_mask(quad.coverage.gt(F32x4::ZERO));
                } else {
                    quad.coverage = F32x4::ONE;
                    quad.set_coverage_mask(Mask4::ALL);
                }
            },
            |quad| quad.depth = depth,
            |quad| {
                quad.set_input_vec4(SHADER_INPUT_VERTEX_COLOR, color);
                for (unit, tex_coord) in tex_coords.iter().enumerate() {
                    quad.set_input_vec4(SHADER_INPUT_FIRST_TEXCOORD + unit * 4, *tex_coord);
                }
                quad.fog_depth = fog_depth;
            },
        );
    }
}
