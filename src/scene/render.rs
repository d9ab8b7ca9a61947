//! Headless rendering of a scene through the device

use std::rc::Rc;

use image::RgbaImage;

use super::description::fit_to_output;
use super::Scene;
use crate::device::{Device, Statistics, TextureUnitConfiguration};
use crate::error::{Error, Result};
use crate::rasterizer::{Face, Vertex, MAX_CLIP_PLANES, NUM_LIGHTS};
use crate::texture::{Image, SamplerConfig};

/// Set up a device for `scene`, issue its draw calls and read back the color buffer
pub fn render_scene(scene: &Scene) -> Result<RgbaImage> {
    render_scene_with_statistics(scene).map(|(image, _)| image)
}

/// Render `scene` and also return the device counters for the frame
pub fn render_scene_with_statistics(scene: &Scene) -> Result<(RgbaImage, Statistics)> {
    let device = render_to_device(scene)?;
    let mut target = RgbaImage::new(scene.width as u32, scene.height as u32);
    device.blit_from_color_buffer(&mut target);
    Ok((target, *device.statistics()))
}

/// Like `render_scene`, but hands back the device for inspection
pub fn render_to_device(scene: &Scene) -> Result<Device> {
    if scene.width == 0 || scene.height == 0 {
        return Err(Error::EmptyOutput { width: scene.width, height: scene.height });
    }

    let mut device = Device::new(scene.width, scene.height);
    let options = fit_to_output(scene.options.clone(), scene.width, scene.height);
    device.set_options(options.clone());

    device.set_model_view_transform(scene.model_view);
    device.set_projection_transform(scene.projection);
    device.set_light_model_params(scene.light_model);
    device.set_material_state(Face::Front, scene.material);
    device.set_material_state(Face::Back, scene.material);
    if scene.lights.len() > NUM_LIGHTS {
        log::warn!("scene has {} lights, only the first {NUM_LIGHTS} are used", scene.lights.len());
    }
    for (index, light) in scene.lights.iter().take(NUM_LIGHTS).enumerate() {
        device.set_light_state(index, *light);
    }
    if scene.clip_planes.len() > MAX_CLIP_PLANES {
        log::warn!(
            "scene has {} clip planes, only the first {MAX_CLIP_PLANES} are used",
            scene.clip_planes.len()
        );
    }
    device.set_clip_planes(&scene.clip_planes[..scene.clip_planes.len().min(MAX_CLIP_PLANES)]);

    if let Some(texture) = &scene.texture {
        let image = Image::from_file(&texture.path)?;
        device.set_sampler_config(
            0,
            SamplerConfig {
                bound_image: Some(Rc::new(image)),
                wrap_u: texture.wrap,
                wrap_v: texture.wrap,
                filter: texture.filter,
                fixed_function_texture_environment: texture.environment,
            },
        );
        device.set_texture_unit_configuration(0, TextureUnitConfiguration { enabled: true, ..Default::default() });
    }

    device.clear_color(scene.clear_color);
    device.clear_depth(scene.clear_depth);
    device.clear_stencil(scene.clear_stencil);

    for draw_call in &scene.draw_calls {
        let vertices: Vec<Vertex> = draw_call.vertices.iter().map(|v| v.to_vertex()).collect();
        match &draw_call.options {
            Some(overrides) => {
                device.set_options(fit_to_output(overrides.clone(), scene.width, scene.height));
                device.draw_primitives(draw_call.primitive, &vertices);
                device.set_options(options.clone());
            }
            None => device.draw_primitives(draw_call.primitive, &vertices),
        }
    }

    log::debug!("scene rendered\n{}", device.statistics());
    Ok(device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::{PrimitiveType, RasterizerOptions, Vec3, Vec4};
    use crate::scene::{DrawCall, SceneVertex};

    fn quad_scene(color: Vec4) -> Scene {
        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
        Scene {
            width: 4,
            height: 4,
            draw_calls: vec![DrawCall {
                primitive: PrimitiveType::Quads,
                vertices: corners
                    .iter()
                    .map(|&(x, y)| SceneVertex::new(Vec3::new(x * 0.5, y, 0.0), color))
                    .collect(),
                options: None,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_render_demo_scene() {
        let scene = Scene::demo();
        let (image, device) = (render_scene(&scene).unwrap(), render_to_device(&scene).unwrap());
        assert_eq!(image.dimensions(), (320, 240));

        let background = [25, 25, 38, 255];
        assert_eq!(image.get_pixel(0, 0).0, background);
        assert_ne!(image.get_pixel(160, 120).0, background);
        // Back faces are culled, so at most three faces reach the rasterizer
        assert!(device.statistics().num_rasterized_triangles <= 6);
        assert!(device.statistics().num_pixels_shaded > 0);
    }

    #[test]
    fn test_quad_scene_fills_middle_columns() {
        let image = render_scene(&quad_scene(Vec4::new(0.0, 0.0, 1.0, 1.0))).unwrap();
        for y in 0..4 {
            assert_eq!(image.get_pixel(0, y).0, [0, 0, 0, 255]);
            assert_eq!(image.get_pixel(1, y).0, [0, 0, 255, 255]);
            assert_eq!(image.get_pixel(2, y).0, [0, 0, 255, 255]);
            assert_eq!(image.get_pixel(3, y).0, [0, 0, 0, 255]);
        }
    }

    #[test]
    fn test_per_draw_options_apply_to_that_draw_only() {
        let mut scene = quad_scene(Vec4::new(1.0, 1.0, 1.0, 1.0));
        let mut masked = scene.draw_calls[0].clone();
        masked.options = Some(RasterizerOptions { enable_color_write: false, ..Default::default() });
        // The masked draw is a no-op on color; the scene options are restored afterwards
        scene.draw_calls.insert(0, masked);

        let device = render_to_device(&scene).unwrap();
        assert!(device.options().enable_color_write);
        assert_eq!(device.options().viewport, device.frame_buffer().rect());
        let image = render_scene(&scene).unwrap();
        assert_eq!(image.get_pixel(1, 1).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_extra_clip_planes_are_ignored() {
        let mut scene = quad_scene(Vec4::ONE);
        // Six planes that keep everything, then one that would remove the whole quad
        scene.clip_planes = vec![Vec4::new(0.0, 0.0, 0.0, 1.0); MAX_CLIP_PLANES];
        scene.clip_planes.push(Vec4::new(0.0, 0.0, 0.0, -1.0));

        let (image, statistics) = render_scene_with_statistics(&scene).unwrap();
        assert_eq!(image.get_pixel(1, 1).0, [255, 255, 255, 255]);
        assert_eq!(statistics.num_rasterized_triangles, 2);
    }

    #[test]
    fn test_statistics_match_device() {
        let scene = quad_scene(Vec4::ONE);
        let (image, statistics) = render_scene_with_statistics(&scene).unwrap();
        assert_eq!(image, render_scene(&scene).unwrap());
        assert_eq!(statistics, *render_to_device(&scene).unwrap().statistics());
        assert_eq!(statistics.num_draw_calls, 1);
    }

    #[test]
    fn test_empty_output_is_an_error() {
        let scene = Scene { width: 0, ..Default::default() };
        assert!(matches!(render_scene(&scene), Err(Error::EmptyOutput { width: 0, .. })));
    }

    #[test]
    fn test_missing_texture_is_an_error() {
        let mut scene = quad_scene(Vec4::ONE);
        scene.texture = Some(crate::scene::SceneTexture {
            path: "/nonexistent/softgpu/texture.png".into(),
            wrap: crate::texture::WrapMode::Repeat,
            filter: crate::texture::TextureFilter::Nearest,
            environment: Default::default(),
        });
        assert!(matches!(render_scene(&scene), Err(Error::Image(_))));
    }
}
