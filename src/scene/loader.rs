//! Scene serialization (RON format)

use std::fs;
use std::path::Path;

use super::Scene;
use crate::error::Result;

/// Load a scene from a RON file. A relative texture path is resolved
/// against the directory holding the scene file.
pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<Scene> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let mut scene = load_scene_from_str(&contents)?;

    if let (Some(texture), Some(dir)) = (scene.texture.as_mut(), path.parent()) {
        if texture.path.is_relative() {
            texture.path = dir.join(&texture.path);
        }
    }
    log::info!("loaded scene {} ({} draw calls)", path.display(), scene.draw_calls.len());
    Ok(scene)
}

/// Save a scene to a pretty-printed RON file
pub fn save_scene<P: AsRef<Path>>(scene: &Scene, path: P) -> Result<()> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(scene, config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Load a scene from a RON string
pub fn load_scene_from_str(s: &str) -> Result<Scene> {
    Ok(ron::from_str(s)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::rasterizer::PrimitiveType;

    #[test]
    fn test_minimal_scene_uses_defaults() {
        let scene = load_scene_from_str(
            r#"(
                width: 8,
                height: 4,
                draw_calls: [
                    (
                        primitive: Triangles,
                        vertices: [
                            (position: (x: -1.0, y: -1.0, z: 0.0)),
                            (position: (x: 1.0, y: -1.0, z: 0.0)),
                            (position: (x: 0.0, y: 1.0, z: 0.0)),
                        ],
                    ),
                ],
            )"#,
        )
        .unwrap();

        assert_eq!((scene.width, scene.height), (8, 4));
        assert_eq!(scene.clear_depth, 1.0);
        assert_eq!(scene.draw_calls.len(), 1);
        assert_eq!(scene.draw_calls[0].primitive, PrimitiveType::Triangles);
        assert!(scene.draw_calls[0].options.is_none());
        assert_eq!(scene.draw_calls[0].vertices[2].color, crate::rasterizer::Vec4::ONE);
    }

    #[test]
    fn test_malformed_scene_is_parse_error() {
        let result = load_scene_from_str("(width: \"wide\")");
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = std::env::temp_dir().join(format!("softgpu-scene-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("demo.ron");

        let scene = Scene::demo();
        save_scene(&scene, &path).unwrap();
        let loaded = load_scene(&path).unwrap();
        assert_eq!(loaded, scene);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_scene("/nonexistent/softgpu/scene.ron");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
