//! Headless renderer: draws a scene file (or the built-in demo cube) to a PNG

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use softgpu::scene::{load_scene, render_scene_with_statistics, save_scene, Scene};

#[derive(Parser, Debug)]
#[command(version, about = "Render a scene with the software GPU")]
struct Args {
    /// RON scene to render; the demo cube when omitted
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Where to write the rendered PNG
    #[arg(long, default_value = "softgpu.png")]
    output: PathBuf,

    /// Override the scene's output width
    #[arg(long)]
    width: Option<usize>,

    /// Override the scene's output height
    #[arg(long)]
    height: Option<usize>,

    /// Also write the resolved scene back out as RON
    #[arg(long)]
    dump_scene: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut scene = match &args.scene {
        Some(path) => load_scene(path).with_context(|| format!("loading scene {}", path.display()))?,
        None => Scene::demo(),
    };
    if let Some(width) = args.width {
        scene.width = width;
    }
    if let Some(height) = args.height {
        scene.height = height;
    }

    if let Some(path) = &args.dump_scene {
        save_scene(&scene, path).with_context(|| format!("writing scene {}", path.display()))?;
        log::info!("wrote scene to {}", path.display());
    }

    let (image, statistics) = render_scene_with_statistics(&scene).context("rendering scene")?;
    image
        .save(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    log::info!("softgpu v{}: {}x{} -> {}", softgpu::VERSION, scene.width, scene.height, args.output.display());
    log::info!("statistics\n{statistics}");
    Ok(())
}
