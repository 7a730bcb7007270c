//! `helio` - render a scene file to an image.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use helio_core::{load_scene, RenderSetup};
use helio_renderer::{render_scene, SceneIndex};
use image::ImageFormat;

/// Command line options. Anything given here overrides the scene file.
#[derive(Parser, Debug, Clone)]
#[command(name = "helio", author, version, about = "Monte Carlo path tracer", long_about = None)]
struct Options {
    /// Scene file to render.
    scene: PathBuf,

    /// Output image; the format follows the extension (.png, .ppm, ...).
    output: PathBuf,

    /// Samples per pixel.
    #[arg(long, short = 's', value_name = "NUM")]
    samples: Option<u32>,

    /// Maximum ray depth.
    #[arg(long, short = 'd', value_name = "NUM")]
    depth: Option<u32>,

    /// Maximum objects per BVH leaf.
    #[arg(long, value_name = "NUM")]
    leaf_size: Option<usize>,

    /// Seed for the per-row random generators.
    #[arg(long, value_name = "NUM")]
    seed: Option<u64>,
}

impl Options {
    fn apply(&self, setup: &mut RenderSetup) {
        if let Some(samples) = self.samples {
            setup.samples = samples;
        }
        if let Some(depth) = self.depth {
            setup.max_depth = depth;
        }
        if let Some(leaf_size) = self.leaf_size {
            setup.leaf_size = leaf_size.max(1);
        }
        if let Some(seed) = self.seed {
            setup.seed = seed;
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = Options::parse();
    let format = ImageFormat::from_path(&options.output)
        .with_context(|| format!("Unsupported output format {}", options.output.display()))?;

    let mut scene = load_scene(&options.scene)
        .with_context(|| format!("Failed to load scene {}", options.scene.display()))?;
    options.apply(&mut scene.setup);

    let index = SceneIndex::build(scene.objects, scene.setup.leaf_size);
    let rendered = render_scene(&index, &scene.camera, &scene.setup).context("Render failed")?;

    rendered
        .to_rgb8()
        .save_with_format(&options.output, format)
        .with_context(|| format!("Failed to write {}", options.output.display()))?;
    log::info!("Wrote {}", options.output.display());

    Ok(())
}
