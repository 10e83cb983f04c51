// src/main.rs

use anyhow::Context;
use log::info;
use std::env;
use std::path::PathBuf;
use window_renderer::{RendererConfig, TestPatternSource, WindowRenderer, DEFAULT_CONFIG};

/// Opens a window on the default X display and plays a test pattern into it.
///
/// Usage: `window-renderer [CONFIG.json]`
fn main() -> anyhow::Result<()> {
    // Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("Starting window-renderer...");

    let config = match env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => RendererConfig::load(&path)?,
        None => DEFAULT_CONFIG.clone(),
    };
    info!("Configuration: {:?}", config);

    let renderer = WindowRenderer::new(&config).context("Failed to create window renderer")?;
    info!(
        "Renderer {} ready on window {}",
        renderer.id(),
        renderer.window()
    );

    let source = TestPatternSource::new(
        config.surface.width,
        config.surface.height,
        config.demo.frames,
        config.demo.fps,
    );
    source.run(&renderer);

    info!("Test pattern finished; exiting.");
    Ok(())
}
