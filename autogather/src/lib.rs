pub mod assets;
pub mod capture;
pub mod config;
pub mod controller;
pub mod input;
pub mod navigator;
pub mod resource;
pub mod stop;
pub mod waypoints;

use std::sync::Arc;

use anyhow::Context;

/// Load the configured resource's templates and build the image engine.
pub fn build_ie(cfg: &config::Config, sink: Arc<dyn ie::ScoreSink>) -> anyhow::Result<ie::Ie> {
	let root = assets::resolve_resources_dir(cfg.assets_dir.as_deref())?;
	let templates = assets::load_templates(&root, cfg.resource)?;
	let ie = ie::Ie::try_new(
		templates,
		cfg.matching.params(),
		cfg.matching.prompt_region,
		controller::requirements(cfg),
	)
	.with_context(|| format!("templates for {} in {}", cfg.resource, root.display()))?;
	Ok(ie.with_sink(sink))
}
