use std::sync::Arc;

mod image;
pub use self::image::*;
mod region;
pub use region::*;
mod template;
pub use template::*;
mod detection;
pub use detection::*;
pub mod matcher;
pub use matcher::{MatchParams, NoopSink, ScoreExtrema, ScoreSink, TracingSink};
pub mod snapshot;

pub mod screen;

/// Image engine: loaded templates plus the matching configuration.
pub struct Ie {
	templates: Templates,
	params: MatchParams,
	prompt_region: RegionSelector,
	sink: Arc<dyn ScoreSink>,
}

impl Ie {
	/// Validate `templates` against `req` and build the engine.
	///
	/// Fails when a required template set is empty, so the controller never
	/// starts with nothing to look for.
	pub fn try_new(
		templates: Templates,
		params: MatchParams,
		prompt_region: RegionSelector,
		req: Requirements,
	) -> anyhow::Result<Self> {
		templates.validate(req)?;
		if params.scales.is_empty() {
			anyhow::bail!("no scale factors configured");
		}
		Ok(Self {
			templates,
			params,
			prompt_region,
			sink: Arc::new(NoopSink),
		})
	}

	/// Route matcher diagnostics to `sink`.
	pub fn with_sink(mut self, sink: Arc<dyn ScoreSink>) -> Self {
		self.sink = sink;
		self
	}

	pub fn templates(&self) -> &Templates {
		&self.templates
	}

	pub fn params(&self) -> &MatchParams {
		&self.params
	}

	pub fn prompt_region(&self, image: Image) -> Rect {
		self.prompt_region.select(image.width(), image.height())
	}

	pub fn detect(&self, image: Image) -> DetectionSet {
		detect(image, &self.prompt_region, &self.templates, &self.params, self.sink.as_ref())
	}

	/// Whole-frame search for the harvestable object (frame coordinates).
	pub fn find_world_object(&self, image: Image) -> Option<Detection> {
		if self.templates.get(Label::WorldObject).is_empty() {
			return None;
		}
		find_in_frame(image, Label::WorldObject, &self.templates, &self.params, self.sink.as_ref())
	}

	pub fn prompt_is_aligned(&self, set: &DetectionSet, tolerance: u32) -> bool {
		screen::prompt::is_target_aligned(set, tolerance)
	}
}
