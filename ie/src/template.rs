use anyhow::{Context, Result, bail};
use image::GrayImage;

/// What a template set represents on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
	/// The "Focused" row of the interaction prompt.
	FocusIndicator,
	/// The "Gathering" row of the interaction prompt.
	GatherIndicator,
	/// The `[F]` key hint pointing at the currently selected row.
	Selector,
	/// The harvestable node itself, searched for across the whole frame.
	WorldObject,
}

impl Label {
	pub const COUNT: usize = 4;
	pub const ALL: [Label; Self::COUNT] = [
		Label::FocusIndicator,
		Label::GatherIndicator,
		Label::Selector,
		Label::WorldObject,
	];
	/// Labels searched inside the prompt region each tick.
	pub const PROMPT: [Label; 3] = [Label::FocusIndicator, Label::GatherIndicator, Label::Selector];

	#[inline]
	pub const fn index(self) -> usize {
		match self {
			Label::FocusIndicator => 0,
			Label::GatherIndicator => 1,
			Label::Selector => 2,
			Label::WorldObject => 3,
		}
	}

	/// Name of the asset sub-directory holding this label's templates.
	pub const fn dir_name(self) -> &'static str {
		match self {
			Label::FocusIndicator => "focus",
			Label::GatherIndicator => "gathering",
			Label::Selector => "selector",
			Label::WorldObject => "resource",
		}
	}
}

impl std::fmt::Display for Label {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Label::FocusIndicator => write!(f, "focus"),
			Label::GatherIndicator => write!(f, "gathering"),
			Label::Selector => write!(f, "selector"),
			Label::WorldObject => write!(f, "world object"),
		}
	}
}

/// Ordered reference images for one label.
///
/// Insertion order matters: when two templates produce the same score the
/// earlier one wins.
#[derive(Debug, Clone)]
pub struct TemplateSet {
	label: Label,
	templates: Vec<GrayImage>,
}

impl TemplateSet {
	pub fn new(label: Label) -> Self {
		Self { label, templates: Vec::new() }
	}

	pub fn with_templates(label: Label, templates: Vec<GrayImage>) -> Self {
		Self { label, templates }
	}

	pub fn push(&mut self, template: GrayImage) {
		self.templates.push(template);
	}

	/// Decode an encoded image (PNG, JPEG, ...) and add its luma as a template.
	pub fn push_encoded(&mut self, bytes: &[u8]) -> Result<()> {
		let gray = image::load_from_memory(bytes)
			.with_context(|| format!("decode {} template", self.label))?
			.to_luma8();
		if gray.width() == 0 || gray.height() == 0 {
			bail!("{} template has zero size", self.label);
		}
		self.templates.push(gray);
		Ok(())
	}

	#[inline]
	pub fn label(&self) -> Label {
		self.label
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.templates.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.templates.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &GrayImage> {
		self.templates.iter()
	}
}

/// Which template sets must be populated before the controller may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirements {
	pub focus: bool,
	/// Only consulted when triggering waits for alignment.
	pub selector: bool,
	pub world_object: bool,
}

impl Default for Requirements {
	fn default() -> Self {
		Self {
			focus: true,
			selector: true,
			world_object: false,
		}
	}
}

/// One [`TemplateSet`] per [`Label`].
#[derive(Debug, Clone)]
pub struct Templates {
	sets: [TemplateSet; Label::COUNT],
}

impl Default for Templates {
	fn default() -> Self {
		Self::new()
	}
}

impl Templates {
	pub fn new() -> Self {
		Self { sets: Label::ALL.map(TemplateSet::new) }
	}

	#[inline]
	pub fn get(&self, label: Label) -> &TemplateSet {
		&self.sets[label.index()]
	}

	/// Replace the set for `set.label()`.
	pub fn insert(&mut self, set: TemplateSet) {
		let i = set.label().index();
		self.sets[i] = set;
	}

	pub fn iter(&self) -> impl Iterator<Item = &TemplateSet> {
		self.sets.iter()
	}

	/// Startup check: every required set is present and no template is degenerate.
	pub fn validate(&self, req: Requirements) -> Result<()> {
		let mut missing = Vec::new();
		for set in &self.sets {
			let required = match set.label() {
				Label::GatherIndicator => true,
				Label::FocusIndicator => req.focus,
				Label::Selector => req.selector,
				Label::WorldObject => req.world_object,
			};
			if required && set.is_empty() {
				missing.push(set.label().dir_name());
			}
			if let Some(i) = set.iter().position(|t| t.width() == 0 || t.height() == 0) {
				bail!("{} template #{i} has zero size", set.label());
			}
		}
		if !missing.is_empty() {
			bail!("no templates for: {}", missing.join(", "));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tile(w: u32, h: u32) -> GrayImage {
		GrayImage::from_fn(w, h, |x, y| image::Luma([((x * 7 + y * 13) % 255) as u8]))
	}

	#[test]
	fn label_index_matches_all_order() {
		for (i, label) in Label::ALL.iter().enumerate() {
			assert_eq!(label.index(), i);
		}
	}

	#[test]
	fn validate_reports_missing_sets() {
		let mut templates = Templates::new();
		templates.insert(TemplateSet::with_templates(Label::GatherIndicator, vec![tile(20, 20)]));
		let err = templates.validate(Requirements::default()).unwrap_err().to_string();
		assert!(err.contains("focus"), "{err}");
		assert!(err.contains("selector"), "{err}");
		assert!(!err.contains("gathering"), "{err}");
	}

	#[test]
	fn validate_focus_optional() {
		let mut templates = Templates::new();
		templates.insert(TemplateSet::with_templates(Label::GatherIndicator, vec![tile(20, 20)]));
		templates.insert(TemplateSet::with_templates(Label::Selector, vec![tile(20, 20)]));
		let req = Requirements {
			focus: false,
			..Requirements::default()
		};
		assert!(templates.validate(req).is_ok());
		let req = Requirements {
			focus: false,
			world_object: true,
			..Requirements::default()
		};
		assert!(templates.validate(req).is_err());
	}

	#[test]
	fn validate_selector_optional_without_alignment() {
		let mut templates = Templates::new();
		templates.insert(TemplateSet::with_templates(Label::GatherIndicator, vec![tile(20, 20)]));
		templates.insert(TemplateSet::with_templates(Label::FocusIndicator, vec![tile(20, 20)]));
		assert!(templates.validate(Requirements::default()).is_err());
		let req = Requirements {
			selector: false,
			..Requirements::default()
		};
		assert!(templates.validate(req).is_ok());
	}

	#[test]
	fn push_encoded_rejects_garbage() {
		let mut set = TemplateSet::new(Label::Selector);
		assert!(set.push_encoded(b"not an image").is_err());
		assert!(set.is_empty());
	}

	#[test]
	fn push_encoded_reads_png() {
		let mut bytes = Vec::new();
		tile(16, 14)
			.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
			.unwrap();
		let mut set = TemplateSet::new(Label::Selector);
		set.push_encoded(&bytes).unwrap();
		assert_eq!(set.len(), 1);
		assert_eq!(set.iter().next().unwrap().dimensions(), (16, 14));
	}
}
