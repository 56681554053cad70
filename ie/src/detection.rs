use image::GrayImage;

use crate::{Image, Label, MatchParams, Rect, RegionSelector, ScoreSink, Templates, matcher};

/// Axis-aligned box, `(left, top)` inclusive to `(right, bottom)` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoxRect {
	pub left: u32,
	pub top: u32,
	pub right: u32,
	pub bottom: u32,
}

impl BoxRect {
	pub const fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
		Self { left, top, right, bottom }
	}

	#[inline]
	pub fn width(&self) -> u32 {
		self.right - self.left
	}

	#[inline]
	pub fn height(&self) -> u32 {
		self.bottom - self.top
	}

	/// Integer centre, rounded down.
	#[inline]
	pub fn center(&self) -> (u32, u32) {
		((self.left + self.right) / 2, (self.top + self.bottom) / 2)
	}

	pub fn translated(&self, dx: u32, dy: u32) -> Self {
		Self::new(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
	pub label: Label,
	pub score: f32,
	/// Region-local coordinates.
	pub bbox: BoxRect,
}

impl Detection {
	/// Same detection with its box moved into frame coordinates.
	pub fn in_frame(&self, region: Rect) -> Self {
		Self {
			bbox: self.bbox.translated(region.x, region.y),
			..*self
		}
	}
}

/// Per-tick detections of the prompt labels, all relative to one region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionSet {
	pub region: Rect,
	hits: [Option<Detection>; Label::COUNT],
}

impl DetectionSet {
	pub fn new(region: Rect) -> Self {
		Self { region, hits: [None; Label::COUNT] }
	}

	#[inline]
	pub fn get(&self, label: Label) -> Option<&Detection> {
		self.hits[label.index()].as_ref()
	}

	pub fn insert(&mut self, detection: Detection) {
		self.hits[detection.label.index()] = Some(detection);
	}

	/// A prompt row ("Focused" or "Gathering") is visible.
	pub fn has_target(&self) -> bool {
		self.get(Label::FocusIndicator).is_some() || self.get(Label::GatherIndicator).is_some()
	}

	pub fn is_empty(&self) -> bool {
		self.hits.iter().all(Option::is_none)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Detection> {
		self.hits.iter().flatten()
	}
}

/// Run every prompt label against the selected region of `frame`.
///
/// Labels without templates are simply absent from the result.
pub fn detect(
	frame: Image,
	selector: &RegionSelector,
	templates: &Templates,
	params: &MatchParams,
	sink: &dyn ScoreSink,
) -> DetectionSet {
	let region = selector.select(frame.width(), frame.height());
	let mut set = DetectionSet::new(region);
	if region.is_empty() {
		return set;
	}

	let gray = frame.sub_rect(region).to_gray_image();
	for label in Label::PROMPT {
		if let Some(d) = matcher::best_match(templates.get(label), &gray, &params.scales, params.threshold, sink) {
			set.insert(d);
		}
	}
	set
}

/// Search the whole frame for `label`. The box is in frame coordinates.
pub fn find_in_frame(
	frame: Image,
	label: Label,
	templates: &Templates,
	params: &MatchParams,
	sink: &dyn ScoreSink,
) -> Option<Detection> {
	let gray: GrayImage = frame.to_gray_image();
	matcher::best_match(templates.get(label), &gray, &params.scales, params.threshold, sink)
		.map(|d| d.in_frame(Rect::new(0, 0, frame.width(), frame.height())))
}
