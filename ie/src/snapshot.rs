//! Annotated debug frames.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect as DrawRect;

use crate::{BoxRect, Detection, DetectionSet, Image, Label, Rect};

const ROI: Rgb<u8> = Rgb([255, 255, 0]);

fn label_color(label: Label) -> Rgb<u8> {
	match label {
		Label::FocusIndicator => Rgb([0, 160, 255]),
		Label::GatherIndicator => Rgb([0, 220, 0]),
		Label::Selector => Rgb([255, 0, 255]),
		Label::WorldObject => Rgb([255, 64, 0]),
	}
}

fn outline(canvas: &mut RgbImage, b: BoxRect, color: Rgb<u8>) {
	if b.width() == 0 || b.height() == 0 {
		return;
	}
	draw_hollow_rect_mut(canvas, DrawRect::at(b.left as i32, b.top as i32).of_size(b.width(), b.height()), color);
}

/// Copy of `frame` with the searched region, every prompt detection and the
/// optional world object outlined. Boxes are mapped to frame coordinates.
pub fn annotate(frame: Image, set: &DetectionSet, world: Option<&Detection>) -> RgbImage {
	let mut canvas = frame.to_rgb_image();

	let Rect { x, y, w, h } = set.region;
	outline(&mut canvas, BoxRect::new(x, y, x + w, y + h), ROI);

	for d in set.iter() {
		outline(&mut canvas, d.in_frame(set.region).bbox, label_color(d.label));
	}
	if let Some(d) = world {
		outline(&mut canvas, d.bbox, label_color(d.label));
	}
	canvas
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::OwnedImage;

	#[test]
	fn draws_region_and_boxes() {
		let frame = OwnedImage::from_gray_as_rgb(&image::GrayImage::new(100, 60));
		let mut set = DetectionSet::new(Rect::new(50, 0, 50, 60));
		set.insert(Detection {
			label: Label::Selector,
			score: 0.8,
			bbox: BoxRect::new(10, 10, 20, 20),
		});

		let out = annotate(frame.as_image(), &set, None);
		assert_eq!(out.dimensions(), (100, 60));
		assert_eq!(*out.get_pixel(50, 30), ROI);
		assert_eq!(*out.get_pixel(60, 15), label_color(Label::Selector));
		assert_eq!(*out.get_pixel(0, 0), Rgb([0, 0, 0]));
	}
}
