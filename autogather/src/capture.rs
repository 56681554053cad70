use std::path::PathBuf;

/// Source of frames. `None` means "no data this tick".
pub trait Capture: Send {
	fn grab(&mut self) -> Option<ie::OwnedImage>;

	/// Current frame size, when known.
	fn dims(&mut self) -> Option<(u32, u32)> {
		self.grab().map(|img| (img.width(), img.height()))
	}
}

impl<T: Capture + ?Sized> Capture for Box<T> {
	fn grab(&mut self) -> Option<ie::OwnedImage> {
		(**self).grab()
	}

	fn dims(&mut self) -> Option<(u32, u32)> {
		(**self).dims()
	}
}

/// Frames too small to hold a prompt (minimised windows report 1×1).
fn usable(img: ie::OwnedImage) -> Option<ie::OwnedImage> {
	(img.width() > 1 && img.height() > 1).then_some(img)
}

/// Re-reads an image file on every grab. Handy for replaying screenshots,
/// or for driving the bot from an external screenshot tool.
#[derive(Debug, Clone)]
pub struct FileCapture {
	path: PathBuf,
}

impl FileCapture {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl Capture for FileCapture {
	fn grab(&mut self) -> Option<ie::OwnedImage> {
		let bytes = match std::fs::read(&self.path) {
			Ok(bytes) => bytes,
			Err(err) => {
				tracing::debug!(path = %self.path.display(), error = %err, "frame unavailable");
				return None;
			}
		};
		match ie::OwnedImage::decode(&bytes) {
			Ok(img) => usable(img),
			Err(err) => {
				tracing::warn!(path = %self.path.display(), error = %err, "frame undecodable");
				None
			}
		}
	}
}

#[cfg(feature = "window-capture")]
pub use window::WindowCapture;

#[cfg(feature = "window-capture")]
mod window {
	use super::{Capture, usable};

	/// Captures the first window whose app name matches.
	#[derive(Debug, Clone)]
	pub struct WindowCapture {
		app_name: String,
	}

	impl WindowCapture {
		pub fn new(app_name: impl Into<String>) -> Self {
			Self { app_name: app_name.into() }
		}

		fn find_window(&self) -> Option<xcap::Window> {
			let windows = xcap::Window::all().ok()?;
			windows
				.into_iter()
				.find(|window| window.app_name().ok().as_deref() == Some(self.app_name.as_str()))
		}
	}

	impl Capture for WindowCapture {
		fn grab(&mut self) -> Option<ie::OwnedImage> {
			let Some(window) = self.find_window() else {
				tracing::debug!(app_name = %self.app_name, "window not found");
				return None;
			};
			let img = window.capture_image().ok()?;
			usable(ie::OwnedImage::from_rgba(img.width() as usize, img.as_raw()))
		}

		fn dims(&mut self) -> Option<(u32, u32)> {
			let window = self.find_window()?;
			Some((window.width().ok()?, window.height().ok()?))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn file_capture_reads_and_reports_missing() {
		let path = std::env::temp_dir().join(format!("autogather-capture-{}.png", std::process::id()));
		let mut cap = FileCapture::new(&path);
		let _ = std::fs::remove_file(&path);
		assert!(cap.grab().is_none());

		image::RgbImage::from_pixel(8, 6, image::Rgb([1, 2, 3])).save(&path).unwrap();
		let img = cap.grab().unwrap();
		assert_eq!((img.width(), img.height()), (8, 6));
		assert_eq!(cap.dims(), Some((8, 6)));

		image::RgbImage::new(1, 1).save(&path).unwrap();
		assert!(cap.grab().is_none());
		let _ = std::fs::remove_file(&path);
	}
}
