//! Actuation intents.
//!
//! Key and pointer injection is platform specific and lives behind
//! [`Actuator`]. The controller only ever emits intents through it.

use std::{
	sync::{Arc, Mutex, PoisonError},
	time::Duration,
};

use crate::stop::StopToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
	W,
	A,
	S,
	D,
	Char(char),
}

impl std::fmt::Display for Key {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Key::W => write!(f, "w"),
			Key::A => write!(f, "a"),
			Key::S => write!(f, "s"),
			Key::D => write!(f, "d"),
			Key::Char(c) => write!(f, "{c}"),
		}
	}
}

/// Movement axis in the navigator's pixel-equivalent space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
	/// Screen Y: `W` moves towards negative offsets, `S` towards positive.
	Forward,
	/// Screen X: `A` moves towards negative offsets, `D` towards positive.
	Lateral,
}

impl Axis {
	pub fn key(self, negative: bool) -> Key {
		match (self, negative) {
			(Axis::Forward, true) => Key::W,
			(Axis::Forward, false) => Key::S,
			(Axis::Lateral, true) => Key::A,
			(Axis::Lateral, false) => Key::D,
		}
	}
}

pub trait Actuator: Send {
	fn key_down(&mut self, key: Key);
	fn key_up(&mut self, key: Key);
	fn press(&mut self, key: Key);
	/// Wheel delta in platform units (one notch is 120; negative scrolls down).
	fn scroll(&mut self, delta: i32);
	fn move_pointer_relative(&mut self, dx: i32, dy: i32);
}

/// Releases its key when dropped, whatever path leaves the hold.
struct KeyGuard<'a, A: Actuator + ?Sized> {
	actuator: &'a mut A,
	key: Key,
}

impl<A: Actuator + ?Sized> Drop for KeyGuard<'_, A> {
	fn drop(&mut self) {
		self.actuator.key_up(self.key);
	}
}

/// Hold `key` for `ms` milliseconds. Returns `false` if `stop` cut the hold short.
pub fn hold<A: Actuator + ?Sized>(actuator: &mut A, key: Key, ms: u64, stop: &StopToken) -> bool {
	actuator.key_down(key);
	let _guard = KeyGuard { actuator, key };
	stop.sleep(Duration::from_millis(ms))
}

/// Logs every intent instead of injecting it.
#[derive(Debug, Default)]
pub struct TracingActuator;

impl Actuator for TracingActuator {
	fn key_down(&mut self, key: Key) {
		tracing::debug!(%key, "key down");
	}

	fn key_up(&mut self, key: Key) {
		tracing::debug!(%key, "key up");
	}

	fn press(&mut self, key: Key) {
		tracing::info!(%key, "press");
	}

	fn scroll(&mut self, delta: i32) {
		tracing::info!(delta, "scroll");
	}

	fn move_pointer_relative(&mut self, dx: i32, dy: i32) {
		tracing::info!(dx, dy, "move pointer");
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
	KeyDown(Key),
	KeyUp(Key),
	Press(Key),
	Scroll(i32),
	MovePointer(i32, i32),
}

/// Records intents into a shared log, for inspection from another thread.
#[derive(Debug, Clone, Default)]
pub struct RecordingActuator {
	log: Arc<Mutex<Vec<Intent>>>,
}

impl RecordingActuator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn intents(&self) -> Vec<Intent> {
		self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
	}

	/// Keys currently held down (pressed but not yet released).
	pub fn held(&self) -> Vec<Key> {
		let mut held = Vec::new();
		for intent in self.intents() {
			match intent {
				Intent::KeyDown(k) => held.push(k),
				Intent::KeyUp(k) => held.retain(|h| *h != k),
				_ => {}
			}
		}
		held
	}

	fn record(&self, intent: Intent) {
		self.log.lock().unwrap_or_else(PoisonError::into_inner).push(intent);
	}
}

impl Actuator for RecordingActuator {
	fn key_down(&mut self, key: Key) {
		self.record(Intent::KeyDown(key));
	}

	fn key_up(&mut self, key: Key) {
		self.record(Intent::KeyUp(key));
	}

	fn press(&mut self, key: Key) {
		self.record(Intent::Press(key));
	}

	fn scroll(&mut self, delta: i32) {
		self.record(Intent::Scroll(delta));
	}

	fn move_pointer_relative(&mut self, dx: i32, dy: i32) {
		self.record(Intent::MovePointer(dx, dy));
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn axis_keys() {
		assert_eq!(Axis::Forward.key(true), Key::W);
		assert_eq!(Axis::Forward.key(false), Key::S);
		assert_eq!(Axis::Lateral.key(true), Key::A);
		assert_eq!(Axis::Lateral.key(false), Key::D);
	}

	#[test]
	fn hold_releases_key() {
		let mut act = RecordingActuator::new();
		assert!(hold(&mut act, Key::D, 1, &StopToken::new()));
		assert_eq!(act.intents(), vec![Intent::KeyDown(Key::D), Intent::KeyUp(Key::D)]);
	}

	#[test]
	fn interrupted_hold_still_releases_key() {
		let stop = StopToken::new();
		stop.stop();
		let mut act = RecordingActuator::new();
		assert!(!hold(&mut act, Key::W, 60_000, &stop));
		assert!(act.held().is_empty());
		assert_eq!(act.intents().last(), Some(&Intent::KeyUp(Key::W)));
	}
}
