use std::{
	sync::{Arc, Condvar, Mutex, PoisonError},
	time::{Duration, Instant},
};

type Flag = Arc<(Mutex<bool>, Condvar)>;

/// Cooperative cancellation shared between the controller thread and its owner.
///
/// Every wait in the controller goes through [`StopToken::sleep`], so a stop
/// request is observed within one wake-up instead of after the full pause.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
	flag: Flag,
}

impl StopToken {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn stop(&self) {
		let (lock, cv) = &*self.flag;
		*lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
		cv.notify_all();
	}

	pub fn is_stopped(&self) -> bool {
		let (lock, _) = &*self.flag;
		*lock.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Block for `dur` or until stopped. Returns `false` if stopped.
	///
	/// A duration too long to represent as a deadline waits for the stop alone.
	pub fn sleep(&self, dur: Duration) -> bool {
		let deadline = Instant::now().checked_add(dur);
		let (lock, cv) = &*self.flag;
		let mut stopped = lock.lock().unwrap_or_else(PoisonError::into_inner);
		loop {
			if *stopped {
				return false;
			}
			stopped = match deadline {
				Some(deadline) => {
					let now = Instant::now();
					if now >= deadline {
						return true;
					}
					cv.wait_timeout(stopped, deadline - now)
						.unwrap_or_else(PoisonError::into_inner)
						.0
				}
				None => cv.wait(stopped).unwrap_or_else(PoisonError::into_inner),
			};
		}
	}

	/// [`StopToken::sleep`] for a duration in seconds; NaN or negative values don't wait.
	pub fn sleep_secs(&self, secs: f32) -> bool {
		let dur = if secs > 0.0 {
			Duration::try_from_secs_f32(secs).unwrap_or(Duration::MAX)
		} else {
			Duration::ZERO
		};
		self.sleep(dur)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sleep_completes_when_not_stopped() {
		let stop = StopToken::new();
		assert!(stop.sleep(Duration::from_millis(5)));
		assert!(stop.sleep_secs(f32::NAN));
		assert!(!stop.is_stopped());
	}

	#[test]
	fn stop_wakes_sleeper_early() {
		let stop = StopToken::new();
		let other = stop.clone();
		let start = Instant::now();
		let handle = std::thread::spawn(move || other.sleep(Duration::from_secs(30)));
		std::thread::sleep(Duration::from_millis(20));
		stop.stop();
		assert!(!handle.join().unwrap());
		assert!(start.elapsed() < Duration::from_secs(10));
	}

	#[test]
	fn unrepresentable_wait_ends_on_stop() {
		let stop = StopToken::new();
		let other = stop.clone();
		let long = std::thread::spawn(move || other.sleep(Duration::MAX));
		let other = stop.clone();
		let huge = std::thread::spawn(move || other.sleep_secs(1e20));
		std::thread::sleep(Duration::from_millis(20));
		stop.stop();
		assert!(!long.join().unwrap());
		assert!(!huge.join().unwrap());
	}

	#[test]
	fn stopped_token_never_sleeps() {
		let stop = StopToken::new();
		stop.stop();
		assert!(!stop.sleep(Duration::from_secs(30)));
		assert!(stop.is_stopped());
	}
}
