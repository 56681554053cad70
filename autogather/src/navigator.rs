//! Dead-reckoning movement.
//!
//! There is no positional feedback: the navigator turns a pixel offset into
//! timed key holds and keeps a running estimate of where that put us. Holds
//! overshoot or undershoot depending on distance, so each axis scales the
//! offset by a banded compensation curve before converting it into time.

use serde::{Deserialize, Serialize};

use crate::input::{self, Actuator, Axis, Key};
use crate::stop::StopToken;

/// Upper bound for the forward multiplier raised by [`Navigator::teach_forward`].
pub const TEACH_CAP: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
	/// The band applies when `|offset|` is strictly greater than this.
	pub above_px: u32,
	pub multiplier: f32,
}

/// Magnitude-banded multiplier table. The first band whose threshold is
/// exceeded wins, so bands are listed from the largest threshold down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Compensation {
	pub bands: Vec<Band>,
	pub default: f32,
}

impl Default for Compensation {
	fn default() -> Self {
		Self { bands: Vec::new(), default: 1.0 }
	}
}

impl Compensation {
	/// Strafing overshoots less on long runs than on medium ones and barely
	/// moves on short taps.
	pub fn lateral() -> Self {
		let band = |above_px, multiplier| Band { above_px, multiplier };
		Self {
			bands: vec![
				band(2500, 1.75),
				band(2250, 1.70),
				band(1750, 1.64),
				band(1500, 1.57),
				band(1250, 1.72),
				band(1000, 1.74),
				band(750, 1.76),
				band(500, 1.73),
				band(250, 1.50),
			],
			default: 1.0,
		}
	}

	pub fn forward() -> Self {
		Self { bands: Vec::new(), default: 1.3 }
	}

	pub fn multiplier(&self, offset: i64) -> f32 {
		let magnitude = offset.unsigned_abs();
		self.bands
			.iter()
			.find(|b| magnitude > b.above_px as u64)
			.map_or(self.default, |b| b.multiplier)
	}

	pub fn apply(&self, offset: i64) -> f64 {
		offset as f64 * self.multiplier(offset) as f64
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisConfig {
	/// Hold time per compensated pixel.
	pub ms_per_px: f32,
	/// Offsets with `|offset| <= tolerance_px` are left alone.
	pub tolerance_px: u32,
	pub compensation: Compensation,
}

impl Default for AxisConfig {
	fn default() -> Self {
		Self {
			ms_per_px: 1.0,
			tolerance_px: 150,
			compensation: Compensation::default(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
	pub forward: AxisConfig,
	pub lateral: AxisConfig,
	pub min_hold_ms: u64,
	pub max_hold_ms: u64,
	/// Pause after every hold so the character stops sliding.
	pub settle_s: f32,
}

impl Default for NavigatorConfig {
	fn default() -> Self {
		Self {
			forward: AxisConfig {
				compensation: Compensation::forward(),
				..AxisConfig::default()
			},
			lateral: AxisConfig {
				compensation: Compensation::lateral(),
				..AxisConfig::default()
			},
			min_hold_ms: 50,
			max_hold_ms: 3000,
			settle_s: 0.3,
		}
	}
}

/// One planned timed actuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisMove {
	pub axis: Axis,
	pub key: Key,
	pub hold_ms: u64,
	/// Displacement credited to the position estimate, bounded by what the
	/// longest allowed hold could cover.
	pub attempted: i64,
}

pub struct Navigator {
	cfg: NavigatorConfig,
	pos: (i64, i64),
}

impl Navigator {
	pub fn new(cfg: NavigatorConfig) -> Self {
		Self { cfg, pos: (0, 0) }
	}

	/// Estimated `(x, y)` relative to where the navigator was created.
	pub fn position(&self) -> (i64, i64) {
		self.pos
	}

	pub fn config(&self) -> &NavigatorConfig {
		&self.cfg
	}

	fn axis(&self, axis: Axis) -> &AxisConfig {
		match axis {
			Axis::Forward => &self.cfg.forward,
			Axis::Lateral => &self.cfg.lateral,
		}
	}

	pub fn plan_axis(&self, axis: Axis, offset: i64) -> Option<AxisMove> {
		let ax = self.axis(axis);
		if offset.unsigned_abs() <= ax.tolerance_px as u64 {
			return None;
		}
		let rate = ax.ms_per_px as f64;
		let hold_ms = ((ax.compensation.apply(offset).abs() * rate) as u64)
			.clamp(self.cfg.min_hold_ms, self.cfg.max_hold_ms.max(self.cfg.min_hold_ms));
		let reach = (self.cfg.max_hold_ms as f64 / rate) as i64;

		Some(AxisMove {
			axis,
			key: axis.key(offset < 0),
			hold_ms,
			attempted: offset.signum() * offset.abs().min(reach),
		})
	}

	/// Forward axis first, then lateral.
	pub fn plan(&self, dx: i64, dy: i64) -> [Option<AxisMove>; 2] {
		[self.plan_axis(Axis::Forward, dy), self.plan_axis(Axis::Lateral, dx)]
	}

	/// Move by `(dx, dy)` and return the displacement credited to the estimate.
	///
	/// Axes inside their tolerance are skipped. An axis not yet started when
	/// `stop` fires reports 0.
	pub fn approach_by_distance<A: Actuator + ?Sized>(
		&mut self,
		actuator: &mut A,
		stop: &StopToken,
		dx: i64,
		dy: i64,
	) -> (i64, i64) {
		let mut moved = (0, 0);
		for mv in self.plan(dx, dy).into_iter().flatten() {
			if stop.is_stopped() {
				break;
			}
			tracing::debug!(axis = ?mv.axis, key = %mv.key, hold_ms = mv.hold_ms, attempted = mv.attempted, "approach");
			input::hold(actuator, mv.key, mv.hold_ms, stop);
			match mv.axis {
				Axis::Forward => moved.1 = mv.attempted,
				Axis::Lateral => moved.0 = mv.attempted,
			}
			stop.sleep_secs(self.cfg.settle_s);
		}

		self.pos.0 += moved.0;
		self.pos.1 += moved.1;
		moved
	}

	/// Raise the forward multiplier by `step`, capped at [`TEACH_CAP`]. Returns the new value.
	pub fn teach_forward(&mut self, step: f32) -> f32 {
		let c = &mut self.cfg.forward.compensation;
		c.default = (c.default + step).min(TEACH_CAP);
		tracing::debug!(multiplier = c.default, "forward multiplier");
		c.default
	}
}
