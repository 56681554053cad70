//! The harvesting loop.
//!
//! Each tick either walks back to a remembered spot, acts on the interaction
//! prompt, or looks for something to harvest. All waits go through the
//! [`StopToken`] so the loop winds down promptly, and timed key holds always
//! release their key.

use std::{
	sync::{Arc, Mutex, PoisonError},
	thread::JoinHandle,
	time::{Duration, Instant},
};

use ie::{
	DetectionSet, Ie, OwnedImage, Requirements,
	screen::prompt::{self, PromptLayout},
};

use crate::{
	capture::Capture,
	config::Config,
	input::{Actuator, Key},
	navigator::Navigator,
	stop::StopToken,
	waypoints::WaypointMemory,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
	#[default]
	Idle,
	Searching,
	Aligning,
	Triggering,
	Cooldown,
	NavigatingToWaypoint,
	NavigatingToObject,
}

impl std::fmt::Display for ControllerState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			ControllerState::Idle => "idle",
			ControllerState::Searching => "searching",
			ControllerState::Aligning => "aligning",
			ControllerState::Triggering => "triggering",
			ControllerState::Cooldown => "cooldown",
			ControllerState::NavigatingToWaypoint => "to waypoint",
			ControllerState::NavigatingToObject => "to object",
		};
		f.write_str(s)
	}
}

/// Snapshot published for status readers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Status {
	pub state: ControllerState,
	pub detail: String,
	pub position: (i64, i64),
	pub waypoints: usize,
	pub harvests: u32,
	pub last_action: Option<Instant>,
}

impl std::fmt::Display for Status {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"[{}] {} | pos ({}, {}) | waypoints {} | harvested {}",
			self.state, self.detail, self.position.0, self.position.1, self.waypoints, self.harvests
		)
	}
}

/// What a single tick ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
	Stopped,
	/// Capture returned nothing.
	NoData,
	/// No prompt and movement disabled.
	Waiting,
	Cooldown,
	Harvested,
	/// Scrolled `max_adjust_steps` times without lining up the selector.
	AlignmentTimeout,
	/// One scroll step towards the gathering row.
	Adjusted,
	NavigatedToWaypoint,
	NavigatedToObject,
	/// Nothing in sight; camera nudged.
	Nudged,
}

/// Which template sets a run with `cfg` cannot do without.
pub fn requirements(cfg: &Config) -> Requirements {
	Requirements {
		focus: cfg.resource.focus_needed(),
		selector: cfg.behaviour.require_alignment,
		world_object: !cfg.behaviour.dont_move,
	}
}

pub struct Controller<C, A> {
	ie: Ie,
	capture: C,
	actuator: A,
	cfg: Config,
	navigator: Navigator,
	waypoints: WaypointMemory,
	stop: StopToken,
	status: Arc<Mutex<Status>>,
	state: ControllerState,
	last_action: Option<Instant>,
	harvests: u32,
	nudge_sign: i32,
	/// Forward displacement of the previous tick's object approach.
	last_forward: Option<i64>,
}

impl<C: Capture, A: Actuator> Controller<C, A> {
	pub fn new(ie: Ie, capture: C, actuator: A, cfg: Config) -> Self {
		let navigator = Navigator::new(cfg.navigator.clone());
		let waypoints = WaypointMemory::new(
			cfg.waypoints.merge_radius_px,
			Duration::try_from_secs_f32(cfg.waypoints.min_revisit_s.max(0.0)).unwrap_or(Duration::MAX),
		);
		Self {
			ie,
			capture,
			actuator,
			cfg,
			navigator,
			waypoints,
			stop: StopToken::new(),
			status: Arc::new(Mutex::new(Status::default())),
			state: ControllerState::Idle,
			last_action: None,
			harvests: 0,
			nudge_sign: 1,
			last_forward: None,
		}
	}

	pub fn stop_token(&self) -> StopToken {
		self.stop.clone()
	}

	pub fn status_handle(&self) -> Arc<Mutex<Status>> {
		self.status.clone()
	}

	pub fn state(&self) -> ControllerState {
		self.state
	}

	pub fn navigator(&self) -> &Navigator {
		&self.navigator
	}

	pub fn waypoints(&self) -> &WaypointMemory {
		&self.waypoints
	}

	pub fn actuator(&self) -> &A {
		&self.actuator
	}

	pub fn harvests(&self) -> u32 {
		self.harvests
	}

	fn set_state(&mut self, state: ControllerState, detail: impl Into<String>) {
		let detail = detail.into();
		if state != self.state {
			tracing::debug!(from = %self.state, to = %state, %detail, "state");
		}
		self.state = state;

		let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
		*status = Status {
			state,
			detail,
			position: self.navigator.position(),
			waypoints: self.waypoints.len(),
			harvests: self.harvests,
			last_action: self.last_action,
		};
	}

	fn moving(&self) -> bool {
		!self.cfg.behaviour.dont_move
	}

	fn cooldown_elapsed(&self) -> bool {
		self.last_action
			.is_none_or(|t| t.elapsed().as_secs_f32() > self.cfg.timing.action_cooldown_s)
	}

	fn aligned(&self, set: &DetectionSet) -> bool {
		prompt::is_target_aligned(set, self.cfg.align_tolerance_px)
	}

	fn wait(&self, secs: f32) -> bool {
		self.stop.sleep_secs(secs)
	}

	/// Run ticks until stopped.
	pub fn run(&mut self) {
		tracing::info!(resource = %self.cfg.resource, "controller started");
		while !self.stop.is_stopped() {
			let outcome = self.tick();
			tracing::trace!(?outcome, "tick");
		}
		self.set_state(ControllerState::Idle, "stopped");
		tracing::info!(harvests = self.harvests, "controller stopped");
	}

	pub fn tick(&mut self) -> TickOutcome {
		if self.stop.is_stopped() {
			return TickOutcome::Stopped;
		}
		let last_forward = self.last_forward.take();

		if self.moving() {
			let (x, y) = self.navigator.position();
			if let Some(node) = self.waypoints.next_available(x, y, true) {
				self.set_state(ControllerState::NavigatingToWaypoint, format!("waypoint ({}, {})", node.x, node.y));
				self.navigator
					.approach_by_distance(&mut self.actuator, &self.stop, node.x - x, node.y - y);
				return TickOutcome::NavigatedToWaypoint;
			}
		}

		let Some(frame) = self.capture.grab() else {
			self.set_state(ControllerState::Searching, "wait frame");
			self.wait(self.cfg.timing.poll_delay_s);
			return TickOutcome::NoData;
		};

		let set = self.ie.detect(frame.as_image());
		if !prompt::has_prompt(&set) {
			return self.search(&frame, last_forward);
		}

		if !self.cooldown_elapsed() {
			self.set_state(ControllerState::Cooldown, "cooldown");
			self.wait(self.cfg.timing.cooldown_poll_s);
			return TickOutcome::Cooldown;
		}

		if !self.cfg.behaviour.require_alignment {
			return self.trigger();
		}

		match prompt::classify(&set, self.cfg.align_tolerance_px) {
			PromptLayout::Aligned => self.trigger(),
			PromptLayout::Adjustable => self.align(),
			PromptLayout::GatherWithoutSelector => self.scroll_once("scroll try"),
			PromptLayout::FocusOnly => self.scroll_once("seek gathering"),
			PromptLayout::Absent => self.search(&frame, last_forward),
		}
	}

	fn scroll_once(&mut self, detail: &str) -> TickOutcome {
		self.set_state(ControllerState::Aligning, detail);
		self.actuator.scroll(self.cfg.scroll_unit);
		if !self.wait(self.cfg.timing.scroll_delay_s) {
			return TickOutcome::Stopped;
		}
		TickOutcome::Adjusted
	}

	/// Scroll until the selector reaches the gathering row, re-detecting after every step.
	fn align(&mut self) -> TickOutcome {
		let max = self.cfg.max_adjust_steps;
		for step in 1..=max {
			self.set_state(ControllerState::Aligning, format!("scroll {step}/{max}"));
			self.actuator.scroll(self.cfg.scroll_unit);
			if !self.wait(self.cfg.timing.scroll_delay_s) {
				return TickOutcome::Stopped;
			}

			let Some(frame) = self.capture.grab() else {
				break;
			};
			let set = self.ie.detect(frame.as_image());
			if !prompt::has_prompt(&set) {
				tracing::debug!(step, "prompt vanished while aligning");
				break;
			}
			if self.aligned(&set) {
				return self.trigger();
			}
		}

		self.set_state(ControllerState::Searching, "align failed");
		self.wait(self.cfg.timing.poll_delay_s);
		TickOutcome::AlignmentTimeout
	}

	fn trigger(&mut self) -> TickOutcome {
		let key = Key::Char(self.cfg.interact_key);
		self.set_state(ControllerState::Triggering, format!("press {key}"));
		self.actuator.press(key);
		self.last_action = Some(Instant::now());

		if !self.wait(self.cfg.timing.post_trigger_hold_s) {
			return TickOutcome::Stopped;
		}

		let (x, y) = self.navigator.position();
		self.waypoints.add_or_update(x, y);
		self.harvests += 1;
		tracing::info!(x, y, harvests = self.harvests, waypoints = self.waypoints.len(), "harvested");

		if self.cfg.behaviour.return_to_origin && self.moving() && (x, y) != (0, 0) {
			self.set_state(ControllerState::NavigatingToWaypoint, "return to start");
			self.navigator.approach_by_distance(&mut self.actuator, &self.stop, -x, -y);
		}

		self.set_state(ControllerState::Searching, "harvested");
		TickOutcome::Harvested
	}

	/// Raise the forward multiplier when the object is still ahead after a forward approach.
	fn teach(&mut self, last_forward: Option<i64>, dy: i64) {
		let nav = self.navigator.config();
		let step = nav.teach_step;
		let Some(prev) = last_forward else {
			return;
		};
		if step > 0.0 && prev.signum() == dy.signum() && dy.unsigned_abs() > nav.forward.tolerance_px as u64 {
			let multiplier = self.navigator.teach_forward(step);
			tracing::info!(multiplier, dy, "forward approach fell short");
		}
	}

	fn search(&mut self, frame: &OwnedImage, last_forward: Option<i64>) -> TickOutcome {
		if !self.moving() {
			self.set_state(ControllerState::Searching, "wait: no prompt");
			self.wait(self.cfg.timing.poll_delay_s);
			return TickOutcome::Waiting;
		}

		if let Some(object) = self.ie.find_world_object(frame.as_image()) {
			let (cx, cy) = object.bbox.center();
			let dx = cx as i64 - (frame.width() / 2) as i64;
			let dy = cy as i64 - (frame.height() / 2) as i64;
			self.set_state(ControllerState::NavigatingToObject, format!("object at ({dx}, {dy})"));
			self.teach(last_forward, dy);

			let moved = self
				.navigator
				.approach_by_distance(&mut self.actuator, &self.stop, dx, dy);
			self.last_forward = (moved.1 != 0).then_some(moved.1);
			if moved == (0, 0) {
				// Close enough already; give the prompt a moment to appear.
				self.wait(self.cfg.timing.poll_delay_s);
			}
			return TickOutcome::NavigatedToObject;
		}

		let dx = self.cfg.nudge_px * self.nudge_sign;
		self.nudge_sign = -self.nudge_sign;
		self.set_state(ControllerState::Searching, "nudge camera");
		self.actuator.move_pointer_relative(dx, 0);
		self.wait(self.cfg.timing.poll_delay_s);
		TickOutcome::Nudged
	}
}

/// A controller running on its own thread.
pub struct ControllerHandle {
	stop: StopToken,
	status: Arc<Mutex<Status>>,
	join: JoinHandle<()>,
}

impl ControllerHandle {
	pub fn stop(&self) {
		self.stop.stop();
	}

	pub fn stop_token(&self) -> StopToken {
		self.stop.clone()
	}

	pub fn status(&self) -> Status {
		self.status.lock().unwrap_or_else(PoisonError::into_inner).clone()
	}

	pub fn is_finished(&self) -> bool {
		self.join.is_finished()
	}

	/// Stop and wait for the thread to finish.
	pub fn join(self) -> std::thread::Result<()> {
		self.stop.stop();
		self.join.join()
	}
}

pub fn spawn<C, A>(mut controller: Controller<C, A>) -> std::io::Result<ControllerHandle>
where
	C: Capture + 'static,
	A: Actuator + 'static,
{
	let stop = controller.stop_token();
	let status = controller.status_handle();
	let join = std::thread::Builder::new()
		.name("controller".to_string())
		.spawn(move || controller.run())?;
	Ok(ControllerHandle { stop, status, join })
}
