//! Memory of harvested spots.
//!
//! Successful harvests are recorded at the navigator's position estimate.
//! Spots closer than the merge radius collapse into one node, and a node is
//! only offered again once its revisit interval has passed.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
	pub x: i64,
	pub y: i64,
	pub last_success: Instant,
}

#[derive(Debug, Clone)]
pub struct WaypointMemory {
	nodes: Vec<Node>,
	merge_radius: u32,
	min_revisit: Duration,
}

fn dist2(ax: i64, ay: i64, bx: i64, by: i64) -> i128 {
	let dx = (ax - bx) as i128;
	let dy = (ay - by) as i128;
	dx * dx + dy * dy
}

impl WaypointMemory {
	pub fn new(merge_radius: u32, min_revisit: Duration) -> Self {
		Self {
			nodes: Vec::new(),
			merge_radius,
			min_revisit,
		}
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn add_or_update(&mut self, x: i64, y: i64) {
		self.add_or_update_at(x, y, Instant::now());
	}

	/// Record a harvest at `(x, y)`.
	///
	/// The nearest node within the merge radius moves to the midpoint and takes
	/// timestamp `t`; otherwise a new node is inserted. A moved node then
	/// absorbs any neighbour that ended up inside its radius, so no two nodes
	/// are ever closer than the radius.
	pub fn add_or_update_at(&mut self, x: i64, y: i64, t: Instant) {
		let r2 = (self.merge_radius as i128).pow(2);
		let nearest = self
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (i, dist2(n.x, n.y, x, y)))
			.min_by_key(|&(_, d2)| d2);

		let Some((mut i, _)) = nearest.filter(|&(_, d2)| d2 <= r2) else {
			self.nodes.push(Node { x, y, last_success: t });
			tracing::debug!(x, y, nodes = self.nodes.len(), "new waypoint");
			return;
		};
		tracing::trace!(x, y, "merging waypoint");

		let node = &mut self.nodes[i];
		node.x = (node.x + x) / 2;
		node.y = (node.y + y) / 2;
		node.last_success = t;

		loop {
			let Node { x, y, .. } = self.nodes[i];
			let neighbour = self
				.nodes
				.iter()
				.enumerate()
				.filter(|&(j, _)| j != i)
				.map(|(j, n)| (j, dist2(n.x, n.y, x, y)))
				.filter(|&(_, d2)| d2 <= r2)
				.min_by_key(|&(_, d2)| d2);
			let Some((j, _)) = neighbour else {
				break;
			};

			let other = self.nodes.remove(j);
			if j < i {
				i -= 1;
			}
			let node = &mut self.nodes[i];
			node.x = (node.x + other.x) / 2;
			node.y = (node.y + other.y) / 2;
			node.last_success = node.last_success.max(other.last_success);
		}
	}

	pub fn next_available(&mut self, curx: i64, cury: i64, remove: bool) -> Option<Node> {
		self.next_available_at(curx, cury, remove, Instant::now())
	}

	/// Nearest node to `(curx, cury)` whose revisit interval has elapsed at `now`.
	///
	/// With `remove` the node leaves the memory; it comes back only when the
	/// next harvest there is recorded.
	pub fn next_available_at(&mut self, curx: i64, cury: i64, remove: bool, now: Instant) -> Option<Node> {
		let (i, _) = self
			.nodes
			.iter()
			.enumerate()
			.filter(|(_, n)| now.saturating_duration_since(n.last_success) >= self.min_revisit)
			.map(|(i, n)| (i, dist2(n.x, n.y, curx, cury)))
			.min_by_key(|&(_, d2)| d2)?;

		if remove {
			Some(self.nodes.remove(i))
		} else {
			Some(self.nodes[i])
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn memory(radius: u32, revisit_s: u64) -> WaypointMemory {
		WaypointMemory::new(radius, Duration::from_secs(revisit_s))
	}

	#[test]
	fn close_harvests_merge() {
		let t = Instant::now();
		let mut m = memory(50, 30);
		m.add_or_update_at(100, 100, t);
		m.add_or_update_at(130, 120, t);
		assert_eq!(m.len(), 1);
		assert_eq!((m.nodes()[0].x, m.nodes()[0].y), (115, 110));
	}

	#[test]
	fn distant_harvests_stay_apart() {
		let t = Instant::now();
		let mut m = memory(50, 30);
		m.add_or_update_at(100, 100, t);
		m.add_or_update_at(200, 100, t);
		assert_eq!(m.len(), 2);
	}

	#[test]
	fn merge_truncates_toward_zero() {
		let t = Instant::now();
		let mut m = memory(50, 30);
		m.add_or_update_at(-3, 0, t);
		m.add_or_update_at(0, 0, t);
		assert_eq!(m.nodes()[0].x, -1);
	}

	#[test]
	fn revisit_interval_is_respected() {
		let t0 = Instant::now();
		let mut m = memory(50, 30);
		m.add_or_update_at(0, 0, t0);
		assert!(m.next_available_at(0, 0, true, t0 + Duration::from_secs(10)).is_none());
		let node = m.next_available_at(0, 0, true, t0 + Duration::from_secs(31)).unwrap();
		assert_eq!((node.x, node.y), (0, 0));
		assert!(m.is_empty());
	}

	#[test]
	fn nearest_eligible_node_wins() {
		let t0 = Instant::now();
		let later = t0 + Duration::from_secs(100);
		let mut m = memory(10, 30);
		m.add_or_update_at(500, 0, t0);
		m.add_or_update_at(100, 0, t0);
		m.add_or_update_at(20, 0, later);

		let node = m.next_available_at(0, 0, false, later).unwrap();
		assert_eq!(node.x, 100);
		assert_eq!(m.len(), 3);
	}

	#[test]
	fn merged_node_absorbs_new_neighbours() {
		let t0 = Instant::now();
		let t1 = t0 + Duration::from_secs(5);
		let mut m = memory(50, 30);
		m.add_or_update_at(0, 0, t0);
		m.add_or_update_at(60, 0, t0);
		assert_eq!(m.len(), 2);

		// Joins (60, 0) at (50, 0), which is now within reach of (0, 0).
		m.add_or_update_at(40, 0, t1);
		assert_eq!(m.len(), 1);
		let node = m.nodes()[0];
		assert_eq!((node.x, node.y), (25, 0));
		assert_eq!(node.last_success, t1);
	}
}
