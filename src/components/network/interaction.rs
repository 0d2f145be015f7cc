//! Direct manipulation of a running layout.
//!
//! The controller is a pure state machine: it takes an [`Interaction`] and the
//! node arena, updates pin coordinates, and returns the [`Effect`]s the host
//! must carry out (reheat the layout, toggle element classes, report a brush
//! selection). It knows nothing about pointers or elements, so any event
//! source can drive it.
//!
//! Per-node states:
//!
//! ```text
//!            DragStart               DragEnd
//!   Free ──────────────> Dragging ───────────> Pinned
//!    ^  <────────────────   |  <──────────────    |
//!    |   double-click       |     DragStart       |
//!    └──────────────────────┴─────────────────────┘
//!                       double-click
//! ```

use crate::error::InteractionError;

use super::types::Node;

/// Class carried by a node element while it is dragged.
pub const DRAGGING: &str = "dragging";
/// Class carried by a node element while it is pinned.
pub const PINNED: &str = "pinned";

/// Pin state of a single node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PinState {
	/// Positioned by the simulation.
	#[default]
	Free,
	/// Following the pointer.
	Dragging,
	/// Held where it was released.
	Pinned,
}

impl PinState {
	/// State after `event` is delivered to this node.
	pub fn next(self, event: &Interaction) -> PinState {
		match (self, event) {
			(PinState::Free | PinState::Pinned, Interaction::DragStart { .. }) => PinState::Dragging,
			(PinState::Dragging, Interaction::DragEnd { .. }) => PinState::Pinned,
			(_, Interaction::NodeDoubleClick { .. } | Interaction::BackgroundDoubleClick) => {
				PinState::Free
			}
			(state, _) => state,
		}
	}
}

/// Axis-aligned rectangle, normalized so `x0 <= x1` and `y0 <= y1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
	/// Left edge.
	pub x0: f64,
	/// Top edge.
	pub y0: f64,
	/// Right edge.
	pub x1: f64,
	/// Bottom edge.
	pub y1: f64,
}

impl Rect {
	/// Rectangle spanning two corners in any order.
	pub fn new(ax: f64, ay: f64, bx: f64, by: f64) -> Self {
		Self {
			x0: ax.min(bx),
			y0: ay.min(by),
			x1: ax.max(bx),
			y1: ay.max(by),
		}
	}

	/// Whether `(x, y)` lies inside, edges included.
	pub fn contains(&self, x: f64, y: f64) -> bool {
		x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
	}

	/// This rectangle clipped to `extent`.
	pub fn clamp_to(&self, extent: &Rect) -> Rect {
		Rect {
			x0: self.x0.clamp(extent.x0, extent.x1),
			y0: self.y0.clamp(extent.y0, extent.y1),
			x1: self.x1.clamp(extent.x0, extent.x1),
			y1: self.y1.clamp(extent.y0, extent.y1),
		}
	}

	/// Whether the rectangle has no area.
	pub fn is_empty(&self) -> bool {
		self.x1 <= self.x0 || self.y1 <= self.y0
	}
}

/// An input event, already resolved to a node or the background.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Interaction {
	/// A drag gesture began on a node.
	DragStart {
		/// Node index.
		node: usize,
	},
	/// The dragged node's pointer moved to `(x, y)` in layout coordinates.
	DragMove {
		/// Node index.
		node: usize,
		/// New horizontal position.
		x: f64,
		/// New vertical position.
		y: f64,
	},
	/// The drag gesture on a node ended.
	DragEnd {
		/// Node index.
		node: usize,
	},
	/// A node was double-clicked.
	NodeDoubleClick {
		/// Node index.
		node: usize,
	},
	/// The background (no node) was double-clicked.
	BackgroundDoubleClick,
	/// A brush gesture began on the background.
	BrushStart,
	/// The brush gesture ended with a selection, or `None` when cleared.
	BrushEnd {
		/// Selected region.
		selection: Option<Rect>,
	},
}

/// Work the host must do in response to an interaction.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
	/// Raise the layout's heat target and wake it.
	Reheat,
	/// Return the layout's heat target to rest.
	Cool,
	/// Toggle a class on one node element.
	Classed {
		/// Node index.
		node: usize,
		/// Class name.
		class: &'static str,
		/// Add or remove.
		on: bool,
	},
	/// Toggle a class on every node element.
	ClassedAll {
		/// Class name.
		class: &'static str,
		/// Add or remove.
		on: bool,
	},
	/// Report the nodes inside a brush selection, in node order.
	Brushed(Vec<usize>),
}

/// Indices of the nodes whose position lies inside `rect`.
pub fn brushed(nodes: &[Node], rect: &Rect) -> Vec<usize> {
	nodes
		.iter()
		.enumerate()
		.filter(|(_, n)| rect.contains(n.x, n.y))
		.map(|(i, _)| i)
		.collect()
}

/// Drag, pin and brush state for one layout.
#[derive(Clone, Debug)]
pub struct Controller {
	states: Vec<PinState>,
	active_drags: usize,
	brushing: bool,
	extent: Rect,
}

impl Controller {
	/// Controller for `node_count` free nodes; brushes are clipped to
	/// `[0, width] x [0, height]`.
	pub fn new(node_count: usize, width: f64, height: f64) -> Self {
		Self {
			states: vec![PinState::Free; node_count],
			active_drags: 0,
			brushing: false,
			extent: Rect::new(0.0, 0.0, width, height),
		}
	}

	/// Pin state of `node`.
	pub fn state(&self, node: usize) -> Option<PinState> {
		self.states.get(node).copied()
	}

	/// Number of drags in progress.
	pub fn active_drags(&self) -> usize {
		self.active_drags
	}

	/// Whether any node is being dragged.
	pub fn is_dragging(&self) -> bool {
		self.active_drags > 0
	}

	/// Whether a brush gesture is in progress.
	pub fn is_brushing(&self) -> bool {
		self.brushing
	}

	/// Apply `event` to the pins in `nodes` and return the resulting effects.
	pub fn handle(&mut self, event: Interaction, nodes: &mut [Node]) -> Result<Vec<Effect>, InteractionError> {
		if self.states.len() != nodes.len() {
			self.states.resize(nodes.len(), PinState::Free);
		}
		let mut effects = Vec::new();

		match event {
			Interaction::DragStart { node } => {
				let state = self.node_state(node)?;
				if state == PinState::Dragging {
					return Ok(effects);
				}
				if self.active_drags == 0 {
					effects.push(Effect::Reheat);
				}
				self.active_drags += 1;
				let n = &mut nodes[node];
				n.pin(n.x, n.y);
				self.states[node] = state.next(&event);
				effects.push(Effect::Classed {
					node,
					class: DRAGGING,
					on: true,
				});
			}
			Interaction::DragMove { node, x, y } => {
				if self.node_state(node)? == PinState::Dragging {
					nodes[node].pin(x, y);
				}
			}
			Interaction::DragEnd { node } => {
				let state = self.node_state(node)?;
				if state != PinState::Dragging {
					return Ok(effects);
				}
				self.end_drag(&mut effects);
				self.states[node] = state.next(&event);
				effects.push(Effect::Classed {
					node,
					class: DRAGGING,
					on: false,
				});
				effects.push(Effect::Classed {
					node,
					class: PINNED,
					on: true,
				});
			}
			Interaction::NodeDoubleClick { node } => {
				let state = self.node_state(node)?;
				if state == PinState::Dragging {
					self.end_drag(&mut effects);
					effects.push(Effect::Classed {
						node,
						class: DRAGGING,
						on: false,
					});
				}
				nodes[node].release();
				self.states[node] = state.next(&event);
				effects.push(Effect::Classed {
					node,
					class: PINNED,
					on: false,
				});
			}
			Interaction::BackgroundDoubleClick => {
				for node in nodes.iter_mut() {
					node.release();
				}
				if self.active_drags > 0 {
					effects.push(Effect::ClassedAll {
						class: DRAGGING,
						on: false,
					});
				}
				for state in &mut self.states {
					*state = state.next(&event);
				}
				self.active_drags = 0;
				effects.push(Effect::ClassedAll {
					class: PINNED,
					on: false,
				});
				effects.push(Effect::Reheat);
			}
			Interaction::BrushStart => {
				self.brushing = !self.is_dragging();
			}
			Interaction::BrushEnd { selection } => {
				if !std::mem::take(&mut self.brushing) {
					return Ok(effects);
				}
				let selected = match selection {
					Some(rect) => brushed(nodes, &rect.clamp_to(&self.extent)),
					None => Vec::new(),
				};
				effects.push(Effect::Brushed(selected));
			}
		}
		Ok(effects)
	}

	fn node_state(&self, node: usize) -> Result<PinState, InteractionError> {
		self.states.get(node).copied().ok_or(InteractionError::UnknownNode {
			index: node,
			len: self.states.len(),
		})
	}

	fn end_drag(&mut self, effects: &mut Vec<Effect>) {
		self.active_drags = self.active_drags.saturating_sub(1);
		if self.active_drags == 0 {
			effects.push(Effect::Cool);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn nodes_at(points: &[(f64, f64)]) -> Vec<Node> {
		points
			.iter()
			.map(|&(x, y)| Node {
				x,
				y,
				..Node::default()
			})
			.collect()
	}

	#[test]
	fn drag_pins_at_current_position_then_follows_pointer() {
		let mut nodes = nodes_at(&[(10.0, 20.0)]);
		let mut c = Controller::new(1, 100.0, 100.0);

		let effects = c.handle(Interaction::DragStart { node: 0 }, &mut nodes).unwrap();
		assert_eq!(
			effects,
			vec![
				Effect::Reheat,
				Effect::Classed {
					node: 0,
					class: DRAGGING,
					on: true
				}
			]
		);
		assert_eq!((nodes[0].fx, nodes[0].fy), (Some(10.0), Some(20.0)));
		assert_eq!(c.state(0), Some(PinState::Dragging));

		c.handle(Interaction::DragMove { node: 0, x: 50.0, y: 60.0 }, &mut nodes)
			.unwrap();
		assert_eq!((nodes[0].fx, nodes[0].fy), (Some(50.0), Some(60.0)));

		let effects = c.handle(Interaction::DragEnd { node: 0 }, &mut nodes).unwrap();
		assert_eq!(effects[0], Effect::Cool);
		assert_eq!(c.state(0), Some(PinState::Pinned));
		assert_eq!((nodes[0].fx, nodes[0].fy), (Some(50.0), Some(60.0)));
	}

	#[test]
	fn only_the_first_drag_reheats_and_the_last_cools() {
		let mut nodes = nodes_at(&[(0.0, 0.0), (1.0, 1.0)]);
		let mut c = Controller::new(2, 10.0, 10.0);
		let first = c.handle(Interaction::DragStart { node: 0 }, &mut nodes).unwrap();
		let second = c.handle(Interaction::DragStart { node: 1 }, &mut nodes).unwrap();
		assert!(first.contains(&Effect::Reheat));
		assert!(!second.contains(&Effect::Reheat));
		let end = c.handle(Interaction::DragEnd { node: 0 }, &mut nodes).unwrap();
		assert!(!end.contains(&Effect::Cool));
		let end = c.handle(Interaction::DragEnd { node: 1 }, &mut nodes).unwrap();
		assert!(end.contains(&Effect::Cool));
	}

	#[test]
	fn moves_are_ignored_unless_dragging() {
		let mut nodes = nodes_at(&[(0.0, 0.0)]);
		let mut c = Controller::new(1, 10.0, 10.0);
		c.handle(Interaction::DragMove { node: 0, x: 5.0, y: 5.0 }, &mut nodes)
			.unwrap();
		assert_eq!(nodes[0].fx, None);
		assert!(c.handle(Interaction::DragEnd { node: 0 }, &mut nodes).unwrap().is_empty());
	}

	#[test]
	fn double_click_releases_one_node() {
		let mut nodes = nodes_at(&[(0.0, 0.0), (5.0, 5.0)]);
		let mut c = Controller::new(2, 10.0, 10.0);
		for node in 0..2 {
			c.handle(Interaction::DragStart { node }, &mut nodes).unwrap();
			c.handle(Interaction::DragEnd { node }, &mut nodes).unwrap();
		}
		let effects = c.handle(Interaction::NodeDoubleClick { node: 0 }, &mut nodes).unwrap();
		assert_eq!(
			effects,
			vec![Effect::Classed {
				node: 0,
				class: PINNED,
				on: false
			}]
		);
		assert!(!nodes[0].is_pinned());
		assert!(nodes[1].is_pinned());
		assert_eq!(c.state(0), Some(PinState::Free));
		assert_eq!(c.state(1), Some(PinState::Pinned));
	}

	#[test]
	fn double_click_mid_drag_frees_and_cools() {
		let mut nodes = nodes_at(&[(0.0, 0.0)]);
		let mut c = Controller::new(1, 10.0, 10.0);
		c.handle(Interaction::DragStart { node: 0 }, &mut nodes).unwrap();
		let effects = c.handle(Interaction::NodeDoubleClick { node: 0 }, &mut nodes).unwrap();
		assert!(effects.contains(&Effect::Cool));
		assert!(!c.is_dragging());
		// the drag end that follows is stale
		assert!(c.handle(Interaction::DragEnd { node: 0 }, &mut nodes).unwrap().is_empty());
		assert!(!nodes[0].is_pinned());
	}

	#[test]
	fn background_double_click_releases_everything() {
		let mut nodes = nodes_at(&[(0.0, 0.0), (5.0, 5.0), (9.0, 9.0)]);
		let mut c = Controller::new(3, 10.0, 10.0);
		for node in 0..2 {
			c.handle(Interaction::DragStart { node }, &mut nodes).unwrap();
			c.handle(Interaction::DragEnd { node }, &mut nodes).unwrap();
		}
		let effects = c.handle(Interaction::BackgroundDoubleClick, &mut nodes).unwrap();
		assert_eq!(
			effects,
			vec![
				Effect::ClassedAll {
					class: PINNED,
					on: false
				},
				Effect::Reheat
			]
		);
		assert!(nodes.iter().all(|n| !n.is_pinned()));
		assert!((0..3).all(|i| c.state(i) == Some(PinState::Free)));
	}

	#[test]
	fn brush_reports_contained_nodes() {
		let mut nodes = nodes_at(&[(10.0, 10.0), (80.0, 80.0), (20.0, 30.0)]);
		let mut c = Controller::new(3, 100.0, 100.0);
		c.handle(Interaction::BrushStart, &mut nodes).unwrap();
		let effects = c
			.handle(
				Interaction::BrushEnd {
					selection: Some(Rect::new(20.0, 30.0, 0.0, 0.0)),
				},
				&mut nodes,
			)
			.unwrap();
		assert_eq!(effects, vec![Effect::Brushed(vec![0, 2])]);

		c.handle(Interaction::BrushStart, &mut nodes).unwrap();
		let effects = c.handle(Interaction::BrushEnd { selection: None }, &mut nodes).unwrap();
		assert_eq!(effects, vec![Effect::Brushed(vec![])]);
	}

	#[test]
	fn brush_is_clipped_to_extent() {
		let mut nodes = nodes_at(&[(-5.0, 5.0), (5.0, 5.0)]);
		let mut c = Controller::new(2, 10.0, 10.0);
		c.handle(Interaction::BrushStart, &mut nodes).unwrap();
		let effects = c
			.handle(
				Interaction::BrushEnd {
					selection: Some(Rect::new(-10.0, 0.0, 10.0, 10.0)),
				},
				&mut nodes,
			)
			.unwrap();
		assert_eq!(effects, vec![Effect::Brushed(vec![1])]);
	}

	#[test]
	fn brush_is_suppressed_while_dragging() {
		let mut nodes = nodes_at(&[(1.0, 1.0)]);
		let mut c = Controller::new(1, 10.0, 10.0);
		c.handle(Interaction::DragStart { node: 0 }, &mut nodes).unwrap();
		c.handle(Interaction::BrushStart, &mut nodes).unwrap();
		assert!(!c.is_brushing());
		let effects = c
			.handle(
				Interaction::BrushEnd {
					selection: Some(Rect::new(0.0, 0.0, 10.0, 10.0)),
				},
				&mut nodes,
			)
			.unwrap();
		assert!(effects.is_empty());
	}

	#[test]
	fn unknown_node_is_an_error() {
		let mut nodes = nodes_at(&[(0.0, 0.0)]);
		let mut c = Controller::new(1, 10.0, 10.0);
		assert_eq!(
			c.handle(Interaction::DragStart { node: 3 }, &mut nodes),
			Err(InteractionError::UnknownNode { index: 3, len: 1 })
		);
	}

	#[test]
	fn pin_state_transitions_are_pure() {
		let start = Interaction::DragStart { node: 0 };
		let end = Interaction::DragEnd { node: 0 };
		let dbl = Interaction::NodeDoubleClick { node: 0 };
		assert_eq!(PinState::Free.next(&start), PinState::Dragging);
		assert_eq!(PinState::Pinned.next(&start), PinState::Dragging);
		assert_eq!(PinState::Dragging.next(&end), PinState::Pinned);
		assert_eq!(PinState::Free.next(&end), PinState::Free);
		assert_eq!(PinState::Pinned.next(&dbl), PinState::Free);
		assert_eq!(PinState::Dragging.next(&Interaction::BackgroundDoubleClick), PinState::Free);
	}
}
