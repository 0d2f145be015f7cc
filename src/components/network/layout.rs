//! Layout engine: one running simulation over a shared graph.
//!
//! The frame loop calls [`Layout::step`]; each step advances the simulation and
//! then notifies tick observers in the order they subscribed. A layout goes
//! idle once it settles and wakes up again when reheated. Stopping is final.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use super::forces::{ForceContext, Forces};
use super::simulation::{Simulation, SimulationParameters};
use super::types::{Graph, SharedGraph};
use crate::error::LayoutError;

/// Heat the layout converges to while a node is being dragged.
pub const REHEAT_TARGET: f64 = 0.3;

/// Callback run after every tick with read access to the graph.
pub type TickObserver = Box<dyn FnMut(&Graph)>;

/// A layout shared between the registry, the controller and the frame loop.
pub type SharedLayout = Rc<RefCell<Layout>>;

/// Drawing area and forces for a new layout.
#[derive(Clone, Debug)]
pub struct LayoutOptions {
	/// Width of the drawing area.
	pub width: f64,
	/// Height of the drawing area.
	pub height: f64,
	/// Named forces to apply.
	pub forces: Forces,
	/// Simulation constants.
	pub simulation: SimulationParameters,
}

impl Default for LayoutOptions {
	fn default() -> Self {
		Self {
			width: 0.0,
			height: 0.0,
			forces: Forces::default(),
			simulation: SimulationParameters::default(),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Status {
	Running,
	Idle,
	Stopped,
}

/// A force-directed layout over a [`SharedGraph`].
pub struct Layout {
	graph: SharedGraph,
	simulation: Simulation,
	observers: Vec<TickObserver>,
	status: Status,
	ticks: u64,
}

impl Layout {
	/// Resolve the graph's links, place unplaced nodes and attach the forces.
	pub fn new(graph: SharedGraph, options: &LayoutOptions) -> Result<Self, LayoutError> {
		let simulation = {
			let mut g = graph.borrow_mut();
			g.resolve_links()?;
			let mut simulation = Simulation::new(&mut g.nodes, options.simulation.clone());
			let ctx = ForceContext {
				graph: &g,
				width: options.width,
				height: options.height,
			};
			for (name, force) in options.forces.build(&ctx) {
				simulation.set_force(name, force);
			}
			debug!(
				"layout: {} nodes, {} links, forces {:?}, {}x{}",
				g.nodes.len(),
				g.links.len(),
				simulation.force_names(),
				options.width,
				options.height
			);
			simulation
		};

		Ok(Self {
			graph,
			simulation,
			observers: Vec::new(),
			status: Status::Running,
			ticks: 0,
		})
	}

	/// Wrap in a [`SharedLayout`].
	pub fn into_shared(self) -> SharedLayout {
		Rc::new(RefCell::new(self))
	}

	/// The graph being laid out.
	pub fn graph(&self) -> &SharedGraph {
		&self.graph
	}

	/// The underlying simulation.
	pub fn simulation(&self) -> &Simulation {
		&self.simulation
	}

	/// Subscribe to ticks. Observers run in subscription order.
	pub fn on_tick(&mut self, observer: impl FnMut(&Graph) + 'static) {
		self.observers.push(Box::new(observer));
	}

	/// Advance one tick and notify observers, unless idle or stopped.
	/// Returns whether a tick happened.
	pub fn step(&mut self) -> bool {
		if self.status != Status::Running {
			return false;
		}
		self.simulation.tick(&mut self.graph.borrow_mut().nodes);
		self.ticks += 1;

		let graph = self.graph.borrow();
		for observer in &mut self.observers {
			observer(&graph);
		}

		if self.simulation.is_settled() {
			self.status = Status::Idle;
			debug!("layout: settled after {} ticks", self.ticks);
		}
		true
	}

	/// Advance `n` ticks without notifying observers, e.g. to pre-settle a
	/// layout before the first frame. Does nothing once stopped.
	pub fn tick(&mut self, n: usize) {
		if self.status == Status::Stopped {
			return;
		}
		let mut graph = self.graph.borrow_mut();
		for _ in 0..n {
			self.simulation.tick(&mut graph.nodes);
			self.ticks += 1;
		}
	}

	/// Raise the heat target and wake the layout so it visibly re-settles.
	pub fn reheat(&mut self) {
		self.simulation.set_alpha_target(REHEAT_TARGET);
		self.restart();
	}

	/// Return the heat target to rest; the layout settles out on its own.
	pub fn cool(&mut self) {
		self.simulation.set_alpha_target(0.0);
	}

	/// Wake an idle layout.
	pub fn restart(&mut self) {
		if self.status == Status::Idle {
			self.status = Status::Running;
		}
	}

	/// Halt permanently. Later steps, ticks and reheats do nothing.
	pub fn stop(&mut self) {
		if self.status != Status::Stopped {
			debug!("layout: stopped after {} ticks", self.ticks);
			self.status = Status::Stopped;
		}
	}

	/// Current heat.
	pub fn alpha(&self) -> f64 {
		self.simulation.alpha()
	}

	/// Heat the layout converges towards.
	pub fn alpha_target(&self) -> f64 {
		self.simulation.alpha_target()
	}

	/// Whether the next [`step`](Self::step) will tick.
	pub fn is_running(&self) -> bool {
		self.status == Status::Running
	}

	/// Whether [`stop`](Self::stop) has been called.
	pub fn is_stopped(&self) -> bool {
		self.status == Status::Stopped
	}

	/// Ticks taken so far.
	pub fn ticks(&self) -> u64 {
		self.ticks
	}
}
