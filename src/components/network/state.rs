//! The `network` entry point and the handle it returns.
//!
//! [`network`] wires a graph into a surface: it replaces whatever layout was
//! running on the target, binds the link and node layers, subscribes the tick
//! renderer and registers the new layout. The returned [`Network`] routes
//! interactions through the controller and applies their effects.

use log::debug;

use super::bind::{Layer, bind, bind_one};
use super::forces::Forces;
use super::interaction::{Controller, Effect, Interaction};
use super::layout::{Layout, LayoutOptions, SharedLayout};
use super::registry;
use super::render::TickRenderer;
use super::simulation::SimulationParameters;
use super::surface::Surface;
use super::types::{Node, SharedGraph};
use crate::error::NetworkError;

/// Receives the nodes inside a finished brush selection.
///
/// The graph is borrowed while the callback runs, so it must not mutate it.
pub type BrushCallback = Box<dyn FnMut(&[&Node])>;

/// What to draw and how.
pub struct NetworkOptions {
	graph: SharedGraph,
	width: Option<f64>,
	height: Option<f64>,
	link_curvature: f64,
	node_shape: String,
	forces: Forces,
	simulation: SimulationParameters,
	brush: Option<BrushCallback>,
	id: Option<String>,
}

impl NetworkOptions {
	/// Draw `graph` with straight links, circular nodes and the default forces.
	pub fn new(graph: SharedGraph) -> Self {
		Self {
			graph,
			width: None,
			height: None,
			link_curvature: 0.0,
			node_shape: "circle".to_string(),
			forces: Forces::default(),
			simulation: SimulationParameters::default(),
			brush: None,
			id: None,
		}
	}

	/// Drawing width. Defaults to the target's extent.
	pub fn width(mut self, width: f64) -> Self {
		self.width = Some(width);
		self
	}

	/// Drawing height. Defaults to the target's extent.
	pub fn height(mut self, height: f64) -> Self {
		self.height = Some(height);
		self
	}

	/// Link bend: 0 straight, 0.5 quarter circle, 1 half circle.
	pub fn link_curvature(mut self, curvature: f64) -> Self {
		self.link_curvature = curvature;
		self
	}

	/// Tag of the node elements.
	pub fn node_shape(mut self, tag: impl Into<String>) -> Self {
		self.node_shape = tag.into();
		self
	}

	/// Force set, usually [`Forces::default`] with overrides.
	pub fn forces(mut self, forces: Forces) -> Self {
		self.forces = forces;
		self
	}

	/// Simulation constants.
	pub fn simulation(mut self, simulation: SimulationParameters) -> Self {
		self.simulation = simulation;
		self
	}

	/// Enable brushing and report selections to `callback`.
	pub fn brush(mut self, callback: impl FnMut(&[&Node]) + 'static) -> Self {
		self.brush = Some(Box::new(callback));
		self
	}

	/// Registry key. Defaults to the target's identity.
	pub fn id(mut self, id: impl Into<String>) -> Self {
		self.id = Some(id.into());
		self
	}
}

/// A graph drawn on a surface, with its running layout.
pub struct Network<S: Surface> {
	surface: S,
	id: String,
	graph: SharedGraph,
	layout: SharedLayout,
	controller: Controller,
	links: Layer<S::Element>,
	nodes: Layer<S::Element>,
	link_group: S::Element,
	node_group: S::Element,
	brush_group: Option<S::Element>,
	brush: Option<BrushCallback>,
	width: f64,
	height: f64,
}

/// Draw the graph in `options` into `target`, replacing any layout already
/// running there.
pub fn network<S: Surface>(
	surface: &S,
	target: &S::Element,
	options: NetworkOptions,
) -> Result<Network<S>, NetworkError> {
	let NetworkOptions {
		graph,
		width,
		height,
		link_curvature,
		node_shape,
		forces,
		simulation,
		brush,
		id,
	} = options;

	let id = id.unwrap_or_else(|| surface.identity(target));
	registry::stop(&id);

	let (extent_width, extent_height) = surface.extent(target);
	let width = width.unwrap_or(extent_width);
	let height = height.unwrap_or(extent_height);

	let brush_group = match brush {
		Some(_) => Some(bind_one(surface, target, "g", "brush")?),
		None => None,
	};

	let layout = Layout::new(
		graph.clone(),
		&LayoutOptions {
			width,
			height,
			forces,
			simulation,
		},
	)?
	.into_shared();

	let (node_count, link_count) = {
		let g = graph.borrow();
		(g.nodes.len(), g.links.len())
	};

	let link_group = bind_one(surface, target, "g", "links")?;
	let links = bind(surface, &link_group, "path", "link", link_count)?;
	links.attr(surface, "fill", |_| "none".to_string());

	let node_group = bind_one(surface, target, "g", "nodes")?;
	let nodes = bind(surface, &node_group, &node_shape, "node", node_count)?;

	let renderer = TickRenderer::new(surface.clone(), links.clone(), nodes.clone(), link_curvature);
	layout.borrow_mut().on_tick(move |g| renderer.render(g));

	registry::install(&id, layout.clone());
	debug!("network `{id}`: {node_count} nodes, {link_count} links, {width}x{height}");

	Ok(Network {
		surface: surface.clone(),
		id,
		graph,
		layout,
		controller: Controller::new(node_count, width, height),
		links,
		nodes,
		link_group,
		node_group,
		brush_group,
		brush,
		width,
		height,
	})
}

impl<S: Surface> Network<S> {
	/// Apply an interaction and carry out its effects.
	pub fn dispatch(&mut self, event: Interaction) -> Result<Vec<Effect>, NetworkError> {
		let effects = {
			let mut graph = self.graph.borrow_mut();
			self.controller.handle(event, &mut graph.nodes)?
		};
		for effect in &effects {
			self.apply(effect);
		}
		Ok(effects)
	}

	fn apply(&mut self, effect: &Effect) {
		match effect {
			Effect::Reheat => self.layout.borrow_mut().reheat(),
			Effect::Cool => self.layout.borrow_mut().cool(),
			Effect::Classed { node, class, on } => {
				if let Some(element) = self.nodes.get(*node) {
					self.surface.set_class(element, class, *on);
				}
			}
			Effect::ClassedAll { class, on } => self.nodes.classed(&self.surface, class, *on),
			Effect::Brushed(indices) => {
				if let Some(callback) = self.brush.as_mut() {
					let graph = self.graph.borrow();
					let selected: Vec<&Node> = indices.iter().filter_map(|&i| graph.nodes.get(i)).collect();
					callback(&selected);
				}
			}
		}
	}

	/// Advance the layout one tick and redraw. Returns whether it ticked.
	pub fn step(&self) -> bool {
		self.layout.borrow_mut().step()
	}

	/// Stop the layout and drop it from the registry.
	pub fn stop(&self) {
		self.layout.borrow_mut().stop();
		registry::release(&self.id, &self.layout);
	}

	/// Node index an element is bound to.
	pub fn node_index(&self, element: &S::Element) -> Option<usize> {
		self.nodes.position(element)
	}

	/// Node elements, in node order.
	pub fn nodes(&self) -> &Layer<S::Element> {
		&self.nodes
	}

	/// Link elements, in link order.
	pub fn links(&self) -> &Layer<S::Element> {
		&self.links
	}

	/// Group holding the node elements.
	pub fn node_group(&self) -> &S::Element {
		&self.node_group
	}

	/// Group holding the link elements.
	pub fn link_group(&self) -> &S::Element {
		&self.link_group
	}

	/// Group reserved for the brush overlay, when brushing is enabled.
	pub fn brush_group(&self) -> Option<&S::Element> {
		self.brush_group.as_ref()
	}

	/// The running layout.
	pub fn layout(&self) -> &SharedLayout {
		&self.layout
	}

	/// The graph being drawn.
	pub fn graph(&self) -> &SharedGraph {
		&self.graph
	}

	/// Registry key.
	pub fn id(&self) -> &str {
		&self.id
	}

	/// Pin and brush state.
	pub fn controller(&self) -> &Controller {
		&self.controller
	}

	/// Surface being drawn on.
	pub fn surface(&self) -> &S {
		&self.surface
	}

	/// Drawing width.
	pub fn width(&self) -> f64 {
		self.width
	}

	/// Drawing height.
	pub fn height(&self) -> f64 {
		self.height
	}
}
