//! Named, pluggable forces.
//!
//! A force nudges node velocities once per tick. Forces are created by
//! factories that see the graph and the drawing area, so callers can swap a
//! default out, drop it, or add their own without touching the rest.
//!
//! The defaults are:
//! - `link`: springs between linked nodes
//! - `charge`: many-body repulsion
//! - `x` / `y`: weak pull towards the centre of the drawing area

use std::fmt;
use std::rc::Rc;

use super::simulation::Lcg;
use super::types::{Graph, Node};

/// Something that perturbs node velocities each tick.
pub trait Force {
	/// Apply the force at the current heat.
	fn apply(&mut self, nodes: &mut [Node], alpha: f64, random: &mut Lcg);
}

/// What a force factory gets to look at.
pub struct ForceContext<'a> {
	/// The graph, with links already resolved to node indices.
	pub graph: &'a Graph,
	/// Width of the drawing area.
	pub width: f64,
	/// Height of the drawing area.
	pub height: f64,
}

/// Builds a force for a particular graph and drawing area.
pub type ForceFactory = Rc<dyn Fn(&ForceContext<'_>) -> Box<dyn Force>>;

/// Spring force between linked nodes.
///
/// Strength defaults to `1 / min(degree(source), degree(target))` so hubs are
/// not yanked around, and each spring's pull is split between its ends in
/// proportion to their degree.
pub struct LinkForce {
	springs: Vec<Spring>,
	iterations: usize,
}

struct Spring {
	source: usize,
	target: usize,
	strength: f64,
	distance: f64,
	bias: f64,
}

impl LinkForce {
	/// Default link distance.
	pub const DISTANCE: f64 = 30.0;

	/// Springs for every resolved link in `graph`.
	pub fn new(graph: &Graph) -> Self {
		let mut degree = vec![0usize; graph.nodes.len()];
		let pairs: Vec<(usize, usize)> = graph.links.iter().filter_map(|l| l.endpoints()).collect();
		for &(s, t) in &pairs {
			degree[s] += 1;
			degree[t] += 1;
		}
		let springs = pairs
			.into_iter()
			.map(|(source, target)| {
				let (ds, dt) = (degree[source] as f64, degree[target] as f64);
				Spring {
					source,
					target,
					strength: 1.0 / ds.min(dt),
					distance: Self::DISTANCE,
					bias: ds / (ds + dt),
				}
			})
			.collect();
		Self {
			springs,
			iterations: 1,
		}
	}

	/// Use the same rest length for every spring.
	pub fn distance(mut self, distance: f64) -> Self {
		for spring in &mut self.springs {
			spring.distance = distance;
		}
		self
	}

	/// Use the same stiffness for every spring.
	pub fn strength(mut self, strength: f64) -> Self {
		for spring in &mut self.springs {
			spring.strength = strength;
		}
		self
	}

	/// Relaxation passes per tick.
	pub fn iterations(mut self, iterations: usize) -> Self {
		self.iterations = iterations;
		self
	}
}

impl Force for LinkForce {
	fn apply(&mut self, nodes: &mut [Node], alpha: f64, random: &mut Lcg) {
		for _ in 0..self.iterations {
			for spring in &self.springs {
				let (s, t) = (&nodes[spring.source], &nodes[spring.target]);
				let mut x = t.x + t.vx - s.x - s.vx;
				let mut y = t.y + t.vy - s.y - s.vy;
				if x == 0.0 {
					x = random.jiggle();
				}
				if y == 0.0 {
					y = random.jiggle();
				}
				let mut l = (x * x + y * y).sqrt();
				l = (l - spring.distance) / l * alpha * spring.strength;
				x *= l;
				y *= l;

				let target = &mut nodes[spring.target];
				target.vx -= x * spring.bias;
				target.vy -= y * spring.bias;
				let source = &mut nodes[spring.source];
				source.vx += x * (1.0 - spring.bias);
				source.vy += y * (1.0 - spring.bias);
			}
		}
	}
}

/// Pairwise repulsion (negative strength) or attraction between all nodes.
pub struct ManyBodyForce {
	strength: f64,
	distance_min2: f64,
	distance_max2: f64,
}

impl Default for ManyBodyForce {
	fn default() -> Self {
		Self {
			strength: -30.0,
			distance_min2: 1.0,
			distance_max2: f64::INFINITY,
		}
	}
}

impl ManyBodyForce {
	/// Per-node strength; negative repels.
	pub fn strength(mut self, strength: f64) -> Self {
		self.strength = strength;
		self
	}

	/// Ignore pairs farther apart than this.
	pub fn distance_max(mut self, distance: f64) -> Self {
		self.distance_max2 = distance * distance;
		self
	}
}

impl Force for ManyBodyForce {
	fn apply(&mut self, nodes: &mut [Node], alpha: f64, random: &mut Lcg) {
		let positions: Vec<(f64, f64)> = nodes.iter().map(|n| (n.x, n.y)).collect();
		for (i, node) in nodes.iter_mut().enumerate() {
			for (j, &(ox, oy)) in positions.iter().enumerate() {
				if i == j {
					continue;
				}
				let mut x = ox - positions[i].0;
				let mut y = oy - positions[i].1;
				let mut l = x * x + y * y;
				if l >= self.distance_max2 {
					continue;
				}
				if x == 0.0 {
					x = random.jiggle();
					l += x * x;
				}
				if y == 0.0 {
					y = random.jiggle();
					l += y * y;
				}
				if l < self.distance_min2 {
					l = (self.distance_min2 * l).sqrt();
				}
				let w = self.strength * alpha / l;
				node.vx += x * w;
				node.vy += y * w;
			}
		}
	}
}

/// Which axis a [`PositionForce`] acts on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
	/// Horizontal.
	X,
	/// Vertical.
	Y,
}

/// Pulls every node towards a coordinate on one axis.
pub struct PositionForce {
	axis: Axis,
	target: f64,
	strength: f64,
}

impl PositionForce {
	/// Default pull strength.
	pub const STRENGTH: f64 = 0.1;

	/// Pull towards `target` on `axis`.
	pub fn new(axis: Axis, target: f64) -> Self {
		Self {
			axis,
			target,
			strength: Self::STRENGTH,
		}
	}

	/// Pull strength.
	pub fn strength(mut self, strength: f64) -> Self {
		self.strength = strength;
		self
	}
}

impl Force for PositionForce {
	fn apply(&mut self, nodes: &mut [Node], alpha: f64, _random: &mut Lcg) {
		let k = self.strength * alpha;
		for node in nodes {
			match self.axis {
				Axis::X => node.vx += (self.target - node.x) * k,
				Axis::Y => node.vy += (self.target - node.y) * k,
			}
		}
	}
}

/// Ordered set of named force factories.
///
/// Removing a default keeps its slot as `None`, so re-adding it later restores
/// the original order.
#[derive(Clone)]
pub struct Forces {
	entries: Vec<(String, Option<ForceFactory>)>,
}

impl Default for Forces {
	fn default() -> Self {
		Self::none()
			.set("link", |ctx| Box::new(LinkForce::new(ctx.graph)))
			.set("charge", |_| Box::new(ManyBodyForce::default()))
			.set("x", |ctx| Box::new(PositionForce::new(Axis::X, ctx.width / 2.0)))
			.set("y", |ctx| Box::new(PositionForce::new(Axis::Y, ctx.height / 2.0)))
	}
}

impl Forces {
	/// No forces at all.
	pub fn none() -> Self {
		Self { entries: Vec::new() }
	}

	/// Register or override the force called `name`.
	pub fn set(
		mut self,
		name: impl Into<String>,
		factory: impl Fn(&ForceContext<'_>) -> Box<dyn Force> + 'static,
	) -> Self {
		let name = name.into();
		let factory: ForceFactory = Rc::new(factory);
		match self.entries.iter_mut().find(|(n, _)| *n == name) {
			Some(slot) => slot.1 = Some(factory),
			None => self.entries.push((name, Some(factory))),
		}
		self
	}

	/// Disable the force called `name`.
	pub fn remove(mut self, name: impl Into<String>) -> Self {
		let name = name.into();
		match self.entries.iter_mut().find(|(n, _)| *n == name) {
			Some(slot) => slot.1 = None,
			None => self.entries.push((name, None)),
		}
		self
	}

	/// Names of the enabled forces, in application order.
	pub fn names(&self) -> Vec<&str> {
		self.entries
			.iter()
			.filter(|(_, f)| f.is_some())
			.map(|(n, _)| n.as_str())
			.collect()
	}

	/// Instantiate every enabled force for `ctx`.
	pub fn build(&self, ctx: &ForceContext<'_>) -> Vec<(String, Box<dyn Force>)> {
		self.entries
			.iter()
			.filter_map(|(name, factory)| factory.as_ref().map(|f| (name.clone(), f(ctx))))
			.collect()
	}
}

impl fmt::Debug for Forces {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.names()).finish()
	}
}
