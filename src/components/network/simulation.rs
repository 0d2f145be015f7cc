//! Force simulation primitive.
//!
//! Tracks the simulation "heat" (`alpha`) and integrates node velocities each
//! tick after the registered forces have nudged them. Pinned axes (`fx`/`fy`)
//! override integration. The constants match d3-force so layouts feel the same
//! as the browser library the graphs were first drawn with.

use std::f64::consts::PI;

use super::forces::Force;
use super::types::Node;

/// Radius step of the initial phyllotaxis placement.
const INITIAL_RADIUS: f64 = 10.0;

/// Tunable simulation constants.
#[derive(Clone, Debug)]
pub struct SimulationParameters {
	/// Starting heat.
	pub alpha: f64,
	/// The simulation settles once alpha drops below this.
	pub alpha_min: f64,
	/// Fraction of the gap to `alpha_target` closed each tick.
	pub alpha_decay: f64,
	/// Heat the simulation converges towards.
	pub alpha_target: f64,
	/// Fraction of velocity lost each tick.
	pub velocity_decay: f64,
}

impl Default for SimulationParameters {
	fn default() -> Self {
		let alpha_min: f64 = 0.001;
		Self {
			alpha: 1.0,
			alpha_min,
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			alpha_target: 0.0,
			velocity_decay: 0.4,
		}
	}
}

/// Deterministic linear congruential generator used to break ties between
/// coincident nodes, so the same input always produces the same layout.
#[derive(Clone, Debug)]
pub struct Lcg(u64);

impl Default for Lcg {
	fn default() -> Self {
		Self(1)
	}
}

impl Lcg {
	const A: u64 = 1_664_525;
	const C: u64 = 1_013_904_223;
	const M: u64 = 1 << 32;

	/// Next value in `[0, 1)`.
	pub fn next_f64(&mut self) -> f64 {
		self.0 = (Self::A * self.0 + Self::C) % Self::M;
		self.0 as f64 / Self::M as f64
	}

	/// Tiny random offset for separating coincident points.
	pub fn jiggle(&mut self) -> f64 {
		(self.next_f64() - 0.5) * 1e-6
	}
}

/// The physics state of one layout.
pub struct Simulation {
	alpha: f64,
	alpha_min: f64,
	alpha_decay: f64,
	alpha_target: f64,
	velocity_retention: f64,
	forces: Vec<(String, Box<dyn Force>)>,
	random: Lcg,
}

impl Simulation {
	/// Create a simulation and give every unplaced node a starting position.
	pub fn new(nodes: &mut [Node], params: SimulationParameters) -> Self {
		initialize_nodes(nodes);
		Self {
			alpha: params.alpha,
			alpha_min: params.alpha_min,
			alpha_decay: params.alpha_decay,
			alpha_target: params.alpha_target,
			velocity_retention: 1.0 - params.velocity_decay,
			forces: Vec::new(),
			random: Lcg::default(),
		}
	}

	/// Register a force under `name`, replacing any force already there.
	pub fn set_force(&mut self, name: impl Into<String>, force: Box<dyn Force>) {
		let name = name.into();
		match self.forces.iter_mut().find(|(n, _)| *n == name) {
			Some(slot) => slot.1 = force,
			None => self.forces.push((name, force)),
		}
	}

	/// Names of the registered forces, in application order.
	pub fn force_names(&self) -> Vec<&str> {
		self.forces.iter().map(|(n, _)| n.as_str()).collect()
	}

	/// Current heat.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Heat the simulation converges towards.
	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	/// Change the heat the simulation converges towards.
	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target;
	}

	/// Settling threshold.
	pub fn alpha_min(&self) -> f64 {
		self.alpha_min
	}

	/// Whether alpha has dropped below the settling threshold.
	pub fn is_settled(&self) -> bool {
		self.alpha < self.alpha_min
	}

	/// Advance one step: cool, apply forces, integrate.
	pub fn tick(&mut self, nodes: &mut [Node]) {
		self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;

		for (_, force) in &mut self.forces {
			force.apply(nodes, self.alpha, &mut self.random);
		}

		for node in nodes.iter_mut() {
			match node.fx {
				Some(fx) => {
					node.x = fx;
					node.vx = 0.0;
				}
				None => {
					node.vx *= self.velocity_retention;
					node.x += node.vx;
				}
			}
			match node.fy {
				Some(fy) => {
					node.y = fy;
					node.vy = 0.0;
				}
				None => {
					node.vy *= self.velocity_retention;
					node.y += node.vy;
				}
			}
		}
	}
}

/// Place nodes that have no position on a phyllotaxis spiral around the origin.
/// Pinned axes start at their pin.
pub fn initialize_nodes(nodes: &mut [Node]) {
	let initial_angle = PI * (3.0 - 5f64.sqrt());
	for (i, node) in nodes.iter_mut().enumerate() {
		if let Some(fx) = node.fx {
			node.x = fx;
		}
		if let Some(fy) = node.fy {
			node.y = fy;
		}
		if node.x.is_nan() || node.y.is_nan() {
			let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
			let angle = i as f64 * initial_angle;
			node.x = radius * angle.cos();
			node.y = radius * angle.sin();
		}
		if node.vx.is_nan() || node.vy.is_nan() {
			node.vx = 0.0;
			node.vy = 0.0;
		}
	}
}

#[cfg(test)]
mod tests {
	use float_cmp::approx_eq;

	use super::*;

	#[test]
	fn unplaced_nodes_get_distinct_positions() {
		let mut nodes = vec![Node::default(), Node::default(), Node::default()];
		initialize_nodes(&mut nodes);
		assert!(approx_eq!(f64, nodes[0].x, 10.0 * 0.5f64.sqrt(), ulps = 2));
		assert!(approx_eq!(f64, nodes[0].y, 0.0, ulps = 2));
		assert!(nodes.iter().all(|n| n.x.is_finite() && n.y.is_finite()));
		assert!(nodes[1].x != nodes[2].x);
	}

	#[test]
	fn pinned_nodes_start_at_their_pin() {
		let mut nodes = vec![Node {
			fx: Some(40.0),
			fy: Some(-5.0),
			..Node::default()
		}];
		initialize_nodes(&mut nodes);
		assert_eq!((nodes[0].x, nodes[0].y), (40.0, -5.0));
	}

	#[test]
	fn alpha_decays_towards_target() {
		let mut nodes = vec![Node::default()];
		let mut sim = Simulation::new(&mut nodes, SimulationParameters::default());
		sim.tick(&mut nodes);
		assert!(sim.alpha() < 1.0);
		for _ in 0..400 {
			sim.tick(&mut nodes);
		}
		assert!(sim.is_settled());
		assert!(sim.alpha() < sim.alpha_min());

		sim.set_alpha_target(0.3);
		for _ in 0..400 {
			sim.tick(&mut nodes);
		}
		assert!(approx_eq!(f64, sim.alpha(), 0.3, epsilon = 1e-3));
	}

	#[test]
	fn pins_override_integration() {
		let mut nodes = vec![Node {
			x: 0.0,
			y: 0.0,
			vx: 5.0,
			vy: 5.0,
			fx: Some(12.0),
			..Node::default()
		}];
		let mut sim = Simulation::new(&mut nodes, SimulationParameters::default());
		sim.tick(&mut nodes);
		assert_eq!(nodes[0].x, 12.0);
		assert_eq!(nodes[0].vx, 0.0);
		assert!(approx_eq!(f64, nodes[0].y, 3.0, ulps = 2));
	}

	#[test]
	fn lcg_is_deterministic() {
		let (mut a, mut b) = (Lcg::default(), Lcg::default());
		for _ in 0..10 {
			let v = a.next_f64();
			assert_eq!(v, b.next_f64());
			assert!((0.0..1.0).contains(&v));
		}
	}
}
