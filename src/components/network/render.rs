//! Per-tick attribute writes.
//!
//! Links are drawn as circular arcs whose bend is set by a curvature in
//! `[0, 1]`: 0 is a straight line, 0.5 a quarter circle and 1 a half circle.

use std::f64::consts::PI;

use super::bind::Layer;
use super::surface::Surface;
use super::types::{Graph, Node};

/// Chord-to-radius factor for `curvature`: `sqrt(2 (1 - cos(pi c)))`.
pub fn arc_factor(curvature: f64) -> f64 {
	(2.0 * (1.0 - (PI * curvature).cos())).sqrt()
}

/// Radius of the arc through two points `distance` apart. Zero draws straight.
pub fn arc_radius(distance: f64, factor: f64) -> f64 {
	if factor == 0.0 { 0.0 } else { distance / factor }
}

/// SVG path data for a link from `source` to `target`.
pub fn link_path(source: &Node, target: &Node, factor: f64) -> String {
	let r = arc_radius((target.x - source.x).hypot(target.y - source.y), factor);
	format!(
		"M{},{}A{r},{r} 0 0,1 {},{}",
		source.x, source.y, target.x, target.y
	)
}

/// SVG transform placing a node element at the node's position.
pub fn node_transform(node: &Node) -> String {
	format!("translate({},{})", node.x, node.y)
}

/// Writes link paths and node transforms after every tick.
pub struct TickRenderer<S: Surface> {
	surface: S,
	links: Layer<S::Element>,
	nodes: Layer<S::Element>,
	factor: f64,
}

impl<S: Surface> TickRenderer<S> {
	/// Renderer for bound link and node layers.
	pub fn new(surface: S, links: Layer<S::Element>, nodes: Layer<S::Element>, curvature: f64) -> Self {
		Self {
			surface,
			links,
			nodes,
			factor: arc_factor(curvature),
		}
	}

	/// Update every bound element from `graph`.
	pub fn render(&self, graph: &Graph) {
		for (element, link) in self.links.elements().iter().zip(&graph.links) {
			if let Some((s, t)) = link.endpoints() {
				let d = link_path(&graph.nodes[s], &graph.nodes[t], self.factor);
				self.surface.set_attribute(element, "d", &d);
			}
		}
		for (element, node) in self.nodes.elements().iter().zip(&graph.nodes) {
			self.surface.set_attribute(element, "transform", &node_transform(node));
		}
	}
}

#[cfg(test)]
mod tests {
	use float_cmp::approx_eq;

	use super::*;
	use crate::components::network::bind::bind;
	use crate::components::network::surface::MemorySurface;
	use crate::components::network::types::Link;

	fn at(x: f64, y: f64) -> Node {
		Node {
			x,
			y,
			..Node::default()
		}
	}

	#[test]
	fn straight_links_have_zero_radius() {
		assert_eq!(arc_factor(0.0), 0.0);
		assert_eq!(link_path(&at(0.0, 0.0), &at(3.0, 4.0), 0.0), "M0,0A0,0 0 0,1 3,4");
	}

	#[test]
	fn half_circle_radius_is_half_the_chord() {
		let factor = arc_factor(1.0);
		assert!(approx_eq!(f64, factor, 2.0, ulps = 2));
		assert!(approx_eq!(f64, arc_radius(10.0, factor), 5.0, ulps = 2));
	}

	#[test]
	fn quarter_circle_radius() {
		let factor = arc_factor(0.5);
		assert!(approx_eq!(f64, arc_radius(10.0, factor), 10.0 / 2f64.sqrt(), ulps = 4));
	}

	#[test]
	fn renders_bound_elements() {
		let (s, root) = MemorySurface::svg(10.0, 10.0);
		let graph = Graph {
			nodes: vec![at(1.0, 2.0), at(4.0, 6.0)],
			links: vec![Link::new(0, 1)],
		};
		let links = bind(&s, &root, "path", "link", 1).unwrap();
		let nodes = bind(&s, &root, "circle", "node", 2).unwrap();
		let renderer = TickRenderer::new(s.clone(), links.clone(), nodes.clone(), 0.0);
		renderer.render(&graph);
		assert_eq!(s.attribute(&links.elements()[0], "d").as_deref(), Some("M1,2A0,0 0 0,1 4,6"));
		assert_eq!(
			s.attribute(&nodes.elements()[1], "transform").as_deref(),
			Some("translate(4,6)")
		);
	}
}
