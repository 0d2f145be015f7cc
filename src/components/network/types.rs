//! Graph data structures shared by the aggregator, layout, controller and renderer.
//!
//! The node list is an arena: links refer to nodes by index once resolved, so
//! nothing downstream ever holds a copy of a node. [`SharedGraph`] is the single
//! handle through which the layout writes positions, the controller writes pins
//! and the renderer reads both.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::LayoutError;

fn unplaced() -> f64 {
	f64::NAN
}

/// NaN is written as `null` by serde_json, so read `null` back as NaN.
fn nan_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
	Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// A node in the graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
	/// Stable identifier. Aggregated nodes use the JSON text of `[key, value]`.
	#[serde(default)]
	pub id: String,
	/// Key-spec label this node was projected from (e.g. `Country`).
	#[serde(default)]
	pub key: String,
	/// Value read for that key (e.g. `"USA"`).
	#[serde(default)]
	pub value: Value,
	/// Aggregated fields and any extra caller data.
	#[serde(flatten)]
	pub data: Map<String, Value>,
	/// Horizontal position. NaN until the layout places the node.
	#[serde(default = "unplaced", deserialize_with = "nan_if_null")]
	pub x: f64,
	/// Vertical position. NaN until the layout places the node.
	#[serde(default = "unplaced", deserialize_with = "nan_if_null")]
	pub y: f64,
	/// Horizontal velocity.
	#[serde(default)]
	pub vx: f64,
	/// Vertical velocity.
	#[serde(default)]
	pub vy: f64,
	/// Horizontal pin; `None` leaves the axis to the simulation.
	#[serde(default)]
	pub fx: Option<f64>,
	/// Vertical pin; `None` leaves the axis to the simulation.
	#[serde(default)]
	pub fy: Option<f64>,
}

impl Default for Node {
	fn default() -> Self {
		Self {
			id: String::new(),
			key: String::new(),
			value: Value::Null,
			data: Map::new(),
			x: f64::NAN,
			y: f64::NAN,
			vx: 0.0,
			vy: 0.0,
			fx: None,
			fy: None,
		}
	}
}

impl Node {
	/// Node identified only by `id`, as in a pre-built graph.
	pub fn with_id(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			..Self::default()
		}
	}

	/// Read a numeric data field.
	pub fn number(&self, field: &str) -> Option<f64> {
		self.data.get(field).and_then(Value::as_f64)
	}

	/// Add `delta` to a numeric data field, treating a missing field as zero.
	pub fn accumulate(&mut self, field: &str, delta: f64) {
		let current = self.number(field).unwrap_or(0.0);
		self.data.insert(field.to_string(), Value::from(current + delta));
	}

	/// Whether either axis carries a pin.
	pub fn is_pinned(&self) -> bool {
		self.fx.is_some() || self.fy.is_some()
	}

	/// Pin both axes to `(x, y)`.
	pub fn pin(&mut self, x: f64, y: f64) {
		self.fx = Some(x);
		self.fy = Some(y);
	}

	/// Clear both pins.
	pub fn release(&mut self) {
		self.fx = None;
		self.fy = None;
	}
}

/// One end of a link.
///
/// `Index` is a direct reference into the node arena. `Id` names a node by its
/// `id` and is resolved to an index when a layout is built.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Endpoint {
	/// Position in the node list.
	Index(usize),
	/// Node id awaiting resolution.
	Id(String),
}

impl Endpoint {
	/// Arena index, if already resolved.
	pub fn index(&self) -> Option<usize> {
		match self {
			Endpoint::Index(i) => Some(*i),
			Endpoint::Id(_) => None,
		}
	}
}

impl From<usize> for Endpoint {
	fn from(index: usize) -> Self {
		Endpoint::Index(index)
	}
}

impl From<&str> for Endpoint {
	fn from(id: &str) -> Self {
		Endpoint::Id(id.to_string())
	}
}

/// An edge between two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Link {
	/// Source endpoint.
	pub source: Endpoint,
	/// Target endpoint.
	pub target: Endpoint,
	/// Identifier. Aggregated links use the JSON text of `[sourceId, targetId]`.
	#[serde(default)]
	pub id: String,
	/// Aggregated fields and any extra caller data.
	#[serde(flatten)]
	pub data: Map<String, Value>,
}

impl Link {
	/// Link between two endpoints with no id or data.
	pub fn new(source: impl Into<Endpoint>, target: impl Into<Endpoint>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			id: String::new(),
			data: Map::new(),
		}
	}

	/// Resolved `(source, target)` indices, if both ends are resolved.
	pub fn endpoints(&self) -> Option<(usize, usize)> {
		Some((self.source.index()?, self.target.index()?))
	}

	/// Read a numeric data field.
	pub fn number(&self, field: &str) -> Option<f64> {
		self.data.get(field).and_then(Value::as_f64)
	}
}

/// Complete graph data: nodes and links.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Graph {
	/// Node arena.
	#[serde(default)]
	pub nodes: Vec<Node>,
	/// Links into the arena.
	#[serde(default)]
	pub links: Vec<Link>,
}

/// A graph shared by reference between the layout, controller and renderer.
pub type SharedGraph = Rc<RefCell<Graph>>;

impl Graph {
	/// Wrap in a [`SharedGraph`].
	pub fn into_shared(self) -> SharedGraph {
		Rc::new(RefCell::new(self))
	}

	/// Whether links should be resolved by node id rather than position.
	/// Only the first node is inspected.
	pub fn carries_ids(&self) -> bool {
		self.nodes.first().is_some_and(|n| !n.id.is_empty())
	}

	/// Rewrite every link endpoint as an arena index.
	///
	/// `Id` endpoints are looked up by node id when the nodes carry ids. When
	/// they do not, only positional endpoints can resolve. Already-resolved
	/// indices are range checked.
	pub fn resolve_links(&mut self) -> Result<(), LayoutError> {
		let carries_ids = self.carries_ids();
		let Graph { nodes, links } = self;
		let by_id: Option<HashMap<&str, usize>> = carries_ids.then(|| {
			nodes
				.iter()
				.enumerate()
				.map(|(i, n)| (n.id.as_str(), i))
				.collect()
		});

		let resolve = |endpoint: &Endpoint| -> Result<usize, LayoutError> {
			match endpoint {
				Endpoint::Index(i) if *i < nodes.len() => Ok(*i),
				Endpoint::Index(i) => Err(LayoutError::NodeNotFound(i.to_string())),
				Endpoint::Id(id) => by_id
					.as_ref()
					.and_then(|m| m.get(id.as_str()).copied())
					.ok_or_else(|| LayoutError::NodeNotFound(id.clone())),
			}
		};

		let mut resolved = Vec::with_capacity(links.len());
		for link in links.iter() {
			resolved.push((resolve(&link.source)?, resolve(&link.target)?));
		}
		for (link, (s, t)) in links.iter_mut().zip(resolved) {
			link.source = Endpoint::Index(s);
			link.target = Endpoint::Index(t);
		}
		Ok(())
	}
}
