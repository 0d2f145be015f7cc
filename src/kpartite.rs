//! k-partite projection of tabular rows into a node-link graph.
//!
//! Every key spec turns a row into one `(label, value)` node; every pair of
//! keys within a row becomes a link. Nodes are deduplicated by
//! `["label", value]` and accumulate the row's value fields once per pair they
//! take part in. Links keep the value fields of the row that first produced
//! them.
//!
//! ```
//! use kpartite_network::kpartite::{kpartite, KeySpecs, ValueSpecs};
//! use serde_json::json;
//!
//! let rows: Vec<_> = [
//! 	json!({"Country": "USA", "Religion": "Christian", "Population": 100}),
//! 	json!({"Country": "UK", "Religion": "Christian", "Population": 60}),
//! ]
//! .into_iter()
//! .map(|r| r.as_object().cloned().unwrap())
//! .collect();
//!
//! let keys = KeySpecs::new().field("Country", "Country").field("Religion", "Religion");
//! let values = ValueSpecs::new().constant("count", 1.0).field("totalPopulation", "Population");
//! let graph = kpartite(&rows, &keys, &values).unwrap();
//! assert_eq!(graph.nodes.len(), 3);
//! assert_eq!(graph.links.len(), 2);
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use log::debug;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value, json};

use crate::components::network::{Endpoint, Graph, Link, Node};
use crate::error::{AggregateError, NetworkError};

/// One input record: field name to scalar.
pub type Row = Map<String, Value>;

/// How a key spec reads its value from a row.
#[derive(Clone)]
pub enum KeyAccessor {
	/// Read the named field. A missing field reads as `null`.
	Field(String),
	/// Compute the value from the whole row.
	Func(Rc<dyn Fn(&Row) -> Value>),
}

impl KeyAccessor {
	fn read(&self, row: &Row) -> Value {
		match self {
			KeyAccessor::Field(field) => row.get(field).cloned().unwrap_or(Value::Null),
			KeyAccessor::Func(f) => f(row),
		}
	}
}

impl fmt::Debug for KeyAccessor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			KeyAccessor::Field(field) => f.debug_tuple("Field").field(field).finish(),
			KeyAccessor::Func(_) => f.write_str("Func(..)"),
		}
	}
}

/// Ordered `(label, accessor)` pairs. Order fixes the pairwise enumeration.
#[derive(Clone, Debug, Default)]
pub struct KeySpecs(Vec<(String, KeyAccessor)>);

impl KeySpecs {
	/// Empty key list.
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a key reading `field` from each row.
	pub fn field(mut self, label: impl Into<String>, field: impl Into<String>) -> Self {
		self.0.push((label.into(), KeyAccessor::Field(field.into())));
		self
	}

	/// Add a key computed from each row.
	pub fn with(mut self, label: impl Into<String>, f: impl Fn(&Row) -> Value + 'static) -> Self {
		self.0.push((label.into(), KeyAccessor::Func(Rc::new(f))));
		self
	}

	/// Number of keys.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether there are no keys.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl<'de> Deserialize<'de> for KeySpecs {
	/// Accepts `{"label": "field", ...}` or `[["label", "field"], ...]`.
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Object(Map<String, Value>),
			Pairs(Vec<(String, String)>),
		}

		let pairs = match Raw::deserialize(deserializer)? {
			Raw::Pairs(pairs) => pairs,
			Raw::Object(map) => map
				.into_iter()
				.map(|(label, field)| match field {
					Value::String(field) => Ok((label, field)),
					other => Err(D::Error::custom(format!(
						"key `{label}` must name a field, found {other}"
					))),
				})
				.collect::<Result<Vec<_>, D::Error>>()?,
		};
		Ok(Self(
			pairs
				.into_iter()
				.map(|(label, field)| (label, KeyAccessor::Field(field)))
				.collect(),
		))
	}
}

/// How a value spec computes its per-row number.
#[derive(Clone)]
pub enum ValueAccessor {
	/// The same number for every row; `1.0` counts occurrences.
	Constant(f64),
	/// Read the named numeric field.
	Field(String),
	/// Compute the number from the whole row.
	Func(Rc<dyn Fn(&Row) -> f64>),
}

impl ValueAccessor {
	fn read(&self, row: &Row, index: usize) -> Result<f64, AggregateError> {
		match self {
			ValueAccessor::Constant(v) => Ok(*v),
			ValueAccessor::Func(f) => Ok(f(row)),
			ValueAccessor::Field(field) => {
				let found = row.get(field).cloned().unwrap_or(Value::Null);
				found.as_f64().ok_or_else(|| AggregateError::NotNumeric {
					field: field.clone(),
					row: index,
					found,
				})
			}
		}
	}
}

impl fmt::Debug for ValueAccessor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ValueAccessor::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
			ValueAccessor::Field(field) => f.debug_tuple("Field").field(field).finish(),
			ValueAccessor::Func(_) => f.write_str("Func(..)"),
		}
	}
}

/// Ordered `(field name, accessor)` pairs aggregated onto nodes and links.
#[derive(Clone, Debug, Default)]
pub struct ValueSpecs(Vec<(String, ValueAccessor)>);

impl ValueSpecs {
	/// No aggregated fields.
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a constant-valued field.
	pub fn constant(mut self, name: impl Into<String>, value: f64) -> Self {
		self.0.push((name.into(), ValueAccessor::Constant(value)));
		self
	}

	/// Add a field summing the named row field.
	pub fn field(mut self, name: impl Into<String>, field: impl Into<String>) -> Self {
		self.0.push((name.into(), ValueAccessor::Field(field.into())));
		self
	}

	/// Add a field computed from each row.
	pub fn with(mut self, name: impl Into<String>, f: impl Fn(&Row) -> f64 + 'static) -> Self {
		self.0.push((name.into(), ValueAccessor::Func(Rc::new(f))));
		self
	}

	fn read(&self, row: &Row, index: usize) -> Result<Vec<(&str, f64)>, AggregateError> {
		self.0
			.iter()
			.map(|(name, accessor)| Ok((name.as_str(), accessor.read(row, index)?)))
			.collect()
	}
}

impl<'de> Deserialize<'de> for ValueSpecs {
	/// Accepts `{"name": 1, "other": "Field"}`: numbers are constants, strings field reads.
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Constant(f64),
			Field(String),
		}

		let map = Map::<String, Value>::deserialize(deserializer)?;
		let mut specs = Vec::with_capacity(map.len());
		for (name, raw) in map {
			let accessor = match Raw::deserialize(raw).map_err(D::Error::custom)? {
				Raw::Constant(v) => ValueAccessor::Constant(v),
				Raw::Field(f) => ValueAccessor::Field(f),
			};
			specs.push((name, accessor));
		}
		Ok(Self(specs))
	}
}

/// Deterministic node id: the JSON text of `[label, value]`.
pub fn node_id(label: &str, value: &Value) -> String {
	json!([label, value]).to_string()
}

/// Deterministic link id: the JSON text of `[source_id, target_id]`.
pub fn link_id(source: &str, target: &str) -> String {
	json!([source, target]).to_string()
}

/// Project `rows` into a deduplicated, aggregated node-link graph.
pub fn kpartite(rows: &[Row], keys: &KeySpecs, values: &ValueSpecs) -> Result<Graph, AggregateError> {
	let mut graph = Graph::default();
	let mut nodes_by_id: HashMap<String, usize> = HashMap::new();
	let mut seen_links: HashSet<String> = HashSet::new();
	let zeroed: Map<String, Value> = values
		.0
		.iter()
		.map(|(name, _)| (name.clone(), Value::from(0.0)))
		.collect();

	for (r, row) in rows.iter().enumerate() {
		let mut touched = Vec::with_capacity(keys.len());
		for (label, accessor) in &keys.0 {
			let value = accessor.read(row);
			let id = node_id(label, &value);
			let index = match nodes_by_id.get(&id) {
				Some(&index) => index,
				None => {
					graph.nodes.push(Node {
						id: id.clone(),
						key: label.clone(),
						value,
						data: zeroed.clone(),
						..Node::default()
					});
					nodes_by_id.insert(id, graph.nodes.len() - 1);
					graph.nodes.len() - 1
				}
			};
			touched.push(index);
		}

		if touched.len() < 2 {
			continue;
		}
		let row_values = values.read(row, r)?;

		for i in 0..touched.len() {
			for j in i + 1..touched.len() {
				let (s, t) = (touched[i], touched[j]);
				let id = link_id(&graph.nodes[s].id, &graph.nodes[t].id);
				if seen_links.insert(id.clone()) {
					graph.links.push(Link {
						source: Endpoint::Index(s),
						target: Endpoint::Index(t),
						id,
						data: row_values
							.iter()
							.map(|(name, v)| (name.to_string(), Value::from(*v)))
							.collect(),
					});
				}
				for (name, v) in &row_values {
					graph.nodes[s].accumulate(name, *v);
					graph.nodes[t].accumulate(name, *v);
				}
			}
		}
	}

	debug!(
		"kpartite: {} rows -> {} nodes, {} links",
		rows.len(),
		graph.nodes.len(),
		graph.links.len()
	);
	Ok(graph)
}

/// Graph input as loaded from JSON: either a table to project or a ready graph.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GraphSource {
	/// Rows plus key and value specs, projected with [`kpartite`].
	Table {
		/// Input records.
		rows: Vec<Row>,
		/// Key specs.
		keys: KeySpecs,
		/// Value specs; none when omitted.
		#[serde(default)]
		values: ValueSpecs,
	},
	/// A pre-built node/link list.
	Graph(Graph),
}

impl Default for GraphSource {
	fn default() -> Self {
		GraphSource::Graph(Graph::default())
	}
}

impl GraphSource {
	/// Produce the graph, aggregating when the source is tabular.
	pub fn into_graph(self) -> Result<Graph, NetworkError> {
		match self {
			GraphSource::Table { rows, keys, values } => Ok(kpartite(&rows, &keys, &values)?),
			GraphSource::Graph(graph) => Ok(graph),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn rows(values: Value) -> Vec<Row> {
		values
			.as_array()
			.unwrap()
			.iter()
			.map(|r| r.as_object().unwrap().clone())
			.collect()
	}

	fn find<'a>(graph: &'a Graph, value: &str) -> &'a Node {
		graph.nodes.iter().find(|n| n.value == value).unwrap()
	}

	fn sales() -> Vec<Row> {
		rows(json!([
			{"item": "Apple", "type": "Fruit", "store": "Store1", "sales": 10},
			{"item": "Banana", "type": "Fruit", "store": "Store1", "sales": 5},
			{"item": "Apple", "type": "Fruit", "store": "Store2", "sales": 8},
		]))
	}

	#[test]
	fn empty_rows_give_empty_graph() {
		let keys = KeySpecs::new().field("Country", "Country").field("Religion", "Religion");
		let graph = kpartite(&[], &keys, &ValueSpecs::new()).unwrap();
		assert!(graph.nodes.is_empty());
		assert!(graph.links.is_empty());
	}

	#[test]
	fn country_religion_scenario() {
		let data = rows(json!([
			{"Country": "USA", "Religion": "Christian", "Population": 100},
			{"Country": "UK", "Religion": "Christian", "Population": 60},
			{"Country": "Iran", "Religion": "Muslim", "Population": 80},
		]));
		let keys = KeySpecs::new()
			.field("Country", "Country")
			.with("Religion", |r| r["Religion"].clone());
		let values = ValueSpecs::new()
			.constant("count", 1.0)
			.field("totalPopulation", "Population");

		let graph = kpartite(&data, &keys, &values).unwrap();
		assert_eq!(graph.nodes.len(), 5);
		assert_eq!(graph.links.len(), 3);

		let usa = find(&graph, "USA");
		assert_eq!(usa.id, r#"["Country","USA"]"#);
		assert_eq!(usa.number("count"), Some(1.0));
		assert_eq!(usa.number("totalPopulation"), Some(100.0));

		let christian = find(&graph, "Christian");
		assert_eq!(christian.key, "Religion");
		assert_eq!(christian.number("count"), Some(2.0));
		assert_eq!(christian.number("totalPopulation"), Some(160.0));

		let link = graph
			.links
			.iter()
			.find(|l| l.id == link_id(&usa.id, &christian.id))
			.unwrap();
		let (s, t) = link.endpoints().unwrap();
		assert_eq!(graph.nodes[s].id, usa.id);
		assert_eq!(graph.nodes[t].id, christian.id);
		assert_eq!(link.number("totalPopulation"), Some(100.0));
		assert_eq!(link.number("count"), Some(1.0));
	}

	#[test]
	fn nodes_accumulate_once_per_pair() {
		let keys = KeySpecs::new()
			.field("item", "item")
			.field("type", "type")
			.field("store", "store");
		let values = ValueSpecs::new().constant("occurrences", 1.0).field("totalSales", "sales");
		let graph = kpartite(&sales(), &keys, &values).unwrap();

		assert_eq!(graph.nodes.len(), 5);
		assert_eq!(graph.links.len(), 7);

		// three keys per row: every node sits in two pairs per row
		let apple = find(&graph, "Apple");
		assert_eq!(apple.number("occurrences"), Some(4.0));
		assert_eq!(apple.number("totalSales"), Some(36.0));
		let fruit = find(&graph, "Fruit");
		assert_eq!(fruit.number("occurrences"), Some(6.0));
		assert_eq!(fruit.number("totalSales"), Some(46.0));
	}

	#[test]
	fn links_keep_first_row_values() {
		let keys = KeySpecs::new()
			.field("item", "item")
			.field("type", "type")
			.field("store", "store");
		let values = ValueSpecs::new().constant("occurrences", 1.0).field("totalSales", "sales");
		let graph = kpartite(&sales(), &keys, &values).unwrap();

		let apple_fruit = link_id(&node_id("item", &json!("Apple")), &node_id("type", &json!("Fruit")));
		let link = graph.links.iter().find(|l| l.id == apple_fruit).unwrap();
		assert_eq!(link.number("totalSales"), Some(10.0));
		assert_eq!(link.number("occurrences"), Some(1.0));

		let fruit_store1 = link_id(&node_id("type", &json!("Fruit")), &node_id("store", &json!("Store1")));
		let link = graph.links.iter().find(|l| l.id == fruit_store1).unwrap();
		assert_eq!(link.number("totalSales"), Some(10.0));
	}

	#[test]
	fn reversed_pairs_stay_distinct_links() {
		let data = rows(json!([
			{"from": "A", "to": "B"},
			{"from": "B", "to": "A"},
			{"from": "A", "to": "B"},
		]));
		let keys = KeySpecs::new().field("n", "from").field("n", "to");
		let graph = kpartite(&data, &keys, &ValueSpecs::new()).unwrap();
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.links.len(), 2);
	}

	#[test]
	fn repeated_runs_are_identical() {
		let keys = KeySpecs::new().field("item", "item").field("store", "store");
		let values = ValueSpecs::new().field("totalSales", "sales");
		let a = kpartite(&sales(), &keys, &values).unwrap();
		let b = kpartite(&sales(), &keys, &values).unwrap();
		assert_eq!(serde_json::to_value(&a).unwrap(), serde_json::to_value(&b).unwrap());
	}

	#[test]
	fn missing_key_field_reads_null() {
		let data = rows(json!([{"a": 1}]));
		let keys = KeySpecs::new().field("a", "a").field("b", "b");
		let graph = kpartite(&data, &keys, &ValueSpecs::new()).unwrap();
		assert_eq!(graph.nodes[1].id, r#"["b",null]"#);
	}

	#[test]
	fn non_numeric_value_field_is_an_error() {
		let data = rows(json!([
			{"a": 1, "b": 2, "v": 3},
			{"a": 1, "b": 2, "v": "three"},
		]));
		let keys = KeySpecs::new().field("a", "a").field("b", "b");
		let values = ValueSpecs::new().field("total", "v");
		assert_eq!(
			kpartite(&data, &keys, &values).unwrap_err(),
			AggregateError::NotNumeric {
				field: "v".into(),
				row: 1,
				found: json!("three"),
			}
		);
	}

	#[test]
	fn graph_source_projects_tables() {
		let source: GraphSource = serde_json::from_value(json!({
			"rows": [{"category": "A", "subcategory": "X", "value": 10}],
			"keys": [["mainCat", "category"], ["subCat", "subcategory"]],
			"values": {"sumValue": "value", "count": 1}
		}))
		.unwrap();
		let graph = source.into_graph().unwrap();
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.links.len(), 1);
		assert_eq!(graph.nodes[0].number("sumValue"), Some(10.0));
		assert_eq!(graph.links[0].number("count"), Some(1.0));
	}

	#[test]
	fn graph_source_passes_prebuilt_graphs_through() {
		let source: GraphSource = serde_json::from_value(json!({
			"nodes": [{"id": "a"}, {"id": "b"}],
			"links": [{"source": "a", "target": "b"}]
		}))
		.unwrap();
		let graph = source.into_graph().unwrap();
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.links[0].source, Endpoint::Id("a".into()));
	}

	#[test]
	fn object_key_specs_keep_document_order() {
		let source: GraphSource = serde_json::from_str(
			r#"{
				"rows": [{"Country": "USA", "Religion": "Christian"}],
				"keys": {"Religion": "Religion", "Country": "Country"}
			}"#,
		)
		.unwrap();
		let graph = source.into_graph().unwrap();
		assert_eq!(graph.nodes[0].key, "Religion");
		let (s, t) = graph.links[0].endpoints().unwrap();
		assert_eq!((graph.nodes[s].key.as_str(), graph.nodes[t].key.as_str()), ("Religion", "Country"));
		assert_eq!(
			graph.links[0].id,
			link_id(r#"["Religion","Christian"]"#, r#"["Country","USA"]"#)
		);
	}

	#[test]
	fn graph_source_reports_aggregation_errors() {
		let source: GraphSource = serde_json::from_value(json!({
			"rows": [{"a": "x", "b": "y", "n": "lots"}],
			"keys": [["A", "a"], ["B", "b"]],
			"values": {"total": "n"}
		}))
		.unwrap();
		assert_eq!(
			source.into_graph().err(),
			Some(NetworkError::Aggregate(AggregateError::NotNumeric {
				field: "n".into(),
				row: 0,
				found: json!("lots"),
			}))
		);
	}
}
