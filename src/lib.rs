//! kpartite-network: k-partite graph aggregation and interactive network rendering.
//!
//! Tabular rows are projected into a node-link graph by [`kpartite()`], then
//! laid out with a force simulation and drawn as SVG by [`network()`], with
//! node dragging, pinning and brush selection. The browser build mounts
//! [`NetworkGraph`] over data read from the page.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;
pub mod error;
pub mod kpartite;

pub use components::network::{
	Graph, Interaction, Link, MemorySurface, Network, NetworkGraph, NetworkOptions, Node, Surface,
	network,
};
pub use error::NetworkError;
pub use kpartite::{GraphSource, KeySpecs, ValueSpecs, kpartite};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("kpartite-network: logging initialized");
}

/// Load graph data from a script element with id="graph-data".
/// Expected format: either `{ rows, keys, values }` or `{ nodes, links }`.
fn load_graph_data() -> Option<Graph> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("graph-data")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	let graph = serde_json::from_str::<GraphSource>(&json_text)
		.map_err(|e| e.to_string())
		.and_then(|source| source.into_graph().map_err(|e| e.to_string()));
	match graph {
		Ok(graph) => {
			info!(
				"kpartite-network: loaded {} nodes, {} links",
				graph.nodes.len(),
				graph.links.len()
			);
			Some(graph)
		}
		Err(e) => {
			warn!("kpartite-network: failed to load graph data: {}", e);
			None
		}
	}
}

/// Main application component.
/// Loads graph data from DOM and renders the interactive network.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let graph_data = load_graph_data().unwrap_or_default();
	let graph_signal = Signal::derive(move || graph_data.clone());
	let (selection, set_selection) = signal(Vec::<String>::new());

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="k-partite Network" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<NetworkGraph data=graph_signal fullscreen=true selection=set_selection />
			<div class="graph-overlay">
				<h1>"k-partite Network"</h1>
				<p class="subtitle">"Drag nodes to pin them. Double-click to release. Drag the background to select."</p>
				<p class="selection">{move || selection.get().join(", ")}</p>
			</div>
		</div>
	}
}
