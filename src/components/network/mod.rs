//! Interactive force-directed network rendering.
//!
//! A [`Graph`] is laid out by a force simulation and drawn onto a [`Surface`]
//! as SVG elements:
//! - Named, pluggable forces (link springs, charge, centring) via [`Forces`]
//! - Node dragging with pinning, double-click release and brush selection
//! - One running layout per target, replaced cleanly on re-invocation
//!
//! # Example
//!
//! ```
//! use kpartite_network::components::network::{
//! 	Graph, Link, MemorySurface, NetworkOptions, Node, Surface, network,
//! };
//!
//! let graph = Graph {
//! 	nodes: vec![Node::with_id("a"), Node::with_id("b")],
//! 	links: vec![Link::new("a", "b")],
//! };
//! let (surface, svg) = MemorySurface::svg(400.0, 300.0);
//! let net = network(&surface, &svg, NetworkOptions::new(graph.into_shared())).unwrap();
//! net.step();
//! assert_eq!(surface.children(net.node_group(), "circle", "node").len(), 2);
//! net.stop();
//! ```

pub mod bind;
mod component;
pub mod dom;
pub mod forces;
pub mod interaction;
pub mod layout;
pub mod registry;
pub mod render;
pub mod simulation;
mod state;
pub mod surface;
mod types;

pub use component::NetworkGraph;
pub use dom::DomSurface;
pub use forces::{Axis, Force, ForceContext, Forces, LinkForce, ManyBodyForce, PositionForce};
pub use interaction::{Controller, Effect, Interaction, PinState, Rect};
pub use layout::{Layout, LayoutOptions, SharedLayout};
pub use simulation::{Simulation, SimulationParameters};
pub use state::{BrushCallback, Network, NetworkOptions, network};
pub use surface::{ElementId, MemorySurface, Surface};
pub use types::{Endpoint, Graph, Link, Node, SharedGraph};
