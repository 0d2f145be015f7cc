//! Leptos component drawing a network into an SVG element.
//!
//! The component owns an `<svg>` inside a container div and re-runs
//! [`network`] whenever the `data` signal changes, which replaces the running
//! layout through the registry. Mouse events are translated into
//! [`Interaction`]s; an animation loop steps the layout via
//! `requestAnimationFrame`.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{Element, MouseEvent};

use super::bind::bind_one;
use super::dom::{DomSurface, SVG_NS, closest_node};
use super::interaction::{self, Interaction, Rect};
use super::state::{Network, NetworkOptions, network};
use super::surface::Surface;
use super::types::{Graph, Node};
use crate::error::NetworkError;

/// Pointer gesture in progress.
#[derive(Clone, Copy, Debug, Default)]
enum Gesture {
	#[default]
	Idle,
	Drag(usize),
	Brush {
		ox: f64,
		oy: f64,
		x: f64,
		y: f64,
	},
}

/// Bundles the live network with the svg it draws into and the current gesture.
struct NetworkContext {
	network: Network<DomSurface>,
	svg: Element,
	gesture: Gesture,
}

fn pointer(ev: &MouseEvent, svg: &Element) -> (f64, f64) {
	let rect = svg.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn report(result: Result<Vec<interaction::Effect>, NetworkError>) -> bool {
	match result {
		Ok(_) => true,
		Err(e) => {
			warn!("network: {e}");
			false
		}
	}
}

/// Draw the brush selection rectangle, or hide it when `rect` is `None`.
fn draw_selection(network: &Network<DomSurface>, rect: Option<Rect>) {
	let Some(group) = network.brush_group() else {
		return;
	};
	let surface = network.surface();
	let Ok(selection) = bind_one(surface, group, "rect", "selection") else {
		return;
	};
	let rect = rect.unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0));
	surface.set_attribute(&selection, "x", &rect.x0.to_string());
	surface.set_attribute(&selection, "y", &rect.y0.to_string());
	surface.set_attribute(&selection, "width", &(rect.x1 - rect.x0).to_string());
	surface.set_attribute(&selection, "height", &(rect.y1 - rect.y0).to_string());
}

/// Renders an interactive node-link network as SVG.
///
/// Pass graph data via the reactive `data` signal. Set `fullscreen = true` to
/// fill the viewport; explicit `width`/`height` override the container size.
/// When `selection` is given, brushing is enabled and the ids of the brushed
/// nodes are written to it.
#[component]
pub fn NetworkGraph(
	#[prop(into)] data: Signal<Graph>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(default = 0.0)] link_curvature: f64,
	#[prop(optional)] selection: Option<WriteSignal<Vec<String>>>,
) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let context: Rc<RefCell<Option<NetworkContext>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (context_init, animate_init, resize_cb_init) =
		(context.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let graph = data.get();
		let Some(container) = container_ref.get() else {
			return;
		};
		let (Some(window), Some(surface)) = (web_sys::window(), DomSurface::current()) else {
			return;
		};
		let container: &Element = &container;

		let existing = context_init.borrow().as_ref().map(|c| c.svg.clone());
		let svg = match existing {
			Some(svg) => svg,
			None => {
				let svg = match surface.document().create_element_ns(Some(SVG_NS), "svg") {
					Ok(svg) => svg,
					Err(e) => {
						warn!("network: cannot create svg: {e:?}");
						return;
					}
				};
				if let Err(e) = container.append_child(&svg) {
					warn!("network: cannot mount svg: {e:?}");
					return;
				}
				svg
			}
		};

		let (w, h) = if fullscreen {
			(
				window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0),
				window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0),
			)
		} else {
			(
				width.unwrap_or_else(|| match container.client_width() {
					0 => 800.0,
					w => w as f64,
				}),
				height.unwrap_or_else(|| match container.client_height() {
					0 => 600.0,
					h => h as f64,
				}),
			)
		};
		surface.set_attribute(&svg, "width", &w.to_string());
		surface.set_attribute(&svg, "height", &h.to_string());

		let mut options = NetworkOptions::new(graph.into_shared())
			.width(w)
			.height(h)
			.link_curvature(link_curvature);
		if let Some(selection) = selection {
			options = options.brush(move |nodes: &[&Node]| {
				selection.set(nodes.iter().map(|n| n.id.clone()).collect());
			});
		}

		match network(&surface, &svg, options) {
			Ok(network) => {
				*context_init.borrow_mut() = Some(NetworkContext {
					network,
					svg: svg.clone(),
					gesture: Gesture::Idle,
				});
			}
			Err(e) => {
				warn!("network: {e}");
				return;
			}
		}

		if fullscreen && resize_cb_init.borrow().is_none() {
			let svg_resize = svg.clone();
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				for (name, size) in [("width", win.inner_width()), ("height", win.inner_height())] {
					if let Some(v) = size.ok().and_then(|v| v.as_f64()) {
						if let Err(e) = svg_resize.set_attribute(name, &v.to_string()) {
							warn!("network: cannot resize svg {name}: {e:?}");
						}
					}
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				if let Err(e) = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref()) {
					warn!("network: cannot listen for resize: {e:?}");
				}
			}
		}

		if animate_init.borrow().is_some() {
			return;
		}
		let (context_anim, animate_inner) = (context_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref c) = *context_anim.borrow() {
				c.network.step();
			}
			if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				if let Err(e) = win.request_animation_frame(cb.as_ref().unchecked_ref::<js_sys::Function>()) {
					warn!("network: animation loop stopped: {e:?}");
				}
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			if let Err(e) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
				warn!("network: cannot start animation loop: {e:?}");
			}
		}
	});

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let mut guard = context_md.borrow_mut();
		let Some(c) = guard.as_mut() else {
			return;
		};
		let (x, y) = pointer(&ev, &c.svg);
		let node = ev
			.target()
			.as_ref()
			.and_then(closest_node)
			.and_then(|el| c.network.node_index(&el));
		match node {
			Some(node) => {
				if report(c.network.dispatch(Interaction::DragStart { node })) {
					c.gesture = Gesture::Drag(node);
				}
			}
			None if c.network.brush_group().is_some() => {
				report(c.network.dispatch(Interaction::BrushStart));
				if c.network.controller().is_brushing() {
					c.gesture = Gesture::Brush { ox: x, oy: y, x, y };
				}
			}
			None => {}
		}
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let mut guard = context_mm.borrow_mut();
		let Some(c) = guard.as_mut() else {
			return;
		};
		let (x, y) = pointer(&ev, &c.svg);
		match c.gesture {
			Gesture::Drag(node) => {
				report(c.network.dispatch(Interaction::DragMove { node, x, y }));
			}
			Gesture::Brush { ox, oy, .. } => {
				c.gesture = Gesture::Brush { ox, oy, x, y };
				draw_selection(&c.network, Some(Rect::new(ox, oy, x, y)));
			}
			Gesture::Idle => {}
		}
	};

	let finish = |c: &mut NetworkContext, cancel: bool| match std::mem::take(&mut c.gesture) {
		Gesture::Drag(node) => {
			report(c.network.dispatch(Interaction::DragEnd { node }));
		}
		Gesture::Brush { ox, oy, x, y } => {
			draw_selection(&c.network, None);
			let rect = Rect::new(ox, oy, x, y);
			let selection = (!cancel && !rect.is_empty()).then_some(rect);
			report(c.network.dispatch(Interaction::BrushEnd { selection }));
		}
		Gesture::Idle => {}
	};

	let context_mu = context.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(c) = context_mu.borrow_mut().as_mut() {
			finish(c, false);
		}
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(c) = context_ml.borrow_mut().as_mut() {
			finish(c, true);
		}
	};

	let context_dc = context.clone();
	let on_dblclick = move |ev: MouseEvent| {
		ev.stop_propagation();
		let mut guard = context_dc.borrow_mut();
		let Some(c) = guard.as_mut() else {
			return;
		};
		let node = ev
			.target()
			.as_ref()
			.and_then(closest_node)
			.and_then(|el| c.network.node_index(&el));
		let event = match node {
			Some(node) => Interaction::NodeDoubleClick { node },
			None => Interaction::BackgroundDoubleClick,
		};
		report(c.network.dispatch(event));
	};

	view! {
		<div
			node_ref=container_ref
			class="network-graph"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:dblclick=on_dblclick
			style="width: 100%; height: 100%; user-select: none;"
		/>
	}
}
