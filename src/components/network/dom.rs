//! [`Surface`] backed by the browser DOM.

use std::cell::Cell;

use log::warn;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlCollection};

use super::surface::{Surface, parse_length, parse_view_box};
use crate::error::SurfaceError;

/// Namespace every element is created in.
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Attribute holding a generated identity for elements without an `id`.
const IDENTITY: &str = "data-network-id";

thread_local! {
	static NEXT_IDENTITY: Cell<u32> = const { Cell::new(0) };
}

/// Draws SVG elements into a document.
#[derive(Clone, Debug)]
pub struct DomSurface {
	document: Document,
}

impl DomSurface {
	/// Surface over `document`.
	pub fn new(document: Document) -> Self {
		Self { document }
	}

	/// Surface over the current window's document.
	pub fn current() -> Option<Self> {
		web_sys::window()?.document().map(Self::new)
	}

	/// The underlying document.
	pub fn document(&self) -> &Document {
		&self.document
	}
}

fn elements(collection: HtmlCollection) -> impl Iterator<Item = Element> {
	(0..collection.length()).filter_map(move |i| collection.item(i))
}

impl Surface for DomSurface {
	type Element = Element;

	fn children(&self, parent: &Element, tag: &str, class: &str) -> Vec<Element> {
		elements(parent.children())
			.filter(|el| el.tag_name().eq_ignore_ascii_case(tag))
			.filter(|el| class.is_empty() || el.class_list().contains(class))
			.collect()
	}

	fn append(&self, parent: &Element, tag: &str) -> Result<Element, SurfaceError> {
		let failed = |e: wasm_bindgen::JsValue| SurfaceError::Create {
			tag: tag.to_string(),
			reason: format!("{e:?}"),
		};
		let element = self.document.create_element_ns(Some(SVG_NS), tag).map_err(failed)?;
		parent.append_child(&element).map_err(failed)?;
		Ok(element)
	}

	fn remove(&self, element: &Element) {
		element.remove();
	}

	fn set_attribute(&self, element: &Element, name: &str, value: &str) {
		if let Err(e) = element.set_attribute(name, value) {
			warn!("network: cannot set {name}={value}: {e:?}");
		}
	}

	fn attribute(&self, element: &Element, name: &str) -> Option<String> {
		element.get_attribute(name)
	}

	fn set_class(&self, element: &Element, class: &str, on: bool) {
		if let Err(e) = element.class_list().toggle_with_force(class, on) {
			warn!("network: cannot toggle class {class}: {e:?}");
		}
	}

	fn has_class(&self, element: &Element, class: &str) -> bool {
		element.class_list().contains(class)
	}

	fn identity(&self, element: &Element) -> String {
		let id = element.id();
		if !id.is_empty() {
			return id;
		}
		if let Some(existing) = element.get_attribute(IDENTITY) {
			return existing;
		}
		let generated = NEXT_IDENTITY.with(|n| {
			let next = n.get();
			n.set(next + 1);
			format!("network-{next}")
		});
		self.set_attribute(element, IDENTITY, &generated);
		generated
	}

	fn extent(&self, element: &Element) -> (f64, f64) {
		let Ok(Some(svg)) = element.closest("svg") else {
			return (0.0, 0.0);
		};
		if let Some(size) = svg.get_attribute("viewBox").as_deref().and_then(parse_view_box) {
			return size;
		}
		let length = |name: &str| svg.get_attribute(name).as_deref().and_then(parse_length);
		match (length("width"), length("height")) {
			(Some(w), Some(h)) => (w, h),
			(w, h) => {
				// percentage or missing sizes: fall back to the laid-out box
				let rect = svg.get_bounding_client_rect();
				(w.unwrap_or(rect.width()), h.unwrap_or(rect.height()))
			}
		}
	}
}

/// The node element under an event target, if any.
pub fn closest_node(target: &web_sys::EventTarget) -> Option<Element> {
	target.dyn_ref::<Element>()?.closest(".node").ok().flatten()
}
