//! Drawing surfaces.
//!
//! The binder and renderer only ever create, find, remove and annotate
//! elements, so they talk to a [`Surface`] rather than to the DOM directly.
//! [`MemorySurface`] keeps an element tree in memory and can serialize it as
//! SVG markup; the browser build uses [`super::dom::DomSurface`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::SurfaceError;

/// An element tree the network can draw into.
pub trait Surface: Clone + 'static {
	/// Handle to one element. Equal handles refer to the same element.
	type Element: Clone + PartialEq + fmt::Debug + 'static;

	/// Direct children of `parent` with tag `tag` that carry class `class`,
	/// in document order. An empty `class` matches any element of that tag.
	fn children(&self, parent: &Self::Element, tag: &str, class: &str) -> Vec<Self::Element>;

	/// Create a `tag` element as the last child of `parent`.
	fn append(&self, parent: &Self::Element, tag: &str) -> Result<Self::Element, SurfaceError>;

	/// Detach `element` from its parent.
	fn remove(&self, element: &Self::Element);

	/// Set an attribute.
	fn set_attribute(&self, element: &Self::Element, name: &str, value: &str);

	/// Read an attribute.
	fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;

	/// Add or remove one class, leaving the others alone.
	fn set_class(&self, element: &Self::Element, class: &str, on: bool);

	/// Whether the element carries `class`.
	fn has_class(&self, element: &Self::Element, class: &str) -> bool {
		self.attribute(element, "class")
			.is_some_and(|c| c.split_whitespace().any(|c| c == class))
	}

	/// A stable key for `element`, used to find the layout already running on it.
	fn identity(&self, element: &Self::Element) -> String;

	/// Drawing area available to `element`, `(0, 0)` when unknown.
	fn extent(&self, element: &Self::Element) -> (f64, f64);
}

/// Parse an SVG `viewBox` into its width and height.
pub fn parse_view_box(view_box: &str) -> Option<(f64, f64)> {
	let parts: Vec<f64> = view_box
		.split(|c: char| c == ',' || c.is_whitespace())
		.filter(|s| !s.is_empty())
		.map(str::parse)
		.collect::<Result<_, _>>()
		.ok()?;
	match parts.as_slice() {
		[_, _, w, h] => Some((*w, *h)),
		_ => None,
	}
}

/// Parse a length attribute such as `640` or `640px`.
pub fn parse_length(value: &str) -> Option<f64> {
	value.trim().trim_end_matches("px").parse().ok()
}

/// Class list with `class` added or removed.
pub(crate) fn toggle_class(current: Option<&str>, class: &str, on: bool) -> String {
	let mut classes: Vec<&str> = current
		.unwrap_or_default()
		.split_whitespace()
		.filter(|c| *c != class)
		.collect();
	if on {
		classes.push(class);
	}
	classes.join(" ")
}

/// Handle to an element of a [`MemorySurface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ElementId(usize);

#[derive(Debug, Default)]
struct ElementData {
	tag: String,
	attributes: Vec<(String, String)>,
	children: Vec<ElementId>,
	parent: Option<ElementId>,
}

#[derive(Debug, Default)]
struct Tree {
	elements: Vec<ElementData>,
}

/// An in-memory element tree.
///
/// Clones share the same tree. Removed elements keep their id but are no
/// longer reachable from their former parent.
#[derive(Clone, Debug, Default)]
pub struct MemorySurface {
	tree: Rc<RefCell<Tree>>,
}

impl MemorySurface {
	/// An empty surface.
	pub fn new() -> Self {
		Self::default()
	}

	/// An empty surface with a single `<svg>` root of the given size.
	pub fn svg(width: f64, height: f64) -> (Self, ElementId) {
		let surface = Self::new();
		let root = surface.create_root("svg");
		surface.set_attribute(&root, "width", &width.to_string());
		surface.set_attribute(&root, "height", &height.to_string());
		(surface, root)
	}

	/// Create a detached element with no parent.
	pub fn create_root(&self, tag: &str) -> ElementId {
		let mut tree = self.tree.borrow_mut();
		tree.elements.push(ElementData {
			tag: tag.to_string(),
			..ElementData::default()
		});
		ElementId(tree.elements.len() - 1)
	}

	/// Tag name of `element`.
	pub fn tag(&self, element: &ElementId) -> String {
		self.tree.borrow().elements[element.0].tag.clone()
	}

	/// Every child of `element`, in order.
	pub fn child_elements(&self, element: &ElementId) -> Vec<ElementId> {
		self.tree.borrow().elements[element.0].children.clone()
	}

	/// Parent of `element`, `None` for roots and removed elements.
	pub fn parent(&self, element: &ElementId) -> Option<ElementId> {
		self.tree.borrow().elements[element.0].parent
	}

	/// Whether `element` has a parent.
	pub fn is_attached(&self, element: &ElementId) -> bool {
		self.parent(element).is_some()
	}

	/// Serialize the subtree under `element` as markup.
	pub fn to_markup(&self, element: &ElementId) -> String {
		let mut out = String::new();
		self.write_markup(*element, &mut out);
		out
	}

	fn write_markup(&self, element: ElementId, out: &mut String) {
		let (tag, attributes, children) = {
			let tree = self.tree.borrow();
			let data = &tree.elements[element.0];
			(data.tag.clone(), data.attributes.clone(), data.children.clone())
		};
		out.push('<');
		out.push_str(&tag);
		for (name, value) in &attributes {
			out.push_str(&format!(" {name}=\"{}\"", escape(value)));
		}
		if children.is_empty() {
			out.push_str("/>");
			return;
		}
		out.push('>');
		for child in children {
			self.write_markup(child, out);
		}
		out.push_str(&format!("</{tag}>"));
	}
}

fn escape(value: &str) -> String {
	value
		.replace('&', "&amp;")
		.replace('"', "&quot;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
}

impl Surface for MemorySurface {
	type Element = ElementId;

	fn children(&self, parent: &ElementId, tag: &str, class: &str) -> Vec<ElementId> {
		self.child_elements(parent)
			.into_iter()
			.filter(|child| self.tag(child) == tag && (class.is_empty() || self.has_class(child, class)))
			.collect()
	}

	fn append(&self, parent: &ElementId, tag: &str) -> Result<ElementId, SurfaceError> {
		let child = self.create_root(tag);
		let mut tree = self.tree.borrow_mut();
		tree.elements[child.0].parent = Some(*parent);
		tree.elements[parent.0].children.push(child);
		Ok(child)
	}

	fn remove(&self, element: &ElementId) {
		let mut tree = self.tree.borrow_mut();
		if let Some(parent) = tree.elements[element.0].parent.take() {
			tree.elements[parent.0].children.retain(|c| c != element);
		}
	}

	fn set_attribute(&self, element: &ElementId, name: &str, value: &str) {
		let mut tree = self.tree.borrow_mut();
		let attributes = &mut tree.elements[element.0].attributes;
		match attributes.iter_mut().find(|(n, _)| n == name) {
			Some(slot) => slot.1 = value.to_string(),
			None => attributes.push((name.to_string(), value.to_string())),
		}
	}

	fn attribute(&self, element: &ElementId, name: &str) -> Option<String> {
		self.tree.borrow().elements[element.0]
			.attributes
			.iter()
			.find(|(n, _)| n == name)
			.map(|(_, v)| v.clone())
	}

	fn set_class(&self, element: &ElementId, class: &str, on: bool) {
		let current = self.attribute(element, "class");
		let next = toggle_class(current.as_deref(), class, on);
		self.set_attribute(element, "class", &next);
	}

	fn identity(&self, element: &ElementId) -> String {
		self.attribute(element, "id")
			.unwrap_or_else(|| format!("element-{}", element.0))
	}

	fn extent(&self, element: &ElementId) -> (f64, f64) {
		let mut current = Some(*element);
		while let Some(el) = current {
			if self.tag(&el) == "svg" {
				if let Some(size) = self.attribute(&el, "viewBox").as_deref().and_then(parse_view_box) {
					return size;
				}
				let length = |name: &str| self.attribute(&el, name).as_deref().and_then(parse_length);
				return (length("width").unwrap_or(0.0), length("height").unwrap_or(0.0));
			}
			current = self.parent(&el);
		}
		(0.0, 0.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn children_filter_by_tag_and_class() {
		let (s, root) = MemorySurface::svg(100.0, 50.0);
		let a = s.append(&root, "g").unwrap();
		s.set_attribute(&a, "class", "links");
		let b = s.append(&root, "g").unwrap();
		s.set_attribute(&b, "class", "nodes big");
		s.append(&root, "circle").unwrap();

		assert_eq!(s.children(&root, "g", "nodes"), vec![b]);
		assert_eq!(s.children(&root, "g", ""), vec![a, b]);
		assert!(s.children(&root, "g", "node").is_empty());
	}

	#[test]
	fn remove_detaches() {
		let (s, root) = MemorySurface::svg(1.0, 1.0);
		let child = s.append(&root, "g").unwrap();
		s.remove(&child);
		assert!(!s.is_attached(&child));
		assert!(s.child_elements(&root).is_empty());
		s.remove(&child);
	}

	#[test]
	fn class_toggling_keeps_other_classes() {
		let (s, root) = MemorySurface::svg(1.0, 1.0);
		let el = s.append(&root, "circle").unwrap();
		s.set_attribute(&el, "class", "node");
		s.set_class(&el, "pinned", true);
		s.set_class(&el, "pinned", true);
		assert_eq!(s.attribute(&el, "class").as_deref(), Some("node pinned"));
		s.set_class(&el, "pinned", false);
		assert_eq!(s.attribute(&el, "class").as_deref(), Some("node"));
	}

	#[test]
	fn extent_prefers_view_box() {
		let (s, root) = MemorySurface::svg(640.0, 480.0);
		let g = s.append(&root, "g").unwrap();
		assert_eq!(s.extent(&g), (640.0, 480.0));
		s.set_attribute(&root, "viewBox", "0 0 300,200");
		assert_eq!(s.extent(&g), (300.0, 200.0));
		let orphan = s.create_root("g");
		assert_eq!(s.extent(&orphan), (0.0, 0.0));
	}

	#[test]
	fn identity_uses_id_attribute() {
		let (s, root) = MemorySurface::svg(1.0, 1.0);
		let other = s.create_root("svg");
		assert_ne!(s.identity(&root), s.identity(&other));
		s.set_attribute(&root, "id", "chart");
		assert_eq!(s.identity(&root), "chart");
	}

	#[test]
	fn markup_escapes_attributes() {
		let (s, root) = MemorySurface::svg(2.0, 3.0);
		let g = s.append(&root, "g").unwrap();
		s.set_attribute(&g, "data-label", "a<\"b\">");
		assert_eq!(
			s.to_markup(&root),
			r#"<svg width="2" height="3"><g data-label="a&lt;&quot;b&quot;&gt;"/></svg>"#
		);
	}

	#[test]
	fn lengths_and_view_boxes_parse() {
		assert_eq!(parse_length("640px"), Some(640.0));
		assert_eq!(parse_length("auto"), None);
		assert_eq!(parse_view_box("0 0 10 20"), Some((10.0, 20.0)));
		assert_eq!(parse_view_box("0 0 10"), None);
	}
}
