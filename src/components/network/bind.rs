//! Data binding: keep a surface's elements in step with a data array.
//!
//! A [`Layer`] is the set of `tag.class` children of one parent. Binding it to
//! `len` data items reconciles the children so element `i` stands for item
//! `i`: existing elements are reused in order (keeping their identity and any
//! listeners), surplus ones are removed and missing ones appended.

use super::surface::Surface;
use crate::error::SurfaceError;

/// Attribute recording which data item an element is bound to.
pub const DATA_INDEX: &str = "data-index";

/// Elements bound one-to-one to a data array.
#[derive(Clone, Debug)]
pub struct Layer<E> {
	tag: String,
	class: String,
	elements: Vec<E>,
}

impl<E: Clone + PartialEq> Layer<E> {
	/// Element tag.
	pub fn tag(&self) -> &str {
		&self.tag
	}

	/// Element class.
	pub fn class(&self) -> &str {
		&self.class
	}

	/// Bound elements, in data order.
	pub fn elements(&self) -> &[E] {
		&self.elements
	}

	/// Element bound to data item `index`.
	pub fn get(&self, index: usize) -> Option<&E> {
		self.elements.get(index)
	}

	/// Data index `element` is bound to.
	pub fn position(&self, element: &E) -> Option<usize> {
		self.elements.iter().position(|e| e == element)
	}

	/// Number of bound elements.
	pub fn len(&self) -> usize {
		self.elements.len()
	}

	/// Whether nothing is bound.
	pub fn is_empty(&self) -> bool {
		self.elements.is_empty()
	}

	/// Set an attribute on every element from its data index.
	pub fn attr<S>(&self, surface: &S, name: &str, mut value: impl FnMut(usize) -> String)
	where
		S: Surface<Element = E>,
	{
		for (i, element) in self.elements.iter().enumerate() {
			surface.set_attribute(element, name, &value(i));
		}
	}

	/// Toggle a class on every element.
	pub fn classed<S>(&self, surface: &S, class: &str, on: bool)
	where
		S: Surface<Element = E>,
	{
		for element in &self.elements {
			surface.set_class(element, class, on);
		}
	}
}

/// Reconcile the `tag.class` children of `parent` with `len` data items.
pub fn bind<S: Surface>(
	surface: &S,
	parent: &S::Element,
	tag: &str,
	class: &str,
	len: usize,
) -> Result<Layer<S::Element>, SurfaceError> {
	let mut elements = surface.children(parent, tag, class);
	let keep = len.min(elements.len());
	for surplus in elements.drain(keep..) {
		surface.remove(&surplus);
	}
	while elements.len() < len {
		elements.push(surface.append(parent, tag)?);
	}
	for (i, element) in elements.iter().enumerate() {
		surface.set_attribute(element, "class", class);
		surface.set_attribute(element, DATA_INDEX, &i.to_string());
	}
	Ok(Layer {
		tag: tag.to_string(),
		class: class.to_string(),
		elements,
	})
}

/// Bind a single `tag.class` child of `parent`, creating it when missing.
pub fn bind_one<S: Surface>(
	surface: &S,
	parent: &S::Element,
	tag: &str,
	class: &str,
) -> Result<S::Element, SurfaceError> {
	let layer = bind(surface, parent, tag, class, 1)?;
	Ok(layer.elements[0].clone())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::network::surface::MemorySurface;

	#[test]
	fn appends_missing_elements() {
		let (s, root) = MemorySurface::svg(10.0, 10.0);
		let layer = bind(&s, &root, "circle", "node", 3).unwrap();
		assert_eq!(layer.len(), 3);
		assert_eq!(s.children(&root, "circle", "node"), layer.elements());
		assert_eq!(s.attribute(&layer.elements()[2], DATA_INDEX).as_deref(), Some("2"));
	}

	#[test]
	fn reuses_in_order_and_removes_surplus() {
		let (s, root) = MemorySurface::svg(10.0, 10.0);
		let first = bind(&s, &root, "circle", "node", 4).unwrap();
		s.set_class(&first.elements()[0], "pinned", true);

		let second = bind(&s, &root, "circle", "node", 2).unwrap();
		assert_eq!(second.elements(), &first.elements()[..2]);
		assert!(!s.is_attached(&first.elements()[3]));
		assert_eq!(s.children(&root, "circle", "node").len(), 2);
		// class is reset on rebind
		assert!(!s.has_class(&second.elements()[0], "pinned"));
	}

	#[test]
	fn leaves_other_layers_alone() {
		let (s, root) = MemorySurface::svg(10.0, 10.0);
		bind(&s, &root, "path", "link", 2).unwrap();
		bind(&s, &root, "circle", "node", 1).unwrap();
		bind(&s, &root, "circle", "node", 0).unwrap();
		assert_eq!(s.children(&root, "path", "link").len(), 2);
		assert!(s.children(&root, "circle", "").is_empty());
	}

	#[test]
	fn bind_one_is_stable() {
		let (s, root) = MemorySurface::svg(10.0, 10.0);
		let g = bind_one(&s, &root, "g", "nodes").unwrap();
		assert_eq!(bind_one(&s, &root, "g", "nodes").unwrap(), g);
		assert_eq!(s.child_elements(&root), vec![g]);
	}

	#[test]
	fn attr_and_classed_apply_per_item() {
		let (s, root) = MemorySurface::svg(10.0, 10.0);
		let layer = bind(&s, &root, "circle", "node", 2).unwrap();
		layer.attr(&s, "r", |i| (i + 4).to_string());
		layer.classed(&s, "pinned", true);
		assert_eq!(s.attribute(&layer.elements()[1], "r").as_deref(), Some("5"));
		assert!(s.has_class(&layer.elements()[0], "pinned"));
		assert_eq!(layer.position(&layer.elements()[1]), Some(1));
	}
}
