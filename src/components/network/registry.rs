//! Process-wide registry of live layouts, keyed by rendering target.
//!
//! At most one layout runs per target. Installing a layout for a target that
//! already has one stops the old layout before the new one takes its place.
//! Everything runs on the event-loop thread, so the map is thread-local.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use super::layout::SharedLayout;

thread_local! {
	static LAYOUTS: RefCell<HashMap<String, SharedLayout>> = RefCell::new(HashMap::new());
}

/// Make `layout` the active layout for `id`, stopping and returning any
/// previous one.
pub fn install(id: &str, layout: SharedLayout) -> Option<SharedLayout> {
	let previous = LAYOUTS.with(|m| m.borrow_mut().remove(id));
	if let Some(prev) = &previous {
		if !Rc::ptr_eq(prev, &layout) {
			prev.borrow_mut().stop();
			debug!("registry: replaced layout for `{id}`");
		}
	}
	LAYOUTS.with(|m| m.borrow_mut().insert(id.to_string(), layout));
	previous
}

/// Stop and forget the layout for `id`. Returns whether there was one.
pub fn stop(id: &str) -> bool {
	let previous = LAYOUTS.with(|m| m.borrow_mut().remove(id));
	match previous {
		Some(layout) => {
			layout.borrow_mut().stop();
			debug!("registry: stopped layout for `{id}`");
			true
		}
		None => false,
	}
}

/// Forget `layout` if it is still the active one for `id`.
pub fn release(id: &str, layout: &SharedLayout) -> bool {
	LAYOUTS.with(|m| {
		let mut map = m.borrow_mut();
		match map.get(id) {
			Some(active) if Rc::ptr_eq(active, layout) => map.remove(id).is_some(),
			_ => false,
		}
	})
}

/// The active layout for `id`.
pub fn get(id: &str) -> Option<SharedLayout> {
	LAYOUTS.with(|m| m.borrow().get(id).cloned())
}

/// Number of active layouts.
pub fn len() -> usize {
	LAYOUTS.with(|m| m.borrow().len())
}

/// Whether no layouts are active.
pub fn is_empty() -> bool {
	len() == 0
}

/// Stop and forget every layout.
pub fn clear() {
	let all: Vec<SharedLayout> = LAYOUTS.with(|m| m.borrow_mut().drain().map(|(_, l)| l).collect());
	for layout in all {
		layout.borrow_mut().stop();
	}
}
