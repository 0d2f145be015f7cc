//! Error types for graph construction, layout, interaction and rendering.
//!
//! Each concern has its own enum; [`NetworkError`] composes them for the
//! `network` entry point. None of these are retried or swallowed: a
//! misconfigured spec or an unresolvable link is a caller bug.

use serde_json::Value;
use thiserror::Error;

/// Failure while projecting rows into a node-link graph.
#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
	/// A field-read value spec hit a missing or non-numeric field.
	#[error("row {row}: value field `{field}` is not numeric (found {found})")]
	NotNumeric {
		/// Name of the field that was read.
		field: String,
		/// Zero-based position of the offending row.
		row: usize,
		/// The value actually present (`null` when missing).
		found: Value,
	},
}

/// Failure while building a layout for a graph.
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
	/// A link endpoint refers to a node that does not exist.
	#[error("node not found: {0}")]
	NodeNotFound(String),
}

/// Failure while applying a pointer or brush event.
#[derive(Debug, Error, PartialEq)]
pub enum InteractionError {
	/// The event names a node index outside the node arena.
	#[error("unknown node index {index} (graph has {len} nodes)")]
	UnknownNode {
		/// Index carried by the event.
		index: usize,
		/// Number of nodes in the graph.
		len: usize,
	},
}

/// Failure reported by a drawing surface.
#[derive(Debug, Error, PartialEq)]
pub enum SurfaceError {
	/// The surface could not create an element.
	#[error("cannot create <{tag}> element: {reason}")]
	Create {
		/// Tag that was requested.
		tag: String,
		/// Host-provided reason.
		reason: String,
	},
}

/// Any failure surfaced by [`crate::network`].
#[derive(Debug, Error, PartialEq)]
pub enum NetworkError {
	/// See [`AggregateError`].
	#[error(transparent)]
	Aggregate(#[from] AggregateError),
	/// See [`LayoutError`].
	#[error(transparent)]
	Layout(#[from] LayoutError),
	/// See [`InteractionError`].
	#[error(transparent)]
	Interaction(#[from] InteractionError),
	/// See [`SurfaceError`].
	#[error(transparent)]
	Surface(#[from] SurfaceError),
}
