//! Circuit graph representation and queries.
//!
//! This module holds the mutable state the user edits: placed components,
//! the wires between their terminals, and the editor state (selection,
//! wire drafting, hover, drag) the renderer draws on top.

mod graph;
mod interaction;
mod query;
mod template;
mod types;

pub use graph::{Circuit, ComponentInstance, ConnectionPoint, ElectricalState, Wire, WireEnd};
pub use interaction::{Drag, Interaction, PreviewLine};
pub use query::{distance_to_segment, route};
pub use template::{template, templates, Placement, Template, TemplateReport, TemplateWire};
pub use types::*;
