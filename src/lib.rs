//! # Harvester Core
//!
//! An interactive simulator for piezoelectric energy-harvesting circuits.
//!
//! This library provides:
//! - A catalog of harvesting components (piezo discs, rectifiers, storage,
//!   regulators, loads) with their connection points
//! - A circuit graph of placed components and polarity-typed wires
//! - Hit testing for the editor canvas
//! - A staged energy-flow engine with piezo pulse decay
//!
//! ## Architecture
//!
//! - [`components`] - Static component catalog
//! - [`circuit`] - Circuit graph, editor interaction, hit testing, templates
//! - [`simulation`] - Propagation engine, pulse state machine, scheduler, session
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! harvester --template basic_harvester --duration-ms 2000 --auto-step-hz 2 --json
//! ```
//!
//! ### Library
//!
//! ```
//! use harvester_core::Session;
//!
//! let mut session = Session::new();
//! let report = session.load_template("basic_harvester").unwrap();
//! session.start_simulation().unwrap();
//! session.activate_generator(report.components[0], 1.0).unwrap();
//! session.advance(500.0);
//! assert!(session.measurements().generator_voltage > 0.0);
//! ```
//!
//! ## Simulation Method
//!
//! No circuit equations are solved. Each pass sums the active generator
//! voltages and walks rectifier, storage, regulator and load in that order,
//! with one representative instance per stage. Storage charges a fixed
//! fraction of the gap to its input per pass and the load drains it by a
//! fixed step, so repeated passes converge.

pub mod circuit;
pub mod components;
pub mod error;
pub mod simulation;

// Re-export main types for convenience
pub use circuit::Circuit;
pub use error::{HarvestError, Result};
pub use simulation::{Session, Simulator};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmHarvester;

/// Canvas grid pitch; component positions snap to multiples of this
pub const GRID_SIZE: f64 = 20.0;

/// Maximum distance from a connection point that still hits it
pub const POINT_HIT_RADIUS: f64 = 12.0;

/// Maximum distance from a wire route that still hits it
pub const WIRE_HIT_DISTANCE: f64 = 8.0;
