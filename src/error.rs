//! Error types for the harvester circuit simulator.
//!
//! This module provides a unified error type [`HarvestError`] that covers
//! every rejected request against the circuit graph, the template loader,
//! and the simulation session. All of them are recoverable: the mutation is
//! refused and the graph is left as it was.

use thiserror::Error;

use crate::circuit::ComponentId;

/// Result type alias using [`HarvestError`].
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Unified error type for all harvester operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HarvestError {
    // ============ Catalog Errors ============
    /// Component kind not present in the catalog
    #[error("Unknown component kind '{kind}'")]
    UnknownKind { kind: String },

    // ============ Graph Errors ============
    /// Both ends of a wire are on the same component
    #[error("Cannot connect component {component} to itself")]
    SelfConnection { component: ComponentId },

    /// The unordered endpoint pair is already wired
    #[error("Wire already exists between {a} and {b}")]
    DuplicateWire { a: String, b: String },

    /// A component, connection point, or template index does not exist
    #[error("Missing reference: {reference}")]
    MissingReference { reference: String },

    /// Template name not known
    #[error("Unknown template '{name}'")]
    UnknownTemplate { name: String },

    // ============ Simulation Errors ============
    /// Operation needs a running simulation
    #[error("Simulation is not running")]
    NotRunning,

    /// Activation requested on a component that is not a piezo generator
    #[error("Component {component} is not a piezo generator")]
    NotAGenerator { component: ComponentId },

    /// Invalid simulation parameter
    #[error("Invalid parameter '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // ============ WASM Errors ============
    /// WASM-specific error
    #[cfg(feature = "wasm")]
    #[error("WASM error: {message}")]
    WasmError { message: String },
}

impl HarvestError {
    /// Create a missing reference error
    pub fn missing(reference: impl Into<String>) -> Self {
        Self::MissingReference {
            reference: reference.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create a missing component error
    pub fn missing_component(id: ComponentId) -> Self {
        Self::missing(format!("component {id}"))
    }
}
