//! WASM bindings for Harvester Core.
//!
//! This module exposes a [`Session`] to the browser canvas. The page forwards
//! pointer events, drives the clock from `requestAnimationFrame`, and redraws
//! from the JSON view.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmHarvester } from 'harvester_core';
//!
//! await init();
//!
//! const sim = new WasmHarvester();
//! sim.load_template('basic_harvester');
//! sim.start_simulation();
//! sim.start_auto_step(2);
//!
//! let last = performance.now();
//! function frame(now) {
//!   sim.advance(now - last);
//!   last = now;
//!   draw(JSON.parse(sim.view_json()));
//!   requestAnimationFrame(frame);
//! }
//! requestAnimationFrame(frame);
//! ```

use wasm_bindgen::prelude::*;

use crate::circuit::{ComponentId, WireId};
use crate::error::HarvestError;
use crate::simulation::Session;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn js_error(e: HarvestError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Browser-facing harvester session.
///
/// Components and wires are addressed by their numeric ids.
#[wasm_bindgen]
pub struct WasmHarvester {
    session: Session,
}

impl Default for WasmHarvester {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl WasmHarvester {
    /// Create an empty session.
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmHarvester {
        WasmHarvester {
            session: Session::new(),
        }
    }

    /// Place a component by catalog kind; returns its id.
    #[wasm_bindgen]
    pub fn add_component(&mut self, kind: &str, x: f64, y: f64) -> Result<usize, JsValue> {
        self.session
            .add_component(kind, x, y)
            .map(|id| id.0)
            .map_err(js_error)
    }

    #[wasm_bindgen]
    pub fn move_component(&mut self, id: usize, x: f64, y: f64) -> Result<(), JsValue> {
        self.session
            .move_component(ComponentId(id), x, y)
            .map_err(js_error)
    }

    #[wasm_bindgen]
    pub fn remove_component(&mut self, id: usize) -> Result<(), JsValue> {
        self.session
            .remove_component(ComponentId(id))
            .map_err(js_error)
    }

    /// Wire two terminals; returns the wire id.
    #[wasm_bindgen]
    pub fn connect(
        &mut self,
        a: usize,
        a_point: &str,
        b: usize,
        b_point: &str,
    ) -> Result<usize, JsValue> {
        let circuit = self.session.circuit();
        let from = circuit.point_ref(ComponentId(a), a_point).map_err(js_error)?;
        let to = circuit.point_ref(ComponentId(b), b_point).map_err(js_error)?;
        self.session
            .connect(from, to)
            .map(|id| id.0)
            .map_err(js_error)
    }

    #[wasm_bindgen]
    pub fn disconnect(&mut self, wire: usize) {
        self.session.disconnect(WireId(wire));
    }

    #[wasm_bindgen]
    pub fn clear(&mut self) {
        self.session.clear();
    }

    #[wasm_bindgen]
    pub fn load_template(&mut self, name: &str) -> Result<(), JsValue> {
        self.session.load_template(name).map(|_| ()).map_err(js_error)
    }

    // ============ Pointer input ============

    /// Handle a left click. Returns the id of a wire created by it, if any.
    #[wasm_bindgen]
    pub fn click(&mut self, x: f64, y: f64) -> Result<Option<usize>, JsValue> {
        self.session
            .click(x, y)
            .map(|wire| wire.map(|id| id.0))
            .map_err(js_error)
    }

    /// Handle a right click. Returns true if a wire or component was removed.
    #[wasm_bindgen]
    pub fn remove_at(&mut self, x: f64, y: f64) -> Result<bool, JsValue> {
        self.session
            .remove_at(x, y)
            .map(|removed| removed.is_some())
            .map_err(js_error)
    }

    /// Select a component by id, or clear the selection with `undefined`.
    #[wasm_bindgen]
    pub fn select(&mut self, id: Option<usize>) -> Result<(), JsValue> {
        self.session
            .circuit_mut()
            .select(id.map(ComponentId))
            .map_err(js_error)
    }

    #[wasm_bindgen]
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Result<(), JsValue> {
        let circuit = self.session.circuit_mut();
        circuit.hover(x, y);
        circuit.update_preview(x, y);
        if circuit.interaction().drag.is_some() {
            circuit.drag_to(x, y).map_err(js_error)?;
        }
        Ok(())
    }

    /// Start dragging the component under the pointer; returns its id.
    #[wasm_bindgen]
    pub fn pointer_down(&mut self, x: f64, y: f64) -> Option<usize> {
        self.session.circuit_mut().begin_drag(x, y).map(|id| id.0)
    }

    #[wasm_bindgen]
    pub fn pointer_up(&mut self) {
        self.session.circuit_mut().end_drag();
    }

    #[wasm_bindgen]
    pub fn set_wire_mode(&mut self, on: bool) {
        self.session.circuit_mut().set_wire_mode(on);
    }

    // ============ Simulation ============

    #[wasm_bindgen]
    pub fn start_simulation(&mut self) -> Result<(), JsValue> {
        self.session.start_simulation().map_err(js_error)
    }

    #[wasm_bindgen]
    pub fn stop_simulation(&mut self) {
        self.session.stop_simulation();
    }

    /// Press one generator; returns its new voltage.
    #[wasm_bindgen]
    pub fn activate_generator(&mut self, id: usize, pressure: f64) -> Result<f64, JsValue> {
        self.session
            .activate_generator(ComponentId(id), pressure)
            .map_err(js_error)
    }

    /// Press every generator; returns how many were pressed.
    #[wasm_bindgen]
    pub fn manual_step(&mut self) -> Result<usize, JsValue> {
        self.session.manual_step().map_err(js_error)
    }

    #[wasm_bindgen]
    pub fn start_auto_step(&mut self, frequency_hz: f64) -> Result<(), JsValue> {
        self.session.start_auto_step(frequency_hz).map_err(js_error)
    }

    #[wasm_bindgen]
    pub fn stop_auto_step(&mut self) {
        self.session.stop_auto_step();
    }

    #[wasm_bindgen]
    pub fn set_pressure(&mut self, pressure: f64) -> Result<(), JsValue> {
        self.session.set_pressure(pressure).map_err(js_error)
    }

    /// Advance the clock; returns the number of tasks that ran.
    #[wasm_bindgen]
    pub fn advance(&mut self, elapsed_ms: f64) -> usize {
        self.session.advance(elapsed_ms)
    }

    #[wasm_bindgen(getter)]
    pub fn running(&self) -> bool {
        self.session.is_running()
    }

    /// Full renderer state as a JSON string.
    #[wasm_bindgen]
    pub fn view_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.view()).map_err(|e| {
            js_error(HarvestError::WasmError {
                message: e.to_string(),
            })
        })
    }

    /// The component catalog as a JSON string.
    #[wasm_bindgen]
    pub fn catalog_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(crate::components::catalog()).map_err(|e| {
            js_error(HarvestError::WasmError {
                message: e.to_string(),
            })
        })
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
