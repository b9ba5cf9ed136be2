//! Piezo activation and decay.
//!
//! A press drives a generator to `peak × pressure`. After a short hold the
//! voltage decays geometrically on a fixed tick until it falls below the idle
//! threshold, where it snaps to exactly zero:
//!
//! ```text
//!            activate              hold elapsed            v < threshold
//!   Idle ───────────────▶ Activated ───────────▶ Decaying ───────────────▶ Idle
//!    ▲                        ▲                     │ ×decay per tick
//!    │                        └──── re-activate ────┘
//! ```

use serde::Serialize;

use crate::circuit::ComponentInstance;
use crate::components::ElectricalParams;
use crate::error::{HarvestError, Result};

use super::scheduler::check_period;
use super::{ACTIVATION_HOLD_MS, DECAY_FACTOR, DECAY_TICK_MS, IDLE_THRESHOLD};

/// Where a generator is in its pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PulsePhase {
    #[default]
    Idle,
    Activated,
    Decaying,
}

/// Timing and shape of a generator pulse.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseConfig {
    /// Voltage multiplier per decay tick.
    pub decay_factor: f64,
    /// Below this voltage the generator snaps to zero.
    pub idle_threshold: f64,
    /// Delay between activation and the first decay tick (ms).
    pub hold_ms: f64,
    /// Period between decay ticks (ms).
    pub tick_ms: f64,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            decay_factor: DECAY_FACTOR,
            idle_threshold: IDLE_THRESHOLD,
            hold_ms: ACTIVATION_HOLD_MS,
            tick_ms: DECAY_TICK_MS,
        }
    }
}

impl PulseConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-tick decay multiplier, in [0, 1).
    pub fn with_decay_factor(mut self, decay_factor: f64) -> Self {
        self.decay_factor = decay_factor;
        self
    }

    /// Set the decay tick period.
    pub fn with_tick_ms(mut self, tick_ms: f64) -> Self {
        self.tick_ms = tick_ms;
        self
    }

    /// Set the hold before the first decay tick.
    pub fn with_hold_ms(mut self, hold_ms: f64) -> Self {
        self.hold_ms = hold_ms;
        self
    }

    /// Check that every pulse ends and every tick moves the clock.
    pub fn validate(&self) -> Result<()> {
        if !(self.decay_factor >= 0.0 && self.decay_factor < 1.0) {
            return Err(HarvestError::invalid_parameter(
                "decay_factor",
                format!("must be in [0, 1), got {}", self.decay_factor),
            ));
        }
        if !(self.idle_threshold.is_finite() && self.idle_threshold > 0.0) {
            return Err(HarvestError::invalid_parameter(
                "idle_threshold",
                format!("must be positive, got {}", self.idle_threshold),
            ));
        }
        if !(self.hold_ms.is_finite() && self.hold_ms >= 0.0) {
            return Err(HarvestError::invalid_parameter(
                "hold_ms",
                format!("must be non-negative, got {}", self.hold_ms),
            ));
        }
        check_period(self.tick_ms)
    }
}

/// Check a pressure fraction and clamp it to `[0, 1]`.
pub fn pressure_fraction(pressure: f64) -> Result<f64> {
    if !pressure.is_finite() {
        return Err(HarvestError::invalid_parameter(
            "pressure",
            format!("must be a finite fraction, got {pressure}"),
        ));
    }
    Ok(pressure.clamp(0.0, 1.0))
}

/// Drive a generator to `peak × pressure`. Restarts any pulse in progress.
///
/// Returns the new voltage.
pub fn activate(generator: &mut ComponentInstance, pressure: f64, now_ms: f64) -> Result<f64> {
    let ElectricalParams::Generator { voltage_peak, .. } = generator.params else {
        return Err(HarvestError::NotAGenerator {
            component: generator.id,
        });
    };
    let pressure = pressure_fraction(pressure)?;

    let state = &mut generator.state;
    state.voltage = voltage_peak * pressure;
    state.active = true;
    state.activated_at = Some(now_ms);
    Ok(state.voltage)
}

/// Apply one decay tick and report the resulting phase.
pub fn decay_step(generator: &mut ComponentInstance, config: &PulseConfig) -> PulsePhase {
    let state = &mut generator.state;
    state.voltage *= config.decay_factor;
    if state.voltage < config.idle_threshold {
        state.voltage = 0.0;
        state.active = false;
        state.activated_at = None;
        PulsePhase::Idle
    } else {
        PulsePhase::Decaying
    }
}
