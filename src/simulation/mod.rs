//! Staged energy-flow simulation.
//!
//! The engine does not solve the circuit. It walks a fixed chain of stages,
//! one representative instance per stage:
//!
//! ```text
//! generators ──▶ rectifier ──▶ storage ──▶ regulator ──▶ load
//!   (sum)         (−drop)      (charge)    (threshold)   (draw)
//! ```
//!
//! Each pass reads generator voltages, writes derived state back onto the
//! instances and wires, and produces a [`Measurements`] snapshot. A
//! [`Session`] owns the circuit together with the engine and the timers that
//! drive generator pulses, auto-stepping and the render cycle.

mod engine;
mod pulse;
mod scheduler;
mod session;

pub use engine::{
    representative, unmodeled_components, EngineConfig, Measurements, Simulator, StageSelection,
    Stages,
};
pub use pulse::{activate, decay_step, pressure_fraction, PulseConfig, PulsePhase};
pub use scheduler::{check_period, Scheduler, Task, TaskHandle};
pub use session::{Removed, Session, SessionConfig, SessionView};

/// Fraction of the gap to the input closed by storage per pass
pub const CHARGING_RATE: f64 = 0.08;

/// Unit scale used twice in the load discharge step (mA to A, and once more
/// on the capacitance)
pub const DISCHARGE_UNIT_SCALE: f64 = 1000.0;

/// Time step folded into the load discharge step
pub const DISCHARGE_TIME_STEP: f64 = 0.01;

/// Generator voltage multiplier per decay tick
pub const DECAY_FACTOR: f64 = 0.92;

/// Generator voltage below which a pulse ends (V)
pub const IDLE_THRESHOLD: f64 = 0.1;

/// Delay from activation to the first decay tick (ms)
pub const ACTIVATION_HOLD_MS: f64 = 100.0;

/// Period between decay ticks (ms)
pub const DECAY_TICK_MS: f64 = 50.0;

/// Render cycle period (ms)
pub const FRAME_INTERVAL_MS: f64 = 1000.0 / 60.0;

/// Shortest period a repeating timer may have (ms)
pub const MIN_TIMER_PERIOD_MS: f64 = 1.0;
