//! The session the renderer talks to.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::circuit::{
    template, Circuit, ComponentId, ComponentInstance, Interaction, PointRef, TemplateReport, Wire,
    WireId,
};
use crate::components::StageRole;
use crate::error::{HarvestError, Result};

use super::engine::{unmodeled_components, EngineConfig, Measurements, Simulator};
use super::pulse::{self, PulseConfig, PulsePhase};
use super::scheduler::{check_period, Scheduler, Task, TaskHandle};
use super::{FRAME_INTERVAL_MS, MIN_TIMER_PERIOD_MS};

/// Configuration for a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Render cycle period (ms).
    pub frame_interval_ms: f64,
    /// Pressure applied by manual and automatic steps.
    pub pressure: f64,
    pub engine: EngineConfig,
    pub pulse: PulseConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: FRAME_INTERVAL_MS,
            pressure: 1.0,
            engine: EngineConfig::default(),
            pulse: PulseConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = pressure;
        self
    }

    pub fn with_frame_interval_ms(mut self, frame_interval_ms: f64) -> Self {
        self.frame_interval_ms = frame_interval_ms;
        self
    }

    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_pulse(mut self, pulse: PulseConfig) -> Self {
        self.pulse = pulse;
        self
    }

    /// Check the frame interval, the pressure and both nested configs.
    pub fn validate(&self) -> Result<()> {
        check_period(self.frame_interval_ms)?;
        pulse::pressure_fraction(self.pressure)?;
        self.engine.validate()?;
        self.pulse.validate()
    }
}

/// What [`Session::remove_at`] took off the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "removed", content = "id", rename_all = "snake_case")]
pub enum Removed {
    Wire(WireId),
    Component(ComponentId),
}

/// A generator's pulse and its pending decay timer.
#[derive(Debug, Clone, Copy)]
struct Pulse {
    phase: PulsePhase,
    timer: TaskHandle,
}

/// Everything the renderer needs to draw one frame.
#[derive(Debug, Serialize)]
pub struct SessionView<'a> {
    pub running: bool,
    pub auto_stepping: bool,
    pub now_ms: f64,
    pub frames: u64,
    pub components: &'a [ComponentInstance],
    pub wires: &'a [Wire],
    pub interaction: &'a Interaction,
    pub measurements: Measurements,
    /// Same-role instances the engine does not model
    pub unmodeled: Vec<ComponentId>,
}

/// Circuit, engine and timers for one user.
///
/// Every mutating call takes `&mut self` and runs its simulation pass to
/// completion before returning, so a pass never observes a half-applied
/// edit.
#[derive(Debug)]
pub struct Session {
    circuit: Circuit,
    simulator: Simulator,
    scheduler: Scheduler,
    config: SessionConfig,
    running: bool,
    render_timer: Option<TaskHandle>,
    auto_step_timer: Option<TaskHandle>,
    pulses: BTreeMap<ComponentId, Pulse>,
    frames: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create an empty session with default configuration.
    pub fn new() -> Self {
        Self::build(SessionConfig::default())
    }

    /// Create an empty session after checking `config`.
    pub fn with_config(mut config: SessionConfig) -> Result<Self> {
        config.validate()?;
        config.pressure = pulse::pressure_fraction(config.pressure)?;
        Ok(Self::build(config))
    }

    fn build(config: SessionConfig) -> Self {
        Self {
            circuit: Circuit::new(),
            simulator: Simulator::with_config(config.engine.clone()),
            scheduler: Scheduler::new(),
            config,
            running: false,
            render_timer: None,
            auto_step_timer: None,
            pulses: BTreeMap::new(),
            frames: 0,
        }
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Direct access for editor-only state (selection, hover, wire drafting,
    /// drag). Call [`resimulate`](Self::resimulate) after topology edits made
    /// through this handle.
    pub fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn measurements(&self) -> Measurements {
        self.simulator.measurements()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_auto_stepping(&self) -> bool {
        self.auto_step_timer.is_some()
    }

    pub fn now_ms(&self) -> f64 {
        self.scheduler.now()
    }

    /// Render frames elapsed while running.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Pulse phase of a generator. Unknown ids and idle generators are `Idle`.
    pub fn pulse_phase(&self, id: ComponentId) -> PulsePhase {
        self.pulses.get(&id).map(|p| p.phase).unwrap_or_default()
    }

    pub fn view(&self) -> SessionView<'_> {
        SessionView {
            running: self.running,
            auto_stepping: self.is_auto_stepping(),
            now_ms: self.now_ms(),
            frames: self.frames,
            components: self.circuit.components(),
            wires: self.circuit.wires(),
            interaction: self.circuit.interaction(),
            measurements: self.measurements(),
            unmodeled: unmodeled_components(&self.circuit, self.config.engine.stage_selection),
        }
    }

    /// Run one simulation pass over the current circuit.
    pub fn resimulate(&mut self) -> Measurements {
        let now = self.scheduler.now();
        self.simulator.simulate(&mut self.circuit, now)
    }

    // ============ Graph edits ============

    pub fn add_component(&mut self, kind: &str, x: f64, y: f64) -> Result<ComponentId> {
        let id = self.circuit.add_component(kind, x, y)?;
        self.resimulate();
        Ok(id)
    }

    pub fn move_component(&mut self, id: ComponentId, x: f64, y: f64) -> Result<()> {
        self.circuit.move_component(id, x, y)?;
        self.resimulate();
        Ok(())
    }

    pub fn remove_component(&mut self, id: ComponentId) -> Result<()> {
        self.circuit.remove_component(id)?;
        if let Some(pulse) = self.pulses.remove(&id) {
            self.scheduler.cancel(pulse.timer);
        }
        self.resimulate();
        Ok(())
    }

    pub fn connect(&mut self, a: PointRef, b: PointRef) -> Result<WireId> {
        let id = self.circuit.connect(a, b)?;
        self.resimulate();
        Ok(id)
    }

    pub fn disconnect(&mut self, id: WireId) {
        self.circuit.disconnect(id);
        self.resimulate();
    }

    /// Stop the simulation and empty the circuit.
    pub fn clear(&mut self) {
        self.stop_simulation();
        self.circuit.clear();
    }

    /// Replace the circuit with a built-in template.
    ///
    /// An unknown name leaves the session untouched.
    pub fn load_template(&mut self, name: &str) -> Result<TemplateReport> {
        let template = template(name)?;
        self.clear();
        let report = self.circuit.apply_template(template);
        self.resimulate();
        Ok(report)
    }

    // ============ Canvas input ============

    /// Handle a left click on the canvas.
    ///
    /// In wire mode the click drafts or completes a wire. Otherwise it
    /// selects the component under the cursor (or clears the selection),
    /// and while running a click on a piezo presses it at the session's
    /// pressure. Returns the wire created by the click, if any.
    pub fn click(&mut self, x: f64, y: f64) -> Result<Option<WireId>> {
        if self.circuit.interaction().wire_mode {
            let wire = self.circuit.click_canvas(x, y)?;
            if wire.is_some() {
                self.resimulate();
            }
            return Ok(wire);
        }

        let hit = self.circuit.component_at(x, y).map(|c| (c.id, c.role()));
        self.circuit.select(hit.map(|(id, _)| id))?;
        if let Some((id, Some(StageRole::Generator))) = hit {
            if self.running {
                self.activate_generator(id, self.config.pressure)?;
            }
        }
        Ok(None)
    }

    /// Handle a right click: remove the wire under the cursor, or failing
    /// that the component under it.
    pub fn remove_at(&mut self, x: f64, y: f64) -> Result<Option<Removed>> {
        if let Some(wire) = self.circuit.wire_at(x, y).map(|w| w.id) {
            self.disconnect(wire);
            return Ok(Some(Removed::Wire(wire)));
        }
        match self.circuit.component_at(x, y).map(|c| c.id) {
            Some(id) => {
                self.remove_component(id)?;
                Ok(Some(Removed::Component(id)))
            }
            None => Ok(None),
        }
    }

    // ============ Simulation control ============

    /// Start the render cycle. Does nothing if already running.
    pub fn start_simulation(&mut self) -> Result<()> {
        if self.running {
            return Ok(());
        }
        self.render_timer = Some(
            self.scheduler
                .schedule_every(Task::RenderFrame, self.config.frame_interval_ms)?,
        );
        self.running = true;
        tracing::info!("Simulation started");
        Ok(())
    }

    /// Cancel every timer and return the circuit to its powered-off state.
    pub fn stop_simulation(&mut self) {
        self.scheduler.cancel_all();
        self.render_timer = None;
        self.auto_step_timer = None;
        self.pulses.clear();

        for component in self.circuit.components_mut() {
            component.state.reset();
        }
        for wire in self.circuit.wires_mut() {
            wire.active = false;
        }
        self.simulator.reset();

        if self.running {
            tracing::info!("Simulation stopped");
        }
        self.running = false;
    }

    /// Press a generator. Restarts its pulse if one is in progress.
    pub fn activate_generator(&mut self, id: ComponentId, pressure: f64) -> Result<f64> {
        if !self.running {
            return Err(HarvestError::NotRunning);
        }
        let now = self.scheduler.now();
        let component = self
            .circuit
            .component_mut(id)
            .ok_or_else(|| HarvestError::missing_component(id))?;
        let voltage = pulse::activate(component, pressure, now)?;

        if let Some(previous) = self.pulses.remove(&id) {
            self.scheduler.cancel(previous.timer);
        }
        let timer = self
            .scheduler
            .schedule_once(Task::Decay(id), self.config.pulse.hold_ms);
        self.pulses.insert(
            id,
            Pulse {
                phase: PulsePhase::Activated,
                timer,
            },
        );

        self.resimulate();
        tracing::debug!("Generator {} activated at {:.1}V", id, voltage);
        Ok(voltage)
    }

    /// Press every generator at the configured pressure.
    ///
    /// Returns how many generators were pressed.
    pub fn manual_step(&mut self) -> Result<usize> {
        if !self.running {
            return Err(HarvestError::NotRunning);
        }
        let generators: Vec<ComponentId> = self
            .circuit
            .components()
            .iter()
            .filter(|c| c.role() == Some(StageRole::Generator))
            .map(|c| c.id)
            .collect();
        if generators.is_empty() {
            tracing::warn!("Step requested but the circuit has no piezo generators");
        }

        for id in &generators {
            self.activate_generator(*id, self.config.pressure)?;
        }
        Ok(generators.len())
    }

    /// Press every generator `frequency_hz` times per second.
    pub fn start_auto_step(&mut self, frequency_hz: f64) -> Result<()> {
        if !self.running {
            return Err(HarvestError::NotRunning);
        }
        let period_ms = 1000.0 / frequency_hz;
        if !(frequency_hz > 0.0) || check_period(period_ms).is_err() {
            return Err(HarvestError::invalid_parameter(
                "frequency",
                format!(
                    "must be above 0 and at most {}Hz, got {frequency_hz}",
                    1000.0 / MIN_TIMER_PERIOD_MS
                ),
            ));
        }

        self.stop_auto_step();
        self.auto_step_timer = Some(self.scheduler.schedule_every(Task::AutoStep, period_ms)?);
        tracing::info!("Auto-stepping at {}Hz", frequency_hz);
        Ok(())
    }

    pub fn stop_auto_step(&mut self) {
        if let Some(timer) = self.auto_step_timer.take() {
            self.scheduler.cancel(timer);
        }
    }

    /// Set the pressure used by manual and automatic steps.
    pub fn set_pressure(&mut self, pressure: f64) -> Result<()> {
        self.config.pressure = pulse::pressure_fraction(pressure)?;
        Ok(())
    }

    /// Advance the clock by `elapsed_ms`, running every task that comes due.
    ///
    /// Returns the number of tasks that ran. A non-finite step is ignored.
    pub fn advance(&mut self, elapsed_ms: f64) -> usize {
        if !elapsed_ms.is_finite() {
            tracing::warn!("Ignoring clock step of {}ms", elapsed_ms);
            return 0;
        }
        let until = self.scheduler.now() + elapsed_ms.max(0.0);
        let mut ran = 0;
        while let Some((_, task)) = self.scheduler.next_due(until) {
            self.run(task);
            ran += 1;
        }
        self.scheduler.settle(until);
        ran
    }

    fn run(&mut self, task: Task) {
        match task {
            Task::RenderFrame => self.frames += 1,
            Task::AutoStep => {
                if let Err(e) = self.manual_step() {
                    tracing::warn!("Auto-step failed: {}", e);
                }
            }
            Task::Decay(id) => self.decay(id),
        }
    }

    fn decay(&mut self, id: ComponentId) {
        let Some(component) = self.circuit.component_mut(id) else {
            self.pulses.remove(&id);
            return;
        };

        match pulse::decay_step(component, &self.config.pulse) {
            PulsePhase::Idle => {
                self.pulses.remove(&id);
            }
            phase => {
                let timer = self
                    .scheduler
                    .schedule_once(Task::Decay(id), self.config.pulse.tick_ms);
                self.pulses.insert(id, Pulse { phase, timer });
            }
        }
        self.resimulate();
    }
}
