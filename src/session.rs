//! Session: all live state of one running installation
//!
//! Owns the field, the emission points, camera and rotation, the timer queue
//! and the choreographers that act on them. Everything happens inside
//! `frame` and `handle` through `&mut self`, so a timer task can never run
//! while another one is still mutating state.
//!
//! Per frame:
//! 1. advance the timer queue and dispatch due tasks one at a time
//! 2. tick the speed transition
//! 3. advance rotation
//! 4. run the fixed-step physics

use std::sync::mpsc::Receiver;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::anim::ParamAnimator;
use crate::choreo::{
    CamOutcome, CameraChoreographer, CameraMode, CameraPose, EmitterChange, EmitterChoreographer,
    Fired, PlaneMapping, Scheduler, Sequencer, Task, TimerId, ViewExclusion,
};
use crate::config::Config;
use crate::consts::MAX_FRAME_DT;
use crate::error::WaveError;
use crate::input::Command;
use crate::params::{ParamChange, ParamRegistry};
use crate::renderer::DisplaceParams;
use crate::settings::Settings;
use crate::sim::{EmissionPoint, FieldCell, FixedStepClock, PingPong, Rotation, WaveParams};

/// Salt separating the scheduler's interval stream from the choreography rng
const SCHEDULER_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Snapshot handed to the renderer once per frame
#[derive(Debug, Clone)]
pub struct FrameView<'a> {
    /// Readable field buffer, row-major, `resolution²` cells
    pub field: &'a [FieldCell],
    pub resolution: usize,
    pub emitters: &'a [EmissionPoint],
    pub camera: CameraPose,
    pub camera_mode: CameraMode,
    /// Scene rotation in radians
    pub rotation: f32,
    pub wave_speed: f32,
    pub damping: f32,
    /// Simulated seconds since the last reset
    pub sim_time: f64,
    pub steps: u64,
    pub paused: bool,
    pub sequence_running: bool,
    pub displace: DisplaceParams,
    /// Visible u-range of the reveal sweep
    pub reveal: (f32, f32),
}

pub struct Session {
    config: Config,
    field: PingPong,
    clock: FixedStepClock,
    wave: WaveParams,
    emitters: Vec<EmissionPoint>,
    mapping: PlaneMapping,
    rotation: Rotation,
    camera: CameraChoreographer,
    emitter_choreo: EmitterChoreographer,
    sequencer: Sequencer,
    scheduler: Scheduler<Task>,
    speed: ParamAnimator,
    params: ParamRegistry,
    displace: DisplaceParams,
    settings: Settings,
    rng: Pcg32,
    sim_time: f64,
    elapsed: f64,
    paused: bool,
}

impl Session {
    /// Build an idle session: field allocated, sequence not running.
    /// Persisted choices are applied afterwards with `apply_settings`.
    pub fn new(config: Config, seed: u64) -> Result<Self, WaveError> {
        config.validate()?;
        let field = PingPong::new(config.resolution)?;

        let settings = Settings {
            sequence_running: false,
            ..Settings::default()
        };
        let mut wave = config.wave;
        wave.set_wave_speed(settings.wave_speed());
        let speed = ParamAnimator::new(wave.wave_speed().unwrap_or_default());

        let mut params = ParamRegistry::new();
        params.register("damping", 0.9, 1.0, wave.damping().unwrap_or(1.0));
        params.register("point_effect", 0.0, 10.0, wave.point_effect);
        params.register("point_radius", 0.0, 32.0, wave.point_radius);
        params.register("border", 0.0, 0.5, wave.border);
        params.register("border_bias", 0.01, 0.99, wave.border_bias);
        params.register("displace_height", 0.0, 3.0, config.displace.height_scale);
        params.register("displace_gain", 0.01, 0.5, config.displace.gain);
        params.register("wave_smoothing", 0.0, 1.0, config.displace.smoothing);

        log::info!(
            "session: {0}x{0} field, {1} emitters, seed {seed}",
            config.resolution,
            config.emitters.count
        );

        Ok(Self {
            clock: FixedStepClock::new(config.step, config.remainder),
            emitters: config.emitters.initial_points(),
            mapping: PlaneMapping {
                extent: config.plane_extent.into(),
                rotation: 0.0,
            },
            rotation: Rotation::default(),
            camera: CameraChoreographer::new(config.camera.clone()),
            emitter_choreo: EmitterChoreographer::new(config.emitters.clone()),
            sequencer: Sequencer::new(config.sequencer.clone()),
            scheduler: Scheduler::new(seed ^ SCHEDULER_SEED_SALT),
            displace: config.displace,
            rng: Pcg32::seed_from_u64(seed),
            sim_time: 0.0,
            elapsed: 0.0,
            paused: false,
            field,
            wave,
            speed,
            params,
            settings,
            config,
        })
    }

    // === Accessors ===

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn wave_params(&self) -> &WaveParams {
        &self.wave
    }

    pub fn emitters(&self) -> &[EmissionPoint] {
        &self.emitters
    }

    pub fn camera(&self) -> &CameraChoreographer {
        &self.camera
    }

    pub fn rotation(&self) -> &Rotation {
        &self.rotation
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn sequence_running(&self) -> bool {
        self.sequencer.is_running()
    }

    /// A burst of emitter placements is still in flight
    pub fn is_bursting(&self) -> bool {
        self.emitter_choreo.is_bursting(&self.scheduler)
    }

    /// Real time the physics clock has thrown away to keep up
    pub fn dropped_time(&self) -> f64 {
        self.clock.dropped()
    }

    /// Everything the renderer needs this frame
    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            field: self.field.current(),
            resolution: self.field.resolution(),
            emitters: &self.emitters,
            camera: *self.camera.pose(),
            camera_mode: self.camera.mode(),
            rotation: self.rotation.angle(),
            wave_speed: self.wave.wave_speed().unwrap_or_default(),
            damping: self.wave.damping().unwrap_or(1.0),
            sim_time: self.sim_time,
            steps: self.field.steps(),
            paused: self.paused,
            sequence_running: self.sequencer.is_running(),
            displace: self.displace,
            reveal: self.config.reveal.window(self.elapsed),
        }
    }

    // === Frame ===

    /// Advance by one display refresh of `dt` seconds
    pub fn frame(&mut self, frame_dt: f64) -> Result<(), WaveError> {
        let dt = frame_dt.clamp(0.0, MAX_FRAME_DT);
        if frame_dt > MAX_FRAME_DT {
            log::debug!("frame: {frame_dt:.3}s delta clamped to {MAX_FRAME_DT}s");
        }
        self.elapsed += dt;

        self.scheduler.advance(dt);
        while let Some(fired) = self.scheduler.pop_due() {
            self.dispatch(fired)?;
        }

        if self.speed.is_active() {
            let c = self.speed.tick(dt);
            self.wave.set_wave_speed(c);
        }

        self.rotation.advance(dt);
        self.mapping.rotation = self.rotation.angle();

        if !self.paused {
            // the clock applies its own clamp and counts what it drops
            let steps = self.clock.advance(frame_dt);
            for _ in 0..steps {
                self.field.step(&self.wave, &self.emitters, self.sim_time);
                self.sim_time += self.clock.step();
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, fired: Fired<Task>) -> Result<(), WaveError> {
        match fired.task {
            Task::ChangeView => {
                self.change_view();
            }
            Task::ChangeEmitters => {
                let avoid = self.view_exclusion();
                let change = self.emitter_choreo.randomize_emitters(
                    &mut self.emitters,
                    Some(&avoid),
                    &mut self.scheduler,
                    &mut self.rng,
                );
                match change {
                    EmitterChange::Placed(outcome) if outcome.fallbacks > 0 => {
                        log::debug!("emitters: {} placements fell back", outcome.fallbacks);
                    }
                    _ => {}
                }
            }
            Task::BurstStep { follow_up } => {
                let avoid = self.view_exclusion();
                self.emitter_choreo
                    .randomize_emitters_once(&mut self.emitters, Some(&avoid), &mut self.rng);
                if fired.last {
                    self.emitter_choreo.burst_finished(fired.id);
                    if let Some(command) = follow_up {
                        self.execute(command)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn change_view(&mut self) -> CamOutcome {
        let outcome = self.camera.randomize_cam(
            &self.emitters,
            &self.mapping,
            &mut self.rotation,
            &mut self.rng,
        );
        if let CamOutcome::Special { index } = outcome {
            self.settings.special_view_index = index;
        }
        outcome
    }

    fn view_exclusion(&self) -> ViewExclusion {
        ViewExclusion {
            center: self.camera.pose().view_center(),
            radius: self.camera.exclusion_radius(),
            mapping: self.mapping,
        }
    }

    // === Commands ===

    /// Operator command. Manual camera or emitter actions stop the sequence.
    pub fn handle(&mut self, command: Command) -> Result<(), WaveError> {
        if command.is_manual_override() && self.stop_sequence() {
            log::info!("{command:?}: manual override, sequence stopped");
        }
        self.execute(command)
    }

    fn execute(&mut self, command: Command) -> Result<(), WaveError> {
        match command {
            Command::RandomizeCamera => {
                self.change_view();
            }
            Command::LogCamera => {
                let pose = serde_json::to_string(self.camera.pose())?;
                log::info!("camera {:?}: {pose}", self.camera.mode());
            }
            Command::CycleView(offset) => {
                if let Some(index) = self.camera.next_special_view(offset) {
                    self.settings.special_view_index = index;
                }
            }
            Command::RandomizeEmitters => {
                let avoid = self.view_exclusion();
                self.emitter_choreo
                    .randomize_emitters_once(&mut self.emitters, Some(&avoid), &mut self.rng);
            }
            Command::ForceBurst => {
                let [lo, hi] = self.config.emitters.burst_count;
                let count = if hi > lo { self.rng.random_range(lo..=hi) } else { lo };
                self.burst(count, None);
            }
            Command::ToggleRotation => {
                if self.rotation.is_enabled() {
                    self.rotation.disable();
                } else {
                    self.rotation.set_period(self.config.manual_rotation_period);
                }
                log::info!("rotation period {:.0}s", self.rotation.period());
            }
            Command::ResetSimulation => self.reset()?,
            Command::StartSequence => self.start_sequence(),
            Command::StopSequence => {
                self.stop_sequence();
            }
            Command::NextSequence => {
                self.sequencer.next_sequence(&mut self.scheduler);
                self.camera.set_sequencing(true);
                self.settings.sequence_running = true;
            }
            Command::SpeedUp => self.shift_speed(1),
            Command::SpeedDown => self.shift_speed(-1),
            Command::TogglePause => {
                self.paused = !self.paused;
                log::info!("simulation {}", if self.paused { "paused" } else { "running" });
            }
        }
        Ok(())
    }

    /// Start a burst of `count` placements; `follow_up` runs after the last
    pub fn burst(&mut self, count: u32, follow_up: Option<Command>) -> Option<TimerId> {
        self.emitter_choreo
            .randomize_emitters_burst(&mut self.scheduler, count, follow_up)
    }

    fn start_sequence(&mut self) {
        self.sequencer.start(&mut self.scheduler);
        self.camera.set_sequencing(true);
        self.settings.sequence_running = true;
    }

    fn stop_sequence(&mut self) -> bool {
        let stopped = self.sequencer.stop(&mut self.scheduler);
        self.camera.set_sequencing(false);
        self.settings.sequence_running = false;
        stopped
    }

    fn shift_speed(&mut self, offset: isize) {
        if self.settings.shift_speed(offset) {
            let target = self.settings.wave_speed();
            self.speed.transition_to(target, self.config.speed_transition);
            log::info!("speed index {} -> c = {target}", self.settings.speed_index);
        }
    }

    /// Zero both buffers and the simulation clock
    pub fn reset(&mut self) -> Result<(), WaveError> {
        self.field.reset()?;
        self.clock.reset();
        self.sim_time = 0.0;
        log::info!("simulation reset");
        Ok(())
    }

    // === Settings and parameters ===

    /// Apply persisted choices: speed takes effect at once, the sequence is
    /// started or stopped, and an idle camera returns to the saved view.
    pub fn apply_settings(&mut self, settings: &Settings) {
        let mut settings = settings.clone();
        settings.shift_speed(0);
        let speed = settings.wave_speed();
        self.speed.set(speed);
        self.wave.set_wave_speed(speed);
        self.settings = settings;

        if self.settings.sequence_running {
            self.start_sequence();
        } else {
            self.stop_sequence();
            let index = self.settings.special_view_index;
            if !self.camera.select_special_view(index) {
                log::warn!("no special view {index}, keeping camera");
            }
        }
    }

    /// Set a tuning parameter; the clamped value is applied and returned
    pub fn set_param(&mut self, name: &str, value: f32) -> Result<f32, WaveError> {
        let value = self.params.set(name, value)?;
        match name {
            "damping" => self.wave.set_damping(value),
            "point_effect" => self.wave.point_effect = value,
            "point_radius" => self.wave.point_radius = value,
            "border" => self.wave.border = value,
            "border_bias" => self.wave.border_bias = value,
            "displace_height" => self.displace.height_scale = value,
            "displace_gain" => self.displace.gain = value,
            "wave_smoothing" => self.displace.smoothing = value,
            _ => {}
        }
        Ok(value)
    }

    pub fn param(&self, name: &str) -> Option<f32> {
        self.params.get(name)
    }

    /// Receive every effective parameter change
    pub fn subscribe_params(&mut self) -> Receiver<ParamChange> {
        self.params.subscribe()
    }
}
