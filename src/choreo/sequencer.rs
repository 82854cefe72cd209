//! Autonomous sequence: a view timer and an emitter timer running side by side

use serde::{Deserialize, Serialize};

use super::Task;
use super::timer::{Interval, Scheduler, TimerId, TimerSpec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Seconds between camera changes, sampled per firing
    pub view_interval: [f64; 2],
    pub view_immediate: bool,
    /// Seconds between emitter changes
    pub emitter_interval: f64,
    pub emitter_immediate: bool,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            view_interval: [15.0, 30.0],
            view_immediate: true,
            emitter_interval: 40.0,
            emitter_immediate: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sequencer {
    config: SequencerConfig,
    view: Option<TimerId>,
    emitters: Option<TimerId>,
}

impl Sequencer {
    pub fn new(config: SequencerConfig) -> Self {
        Self {
            config,
            view: None,
            emitters: None,
        }
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.view.is_some()
    }

    pub fn view_timer(&self) -> Option<TimerId> {
        self.view
    }

    pub fn emitter_timer(&self) -> Option<TimerId> {
        self.emitters
    }

    /// Arm both timers. Returns false if already running.
    pub fn start(&mut self, scheduler: &mut Scheduler<Task>) -> bool {
        if self.is_running() {
            return false;
        }
        let [min, max] = self.config.view_interval;
        let view = TimerSpec::every(Interval::Range { min, max }).immediate(self.config.view_immediate);
        let emitters = TimerSpec::every(Interval::Fixed(self.config.emitter_interval))
            .immediate(self.config.emitter_immediate);
        self.view = Some(scheduler.schedule(view, Task::ChangeView));
        self.emitters = Some(scheduler.schedule(emitters, Task::ChangeEmitters));
        log::info!("sequence started");
        true
    }

    /// Cancel both timers. Returns false if nothing was running.
    pub fn stop(&mut self, scheduler: &mut Scheduler<Task>) -> bool {
        let was_running = self.is_running();
        for id in [self.view.take(), self.emitters.take()].into_iter().flatten() {
            scheduler.cancel(id);
        }
        if was_running {
            log::info!("sequence stopped");
        }
        was_running
    }

    /// Start if idle, otherwise fire the view timer now and leave the
    /// emitter timer's schedule alone
    pub fn next_sequence(&mut self, scheduler: &mut Scheduler<Task>) {
        match self.view {
            Some(id) if scheduler.trigger(id) => log::debug!("sequence: next view"),
            _ => {
                self.stop(scheduler);
                self.start(scheduler);
            }
        }
    }
}
