//! Wavefield entry point
//!
//! Headless native runner: drives a session at display rate without drawing
//! and logs what the choreography does.
//!
//! Usage: `wavefield [config.json] [seconds]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::time::{SystemTime, UNIX_EPOCH};

    use wavefield::persistence::FileStore;
    use wavefield::renderer::{SceneUniform, field_bytes, pack_emitters};
    use wavefield::sim::{energy, max_abs_height};
    use wavefield::{Command, Config, Session, Settings, WaveError};

    /// Simulated display refresh
    const FRAME_DT: f64 = 1.0 / 60.0;
    const DEFAULT_SECONDS: f64 = 120.0;
    /// Log a status line every this many frames
    const REPORT_EVERY: u64 = 600;
    const SETTINGS_DIR: &str = ".wavefield";

    pub fn run() -> Result<(), WaveError> {
        let mut args = std::env::args().skip(1);
        let config = match args.next() {
            Some(path) => {
                log::info!("Loading config from {path}");
                Config::from_json(&std::fs::read_to_string(&path)?)?
            }
            None => Config::default(),
        };
        let seconds = args
            .next()
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(DEFAULT_SECONDS);
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let mut store = FileStore::new(SETTINGS_DIR);
        let mut session = Session::new(config, seed)?;
        session.apply_settings(&Settings::load(&store));
        if !session.sequence_running() {
            session.handle(Command::StartSequence)?;
        }

        let frames = (seconds / FRAME_DT).round() as u64;
        for frame in 0..frames {
            session.frame(FRAME_DT)?;
            if frame % REPORT_EVERY == 0 {
                report(&session);
            }
        }
        report(&session);

        session.settings().save(&mut store)?;
        Ok(())
    }

    fn report(session: &Session) {
        let view = session.view();
        let scene = SceneUniform::from_view(&view);
        let emitters = pack_emitters(view.emitters, view.sim_time);
        let peak = max_abs_height(view.field);
        let upload = field_bytes(view.field).len()
            + bytemuck::bytes_of(&scene).len()
            + bytemuck::cast_slice::<_, u8>(&emitters).len();
        log::info!(
            "t={:.1}s steps={} {:?} cam=({:.1}, {:.1}, {:.1}) rot={:.2} c={:.2} peak={peak:.3} energy={:.1} dropped={:.2}s upload={upload}B",
            view.sim_time,
            view.steps,
            view.camera_mode,
            view.camera.position.x,
            view.camera.position.y,
            view.camera.position.z,
            view.rotation,
            view.wave_speed,
            energy(view.field),
            session.dropped_time(),
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    env_logger::init();
    log::info!("Wavefield (native) starting...");

    match native::run() {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            std::process::ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser hosts drive `Session` through the library
}
