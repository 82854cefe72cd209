//! Operator commands
//!
//! Discrete triggers from whatever input the host has. The keyboard mapping
//! mirrors the installation's layout; hosts can also construct commands
//! directly.

/// One discrete operator action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Pick a new random camera pose
    RandomizeCamera,
    /// Log the current camera pose, e.g. to curate a new special view
    LogCamera,
    /// Step through the curated views by the given offset
    CycleView(isize),
    RandomizeEmitters,
    /// Start an emitter burst now
    ForceBurst,
    ToggleRotation,
    /// Zero the field and the simulation clock
    ResetSimulation,
    StartSequence,
    StopSequence,
    /// Start the sequence, or jump to its next view if running
    NextSequence,
    SpeedUp,
    SpeedDown,
    /// Freeze or resume the simulation
    TogglePause,
}

impl Command {
    /// Map a key name (as reported by the host's keyboard events)
    pub fn from_key(key: &str) -> Option<Self> {
        let command = match key {
            " " => Command::TogglePause,
            "Backspace" => Command::ResetSimulation,
            "c" => Command::LogCamera,
            "v" => Command::RandomizeCamera,
            "n" => Command::CycleView(1),
            "N" => Command::CycleView(-1),
            "x" => Command::RandomizeEmitters,
            "b" => Command::ForceBurst,
            "r" => Command::ToggleRotation,
            "s" => Command::StartSequence,
            "S" => Command::StopSequence,
            "Enter" => Command::NextSequence,
            "+" | "=" => Command::SpeedUp,
            "-" | "_" => Command::SpeedDown,
            _ => return None,
        };
        Some(command)
    }

    /// Operator takes over from the autonomous sequence
    pub fn is_manual_override(&self) -> bool {
        matches!(
            self,
            Command::RandomizeCamera
                | Command::CycleView(_)
                | Command::RandomizeEmitters
                | Command::ForceBurst
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(Command::from_key("n"), Some(Command::CycleView(1)));
        assert_eq!(Command::from_key("N"), Some(Command::CycleView(-1)));
        assert_eq!(Command::from_key("Backspace"), Some(Command::ResetSimulation));
        assert_eq!(Command::from_key("="), Some(Command::SpeedUp));
        assert_eq!(Command::from_key("c"), Some(Command::LogCamera));
        assert_eq!(Command::from_key("v"), Some(Command::RandomizeCamera));
        assert_eq!(Command::from_key("q"), None);
    }

    #[test]
    fn test_manual_override() {
        assert!(Command::RandomizeCamera.is_manual_override());
        assert!(Command::ForceBurst.is_manual_override());
        assert!(!Command::NextSequence.is_manual_override());
        assert!(!Command::SpeedUp.is_manual_override());
        assert!(!Command::LogCamera.is_manual_override());
    }
}
