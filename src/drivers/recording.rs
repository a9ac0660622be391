use log::info;
use serde::Serialize;
use crate::drivers::MonitorError;
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
    Stopped { saved: bool },
}
impl RecordingState {
    fn name(&self) -> &'static str {
        match self {
            RecordingState::Idle => "idle",
            RecordingState::Recording => "recording",
            RecordingState::Stopped { saved: false } => "stopped",
            RecordingState::Stopped { saved: true } => "saved",
        }
    }
}
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordingAction {
    /// Start observing a live feed.
    Start,
    /// A complete recording was imported for review.
    Import,
    Stop,
    Save,
    Reset { confirmed: bool },
}
impl RecordingAction {
    fn name(&self) -> &'static str {
        match self {
            RecordingAction::Start => "start",
            RecordingAction::Import => "import",
            RecordingAction::Stop => "stop",
            RecordingAction::Save => "save",
            RecordingAction::Reset { .. } => "reset",
        }
    }
}
/// What the main recording button shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PrimaryButton {
    Play,
    Stop,
    Save,
    Saved,
}
/// Declarative description of the recording controls for one state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct UiState {
    pub primary: PrimaryButton,
    pub reset_visible: bool,
    pub import_enabled: bool,
    /// Charts and metrics are greyed out while idle.
    pub content_enabled: bool,
}
/// Recording controls as an explicit state machine.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecordingMachine {
    state: RecordingState,
}
impl RecordingMachine {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn state(&self) -> RecordingState {
        self.state
    }
    /// Apply an action, returning the controls for the new state. Rejected
    /// actions leave the state untouched.
    pub fn apply(&mut self, action: RecordingAction) -> Result<UiState, MonitorError> {
        let next = match (self.state, action) {
            (RecordingState::Idle, RecordingAction::Start) => RecordingState::Recording,
            (RecordingState::Idle, RecordingAction::Import) => {
                RecordingState::Stopped { saved: false }
            }
            (RecordingState::Recording, RecordingAction::Stop) => {
                RecordingState::Stopped { saved: false }
            }
            (RecordingState::Stopped { .. }, RecordingAction::Save) => {
                RecordingState::Stopped { saved: true }
            }
            (RecordingState::Stopped { saved }, RecordingAction::Reset { confirmed }) => {
                if !saved && !confirmed {
                    return Err(MonitorError::NeedsConfirmation);
                }
                RecordingState::Idle
            }
            (state, action) => {
                return Err(MonitorError::InvalidTransition {
                    state: state.name(),
                    action: action.name(),
                })
            }
        };
        info!("recording: {} -> {}", self.state.name(), next.name());
        self.state = next;
        Ok(self.ui())
    }
    pub fn ui(&self) -> UiState {
        match self.state {
            RecordingState::Idle => UiState {
                primary: PrimaryButton::Play,
                reset_visible: false,
                import_enabled: true,
                content_enabled: false,
            },
            RecordingState::Recording => UiState {
                primary: PrimaryButton::Stop,
                reset_visible: false,
                import_enabled: false,
                content_enabled: true,
            },
            RecordingState::Stopped { saved } => UiState {
                primary: if saved {
                    PrimaryButton::Saved
                } else {
                    PrimaryButton::Save
                },
                reset_visible: true,
                import_enabled: false,
                content_enabled: true,
            },
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn full_live_cycle() {
        let mut machine = RecordingMachine::new();
        assert_eq!(machine.ui().primary, PrimaryButton::Play);
        assert!(!machine.ui().content_enabled);
        let ui = machine.apply(RecordingAction::Start).unwrap();
        assert_eq!(ui.primary, PrimaryButton::Stop);
        assert!(!ui.import_enabled);
        let ui = machine.apply(RecordingAction::Stop).unwrap();
        assert_eq!(ui.primary, PrimaryButton::Save);
        assert!(ui.reset_visible);
        let ui = machine.apply(RecordingAction::Save).unwrap();
        assert_eq!(ui.primary, PrimaryButton::Saved);
        let ui = machine
            .apply(RecordingAction::Reset { confirmed: false })
            .unwrap();
        assert_eq!(ui.primary, PrimaryButton::Play);
        assert_eq!(machine.state(), RecordingState::Idle);
    }
    #[test]
    fn unsaved_reset_needs_confirmation() {
        let mut machine = RecordingMachine::new();
        machine.apply(RecordingAction::Import).unwrap();
        assert!(matches!(
            machine.apply(RecordingAction::Reset { confirmed: false }),
            Err(MonitorError::NeedsConfirmation)
        ));
        assert_eq!(machine.state(), RecordingState::Stopped { saved: false });
        machine.apply(RecordingAction::Reset { confirmed: true }).unwrap();
        assert_eq!(machine.state(), RecordingState::Idle);
    }
    #[test]
    fn invalid_transitions_are_rejected() {
        let mut machine = RecordingMachine::new();
        assert!(matches!(
            machine.apply(RecordingAction::Stop),
            Err(MonitorError::InvalidTransition {
                state: "idle",
                action: "stop"
            })
        ));
        machine.apply(RecordingAction::Start).unwrap();
        assert!(machine.apply(RecordingAction::Save).is_err());
        assert!(machine.apply(RecordingAction::Start).is_err());
        assert_eq!(machine.state(), RecordingState::Recording);
    }
}
