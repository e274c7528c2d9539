use serde::{Deserialize, Serialize};

use crate::library::SetupDetails;
use crate::rig::{Direction, Selection, Target};
use crate::session::GestureEnd;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandSource {
    Local,
    Rpc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    // Chain edits
    AddPedal { template_id: String },
    RemovePedal(usize),
    MovePedal { position: usize, direction: Direction },
    ReorderPedal { from: usize, to: usize },
    ToggleBypass(Target),
    SetParam { target: Target, key: String, value: f32 },
    SetNotes { target: Target, notes: Option<String> },
    AutoArrange,
    ClearChain,

    // Amplifier
    SetAmplifier { template_id: String },
    SelectChannel(String),
    SelectVariant(String),

    // Continuous gestures (knob drags)
    BeginGesture,
    GestureSet { target: Target, key: String, value: f32 },
    GestureDrag { target: Target, key: String, start: f32, delta_px: f32 },
    EndGesture(GestureEnd),

    Select(Selection),

    // History
    Undo,
    Redo,

    // Library
    SetDetails(SetupDetails),
    Publish,
    LoadSetup(String),
    /// Add a published setup to the user's own collection
    SaveSetup(String),

    // Assistant
    /// `first_name` set means a new member; absent means a returning user
    RequestWelcome { first_name: Option<String>, inspirations: String },
    RequestCritique,
    RequestBlueprint,
    ApplyBlueprint,

    Shutdown,
}

impl Command {
    /// Returns true if this command should be logged to event log
    pub fn is_loggable(&self) -> bool {
        !matches!(
            self,
            Command::GestureSet { .. } | Command::GestureDrag { .. } | Command::Shutdown
        )
    }

    /// Human-readable description of the command
    pub fn description(&self) -> String {
        match self {
            Command::AddPedal { template_id } => format!("Add pedal {}", template_id),
            Command::RemovePedal(p) => format!("Remove pedal {}", p),
            Command::MovePedal {
                position,
                direction,
            } => format!("Move pedal {} {:?}", position, direction),
            Command::ReorderPedal { from, to } => format!("Move pedal {} to {}", from, to),
            Command::ToggleBypass(target) => format!("Toggle bypass on {}", target_name(target)),
            Command::SetParam { target, key, value } => {
                format!("Set {} {} to {:.0}", target_name(target), key, value)
            }
            Command::SetNotes { target, notes } => match notes {
                Some(_) => format!("Edit notes on {}", target_name(target)),
                None => format!("Clear notes on {}", target_name(target)),
            },
            Command::AutoArrange => "Auto-arrange chain".to_string(),
            Command::ClearChain => "Clear chain".to_string(),
            Command::SetAmplifier { template_id } => format!("Set amplifier {}", template_id),
            Command::SelectChannel(c) => format!("Select channel '{}'", c),
            Command::SelectVariant(v) => format!("Select variant '{}'", v),
            Command::BeginGesture => "Begin gesture".to_string(),
            Command::GestureSet { target, key, value } => {
                format!("Drag {} {} to {:.0}", target_name(target), key, value)
            }
            Command::GestureDrag {
                target,
                key,
                start,
                delta_px,
            } => format!(
                "Drag {} {} from {:.0} by {:+.0}px",
                target_name(target),
                key,
                start,
                delta_px
            ),
            Command::EndGesture(end) => format!("End gesture ({:?})", end),
            Command::Select(sel) => match sel.target() {
                Some(t) => format!("Select {}", target_name(&t)),
                None => "Clear selection".to_string(),
            },
            Command::Undo => "Undo".to_string(),
            Command::Redo => "Redo".to_string(),
            Command::SetDetails(d) => format!("Set details '{}'", d.title),
            Command::Publish => "Publish setup".to_string(),
            Command::LoadSetup(id) => format!("Load setup {}", id),
            Command::SaveSetup(id) => format!("Save setup {} to collection", id),
            Command::RequestWelcome { first_name, .. } => match first_name {
                Some(name) => format!("Welcome new member {}", name),
                None => "Welcome back".to_string(),
            },
            Command::RequestCritique => "Ask for a chain critique".to_string(),
            Command::RequestBlueprint => "Ask for a tone blueprint".to_string(),
            Command::ApplyBlueprint => "Apply blueprint".to_string(),
            Command::Shutdown => "Shutdown".to_string(),
        }
    }
}

fn target_name(target: &Target) -> String {
    match target {
        Target::Pedal(p) => format!("pedal {}", p),
        Target::Amp => "amp".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_updates_stay_out_of_event_log() {
        let drag = Command::GestureDrag {
            target: Target::Amp,
            key: "Gain".into(),
            start: 50.0,
            delta_px: -12.0,
        };
        assert!(!drag.is_loggable());
        assert!(Command::EndGesture(GestureEnd::Released).is_loggable());
        assert_eq!(drag.description(), "Drag amp Gain from 50 by -12px");
    }

    #[test]
    fn commands_survive_json() {
        let cmd = Command::SetParam {
            target: Target::Pedal(2),
            key: "Tone".into(),
            value: 55.0,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert_eq!(serde_json::from_str::<Command>(&json).unwrap(), cmd);
    }
}
