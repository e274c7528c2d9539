use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::{json, Value};

use crate::app::EditorView;
use crate::catalog::{self, PedalFilter};
use crate::command::{Command, CommandSender, CommandSource, Outcome};
use crate::event::EventLog;
use crate::library::{SetupDetails, SetupLibrary, SetupRecord};
use crate::rig::{Direction, Selection, Target};
use crate::session::GestureEnd;

/// How long a tool call waits for the editor to apply its command
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// JSON-RPC tool handler for the rig editor
pub struct RigRpc {
    command_sender: CommandSender,
    event_log: Arc<RwLock<EventLog>>,
    view: Arc<RwLock<EditorView>>,
    library: SetupLibrary,
    /// Whose saved-setup collection `list_saved` reads
    user: String,
}

impl RigRpc {
    pub fn new(
        command_sender: CommandSender,
        event_log: Arc<RwLock<EventLog>>,
        view: Arc<RwLock<EditorView>>,
        library: SetupLibrary,
        user: String,
    ) -> Self {
        Self {
            command_sender,
            event_log,
            view,
            library,
            user,
        }
    }

    /// Send a command to the editor and wait for its outcome
    fn dispatch(&self, cmd: Command) -> Value {
        let outcome = self
            .command_sender
            .request(cmd, CommandSource::Rpc, REPLY_TIMEOUT);
        outcome_json(outcome)
    }

    // === Read-only tools ===

    pub fn get_state(&self) -> Value {
        let view = self.view.read();
        let mut state = serde_json::to_value(&*view).unwrap_or(Value::Null);
        if let Some(obj) = state.as_object_mut() {
            let amp = &view.chain.amplifier;
            obj.insert("summary".into(), json!(view.chain.describe()));
            obj.insert("amp_tone_stack".into(), json!(amp.tone_stack()));
            obj.insert("amp_gain_stage".into(), json!(amp.gain_stage()));
        }
        state
    }

    pub fn get_events(&self, since_id: u64) -> Value {
        let log = self.event_log.read();
        let events: Vec<Value> = log
            .get_events_since(since_id)
            .into_iter()
            .map(|e| {
                json!({
                    "id": e.id,
                    "timestamp": e.timestamp,
                    "source": e.source,
                    "description": e.command.description()
                })
            })
            .collect();
        json!({
            "status": "ok",
            "latest_id": log.latest_id(),
            "events": events
        })
    }

    pub fn list_catalog(&self, search: &str, brand: Option<&str>, color: Option<&str>) -> Value {
        let filter = PedalFilter {
            search: search.to_string(),
            brand: brand.map(str::to_string),
            color: color.map(str::to_string),
        };
        let pedals = catalog::filter_pedals(&filter);
        let groups: Vec<Value> = catalog::group_by_category(&pedals)
            .into_iter()
            .map(|(category, members)| {
                let members: Vec<Value> = members
                    .iter()
                    .map(|p| {
                        json!({
                            "id": p.id,
                            "name": p.name,
                            "brand": p.brand,
                            "color": p.color,
                            "settings": p.settings.iter().map(|(k, _)| *k).collect::<Vec<_>>()
                        })
                    })
                    .collect();
                json!({ "category": category.name(), "pedals": members })
            })
            .collect();
        let amps: Vec<Value> = catalog::filter_amps(search, brand)
            .iter()
            .map(|a| {
                json!({
                    "id": a.id,
                    "name": a.name,
                    "brand": a.brand,
                    "channels": a.channels,
                    "variants": a.variants
                })
            })
            .collect();
        json!({
            "status": "ok",
            "pedals": groups,
            "amps": amps,
            "pedal_brands": catalog::pedal_brands(),
            "pedal_colors": catalog::pedal_colors(),
            "amp_brands": catalog::amp_brands()
        })
    }

    pub fn list_setups(&self) -> Value {
        setups_json(self.library.list())
    }

    /// The user's own collection, in the order the setups were saved
    pub fn list_saved(&self) -> Value {
        setups_json(self.library.saved(&self.user))
    }

    /// Handle a tool call
    pub fn handle_tool_call(&self, tool: &str, args: &Value) -> Value {
        let int = |key: &str| args.get(key).and_then(|v| v.as_u64()).map(|n| n as usize);
        let num = |key: &str| args.get(key).and_then(|v| v.as_f64()).map(|n| n as f32);
        let text = |key: &str| args.get(key).and_then(|v| v.as_str());

        match tool {
            "get_state" => self.get_state(),
            "get_events" => {
                let since_id = args.get("since_id").and_then(|v| v.as_u64()).unwrap_or(0);
                self.get_events(since_id)
            }
            "list_catalog" => self.list_catalog(
                text("search").unwrap_or(""),
                text("brand"),
                text("color"),
            ),
            "list_setups" => self.list_setups(),
            "list_saved" => self.list_saved(),

            // Chain
            "add_pedal" => match text("template_id") {
                Some(id) => self.dispatch(Command::AddPedal {
                    template_id: id.to_string(),
                }),
                None => error_json("template_id is required"),
            },
            "remove_pedal" => match int("position") {
                Some(p) => self.dispatch(Command::RemovePedal(p)),
                None => error_json("position is required"),
            },
            "move_pedal" => {
                let direction = match text("direction") {
                    Some("left") => Direction::Left,
                    Some("right") => Direction::Right,
                    _ => return error_json("direction must be 'left' or 'right'"),
                };
                match int("position") {
                    Some(position) => self.dispatch(Command::MovePedal {
                        position,
                        direction,
                    }),
                    None => error_json("position is required"),
                }
            }
            "reorder_pedal" => match (int("from"), int("to")) {
                (Some(from), Some(to)) => self.dispatch(Command::ReorderPedal { from, to }),
                _ => error_json("from and to are required"),
            },
            "toggle_bypass" => match parse_target(args) {
                Ok(target) => self.dispatch(Command::ToggleBypass(target)),
                Err(e) => error_json(e),
            },
            "set_param" => match (parse_target(args), text("key"), num("value")) {
                (Ok(target), Some(key), Some(value)) => self.dispatch(Command::SetParam {
                    target,
                    key: key.to_string(),
                    value,
                }),
                (Err(e), _, _) => error_json(e),
                _ => error_json("key and value are required"),
            },
            "set_notes" => match parse_target(args) {
                Ok(target) => self.dispatch(Command::SetNotes {
                    target,
                    notes: text("notes").map(str::to_string),
                }),
                Err(e) => error_json(e),
            },
            "auto_arrange" => self.dispatch(Command::AutoArrange),
            "clear_chain" => self.dispatch(Command::ClearChain),

            // Amplifier
            "set_amplifier" => match text("template_id") {
                Some(id) => self.dispatch(Command::SetAmplifier {
                    template_id: id.to_string(),
                }),
                None => error_json("template_id is required"),
            },
            "select_channel" => match text("channel") {
                Some(c) => self.dispatch(Command::SelectChannel(c.to_string())),
                None => error_json("channel is required"),
            },
            "select_variant" => match text("variant") {
                Some(v) => self.dispatch(Command::SelectVariant(v.to_string())),
                None => error_json("variant is required"),
            },

            // Gestures
            "begin_gesture" => self.dispatch(Command::BeginGesture),
            "gesture_set" => match (parse_target(args), text("key"), num("value")) {
                (Ok(target), Some(key), Some(value)) => self.dispatch(Command::GestureSet {
                    target,
                    key: key.to_string(),
                    value,
                }),
                (Err(e), _, _) => error_json(e),
                _ => error_json("key and value are required"),
            },
            "gesture_drag" => match (parse_target(args), text("key"), num("start"), num("delta_px")) {
                (Ok(target), Some(key), Some(start), Some(delta_px)) => {
                    self.dispatch(Command::GestureDrag {
                        target,
                        key: key.to_string(),
                        start,
                        delta_px,
                    })
                }
                (Err(e), _, _, _) => error_json(e),
                _ => error_json("key, start and delta_px are required"),
            },
            "end_gesture" => {
                let cancelled = args.get("cancelled").and_then(|v| v.as_bool()).unwrap_or(false);
                let end = if cancelled {
                    GestureEnd::Cancelled
                } else {
                    GestureEnd::Released
                };
                self.dispatch(Command::EndGesture(end))
            }

            // Selection and history
            "select" => {
                let selection = match args.get("target") {
                    None | Some(Value::Null) => Selection::None,
                    Some(_) => match parse_target(args) {
                        Ok(Target::Amp) => Selection::Amp,
                        Ok(Target::Pedal(p)) => Selection::Pedal(p),
                        Err(e) => return error_json(e),
                    },
                };
                self.dispatch(Command::Select(selection))
            }
            "undo" => self.dispatch(Command::Undo),
            "redo" => self.dispatch(Command::Redo),

            // Library
            "set_details" => match serde_json::from_value::<SetupDetails>(args.clone()) {
                Ok(details) => self.dispatch(Command::SetDetails(details)),
                Err(e) => error_json(format!("Invalid details: {}", e)),
            },
            "publish" => self.dispatch(Command::Publish),
            "load_setup" => match text("id") {
                Some(id) => self.dispatch(Command::LoadSetup(id.to_string())),
                None => error_json("id is required"),
            },
            "save_setup" => match text("id") {
                Some(id) => self.dispatch(Command::SaveSetup(id.to_string())),
                None => error_json("id is required"),
            },

            // Assistant
            "request_welcome" => self.dispatch(Command::RequestWelcome {
                first_name: text("first_name").map(str::to_string),
                inspirations: text("inspirations").unwrap_or("").to_string(),
            }),
            "request_critique" => self.dispatch(Command::RequestCritique),
            "request_blueprint" => self.dispatch(Command::RequestBlueprint),
            "apply_blueprint" => self.dispatch(Command::ApplyBlueprint),

            _ => error_json(format!("Unknown tool: {}", tool)),
        }
    }

    /// Get the list of available tools (for discovery)
    pub fn list_tools() -> Value {
        let target = json!({
            "description": "Pedal position (0 = first after the input) or \"amp\""
        });
        let none = json!({ "type": "object", "properties": {} });
        let tool = |name: &str, description: &str, schema: &Value| {
            json!({ "name": name, "description": description, "inputSchema": schema })
        };
        json!({
            "tools": [
                tool("get_state", "Get the chain, selection, history position, suggestion and notice", &none),
                tool("get_events", "Get edits applied since an event id", &json!({
                    "type": "object",
                    "properties": { "since_id": { "type": "integer" } }
                })),
                tool("list_catalog", "Browse catalog pedals (grouped by category) and amps", &json!({
                    "type": "object",
                    "properties": {
                        "search": { "type": "string", "description": "Substring of name or brand" },
                        "brand": { "type": "string" },
                        "color": { "type": "string", "description": "Pedal colour, exact" }
                    }
                })),
                tool("list_setups", "List published setups, newest first", &none),
                tool("list_saved", "List the setups saved to your own collection", &none),
                tool("add_pedal", "Append a catalog pedal to the end of the chain and select it", &json!({
                    "type": "object",
                    "properties": { "template_id": { "type": "string" } },
                    "required": ["template_id"]
                })),
                tool("remove_pedal", "Remove the pedal at a position", &json!({
                    "type": "object",
                    "properties": { "position": { "type": "integer" } },
                    "required": ["position"]
                })),
                tool("move_pedal", "Swap a pedal with its left or right neighbour", &json!({
                    "type": "object",
                    "properties": {
                        "position": { "type": "integer" },
                        "direction": { "type": "string", "enum": ["left", "right"] }
                    },
                    "required": ["position", "direction"]
                })),
                tool("reorder_pedal", "Drag a pedal to a new index (index among the remaining pedals)", &json!({
                    "type": "object",
                    "properties": {
                        "from": { "type": "integer" },
                        "to": { "type": "integer" }
                    },
                    "required": ["from", "to"]
                })),
                tool("toggle_bypass", "Toggle bypass on a pedal or the amp", &json!({
                    "type": "object",
                    "properties": { "target": target },
                    "required": ["target"]
                })),
                tool("set_param", "Set a parameter (0-100, clamped) as one undoable edit", &json!({
                    "type": "object",
                    "properties": {
                        "target": target,
                        "key": { "type": "string" },
                        "value": { "type": "number" }
                    },
                    "required": ["target", "key", "value"]
                })),
                tool("set_notes", "Set or clear (omit notes) the note on a pedal or the amp", &json!({
                    "type": "object",
                    "properties": { "target": target, "notes": { "type": "string" } },
                    "required": ["target"]
                })),
                tool("auto_arrange", "Sort pedals into Dynamics, Drive, Modulation, Delay, Reverb, Utility", &none),
                tool("clear_chain", "Remove every pedal, keeping the amp", &none),
                tool("set_amplifier", "Replace the amp with a catalog amp and select it", &json!({
                    "type": "object",
                    "properties": { "template_id": { "type": "string" } },
                    "required": ["template_id"]
                })),
                tool("select_channel", "Select one of the amp's channels", &json!({
                    "type": "object",
                    "properties": { "channel": { "type": "string" } },
                    "required": ["channel"]
                })),
                tool("select_variant", "Select one of the amp's variants", &json!({
                    "type": "object",
                    "properties": { "variant": { "type": "string" } },
                    "required": ["variant"]
                })),
                tool("begin_gesture", "Start a knob drag; updates stay uncommitted until end_gesture", &none),
                tool("gesture_set", "Set a value inside the open gesture", &json!({
                    "type": "object",
                    "properties": {
                        "target": target,
                        "key": { "type": "string" },
                        "value": { "type": "number" }
                    },
                    "required": ["target", "key", "value"]
                })),
                tool("gesture_drag", "Knob drag update: start + delta_px * 0.5, rounded and clamped", &json!({
                    "type": "object",
                    "properties": {
                        "target": target,
                        "key": { "type": "string" },
                        "start": { "type": "number" },
                        "delta_px": { "type": "number", "description": "Upward drag distance in pixels" }
                    },
                    "required": ["target", "key", "start", "delta_px"]
                })),
                tool("end_gesture", "Commit the open gesture as one undoable step", &json!({
                    "type": "object",
                    "properties": { "cancelled": { "type": "boolean" } }
                })),
                tool("select", "Select a pedal or the amp; omit target to clear", &json!({
                    "type": "object",
                    "properties": { "target": target }
                })),
                tool("undo", "Step back one edit", &none),
                tool("redo", "Step forward one edit", &none),
                tool("set_details", "Set title, artist, instrument, genre, tags, bpm, releaseYear, coverImage", &json!({
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "artist": { "type": "string" },
                        "instrument": { "type": "string", "enum": ["Electric Guitar", "Bass Guitar", "Synth", "Acoustic Guitar"] },
                        "genre": { "type": "string" },
                        "tags": { "type": "array", "items": { "type": "string" } },
                        "bpm": { "type": "integer" },
                        "releaseYear": { "type": "integer" },
                        "coverImage": { "type": "string" }
                    }
                })),
                tool("publish", "Publish the current chain and details to the setup library", &none),
                tool("load_setup", "Clone a published setup into the editor (undoable)", &json!({
                    "type": "object",
                    "properties": { "id": { "type": "string" } },
                    "required": ["id"]
                })),
                tool("save_setup", "Save a published setup to your own collection", &json!({
                    "type": "object",
                    "properties": { "id": { "type": "string" } },
                    "required": ["id"]
                })),
                tool("request_welcome", "Ask the assistant for a welcome line; first_name marks a new member", &json!({
                    "type": "object",
                    "properties": {
                        "first_name": { "type": "string" },
                        "inspirations": { "type": "string" }
                    }
                })),
                tool("request_critique", "Ask the assistant for one pedal to add", &none),
                tool("request_blueprint", "Ask the assistant for a rig matching the song and artist in the details", &none),
                tool("apply_blueprint", "Build the offered blueprint into the chain (undoable)", &none)
            ]
        })
    }
}

/// `"amp"` or a pedal position under the "target" key
fn parse_target(args: &Value) -> Result<Target, String> {
    match args.get("target") {
        Some(Value::String(s)) if s.eq_ignore_ascii_case("amp") => Ok(Target::Amp),
        Some(Value::String(s)) => s
            .parse::<usize>()
            .map(Target::Pedal)
            .map_err(|_| format!("Invalid target '{}'", s)),
        Some(v) => v
            .as_u64()
            .map(|n| Target::Pedal(n as usize))
            .ok_or_else(|| "target must be a pedal position or \"amp\"".to_string()),
        None => Err("target is required".to_string()),
    }
}

fn setups_json(records: anyhow::Result<Vec<SetupRecord>>) -> Value {
    match records {
        Ok(records) => {
            let setups: Vec<Value> = records
                .iter()
                .map(|r| {
                    json!({
                        "id": r.id,
                        "title": r.title,
                        "artist": r.artist,
                        "creator": r.creator,
                        "instrument": r.instrument,
                        "genre": r.genre,
                        "likes": r.likes,
                        "pedals": r.chain.len(),
                        "updated_at": r.updated_at
                    })
                })
                .collect();
            json!({ "status": "ok", "count": setups.len(), "setups": setups })
        }
        Err(e) => error_json(format!("{:#}", e)),
    }
}

fn error_json(message: impl Into<String>) -> Value {
    json!({ "status": "error", "message": message.into() })
}

fn outcome_json(outcome: Outcome) -> Value {
    match outcome {
        Ok(Value::Object(mut obj)) => {
            obj.insert("status".into(), json!("ok"));
            Value::Object(obj)
        }
        Ok(other) => json!({ "status": "ok", "result": other }),
        Err(message) => error_json(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_parse() {
        assert_eq!(parse_target(&json!({ "target": "amp" })), Ok(Target::Amp));
        assert_eq!(parse_target(&json!({ "target": 2 })), Ok(Target::Pedal(2)));
        assert_eq!(parse_target(&json!({ "target": "1" })), Ok(Target::Pedal(1)));
        assert!(parse_target(&json!({ "target": -1 })).is_err());
        assert!(parse_target(&json!({})).is_err());
    }

    #[test]
    fn outcomes_carry_status() {
        let ok = outcome_json(Ok(json!({ "moved": true })));
        assert_eq!(ok["status"], "ok");
        assert_eq!(ok["moved"], true);
        let err = outcome_json(Err("nope".into()));
        assert_eq!(err["status"], "error");
        assert_eq!(err["message"], "nope");
    }

    #[test]
    fn read_tools_and_argument_errors() {
        use crate::app::App;
        use crate::assist::OfflineAssistant;
        use crate::config::Settings;
        use crate::session::EditorSession;

        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings {
            library_dir: tmp.path().to_path_buf(),
            ..Settings::default()
        };
        let app = App::new(&settings, EditorSession::empty(), Box::new(OfflineAssistant)).unwrap();
        let rpc = RigRpc::new(
            app.command_sender(),
            app.event_log(),
            app.view(),
            SetupLibrary::new(tmp.path()),
            "Musician".to_string(),
        );

        // Rejected before anything is sent to the editor
        assert_eq!(rpc.handle_tool_call("remove_pedal", &json!({}))["status"], "error");
        let bad = json!({ "position": 0, "direction": "up" });
        assert_eq!(rpc.handle_tool_call("move_pedal", &bad)["status"], "error");
        assert_eq!(
            rpc.handle_tool_call("nope", &json!({}))["message"],
            "Unknown tool: nope"
        );

        let state = rpc.get_state();
        assert_eq!(state["chain"]["amplifier"]["name"], "JCM800");
        assert_eq!(state["summary"], "straight into Marshall JCM800");

        let catalog = rpc.list_catalog("mxr", None, None);
        let groups = catalog["pedals"].as_array().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0]["category"], "Dynamics");
        assert!(catalog["amps"].as_array().unwrap().is_empty());

        assert_eq!(rpc.list_setups()["count"], 0);
        assert_eq!(rpc.list_saved()["count"], 0);
        assert_eq!(rpc.handle_tool_call("save_setup", &json!({}))["status"], "error");
        assert_eq!(rpc.get_events(0)["events"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn every_listed_tool_has_a_schema() {
        let tools = RigRpc::list_tools();
        let tools = tools["tools"].as_array().unwrap();
        assert!(tools.len() > 25);
        for t in tools {
            assert!(t["name"].is_string());
            assert_eq!(t["inputSchema"]["type"], "object");
        }
    }
}
