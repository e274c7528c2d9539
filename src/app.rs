use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::json;

use crate::assist::{prompt, AssistKind, AssistReply, AssistWorker, Blueprint, ToneAssistant};
use crate::command::{Command, CommandBus, CommandReceiver, CommandSender, CommandSource, Outcome};
use crate::config::{Settings, UserIdentity};
use crate::event::{now_millis, EventLog};
use crate::library::{SetupDetails, SetupLibrary, SetupRecord};
use crate::rig::{Chain, PedalInstance, Selection};
use crate::rpc::{start_socket_server, RigRpc};
use crate::session::{EditorSession, NoticeKind, ASSIST_FALLBACK};

/// How long the host waits on the bus before checking assistant replies
const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Serialize)]
pub struct NoticeView {
    pub text: String,
    pub kind: NoticeKind,
}

/// Read-only snapshot of the editor, republished after every command
#[derive(Debug, Clone, Serialize)]
pub struct EditorView {
    pub chain: Chain,
    pub selection: Selection,
    /// The pedal the parameter panel is showing, if a pedal is selected
    pub selected_pedal: Option<PedalInstance>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub history_len: usize,
    pub history_cursor: usize,
    pub gesture_active: bool,
    pub details: SetupDetails,
    pub suggestion: Option<String>,
    pub blueprint: Option<Blueprint>,
    pub notice: Option<NoticeView>,
    /// Assistant requests still in flight
    pub assisting: Vec<AssistKind>,
}

impl EditorView {
    fn capture(session: &EditorSession, assisting: Vec<AssistKind>) -> Self {
        let history = session.history();
        Self {
            chain: session.chain().clone(),
            selection: session.selection(),
            selected_pedal: session.selection().selected_pedal(session.chain()).cloned(),
            can_undo: history.can_undo(),
            can_redo: history.can_redo(),
            history_len: history.len(),
            history_cursor: history.cursor(),
            gesture_active: session.gesture_active(),
            details: session.details().clone(),
            suggestion: session.suggestion().map(str::to_string),
            blueprint: session.blueprint().cloned(),
            notice: session.notice(Instant::now()).map(|n| NoticeView {
                text: n.text.clone(),
                kind: n.kind,
            }),
            assisting,
        }
    }
}

/// Editor host: owns the session and applies commands one at a time
pub struct App {
    session: EditorSession,
    library: SetupLibrary,
    user: UserIdentity,
    style: String,
    assistant: AssistWorker,
    /// Latest ticket per request kind; older replies are stale
    pending: HashMap<AssistKind, u64>,
    command_sender: CommandSender,
    commands: CommandReceiver,
    event_log: Arc<RwLock<EventLog>>,
    view: Arc<RwLock<EditorView>>,
    should_quit: bool,
    rpc_shutdown: Arc<AtomicBool>,
}

impl App {
    pub fn new(
        settings: &Settings,
        session: EditorSession,
        assistant: Box<dyn ToneAssistant>,
    ) -> Result<Self> {
        let bus = CommandBus::new();
        let view = EditorView::capture(&session, Vec::new());
        Ok(Self {
            session,
            library: SetupLibrary::new(&settings.library_dir),
            user: settings.user.clone(),
            style: settings.assistant.style.clone(),
            assistant: AssistWorker::spawn(assistant)?,
            pending: HashMap::new(),
            command_sender: bus.sender(),
            commands: bus.receiver(),
            event_log: Arc::new(RwLock::new(EventLog::new())),
            view: Arc::new(RwLock::new(view)),
            should_quit: false,
            rpc_shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get a clone of the command sender (for RPC)
    pub fn command_sender(&self) -> CommandSender {
        self.command_sender.clone()
    }

    pub fn event_log(&self) -> Arc<RwLock<EventLog>> {
        self.event_log.clone()
    }

    pub fn view(&self) -> Arc<RwLock<EditorView>> {
        self.view.clone()
    }

    /// Start the JSON-RPC socket server on `socket_path`
    pub fn serve(&self, socket_path: &Path) -> Result<()> {
        let rpc = Arc::new(RigRpc::new(
            self.command_sender(),
            self.event_log(),
            self.view(),
            SetupLibrary::new(self.library.dir()),
            self.user.name.clone(),
        ));
        start_socket_server(rpc, socket_path, self.rpc_shutdown.clone())
    }

    /// Drain commands until a Shutdown arrives
    pub fn run(&mut self) -> Result<()> {
        log::info!("editor ready: {}", self.session.chain().describe());
        while !self.should_quit {
            if let Some(envelope) = self.commands.recv_timeout(POLL_INTERVAL) {
                let outcome = self.apply(envelope.command.clone(), envelope.source);
                envelope.respond(outcome);
                // Apply whatever else queued up before republishing
                while let Some(envelope) = self.commands.try_recv() {
                    let outcome = self.apply(envelope.command.clone(), envelope.source);
                    envelope.respond(outcome);
                }
            }
            self.poll_assistant();
            self.publish();
        }
        self.rpc_shutdown.store(true, Ordering::Relaxed);
        log::info!("editor shut down");
        Ok(())
    }

    fn publish(&self) {
        let assisting: Vec<AssistKind> = self.pending.keys().copied().collect();
        *self.view.write() = EditorView::capture(&self.session, assisting);
    }

    /// Apply one command to the session. A failed command changes nothing.
    pub fn apply(&mut self, cmd: Command, source: CommandSource) -> Outcome {
        log::debug!("{:?}: {}", source, cmd.description());
        let outcome = self.execute(cmd.clone());
        match &outcome {
            Ok(_) => self.event_log.write().log(cmd, source),
            Err(e) => log::debug!("rejected: {}", e),
        }
        outcome
    }

    fn execute(&mut self, cmd: Command) -> Outcome {
        let s = &mut self.session;
        match cmd {
            Command::AddPedal { template_id } => {
                let position = s.add_pedal(&template_id).map_err(|e| e.to_string())?;
                let id = s.chain().pedals[position].id.clone();
                Ok(json!({ "position": position, "id": id }))
            }
            Command::RemovePedal(p) => {
                s.remove_pedal(p).map_err(|e| e.to_string())?;
                Ok(json!({ "len": s.chain().len() }))
            }
            Command::MovePedal {
                position,
                direction,
            } => {
                s.move_pedal(position, direction).map_err(|e| e.to_string())?;
                Ok(json!({ "order": pedal_ids(s.chain()) }))
            }
            Command::ReorderPedal { from, to } => {
                s.reorder_pedal(from, to).map_err(|e| e.to_string())?;
                Ok(json!({ "order": pedal_ids(s.chain()) }))
            }
            Command::ToggleBypass(target) => {
                let bypassed = s.toggle_bypass(target).map_err(|e| e.to_string())?;
                Ok(json!({ "bypassed": bypassed }))
            }
            Command::SetParam { target, key, value } => {
                let stored = s.set_param(target, &key, value).map_err(|e| e.to_string())?;
                Ok(json!({ "key": key, "value": stored }))
            }
            Command::SetNotes { target, notes } => {
                s.set_notes(target, notes.as_deref()).map_err(|e| e.to_string())?;
                Ok(json!({}))
            }
            Command::AutoArrange => {
                s.auto_arrange();
                Ok(json!({ "order": pedal_ids(s.chain()) }))
            }
            Command::ClearChain => {
                s.clear_chain();
                Ok(json!({}))
            }
            Command::SetAmplifier { template_id } => {
                s.set_amplifier(&template_id).map_err(|e| e.to_string())?;
                Ok(json!({ "amplifier": s.chain().amplifier.name }))
            }
            Command::SelectChannel(name) => {
                s.select_channel(&name).map_err(|e| e.to_string())?;
                Ok(json!({ "channel": name }))
            }
            Command::SelectVariant(name) => {
                s.select_variant(&name).map_err(|e| e.to_string())?;
                Ok(json!({ "variant": name }))
            }
            Command::BeginGesture => {
                s.begin_gesture();
                Ok(json!({}))
            }
            Command::GestureSet { target, key, value } => {
                let value = s.gesture_set(target, &key, value).map_err(|e| e.to_string())?;
                Ok(json!({ "key": key, "value": value }))
            }
            Command::GestureDrag {
                target,
                key,
                start,
                delta_px,
            } => {
                let value = s
                    .gesture_drag(target, &key, start, delta_px)
                    .map_err(|e| e.to_string())?;
                Ok(json!({ "key": key, "value": value }))
            }
            Command::EndGesture(end) => {
                let committed = s.end_gesture(end).map_err(|e| e.to_string())?;
                Ok(json!({ "committed": committed }))
            }
            Command::Select(selection) => {
                s.select(selection).map_err(|e| e.to_string())?;
                Ok(json!({ "selection": s.selection() }))
            }
            Command::Undo => Ok(json!({ "moved": s.undo() })),
            Command::Redo => Ok(json!({ "moved": s.redo() })),
            Command::SetDetails(details) => {
                s.set_details(details);
                Ok(json!({}))
            }
            Command::Publish => self.publish_setup(),
            Command::LoadSetup(id) => self.load_setup(&id),
            Command::SaveSetup(id) => self.save_setup(&id),
            Command::RequestWelcome {
                first_name,
                inspirations,
            } => {
                let text = match first_name.as_deref() {
                    Some(name) => prompt::welcome_new(name, &inspirations),
                    None => prompt::welcome_back(),
                };
                Ok(self.ask(AssistKind::Welcome, text))
            }
            Command::RequestCritique => {
                let text = prompt::critique(self.session.chain(), &self.style);
                self.session.clear_suggestion();
                Ok(self.ask(AssistKind::Critique, text))
            }
            Command::RequestBlueprint => {
                let d = self.session.details();
                if d.title.trim().is_empty() || d.artist.trim().is_empty() {
                    return Err("Set a song title and artist first".to_string());
                }
                let text = prompt::blueprint(&d.title, &d.artist, d.instrument.label());
                // The old offer belongs to a different song
                self.session.withdraw_blueprint();
                Ok(self.ask(AssistKind::Blueprint, text))
            }
            Command::ApplyBlueprint => {
                if !self.session.apply_blueprint() {
                    return Err("No blueprint to apply".to_string());
                }
                Ok(json!({ "len": self.session.chain().len() }))
            }
            Command::Shutdown => {
                self.should_quit = true;
                Ok(json!({}))
            }
        }
    }

    fn publish_setup(&mut self) -> Outcome {
        let details = self.session.details();
        if details.title.trim().is_empty() {
            return Err("Give the setup a title before publishing".to_string());
        }
        let now = now_millis();
        let id = self.library.next_id(now);
        let record = SetupRecord::from_chain(id.clone(), self.session.chain(), details, &self.user, now);
        match self.library.publish(&record) {
            Ok(()) => {
                self.session
                    .notify(format!("Setup for \"{}\" saved!", record.title), NoticeKind::Success);
                Ok(json!({ "id": id }))
            }
            Err(e) => {
                log::warn!("publish failed: {:#}", e);
                self.session.notify("Could not publish setup", NoticeKind::Error);
                Err(format!("{:#}", e))
            }
        }
    }

    /// Clone a published setup into the editor as one undoable step
    fn load_setup(&mut self, id: &str) -> Outcome {
        let record = self.library.get(id).map_err(|e| format!("{:#}", e))?;
        self.session.replace_chain(record.to_chain());
        self.session.set_details(record.details());
        self.session
            .notify(format!("Loaded \"{}\"", record.title), NoticeKind::Info);
        Ok(json!({ "id": record.id, "len": record.chain.len() }))
    }

    /// Add a community setup to the user's collection. Saving twice is not an
    /// error, it only tells the user the setup is already there.
    fn save_setup(&mut self, id: &str) -> Outcome {
        let record = self.library.get(id).map_err(|e| format!("{:#}", e))?;
        let added = self
            .library
            .save(&self.user.name, &record.id)
            .map_err(|e| format!("{:#}", e))?;
        if added {
            self.session
                .notify(format!("Tone \"{}\" saved!", record.title), NoticeKind::Success);
        } else {
            self.session.notify(
                format!("\"{}\" is already in your library.", record.title),
                NoticeKind::Info,
            );
        }
        Ok(json!({ "id": record.id, "saved": added }))
    }

    fn ask(&mut self, kind: AssistKind, prompt: String) -> serde_json::Value {
        let ticket = self.assistant.submit(kind, prompt);
        self.pending.insert(kind, ticket);
        json!({ "ticket": ticket })
    }

    fn poll_assistant(&mut self) {
        for reply in self.assistant.drain() {
            self.handle_reply(reply);
        }
    }

    fn handle_reply(&mut self, reply: AssistReply) {
        if self.pending.get(&reply.kind) != Some(&reply.ticket) {
            log::debug!("ignoring stale {:?} reply #{}", reply.kind, reply.ticket);
            return;
        }
        self.pending.remove(&reply.kind);

        let s = &mut self.session;
        match (reply.kind, reply.result) {
            (AssistKind::Welcome, Ok(text)) => s.notify(text, NoticeKind::Success),
            (AssistKind::Critique, Ok(text)) => s.set_suggestion(text),
            (AssistKind::Blueprint, Ok(text)) => match Blueprint::parse(&text) {
                Ok(blueprint) => {
                    s.offer_blueprint(blueprint);
                    s.notify("Blueprint ready", NoticeKind::Info);
                }
                Err(e) => {
                    log::warn!("unusable blueprint: {:#}", e);
                    s.set_suggestion(ASSIST_FALLBACK);
                    s.notify(ASSIST_FALLBACK, NoticeKind::Error);
                }
            },
            (AssistKind::Welcome, Err(_)) => s.notify(ASSIST_FALLBACK, NoticeKind::Error),
            (_, Err(_)) => {
                s.set_suggestion(ASSIST_FALLBACK);
                s.notify(ASSIST_FALLBACK, NoticeKind::Error);
            }
        }
    }
}

fn pedal_ids(chain: &Chain) -> Vec<&str> {
    chain.pedals.iter().map(|p| p.id.as_str()).collect()
}
