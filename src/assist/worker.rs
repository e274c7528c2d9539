use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use super::ToneAssistant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistKind {
    Welcome,
    Critique,
    Blueprint,
}

#[derive(Debug, Clone)]
struct AssistRequest {
    /// Increases per request; replies to older tickets are stale
    pub ticket: u64,
    pub kind: AssistKind,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct AssistReply {
    pub ticket: u64,
    pub kind: AssistKind,
    pub result: Result<String, String>,
}

/// Background thread running assistant calls one at a time
pub struct AssistWorker {
    requests: Option<Sender<AssistRequest>>,
    replies: Receiver<AssistReply>,
    next_ticket: u64,
    handle: Option<JoinHandle<()>>,
}

impl AssistWorker {
    pub fn spawn(assistant: Box<dyn ToneAssistant>) -> std::io::Result<Self> {
        let (req_tx, req_rx) = unbounded::<AssistRequest>();
        let (reply_tx, reply_rx) = unbounded::<AssistReply>();

        let handle = thread::Builder::new()
            .name("assist".into())
            .spawn(move || {
                for req in req_rx.iter() {
                    let result = assistant.generate(&req.prompt).map_err(|e| format!("{:#}", e));
                    if let Err(e) = &result {
                        log::warn!("assistant {:?} request failed: {}", req.kind, e);
                    }
                    let reply = AssistReply {
                        ticket: req.ticket,
                        kind: req.kind,
                        result,
                    };
                    if reply_tx.send(reply).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            requests: Some(req_tx),
            replies: reply_rx,
            next_ticket: 0,
            handle: Some(handle),
        })
    }

    /// Queue a request. Returns its ticket.
    pub fn submit(&mut self, kind: AssistKind, prompt: String) -> u64 {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let sent = self.requests.as_ref().map(|tx| {
            tx.send(AssistRequest {
                ticket,
                kind,
                prompt,
            })
        });
        if !matches!(sent, Some(Ok(()))) {
            log::warn!("assistant worker is gone, dropping {:?} request", kind);
        }
        ticket
    }

    /// Replies that have arrived since the last call
    pub fn drain(&self) -> Vec<AssistReply> {
        self.replies.try_iter().collect()
    }
}

impl Drop for AssistWorker {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
