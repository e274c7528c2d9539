use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::now_millis;
use crate::command::{Command, CommandSource};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub timestamp: u64,
    pub source: CommandSource,
    pub command: Command,
}

/// Ring buffer of applied edits, so RPC clients can follow along
pub struct EventLog {
    events: VecDeque<Event>,
    next_id: u64,
    max_events: usize,
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(500)
    }

    pub fn with_capacity(max_events: usize) -> Self {
        Self {
            events: VecDeque::new(),
            next_id: 1,
            max_events: max_events.max(1),
        }
    }

    /// Log a command as an event
    pub fn log(&mut self, command: Command, source: CommandSource) {
        if !command.is_loggable() {
            return;
        }

        let event = Event {
            id: self.next_id,
            timestamp: now_millis(),
            source,
            command,
        };

        self.next_id += 1;
        self.events.push_back(event);

        // Trim old events
        while self.events.len() > self.max_events {
            self.events.pop_front();
        }
    }

    /// Get all events since a given ID
    pub fn get_events_since(&self, since_id: u64) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| e.id > since_id)
            .cloned()
            .collect()
    }

    /// Get the latest event ID
    pub fn latest_id(&self) -> u64 {
        self.events.back().map(|e| e.id).unwrap_or(0)
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
