//! Scripted providers, event sinks, and fixtures shared by wand tests.

mod provider;

pub use provider::{
    FailingProvider, FixedProvider, GatedProvider, ScriptedProvider, TripwireProvider,
};

use parking_lot::Mutex;
use std::sync::Arc;
use wand_rs_protocol::{EventSink, Record, Role, RunEvent, RunEventPayload};

/// Records every event it receives.
#[derive(Clone, Default)]
pub struct CollectingSink {
    events: Arc<Mutex<Vec<RunEvent>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().clone()
    }

    pub fn payloads(&self) -> Vec<RunEventPayload> {
        self.events
            .lock()
            .iter()
            .map(|event| event.payload.clone())
            .collect()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: RunEvent) {
        self.events.lock().push(event);
    }
}

/// Small transcript touching every role.
pub fn sample_records() -> Vec<Record> {
    vec![
        Record::new(Role::User, "Ship it to 12 Mian Street"),
        Record::new(Role::Assistant, "Sure, I will ship 3 boxes."),
        Record::new(Role::Tool, "{\"status\":\"ok\"}"),
        Record::new(Role::User, "My number is 555-01OO"),
    ]
}
