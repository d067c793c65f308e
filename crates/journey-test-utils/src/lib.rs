//! Testing utilities for the journey workspace
//!
//! Shared fixtures: a recording user surface, seeded in-memory gateways
//! and controllers wired to them.

#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use journey_core::gateway::Row;
use journey_core::{
    seed_demo, Collection, DemoJourney, Gateway, InMemoryGateway, JourneyController, Notice,
    RecordId, UserSurface,
};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

/// Surface that records every alert and confirmation prompt
#[derive(Debug)]
pub struct RecordingSurface {
    answer: Mutex<bool>,
    notices: Mutex<Vec<Notice>>,
    prompts: Mutex<Vec<String>>,
}

impl RecordingSurface {
    /// Surface that answers every confirmation with `answer`
    pub fn new(answer: bool) -> Self {
        Self {
            answer: Mutex::new(answer),
            notices: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn set_answer(&self, answer: bool) {
        *self.answer.lock() = answer;
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notices.lock().iter().map(|n| n.message.clone()).collect()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new(true)
    }
}

impl UserSurface for RecordingSurface {
    fn alert(&self, notice: &Notice) {
        self.notices.lock().push(notice.clone());
    }

    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().push(prompt.to_string());
        *self.answer.lock()
    }
}

/// Controller plus the handles a test needs to inspect it
pub struct Fixture {
    pub gateway: Arc<InMemoryGateway>,
    pub surface: Arc<RecordingSurface>,
    pub controller: JourneyController,
}

/// Controller over an empty in-memory store
pub fn empty_fixture() -> Fixture {
    let gateway = Arc::new(InMemoryGateway::new());
    let surface = Arc::new(RecordingSurface::default());
    let dyn_gateway: Arc<dyn Gateway> = gateway.clone();
    let dyn_surface: Arc<dyn UserSurface> = surface.clone();
    let controller = JourneyController::new(Some(dyn_gateway), dyn_surface);
    Fixture {
        gateway,
        surface,
        controller,
    }
}

/// Controller over the demo journey, already refreshed
pub async fn demo_fixture() -> (Fixture, DemoJourney) {
    let fixture = empty_fixture();
    let demo = seed_demo(fixture.gateway.as_ref()).await.unwrap();
    fixture.controller.refresh().await;
    (fixture, demo)
}

/// Controller with no gateway
pub fn unconfigured_fixture() -> (Arc<RecordingSurface>, JourneyController) {
    let surface = Arc::new(RecordingSurface::default());
    let dyn_surface: Arc<dyn UserSurface> = surface.clone();
    (surface, JourneyController::new(None, dyn_surface))
}

/// Audit row for a step
pub fn audit_row(step_id: &RecordId, created_at: DateTime<Utc>, change: &str) -> Row {
    let value = json!({
        "step_id": step_id.as_str(),
        "change_description": change,
        "changed_by": "test",
        "created_at": created_at,
    });
    match value {
        serde_json::Value::Object(row) => row,
        _ => unreachable!(),
    }
}

/// Load audit rows, bypassing the read-only check
pub fn load_audits(gateway: &InMemoryGateway, rows: impl IntoIterator<Item = Row>) {
    gateway.load_rows(Collection::JourneyAudits, rows);
}
