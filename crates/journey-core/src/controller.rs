//! Journey controller
//!
//! Owns the application state for the journey view and runs every
//! mutation through the same template:
//! 1. Check the gateway is configured
//! 2. Validate required fields locally
//! 3. Issue one gateway write
//! 4. On error, alert the user and abort (editors stay open for a retry)
//! 5. On success, refetch the whole tree and close the editor involved
//!
//! The in-memory tree is never patched locally; it is always the result
//! of the last full fetch.

use crate::aggregate::fetch_journey_graph;
use crate::config::{JourneyConfig, Placeholders};
use crate::demo::{seed_demo, DemoJourney};
use crate::editor::{
    ChildEditor, InlineAction, InlineEditor, InlineField, InlineTarget, KeyInput, MetricDraft,
    PainPointDraft, TouchpointDraft,
};
use crate::error::{ConfigError, GatewayError, JourneyError};
use crate::gateway::{to_row, Collection, Gateway, MatchSpec, RestGateway, Row};
use crate::surface::{Notice, UserSurface};
use crate::types::{JourneyStage, JourneyStep, Persona, PersonaStep, RecordId};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// State of the journey view
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Stages as of the last fetch
    pub stages: Vec<JourneyStage>,
    /// Personas as of the last fetch
    pub personas: Vec<Persona>,
    /// At least one fetch is in flight
    pub loading: bool,
    in_flight: usize,
    pub inline_editor: Option<InlineEditor>,
    pub child_editor: Option<ChildEditor>,
    /// Most recent notice shown to the user
    pub last_notice: Option<Notice>,
}

impl AppState {
    /// Find a stage
    #[must_use]
    pub fn stage(&self, id: &RecordId) -> Option<&JourneyStage> {
        self.stages.iter().find(|s| s.id() == id)
    }

    /// Find a step anywhere in the tree
    #[must_use]
    pub fn step(&self, id: &RecordId) -> Option<&JourneyStep> {
        self.stages.iter().find_map(|s| s.step(id))
    }

    /// Find a persona
    #[must_use]
    pub fn persona(&self, id: &RecordId) -> Option<&Persona> {
        self.personas.iter().find(|p| &p.id == id)
    }
}

/// Outcome of a persona toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonaToggle {
    Added,
    Removed,
}

#[derive(Serialize)]
struct NewStage<'a> {
    name: &'a str,
    order: i64,
}

#[derive(Serialize)]
struct NewStep<'a> {
    stage_id: &'a RecordId,
    user_action: &'a str,
    user_goal: &'a str,
}

/// Root controller for the journey view
pub struct JourneyController {
    gateway: Option<Arc<dyn Gateway>>,
    surface: Arc<dyn UserSurface>,
    placeholders: Placeholders,
    state: RwLock<AppState>,
}

impl fmt::Debug for JourneyController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JourneyController")
            .field("configured", &self.gateway.is_some())
            .field("placeholders", &self.placeholders)
            .finish_non_exhaustive()
    }
}

impl JourneyController {
    /// Create controller; `None` gateway means unconfigured
    #[must_use]
    pub fn new(gateway: Option<Arc<dyn Gateway>>, surface: Arc<dyn UserSurface>) -> Self {
        Self {
            gateway,
            surface,
            placeholders: Placeholders::default(),
            state: RwLock::new(AppState::default()),
        }
    }

    /// Build from configuration, using the HTTP gateway when credentials exist
    ///
    /// # Errors
    /// - `ConfigError::InvalidUrl` if the configured URL is unusable
    pub fn from_config(
        config: &JourneyConfig,
        surface: Arc<dyn UserSurface>,
    ) -> Result<Self, ConfigError> {
        let gateway = gateway_from_config(config)?;
        Ok(Self::new(gateway, surface).with_placeholders(config.placeholders.clone()))
    }

    /// With placeholder texts
    #[inline]
    #[must_use]
    pub fn with_placeholders(mut self, placeholders: Placeholders) -> Self {
        self.placeholders = placeholders;
        self
    }

    /// Whether a gateway is available
    #[inline]
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.gateway.is_some()
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn state(&self) -> AppState {
        self.state.read().clone()
    }

    /// Read the state without cloning it
    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.state.read())
    }

    // ---- aggregation ----

    /// Refetch the whole journey and replace the tree
    ///
    /// Returns `true` when both stages and personas were fetched. A failed
    /// collection is left empty. The last fetch to finish wins, and
    /// `loading` stays set until every overlapping fetch has finished.
    pub async fn refresh(&self) -> bool {
        let Some(gateway) = self.gateway.clone() else {
            tracing::warn!("refresh skipped: gateway not configured");
            self.state.write().loading = false;
            return false;
        };

        {
            let mut state = self.state.write();
            state.in_flight += 1;
            state.loading = true;
        }
        let graph = fetch_journey_graph(gateway.as_ref()).await;
        let complete = graph.is_complete();

        let mut state = self.state.write();
        state.stages = graph.stages;
        state.personas = graph.personas;
        state.in_flight = state.in_flight.saturating_sub(1);
        state.loading = state.in_flight > 0;
        drop(state);

        tracing::info!(complete, "journey refreshed");
        complete
    }

    // ---- stages ----

    /// Insert a placeholder stage at the end
    ///
    /// # Errors
    /// - `JourneyError::NotConfigured`, `JourneyError::Gateway`
    pub async fn add_stage(&self) -> Result<RecordId, JourneyError> {
        const OP: &str = "Add stage";
        let gateway = self.gateway(OP)?;
        let order = i64::try_from(self.state.read().stages.len()).unwrap_or(i64::MAX - 1) + 1;
        let record = self.row(
            OP,
            Collection::Stages,
            &NewStage {
                name: &self.placeholders.stage_name,
                order,
            },
        )?;

        let result = gateway.insert(Collection::Stages, record).await;
        let id = self.settle(OP, result)?;
        tracing::info!(%id, order, "stage added");
        self.refresh().await;
        Ok(id)
    }

    /// Delete a stage and, through the store's cascade, everything under it
    ///
    /// Returns `false` if the user declined the confirmation.
    ///
    /// # Errors
    /// - `JourneyError::NotConfigured`, `JourneyError::Gateway`
    pub async fn delete_stage(&self, id: &RecordId) -> Result<bool, JourneyError> {
        const OP: &str = "Delete stage";
        let gateway = self.gateway(OP)?;
        let name = self
            .read(|s| s.stage(id).map(|st| st.stage.name.clone()))
            .unwrap_or_else(|| id.to_string());
        if !self
            .surface
            .confirm(&format!("Delete stage \"{name}\" and all of its steps?"))
        {
            return Ok(false);
        }

        let result = gateway
            .delete(Collection::Stages, MatchSpec::id(id.clone()))
            .await;
        self.settle(OP, result)?;
        tracing::info!(%id, "stage deleted");
        self.refresh().await;
        Ok(true)
    }

    /// Rename a stage; the text is written even when unchanged or empty
    ///
    /// # Errors
    /// - `JourneyError::NotConfigured`, `JourneyError::Gateway`
    pub async fn rename_stage(&self, id: &RecordId, name: &str) -> Result<(), JourneyError> {
        self.update_field("Rename stage", InlineTarget::stage_name(id.clone()), name)
            .await
    }

    // ---- steps ----

    /// Insert a placeholder step under a stage
    ///
    /// # Errors
    /// - `JourneyError::NotConfigured`, `JourneyError::Gateway`
    pub async fn add_step(&self, stage_id: &RecordId) -> Result<RecordId, JourneyError> {
        const OP: &str = "Add step";
        let gateway = self.gateway(OP)?;
        let record = self.row(
            OP,
            Collection::Steps,
            &NewStep {
                stage_id,
                user_action: &self.placeholders.step_action,
                user_goal: &self.placeholders.step_goal,
            },
        )?;

        let result = gateway.insert(Collection::Steps, record).await;
        let id = self.settle(OP, result)?;
        tracing::info!(%id, %stage_id, "step added");
        self.refresh().await;
        Ok(id)
    }

    /// Delete a step and its children after confirmation
    ///
    /// Returns `false` if the user declined.
    ///
    /// # Errors
    /// - `JourneyError::NotConfigured`, `JourneyError::Gateway`
    pub async fn delete_step(&self, id: &RecordId) -> Result<bool, JourneyError> {
        const OP: &str = "Delete step";
        let gateway = self.gateway(OP)?;
        let action = self
            .read(|s| s.step(id).map(|st| st.step.user_action.clone()))
            .unwrap_or_else(|| id.to_string());
        if !self
            .surface
            .confirm(&format!("Delete step \"{action}\" with its pain points, touchpoints and metrics?"))
        {
            return Ok(false);
        }

        let result = gateway
            .delete(Collection::Steps, MatchSpec::id(id.clone()))
            .await;
        self.settle(OP, result)?;
        tracing::info!(%id, "step deleted");
        self.refresh().await;
        Ok(true)
    }

    /// Set a step's user action
    ///
    /// # Errors
    /// - `JourneyError::NotConfigured`, `JourneyError::Gateway`
    pub async fn update_step_action(&self, id: &RecordId, text: &str) -> Result<(), JourneyError> {
        self.update_field("Update user action", InlineTarget::step_action(id.clone()), text)
            .await
    }

    /// Set a step's user goal
    ///
    /// # Errors
    /// - `JourneyError::NotConfigured`, `JourneyError::Gateway`
    pub async fn update_step_goal(&self, id: &RecordId, text: &str) -> Result<(), JourneyError> {
        self.update_field("Update user goal", InlineTarget::step_goal(id.clone()), text)
            .await
    }

    async fn update_field(
        &self,
        operation: &'static str,
        target: InlineTarget,
        text: &str,
    ) -> Result<(), JourneyError> {
        let gateway = self.gateway(operation)?;
        let collection = match target.field {
            InlineField::StageName => Collection::Stages,
            InlineField::StepAction | InlineField::StepGoal => Collection::Steps,
        };
        let mut patch = Row::new();
        patch.insert(target.field.column().to_string(), Value::from(text));

        let result = gateway.update(collection, target.id.clone(), patch).await;
        self.settle(operation, result)?;
        tracing::info!(id = %target.id, column = target.field.column(), "field updated");
        self.refresh().await;

        let mut state = self.state.write();
        if state.inline_editor.as_ref().is_some_and(|e| e.target == target) {
            state.inline_editor = None;
        }
        Ok(())
    }

    // ---- step children ----

    /// Insert or update a pain point
    ///
    /// # Errors
    /// - `JourneyError::Validation` if the description is blank
    /// - `JourneyError::NotConfigured`, `JourneyError::Gateway`
    pub async fn save_pain_point(&self, draft: PainPointDraft) -> Result<RecordId, JourneyError> {
        const OP: &str = "Save pain point";
        let gateway = self.gateway(OP)?;
        self.check(OP, draft.validate())?;
        let record = self.row(OP, Collection::PainPoints, &draft)?;
        self.upsert_child(OP, gateway.as_ref(), Collection::PainPoints, record)
            .await
    }

    /// Delete a pain point
    ///
    /// # Errors
    /// - `JourneyError::NotConfigured`, `JourneyError::Gateway`
    pub async fn delete_pain_point(&self, id: &RecordId) -> Result<(), JourneyError> {
        self.delete_child("Delete pain point", Collection::PainPoints, id)
            .await
    }

    /// Insert or update a touchpoint
    ///
    /// # Errors
    /// - `JourneyError::Validation` if the title is blank
    /// - `JourneyError::NotConfigured`, `JourneyError::Gateway`
    pub async fn save_touchpoint(&self, draft: TouchpointDraft) -> Result<RecordId, JourneyError> {
        const OP: &str = "Save touchpoint";
        let gateway = self.gateway(OP)?;
        self.check(OP, draft.validate())?;
        let record = self.row(OP, Collection::Touchpoints, &draft)?;
        self.upsert_child(OP, gateway.as_ref(), Collection::Touchpoints, record)
            .await
    }

    /// Delete a touchpoint
    ///
    /// # Errors
    /// - `JourneyError::NotConfigured`, `JourneyError::Gateway`
    pub async fn delete_touchpoint(&self, id: &RecordId) -> Result<(), JourneyError> {
        self.delete_child("Delete touchpoint", Collection::Touchpoints, id)
            .await
    }

    /// Insert or update a metric
    ///
    /// # Errors
    /// - `JourneyError::Validation` if the name is blank
    /// - `JourneyError::NotConfigured`, `JourneyError::Gateway`
    pub async fn save_metric(&self, draft: MetricDraft) -> Result<RecordId, JourneyError> {
        const OP: &str = "Save metric";
        let gateway = self.gateway(OP)?;
        self.check(OP, draft.validate())?;
        let record = self.row(OP, Collection::Metrics, &draft)?;
        self.upsert_child(OP, gateway.as_ref(), Collection::Metrics, record)
            .await
    }

    /// Delete a metric
    ///
    /// # Errors
    /// - `JourneyError::NotConfigured`, `JourneyError::Gateway`
    pub async fn delete_metric(&self, id: &RecordId) -> Result<(), JourneyError> {
        self.delete_child("Delete metric", Collection::Metrics, id)
            .await
    }

    async fn upsert_child(
        &self,
        operation: &'static str,
        gateway: &dyn Gateway,
        collection: Collection,
        record: Row,
    ) -> Result<RecordId, JourneyError> {
        let result = gateway.upsert(collection, record).await;
        let id = self.settle(operation, result)?;
        tracing::info!(%id, %collection, "record saved");
        self.refresh().await;
        self.state.write().child_editor = None;
        Ok(id)
    }

    async fn delete_child(
        &self,
        operation: &'static str,
        collection: Collection,
        id: &RecordId,
    ) -> Result<(), JourneyError> {
        let gateway = self.gateway(operation)?;
        let result = gateway.delete(collection, MatchSpec::id(id.clone())).await;
        self.settle(operation, result)?;
        tracing::info!(%id, %collection, "record deleted");
        self.refresh().await;
        Ok(())
    }

    // ---- personas ----

    /// Associate or dissociate a persona and a step
    ///
    /// The current tree decides the direction: an existing association is
    /// deleted, a missing one inserted.
    ///
    /// # Errors
    /// - `JourneyError::NotConfigured`, `JourneyError::Gateway`
    pub async fn toggle_persona(
        &self,
        step_id: &RecordId,
        persona_id: &RecordId,
    ) -> Result<PersonaToggle, JourneyError> {
        const OP: &str = "Update persona";
        let gateway = self.gateway(OP)?;
        let associated = self.read(|s| s.step(step_id).is_some_and(|st| st.has_persona(persona_id)));

        let toggle = if associated {
            let result = gateway
                .delete(
                    Collection::PersonaSteps,
                    MatchSpec::persona_step(persona_id, step_id),
                )
                .await;
            self.settle(OP, result)?;
            PersonaToggle::Removed
        } else {
            let link = PersonaStep {
                persona_id: persona_id.clone(),
                step_id: step_id.clone(),
            };
            let record = self.row(OP, Collection::PersonaSteps, &link)?;
            let result = gateway.insert(Collection::PersonaSteps, record).await;
            self.settle(OP, result)?;
            PersonaToggle::Added
        };

        tracing::info!(%step_id, %persona_id, ?toggle, "persona toggled");
        self.refresh().await;
        Ok(toggle)
    }

    // ---- demo ----

    /// Write the demo journey through the gateway, then refetch
    ///
    /// # Errors
    /// - `JourneyError::NotConfigured`, `JourneyError::Gateway`
    pub async fn seed_demo(&self) -> Result<DemoJourney, JourneyError> {
        const OP: &str = "Seed demo";
        let gateway = self.gateway(OP)?;
        let result = seed_demo(gateway.as_ref()).await;
        let demo = self.settle(OP, result)?;
        self.refresh().await;

        let notice = Notice::info(format!(
            "Seeded {} stages, {} steps and {} personas",
            demo.stages.len(),
            demo.steps.len(),
            demo.personas.len()
        ));
        self.state.write().last_notice = Some(notice.clone());
        self.surface.alert(&notice);
        Ok(demo)
    }

    // ---- inline editor ----

    /// Open an inline editor, replacing any open one without committing it
    pub fn begin_inline_edit(&self, target: InlineTarget, current_text: impl Into<String>) {
        self.state.write().inline_editor = Some(InlineEditor {
            target,
            draft: current_text.into(),
        });
    }

    /// Replace the inline draft text
    ///
    /// # Errors
    /// - `JourneyError::NoActiveEditor`
    pub fn update_inline_draft(&self, text: impl Into<String>) -> Result<(), JourneyError> {
        let mut state = self.state.write();
        let editor = state
            .inline_editor
            .as_mut()
            .ok_or(JourneyError::NoActiveEditor)?;
        editor.draft = text.into();
        Ok(())
    }

    /// Apply a key press to the inline editor
    ///
    /// # Errors
    /// - `JourneyError::NoActiveEditor`
    /// - any error of the committed operation (the editor stays open)
    pub async fn handle_inline_key(&self, key: KeyInput) -> Result<InlineAction, JourneyError> {
        let action = key.action();
        match action {
            InlineAction::Commit => self.commit_inline().await?,
            InlineAction::Discard => {
                let editor = self.state.write().inline_editor.take();
                if editor.is_none() {
                    return Err(JourneyError::NoActiveEditor);
                }
            }
            InlineAction::Continue => {
                if self.read(|s| s.inline_editor.is_none()) {
                    return Err(JourneyError::NoActiveEditor);
                }
            }
        }
        Ok(action)
    }

    /// Focus left the inline editor: commit it
    ///
    /// # Errors
    /// - `JourneyError::NoActiveEditor`
    /// - any error of the committed operation (the editor stays open)
    pub async fn blur_inline(&self) -> Result<(), JourneyError> {
        self.commit_inline().await
    }

    async fn commit_inline(&self) -> Result<(), JourneyError> {
        let editor = self.read(|s| s.inline_editor.clone());
        let editor = editor.ok_or(JourneyError::NoActiveEditor)?;
        let id = editor.target.id.clone();
        match editor.target.field {
            InlineField::StageName => self.rename_stage(&id, &editor.draft).await,
            InlineField::StepAction => self.update_step_action(&id, &editor.draft).await,
            InlineField::StepGoal => self.update_step_goal(&id, &editor.draft).await,
        }
    }

    // ---- child editor ----

    /// Open the pain point editor, blank or prefilled from an existing record
    ///
    /// # Errors
    /// - `JourneyError::NotFound` if `existing` is not under the step
    pub fn open_pain_point_editor(
        &self,
        step_id: &RecordId,
        existing: Option<&RecordId>,
    ) -> Result<(), JourneyError> {
        let draft = match existing {
            None => PainPointDraft::new(step_id.clone()),
            Some(id) => self
                .read(|s| {
                    s.step(step_id)
                        .and_then(|st| st.pain_points.iter().find(|p| &p.id == id))
                        .map(PainPointDraft::from)
                })
                .ok_or_else(|| not_found("pain point", id))?,
        };
        self.state.write().child_editor = Some(ChildEditor::PainPoint(draft));
        Ok(())
    }

    /// Open the touchpoint editor
    ///
    /// # Errors
    /// - `JourneyError::NotFound` if `existing` is not under the step
    pub fn open_touchpoint_editor(
        &self,
        step_id: &RecordId,
        existing: Option<&RecordId>,
    ) -> Result<(), JourneyError> {
        let draft = match existing {
            None => TouchpointDraft::new(step_id.clone()),
            Some(id) => self
                .read(|s| {
                    s.step(step_id)
                        .and_then(|st| st.touchpoints.iter().find(|t| &t.id == id))
                        .map(TouchpointDraft::from)
                })
                .ok_or_else(|| not_found("touchpoint", id))?,
        };
        self.state.write().child_editor = Some(ChildEditor::Touchpoint(draft));
        Ok(())
    }

    /// Open the metric editor
    ///
    /// # Errors
    /// - `JourneyError::NotFound` if `existing` is not under the step
    pub fn open_metric_editor(
        &self,
        step_id: &RecordId,
        existing: Option<&RecordId>,
    ) -> Result<(), JourneyError> {
        let draft = match existing {
            None => MetricDraft::new(step_id.clone()),
            Some(id) => self
                .read(|s| {
                    s.step(step_id)
                        .and_then(|st| st.metrics.iter().find(|m| &m.id == id))
                        .map(MetricDraft::from)
                })
                .ok_or_else(|| not_found("metric", id))?,
        };
        self.state.write().child_editor = Some(ChildEditor::Metric(draft));
        Ok(())
    }

    /// Edit the open child draft in place
    ///
    /// # Errors
    /// - `JourneyError::NoActiveEditor`
    pub fn update_child_draft(&self, f: impl FnOnce(&mut ChildEditor)) -> Result<(), JourneyError> {
        let mut state = self.state.write();
        let editor = state
            .child_editor
            .as_mut()
            .ok_or(JourneyError::NoActiveEditor)?;
        f(editor);
        Ok(())
    }

    /// Save the open child draft; the editor closes only on success
    ///
    /// # Errors
    /// - `JourneyError::NoActiveEditor`
    /// - any error of the save operation
    pub async fn save_child_editor(&self) -> Result<RecordId, JourneyError> {
        let editor = self.read(|s| s.child_editor.clone());
        match editor.ok_or(JourneyError::NoActiveEditor)? {
            ChildEditor::PainPoint(draft) => self.save_pain_point(draft).await,
            ChildEditor::Touchpoint(draft) => self.save_touchpoint(draft).await,
            ChildEditor::Metric(draft) => self.save_metric(draft).await,
        }
    }

    /// Discard the open child draft
    pub fn close_child_editor(&self) {
        self.state.write().child_editor = None;
    }

    // ---- template helpers ----

    fn gateway(&self, operation: &'static str) -> Result<Arc<dyn Gateway>, JourneyError> {
        match &self.gateway {
            Some(gateway) => Ok(Arc::clone(gateway)),
            None => {
                let err = JourneyError::NotConfigured;
                self.report(operation, &err);
                Err(err)
            }
        }
    }

    fn check(
        &self,
        operation: &'static str,
        result: Result<(), JourneyError>,
    ) -> Result<(), JourneyError> {
        result.map_err(|err| {
            self.report(operation, &err);
            err
        })
    }

    fn row<T: Serialize>(
        &self,
        operation: &'static str,
        collection: Collection,
        payload: &T,
    ) -> Result<Row, JourneyError> {
        let result = to_row(collection, payload);
        self.settle(operation, result)
    }

    fn settle<T>(
        &self,
        operation: &'static str,
        result: Result<T, GatewayError>,
    ) -> Result<T, JourneyError> {
        result.map_err(|source| {
            let err = JourneyError::gateway(operation, source);
            self.report(operation, &err);
            err
        })
    }

    fn report(&self, operation: &'static str, err: &JourneyError) {
        let message = match err {
            JourneyError::Gateway { .. } => err.to_string(),
            other => format!("{operation} failed: {other}"),
        };
        if err.is_gateway() {
            tracing::error!(operation, error = %err, "journey operation failed");
        } else {
            tracing::warn!(operation, error = %err, "journey operation rejected");
        }
        let notice = Notice::error(message);
        self.state.write().last_notice = Some(notice.clone());
        self.surface.alert(&notice);
    }
}

/// HTTP gateway when credentials exist, `None` otherwise
///
/// # Errors
/// - `ConfigError::InvalidUrl` if the configured URL is unusable
pub fn gateway_from_config(
    config: &JourneyConfig,
) -> Result<Option<Arc<dyn Gateway>>, ConfigError> {
    if config.gateway.is_configured() {
        Ok(Some(Arc::new(RestGateway::new(&config.gateway)?)))
    } else {
        tracing::warn!("gateway credentials missing; journey edits are disabled");
        Ok(None)
    }
}

fn not_found(kind: &'static str, id: &RecordId) -> JourneyError {
    JourneyError::NotFound {
        kind,
        id: id.to_string(),
    }
}
