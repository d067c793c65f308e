//! Journey data aggregation
//!
//! Fetches the nested stage → step → {personas, pain points, touchpoints,
//! metrics, audits} graph in one nested select, personas in a second, and
//! reshapes the raw rows into [`JourneyStage`] trees.
//!
//! The two fetches run concurrently and fail independently: a persona
//! failure leaves the persona list empty but still yields stages, and
//! vice versa.

use crate::error::GatewayError;
use crate::gateway::{from_rows, Collection, Gateway, Join, Row, SelectQuery};
use crate::types::{
    CfpSubmission, JourneyAudit, JourneyStage, JourneyStep, Metric, PainPoint, Persona, RecordId,
    Stage, Step, Touchpoint,
};
use serde::Deserialize;

/// Result of one full fetch
#[derive(Debug, Default)]
pub struct JourneyGraph {
    /// Stages ascending by `order`, each with its steps
    pub stages: Vec<JourneyStage>,
    /// All personas, by name
    pub personas: Vec<Persona>,
    /// Set when the stage fetch failed
    pub stage_error: Option<GatewayError>,
    /// Set when the persona fetch failed
    pub persona_error: Option<GatewayError>,
}

impl JourneyGraph {
    /// Both fetches succeeded
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.stage_error.is_none() && self.persona_error.is_none()
    }
}

/// Personas ordered by name
#[must_use]
pub fn personas_query() -> SelectQuery {
    SelectQuery::from(Collection::Personas).order_by("name", true)
}

/// Stages ordered by `order` with the full nested step graph
#[must_use]
pub fn stages_query() -> SelectQuery {
    let steps = Join::has_many(Collection::Steps, "stage_id")
        .join(Join::has_many(Collection::PainPoints, "step_id"))
        .join(Join::has_many(Collection::Touchpoints, "step_id"))
        .join(Join::has_many(Collection::Metrics, "step_id"))
        .join(Join::has_many(Collection::JourneyAudits, "step_id").order_by("created_at", false))
        .join(
            Join::has_many(Collection::PersonaSteps, "step_id")
                .join(Join::belongs_to(Collection::Personas, "persona_id").alias("persona")),
        );

    SelectQuery::from(Collection::Stages)
        .order_by("order", true)
        .join(steps)
}

/// Fetch and reshape the journey graph
///
/// Never fails as a whole; per-collection errors are logged and reported
/// in the returned graph.
pub async fn fetch_journey_graph(gateway: &dyn Gateway) -> JourneyGraph {
    let (personas, stages) = futures::join!(
        gateway.select(personas_query()),
        gateway.select(stages_query())
    );

    let mut graph = JourneyGraph::default();

    match personas.and_then(|rows| from_rows::<Persona>(Collection::Personas, rows)) {
        Ok(personas) => graph.personas = personas,
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch personas");
            graph.persona_error = Some(e);
        }
    }

    match stages.and_then(reshape_stages) {
        Ok(stages) => graph.stages = stages,
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch journey stages");
            graph.stage_error = Some(e);
        }
    }

    tracing::debug!(
        stages = graph.stages.len(),
        personas = graph.personas.len(),
        "journey graph fetched"
    );
    graph
}

/// Fetch CFP submissions ordered by deadline
///
/// # Errors
/// - gateway or decode failures for `cfp_submissions`
pub async fn fetch_cfp_submissions(
    gateway: &dyn Gateway,
) -> Result<Vec<CfpSubmission>, GatewayError> {
    let rows = gateway
        .select(SelectQuery::from(Collection::CfpSubmissions).order_by("deadline", true))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to fetch CFP submissions");
            e
        })?;
    from_rows(Collection::CfpSubmissions, rows)
}

#[derive(Deserialize)]
struct RawStage {
    id: RecordId,
    name: String,
    order: i64,
    #[serde(default)]
    steps: Option<Vec<RawStep>>,
}

#[derive(Deserialize)]
struct RawStep {
    id: RecordId,
    stage_id: RecordId,
    #[serde(default)]
    user_action: Option<String>,
    #[serde(default)]
    user_goal: Option<String>,
    #[serde(default)]
    pain_points: Option<Vec<PainPoint>>,
    #[serde(default)]
    touchpoints: Option<Vec<Touchpoint>>,
    #[serde(default)]
    metrics: Option<Vec<Metric>>,
    #[serde(default)]
    journey_audits: Option<Vec<JourneyAudit>>,
    #[serde(default)]
    persona_steps: Option<Vec<RawPersonaLink>>,
}

#[derive(Deserialize)]
struct RawPersonaLink {
    #[serde(default)]
    persona: Option<Persona>,
}

/// Decode nested stage rows into the aggregated tree
///
/// # Errors
/// - `GatewayError::Decode` if a row does not have the stage shape
pub fn reshape_stages(rows: Vec<Row>) -> Result<Vec<JourneyStage>, GatewayError> {
    let raw = from_rows::<RawStage>(Collection::Stages, rows)?;
    let mut stages: Vec<JourneyStage> = raw.into_iter().map(project_stage).collect();
    // stable: equal orders keep gateway order
    stages.sort_by_key(|s| s.stage.order);
    Ok(stages)
}

fn project_stage(raw: RawStage) -> JourneyStage {
    let stage = Stage {
        id: raw.id,
        name: raw.name,
        order: raw.order,
    };
    let steps = raw
        .steps
        .unwrap_or_default()
        .into_iter()
        .map(project_step)
        .collect();
    JourneyStage { stage, steps }
}

fn project_step(raw: RawStep) -> JourneyStep {
    let personas = raw
        .persona_steps
        .unwrap_or_default()
        .into_iter()
        .filter_map(|link| link.persona)
        .collect();

    JourneyStep {
        step: Step {
            id: raw.id,
            stage_id: raw.stage_id,
            user_action: raw.user_action.unwrap_or_default(),
            user_goal: raw.user_goal.unwrap_or_default(),
        },
        personas,
        pain_points: raw.pain_points.unwrap_or_default(),
        touchpoints: raw.touchpoints.unwrap_or_default(),
        metrics: raw.metrics.unwrap_or_default(),
        audits: raw.journey_audits.unwrap_or_default(),
    }
}
