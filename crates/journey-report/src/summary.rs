//! Dashboard summaries
//!
//! All derivations read the aggregated tree only; nothing here touches the
//! gateway.

use crate::error::ReportError;
use crate::scope::ReportScope;
use indexmap::{IndexMap, IndexSet};
use journey_core::{
    JourneyStage, PainPoint, Persona, RecordId, Severity, Touchpoint, TouchpointType,
};
use serde::Serialize;

/// Bucket for pain points without a severity
pub const NO_SEVERITY: &str = "none";

/// Distinct personas of one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonaSummary {
    pub stage_id: RecordId,
    pub stage_name: String,
    /// Persona names in first-seen order
    pub personas: Vec<String>,
}

impl PersonaSummary {
    /// Number of distinct personas
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.personas.len()
    }
}

/// Per-stage distinct persona counts
///
/// A persona linked to several steps of a stage counts once.
///
/// # Errors
/// - `ReportError::UnknownStage`
pub fn persona_summary(
    stages: &[JourneyStage],
    scope: &ReportScope,
) -> Result<Vec<PersonaSummary>, ReportError> {
    let summaries = scope
        .select(stages)?
        .into_iter()
        .map(|stage| {
            let mut seen: IndexMap<&RecordId, &str> = IndexMap::new();
            for persona in stage.steps.iter().flat_map(|s| &s.personas) {
                seen.entry(&persona.id).or_insert(&persona.name);
            }
            PersonaSummary {
                stage_id: stage.stage.id.clone(),
                stage_name: stage.stage.name.clone(),
                personas: seen.into_values().map(str::to_string).collect(),
            }
        })
        .collect();
    Ok(summaries)
}

/// A pain point with its step and stage context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PainPointRow {
    pub stage_name: String,
    pub user_action: String,
    #[serde(flatten)]
    pub pain_point: PainPoint,
}

/// Flattened pain points with a severity histogram
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PainPointReport {
    pub rows: Vec<PainPointRow>,
    /// Counts keyed `high`, `medium`, `low`, `none`
    pub by_severity: IndexMap<&'static str, usize>,
}

/// Pain points in scope, highest severity bucket first
///
/// # Errors
/// - `ReportError::UnknownStage`
pub fn pain_point_report(
    stages: &[JourneyStage],
    scope: &ReportScope,
) -> Result<PainPointReport, ReportError> {
    let mut by_severity: IndexMap<&'static str, usize> = Severity::ALL
        .iter()
        .rev()
        .map(|s| (s.as_str(), 0))
        .chain([(NO_SEVERITY, 0)])
        .collect();

    let mut rows = Vec::new();
    for stage in scope.select(stages)? {
        for step in &stage.steps {
            for pain_point in &step.pain_points {
                let bucket = pain_point.severity.map_or(NO_SEVERITY, |s| s.as_str());
                *by_severity.entry(bucket).or_default() += 1;
                rows.push(PainPointRow {
                    stage_name: stage.stage.name.clone(),
                    user_action: step.step.user_action.clone(),
                    pain_point: pain_point.clone(),
                });
            }
        }
    }

    Ok(PainPointReport { rows, by_severity })
}

/// A touchpoint with its step and stage context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TouchpointRow {
    pub stage_name: String,
    pub user_action: String,
    #[serde(flatten)]
    pub touchpoint: Touchpoint,
}

/// Flattened touchpoints with a type histogram
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TouchpointReport {
    pub rows: Vec<TouchpointRow>,
    /// Counts for every type, in picker order
    pub by_type: IndexMap<TouchpointType, usize>,
}

/// Touchpoints in scope
///
/// # Errors
/// - `ReportError::UnknownStage`
pub fn touchpoint_report(
    stages: &[JourneyStage],
    scope: &ReportScope,
) -> Result<TouchpointReport, ReportError> {
    let mut by_type: IndexMap<TouchpointType, usize> =
        TouchpointType::ALL.iter().map(|t| (*t, 0)).collect();

    let mut rows = Vec::new();
    for stage in scope.select(stages)? {
        for step in &stage.steps {
            for touchpoint in &step.touchpoints {
                *by_type.entry(touchpoint.touchpoint_type).or_default() += 1;
                rows.push(TouchpointRow {
                    stage_name: stage.stage.name.clone(),
                    user_action: step.step.user_action.clone(),
                    touchpoint: touchpoint.clone(),
                });
            }
        }
    }

    Ok(TouchpointReport { rows, by_type })
}

/// Header totals for the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JourneyOverview {
    pub stages: usize,
    pub steps: usize,
    /// All known personas, linked or not
    pub personas: usize,
    /// Personas linked to at least one step
    pub active_personas: usize,
    pub pain_points: usize,
    pub touchpoints: usize,
    pub metrics: usize,
}

/// Totals over the whole tree
#[must_use]
pub fn journey_overview(stages: &[JourneyStage], personas: &[Persona]) -> JourneyOverview {
    let steps = || stages.iter().flat_map(|s| &s.steps);
    let active: IndexSet<&RecordId> = steps().flat_map(|s| &s.personas).map(|p| &p.id).collect();

    JourneyOverview {
        stages: stages.len(),
        steps: steps().count(),
        personas: personas.len(),
        active_personas: active.len(),
        pain_points: steps().map(|s| s.pain_points.len()).sum(),
        touchpoints: steps().map(|s| s.touchpoints.len()).sum(),
        metrics: steps().map(|s| s.metrics.len()).sum(),
    }
}
