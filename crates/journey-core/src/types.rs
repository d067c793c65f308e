//! Core types for the developer journey
//!
//! Defines the entities stored by the persistence gateway:
//! - Stages and the steps they own
//! - Personas and their step associations
//! - Step children (pain points, touchpoints, metrics, audits)
//! - CFP submissions (deadline reporting)
//!
//! and the aggregated tree shapes ([`JourneyStage`], [`JourneyStep`]) the
//! aggregator produces from nested gateway rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier assigned by the persistence gateway
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    /// Wrap a gateway-assigned id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A journey stage; steps are displayed under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: RecordId,
    pub name: String,
    /// Display sequence, ascending
    pub order: i64,
}

/// A step inside a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: RecordId,
    pub stage_id: RecordId,
    pub user_action: String,
    pub user_goal: String,
}

/// A persona, shared by reference across steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Join record: the persona is relevant to the step
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonaStep {
    pub persona_id: RecordId,
    pub step_id: RecordId,
}

/// Pain point severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// All severities, lowest first
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    /// Datastore value
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant::new("severity", s))
    }
}

/// A pain point owned by one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PainPoint {
    pub id: RecordId,
    pub step_id: RecordId,
    pub description: String,
    #[serde(default)]
    pub severity: Option<Severity>,
}

/// Touchpoint content type
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum TouchpointType {
    #[default]
    #[serde(rename = "Blog Post")]
    BlogPost,
    #[serde(rename = "Video Tutorial")]
    VideoTutorial,
    Email,
    #[serde(rename = "Social Media Post")]
    SocialMediaPost,
    Docs,
    Webinar,
    #[serde(rename = "Case Study")]
    CaseStudy,
    Other,
}

impl TouchpointType {
    /// All touchpoint types in picker order
    pub const ALL: [TouchpointType; 8] = [
        TouchpointType::BlogPost,
        TouchpointType::VideoTutorial,
        TouchpointType::Email,
        TouchpointType::SocialMediaPost,
        TouchpointType::Docs,
        TouchpointType::Webinar,
        TouchpointType::CaseStudy,
        TouchpointType::Other,
    ];

    /// Datastore value (also the display label)
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TouchpointType::BlogPost => "Blog Post",
            TouchpointType::VideoTutorial => "Video Tutorial",
            TouchpointType::Email => "Email",
            TouchpointType::SocialMediaPost => "Social Media Post",
            TouchpointType::Docs => "Docs",
            TouchpointType::Webinar => "Webinar",
            TouchpointType::CaseStudy => "Case Study",
            TouchpointType::Other => "Other",
        }
    }
}

impl fmt::Display for TouchpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TouchpointType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TouchpointType::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant::new("touchpoint type", s))
    }
}

/// A touchpoint owned by one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Touchpoint {
    pub id: RecordId,
    pub step_id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content_url: Option<String>,
    pub touchpoint_type: TouchpointType,
}

/// How a metric goal is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementType {
    #[default]
    Count,
    Percentage,
    Duration,
}

impl MeasurementType {
    /// All measurement types
    pub const ALL: [MeasurementType; 3] = [
        MeasurementType::Count,
        MeasurementType::Percentage,
        MeasurementType::Duration,
    ];

    /// Datastore value
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementType::Count => "count",
            MeasurementType::Percentage => "percentage",
            MeasurementType::Duration => "duration",
        }
    }
}

impl fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeasurementType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MeasurementType::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant::new("measurement type", s))
    }
}

/// A metric owned by one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub id: RecordId,
    pub step_id: RecordId,
    pub metric_name: String,
    #[serde(default)]
    pub metric_goal: Option<f64>,
    pub measurement_type: MeasurementType,
}

/// Historical change record for a step (read-only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneyAudit {
    pub id: RecordId,
    pub step_id: RecordId,
    pub change_description: String,
    pub changed_by: String,
    pub created_at: DateTime<Utc>,
}

/// A conference call-for-papers submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfpSubmission {
    pub id: RecordId,
    pub conference_name: String,
    pub talk_title: String,
    /// Calendar date (`YYYY-MM-DD`) or RFC 3339 timestamp
    pub deadline: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Aggregated step with its children resolved
#[derive(Debug, Clone, PartialEq)]
pub struct JourneyStep {
    pub step: Step,
    pub personas: Vec<Persona>,
    pub pain_points: Vec<PainPoint>,
    pub touchpoints: Vec<Touchpoint>,
    pub metrics: Vec<Metric>,
    pub audits: Vec<JourneyAudit>,
}

impl JourneyStep {
    /// Step id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &RecordId {
        &self.step.id
    }

    /// Whether the persona is associated with this step
    #[must_use]
    pub fn has_persona(&self, persona_id: &RecordId) -> bool {
        self.personas.iter().any(|p| &p.id == persona_id)
    }
}

/// Aggregated stage with its ordered steps
#[derive(Debug, Clone, PartialEq)]
pub struct JourneyStage {
    pub stage: Stage,
    pub steps: Vec<JourneyStep>,
}

impl JourneyStage {
    /// Stage id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &RecordId {
        &self.stage.id
    }

    /// Find a step of this stage
    #[must_use]
    pub fn step(&self, step_id: &RecordId) -> Option<&JourneyStep> {
        self.steps.iter().find(|s| s.id() == step_id)
    }
}

/// Unknown enum value coming from the datastore or the command line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touchpoint_type_wire_names() {
        let json = serde_json::to_value(TouchpointType::SocialMediaPost).unwrap();
        assert_eq!(json, serde_json::json!("Social Media Post"));

        let parsed: TouchpointType = serde_json::from_value(serde_json::json!("Case Study")).unwrap();
        assert_eq!(parsed, TouchpointType::CaseStudy);
    }

    #[test]
    fn severity_parse_is_case_insensitive() {
        assert_eq!("HIGH".parse::<Severity>().unwrap(), Severity::High);
        assert!("critical".parse::<Severity>().is_err());
    }

    #[test]
    fn measurement_type_round_trips_through_str() {
        for m in MeasurementType::ALL {
            assert_eq!(m.as_str().parse::<MeasurementType>().unwrap(), m);
        }
    }

    #[test]
    fn touchpoint_type_from_str() {
        assert_eq!(
            "video tutorial".parse::<TouchpointType>().unwrap(),
            TouchpointType::VideoTutorial
        );
        let err = "Podcast".parse::<TouchpointType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown touchpoint type: Podcast");
    }

    #[test]
    fn journey_step_has_persona() {
        let step = JourneyStep {
            step: Step {
                id: "s1".into(),
                stage_id: "st1".into(),
                user_action: "Read docs".into(),
                user_goal: "Learn".into(),
            },
            personas: vec![Persona {
                id: "p1".into(),
                name: "Backend dev".into(),
                role: None,
                description: None,
            }],
            pain_points: vec![],
            touchpoints: vec![],
            metrics: vec![],
            audits: vec![],
        };

        assert!(step.has_persona(&"p1".into()));
        assert!(!step.has_persona(&"p2".into()));
    }
}
