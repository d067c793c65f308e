//! Editing state
//!
//! Two kinds of editors exist:
//! - inline text editors (stage name, step action/goal) that commit on
//!   blur or Enter without shift and discard on Escape
//! - child editors holding a draft pain point, touchpoint or metric until
//!   it is saved or closed

use crate::error::JourneyError;
use crate::types::{
    MeasurementType, Metric, PainPoint, RecordId, Severity, Touchpoint, TouchpointType,
};
use serde::Serialize;

/// Field an inline editor writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InlineField {
    StageName,
    StepAction,
    StepGoal,
}

impl InlineField {
    /// Column updated at the gateway
    #[inline]
    #[must_use]
    pub fn column(&self) -> &'static str {
        match self {
            InlineField::StageName => "name",
            InlineField::StepAction => "user_action",
            InlineField::StepGoal => "user_goal",
        }
    }
}

/// What is being edited inline
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InlineTarget {
    pub field: InlineField,
    pub id: RecordId,
}

impl InlineTarget {
    #[inline]
    #[must_use]
    pub fn stage_name(id: impl Into<RecordId>) -> Self {
        Self {
            field: InlineField::StageName,
            id: id.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn step_action(id: impl Into<RecordId>) -> Self {
        Self {
            field: InlineField::StepAction,
            id: id.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn step_goal(id: impl Into<RecordId>) -> Self {
        Self {
            field: InlineField::StepGoal,
            id: id.into(),
        }
    }
}

/// An open inline editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineEditor {
    pub target: InlineTarget,
    pub draft: String,
}

/// Key pressed inside an inline editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Enter { shift: bool },
    Escape,
    Other,
}

/// What a key press does to the inline editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineAction {
    Commit,
    Discard,
    Continue,
}

impl KeyInput {
    /// Enter commits, shift+Enter inserts a newline, Escape discards
    #[inline]
    #[must_use]
    pub fn action(&self) -> InlineAction {
        match self {
            KeyInput::Enter { shift: false } => InlineAction::Commit,
            KeyInput::Escape => InlineAction::Discard,
            KeyInput::Enter { shift: true } | KeyInput::Other => InlineAction::Continue,
        }
    }
}

fn require(value: &str, field: &'static str) -> Result<(), JourneyError> {
    if value.trim().is_empty() {
        Err(JourneyError::Validation { field })
    } else {
        Ok(())
    }
}

/// Draft pain point
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PainPointDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub step_id: RecordId,
    pub description: String,
    pub severity: Option<Severity>,
}

impl PainPointDraft {
    /// Blank draft for a step
    #[must_use]
    pub fn new(step_id: impl Into<RecordId>) -> Self {
        Self {
            id: None,
            step_id: step_id.into(),
            description: String::new(),
            severity: None,
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With severity
    #[inline]
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Description must not be blank
    ///
    /// # Errors
    /// - `JourneyError::Validation`
    pub fn validate(&self) -> Result<(), JourneyError> {
        require(&self.description, "description")
    }
}

impl From<&PainPoint> for PainPointDraft {
    fn from(p: &PainPoint) -> Self {
        Self {
            id: Some(p.id.clone()),
            step_id: p.step_id.clone(),
            description: p.description.clone(),
            severity: p.severity,
        }
    }
}

/// Draft touchpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TouchpointDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub step_id: RecordId,
    pub title: String,
    pub description: Option<String>,
    pub content_url: Option<String>,
    pub touchpoint_type: TouchpointType,
}

impl TouchpointDraft {
    /// Blank draft for a step
    #[must_use]
    pub fn new(step_id: impl Into<RecordId>) -> Self {
        Self {
            id: None,
            step_id: step_id.into(),
            title: String::new(),
            description: None,
            content_url: None,
            touchpoint_type: TouchpointType::default(),
        }
    }

    /// With title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// With type
    #[inline]
    #[must_use]
    pub fn with_type(mut self, touchpoint_type: TouchpointType) -> Self {
        self.touchpoint_type = touchpoint_type;
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With content URL
    #[inline]
    #[must_use]
    pub fn with_content_url(mut self, url: impl Into<String>) -> Self {
        self.content_url = Some(url.into());
        self
    }

    /// Title must not be blank
    ///
    /// # Errors
    /// - `JourneyError::Validation`
    pub fn validate(&self) -> Result<(), JourneyError> {
        require(&self.title, "title")
    }
}

impl From<&Touchpoint> for TouchpointDraft {
    fn from(t: &Touchpoint) -> Self {
        Self {
            id: Some(t.id.clone()),
            step_id: t.step_id.clone(),
            title: t.title.clone(),
            description: t.description.clone(),
            content_url: t.content_url.clone(),
            touchpoint_type: t.touchpoint_type,
        }
    }
}

/// Draft metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub step_id: RecordId,
    pub metric_name: String,
    pub metric_goal: Option<f64>,
    pub measurement_type: MeasurementType,
}

impl MetricDraft {
    /// Blank draft for a step
    #[must_use]
    pub fn new(step_id: impl Into<RecordId>) -> Self {
        Self {
            id: None,
            step_id: step_id.into(),
            metric_name: String::new(),
            metric_goal: None,
            measurement_type: MeasurementType::default(),
        }
    }

    /// With name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.metric_name = name.into();
        self
    }

    /// With goal and measurement type
    #[inline]
    #[must_use]
    pub fn with_goal(mut self, goal: f64, measurement_type: MeasurementType) -> Self {
        self.metric_goal = Some(goal);
        self.measurement_type = measurement_type;
        self
    }

    /// Name must not be blank
    ///
    /// # Errors
    /// - `JourneyError::Validation`
    pub fn validate(&self) -> Result<(), JourneyError> {
        require(&self.metric_name, "metric_name")
    }
}

impl From<&Metric> for MetricDraft {
    fn from(m: &Metric) -> Self {
        Self {
            id: Some(m.id.clone()),
            step_id: m.step_id.clone(),
            metric_name: m.metric_name.clone(),
            metric_goal: m.metric_goal,
            measurement_type: m.measurement_type,
        }
    }
}

/// An open child editor
#[derive(Debug, Clone, PartialEq)]
pub enum ChildEditor {
    PainPoint(PainPointDraft),
    Touchpoint(TouchpointDraft),
    Metric(MetricDraft),
}

impl ChildEditor {
    /// Step the draft belongs to
    #[must_use]
    pub fn step_id(&self) -> &RecordId {
        match self {
            ChildEditor::PainPoint(d) => &d.step_id,
            ChildEditor::Touchpoint(d) => &d.step_id,
            ChildEditor::Metric(d) => &d.step_id,
        }
    }

    /// Whether the draft edits an existing record
    #[must_use]
    pub fn is_existing(&self) -> bool {
        match self {
            ChildEditor::PainPoint(d) => d.id.is_some(),
            ChildEditor::Touchpoint(d) => d.id.is_some(),
            ChildEditor::Metric(d) => d.id.is_some(),
        }
    }
}
