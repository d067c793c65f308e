//! Report scope selection

use crate::error::ReportError;
use journey_core::{JourneyStage, RecordId};
use serde::Serialize;

/// Which stages a report covers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "scope", content = "stage_id")]
pub enum ReportScope {
    /// The whole journey
    #[default]
    All,
    /// One stage
    Stage(RecordId),
}

impl ReportScope {
    /// Scope from an optional stage id
    #[must_use]
    pub fn from_stage(stage_id: Option<RecordId>) -> Self {
        stage_id.map_or(Self::All, Self::Stage)
    }

    /// Stages in scope, in tree order
    ///
    /// # Errors
    /// - `ReportError::UnknownStage` if the scoped stage is not in the tree
    pub fn select<'a>(
        &self,
        stages: &'a [JourneyStage],
    ) -> Result<Vec<&'a JourneyStage>, ReportError> {
        match self {
            Self::All => Ok(stages.iter().collect()),
            Self::Stage(id) => stages
                .iter()
                .find(|s| s.id() == id)
                .map(|s| vec![s])
                .ok_or_else(|| ReportError::UnknownStage(id.clone())),
        }
    }
}
