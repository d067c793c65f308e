//! Journey Report - dashboard derivations over the aggregated journey
//!
//! Pure functions over [`journey_core::JourneyStage`] trees:
//! - Scope selection (whole journey or one stage)
//! - Persona, pain point and touchpoint summaries
//! - Metric goal formatting
//! - CSV export with fixed column specs
//! - Deadline classification for CFP submissions

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod deadline;
pub mod error;
pub mod export;
pub mod format;
pub mod scope;
pub mod summary;

pub use deadline::{
    cfp_schedule, classify_deadline, parse_deadline, CfpEntry, DeadlineStatus, DUE_SOON_DAYS,
};
pub use error::ReportError;
pub use export::{
    pain_points_csv, to_csv, touchpoints_csv, write_export, Column, CsvCell, Export,
    PAIN_POINTS_CSV, PAIN_POINT_COLUMNS, TOUCHPOINTS_CSV, TOUCHPOINT_COLUMNS,
};
pub use format::{format_metric_goal, group_thousands, NO_GOAL};
pub use scope::ReportScope;
pub use summary::{
    journey_overview, pain_point_report, persona_summary, touchpoint_report, JourneyOverview,
    PainPointReport, PainPointRow, PersonaSummary, TouchpointReport, TouchpointRow, NO_SEVERITY,
};
