//! Journey Core - developer journey model and editing controller
//!
//! Manages the developer journey map stored in a relational service:
//! - Stages, steps and their personas, pain points, touchpoints and metrics
//! - A gateway abstraction over the store (in-memory and HTTP)
//! - Full-tree aggregation from one nested select
//! - Mutation operations that write through the gateway, then refetch
//!
//! # Example
//!
//! ```rust,ignore
//! use journey_core::{InMemoryGateway, JourneyController, TracingSurface};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), journey_core::JourneyError> {
//! let controller = JourneyController::new(
//!     Some(Arc::new(InMemoryGateway::new())),
//!     Arc::new(TracingSurface::default()),
//! );
//!
//! let stage = controller.add_stage().await?;
//! controller.rename_stage(&stage, "Discover").await?;
//! controller.add_step(&stage).await?;
//!
//! let state = controller.state();
//! println!("{} stages", state.stages.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod aggregate;
pub mod config;
pub mod controller;
pub mod demo;
pub mod editor;
pub mod error;
pub mod gateway;
pub mod surface;
pub mod types;

// Re-exports for convenience
pub use aggregate::{fetch_cfp_submissions, fetch_journey_graph, JourneyGraph};
pub use config::{GatewayConfig, JourneyConfig, Placeholders};
pub use controller::{gateway_from_config, AppState, JourneyController, PersonaToggle};
pub use demo::{seed_demo, DemoJourney};
pub use editor::{
    ChildEditor, InlineAction, InlineEditor, InlineField, InlineTarget, KeyInput, MetricDraft,
    PainPointDraft, TouchpointDraft,
};
pub use error::{ConfigError, GatewayError, JourneyError};
pub use gateway::{
    Collection, FaultKind, Gateway, InMemoryGateway, Join, MatchSpec, RestGateway, Row,
    SelectQuery,
};
pub use surface::{Notice, NoticeLevel, TracingSurface, UserSurface};
pub use types::{
    CfpSubmission, JourneyAudit, JourneyStage, JourneyStep, MeasurementType, Metric, PainPoint,
    Persona, PersonaStep, RecordId, Severity, Stage, Step, Touchpoint, TouchpointType,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Journey Core
    pub use crate::{
        AppState, Gateway, InMemoryGateway, JourneyController, JourneyError, JourneyStage,
        JourneyStep, RecordId, TracingSurface, UserSurface,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
