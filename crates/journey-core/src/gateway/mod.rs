//! Persistence gateway abstraction
//!
//! The journey store is a relational service exposing per-collection
//! insert/update/upsert/delete plus a nested select that joins related
//! collections in one call. Rows travel as JSON objects ([`Row`]); typed
//! decoding happens in the aggregator.
//!
//! Two implementations ship with the crate:
//! - [`InMemoryGateway`]: relational semantics in process (cascades,
//!   unique join pairs, fault injection for tests)
//! - [`RestGateway`]: PostgREST-style HTTP client for hosted stores

mod memory;
mod rest;

pub use memory::{FaultKind, InMemoryGateway};
pub use rest::RestGateway;

use crate::error::GatewayError;
use crate::types::RecordId;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A raw gateway row
pub type Row = serde_json::Map<String, Value>;

/// Named collections used by the journey
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Stages,
    Steps,
    Personas,
    PainPoints,
    Touchpoints,
    Metrics,
    PersonaSteps,
    JourneyAudits,
    CfpSubmissions,
}

impl Collection {
    /// Table name at the store
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Stages => "stages",
            Collection::Steps => "steps",
            Collection::Personas => "personas",
            Collection::PainPoints => "pain_points",
            Collection::Touchpoints => "touchpoints",
            Collection::Metrics => "metrics",
            Collection::PersonaSteps => "persona_steps",
            Collection::JourneyAudits => "journey_audits",
            Collection::CfpSubmissions => "cfp_submissions",
        }
    }

    /// Audits are written by the store, never by this crate
    #[inline]
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        matches!(self, Collection::JourneyAudits)
    }

    /// Join tables have no id column of their own
    #[inline]
    #[must_use]
    pub fn has_identity(&self) -> bool {
        !matches!(self, Collection::PersonaSteps)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column equality filter
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

/// Sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

/// How a joined collection relates to its parent row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Child rows whose `foreign_key` equals the parent's id; embedded as an array
    HasMany { foreign_key: &'static str },
    /// The row whose id equals the parent's `local_key`; embedded as an object or null
    BelongsTo { local_key: &'static str },
}

/// Nested join specification
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub collection: Collection,
    pub relation: Relation,
    /// Embedding key, defaults to the collection name
    pub alias: Option<&'static str>,
    pub order: Vec<OrderBy>,
    pub joins: Vec<Join>,
}

impl Join {
    /// Embed child rows
    #[inline]
    #[must_use]
    pub fn has_many(collection: Collection, foreign_key: &'static str) -> Self {
        Self {
            collection,
            relation: Relation::HasMany { foreign_key },
            alias: None,
            order: Vec::new(),
            joins: Vec::new(),
        }
    }

    /// Embed the referenced parent row
    #[inline]
    #[must_use]
    pub fn belongs_to(collection: Collection, local_key: &'static str) -> Self {
        Self {
            collection,
            relation: Relation::BelongsTo { local_key },
            alias: None,
            order: Vec::new(),
            joins: Vec::new(),
        }
    }

    /// Embed under a different key
    #[inline]
    #[must_use]
    pub fn alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    /// Sort embedded rows
    #[inline]
    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order.push(OrderBy {
            column: column.into(),
            ascending,
        });
        self
    }

    /// Add a nested join
    #[inline]
    #[must_use]
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Key the embedded value is stored under
    #[inline]
    #[must_use]
    pub fn key(&self) -> &'static str {
        self.alias.unwrap_or_else(|| self.collection.name())
    }
}

/// Select request
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub collection: Collection,
    pub filters: Vec<Filter>,
    pub order: Vec<OrderBy>,
    pub joins: Vec<Join>,
}

impl SelectQuery {
    /// Select all rows of a collection
    #[inline]
    #[must_use]
    pub fn from(collection: Collection) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order: Vec::new(),
            joins: Vec::new(),
        }
    }

    /// Keep rows where `column == value`
    #[inline]
    #[must_use]
    pub fn filter_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// Sort the top-level rows
    #[inline]
    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order.push(OrderBy {
            column: column.into(),
            ascending,
        });
        self
    }

    /// Add a nested join
    #[inline]
    #[must_use]
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }
}

/// Delete target: a single id or a multi-column equality match
#[derive(Debug, Clone, PartialEq)]
pub enum MatchSpec {
    Id(RecordId),
    Columns(Vec<(String, Value)>),
}

impl MatchSpec {
    /// Match by id
    #[inline]
    #[must_use]
    pub fn id(id: impl Into<RecordId>) -> Self {
        Self::Id(id.into())
    }

    /// Match a persona-step association
    #[must_use]
    pub fn persona_step(persona_id: &RecordId, step_id: &RecordId) -> Self {
        Self::Columns(vec![
            ("persona_id".to_string(), Value::from(persona_id.as_str())),
            ("step_id".to_string(), Value::from(step_id.as_str())),
        ])
    }

    /// Column/value pairs this spec compares
    #[must_use]
    pub fn pairs(&self) -> Vec<(&str, Value)> {
        match self {
            MatchSpec::Id(id) => vec![("id", Value::from(id.as_str()))],
            MatchSpec::Columns(cols) => cols.iter().map(|(c, v)| (c.as_str(), v.clone())).collect(),
        }
    }

    /// Whether a row satisfies every pair
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        self.pairs()
            .iter()
            .all(|(column, value)| row.get(*column) == Some(value))
    }
}

/// Relational store used by the journey
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Run a (possibly nested) select
    async fn select(&self, query: SelectQuery) -> Result<Vec<Row>, GatewayError>;

    /// Insert a row; the store assigns the id
    async fn insert(&self, collection: Collection, record: Row) -> Result<RecordId, GatewayError>;

    /// Patch fields of the row with `id`
    async fn update(
        &self,
        collection: Collection,
        id: RecordId,
        patch: Row,
    ) -> Result<(), GatewayError>;

    /// Insert when `record` has no id, otherwise replace fields of that row
    async fn upsert(&self, collection: Collection, record: Row) -> Result<RecordId, GatewayError>;

    /// Delete rows matching `spec`
    async fn delete(&self, collection: Collection, spec: MatchSpec) -> Result<(), GatewayError>;
}

/// Serialize a typed payload into a row
///
/// # Errors
/// - `GatewayError::Decode` if the payload is not a JSON object
pub fn to_row<T: Serialize>(collection: Collection, payload: &T) -> Result<Row, GatewayError> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(GatewayError::decode(
            collection,
            format!("expected object, got {other}"),
        )),
        Err(e) => Err(GatewayError::decode(collection, e)),
    }
}

/// Decode rows into a typed shape
///
/// # Errors
/// - `GatewayError::Decode` naming the collection on the first bad row
pub fn from_rows<T: DeserializeOwned>(
    collection: Collection,
    rows: Vec<Row>,
) -> Result<Vec<T>, GatewayError> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(Value::Object(row)).map_err(|e| GatewayError::decode(collection, e))
        })
        .collect()
}

/// Read a string id column from a row
pub(crate) fn row_id(row: &Row, column: &str) -> Option<String> {
    match row.get(column) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
