//! In-process relational gateway
//!
//! Keeps rows per collection in insertion order and enforces the store's
//! relational contract:
//! - `ON DELETE CASCADE` foreign keys (steps→stages, children→steps,
//!   associations→personas/steps)
//! - unique `(persona_id, step_id)` association pairs
//! - server-assigned ids
//!
//! Faults can be injected per collection to exercise failure paths.

use super::{row_id, Collection, Gateway, Join, MatchSpec, OrderBy, Relation, Row, SelectQuery};
use crate::error::GatewayError;
use crate::types::RecordId;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

/// Foreign key with cascade-on-delete
struct ForeignKey {
    collection: Collection,
    column: &'static str,
    references: Collection,
}

const FOREIGN_KEYS: &[ForeignKey] = &[
    ForeignKey {
        collection: Collection::Steps,
        column: "stage_id",
        references: Collection::Stages,
    },
    ForeignKey {
        collection: Collection::PainPoints,
        column: "step_id",
        references: Collection::Steps,
    },
    ForeignKey {
        collection: Collection::Touchpoints,
        column: "step_id",
        references: Collection::Steps,
    },
    ForeignKey {
        collection: Collection::Metrics,
        column: "step_id",
        references: Collection::Steps,
    },
    ForeignKey {
        collection: Collection::PersonaSteps,
        column: "persona_id",
        references: Collection::Personas,
    },
    ForeignKey {
        collection: Collection::PersonaSteps,
        column: "step_id",
        references: Collection::Steps,
    },
    ForeignKey {
        collection: Collection::JourneyAudits,
        column: "step_id",
        references: Collection::Steps,
    },
];

/// Unique column sets per collection
fn unique_columns(collection: Collection) -> Option<&'static [&'static str]> {
    match collection {
        Collection::PersonaSteps => Some(&["persona_id", "step_id"]),
        _ => None,
    }
}

/// Which side of the gateway a fault applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    Read,
    Write,
}

/// In-memory implementation of [`Gateway`]
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    tables: RwLock<HashMap<Collection, Vec<Row>>>,
    faults: RwLock<HashMap<(Collection, FaultKind), String>>,
    writes: AtomicUsize,
}

impl InMemoryGateway {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `kind` call on `collection` fail with `message`
    pub fn fail(&self, collection: Collection, kind: FaultKind, message: impl Into<String>) {
        self.faults.write().insert((collection, kind), message.into());
    }

    /// Remove all injected faults
    pub fn clear_faults(&self) {
        self.faults.write().clear();
    }

    /// Snapshot of a collection's rows, insertion order
    #[must_use]
    pub fn rows(&self, collection: Collection) -> Vec<Row> {
        self.tables
            .read()
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of rows in a collection
    #[must_use]
    pub fn count(&self, collection: Collection) -> usize {
        self.tables.read().get(&collection).map_or(0, Vec::len)
    }

    /// Number of successful writes so far
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(AtomicOrdering::SeqCst)
    }

    /// Load rows directly, bypassing read-only and fault checks
    ///
    /// Used to seed store-owned data such as audits. Rows without an id get one.
    pub fn load_rows(&self, collection: Collection, rows: impl IntoIterator<Item = Row>) {
        let mut tables = self.tables.write();
        let table = tables.entry(collection).or_default();
        for mut row in rows {
            if collection.has_identity() && row_id(&row, "id").is_none() {
                row.insert("id".to_string(), Value::from(new_id()));
            }
            table.push(row);
        }
    }

    fn check_fault(&self, collection: Collection, kind: FaultKind) -> Result<(), GatewayError> {
        match self.faults.read().get(&(collection, kind)) {
            Some(message) => Err(GatewayError::Rejected {
                status: None,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn check_writable(&self, collection: Collection) -> Result<(), GatewayError> {
        if collection.is_read_only() {
            return Err(GatewayError::ReadOnly(collection));
        }
        self.check_fault(collection, FaultKind::Write)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);
    }
}

#[async_trait]
impl Gateway for InMemoryGateway {
    async fn select(&self, query: SelectQuery) -> Result<Vec<Row>, GatewayError> {
        self.check_fault(query.collection, FaultKind::Read)?;
        for join in &query.joins {
            check_join_faults(self, join)?;
        }

        let tables = self.tables.read();
        let mut rows: Vec<Row> = tables
            .get(&query.collection)
            .map(|t| {
                t.iter()
                    .filter(|row| {
                        query
                            .filters
                            .iter()
                            .all(|f| row.get(&f.column) == Some(&f.value))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        sort_rows(&mut rows, &query.order);
        for row in &mut rows {
            for join in &query.joins {
                embed(&tables, row, join);
            }
        }

        tracing::debug!(collection = %query.collection, rows = rows.len(), "in-memory select");
        Ok(rows)
    }

    async fn insert(&self, collection: Collection, record: Row) -> Result<RecordId, GatewayError> {
        self.check_writable(collection)?;
        let mut tables = self.tables.write();
        let id = insert_row(&mut tables, collection, record)?;
        drop(tables);
        self.record_write();
        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: RecordId,
        patch: Row,
    ) -> Result<(), GatewayError> {
        self.check_writable(collection)?;
        let mut tables = self.tables.write();
        check_foreign_keys(&tables, collection, &patch)?;

        let row = tables
            .get_mut(&collection)
            .and_then(|t| {
                t.iter_mut()
                    .find(|r| row_id(r, "id").as_deref() == Some(id.as_str()))
            })
            .ok_or_else(|| GatewayError::NotFound {
                collection,
                id: id.to_string(),
            })?;
        merge(row, patch);
        drop(tables);
        self.record_write();
        Ok(())
    }

    async fn upsert(&self, collection: Collection, record: Row) -> Result<RecordId, GatewayError> {
        self.check_writable(collection)?;
        let mut tables = self.tables.write();

        let existing = row_id(&record, "id").and_then(|id| {
            tables.get(&collection).and_then(|t| {
                t.iter()
                    .position(|r| row_id(r, "id").as_deref() == Some(id.as_str()))
                    .map(|idx| (idx, id))
            })
        });

        let id = match existing {
            Some((idx, id)) => {
                check_foreign_keys(&tables, collection, &record)?;
                if let Some(row) = tables.get_mut(&collection).and_then(|t| t.get_mut(idx)) {
                    merge(row, record);
                }
                RecordId::new(id)
            }
            None => insert_row(&mut tables, collection, record)?,
        };
        drop(tables);
        self.record_write();
        Ok(id)
    }

    async fn delete(&self, collection: Collection, spec: MatchSpec) -> Result<(), GatewayError> {
        self.check_writable(collection)?;
        let mut tables = self.tables.write();
        let removed = cascade_delete(&mut tables, collection, &|row| spec.matches(row));
        drop(tables);
        tracing::debug!(collection = %collection, removed, "in-memory delete");
        self.record_write();
        Ok(())
    }
}

fn check_join_faults(gateway: &InMemoryGateway, join: &Join) -> Result<(), GatewayError> {
    gateway.check_fault(join.collection, FaultKind::Read)?;
    join.joins
        .iter()
        .try_for_each(|nested| check_join_faults(gateway, nested))
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn insert_row(
    tables: &mut HashMap<Collection, Vec<Row>>,
    collection: Collection,
    mut record: Row,
) -> Result<RecordId, GatewayError> {
    check_foreign_keys(tables, collection, &record)?;

    if let Some(columns) = unique_columns(collection) {
        let duplicate = tables.get(&collection).is_some_and(|t| {
            t.iter()
                .any(|r| columns.iter().all(|c| r.get(*c) == record.get(*c)))
        });
        if duplicate {
            return Err(GatewayError::Conflict { collection });
        }
    }

    let id = if collection.has_identity() {
        match row_id(&record, "id") {
            Some(id) => id,
            None => {
                let id = new_id();
                record.insert("id".to_string(), Value::from(id.clone()));
                id
            }
        }
    } else {
        unique_columns(collection)
            .unwrap_or(&[])
            .iter()
            .filter_map(|c| row_id(&record, c))
            .collect::<Vec<_>>()
            .join(":")
    };

    tables.entry(collection).or_default().push(record);
    Ok(RecordId::new(id))
}

fn check_foreign_keys(
    tables: &HashMap<Collection, Vec<Row>>,
    collection: Collection,
    record: &Row,
) -> Result<(), GatewayError> {
    for fk in FOREIGN_KEYS.iter().filter(|fk| fk.collection == collection) {
        let Some(value) = row_id(record, fk.column) else {
            continue;
        };
        let exists = tables.get(&fk.references).is_some_and(|t| {
            t.iter()
                .any(|r| row_id(r, "id").as_deref() == Some(value.as_str()))
        });
        if !exists {
            return Err(GatewayError::ForeignKey {
                collection,
                column: fk.column,
                value,
            });
        }
    }
    Ok(())
}

fn merge(row: &mut Row, patch: Row) {
    for (key, value) in patch {
        if key != "id" {
            row.insert(key, value);
        }
    }
}

/// Remove matching rows and everything that references them
fn cascade_delete(
    tables: &mut HashMap<Collection, Vec<Row>>,
    collection: Collection,
    predicate: &dyn Fn(&Row) -> bool,
) -> usize {
    let Some(table) = tables.get_mut(&collection) else {
        return 0;
    };

    let mut removed_ids = HashSet::new();
    let before = table.len();
    table.retain(|row| {
        if predicate(row) {
            if let Some(id) = row_id(row, "id") {
                removed_ids.insert(id);
            }
            false
        } else {
            true
        }
    });
    let mut removed = before - table.len();

    if removed_ids.is_empty() {
        return removed;
    }

    for fk in FOREIGN_KEYS.iter().filter(|fk| fk.references == collection) {
        removed += cascade_delete(tables, fk.collection, &|row| {
            row_id(row, fk.column).is_some_and(|v| removed_ids.contains(&v))
        });
    }
    removed
}

fn embed(tables: &HashMap<Collection, Vec<Row>>, row: &mut Row, join: &Join) {
    let value = match join.relation {
        Relation::HasMany { foreign_key } => {
            let parent_id = row_id(row, "id");
            let mut children: Vec<Row> = tables
                .get(&join.collection)
                .map(|t| {
                    t.iter()
                        .filter(|c| parent_id.is_some() && row_id(c, foreign_key) == parent_id)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            sort_rows(&mut children, &join.order);
            for child in &mut children {
                for nested in &join.joins {
                    embed(tables, child, nested);
                }
            }
            Value::Array(children.into_iter().map(Value::Object).collect())
        }
        Relation::BelongsTo { local_key } => {
            let target = row_id(row, local_key);
            let parent = target.and_then(|id| {
                tables.get(&join.collection).and_then(|t| {
                    t.iter()
                        .find(|r| row_id(r, "id").as_deref() == Some(id.as_str()))
                        .cloned()
                })
            });
            match parent {
                Some(mut parent) => {
                    for nested in &join.joins {
                        embed(tables, &mut parent, nested);
                    }
                    Value::Object(parent)
                }
                None => Value::Null,
            }
        }
    };
    row.insert(join.key().to_string(), value);
}

/// Stable multi-key sort; rows with equal keys keep insertion order
fn sort_rows(rows: &mut [Row], order: &[OrderBy]) {
    if order.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        order
            .iter()
            .map(|o| {
                let ord = compare_values(a.get(&o.column), b.get(&o.column));
                if o.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        // nulls sort last, as in PostgreSQL ascending order
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn insert_assigns_ids() {
        let gw = InMemoryGateway::new();
        let id = gw
            .insert(Collection::Stages, row(json!({"name": "Discover", "order": 1})))
            .await
            .unwrap();

        let rows = gw.rows(Collection::Stages);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id"), Some(&json!(id.as_str())));
        assert_eq!(gw.write_count(), 1);
    }

    #[tokio::test]
    async fn insert_rejects_missing_parent() {
        let gw = InMemoryGateway::new();
        let err = gw
            .insert(
                Collection::Steps,
                row(json!({"stage_id": "nope", "user_action": "a", "user_goal": "b"})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ForeignKey { column: "stage_id", .. }));
        assert_eq!(gw.write_count(), 0);
    }

    #[tokio::test]
    async fn association_pairs_are_unique() {
        let gw = InMemoryGateway::new();
        let stage = gw
            .insert(Collection::Stages, row(json!({"name": "S", "order": 1})))
            .await
            .unwrap();
        let step = gw
            .insert(
                Collection::Steps,
                row(json!({"stage_id": stage.as_str(), "user_action": "a", "user_goal": "b"})),
            )
            .await
            .unwrap();
        let persona = gw
            .insert(Collection::Personas, row(json!({"name": "Dev"})))
            .await
            .unwrap();

        let pair = row(json!({"persona_id": persona.as_str(), "step_id": step.as_str()}));
        gw.insert(Collection::PersonaSteps, pair.clone()).await.unwrap();
        let err = gw.insert(Collection::PersonaSteps, pair).await.unwrap_err();
        assert!(matches!(err, GatewayError::Conflict { .. }));
    }

    #[tokio::test]
    async fn delete_cascades_through_steps() {
        let gw = InMemoryGateway::new();
        let stage = gw
            .insert(Collection::Stages, row(json!({"name": "S", "order": 1})))
            .await
            .unwrap();
        let step = gw
            .insert(
                Collection::Steps,
                row(json!({"stage_id": stage.as_str(), "user_action": "a", "user_goal": "b"})),
            )
            .await
            .unwrap();
        gw.insert(
            Collection::PainPoints,
            row(json!({"step_id": step.as_str(), "description": "slow"})),
        )
        .await
        .unwrap();

        gw.delete(Collection::Stages, MatchSpec::id(stage)).await.unwrap();

        assert_eq!(gw.count(Collection::Stages), 0);
        assert_eq!(gw.count(Collection::Steps), 0);
        assert_eq!(gw.count(Collection::PainPoints), 0);
    }

    #[tokio::test]
    async fn select_sorts_stably_and_embeds() {
        let gw = InMemoryGateway::new();
        let b = gw
            .insert(Collection::Stages, row(json!({"name": "B", "order": 2})))
            .await
            .unwrap();
        gw.insert(Collection::Stages, row(json!({"name": "A", "order": 1})))
            .await
            .unwrap();
        gw.insert(Collection::Stages, row(json!({"name": "C", "order": 2})))
            .await
            .unwrap();
        gw.insert(
            Collection::Steps,
            row(json!({"stage_id": b.as_str(), "user_action": "x", "user_goal": "y"})),
        )
        .await
        .unwrap();

        let rows = gw
            .select(
                SelectQuery::from(Collection::Stages)
                    .order_by("order", true)
                    .join(Join::has_many(Collection::Steps, "stage_id")),
            )
            .await
            .unwrap();

        let names: Vec<_> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert_eq!(rows[1]["steps"].as_array().unwrap().len(), 1);
        assert_eq!(rows[0]["steps"], json!([]));
    }

    #[tokio::test]
    async fn belongs_to_embeds_null_when_missing() {
        let gw = InMemoryGateway::new();
        gw.load_rows(
            Collection::PersonaSteps,
            [row(json!({"persona_id": "gone", "step_id": "s1"}))],
        );

        let rows = gw
            .select(
                SelectQuery::from(Collection::PersonaSteps)
                    .join(Join::belongs_to(Collection::Personas, "persona_id").alias("persona")),
            )
            .await
            .unwrap();
        assert_eq!(rows[0]["persona"], Value::Null);
    }

    #[tokio::test]
    async fn upsert_inserts_then_updates() {
        let gw = InMemoryGateway::new();
        let id = gw
            .upsert(Collection::Personas, row(json!({"name": "Dev"})))
            .await
            .unwrap();
        gw.upsert(
            Collection::Personas,
            row(json!({"id": id.as_str(), "name": "Senior Dev"})),
        )
        .await
        .unwrap();

        let rows = gw.rows(Collection::Personas);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], json!("Senior Dev"));
    }

    #[tokio::test]
    async fn update_missing_row_fails() {
        let gw = InMemoryGateway::new();
        let err = gw
            .update(Collection::Stages, "nope".into(), Row::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound { .. }));
    }

    #[tokio::test]
    async fn faults_and_read_only() {
        let gw = InMemoryGateway::new();
        gw.fail(Collection::Personas, FaultKind::Read, "boom");
        let err = gw
            .select(SelectQuery::from(Collection::Personas))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");

        gw.clear_faults();
        assert!(gw.select(SelectQuery::from(Collection::Personas)).await.is_ok());

        let err = gw
            .insert(Collection::JourneyAudits, Row::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ReadOnly(Collection::JourneyAudits)));
    }

    #[tokio::test]
    async fn nested_join_fault_fails_whole_select() {
        let gw = InMemoryGateway::new();
        gw.fail(Collection::Metrics, FaultKind::Read, "metrics down");
        let query = SelectQuery::from(Collection::Stages).join(
            Join::has_many(Collection::Steps, "stage_id")
                .join(Join::has_many(Collection::Metrics, "step_id")),
        );
        assert!(gw.select(query).await.is_err());
    }
}
