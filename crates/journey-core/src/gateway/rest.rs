//! PostgREST-style HTTP gateway
//!
//! Maps the gateway contract onto the REST conventions of hosted
//! Postgres services:
//! - nested selects become `select=*,steps(*,pain_points(*))`
//! - embedded ordering becomes `steps.order=column.asc`
//! - filters and match specs become `column=eq.value`
//! - upserts use `Prefer: resolution=merge-duplicates`

use super::{row_id, Collection, Gateway, Join, MatchSpec, OrderBy, Relation, Row, SelectQuery};
use crate::config::GatewayConfig;
use crate::error::{ConfigError, GatewayError};
use crate::types::RecordId;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use url::Url;

const PREFER_REPRESENTATION: &str = "return=representation";
const PREFER_MERGE: &str = "resolution=merge-duplicates,return=representation";
const PREFER_MINIMAL: &str = "return=minimal";

/// HTTP implementation of [`Gateway`]
#[derive(Debug, Clone)]
pub struct RestGateway {
    client: Client,
    base: Url,
}

impl RestGateway {
    /// Build a client from gateway settings
    ///
    /// # Errors
    /// - `ConfigError::InvalidUrl` if the URL or key cannot be used
    pub fn new(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let base = config.rest_base()?;
        let key = config.api_key.as_deref().unwrap_or_default().trim();

        let invalid_key = |message: &str| ConfigError::InvalidUrl {
            url: base.to_string(),
            message: format!("api key: {message}"),
        };
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(key).map_err(|_| invalid_key("not a valid header value"))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| invalid_key("not a valid header value"))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::InvalidUrl {
                url: base.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self { client, base })
    }

    fn endpoint(&self, collection: Collection) -> Result<Url, GatewayError> {
        self.base
            .join(collection.name())
            .map_err(|e| GatewayError::Transport(e.to_string()))
    }

    fn request(&self, method: Method, collection: Collection) -> Result<RequestBuilder, GatewayError> {
        Ok(self.client.request(method, self.endpoint(collection)?))
    }

    async fn send(builder: RequestBuilder) -> Result<Response, GatewayError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::Rejected {
            status: Some(status.as_u16()),
            message: error_message(&body, status.canonical_reason()),
        })
    }

    async fn write_returning(
        &self,
        collection: Collection,
        record: Row,
        prefer: &'static str,
    ) -> Result<RecordId, GatewayError> {
        let builder = self
            .request(Method::POST, collection)?
            .header("Prefer", prefer)
            .json(&Value::Array(vec![Value::Object(record)]));
        let rows: Vec<Row> = Self::send(builder).await?.json().await?;
        rows.first()
            .and_then(|row| returned_id(collection, row))
            .map(RecordId::new)
            .ok_or_else(|| GatewayError::decode(collection, "write returned no row"))
    }
}

#[async_trait]
impl Gateway for RestGateway {
    async fn select(&self, query: SelectQuery) -> Result<Vec<Row>, GatewayError> {
        let params = select_params(&query);
        tracing::debug!(collection = %query.collection, ?params, "rest select");
        let builder = self.request(Method::GET, query.collection)?.query(&params);
        Ok(Self::send(builder).await?.json().await?)
    }

    async fn insert(&self, collection: Collection, record: Row) -> Result<RecordId, GatewayError> {
        if collection.is_read_only() {
            return Err(GatewayError::ReadOnly(collection));
        }
        self.write_returning(collection, record, PREFER_REPRESENTATION)
            .await
    }

    async fn update(
        &self,
        collection: Collection,
        id: RecordId,
        patch: Row,
    ) -> Result<(), GatewayError> {
        if collection.is_read_only() {
            return Err(GatewayError::ReadOnly(collection));
        }
        let builder = self
            .request(Method::PATCH, collection)?
            .header("Prefer", PREFER_MINIMAL)
            .query(&[("id", eq_filter(&Value::from(id.as_str())))])
            .json(&Value::Object(patch));
        Self::send(builder).await?;
        Ok(())
    }

    async fn upsert(&self, collection: Collection, record: Row) -> Result<RecordId, GatewayError> {
        if collection.is_read_only() {
            return Err(GatewayError::ReadOnly(collection));
        }
        self.write_returning(collection, record, PREFER_MERGE).await
    }

    async fn delete(&self, collection: Collection, spec: MatchSpec) -> Result<(), GatewayError> {
        if collection.is_read_only() {
            return Err(GatewayError::ReadOnly(collection));
        }
        let params: Vec<(String, String)> = spec
            .pairs()
            .into_iter()
            .map(|(column, value)| (column.to_string(), eq_filter(&value)))
            .collect();
        let builder = self
            .request(Method::DELETE, collection)?
            .header("Prefer", PREFER_MINIMAL)
            .query(&params);
        Self::send(builder).await?;
        Ok(())
    }
}

/// Query parameters for a nested select
fn select_params(query: &SelectQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), select_clause(&query.joins))];
    for filter in &query.filters {
        params.push((filter.column.clone(), eq_filter(&filter.value)));
    }
    if !query.order.is_empty() {
        params.push(("order".to_string(), order_clause(&query.order)));
    }
    for join in &query.joins {
        embedded_order_params(join, "", &mut params);
    }
    params
}

/// `*` followed by one embedded resource per join
fn select_clause(joins: &[Join]) -> String {
    let mut clause = String::from("*");
    for join in joins {
        clause.push(',');
        if join.alias.is_some() {
            clause.push_str(join.key());
            clause.push(':');
        }
        clause.push_str(join.collection.name());
        if let Relation::BelongsTo { local_key } = join.relation {
            // disambiguate by the referencing column
            clause.push('!');
            clause.push_str(local_key);
        }
        clause.push('(');
        clause.push_str(&select_clause(&join.joins));
        clause.push(')');
    }
    clause
}

fn embedded_order_params(join: &Join, prefix: &str, params: &mut Vec<(String, String)>) {
    let path = if prefix.is_empty() {
        join.key().to_string()
    } else {
        format!("{prefix}.{}", join.key())
    };
    if !join.order.is_empty() {
        params.push((format!("{path}.order"), order_clause(&join.order)));
    }
    for nested in &join.joins {
        embedded_order_params(nested, &path, params);
    }
}

fn order_clause(order: &[OrderBy]) -> String {
    order
        .iter()
        .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
        .collect::<Vec<_>>()
        .join(",")
}

fn eq_filter(value: &Value) -> String {
    match value {
        Value::String(s) => format!("eq.{s}"),
        Value::Null => "is.null".to_string(),
        other => format!("eq.{other}"),
    }
}

fn returned_id(collection: Collection, row: &Row) -> Option<String> {
    if collection.has_identity() {
        row_id(row, "id")
    } else {
        match (row_id(row, "persona_id"), row_id(row, "step_id")) {
            (Some(p), Some(s)) => Some(format!("{p}:{s}")),
            _ => None,
        }
    }
}

/// Prefer the store's JSON `message`, fall back to the raw body or status text
fn error_message(body: &str, reason: Option<&str>) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    match from_json {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => reason.unwrap_or("request rejected").to_string(),
    }
}
