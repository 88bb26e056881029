//! Table store client

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use relaycast_core::{Continuation, EntitySegment, TableStore};

use crate::error::TableError;

const ACCEPT_JSON: &str = "application/json;odata=minimalmetadata";
const CONTINUATION_PARTITION_HEADER: &str = "x-ms-continuation-nextpartitionkey";
const CONTINUATION_ROW_HEADER: &str = "x-ms-continuation-nextrowkey";

/// REST client for one table store account
///
/// Holds a process-wide `reqwest` client; construct once at startup and share
/// via `Arc` across requests.
pub struct TableServiceClient {
    http: reqwest::Client,
    endpoint: Url,
    sas: String,
}

impl TableServiceClient {
    /// Create a client for the account at `endpoint`, authorized by the
    /// shared-access credential `sas` (a raw query string, leading `?`
    /// tolerated)
    pub fn new(endpoint: &str, sas: &str) -> Result<Self, TableError> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| TableError::Endpoint(e.to_string()))?;
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            sas: sas.trim_start_matches('?').to_string(),
        })
    }

    fn base(&self) -> &str {
        self.endpoint.as_str().trim_end_matches('/')
    }

    /// URL of a whole-table scan
    fn table_url(&self, table: &str, continuation: Option<&Continuation>) -> String {
        let mut url = format!("{}/{}()?{}", self.base(), table, self.sas);
        if let Some(token) = continuation {
            url.push_str("&NextPartitionKey=");
            url.push_str(&token.next_partition_key);
            if let Some(row) = &token.next_row_key {
                url.push_str("&NextRowKey=");
                url.push_str(row);
            }
        }
        url
    }

    /// URL of a single entity
    fn entity_url(&self, table: &str, partition_key: &str, row_key: &str) -> String {
        format!(
            "{}/{}(PartitionKey='{}',RowKey='{}')?{}",
            self.base(),
            table,
            escape_key(partition_key),
            escape_key(row_key),
            self.sas
        )
    }

    /// URL inserts are POSTed to
    fn insert_url(&self, table: &str) -> String {
        format!("{}/{}?{}", self.base(), table, self.sas)
    }
}

/// Double single quotes per the store's key quoting rules
fn escape_key(key: &str) -> String {
    key.replace('\'', "''")
}

/// Continuation token from scan response headers, if any
fn parse_continuation(headers: &HeaderMap) -> Option<Continuation> {
    let next_partition_key = headers
        .get(CONTINUATION_PARTITION_HEADER)?
        .to_str()
        .ok()?
        .to_string();
    let next_row_key = headers
        .get(CONTINUATION_ROW_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Some(Continuation {
        next_partition_key,
        next_row_key,
    })
}

/// Entity list from a scan response body (`{"value": [...]}`)
fn entities_from_body(body: Value) -> Result<Vec<Value>, TableError> {
    match body {
        Value::Object(mut map) => match map.remove("value") {
            Some(Value::Array(entities)) => Ok(entities),
            _ => Err(TableError::Body("missing \"value\" array".to_string())),
        },
        _ => Err(TableError::Body("expected a JSON object".to_string())),
    }
}

#[async_trait]
impl TableStore for TableServiceClient {
    async fn query_segment(
        &self,
        table: &str,
        continuation: Option<&Continuation>,
    ) -> relaycast_core::Result<EntitySegment> {
        let response = self
            .http
            .get(self.table_url(table, continuation))
            .header(reqwest::header::ACCEPT, ACCEPT_JSON)
            .send()
            .await
            .map_err(TableError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TableError::Status {
                status: status.as_u16(),
                operation: "query",
                table: table.to_string(),
            }
            .into());
        }

        let next = parse_continuation(response.headers());
        let body: Value = response.json().await.map_err(TableError::from)?;
        let entities = entities_from_body(body)?;

        tracing::debug!(table, rows = entities.len(), more = next.is_some(), "scanned segment");
        Ok(EntitySegment {
            entities,
            continuation: next,
        })
    }

    async fn get_entity(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> relaycast_core::Result<Option<Value>> {
        let response = self
            .http
            .get(self.entity_url(table, partition_key, row_key))
            .header(reqwest::header::ACCEPT, ACCEPT_JSON)
            .send()
            .await
            .map_err(TableError::from)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(TableError::Status {
                status: status.as_u16(),
                operation: "get",
                table: table.to_string(),
            }
            .into());
        }

        let entity: Value = response.json().await.map_err(TableError::from)?;
        Ok(Some(entity))
    }

    async fn insert_entity(&self, table: &str, entity: &Value) -> relaycast_core::Result<()> {
        let response = self
            .http
            .post(self.insert_url(table))
            .header(reqwest::header::ACCEPT, ACCEPT_JSON)
            .header("Prefer", "return-no-content")
            .json(entity)
            .send()
            .await
            .map_err(TableError::from)?;

        let status = response.status();
        // 409 means the row already exists: surfaced as a conflict so the
        // ingestion retry loop can re-read and merge instead
        if status == StatusCode::CONFLICT {
            return Err(TableError::Conflict {
                table: table.to_string(),
                partition_key: entity
                    .get("PartitionKey")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                row_key: entity
                    .get("RowKey")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            }
            .into());
        }
        if !status.is_success() {
            return Err(TableError::Status {
                status: status.as_u16(),
                operation: "insert",
                table: table.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn merge_entity(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
        etag: &str,
        entity: &Value,
    ) -> relaycast_core::Result<()> {
        let response = self
            .http
            .patch(self.entity_url(table, partition_key, row_key))
            .header(reqwest::header::ACCEPT, ACCEPT_JSON)
            .header(reqwest::header::IF_MATCH, etag)
            .json(entity)
            .send()
            .await
            .map_err(TableError::from)?;

        let status = response.status();
        if status == StatusCode::PRECONDITION_FAILED {
            return Err(TableError::Conflict {
                table: table.to_string(),
                partition_key: partition_key.to_string(),
                row_key: row_key.to_string(),
            }
            .into());
        }
        if !status.is_success() {
            return Err(TableError::Status {
                status: status.as_u16(),
                operation: "merge",
                table: table.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
