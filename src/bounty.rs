//! Bounty read side
//!
//! Queries that back the bounty list and detail views: created-bounty events,
//! the `DatasetBounty` object, and the blob table that maps file names to
//! Walrus blob ids. Move `u64`s arrive as JSON strings or numbers; both decode.

use crate::chain::{ChainClient, ChainError, ObjectResponse};
use crate::config::ContractConfig;
use crate::response::lookup_field;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

const PAGE_SIZE: usize = 50;

/// Blob table field; the deployed contract spells it `walrus_bolb_ids`
const BLOB_TABLE_KEYS: &[&str] = &["walrus_bolb_ids", "walrus_blob_ids"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BountyError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("Bounty content not found")]
    ContentNotFound,

    #[error("Invalid bounty data structure: {0}")]
    InvalidStructure(String),
}

/// Entry of the bounty list, decoded from a `CreateBountyEvent`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BountySummary {
    pub id: String,
    pub name: String,
    pub allowed_labels: Vec<String>,
    pub total_images: u64,
}

impl BountySummary {
    /// Decode an event payload; `None` when it is not an object or has no id
    pub fn from_event_payload(payload: &Value) -> Option<Self> {
        let fields = payload.as_object()?;
        Some(Self {
            id: fields.get("id").and_then(object_id)?,
            name: string_field(fields, "name"),
            allowed_labels: string_list(fields.get("allowed_labels")),
            total_images: fields.get("total_images").and_then(as_u64).unwrap_or(0),
        })
    }
}

/// Table of file name → blob id dynamic fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobTable {
    pub id: String,
    pub size: u64,
}

/// On-chain `DatasetBounty`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetBounty {
    pub id: String,
    pub name: String,
    pub allowed_labels: Vec<String>,
    pub blob_table: BlobTable,
    /// Escrowed reward in MIST
    pub reward_pool: u64,
    pub total_images: u64,
    pub completed_counts: u64,
}

impl DatasetBounty {
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, BountyError> {
        let invalid = |what: &str| BountyError::InvalidStructure(what.to_string());

        let id = fields.get("id").and_then(object_id).ok_or_else(|| invalid("missing id"))?;

        let table = lookup_field(fields, BLOB_TABLE_KEYS)
            .map(struct_fields)
            .ok_or_else(|| invalid("missing blob table"))?;
        let blob_table = BlobTable {
            id: table
                .get("id")
                .and_then(object_id)
                .ok_or_else(|| invalid("blob table has no id"))?,
            size: table.get("size").and_then(as_u64).unwrap_or(0),
        };

        Ok(Self {
            id,
            name: string_field(fields, "name"),
            allowed_labels: string_list(fields.get("allowed_labels")),
            blob_table,
            reward_pool: fields.get("reward_pool").and_then(as_u64).unwrap_or(0),
            total_images: fields.get("total_images").and_then(as_u64).unwrap_or(0),
            completed_counts: fields.get("completed_counts").and_then(as_u64).unwrap_or(0),
        })
    }
}

/// Dynamic field object (`name` → `value`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicFieldEntry {
    pub id: String,
    pub name: String,
    pub value: Value,
}

/// One file of a bounty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BountyFile {
    pub file_name: String,
    /// `None` when the field object could not be read
    pub blob_id: Option<String>,
    pub field_id: String,
}

/// All bounties announced by `CreateBountyEvent`, oldest first
pub async fn list_bounties(
    client: &dyn ChainClient,
    contract: &ContractConfig,
) -> Result<Vec<BountySummary>, BountyError> {
    let event_type = contract.event_type(&contract.create_bounty_event);
    let mut bounties = Vec::new();
    let mut cursor: Option<Value> = None;

    loop {
        let page = client
            .query_events(&event_type, cursor.as_ref(), Some(PAGE_SIZE), false)
            .await?;

        for event in &page.data {
            match event.parsed_json.as_ref().and_then(BountySummary::from_event_payload) {
                Some(summary) => bounties.push(summary),
                None => debug!(event_type = %event.event_type, "Skipping event without bounty payload"),
            }
        }

        if !page.has_next_page || page.next_cursor.is_none() {
            break;
        }
        cursor = page.next_cursor;
    }

    debug!(count = bounties.len(), "Loaded bounty list");
    Ok(bounties)
}

fn content_fields(response: &ObjectResponse) -> Result<&Map<String, Value>, BountyError> {
    let content = response
        .data
        .as_ref()
        .and_then(|data| data.content.as_ref())
        .ok_or(BountyError::ContentNotFound)?;
    content
        .move_fields()
        .ok_or_else(|| BountyError::InvalidStructure(format!("{} content has no fields", content.data_type)))
}

/// Read one bounty object
pub async fn get_bounty(client: &dyn ChainClient, bounty_id: &str) -> Result<DatasetBounty, BountyError> {
    let response = client.get_object(bounty_id).await?;
    DatasetBounty::from_fields(content_fields(&response)?)
}

/// Read one dynamic field object
pub async fn get_dynamic_field(client: &dyn ChainClient, field_id: &str) -> Result<DynamicFieldEntry, BountyError> {
    let response = client.get_object(field_id).await?;
    let fields = content_fields(&response)?;

    Ok(DynamicFieldEntry {
        id: fields
            .get("id")
            .and_then(object_id)
            .unwrap_or_else(|| field_id.to_string()),
        name: fields.get("name").map(value_to_string).unwrap_or_default(),
        value: fields.get("value").cloned().unwrap_or(Value::Null),
    })
}

/// Files of a bounty's blob table
///
/// A field object that cannot be read is kept with the name from the listing
/// and no blob id.
pub async fn list_bounty_files(client: &dyn ChainClient, table_id: &str) -> Result<Vec<BountyFile>, BountyError> {
    let mut files = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = client
            .get_dynamic_fields(table_id, cursor.as_deref(), Some(PAGE_SIZE))
            .await?;

        for info in &page.data {
            let file = match get_dynamic_field(client, &info.object_id).await {
                Ok(entry) => BountyFile {
                    file_name: entry.name,
                    blob_id: Some(value_to_string(&entry.value)),
                    field_id: info.object_id.clone(),
                },
                Err(e) => {
                    warn!(field_id = %info.object_id, error = %e, "Failed to read file entry");
                    BountyFile {
                        file_name: value_to_string(&info.name.value),
                        blob_id: None,
                        field_id: info.object_id.clone(),
                    }
                }
            };
            files.push(file);
        }

        if !page.has_next_page || page.next_cursor.is_none() {
            break;
        }
        cursor = page.next_cursor;
    }

    Ok(files)
}

/// `{"fields": {...}}` wrapper or a bare object
fn struct_fields(value: &Value) -> &Map<String, Value> {
    static EMPTY: once_cell::sync::Lazy<Map<String, Value>> = once_cell::sync::Lazy::new(Map::new);
    value
        .get("fields")
        .and_then(Value::as_object)
        .or_else(|| value.as_object())
        .unwrap_or(&EMPTY)
}

/// `"0x…"`, `{"id": "0x…"}` or `{"id": {"id": "0x…"}}`
fn object_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Object(map) => map.get("id").and_then(object_id),
        _ => None,
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        // Balance<T> renders as {"value": "..."} in some fullnode versions
        Value::Object(map) => map.get("value").and_then(as_u64),
        _ => None,
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> String {
    fields.get(key).map(value_to_string).unwrap_or_default()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().map(value_to_string).collect())
        .unwrap_or_default()
}
