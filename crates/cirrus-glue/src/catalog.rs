//! Data catalog entities: databases, tables (with version history) and
//! partitions.
//!
//! Tables never overwrite their content: every update appends a snapshot, so a
//! table can be read as of any earlier version. Versions are 1-based when
//! addressed from outside and 0-based internally.

use std::fmt;

use chrono::{DateTime, Utc};
use cirrus_core::{CloudError, CloudResult, time};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::filter::PartitionFilter;

/// A column declaration, as used in `PartitionKeys`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Column {
    pub name: String,
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub column_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Column {
    pub fn new(name: &str, column_type: &str) -> Self {
        Self {
            name: name.to_string(),
            column_type: Some(column_type.to_string()),
            comment: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatabaseInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_table_default_permissions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_database: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<String>,
}

impl DatabaseInput {
    /// True when the input carries no attribute at all.
    pub fn is_empty(&self) -> bool {
        *self == DatabaseInput::default()
    }
}

/// One table content snapshot. Everything except `PartitionKeys` is passed
/// through untouched and echoed back on reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableInput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partition_keys: Vec<Column>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PartitionInput {
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl PartitionInput {
    pub fn new<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            attributes: Map::new(),
        }
    }
}

/// Structural identity of a partition: its ordered value list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKey(Vec<String>);

impl PartitionKey {
    pub fn new(values: &[String]) -> Self {
        PartitionKey(values.to_vec())
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for PartitionKey {
    /// Canonical rendering: the values as a JSON array.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string(&self.0).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

#[derive(Debug, Clone)]
pub struct Partition {
    pub database_name: String,
    pub table_name: String,
    pub created_at: DateTime<Utc>,
    pub input: PartitionInput,
}

impl Partition {
    fn new(database_name: &str, table_name: &str, input: PartitionInput) -> Self {
        Self {
            database_name: database_name.to_string(),
            table_name: table_name.to_string(),
            created_at: time::now(),
            input,
        }
    }

    pub fn key(&self) -> PartitionKey {
        PartitionKey::new(&self.input.values)
    }

    pub fn values(&self) -> &[String] {
        &self.input.values
    }

    pub fn to_value(&self) -> Value {
        let mut obj = json!({
            "DatabaseName": self.database_name,
            "TableName": self.table_name,
            "CreationTime": time::epoch_seconds(&self.created_at),
        });
        merge_into(&mut obj, &self.input);
        obj
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    pub database_name: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    versions: Vec<TableInput>,
    partitions: IndexMap<PartitionKey, Partition>,
}

impl Table {
    pub(crate) fn new(database_name: &str, name: &str, input: TableInput) -> Self {
        Self {
            database_name: database_name.to_string(),
            name: name.to_string(),
            created_at: time::now(),
            versions: vec![input],
            partitions: IndexMap::new(),
        }
    }

    /// Append a new content snapshot; earlier snapshots stay readable.
    pub(crate) fn update(&mut self, input: TableInput) {
        self.versions.push(input);
        debug!(
            database = %self.database_name,
            table = %self.name,
            version = self.versions.len(),
            "table version appended"
        );
    }

    pub fn latest(&self) -> &TableInput {
        // A table is created with its first snapshot and never loses one.
        &self.versions[self.versions.len() - 1]
    }

    pub fn version_count(&self) -> usize {
        self.versions.len()
    }

    /// Resolve an externally supplied 1-based version id.
    pub fn get_version(&self, version_id: &str) -> CloudResult<&TableInput> {
        let number: i64 = version_id
            .trim()
            .parse()
            .map_err(|e: std::num::ParseIntError| CloudError::invalid_input(e.to_string()))?;
        number
            .checked_sub(1)
            .and_then(|index| usize::try_from(index).ok())
            .and_then(|index| self.versions.get(index))
            .ok_or_else(|| CloudError::version_not_found("table", &self.name, version_id))
    }

    /// Every snapshot paired with its 1-based version id, oldest first.
    pub fn versions(&self) -> impl Iterator<Item = (String, &TableInput)> {
        self.versions
            .iter()
            .enumerate()
            .map(|(i, input)| ((i + 1).to_string(), input))
    }

    pub fn to_value(&self) -> Value {
        self.snapshot_value(self.latest())
    }

    pub fn snapshot_value(&self, snapshot: &TableInput) -> Value {
        let mut obj = json!({
            "DatabaseName": self.database_name,
            "Name": self.name,
            "CreateTime": time::iso8601(&self.created_at),
        });
        merge_into(&mut obj, snapshot);
        obj
    }

    // ── Partitions ─────────────────────────────────────────────────

    pub(crate) fn create_partition(&mut self, input: PartitionInput) -> CloudResult<&Partition> {
        let partition = Partition::new(&self.database_name, &self.name, input);
        let key = partition.key();
        if self.partitions.contains_key(&key) {
            return Err(CloudError::already_exists("partition", key.to_string()));
        }
        debug!(table = %self.name, %key, "partition created");
        let (index, _) = self.partitions.insert_full(key, partition);
        Ok(&self.partitions[index])
    }

    pub fn get_partition(&self, values: &[String]) -> CloudResult<&Partition> {
        let key = PartitionKey::new(values);
        self.partitions
            .get(&key)
            .ok_or_else(|| CloudError::not_found("partition", key.to_string()))
    }

    pub fn partitions(&self) -> impl Iterator<Item = &Partition> {
        self.partitions.values()
    }

    /// Partitions matching `expression`, in insertion order. `None` returns
    /// every partition.
    pub fn get_partitions(&self, expression: Option<&str>) -> CloudResult<Vec<&Partition>> {
        let Some(expression) = expression else {
            return Ok(self.partitions.values().collect());
        };
        let filter = PartitionFilter::parse(expression)?;
        let keys = &self.latest().partition_keys;
        let mut matched = Vec::new();
        for partition in self.partitions.values() {
            if filter.matches(keys, partition.values())? {
                matched.push(partition);
            }
        }
        Ok(matched)
    }

    /// Replace a partition. When the key is unchanged the entry is rewritten
    /// in place and keeps its listing position; otherwise it moves to the new
    /// key at the end of the listing.
    pub(crate) fn update_partition(
        &mut self,
        old_values: &[String],
        input: PartitionInput,
    ) -> CloudResult<()> {
        let old_key = PartitionKey::new(old_values);
        let partition = Partition::new(&self.database_name, &self.name, input);
        let new_key = partition.key();

        if old_key == new_key {
            let slot = self
                .partitions
                .get_mut(&old_key)
                .ok_or_else(|| CloudError::not_found("partition", old_key.to_string()))?;
            *slot = partition;
            debug!(table = %self.name, key = %new_key, "partition updated in place");
            return Ok(());
        }

        if !self.partitions.contains_key(&old_key) {
            return Err(CloudError::not_found("partition", old_key.to_string()));
        }
        if self.partitions.contains_key(&new_key) {
            return Err(CloudError::already_exists("partition", new_key.to_string()));
        }
        self.partitions.shift_remove(&old_key);
        debug!(table = %self.name, old = %old_key, new = %new_key, "partition re-keyed");
        self.partitions.insert(new_key, partition);
        Ok(())
    }

    pub(crate) fn delete_partition(&mut self, values: &[String]) -> CloudResult<()> {
        let key = PartitionKey::new(values);
        if self.partitions.shift_remove(&key).is_none() {
            return Err(CloudError::not_found("partition", key.to_string()));
        }
        debug!(table = %self.name, %key, "partition deleted");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Database {
    pub name: String,
    pub input: DatabaseInput,
    pub created_at: DateTime<Utc>,
    pub(crate) tables: IndexMap<String, Table>,
}

impl Database {
    pub(crate) fn new(name: &str, input: DatabaseInput) -> Self {
        Self {
            name: name.to_string(),
            input,
            created_at: time::now(),
            tables: IndexMap::new(),
        }
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn to_value(&self) -> Value {
        json!({
            "Name": self.name,
            "Description": self.input.description,
            "LocationUri": self.input.location_uri,
            "Parameters": self.input.parameters,
            "CreateTime": time::iso8601(&self.created_at),
            "CreateTableDefaultPermissions": self.input.create_table_default_permissions,
            "TargetDatabase": self.input.target_database,
            "CatalogId": self.input.catalog_id,
        })
    }
}

/// Overlay the serialized form of `input` onto `obj`.
fn merge_into<T: Serialize>(obj: &mut Value, input: &T) {
    if let (Some(target), Ok(Value::Object(source))) = (obj.as_object_mut(), serde_json::to_value(input)) {
        target.extend(source);
    }
}
