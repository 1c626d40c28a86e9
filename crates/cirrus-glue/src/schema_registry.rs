//! Schema registries and the request limits enforced when creating them.

use chrono::{DateTime, Utc};
use cirrus_core::{Arn, CloudError, CloudResult, time};
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Value, json};
use std::sync::LazyLock;

pub const MAX_REGISTRIES: usize = 10;
pub const MAX_NAME_BYTES: usize = 255;
pub const MAX_DESCRIPTION_BYTES: usize = 2048;
pub const MAX_TAGS: usize = 50;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_$#.-]+$").expect("registry name pattern is valid"));

#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    pub name: String,
    pub arn: Arn,
    pub description: Option<String>,
    pub tags: IndexMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SchemaRegistry {
    pub(crate) fn new(
        name: &str,
        arn: Arn,
        description: Option<String>,
        tags: IndexMap<String, String>,
    ) -> Self {
        let now = time::now();
        Self {
            name: name.to_string(),
            arn,
            description,
            tags,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "RegistryArn": self.arn,
            "RegistryName": self.name,
            "Description": self.description,
            "Tags": self.tags,
            "CreatedTime": time::iso8601(&self.created_at),
            "UpdatedTime": time::iso8601(&self.updated_at),
        })
    }
}

/// Check a `CreateRegistry` request against the service limits. A taken
/// name is reported after the name checks and before the description and
/// tag checks.
pub(crate) fn validate_create(
    existing: usize,
    name_taken: bool,
    name: &str,
    description: Option<&str>,
    tags: &IndexMap<String, String>,
) -> CloudResult<()> {
    if existing >= MAX_REGISTRIES {
        return Err(CloudError::LimitExceeded(format!(
            "CreateRegistry: more than {MAX_REGISTRIES} registries"
        )));
    }
    if name.is_empty() || name.len() > MAX_NAME_BYTES {
        return Err(CloudError::LimitExceeded(format!(
            "CreateRegistry: registryName must be 1 to {MAX_NAME_BYTES} bytes"
        )));
    }
    if !NAME_PATTERN.is_match(name) {
        return Err(CloudError::invalid_input(
            "CreateRegistry: registryName contains invalid characters",
        ));
    }
    if name_taken {
        return Err(CloudError::already_exists("registry", name));
    }
    if let Some(description) = description {
        if description.len() > MAX_DESCRIPTION_BYTES {
            return Err(CloudError::LimitExceeded(format!(
                "CreateRegistry: description exceeds {MAX_DESCRIPTION_BYTES} bytes"
            )));
        }
        if description
            .chars()
            .any(|c| c.is_control() && !matches!(c, '\r' | '\n' | '\t'))
        {
            return Err(CloudError::invalid_input(
                "CreateRegistry: description contains invalid characters",
            ));
        }
    }
    if tags.len() > MAX_TAGS {
        return Err(CloudError::invalid_input(format!(
            "CreateRegistry: no more than {MAX_TAGS} tags are allowed"
        )));
    }
    Ok(())
}
