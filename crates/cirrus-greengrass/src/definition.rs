//! Generic container-with-versions storage.
//!
//! Every definition kind, and groups, share one shape: a container addressed
//! by a generated id, owning an insertion-ordered map of immutable versions
//! and an explicit pointer to the latest one. Versions live inside their
//! container, so deleting a container drops its versions in the same step.

use std::fmt;

use chrono::{DateTime, Utc};
use cirrus_core::{Arn, BackendContext, CloudError, CloudResult, time};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;
use uuid::Uuid;

/// Payload type of one container kind.
/// `Default` is the empty payload a container starts with when created
/// without an initial version.
pub trait VersionContent: Clone + Default + fmt::Debug + Serialize + Send + 'static {
    /// Name used in error messages and logs.
    const RESOURCE: &'static str;
    /// ARN resource path of the container, without its id.
    const ARN_PREFIX: &'static str;

    /// Content checks that need nothing but the payload itself.
    fn validate(&self) -> CloudResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Version<C> {
    /// Id of the owning container.
    pub id: String,
    pub version: String,
    pub arn: Arn,
    pub created_at: DateTime<Utc>,
    pub content: C,
}

impl<C: VersionContent> Version<C> {
    /// Summary form, as returned by create and list calls.
    pub fn to_value(&self) -> Value {
        json!({
            "Arn": self.arn,
            "CreationTimestamp": time::iso8601_millis(&self.created_at),
            "Id": self.id,
            "Version": self.version,
        })
    }

    /// Summary plus the `Definition` payload.
    pub fn to_detail_value(&self) -> Value {
        let mut obj = self.to_value();
        obj["Definition"] = serde_json::to_value(&self.content).unwrap_or(Value::Null);
        obj
    }
}

#[derive(Debug, Clone)]
pub struct Definition<C> {
    pub id: String,
    pub name: Option<String>,
    pub arn: Arn,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub latest_version: Option<String>,
    pub latest_version_arn: Option<Arn>,
    versions: IndexMap<String, Version<C>>,
}

impl<C: VersionContent> Definition<C> {
    fn new(ctx: &BackendContext, name: Option<String>) -> Self {
        let id = Uuid::new_v4().to_string();
        let now = time::now();
        Self {
            arn: ctx.arn(&format!("{}/{id}", C::ARN_PREFIX)),
            id,
            name,
            created_at: now,
            last_updated: now,
            latest_version: None,
            latest_version_arn: None,
            versions: IndexMap::new(),
        }
    }

    /// Append a version and repoint `latest` at it.
    fn push_version(&mut self, content: C) -> &Version<C> {
        let version_id = Uuid::new_v4().to_string();
        let version = Version {
            id: self.id.clone(),
            arn: self.arn.versioned(&version_id),
            version: version_id.clone(),
            created_at: time::now(),
            content,
        };
        self.latest_version = Some(version_id.clone());
        self.latest_version_arn = Some(version.arn.clone());
        self.last_updated = version.created_at;
        let (index, _) = self.versions.insert_full(version_id, version);
        &self.versions[index]
    }

    pub fn latest(&self) -> Option<&Version<C>> {
        self.latest_version
            .as_ref()
            .and_then(|id| self.versions.get(id))
    }

    pub fn versions(&self) -> impl Iterator<Item = &Version<C>> {
        self.versions.values()
    }

    pub fn version(&self, version_id: &str) -> Option<&Version<C>> {
        self.versions.get(version_id)
    }

    pub fn to_value(&self) -> Value {
        let mut obj = json!({
            "Arn": self.arn,
            "CreationTimestamp": time::iso8601_millis(&self.created_at),
            "Id": self.id,
            "LastUpdatedTimestamp": time::iso8601_millis(&self.last_updated),
            "LatestVersion": self.latest_version,
            "LatestVersionArn": self.latest_version_arn,
        });
        if let Some(name) = &self.name {
            obj["Name"] = Value::from(name.as_str());
        }
        obj
    }
}

/// All containers of one kind within a region.
#[derive(Debug)]
pub struct DefinitionStore<C> {
    ctx: BackendContext,
    items: IndexMap<String, Definition<C>>,
}

impl<C: VersionContent> DefinitionStore<C> {
    pub fn new(ctx: BackendContext) -> Self {
        Self {
            ctx,
            items: IndexMap::new(),
        }
    }

    /// Register a container together with its first version, which is empty
    /// when `initial` is not given. Content is validated before anything is
    /// stored.
    pub fn create(
        &mut self,
        name: Option<String>,
        initial: Option<C>,
    ) -> CloudResult<&Definition<C>> {
        let content = initial.unwrap_or_default();
        content.validate()?;
        let mut definition = Definition::new(&self.ctx, name);
        definition.push_version(content);
        debug!(resource = C::RESOURCE, id = %definition.id, "created");
        let (index, _) = self.items.insert_full(definition.id.clone(), definition);
        Ok(&self.items[index])
    }

    pub fn list(&self) -> Vec<&Definition<C>> {
        self.items.values().collect()
    }

    pub fn get(&self, id: &str) -> CloudResult<&Definition<C>> {
        self.items
            .get(id)
            .ok_or_else(|| CloudError::not_found(C::RESOURCE, id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Rename a container. An empty name is not an update.
    pub fn update(&mut self, id: &str, name: &str) -> CloudResult<()> {
        if name.is_empty() {
            return Err(CloudError::invalid_input(
                "Input does not contain any attributes to be updated",
            ));
        }
        let definition = self
            .items
            .get_mut(id)
            .ok_or_else(|| CloudError::not_found(C::RESOURCE, id))?;
        definition.name = Some(name.to_string());
        definition.last_updated = time::now();
        debug!(resource = C::RESOURCE, %id, %name, "renamed");
        Ok(())
    }

    /// Remove a container together with every version it owns.
    pub fn delete(&mut self, id: &str) -> CloudResult<Definition<C>> {
        let definition = self
            .items
            .shift_remove(id)
            .ok_or_else(|| CloudError::not_found(C::RESOURCE, id))?;
        debug!(
            resource = C::RESOURCE,
            %id,
            versions = definition.versions.len(),
            "deleted"
        );
        Ok(definition)
    }

    pub fn create_version(&mut self, id: &str, content: C) -> CloudResult<&Version<C>> {
        let definition = self
            .items
            .get_mut(id)
            .ok_or_else(|| CloudError::not_found(C::RESOURCE, id))?;
        content.validate()?;
        let version = definition.push_version(content);
        debug!(resource = C::RESOURCE, %id, version = %version.version, "version created");
        Ok(version)
    }

    pub fn list_versions(&self, id: &str) -> CloudResult<Vec<&Version<C>>> {
        Ok(self.get(id)?.versions().collect())
    }

    pub fn get_version(&self, id: &str, version_id: &str) -> CloudResult<&Version<C>> {
        self.get(id)?
            .version(version_id)
            .ok_or_else(|| CloudError::version_not_found(C::RESOURCE, id, version_id))
    }

    /// Stored ARN of a version, if both container and version exist.
    pub fn version_arn(&self, id: &str, version_id: &str) -> Option<&Arn> {
        self.items
            .get(id)
            .and_then(|definition| definition.version(version_id))
            .map(|version| &version.arn)
    }
}
