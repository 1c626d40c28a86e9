//! The per-region IoT-edge store.

use std::collections::HashMap;

use cirrus_core::{BackendContext, CloudResult, RegionBackend, TagStore};
use indexmap::IndexMap;
use tracing::debug;

use crate::content::{
    CoreDefinitionContent, DeviceDefinitionContent, FunctionDefinitionContent,
    GroupVersionContent, ResourceDefinitionContent, SubscriptionDefinitionContent,
};
use crate::definition::{Definition, DefinitionStore, Version};
use crate::validation::{self, DefinitionKind};

/// Generate the eight container operations of one definition kind.
macro_rules! definition_ops {
    (
        $store:ident: $content:ty,
        $create:ident, $list:ident, $get:ident, $update:ident, $delete:ident,
        $create_version:ident, $list_versions:ident, $get_version:ident
    ) => {
        pub fn $create(
            &mut self,
            name: Option<String>,
            initial_version: Option<$content>,
            tags: IndexMap<String, String>,
        ) -> CloudResult<&Definition<$content>> {
            let definition = self.$store.create(name, initial_version)?;
            if !tags.is_empty() {
                self.tagger.tag(definition.arn.as_str(), tags);
            }
            Ok(definition)
        }

        pub fn $list(&self) -> Vec<&Definition<$content>> {
            self.$store.list()
        }

        pub fn $get(&self, id: &str) -> CloudResult<&Definition<$content>> {
            self.$store.get(id)
        }

        pub fn $update(&mut self, id: &str, name: &str) -> CloudResult<()> {
            self.$store.update(id, name)
        }

        pub fn $delete(&mut self, id: &str) -> CloudResult<()> {
            self.$store.delete(id).map(|_| ())
        }

        pub fn $create_version(
            &mut self,
            id: &str,
            content: $content,
        ) -> CloudResult<&Version<$content>> {
            self.$store.create_version(id, content)
        }

        pub fn $list_versions(&self, id: &str) -> CloudResult<Vec<&Version<$content>>> {
            self.$store.list_versions(id)
        }

        pub fn $get_version(&self, id: &str, version_id: &str) -> CloudResult<&Version<$content>> {
            self.$store.get_version(id, version_id)
        }
    };
}

/// All IoT-edge state for one region.
pub struct GreengrassBackend {
    ctx: BackendContext,
    cores: DefinitionStore<CoreDefinitionContent>,
    devices: DefinitionStore<DeviceDefinitionContent>,
    functions: DefinitionStore<FunctionDefinitionContent>,
    resources: DefinitionStore<ResourceDefinitionContent>,
    subscriptions: DefinitionStore<SubscriptionDefinitionContent>,
    groups: DefinitionStore<GroupVersionContent>,
    tagger: TagStore,
}

impl RegionBackend for GreengrassBackend {
    const SERVICE: &'static str = "greengrass";

    fn new(ctx: BackendContext) -> Self {
        Self {
            cores: DefinitionStore::new(ctx.clone()),
            devices: DefinitionStore::new(ctx.clone()),
            functions: DefinitionStore::new(ctx.clone()),
            resources: DefinitionStore::new(ctx.clone()),
            subscriptions: DefinitionStore::new(ctx.clone()),
            groups: DefinitionStore::new(ctx.clone()),
            tagger: TagStore::new(),
            ctx,
        }
    }
}

impl GreengrassBackend {
    pub fn context(&self) -> &BackendContext {
        &self.ctx
    }

    // ── Definitions ────────────────────────────────────────────────

    definition_ops!(
        cores: CoreDefinitionContent,
        create_core_definition,
        list_core_definitions,
        get_core_definition,
        update_core_definition,
        delete_core_definition,
        create_core_definition_version,
        list_core_definition_versions,
        get_core_definition_version
    );

    definition_ops!(
        devices: DeviceDefinitionContent,
        create_device_definition,
        list_device_definitions,
        get_device_definition,
        update_device_definition,
        delete_device_definition,
        create_device_definition_version,
        list_device_definition_versions,
        get_device_definition_version
    );

    definition_ops!(
        functions: FunctionDefinitionContent,
        create_function_definition,
        list_function_definitions,
        get_function_definition,
        update_function_definition,
        delete_function_definition,
        create_function_definition_version,
        list_function_definition_versions,
        get_function_definition_version
    );

    definition_ops!(
        resources: ResourceDefinitionContent,
        create_resource_definition,
        list_resource_definitions,
        get_resource_definition,
        update_resource_definition,
        delete_resource_definition,
        create_resource_definition_version,
        list_resource_definition_versions,
        get_resource_definition_version
    );

    definition_ops!(
        subscriptions: SubscriptionDefinitionContent,
        create_subscription_definition,
        list_subscription_definitions,
        get_subscription_definition,
        update_subscription_definition,
        delete_subscription_definition,
        create_subscription_definition_version,
        list_subscription_definition_versions,
        get_subscription_definition_version
    );

    // ── Groups ─────────────────────────────────────────────────────

    /// Create a group. A group always starts with one version; without an
    /// initial version that version references nothing.
    pub fn create_group(
        &mut self,
        name: Option<String>,
        initial_version: Option<GroupVersionContent>,
        tags: IndexMap<String, String>,
    ) -> CloudResult<&Definition<GroupVersionContent>> {
        let content = initial_version.unwrap_or_default();
        self.validate_group_version(&content)?;
        let group = self.groups.create(name, Some(content))?;
        if !tags.is_empty() {
            self.tagger.tag(group.arn.as_str(), tags);
        }
        Ok(group)
    }

    pub fn list_groups(&self) -> Vec<&Definition<GroupVersionContent>> {
        self.groups.list()
    }

    pub fn get_group(&self, group_id: &str) -> CloudResult<&Definition<GroupVersionContent>> {
        self.groups.get(group_id)
    }

    pub fn update_group(&mut self, group_id: &str, name: &str) -> CloudResult<()> {
        self.groups.update(group_id, name)
    }

    pub fn delete_group(&mut self, group_id: &str) -> CloudResult<()> {
        self.groups.delete(group_id).map(|_| ())
    }

    pub fn create_group_version(
        &mut self,
        group_id: &str,
        content: GroupVersionContent,
    ) -> CloudResult<&Version<GroupVersionContent>> {
        // Existence first, so an unknown group reports NotFound rather than
        // its reference errors.
        self.groups.get(group_id)?;
        self.validate_group_version(&content)?;
        self.groups.create_version(group_id, content)
    }

    pub fn list_group_versions(
        &self,
        group_id: &str,
    ) -> CloudResult<Vec<&Version<GroupVersionContent>>> {
        self.groups.list_versions(group_id)
    }

    pub fn get_group_version(
        &self,
        group_id: &str,
        version_id: &str,
    ) -> CloudResult<&Version<GroupVersionContent>> {
        self.groups.get_version(group_id, version_id)
    }

    fn validate_group_version(&self, content: &GroupVersionContent) -> CloudResult<()> {
        validation::validate_group_references(content, |kind, id, version| {
            let arn = match kind {
                DefinitionKind::Cores => self.cores.version_arn(id, version),
                DefinitionKind::Devices => self.devices.version_arn(id, version),
                DefinitionKind::Functions => self.functions.version_arn(id, version),
                DefinitionKind::Resources => self.resources.version_arn(id, version),
                DefinitionKind::Subscriptions => self.subscriptions.version_arn(id, version),
            };
            arn.map(|arn| arn.to_string())
        })
    }

    // ── Tags ───────────────────────────────────────────────────────

    pub fn tag_resource(&mut self, arn: &str, tags: IndexMap<String, String>) {
        self.tagger.tag(arn, tags);
    }

    pub fn untag_resource(&mut self, arn: &str, keys: &[String]) {
        debug!(%arn, count = keys.len(), "resource untagged");
        self.tagger.untag(arn, keys.iter());
    }

    pub fn list_tags_for_resource(&self, arn: &str) -> HashMap<String, String> {
        self.tagger.get_tags(arn)
    }
}
