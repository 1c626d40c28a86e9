//! Version payloads, one type per definition kind.
//!
//! Field names follow the wire format (PascalCase). Optional fields that were
//! not supplied are left out again on output, so a stored version renders
//! exactly the content it was created with.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::definition::VersionContent;
use crate::validation;
use cirrus_core::CloudResult;

// ── Cores / devices ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Core {
    pub certificate_arn: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_shadow: Option<bool>,
    pub thing_arn: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Device {
    pub certificate_arn: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_shadow: Option<bool>,
    pub thing_arn: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CoreDefinitionContent {
    pub cores: Vec<Core>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceDefinitionContent {
    pub devices: Vec<Device>,
}

// ── Functions ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Function {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_configuration: Option<Value>,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionDefaultConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionDefinitionContent {
    pub functions: Vec<Function>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_config: Option<FunctionDefaultConfig>,
}

// ── Resources ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocalDeviceResourceData {
    pub source_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_owner_setting: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocalVolumeResourceData {
    pub source_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_owner_setting: Option<Value>,
}

/// Exactly one member is expected to be set; the model, secret and S3
/// variants are stored without inspection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceDataContainer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_device_resource_data: Option<LocalDeviceResourceData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_volume_resource_data: Option<LocalVolumeResourceData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_machine_learning_model_resource_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sage_maker_machine_learning_model_resource_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets_manager_secret_resource_data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub resource_data_container: ResourceDataContainer,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceDefinitionContent {
    pub resources: Vec<Resource>,
}

// ── Subscriptions ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Subscription {
    pub id: String,
    pub source: String,
    pub subject: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubscriptionDefinitionContent {
    pub subscriptions: Vec<Subscription>,
}

// ── Groups ─────────────────────────────────────────────────────────

/// References to one version of each definition kind. Every reference is
/// optional; an empty group version is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupVersionContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_definition_version_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_definition_version_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_definition_version_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_definition_version_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_definition_version_arn: Option<String>,
}

// ── Kind bindings ──────────────────────────────────────────────────

impl VersionContent for CoreDefinitionContent {
    const RESOURCE: &'static str = "core definition";
    const ARN_PREFIX: &'static str = "greengrass/definition/cores";
}

impl VersionContent for DeviceDefinitionContent {
    const RESOURCE: &'static str = "device definition";
    const ARN_PREFIX: &'static str = "greengrass/definition/devices";
}

impl VersionContent for FunctionDefinitionContent {
    const RESOURCE: &'static str = "function definition";
    const ARN_PREFIX: &'static str = "greengrass/definition/functions";
}

impl VersionContent for ResourceDefinitionContent {
    const RESOURCE: &'static str = "resource definition";
    const ARN_PREFIX: &'static str = "greengrass/definition/resources";

    fn validate(&self) -> CloudResult<()> {
        validation::validate_resources(&self.resources)
    }
}

impl VersionContent for SubscriptionDefinitionContent {
    const RESOURCE: &'static str = "subscription definition";
    const ARN_PREFIX: &'static str = "greengrass/definition/subscriptions";

    fn validate(&self) -> CloudResult<()> {
        validation::validate_subscriptions(&self.subscriptions)
    }
}

/// Group references depend on the other stores and are checked by the
/// backend before a group version reaches its store.
impl VersionContent for GroupVersionContent {
    const RESOURCE: &'static str = "group";
    const ARN_PREFIX: &'static str = "greengrass/groups";
}
