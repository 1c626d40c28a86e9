//! Content and cross-reference checks.
//!
//! Every check collects all violations before failing, and reports them as
//! one `ValidationAggregate` error.

use std::sync::LazyLock;

use cirrus_core::{CloudError, CloudResult};
use regex::Regex;
use tracing::warn;

use crate::content::{GroupVersionContent, Resource, Subscription};

static DEFINITION_VERSION_ARN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^arn:aws:greengrass:[a-zA-Z0-9-]+:[0-9]{12}:greengrass/definition/([a-z]+)/([a-z0-9-]{36})/versions/([a-z0-9-]{36})$",
    )
    .expect("definition version ARN pattern is valid")
});

static THING_ARN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^arn:aws:iot:[a-zA-Z0-9-]+:[0-9]{12}:thing/[a-zA-Z0-9-]+$")
        .expect("thing ARN pattern is valid")
});

static FUNCTION_ARN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^arn:aws:lambda:[a-zA-Z0-9-]+:[0-9]{12}:function:[a-zA-Z0-9_-]+:[a-zA-Z0-9_-]+$")
        .expect("function ARN pattern is valid")
});

/// Definition kinds a group version can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    Cores,
    Devices,
    Functions,
    Resources,
    Subscriptions,
}

impl DefinitionKind {
    /// Order in which group references are checked and reported.
    pub const ALL: [DefinitionKind; 5] = [
        DefinitionKind::Cores,
        DefinitionKind::Functions,
        DefinitionKind::Resources,
        DefinitionKind::Devices,
        DefinitionKind::Subscriptions,
    ];

    /// Path segment under `greengrass/definition/`.
    pub fn arn_segment(self) -> &'static str {
        match self {
            DefinitionKind::Cores => "cores",
            DefinitionKind::Devices => "devices",
            DefinitionKind::Functions => "functions",
            DefinitionKind::Resources => "resources",
            DefinitionKind::Subscriptions => "subscriptions",
        }
    }

    pub fn missing_reference(self) -> &'static str {
        match self {
            DefinitionKind::Cores => "Cores definition reference does not exist",
            DefinitionKind::Devices => "Devices definition reference does not exist",
            DefinitionKind::Functions => "Lambda definition reference does not exist",
            DefinitionKind::Resources => "Resource definition reference does not exist",
            DefinitionKind::Subscriptions => "Subscription definition reference does not exist",
        }
    }
}

impl GroupVersionContent {
    pub fn reference(&self, kind: DefinitionKind) -> Option<&str> {
        let arn = match kind {
            DefinitionKind::Cores => &self.core_definition_version_arn,
            DefinitionKind::Devices => &self.device_definition_version_arn,
            DefinitionKind::Functions => &self.function_definition_version_arn,
            DefinitionKind::Resources => &self.resource_definition_version_arn,
            DefinitionKind::Subscriptions => &self.subscription_definition_version_arn,
        };
        arn.as_deref()
    }
}

/// Check every reference of a group version against the live stores.
///
/// `stored_arn(kind, definition_id, version_id)` returns the ARN recorded on
/// that version, or `None` when the definition or version does not exist.
pub fn validate_group_references<F>(content: &GroupVersionContent, stored_arn: F) -> CloudResult<()>
where
    F: Fn(DefinitionKind, &str, &str) -> Option<String>,
{
    let mut details = Vec::new();
    for kind in DefinitionKind::ALL {
        let Some(arn) = content.reference(kind) else {
            continue;
        };
        let resolves = DEFINITION_VERSION_ARN
            .captures(arn)
            .filter(|caps| &caps[1] == kind.arn_segment())
            .and_then(|caps| stored_arn(kind, &caps[2], &caps[3]))
            .is_some_and(|stored| stored == arn);
        if !resolves {
            details.push(kind.missing_reference().to_string());
        }
    }
    aggregate("The group is invalid or corrupted.", details)
}

pub fn validate_resources(resources: &[Resource]) -> CloudResult<()> {
    let mut details = Vec::new();
    for resource in resources {
        let container = &resource.resource_data_container;
        if let Some(volume) = &container.local_volume_resource_data {
            let path = volume.source_path.as_str();
            if path == "/sys" || path.starts_with("/sys/") {
                details.push("Accessing /sys is prohibited".to_string());
            }
        }
        if let Some(device) = &container.local_device_resource_data {
            if !device.source_path.starts_with("/dev") {
                details.push(format!(
                    "Device resource path should begin with /dev, but got: {}",
                    device.source_path
                ));
            }
        }
    }
    aggregate("The resources definition is invalid.", details)
}

/// `cloud`, the shadow service, a thing ARN, or a qualified function ARN.
fn is_valid_endpoint(endpoint: &str) -> bool {
    matches!(endpoint, "cloud" | "GGShadowService")
        || THING_ARN.is_match(endpoint)
        || FUNCTION_ARN.is_match(endpoint)
}

pub fn validate_subscriptions(subscriptions: &[Subscription]) -> CloudResult<()> {
    let mut details = Vec::new();
    for subscription in subscriptions {
        if !is_valid_endpoint(&subscription.source) {
            details.push(format!(
                "Subscription source is invalid. ID is '{}' and Source is '{}'",
                subscription.id, subscription.source
            ));
        }
        if !is_valid_endpoint(&subscription.target) {
            details.push(format!(
                "Subscription target is invalid. ID is '{}' and Target is '{}'",
                subscription.id, subscription.target
            ));
        }
    }
    aggregate("The subscriptions definition is invalid or corrupted.", details)
}

fn aggregate(context: &str, details: Vec<String>) -> CloudResult<()> {
    if details.is_empty() {
        return Ok(());
    }
    warn!(%context, violations = details.len(), "validation failed");
    Err(CloudError::ValidationAggregate {
        context: context.to_string(),
        details,
    })
}
