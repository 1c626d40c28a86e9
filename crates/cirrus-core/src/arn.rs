//! Amazon Resource Names.
//!
//! Format: `arn:aws:<service>:<region>:<account-id>:<resource-path>`, where the
//! resource path is `<kind>/<identifier>` optionally followed by
//! `/versions/<version-id>`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A fully rendered ARN string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arn(String);

impl Arn {
    pub fn new(service: &str, region: &str, account_id: &str, resource_path: &str) -> Self {
        Arn(format!(
            "arn:aws:{service}:{region}:{account_id}:{resource_path}"
        ))
    }

    /// ARN of a version nested under this resource.
    pub fn versioned(&self, version_id: &str) -> Arn {
        Arn(format!("{}/versions/{version_id}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything after the account id.
    pub fn resource_path(&self) -> &str {
        self.0.splitn(6, ':').nth(5).unwrap_or_default()
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Arn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Arn> for String {
    fn from(arn: Arn) -> Self {
        arn.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_service_region_and_account() {
        let arn = Arn::new("glue", "eu-west-1", "123456789012", "crawler/nightly");
        assert_eq!(arn.as_str(), "arn:aws:glue:eu-west-1:123456789012:crawler/nightly");
        assert_eq!(arn.resource_path(), "crawler/nightly");
    }

    #[test]
    fn versioned_appends_version_segment() {
        let arn = Arn::new(
            "greengrass",
            "us-east-1",
            "123456789012",
            "greengrass/definition/cores/abc",
        );
        assert_eq!(
            arn.versioned("v1").to_string(),
            "arn:aws:greengrass:us-east-1:123456789012:greengrass/definition/cores/abc/versions/v1"
        );
    }
}
