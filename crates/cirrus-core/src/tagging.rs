//! Keyed-by-ARN tag store shared by all resource kinds of a service.
//!
//! Tags live independently of the resources they describe: an ARN does not
//! have to name a live resource to be tagged, and deleting a resource leaves
//! its tags in place.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

#[derive(Debug, Default, Clone)]
pub struct TagStore {
    tags: HashMap<String, IndexMap<String, String>>,
}

impl TagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `tags` onto the ARN's existing set; later values win per key.
    pub fn tag<I, K, V>(&mut self, arn: &str, tags: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entry = self.tags.entry(arn.to_string()).or_default();
        for (key, value) in tags {
            entry.insert(key.into(), value.into());
        }
        debug!(%arn, count = entry.len(), "resource tagged");
    }

    /// Remove the named keys. Keys that are not present are ignored.
    pub fn untag<I, K>(&mut self, arn: &str, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let Some(entry) = self.tags.get_mut(arn) else {
            return;
        };
        for key in keys {
            entry.shift_remove(key.as_ref());
        }
        if entry.is_empty() {
            self.tags.remove(arn);
        }
    }

    /// Plain key → value view; empty when the ARN has no tags.
    pub fn get_tags(&self, arn: &str) -> HashMap<String, String> {
        self.tags
            .get(arn)
            .map(|tags| tags.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    /// Tags of an ARN in the order they were first recorded.
    pub fn ordered_tags(&self, arn: &str) -> Vec<(String, String)> {
        self.tags
            .get(arn)
            .map(|tags| tags.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }
}
