//! Crawlers. Only their declared state is tracked; nothing is crawled.

use chrono::{DateTime, Utc};
use cirrus_core::{Arn, CloudError, CloudResult, time};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::lifecycle::{Action, CRAWLER_TRANSITIONS, CrawlerState, next_state};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CrawlerInput {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub database_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub targets: Option<Value>,
    /// Cron expression, e.g. `cron(15 12 * * ? *)`.
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub classifiers: Vec<String>,
    #[serde(default)]
    pub table_prefix: Option<String>,
    #[serde(default)]
    pub schema_change_policy: Option<Value>,
    #[serde(default)]
    pub recrawl_policy: Option<Value>,
    #[serde(default)]
    pub lineage_configuration: Option<Value>,
    #[serde(default)]
    pub configuration: Option<String>,
    #[serde(default)]
    pub crawler_security_configuration: Option<String>,
    #[serde(default)]
    pub tags: IndexMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct Crawler {
    pub name: String,
    pub arn: Arn,
    pub state: CrawlerState,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub version: u32,
    pub crawl_elapsed_time: u64,
    /// Tags are held by the backend's tag store, not here.
    pub(crate) input: CrawlerInput,
}

impl Crawler {
    pub(crate) fn new(name: &str, arn: Arn, input: CrawlerInput) -> Self {
        let now = time::now();
        Self {
            name: name.to_string(),
            arn,
            state: CrawlerState::Ready,
            created_at: now,
            last_updated: now,
            version: 1,
            crawl_elapsed_time: 0,
            input,
        }
    }

    pub fn input(&self) -> &CrawlerInput {
        &self.input
    }

    pub(crate) fn apply(&mut self, action: Action) -> CloudResult<CrawlerState> {
        let next = next_state(CRAWLER_TRANSITIONS, self.state, action).ok_or_else(|| {
            CloudError::InvalidState {
                resource: "crawler",
                name: self.name.clone(),
                state: self.state.to_string(),
                action: action.as_str(),
            }
        })?;
        self.state = next;
        self.last_updated = time::now();
        Ok(next)
    }

    pub fn to_value(&self) -> Value {
        let input = &self.input;
        let mut obj = json!({
            "Name": self.name,
            "Role": input.role,
            "Targets": input.targets,
            "DatabaseName": input.database_name,
            "Description": input.description,
            "Classifiers": input.classifiers,
            "RecrawlPolicy": input.recrawl_policy,
            "SchemaChangePolicy": input.schema_change_policy,
            "LineageConfiguration": input.lineage_configuration,
            "State": self.state,
            "TablePrefix": input.table_prefix,
            "CrawlElapsedTime": self.crawl_elapsed_time,
            "CreationTime": time::iso8601(&self.created_at),
            "LastUpdated": time::iso8601(&self.last_updated),
            "LastCrawl": Value::Null,
            "Version": self.version,
            "Configuration": input.configuration,
            "CrawlerSecurityConfiguration": input.crawler_security_configuration,
        });
        if let Some(schedule) = &input.schedule {
            obj["Schedule"] = json!({
                "ScheduleExpression": schedule,
                "State": "SCHEDULED",
            });
        }
        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crawler() -> Crawler {
        let arn = Arn::new("glue", "us-east-1", "123456789012", "crawler/c");
        Crawler::new("c", arn, CrawlerInput::default())
    }

    #[test]
    fn start_stop_cycle() {
        let mut c = crawler();
        assert_eq!(c.apply(Action::Start).unwrap(), CrawlerState::Running);
        assert!(matches!(c.apply(Action::Start), Err(CloudError::InvalidState { .. })));
        assert_eq!(c.apply(Action::Stop).unwrap(), CrawlerState::Stopping);
        assert!(matches!(c.apply(Action::Stop), Err(CloudError::InvalidState { .. })));
        assert_eq!(c.apply(Action::Start).unwrap(), CrawlerState::Running);
    }

    #[test]
    fn schedule_rendered_only_when_set() {
        let mut c = crawler();
        assert!(c.to_value().get("Schedule").is_none());
        c.input.schedule = Some("cron(0 * * * ? *)".to_string());
        let value = c.to_value();
        assert_eq!(value["Schedule"]["State"], "SCHEDULED");
        assert_eq!(value["State"], "READY");
    }
}
