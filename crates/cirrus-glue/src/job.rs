//! Jobs and their synthesized run records.

use chrono::{DateTime, Utc};
use cirrus_core::{Arn, CloudError, CloudResult, time};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::lifecycle::{Action, JOB_TRANSITIONS, JobState, next_state};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobInput {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub command: Value,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub log_uri: Option<String>,
    #[serde(default)]
    pub execution_property: Option<Value>,
    #[serde(default)]
    pub default_arguments: Option<IndexMap<String, String>>,
    #[serde(default)]
    pub non_overridable_arguments: Option<IndexMap<String, String>>,
    #[serde(default)]
    pub connections: Option<Value>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub allocated_capacity: Option<u32>,
    #[serde(default)]
    pub timeout: Option<u32>,
    #[serde(default)]
    pub max_capacity: Option<f64>,
    #[serde(default)]
    pub security_configuration: Option<String>,
    #[serde(default)]
    pub tags: IndexMap<String, String>,
    #[serde(default)]
    pub notification_property: Option<Value>,
    #[serde(default)]
    pub glue_version: Option<String>,
    #[serde(default)]
    pub number_of_workers: Option<u32>,
    #[serde(default)]
    pub worker_type: Option<String>,
}

/// A run record. Runs are never executed; they are reported as succeeded.
#[derive(Debug, Clone)]
pub struct JobRun {
    pub id: String,
    pub job_name: String,
    pub previous_run_id: Option<String>,
    pub arguments: IndexMap<String, String>,
    pub started_on: DateTime<Utc>,
    allocated_capacity: Option<u32>,
    timeout: Option<u32>,
    max_capacity: Option<f64>,
    worker_type: Option<String>,
    number_of_workers: Option<u32>,
    security_configuration: Option<String>,
    glue_version: Option<String>,
}

impl JobRun {
    pub fn to_value(&self) -> Value {
        let at = time::iso8601(&self.started_on);
        json!({
            "Id": self.id,
            "Attempt": 0,
            "PreviousRunId": self.previous_run_id,
            "JobName": self.job_name,
            "StartedOn": at,
            "LastModifiedOn": at,
            "CompletedOn": at,
            "JobRunState": "SUCCEEDED",
            "Arguments": self.arguments,
            "ErrorMessage": "",
            "PredecessorRuns": [],
            "AllocatedCapacity": self.allocated_capacity,
            "ExecutionTime": 0,
            "Timeout": self.timeout,
            "MaxCapacity": self.max_capacity,
            "WorkerType": self.worker_type,
            "NumberOfWorkers": self.number_of_workers,
            "SecurityConfiguration": self.security_configuration,
            "GlueVersion": self.glue_version,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub name: String,
    pub arn: Arn,
    pub state: JobState,
    pub created_on: DateTime<Utc>,
    pub last_modified_on: DateTime<Utc>,
    pub(crate) input: JobInput,
    runs: IndexMap<String, JobRun>,
}

impl Job {
    pub(crate) fn new(name: &str, arn: Arn, input: JobInput) -> Self {
        let now = time::now();
        Self {
            name: name.to_string(),
            arn,
            state: JobState::Ready,
            created_on: now,
            last_modified_on: now,
            input,
            runs: IndexMap::new(),
        }
    }

    pub fn input(&self) -> &JobInput {
        &self.input
    }

    /// Record a new run and move the job to `RUNNING`.
    pub(crate) fn start_run(&mut self, arguments: IndexMap<String, String>) -> CloudResult<&JobRun> {
        let next = next_state(JOB_TRANSITIONS, self.state, Action::Start).ok_or_else(|| {
            CloudError::InvalidState {
                resource: "job",
                name: self.name.clone(),
                state: self.state.to_string(),
                action: Action::Start.as_str(),
            }
        })?;

        let mut merged = self.input.default_arguments.clone().unwrap_or_default();
        merged.extend(arguments);
        let run = JobRun {
            id: format!("jr_{}", Uuid::new_v4().simple()),
            job_name: self.name.clone(),
            previous_run_id: self.runs.keys().last().cloned(),
            arguments: merged,
            started_on: time::now(),
            allocated_capacity: self.input.allocated_capacity,
            timeout: self.input.timeout,
            max_capacity: self.input.max_capacity,
            worker_type: self.input.worker_type.clone(),
            number_of_workers: self.input.number_of_workers,
            security_configuration: self.input.security_configuration.clone(),
            glue_version: self.input.glue_version.clone(),
        };

        self.state = next;
        let (index, _) = self.runs.insert_full(run.id.clone(), run);
        Ok(&self.runs[index])
    }

    pub fn get_run(&self, run_id: &str) -> CloudResult<&JobRun> {
        self.runs
            .get(run_id)
            .ok_or_else(|| CloudError::not_found("job run", run_id))
    }

    pub fn runs(&self) -> impl Iterator<Item = &JobRun> {
        self.runs.values()
    }

    pub fn to_value(&self) -> Value {
        let input = &self.input;
        json!({
            "Name": self.name,
            "Description": input.description,
            "LogUri": input.log_uri,
            "Role": input.role,
            "CreatedOn": time::iso8601(&self.created_on),
            "LastModifiedOn": time::iso8601(&self.last_modified_on),
            "ExecutionProperty": input.execution_property,
            "Command": input.command,
            "DefaultArguments": input.default_arguments,
            "NonOverridableArguments": input.non_overridable_arguments,
            "Connections": input.connections,
            "MaxRetries": input.max_retries,
            "AllocatedCapacity": input.allocated_capacity,
            "Timeout": input.timeout,
            "MaxCapacity": input.max_capacity,
            "WorkerType": input.worker_type,
            "NumberOfWorkers": input.number_of_workers,
            "SecurityConfiguration": input.security_configuration,
            "NotificationProperty": input.notification_property,
            "GlueVersion": input.glue_version,
        })
    }
}
