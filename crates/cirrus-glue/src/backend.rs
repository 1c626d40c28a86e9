//! The per-region data catalog store.

use cirrus_core::{
    BackendContext, CloudError, CloudResult, Page, PageRequest, PaginationModel, Paginator,
    RegionBackend, TagStore,
};
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::catalog::{Database, DatabaseInput, Partition, PartitionInput, Table, TableInput};
use crate::crawler::{Crawler, CrawlerInput};
use crate::job::{Job, JobInput, JobRun};
use crate::lifecycle::{Action, CrawlerState};
use crate::schema_registry::{self, SchemaRegistry};

pub const LIST_CRAWLERS: PaginationModel = PaginationModel {
    operation: "list_crawlers",
    limit_default: 100,
    limit_max: 1000,
};

pub const LIST_JOBS: PaginationModel = PaginationModel {
    operation: "list_jobs",
    limit_default: 100,
    limit_max: 1000,
};

/// All data catalog state for one region.
pub struct GlueBackend {
    ctx: BackendContext,
    databases: IndexMap<String, Database>,
    crawlers: IndexMap<String, Crawler>,
    jobs: IndexMap<String, Job>,
    registries: IndexMap<String, SchemaRegistry>,
    tagger: TagStore,
}

impl RegionBackend for GlueBackend {
    const SERVICE: &'static str = "glue";

    fn new(ctx: BackendContext) -> Self {
        Self {
            ctx,
            databases: IndexMap::new(),
            crawlers: IndexMap::new(),
            jobs: IndexMap::new(),
            registries: IndexMap::new(),
            tagger: TagStore::new(),
        }
    }
}

impl GlueBackend {
    pub fn context(&self) -> &BackendContext {
        &self.ctx
    }

    // ── Databases ──────────────────────────────────────────────────

    pub fn create_database(&mut self, name: &str, input: DatabaseInput) -> CloudResult<&Database> {
        if self.databases.contains_key(name) {
            return Err(CloudError::already_exists("database", name));
        }
        debug!(database = %name, "database created");
        let (index, _) = self
            .databases
            .insert_full(name.to_string(), Database::new(name, input));
        Ok(&self.databases[index])
    }

    pub fn get_database(&self, name: &str) -> CloudResult<&Database> {
        self.databases
            .get(name)
            .ok_or_else(|| CloudError::not_found("database", name))
    }

    pub fn get_databases(&self) -> Vec<&Database> {
        self.databases.values().collect()
    }

    pub fn update_database(&mut self, name: &str, input: DatabaseInput) -> CloudResult<&Database> {
        if input.is_empty() {
            return Err(CloudError::invalid_input(
                "Input does not contain any attributes to be updated",
            ));
        }
        let database = self.database_mut(name)?;
        database.input = input;
        debug!(database = %name, "database updated");
        Ok(&*database)
    }

    /// Removes the database together with its tables and their partitions.
    pub fn delete_database(&mut self, name: &str) -> CloudResult<()> {
        let database = self
            .databases
            .shift_remove(name)
            .ok_or_else(|| CloudError::not_found("database", name))?;
        debug!(database = %name, tables = database.tables.len(), "database deleted");
        Ok(())
    }

    fn database_mut(&mut self, name: &str) -> CloudResult<&mut Database> {
        self.databases
            .get_mut(name)
            .ok_or_else(|| CloudError::not_found("database", name))
    }

    // ── Tables ─────────────────────────────────────────────────────

    pub fn create_table(
        &mut self,
        database_name: &str,
        table_name: &str,
        input: TableInput,
    ) -> CloudResult<&Table> {
        let database = self.database_mut(database_name)?;
        if database.tables.contains_key(table_name) {
            return Err(CloudError::already_exists("table", table_name));
        }
        debug!(database = %database_name, table = %table_name, "table created");
        let (index, _) = database.tables.insert_full(
            table_name.to_string(),
            Table::new(database_name, table_name, input),
        );
        Ok(&database.tables[index])
    }

    pub fn get_table(&self, database_name: &str, table_name: &str) -> CloudResult<&Table> {
        self.get_database(database_name)?
            .tables
            .get(table_name)
            .ok_or_else(|| CloudError::not_found("table", table_name))
    }

    pub fn get_tables(&self, database_name: &str) -> CloudResult<Vec<&Table>> {
        Ok(self.get_database(database_name)?.tables().collect())
    }

    pub fn update_table(
        &mut self,
        database_name: &str,
        table_name: &str,
        input: TableInput,
    ) -> CloudResult<&Table> {
        let table = self.table_mut(database_name, table_name)?;
        table.update(input);
        Ok(&*table)
    }

    /// Every version of the table, oldest first, paired with its 1-based id.
    pub fn get_table_versions(
        &self,
        database_name: &str,
        table_name: &str,
    ) -> CloudResult<Vec<(String, &TableInput)>> {
        Ok(self.get_table(database_name, table_name)?.versions().collect())
    }

    pub fn get_table_version(
        &self,
        database_name: &str,
        table_name: &str,
        version_id: &str,
    ) -> CloudResult<&TableInput> {
        self.get_table(database_name, table_name)?
            .get_version(version_id)
    }

    pub fn delete_table(&mut self, database_name: &str, table_name: &str) -> CloudResult<()> {
        let database = self.database_mut(database_name)?;
        if database.tables.shift_remove(table_name).is_none() {
            return Err(CloudError::not_found("table", table_name));
        }
        debug!(database = %database_name, table = %table_name, "table deleted");
        Ok(())
    }

    fn table_mut(&mut self, database_name: &str, table_name: &str) -> CloudResult<&mut Table> {
        self.database_mut(database_name)?
            .tables
            .get_mut(table_name)
            .ok_or_else(|| CloudError::not_found("table", table_name))
    }

    // ── Partitions ─────────────────────────────────────────────────

    pub fn create_partition(
        &mut self,
        database_name: &str,
        table_name: &str,
        input: PartitionInput,
    ) -> CloudResult<&Partition> {
        self.table_mut(database_name, table_name)?
            .create_partition(input)
    }

    pub fn get_partition(
        &self,
        database_name: &str,
        table_name: &str,
        values: &[String],
    ) -> CloudResult<&Partition> {
        self.get_table(database_name, table_name)?
            .get_partition(values)
    }

    pub fn get_partitions(
        &self,
        database_name: &str,
        table_name: &str,
        expression: Option<&str>,
    ) -> CloudResult<Vec<&Partition>> {
        self.get_table(database_name, table_name)?
            .get_partitions(expression)
    }

    pub fn update_partition(
        &mut self,
        database_name: &str,
        table_name: &str,
        old_values: &[String],
        input: PartitionInput,
    ) -> CloudResult<()> {
        self.table_mut(database_name, table_name)?
            .update_partition(old_values, input)
    }

    pub fn delete_partition(
        &mut self,
        database_name: &str,
        table_name: &str,
        values: &[String],
    ) -> CloudResult<()> {
        self.table_mut(database_name, table_name)?
            .delete_partition(values)
    }

    // ── Crawlers ───────────────────────────────────────────────────

    pub fn create_crawler(&mut self, name: &str, input: CrawlerInput) -> CloudResult<&Crawler> {
        if self.crawlers.contains_key(name) {
            return Err(CloudError::already_exists("crawler", name));
        }
        let arn = self.ctx.arn(&format!("crawler/{name}"));
        if !input.tags.is_empty() {
            self.tagger.tag(arn.as_str(), input.tags.clone());
        }
        debug!(crawler = %name, %arn, "crawler created");
        let (index, _) = self
            .crawlers
            .insert_full(name.to_string(), Crawler::new(name, arn, input));
        Ok(&self.crawlers[index])
    }

    pub fn get_crawler(&self, name: &str) -> CloudResult<&Crawler> {
        self.crawlers
            .get(name)
            .ok_or_else(|| CloudError::not_found("crawler", name))
    }

    pub fn get_crawlers(&self) -> Vec<&Crawler> {
        self.crawlers.values().collect()
    }

    /// Crawler names, one page at a time.
    pub fn list_crawlers(&self, request: &PageRequest) -> CloudResult<Page<String>> {
        let names = self.crawlers.keys().cloned().collect();
        Paginator::new(LIST_CRAWLERS).paginate(names, request, String::clone)
    }

    pub fn start_crawler(&mut self, name: &str) -> CloudResult<CrawlerState> {
        self.transition_crawler(name, Action::Start)
    }

    pub fn stop_crawler(&mut self, name: &str) -> CloudResult<CrawlerState> {
        self.transition_crawler(name, Action::Stop)
    }

    fn transition_crawler(&mut self, name: &str, action: Action) -> CloudResult<CrawlerState> {
        let crawler = self
            .crawlers
            .get_mut(name)
            .ok_or_else(|| CloudError::not_found("crawler", name))?;
        match crawler.apply(action) {
            Ok(state) => {
                debug!(crawler = %name, %state, "crawler transitioned");
                Ok(state)
            }
            Err(e) => {
                warn!(
                    crawler = %name,
                    state = %crawler.state,
                    action = action.as_str(),
                    "crawler transition rejected"
                );
                Err(e)
            }
        }
    }

    pub fn delete_crawler(&mut self, name: &str) -> CloudResult<()> {
        if self.crawlers.shift_remove(name).is_none() {
            return Err(CloudError::not_found("crawler", name));
        }
        debug!(crawler = %name, "crawler deleted");
        Ok(())
    }

    // ── Jobs ───────────────────────────────────────────────────────

    pub fn create_job(&mut self, name: &str, input: JobInput) -> CloudResult<&Job> {
        if self.jobs.contains_key(name) {
            return Err(CloudError::already_exists("job", name));
        }
        let arn = self.ctx.arn(&format!("job/{name}"));
        if !input.tags.is_empty() {
            self.tagger.tag(arn.as_str(), input.tags.clone());
        }
        debug!(job = %name, %arn, "job created");
        let (index, _) = self
            .jobs
            .insert_full(name.to_string(), Job::new(name, arn, input));
        Ok(&self.jobs[index])
    }

    pub fn get_job(&self, name: &str) -> CloudResult<&Job> {
        self.jobs
            .get(name)
            .ok_or_else(|| CloudError::not_found("job", name))
    }

    /// Job names, one page at a time.
    pub fn list_jobs(&self, request: &PageRequest) -> CloudResult<Page<String>> {
        let names = self.jobs.keys().cloned().collect();
        Paginator::new(LIST_JOBS).paginate(names, request, String::clone)
    }

    /// Record a run of the job and return its id.
    pub fn start_job_run(
        &mut self,
        name: &str,
        arguments: IndexMap<String, String>,
    ) -> CloudResult<String> {
        let job = self
            .jobs
            .get_mut(name)
            .ok_or_else(|| CloudError::not_found("job", name))?;
        let state = job.state;
        match job.start_run(arguments) {
            Ok(run) => {
                debug!(job = %name, run = %run.id, "job run started");
                Ok(run.id.clone())
            }
            Err(e) => {
                warn!(job = %name, %state, "job run rejected");
                Err(e)
            }
        }
    }

    pub fn get_job_run(&self, name: &str, run_id: &str) -> CloudResult<&JobRun> {
        self.get_job(name)?.get_run(run_id)
    }

    pub fn get_job_runs(&self, name: &str) -> CloudResult<Vec<&JobRun>> {
        Ok(self.get_job(name)?.runs().collect())
    }

    pub fn delete_job(&mut self, name: &str) -> CloudResult<()> {
        if self.jobs.shift_remove(name).is_none() {
            return Err(CloudError::not_found("job", name));
        }
        debug!(job = %name, "job deleted");
        Ok(())
    }

    // ── Schema registries ──────────────────────────────────────────

    pub fn create_registry(
        &mut self,
        name: &str,
        description: Option<String>,
        tags: IndexMap<String, String>,
    ) -> CloudResult<&SchemaRegistry> {
        schema_registry::validate_create(
            self.registries.len(),
            self.registries.contains_key(name),
            name,
            description.as_deref(),
            &tags,
        )?;
        let arn = self.ctx.arn(&format!("registry/{name}"));
        if !tags.is_empty() {
            self.tagger.tag(arn.as_str(), tags.clone());
        }
        debug!(registry = %name, %arn, "registry created");
        let registry = SchemaRegistry::new(name, arn, description, tags);
        let (index, _) = self.registries.insert_full(name.to_string(), registry);
        Ok(&self.registries[index])
    }

    pub fn get_registry(&self, name: &str) -> CloudResult<&SchemaRegistry> {
        self.registries
            .get(name)
            .ok_or_else(|| CloudError::not_found("registry", name))
    }

    // ── Tags ───────────────────────────────────────────────────────

    pub fn tag_resource(&mut self, arn: &str, tags: IndexMap<String, String>) {
        self.tagger.tag(arn, tags);
    }

    pub fn untag_resource(&mut self, arn: &str, keys: &[String]) {
        debug!(%arn, count = keys.len(), "resource untagged");
        self.tagger.untag(arn, keys.iter().cloned());
    }

    pub fn get_tags(&self, arn: &str) -> HashMap<String, String> {
        self.tagger.get_tags(arn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Column;
    use cirrus_core::ErrorKind;

    fn backend() -> GlueBackend {
        GlueBackend::new(BackendContext::new("glue", "eu-west-1", "123456789012"))
    }

    fn partitioned_table(backend: &mut GlueBackend) {
        backend.create_database("db", DatabaseInput::default()).unwrap();
        let input = TableInput {
            partition_keys: vec![Column::new("year", "string"), Column::new("month", "string")],
            ..TableInput::default()
        };
        backend.create_table("db", "events", input).unwrap();
    }

    fn values(vs: &[&str]) -> Vec<String> {
        vs.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn database_create_get_delete() {
        let mut b = backend();
        b.create_database("db", DatabaseInput::default()).unwrap();
        assert_eq!(
            b.create_database("db", DatabaseInput::default()).unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );
        assert_eq!(b.get_database("db").unwrap().name, "db");
        b.delete_database("db").unwrap();
        assert_eq!(b.get_database("db").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(b.delete_database("db").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn crawler_create_get_delete() {
        let mut b = backend();
        let input = CrawlerInput {
            role: "arn:aws:iam::123456789012:role/crawler".to_string(),
            database_name: Some("db".to_string()),
            schedule: Some("cron(15 12 * * ? *)".to_string()),
            classifiers: vec!["csv".to_string()],
            ..CrawlerInput::default()
        };
        b.create_crawler("c1", input.clone()).unwrap();
        assert_eq!(
            b.create_crawler("c1", CrawlerInput::default()).unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );

        let crawler = b.get_crawler("c1").unwrap();
        assert_eq!(crawler.input(), &input);
        assert_eq!(crawler.state, CrawlerState::Ready);
        let value = crawler.to_value();
        assert_eq!(value["Name"], "c1");
        assert_eq!(value["DatabaseName"], "db");
        assert_eq!(value["Schedule"]["ScheduleExpression"], "cron(15 12 * * ? *)");
        assert_eq!(b.get_crawlers().len(), 1);

        b.delete_crawler("c1").unwrap();
        assert_eq!(b.get_crawler("c1").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(b.delete_crawler("c1").unwrap_err().kind(), ErrorKind::NotFound);
        assert!(b.get_crawlers().is_empty());
    }

    #[test]
    fn update_database_requires_attributes() {
        let mut b = backend();
        b.create_database("db", DatabaseInput::default()).unwrap();
        assert_eq!(
            b.update_database("db", DatabaseInput::default()).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        let input = DatabaseInput {
            description: Some("raw events".to_string()),
            ..DatabaseInput::default()
        };
        b.update_database("db", input).unwrap();
        assert_eq!(b.get_database("db").unwrap().to_value()["Description"], "raw events");
    }

    #[test]
    fn table_in_missing_database() {
        let mut b = backend();
        let err = b.create_table("nope", "t", TableInput::default()).unwrap_err();
        assert_eq!(err, CloudError::not_found("database", "nope"));
    }

    #[test]
    fn deleting_database_cascades_tables() {
        let mut b = backend();
        partitioned_table(&mut b);
        b.create_partition("db", "events", PartitionInput::new(["2021", "01"])).unwrap();
        b.delete_database("db").unwrap();
        b.create_database("db", DatabaseInput::default()).unwrap();
        assert!(b.get_tables("db").unwrap().is_empty());
    }

    #[test]
    fn partition_filter_through_backend() {
        let mut b = backend();
        partitioned_table(&mut b);
        for (y, m) in [("2020", "12"), ("2021", "01"), ("2021", "02")] {
            b.create_partition("db", "events", PartitionInput::new([y, m])).unwrap();
        }
        let matched = b
            .get_partitions("db", "events", Some("year = '2021' AND month <> '02'"))
            .unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].values(), values(&["2021", "01"]).as_slice());

        b.delete_partition("db", "events", &values(&["2021", "01"])).unwrap();
        assert_eq!(
            b.get_partition("db", "events", &values(&["2021", "01"])).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn crawler_arn_uses_region() {
        let mut b = backend();
        let crawler = b.create_crawler("c1", CrawlerInput::default()).unwrap();
        assert_eq!(
            crawler.arn.as_str(),
            "arn:aws:glue:eu-west-1:123456789012:crawler/c1"
        );
    }

    #[test]
    fn crawler_transitions_via_backend() {
        let mut b = backend();
        b.create_crawler("c1", CrawlerInput::default()).unwrap();
        assert_eq!(b.stop_crawler("c1").unwrap_err().kind(), ErrorKind::InvalidState);
        assert_eq!(b.start_crawler("c1").unwrap(), CrawlerState::Running);
        assert_eq!(b.start_crawler("c1").unwrap_err().kind(), ErrorKind::InvalidState);
        assert_eq!(b.stop_crawler("c1").unwrap(), CrawlerState::Stopping);
        assert_eq!(b.start_crawler("ghost").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn job_tags_recorded_on_arn() {
        let mut b = backend();
        let input = JobInput {
            tags: IndexMap::from([("team".to_string(), "data".to_string())]),
            ..JobInput::default()
        };
        let arn = b.create_job("etl", input).unwrap().arn.clone();
        assert_eq!(b.get_tags(arn.as_str())["team"], "data");
        assert_eq!(
            b.create_job("etl", JobInput::default()).unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );
    }

    #[test]
    fn registry_limits_and_duplicates() {
        let mut b = backend();
        for i in 0..10 {
            b.create_registry(&format!("r{i}"), None, IndexMap::new()).unwrap();
        }
        assert_eq!(
            b.create_registry("r10", None, IndexMap::new()).unwrap_err().kind(),
            ErrorKind::LimitExceeded
        );

        let mut b = backend();
        b.create_registry("r", Some("schemas".to_string()), IndexMap::new()).unwrap();
        assert_eq!(
            b.create_registry("r", None, IndexMap::new()).unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );
        let long = "d".repeat(schema_registry::MAX_DESCRIPTION_BYTES + 1);
        assert_eq!(
            b.create_registry("r", Some(long), IndexMap::new()).unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );
        assert_eq!(
            b.get_registry("r").unwrap().arn.as_str(),
            "arn:aws:glue:eu-west-1:123456789012:registry/r"
        );
    }
}
