// src/table/repository.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use super::record::{BarrierRow, NormalizedRecord};
use super::store::TableStore;
use crate::aggregate::{self, MultiSelect};
use crate::error::{IngestError, Result};
use crate::fetch::SubmissionSource;
use crate::normalize::SubmissionNormalizer;
use crate::schema::FieldSchema;

/// Date layouts seen in the form's `Date` answers, most common first.
const DATE_FORMATS: &[&str] = &["%m-%d-%Y", "%Y-%m-%d", "%m/%d/%Y"];

/// What the last successful fetch reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchMeta {
    pub message: String,
    pub limit_left: Option<i64>,
    pub total_submissions: usize,
    pub active_submissions: usize,
    pub fetched_at: DateTime<Utc>,
}

/// Repository behind an async lock, for hosts that share one instance.
pub type SharedRepository<S, T> = Arc<Mutex<Repository<S, T>>>;

/// Owns the normalized table: loads it from the store, or rebuilds it
/// wholesale from the forms source.
pub struct Repository<S, T> {
    source: S,
    store: T,
    records: Vec<NormalizedRecord>,
    meta: Option<FetchMeta>,
}

impl<S: SubmissionSource, T: TableStore> Repository<S, T> {
    pub fn new(source: S, store: T) -> Self {
        Self {
            source,
            store,
            records: Vec::new(),
            meta: None,
        }
    }

    pub fn shared(self) -> SharedRepository<S, T> {
        Arc::new(Mutex::new(self))
    }

    /// Use the persisted table if there is one, else refresh.
    pub async fn load(&mut self) -> Result<&[NormalizedRecord]> {
        match self.store.load()? {
            Some(records) => {
                self.records = records;
                self.meta = None;
            }
            None => {
                info!("no persisted table, refreshing from forms API");
                self.refresh().await?;
            }
        }
        Ok(&self.records)
    }

    /// Fetch, resolve the schema, normalize and persist. On any error the
    /// in-memory and persisted tables are left as they were.
    #[instrument(level = "info", skip(self))]
    pub async fn refresh(&mut self) -> Result<&FetchMeta> {
        let resp = self.source.fetch().await?;
        if !resp.is_success() {
            return Err(IngestError::Api(resp.message));
        }

        let records = if resp.content.is_empty() {
            warn!("forms API returned no submissions");
            Vec::new()
        } else {
            let schema = FieldSchema::resolve(&resp.content)?;
            SubmissionNormalizer::new(&schema).normalize_all(&resp.content)?
        };

        self.store.save(&records)?;

        let meta = FetchMeta {
            message: resp.message,
            limit_left: resp.limit_left,
            total_submissions: resp.content.len(),
            active_submissions: records.len(),
            fetched_at: Utc::now(),
        };
        info!(
            records = records.len(),
            limit_left = ?meta.limit_left,
            "refresh complete"
        );
        self.records = records;
        Ok(self.meta.insert(meta))
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    /// Metadata of the last refresh; `None` if the table came from disk.
    pub fn meta(&self) -> Option<&FetchMeta> {
        self.meta.as_ref()
    }

    pub fn barrier_view(&self) -> Vec<BarrierRow> {
        self.records.iter().map(BarrierRow::from).collect()
    }

    /// Most recent `date` in the table. Unparseable dates rank below any
    /// parseable one and are compared as text among themselves.
    pub fn latest_date(&self) -> Result<&str> {
        self.records
            .iter()
            .filter_map(|r| r.date.as_deref())
            .max_by_key(|d| (parse_date(d), *d))
            .ok_or(IngestError::EmptyTable)
    }

    pub fn master_list(&self, field: MultiSelect) -> Vec<&str> {
        aggregate::master_list(&self.records, field)
    }

    pub fn top_values(&self, field: MultiSelect, n: usize) -> Vec<(String, usize)> {
        aggregate::top_values(&self.records, field, n)
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FormsResponse;
    use crate::normalize::tests::submission_json;
    use crate::normalize::SubmissionType;
    use crate::table::CsvTableStore;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use tempfile::tempdir;

    enum Scripted {
        Respond(FormsResponse),
        TransportFailure,
    }

    /// Replays scripted fetch outcomes in order.
    struct FakeSource {
        script: StdMutex<VecDeque<Scripted>>,
        calls: StdMutex<usize>,
    }

    impl FakeSource {
        fn new(script: Vec<Scripted>) -> Self {
            Self {
                script: StdMutex::new(script.into()),
                calls: StdMutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl SubmissionSource for FakeSource {
        async fn fetch(&self) -> Result<FormsResponse> {
            *self.calls.lock().unwrap() += 1;
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Scripted::Respond(r)) => Ok(r),
                Some(Scripted::TransportFailure) | None => Err(transport_error()),
            }
        }
    }

    impl SubmissionSource for &FakeSource {
        async fn fetch(&self) -> Result<FormsResponse> {
            (**self).fetch().await
        }
    }

    fn transport_error() -> IngestError {
        reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err()
            .into()
    }

    fn response(subs: Vec<serde_json::Value>) -> FormsResponse {
        serde_json::from_value(json!({
            "message": "success",
            "limit-left": 990,
            "content": subs
        }))
        .unwrap()
    }

    fn three_submissions() -> FormsResponse {
        let mut later = submission_json("ACTIVE", "Organization Referral", Some("92503"));
        later["answers"]["1"]["prettyFormat"] = json!("11-02-2023");
        let mut latest = submission_json("ACTIVE", "Walk-in", None);
        latest["answers"]["1"]["prettyFormat"] = json!("01-15-2024");
        latest["answers"]["9"]["prettyFormat"] = json!("Healthcare;Childcare");
        response(vec![
            later,
            submission_json("DELETED", "Self-Referral", None),
            latest,
        ])
    }

    #[tokio::test]
    async fn load_without_table_refreshes_and_persists() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("table.csv");
        let source = FakeSource::new(vec![Scripted::Respond(three_submissions())]);
        let mut repo = Repository::new(&source, CsvTableStore::new(&path));

        let records = repo.load().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].submission_type, SubmissionType::SelfReferral);
        assert!(path.exists());
        assert_eq!(source.calls(), 1);

        let meta = repo.meta().unwrap();
        assert_eq!(meta.limit_left, Some(990));
        assert_eq!(meta.total_submissions, 3);
        assert_eq!(meta.active_submissions, 2);
    }

    #[tokio::test]
    async fn load_prefers_persisted_table() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("table.csv");
        let first = FakeSource::new(vec![Scripted::Respond(three_submissions())]);
        let expected = Repository::new(&first, CsvTableStore::new(&path))
            .load()
            .await
            .unwrap()
            .to_vec();

        let second = FakeSource::new(vec![]);
        let mut repo = Repository::new(&second, CsvTableStore::new(&path));
        assert_eq!(repo.load().await.unwrap(), expected.as_slice());
        assert_eq!(second.calls(), 0);
        assert!(repo.meta().is_none());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_table() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("table.csv");
        let source = FakeSource::new(vec![
            Scripted::Respond(three_submissions()),
            Scripted::TransportFailure,
        ]);
        let mut repo = Repository::new(&source, CsvTableStore::new(&path));
        repo.refresh().await.unwrap();
        let before_mem = repo.records().to_vec();
        let before_disk = std::fs::read(&path).unwrap();

        let err = repo.refresh().await.unwrap_err();
        assert!(matches!(err, IngestError::Transport(_)));
        assert_eq!(repo.records(), before_mem.as_slice());
        assert_eq!(std::fs::read(&path).unwrap(), before_disk);
        assert_eq!(
            CsvTableStore::new(&path).load().unwrap().unwrap(),
            before_mem
        );
    }

    #[tokio::test]
    async fn schema_failure_aborts_refresh() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("table.csv");
        let mut broken = submission_json("ACTIVE", "Self-Referral", None);
        broken["answers"].as_object_mut().unwrap().remove("19");
        let source = FakeSource::new(vec![Scripted::Respond(response(vec![broken]))]);
        let mut repo = Repository::new(&source, CsvTableStore::new(&path));

        let err = repo.refresh().await.unwrap_err();
        assert!(matches!(err, IngestError::SchemaResolution { missing } if missing == vec!["Zipcode"]));
        assert!(!path.exists());
        assert!(repo.records().is_empty());
    }

    #[tokio::test]
    async fn api_failure_message_aborts_refresh() {
        let tmp = tempdir().unwrap();
        let mut resp = three_submissions();
        resp.message = "You're not authorized to use (form-id)".into();
        let source = FakeSource::new(vec![Scripted::Respond(resp)]);
        let mut repo = Repository::new(&source, CsvTableStore::new(tmp.path().join("t.csv")));
        assert!(matches!(repo.refresh().await, Err(IngestError::Api(_))));
    }

    #[tokio::test]
    async fn empty_payload_yields_empty_table() {
        let tmp = tempdir().unwrap();
        let source = FakeSource::new(vec![Scripted::Respond(response(vec![]))]);
        let mut repo = Repository::new(&source, CsvTableStore::new(tmp.path().join("t.csv")));
        repo.refresh().await.unwrap();
        assert!(repo.records().is_empty());
        assert!(matches!(repo.latest_date(), Err(IngestError::EmptyTable)));
    }

    #[tokio::test]
    async fn views_over_refreshed_table() {
        let tmp = tempdir().unwrap();
        let source = FakeSource::new(vec![Scripted::Respond(three_submissions())]);
        let mut repo = Repository::new(&source, CsvTableStore::new(tmp.path().join("t.csv")));
        repo.refresh().await.unwrap();

        // text order would pick "11-02-2023"
        assert_eq!(repo.latest_date().unwrap(), "01-15-2024");

        let view = repo.barrier_view();
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].zipcode.as_deref(), Some("92503"));
        assert_eq!(view[1].zipcode.as_deref(), Some("92831"));

        assert_eq!(
            repo.master_list(MultiSelect::Barriers),
            vec!["Transportation", "Healthcare", "Healthcare", "Childcare"]
        );
        assert_eq!(
            repo.top_values(MultiSelect::Barriers, 2),
            vec![("Healthcare".to_string(), 2), ("Transportation".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn shared_repository_serializes_access() {
        let tmp = tempdir().unwrap();
        let source = FakeSource::new(vec![Scripted::Respond(three_submissions())]);
        let repo = Repository::new(source, CsvTableStore::new(tmp.path().join("t.csv"))).shared();
        repo.lock().await.refresh().await.unwrap();
        assert_eq!(repo.lock().await.records().len(), 2);
    }

    #[test]
    fn date_formats() {
        assert_eq!(parse_date("03-14-2024"), NaiveDate::from_ymd_opt(2024, 3, 14));
        assert_eq!(parse_date("2024-03-14"), NaiveDate::from_ymd_opt(2024, 3, 14));
        assert_eq!(parse_date("sometime"), None);
    }
}
