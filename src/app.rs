use camino::Utf8PathBuf;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::crawl::{self, CrawlConfig, StopReason};
use crate::dhlottery::DrawClient;
use crate::error::LottoError;
use crate::import;
use crate::store::DataFile;

#[derive(Debug, Clone, Serialize)]
pub struct SyncResult {
    pub start_round: u32,
    pub fetched: usize,
    pub total_rounds: usize,
    pub stop: StopReason,
    pub wrote: bool,
    pub data_file: String,
    pub completed_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub rounds: usize,
    pub latest_round: u32,
    pub data_file: String,
    pub completed_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResult {
    pub rounds: usize,
    pub next_round: u32,
    pub latest_date: Option<String>,
    pub data_file: String,
}

pub struct App<C: DrawClient> {
    data_file: DataFile,
    client: C,
    crawl_config: CrawlConfig,
}

impl<C: DrawClient> App<C> {
    pub fn new(data_file: DataFile, client: C, crawl_config: CrawlConfig) -> Self {
        Self {
            data_file,
            client,
            crawl_config,
        }
    }

    /// One full crawl-and-merge pass: load the store, fetch forward from
    /// the first unstored round, merge whatever arrived, persist. With no
    /// new records the data file is left untouched; both stop reasons are
    /// successful completions.
    pub fn sync(&self) -> Result<SyncResult, LottoError> {
        let existing = self.data_file.load();
        let existing_rounds = existing.len();
        let start_round = existing.next_round();
        info!(existing_rounds, start_round, "starting crawl");

        let report = crawl::run(&self.client, start_round, &self.crawl_config);
        let fetched = report.session.records().len();

        let wrote = if fetched == 0 {
            info!(stop = ?report.stop, "no new draws, leaving data file untouched");
            false
        } else {
            let merged = existing.merge(report.session.into_records());
            self.data_file.save(&merged)?;
            info!(
                total = merged.len(),
                path = %self.data_file.path(),
                "data file updated"
            );
            true
        };

        Ok(SyncResult {
            start_round,
            fetched,
            total_rounds: existing_rounds + fetched,
            stop: report.stop,
            wrote,
            data_file: self.data_file.path().to_string(),
            completed_at: Utc::now().to_rfc3339(),
        })
    }

    /// Rebuilds the data file from legacy HTML exports, replacing whatever
    /// was persisted before.
    pub fn import(&self, exports: &[Utf8PathBuf]) -> Result<ImportResult, LottoError> {
        let store = import::import_files(exports)?;
        self.data_file.save(&store)?;
        info!(
            rounds = store.len(),
            path = %self.data_file.path(),
            "data file rebuilt from exports"
        );
        Ok(ImportResult {
            rounds: store.len(),
            latest_round: store.latest_round(),
            data_file: self.data_file.path().to_string(),
            completed_at: Utc::now().to_rfc3339(),
        })
    }

    /// Reports what the data file currently holds. Read-only.
    pub fn status(&self) -> StatusResult {
        let store = self.data_file.load();
        StatusResult {
            rounds: store.len(),
            next_round: store.next_round(),
            latest_date: store.latest_date().map(str::to_string),
            data_file: self.data_file.path().to_string(),
        }
    }
}
