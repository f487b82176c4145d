use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::dhlottery::{DrawClient, FetchOutcome};
use crate::domain::DrawRecord;

pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;
pub const FAILURE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Sequential failures tolerated before the crawl stops. This bound is
    /// what keeps an unreachable service from looping forever.
    pub max_consecutive_failures: u32,
    /// Pause after a failed round before asking for the next one.
    pub failure_delay: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_consecutive_failures: MAX_CONSECUTIVE_FAILURES,
            failure_delay: FAILURE_DELAY,
        }
    }
}

/// Why a crawl ended. Both are valid completions, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The service reported no draw at the requested round: the frontier.
    EndOfData,
    /// The consecutive-failure budget ran out.
    FailureBudgetExhausted,
}

/// The state one crawl pass accumulates: where it started, where it is,
/// how many rounds in a row have failed, and what it has fetched so far
/// (ascending round order).
#[derive(Debug)]
pub struct CrawlSession {
    start_round: u32,
    current_round: u32,
    consecutive_failures: u32,
    records: Vec<DrawRecord>,
}

impl CrawlSession {
    pub fn new(start_round: u32) -> Self {
        Self {
            start_round,
            current_round: start_round,
            consecutive_failures: 0,
            records: Vec::new(),
        }
    }

    pub fn start_round(&self) -> u32 {
        self.start_round
    }

    /// The round the next iteration would ask for. Strictly increases every
    /// iteration, failures included: a failed round is skipped, never
    /// immediately retried.
    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn records(&self) -> &[DrawRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<DrawRecord> {
        self.records
    }

    /// Folds one classified outcome into the session; returns the terminal
    /// state if that outcome ends the crawl.
    fn apply(&mut self, outcome: FetchOutcome) -> Option<StopReason> {
        match outcome {
            FetchOutcome::Failure(reason) => {
                warn!(round = self.current_round, %reason, "round failed, skipping forward");
                self.consecutive_failures += 1;
                self.current_round += 1;
                None
            }
            FetchOutcome::EndOfData => {
                info!(
                    round = self.current_round,
                    "no draw at round yet, crawl complete"
                );
                Some(StopReason::EndOfData)
            }
            FetchOutcome::Draw(record) => {
                info!(
                    round = self.current_round,
                    date = record.date.as_deref().unwrap_or("unknown"),
                    "fetched round"
                );
                self.records.push(record);
                self.consecutive_failures = 0;
                self.current_round += 1;
                None
            }
        }
    }
}

#[derive(Debug)]
pub struct CrawlReport {
    pub session: CrawlSession,
    pub stop: StopReason,
}

/// Drives rounds forward from `start_round` until the service reports the
/// frontier or the failure budget runs out. One round is fetched and fully
/// classified per iteration; no round number is ever issued twice.
pub fn run<C: DrawClient + ?Sized>(
    client: &C,
    start_round: u32,
    config: &CrawlConfig,
) -> CrawlReport {
    let mut session = CrawlSession::new(start_round);
    let stop = loop {
        if session.consecutive_failures >= config.max_consecutive_failures {
            warn!(
                failures = session.consecutive_failures,
                last_round = session.current_round - 1,
                "failure budget exhausted, stopping crawl"
            );
            break StopReason::FailureBudgetExhausted;
        }

        let outcome = client.fetch_round(session.current_round());
        let failed = matches!(outcome, FetchOutcome::Failure(_));
        if let Some(stop) = session.apply(outcome) {
            break stop;
        }
        if failed && !config.failure_delay.is_zero() {
            thread::sleep(config.failure_delay);
        }
    };
    CrawlReport { session, stop }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DrawRecord;

    fn draw(round_hint: u8) -> FetchOutcome {
        FetchOutcome::Draw(
            DrawRecord::new([1, 2, 3, 4, 5, round_hint], 7, None).unwrap(),
        )
    }

    #[test]
    fn failure_advances_round_and_counts() {
        let mut session = CrawlSession::new(10);
        let stop = session.apply(FetchOutcome::Failure("boom".to_string()));
        assert_eq!(stop, None);
        assert_eq!(session.current_round(), 11);
        assert_eq!(session.consecutive_failures(), 1);
        assert!(session.records().is_empty());
    }

    #[test]
    fn draw_resets_failure_count_and_advances() {
        let mut session = CrawlSession::new(10);
        session.apply(FetchOutcome::Failure("boom".to_string()));
        let stop = session.apply(draw(6));
        assert_eq!(stop, None);
        assert_eq!(session.current_round(), 12);
        assert_eq!(session.consecutive_failures(), 0);
        assert_eq!(session.records().len(), 1);
    }

    #[test]
    fn end_of_data_is_terminal_and_does_not_advance() {
        let mut session = CrawlSession::new(10);
        let stop = session.apply(FetchOutcome::EndOfData);
        assert_eq!(stop, Some(StopReason::EndOfData));
        assert_eq!(session.current_round(), 10);
    }
}
