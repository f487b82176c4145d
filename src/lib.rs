//! Incremental archiver for Lotto 6/45 winning numbers.
//!
//! Crawls the public dhlottery JSON endpoint round by round, starting just
//! past the last persisted round, and merges what it finds into a flat JS
//! data file of three parallel newest-first arrays (`allWinningNumbers`,
//! `allBonusNumbers`, `allWinningDates`) that the browser front-end loads
//! directly.

pub mod app;
pub mod codec;
pub mod config;
pub mod crawl;
pub mod dhlottery;
pub mod domain;
pub mod error;
pub mod import;
pub mod output;
pub mod store;
