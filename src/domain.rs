use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::LottoError;

pub const NUMBER_MIN: u8 = 1;
pub const NUMBER_MAX: u8 = 45;
pub const MAIN_NUMBER_COUNT: usize = 6;

/// One drawn round. The round number itself is implicit: records live in a
/// [`DrawStore`] ordered newest-first, so index 0 is the latest round and
/// index `len - 1` is round 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRecord {
    pub main: [u8; MAIN_NUMBER_COUNT],
    pub bonus: u8,
    pub date: Option<String>,
}

impl DrawRecord {
    /// Builds a record, rejecting any ball outside `1..=45`. The date is
    /// optional and passed through as given; use [`validate_draw_date`] to
    /// check upstream date strings before storing them.
    pub fn new(
        main: [u8; MAIN_NUMBER_COUNT],
        bonus: u8,
        date: Option<String>,
    ) -> Result<Self, LottoError> {
        for value in main.iter().copied().chain(std::iter::once(bonus)) {
            if !(NUMBER_MIN..=NUMBER_MAX).contains(&value) {
                return Err(LottoError::NumberOutOfRange(value));
            }
        }
        Ok(Self { main, bonus, date })
    }
}

/// Checks that a date string is a real `YYYY-MM-DD` calendar date.
pub fn validate_draw_date(raw: &str) -> Result<(), LottoError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| LottoError::InvalidDrawDate(raw.to_string()))?;
    Ok(())
}

/// The full persisted history as three parallel arrays, newest round first.
///
/// All three arrays always have identical length; entries in `dates` may
/// individually be `None` for history imported without dates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawStore {
    numbers: Vec<[u8; MAIN_NUMBER_COUNT]>,
    bonuses: Vec<u8>,
    dates: Vec<Option<String>>,
}

impl DrawStore {
    /// Assembles a store from already-parallel arrays. A length mismatch
    /// between numbers and bonuses is unrecoverable (positional round
    /// indexing would be meaningless); a dates array of the wrong length is
    /// resized to fit, padding with `None`.
    pub fn from_parts(
        numbers: Vec<[u8; MAIN_NUMBER_COUNT]>,
        bonuses: Vec<u8>,
        mut dates: Vec<Option<String>>,
    ) -> Result<Self, LottoError> {
        if numbers.len() != bonuses.len() {
            return Err(LottoError::ParallelLengthMismatch {
                numbers: numbers.len(),
                bonuses: bonuses.len(),
            });
        }
        if dates.len() != numbers.len() {
            dates.resize(numbers.len(), None);
        }
        Ok(Self {
            numbers,
            bonuses,
            dates,
        })
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// Highest stored round number, 0 for an empty store.
    pub fn latest_round(&self) -> u32 {
        self.numbers.len() as u32
    }

    /// First round a crawl should ask for.
    pub fn next_round(&self) -> u32 {
        self.latest_round() + 1
    }

    pub fn numbers(&self) -> &[[u8; MAIN_NUMBER_COUNT]] {
        &self.numbers
    }

    pub fn bonuses(&self) -> &[u8] {
        &self.bonuses
    }

    pub fn dates(&self) -> &[Option<String>] {
        &self.dates
    }

    /// Date of the most recent stored round, if known.
    pub fn latest_date(&self) -> Option<&str> {
        self.dates.first().and_then(|date| date.as_deref())
    }

    /// Record at `index` (0 = newest), cloned out of the parallel arrays.
    pub fn record(&self, index: usize) -> Option<DrawRecord> {
        Some(DrawRecord {
            main: *self.numbers.get(index)?,
            bonus: *self.bonuses.get(index)?,
            date: self.dates.get(index)?.clone(),
        })
    }

    /// Merges a crawl session's records into the store.
    ///
    /// `new_records` is in ascending round order (the order the crawl
    /// fetched them); the store is newest-first, so the new records are
    /// reversed and prepended. The caller guarantees contiguity by starting
    /// the crawl at [`DrawStore::next_round`], which makes the oldest new
    /// record the immediate successor of the store's newest entry.
    pub fn merge(self, new_records: Vec<DrawRecord>) -> Self {
        if new_records.is_empty() {
            return self;
        }
        let added = new_records.len();
        let mut numbers = Vec::with_capacity(added + self.numbers.len());
        let mut bonuses = Vec::with_capacity(added + self.bonuses.len());
        let mut dates = Vec::with_capacity(added + self.dates.len());
        for record in new_records.into_iter().rev() {
            numbers.push(record.main);
            bonuses.push(record.bonus);
            dates.push(record.date);
        }
        numbers.extend(self.numbers);
        bonuses.extend(self.bonuses);
        dates.extend(self.dates);
        Self {
            numbers,
            bonuses,
            dates,
        }
    }
}
