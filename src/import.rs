use std::fs;

use camino::Utf8PathBuf;
use regex::Regex;
use tracing::{info, warn};

use crate::domain::{DrawStore, MAIN_NUMBER_COUNT, NUMBER_MAX, NUMBER_MIN};
use crate::error::LottoError;

/// One draw row pulled out of an export table.
#[derive(Debug)]
struct ExportRow {
    round: u32,
    main: [u8; MAIN_NUMBER_COUNT],
    bonus: u8,
}

/// Rebuilds a full store from locally saved HTML-table draw exports (the
/// bulk download the lottery site offers for historical rounds).
///
/// Each usable row carries a round number, a `YYYY.MM.DD` date cell, and
/// seven trailing number cells (six main + bonus). The date cell anchors
/// the layout — the round number is the cell just before it — but the
/// export's dates are not carried into the store; they stay null.
/// Rows whose trailing cells are not all in `1..=45` are skipped.
pub fn import_files(paths: &[Utf8PathBuf]) -> Result<DrawStore, LottoError> {
    let row_re = Regex::new(r"(?s)<tr[^>]*>(.*?)</tr>").unwrap();
    let cell_re = Regex::new(r"(?s)<td[^>]*>(.*?)</td>").unwrap();
    let tag_re = Regex::new(r"<[^>]*>").unwrap();
    let date_re = Regex::new(r"^\d{4}\.\d{2}\.\d{2}").unwrap();

    let mut rows: Vec<ExportRow> = Vec::new();
    for path in paths {
        let bytes = fs::read(path.as_std_path())
            .map_err(|_| LottoError::ImportRead(path.as_std_path().to_path_buf()))?;
        // legacy exports are EUC-KR encoded; every cell we read is ASCII,
        // so lossy decoding only garbles header text we discard anyway
        let content = String::from_utf8_lossy(&bytes);

        let before = rows.len();
        for row in row_re.captures_iter(&content) {
            if let Some(parsed) = parse_row(&row[1], &cell_re, &tag_re, &date_re) {
                rows.push(parsed);
            }
        }
        info!(path = %path, rows = rows.len() - before, "extracted draw rows");
    }

    if rows.is_empty() {
        return Err(LottoError::ImportEmpty);
    }

    rows.sort_by(|a, b| b.round.cmp(&a.round));

    let latest = rows[0].round;
    let contiguous = latest as usize == rows.len()
        && rows.windows(2).all(|pair| pair[0].round == pair[1].round + 1);
    if !contiguous {
        warn!(
            rounds = rows.len(),
            latest,
            "extracted rounds do not cover 1..=latest; stored positions will not match round numbers"
        );
    }

    let count = rows.len();
    let mut numbers = Vec::with_capacity(count);
    let mut bonuses = Vec::with_capacity(count);
    for row in rows {
        numbers.push(row.main);
        bonuses.push(row.bonus);
    }
    DrawStore::from_parts(numbers, bonuses, vec![None; count])
}

fn parse_row(row: &str, cell_re: &Regex, tag_re: &Regex, date_re: &Regex) -> Option<ExportRow> {
    let cells: Vec<String> = cell_re
        .captures_iter(row)
        .map(|cap| tag_re.replace_all(&cap[1], "").trim().replace(',', ""))
        .collect();
    if cells.len() < 5 {
        return None;
    }

    let date_index = cells
        .iter()
        .take(5)
        .position(|cell| date_re.is_match(cell))?;
    if date_index == 0 {
        return None;
    }
    let round: u32 = cells[date_index - 1].parse().ok()?;

    let tail = cells.len().checked_sub(MAIN_NUMBER_COUNT + 1)?;
    let mut values = [0u8; MAIN_NUMBER_COUNT + 1];
    for (slot, cell) in values.iter_mut().zip(&cells[tail..]) {
        *slot = cell.parse().ok()?;
    }
    if !values
        .iter()
        .all(|n| (NUMBER_MIN..=NUMBER_MAX).contains(n))
    {
        return None;
    }

    let mut main = [0u8; MAIN_NUMBER_COUNT];
    main.copy_from_slice(&values[..MAIN_NUMBER_COUNT]);
    Some(ExportRow {
        round,
        main,
        bonus: values[MAIN_NUMBER_COUNT],
    })
}
