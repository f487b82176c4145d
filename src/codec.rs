use regex::Regex;
use tracing::warn;

use crate::domain::{DrawStore, MAIN_NUMBER_COUNT};

pub const WINNING_NUMBERS_DECL: &str = "allWinningNumbers";
pub const BONUS_NUMBERS_DECL: &str = "allBonusNumbers";
pub const WINNING_DATES_DECL: &str = "allWinningDates";

/// Parses the embedded-declaration data file into a [`DrawStore`].
///
/// Never fails: anything unusable (missing declarations, malformed
/// literals, mismatched numeric arrays) logs the reason and yields an
/// empty store, which makes the next crawl start over from round 1. A
/// missing or broken dates declaration is not unusable — the numeric
/// history is kept and the dates are backfilled with `null`.
pub fn decode(text: &str) -> DrawStore {
    match try_decode(text) {
        Ok(store) => store,
        Err(reason) => {
            warn!(%reason, "existing data file not usable, starting from an empty store");
            DrawStore::default()
        }
    }
}

fn try_decode(text: &str) -> Result<DrawStore, String> {
    let numbers_literal = extract_declaration(text, WINNING_NUMBERS_DECL)
        .ok_or_else(|| format!("declaration `{WINNING_NUMBERS_DECL}` not found"))?;
    let bonus_literal = extract_declaration(text, BONUS_NUMBERS_DECL)
        .ok_or_else(|| format!("declaration `{BONUS_NUMBERS_DECL}` not found"))?;

    let numbers: Vec<[u8; MAIN_NUMBER_COUNT]> =
        serde_json::from_str(&sanitize_literal(numbers_literal))
            .map_err(|err| format!("`{WINNING_NUMBERS_DECL}` did not parse: {err}"))?;
    let bonuses: Vec<u8> = serde_json::from_str(&sanitize_literal(bonus_literal))
        .map_err(|err| format!("`{BONUS_NUMBERS_DECL}` did not parse: {err}"))?;

    let dates = match extract_declaration(text, WINNING_DATES_DECL) {
        Some(literal) => match serde_json::from_str::<Vec<Option<String>>>(&sanitize_literal(
            literal,
        )) {
            Ok(dates) => {
                if dates.len() != numbers.len() {
                    warn!(
                        dates = dates.len(),
                        rounds = numbers.len(),
                        "date array length does not match winning numbers, resizing"
                    );
                }
                dates
            }
            Err(err) => {
                warn!(%err, "`{WINNING_DATES_DECL}` did not parse, backfilling nulls");
                vec![None; numbers.len()]
            }
        },
        None => {
            warn!("no `{WINNING_DATES_DECL}` declaration, backfilling nulls");
            vec![None; numbers.len()]
        }
    };

    DrawStore::from_parts(numbers, bonuses, dates).map_err(|err| err.to_string())
}

/// Renders a store as the three embedded declarations, one per line, in
/// the order the front-end expects: numbers, bonus, dates.
pub fn encode(store: &DrawStore) -> String {
    let numbers = serde_json::json!(store.numbers()).to_string();
    let bonuses = serde_json::json!(store.bonuses()).to_string();
    let dates = serde_json::json!(store.dates()).to_string();
    format!(
        "const {WINNING_NUMBERS_DECL} = {numbers};\n\
         const {BONUS_NUMBERS_DECL} = {bonuses};\n\
         const {WINNING_DATES_DECL} = {dates};\n"
    )
}

/// Finds `name = [...]` in the text and returns the bracketed literal,
/// captured by balanced-bracket scanning so nested arrays survive intact.
fn extract_declaration<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let mut search = 0;
    while let Some(found) = text[search..].find(name) {
        let at = search + found;
        search = at + name.len();

        // skip hits inside longer identifiers
        let standalone = text[..at]
            .chars()
            .next_back()
            .is_none_or(|ch| !ch.is_ascii_alphanumeric() && ch != '_');
        if !standalone {
            continue;
        }
        let rest = text[search..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        let rest = rest.trim_start();
        if rest.starts_with('[') {
            return capture_balanced(rest);
        }
    }
    None
}

/// Returns the prefix of `text` up to and including the bracket that
/// closes the leading `[`, or `None` if the brackets never balance.
fn capture_balanced(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Makes a JS array literal JSON-parseable: drops `//` and `/* */`
/// comments and trailing commas before a closing bracket.
fn sanitize_literal(literal: &str) -> String {
    let line_comments = Regex::new(r"(?m)//.*$").unwrap();
    let block_comments = Regex::new(r"(?s)/\*.*?\*/").unwrap();
    let trailing_commas = Regex::new(r",\s*([\]\}])").unwrap();

    let stripped = line_comments.replace_all(literal, "");
    let stripped = block_comments.replace_all(&stripped, "");
    trailing_commas.replace_all(&stripped, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_nested_arrays_completely() {
        let text = "const allWinningNumbers = [[1,2,3,4,5,6],[7,8,9,10,11,12]];";
        let literal = extract_declaration(text, WINNING_NUMBERS_DECL).unwrap();
        assert_eq!(literal, "[[1,2,3,4,5,6],[7,8,9,10,11,12]]");
    }

    #[test]
    fn skips_longer_identifiers_with_matching_prefix() {
        let text = "const allWinningNumbersBackup = [[9,9,9,9,9,9]];\n\
                    const allWinningNumbers = [[1,2,3,4,5,6]];";
        let literal = extract_declaration(text, WINNING_NUMBERS_DECL).unwrap();
        assert_eq!(literal, "[[1,2,3,4,5,6]]");
    }

    #[test]
    fn unbalanced_brackets_capture_nothing() {
        let text = "const allBonusNumbers = [1, 2, 3";
        assert_eq!(extract_declaration(text, BONUS_NUMBERS_DECL), None);
    }

    #[test]
    fn brackets_inside_strings_do_not_count() {
        let text = r#"const allWinningDates = ["2002-12-07", "odd ] value"];"#;
        let literal = extract_declaration(text, WINNING_DATES_DECL).unwrap();
        assert_eq!(literal, r#"["2002-12-07", "odd ] value"]"#);
    }

    #[test]
    fn sanitize_strips_comments_and_trailing_commas() {
        let literal = "[1, 2, // two\n 3, /* gap */ 4,]";
        assert_eq!(sanitize_literal(literal), "[1, 2, \n 3,  4]");
    }
}
