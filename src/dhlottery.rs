use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::warn;

use crate::domain::{DrawRecord, MAIN_NUMBER_COUNT, validate_draw_date};
use crate::error::LottoError;

pub const DEFAULT_BASE_URL: &str = "https://www.dhlottery.co.kr/common.do";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// What one remote call told us about a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A valid draw exists at the requested round.
    Draw(DrawRecord),
    /// The service answered but no draw exists at the requested round yet.
    EndOfData,
    /// Transport trouble or an unusable payload; the round yielded nothing.
    Failure(String),
}

pub trait DrawClient: Send + Sync {
    fn fetch_round(&self, round: u32) -> FetchOutcome;
}

#[derive(Clone)]
pub struct DhLotteryClient {
    client: Client,
    base_url: String,
}

impl DhLotteryClient {
    pub fn new() -> Result<Self, LottoError> {
        Self::with_base_url(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, LottoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("lotto-sync/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| LottoError::Http(err.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| LottoError::Http(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    fn send_with_retries<F>(&self, mut make_req: F) -> Result<reqwest::blocking::Response, String>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(err.to_string());
                }
            }
        }
    }
}

impl DrawClient for DhLotteryClient {
    fn fetch_round(&self, round: u32) -> FetchOutcome {
        let round_param = round.to_string();
        let response = match self.send_with_retries(|| {
            self.client.get(&self.base_url).query(&[
                ("method", "getLottoNumber"),
                ("drwNo", round_param.as_str()),
            ])
        }) {
            Ok(response) => response,
            Err(reason) => return FetchOutcome::Failure(format!("round {round}: {reason}")),
        };

        if !response.status().is_success() {
            return FetchOutcome::Failure(format!(
                "round {round}: HTTP {}",
                response.status().as_u16()
            ));
        }

        let payload: DrawPayload = match response.json() {
            Ok(payload) => payload,
            Err(err) => {
                return FetchOutcome::Failure(format!("round {round}: body not valid JSON: {err}"));
            }
        };

        classify_payload(payload, round)
    }
}

#[derive(Debug, Deserialize)]
struct DrawPayload {
    #[serde(rename = "returnValue")]
    return_value: Option<String>,
    #[serde(rename = "drwtNo1")]
    no1: Option<u8>,
    #[serde(rename = "drwtNo2")]
    no2: Option<u8>,
    #[serde(rename = "drwtNo3")]
    no3: Option<u8>,
    #[serde(rename = "drwtNo4")]
    no4: Option<u8>,
    #[serde(rename = "drwtNo5")]
    no5: Option<u8>,
    #[serde(rename = "drwtNo6")]
    no6: Option<u8>,
    #[serde(rename = "bnusNo")]
    bonus: Option<u8>,
    #[serde(rename = "drwNoDate")]
    date: Option<String>,
}

/// Turns a parsed payload into the tri-state outcome. `returnValue` other
/// than `"success"` is the service's authoritative "no such round" signal;
/// a success payload missing any numeric field is a failure, never a
/// partial record. A bad date only costs the date.
fn classify_payload(payload: DrawPayload, round: u32) -> FetchOutcome {
    if payload.return_value.as_deref() != Some("success") {
        return FetchOutcome::EndOfData;
    }

    let (Some(n1), Some(n2), Some(n3), Some(n4), Some(n5), Some(n6), Some(bonus)) = (
        payload.no1,
        payload.no2,
        payload.no3,
        payload.no4,
        payload.no5,
        payload.no6,
        payload.bonus,
    ) else {
        return FetchOutcome::Failure(format!(
            "round {round}: payload missing required draw numbers"
        ));
    };

    let date = match payload.date {
        Some(raw) => match validate_draw_date(&raw) {
            Ok(()) => Some(raw),
            Err(_) => {
                warn!(round, date = %raw, "ignoring malformed draw date");
                None
            }
        },
        None => None,
    };

    let main: [u8; MAIN_NUMBER_COUNT] = [n1, n2, n3, n4, n5, n6];
    match DrawRecord::new(main, bonus, date) {
        Ok(record) => FetchOutcome::Draw(record),
        Err(err) => FetchOutcome::Failure(format!("round {round}: {err}")),
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn payload(json: &str) -> DrawPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn success_payload_becomes_draw() {
        let outcome = classify_payload(
            payload(
                r#"{"returnValue":"success","drwNoDate":"2002-12-07",
                   "drwtNo1":10,"drwtNo2":23,"drwtNo3":29,"drwtNo4":33,
                   "drwtNo5":37,"drwtNo6":40,"bnusNo":16}"#,
            ),
            1,
        );
        assert_matches!(outcome, FetchOutcome::Draw(record) => {
            assert_eq!(record.main, [10, 23, 29, 33, 37, 40]);
            assert_eq!(record.bonus, 16);
            assert_eq!(record.date.as_deref(), Some("2002-12-07"));
        });
    }

    #[test]
    fn non_success_return_value_is_end_of_data() {
        let outcome = classify_payload(payload(r#"{"returnValue":"fail"}"#), 1200);
        assert_eq!(outcome, FetchOutcome::EndOfData);
    }

    #[test]
    fn missing_return_value_is_end_of_data() {
        let outcome = classify_payload(payload("{}"), 1200);
        assert_eq!(outcome, FetchOutcome::EndOfData);
    }

    #[test]
    fn missing_number_is_a_failure_not_a_partial_record() {
        let outcome = classify_payload(
            payload(
                r#"{"returnValue":"success","drwtNo1":10,"drwtNo2":23,
                   "drwtNo3":29,"drwtNo4":33,"drwtNo5":37,"bnusNo":16}"#,
            ),
            7,
        );
        assert_matches!(outcome, FetchOutcome::Failure(reason) => {
            assert!(reason.contains("round 7"));
        });
    }

    #[test]
    fn out_of_range_number_is_a_failure() {
        let outcome = classify_payload(
            payload(
                r#"{"returnValue":"success","drwtNo1":10,"drwtNo2":23,
                   "drwtNo3":29,"drwtNo4":33,"drwtNo5":37,"drwtNo6":46,"bnusNo":16}"#,
            ),
            7,
        );
        assert_matches!(outcome, FetchOutcome::Failure(_));
    }

    #[test]
    fn malformed_date_only_costs_the_date() {
        let outcome = classify_payload(
            payload(
                r#"{"returnValue":"success","drwNoDate":"07/12/2002",
                   "drwtNo1":10,"drwtNo2":23,"drwtNo3":29,"drwtNo4":33,
                   "drwtNo5":37,"drwtNo6":40,"bnusNo":16}"#,
            ),
            1,
        );
        assert_matches!(outcome, FetchOutcome::Draw(record) => {
            assert_eq!(record.date, None);
        });
    }
}
