use std::fs;
use std::time::Duration;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use lotto_sync::app::App;
use lotto_sync::crawl::CrawlConfig;
use lotto_sync::dhlottery::{DrawClient, FetchOutcome};
use lotto_sync::error::LottoError;
use lotto_sync::import::import_files;
use lotto_sync::store::DataFile;

const EXPORT: &str = r#"
<table>
  <tr><td>Round</td><td>Date</td><td>Numbers</td></tr>
  <tr><td>1</td><td>2002.12.07</td><td>863,104,143</td>
      <td>10</td><td>23</td><td>29</td><td>33</td><td>37</td><td>40</td><td>16</td></tr>
  <tr><td>3</td><td>2002.12.21</td><td>2,000,000</td>
      <td>11</td><td>16</td><td>19</td><td>21</td><td>27</td><td>31</td><td>30</td></tr>
  <tr><td>2</td><td>2002.12.14</td><td>0</td>
      <td>9</td><td>13</td><td>21</td><td>25</td><td>32</td><td>42</td><td>2</td></tr>
  <tr><td>4</td><td>2002.12.28</td><td>0</td>
      <td>9</td><td>13</td><td>21</td><td>25</td><td>32</td><td>99</td><td>2</td></tr>
</table>
"#;

fn write_export(dir: &tempfile::TempDir, name: &str, content: &str) -> Utf8PathBuf {
    let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap();
    fs::write(path.as_std_path(), content).unwrap();
    path
}

#[test]
fn import_sorts_rounds_descending_with_null_dates() {
    let temp = tempfile::tempdir().unwrap();
    let export = write_export(&temp, "export.xls", EXPORT);

    let store = import_files(&[export]).unwrap();
    assert_eq!(store.len(), 3);
    assert_eq!(store.latest_round(), 3);
    // newest-first: rounds 3, 2, 1
    assert_eq!(store.numbers()[0], [11, 16, 19, 21, 27, 31]);
    assert_eq!(store.numbers()[2], [10, 23, 29, 33, 37, 40]);
    assert_eq!(store.bonuses(), &[30, 2, 16]);
    assert!(store.dates().iter().all(Option::is_none));
}

#[test]
fn rows_with_out_of_range_numbers_are_skipped() {
    let temp = tempfile::tempdir().unwrap();
    let export = write_export(&temp, "export.xls", EXPORT);

    let store = import_files(&[export]).unwrap();
    // the 99 row never makes it in
    assert_eq!(store.len(), 3);
}

#[test]
fn missing_export_file_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("absent.xls")).unwrap();

    let err = import_files(&[path]).unwrap_err();
    assert_matches!(err, LottoError::ImportRead(_));
}

#[test]
fn export_without_draw_rows_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let export = write_export(&temp, "empty.xls", "<table><tr><td>nothing</td></tr></table>");

    let err = import_files(&[export]).unwrap_err();
    assert_matches!(err, LottoError::ImportEmpty);
}

struct NopClient;

impl DrawClient for NopClient {
    fn fetch_round(&self, _round: u32) -> FetchOutcome {
        FetchOutcome::EndOfData
    }
}

#[test]
fn import_through_the_app_replaces_the_data_file() {
    let temp = tempfile::tempdir().unwrap();
    let export = write_export(&temp, "export.xls", EXPORT);
    let data_path = Utf8PathBuf::from_path_buf(temp.path().join("winning_numbers.js")).unwrap();

    let config = CrawlConfig {
        max_consecutive_failures: 5,
        failure_delay: Duration::ZERO,
    };
    let app = App::new(DataFile::new(data_path.clone()), NopClient, config);

    let result = app.import(&[export]).unwrap();
    assert_eq!(result.rounds, 3);
    assert_eq!(result.latest_round, 3);

    let store = DataFile::new(data_path).load();
    assert_eq!(store.len(), 3);
    assert!(store.dates().iter().all(Option::is_none));
}
