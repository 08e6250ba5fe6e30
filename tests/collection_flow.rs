mod common;

use common::{ScriptedSource, review_page, settings_in};
use kyobo_scraper::commands::{CollectSummary, collect_to_csv};
use kyobo_scraper::csv_export::{self, REVIEW_COLUMNS};
use kyobo_scraper::models::{CollectionKind, CollectionOutcome, Page};

#[tokio::test]
async fn declared_total_ends_collection_without_extra_request() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let source = ScriptedSource::new(vec![
        review_page(0, 100, Some(150)),
        review_page(100, 50, Some(150)),
        review_page(150, 100, Some(150)),
    ]);

    let summary = collect_to_csv(&source, CollectionKind::Book, "118", &settings, &settings.output.data_dir, false)
        .await
        .unwrap();

    assert_eq!(source.requested_pages(), vec![1, 2]);
    let CollectSummary::Saved { path, count, outcome } = summary else {
        panic!("expected a saved file");
    };
    assert_eq!(count, 150);
    assert_eq!(outcome, CollectionOutcome::Complete);
    assert!(path.file_name().unwrap().to_string_lossy().starts_with("카테고리118_도서목록_"));

    let table = csv_export::read_rows(&path).unwrap();
    assert_eq!(table.rows.len(), 150);
    assert_eq!(table.headers.len(), 42);
}

#[tokio::test]
async fn review_rows_round_trip_through_csv() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let mut last = review_page(3, 1, None).unwrap();
    // Missing fields must still produce their columns
    last.records[0].remove("revwEmtnKywrName");
    let source = ScriptedSource::new(vec![review_page(0, 3, None), Some(last), Some(Page::default())]);

    let summary = collect_to_csv(&source, CollectionKind::Review, "S000061818273", &settings, &settings.output.data_dir, false)
        .await
        .unwrap();
    let CollectSummary::Saved { path, .. } = summary else {
        panic!("expected a saved file");
    };

    let table = csv_export::read_rows(&path).unwrap();
    let expected_headers: Vec<&str> = REVIEW_COLUMNS.iter().map(|c| c.header).collect();
    assert_eq!(table.headers, expected_headers);
    assert_eq!(table.rows.len(), 4);
    assert_eq!(table.rows[0]["리뷰번호"], "0");
    assert_eq!(table.rows[0]["회원ID"], "member0");
    assert_eq!(table.rows[0]["리뷰내용"], "리뷰 0");
    assert_eq!(table.rows[0]["감정키워드"], "재밌어요, 추천해요");
    assert_eq!(table.rows[0]["평점"], "5");
    assert_eq!(table.rows[3]["감정키워드"], "");
    assert_eq!(source.requested_pages(), vec![1, 2, 3]);
}

#[tokio::test]
async fn review_requests_carry_review_sort_code() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let source = ScriptedSource::new(vec![Some(Page::default())]);

    collect_to_csv(&source, CollectionKind::Review, "S1", &settings, &settings.output.data_dir, false)
        .await
        .unwrap();

    let requested = source.requested.lock().unwrap();
    assert_eq!(requested[0].sort, "001");
    assert_eq!(requested[0].page_size, 100);
    assert_eq!(requested[0].identifier, "S1");
}

#[tokio::test]
async fn empty_listing_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let source = ScriptedSource::new(vec![Some(Page::default())]);

    let summary = collect_to_csv(&source, CollectionKind::Review, "S1", &settings, &settings.output.data_dir, false)
        .await
        .unwrap();

    assert!(matches!(summary, CollectSummary::NoData { outcome: CollectionOutcome::Complete }));
    assert!(!settings.output.data_dir.exists());
}

#[tokio::test]
async fn failure_mid_run_still_writes_partial_result() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let source = ScriptedSource::new(vec![review_page(0, 100, None), None, review_page(200, 100, None)]);

    let summary = collect_to_csv(&source, CollectionKind::Review, "S1", &settings, &settings.output.data_dir, false)
        .await
        .unwrap();

    let CollectSummary::Saved { path, count, outcome } = summary else {
        panic!("expected a saved file");
    };
    assert_eq!(count, 100);
    assert!(matches!(outcome, CollectionOutcome::Partial { page: 2, .. }));
    assert_eq!(csv_export::read_rows(&path).unwrap().rows.len(), 100);
    assert_eq!(source.requested_pages(), vec![1, 2]);
}

#[tokio::test]
async fn failure_on_first_page_reports_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let source = ScriptedSource::new(vec![None]);

    let summary = collect_to_csv(&source, CollectionKind::Book, "118", &settings, &settings.output.data_dir, false)
        .await
        .unwrap();

    assert!(matches!(summary, CollectSummary::NoData { outcome: CollectionOutcome::Failed { .. } }));
    assert!(summary.message(CollectionKind::Book).starts_with("No data collected:"));
}

#[tokio::test]
async fn raw_mode_keeps_every_field() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let mut page = review_page(0, 2, None).unwrap();
    page.records[1].insert("extraField".to_string(), serde_json::json!("x"));
    let source = ScriptedSource::new(vec![Some(page)]);

    let summary = collect_to_csv(&source, CollectionKind::Review, "S1", &settings, &settings.output.data_dir, true)
        .await
        .unwrap();
    let CollectSummary::Saved { path, .. } = summary else {
        panic!("expected a saved file");
    };

    let table = csv_export::read_rows(&path).unwrap();
    assert_eq!(table.headers.first().map(String::as_str), Some("revwNum"));
    assert_eq!(table.headers.last().map(String::as_str), Some("extraField"));
    assert_eq!(table.rows[0]["extraField"], "");
    assert_eq!(table.rows[1]["extraField"], "x");
}
