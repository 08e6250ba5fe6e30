mod common;

use common::{settings_in, system_font, write_file};
use kyobo_scraper::commands::{ReportStage, build_report};
use kyobo_scraper::error::AppError;
use kyobo_scraper::report::ReportPaths;
use kyobo_scraper::sentiment::ExemplarIndex;
use kyobo_scraper::wordcloud::WordCloudOptions;

const REVIEWS: &str = "\u{feff}리뷰번호,회원ID,작성일시,리뷰내용,감정키워드,평점
1,reader1,2024-02-03 12:00:00,정말 재미있고 유익한 책이에요. 강력 추천합니다!,\"재밌어요, 추천해요\",5
2,reader2,2024-01-10 09:30:00,내용이 너무 지루하고 별로였어요.,지루해요,2
3,reader3,2024-01-20 18:45:00,많은 것을 배웠어요 추천합니다,추천해요,4
";

fn small_cloud() -> WordCloudOptions {
    WordCloudOptions { width: 300, height: 300, max_words: 50, ..Default::default() }
}

#[test]
fn missing_columns_stop_before_any_output() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let input = write_file(dir.path(), "bad.csv", "리뷰번호,리뷰내용\n1,좋아요\n");
    let paths = ReportPaths::resolve("책", None, &settings.report);

    let err = build_report("책", &input, paths.clone(), &ExemplarIndex::new(), &small_cloud()).unwrap_err();

    assert_eq!(err.stage, ReportStage::ReadInput);
    match &err.source {
        AppError::MissingColumns(cols) => {
            assert!(cols.contains(&"작성일시".to_string()));
            assert!(cols.contains(&"평점".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!paths.wordcloud_path.exists());
    assert!(!paths.report_path.exists());
}

#[test]
fn unreadable_timestamp_is_reported_with_its_line() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let input = write_file(
        dir.path(),
        "reviews.csv",
        "리뷰번호,회원ID,작성일시,리뷰내용,감정키워드,평점\n1,a,2024-01-01,좋아요,,5\n2,b,어제,별로,,1\n",
    );
    let paths = ReportPaths::resolve("책", None, &settings.report);

    let err = build_report("책", &input, paths, &ExemplarIndex::new(), &small_cloud()).unwrap_err();

    assert_eq!(err.stage, ReportStage::ReadInput);
    assert!(matches!(&err.source, AppError::InvalidTimestamp { row: 3, .. }));
}

#[test]
fn missing_input_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let paths = ReportPaths::resolve("책", None, &settings.report);

    let err = build_report("책", &dir.path().join("nope.csv"), paths, &ExemplarIndex::new(), &small_cloud())
        .unwrap_err();

    assert_eq!(err.stage, ReportStage::ReadInput);
    assert!(err.to_string().starts_with("CSV read error"));
}

#[test]
fn word_cloud_failure_skips_the_report() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    let input = write_file(dir.path(), "reviews.csv", REVIEWS);
    let paths = ReportPaths::resolve("세이노의 가르침", None, &settings.report);

    let err = build_report("세이노의 가르침", &input, paths.clone(), &ExemplarIndex::new(), &small_cloud())
        .unwrap_err();

    assert_eq!(err.stage, ReportStage::WordCloud);
    assert!(matches!(&err.source, AppError::Font { .. }));
    assert!(!paths.report_path.exists());
}

#[test]
fn full_run_writes_image_and_report() {
    let Some(font) = system_font() else {
        eprintln!("no system font found, skipping full render");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let mut settings = settings_in(dir.path());
    settings.report.font_path = font;
    let input = write_file(dir.path(), "reviews.csv", REVIEWS);
    let paths = ReportPaths::resolve("세이노의 가르침", None, &settings.report);

    let artifacts = build_report("세이노의 가르침", &input, paths, &ExemplarIndex::new(), &small_cloud()).unwrap();

    assert_eq!(artifacts.reviews, 3);
    assert!(artifacts.paths.wordcloud_path.ends_with("세이노의_가르침_wordcloud.png"));
    assert!(artifacts.paths.wordcloud_path.exists());

    let html = std::fs::read_to_string(&artifacts.paths.report_path).unwrap();
    assert!(html.contains("세이노의 가르침"));
    assert!(html.contains("세이노의_가르침_wordcloud.png"));
    assert!(html.contains("\"labels\":[\"2024-01\",\"2024-02\"]"));

    let ctx = &artifacts.context;
    assert_eq!(ctx.keyword_frequencies["추천해요"], 2);
    assert_eq!(ctx.sentiment.positive + ctx.sentiment.negative + ctx.sentiment.neutral, 3);
}
