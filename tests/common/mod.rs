#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use kyobo_scraper::collector::PageSource;
use kyobo_scraper::config::Settings;
use kyobo_scraper::error::{AppError, AppResult};
use kyobo_scraper::models::{Page, PageRequest, Record};

/// Replays canned pages; `None` entries fail like a dropped connection.
pub struct ScriptedSource {
    pages: Vec<Option<Page>>,
    pub requested: Mutex<Vec<PageRequest>>,
}

impl ScriptedSource {
    pub fn new(pages: Vec<Option<Page>>) -> Self {
        ScriptedSource { pages, requested: Mutex::new(Vec::new()) }
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.requested.lock().unwrap().iter().map(|r| r.page).collect()
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch_page(&self, request: &PageRequest) -> AppResult<Page> {
        self.requested.lock().unwrap().push(request.clone());
        match self.pages.get(request.page as usize - 1) {
            Some(Some(page)) => Ok(page.clone()),
            Some(None) => Err(AppError::ApiShape(format!("page {} unavailable", request.page))),
            None => Ok(Page::default()),
        }
    }
}

pub fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

/// `n` review records numbered from `start`.
pub fn review_page(start: usize, n: usize, declared_total: Option<u64>) -> Option<Page> {
    let records = (start..start + n)
        .map(|i| {
            record(json!({
                "revwNum": i,
                "mmbrId": format!("member{}", i),
                "cretDttm": "2024-01-15 10:00:00",
                "revwCntt": format!("리뷰 {}", i),
                "revwEmtnKywrName": "재밌어요, 추천해요",
                "revwRvgr": 5
            }))
        })
        .collect();
    Some(Page { records, declared_total })
}

pub fn settings_in(dir: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.output.data_dir = dir.join("data");
    settings.report.output_dir = dir.join("output");
    settings.report.font_path = dir.join("missing.ttf");
    settings
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// First font found among common system locations, for full rendering runs.
pub fn system_font() -> Option<PathBuf> {
    [
        "/usr/share/fonts/truetype/nanum/NanumGothic.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/Library/Fonts/Arial Unicode.ttf",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|p| p.exists())
}
