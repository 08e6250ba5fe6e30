// Functions to interact with the Kyobo product API (catalog listing, reviews)

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA, REFERER};
use serde_json::Value;
use std::time::Duration;

use crate::{
    collector::PageSource,
    config::ApiSettings,
    error::{AppError, AppResult},
    models::{CollectionKind, Page, PageRequest, Record},
};

const DETAIL_PAGE_BASE: &str = "https://product.kyobobook.co.kr/detail";

/// Default sort order per listing: newest books, review sort code "001".
pub fn default_sort(kind: CollectionKind) -> &'static str {
    match kind {
        CollectionKind::Book => "new",
        CollectionKind::Review => "001",
    }
}

// Builds the shared reqwest client with browser-like headers
pub fn build_client(settings: &ApiSettings) -> AppResult<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));

    let mut builder = Client::builder()
        .user_agent(settings.user_agent.as_str())
        .default_headers(headers)
        .cookie_store(true);
    if let Some(secs) = settings.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

/// Query string of the category listing endpoint.
pub fn catalog_query(request: &PageRequest) -> Vec<(&'static str, String)> {
    vec![
        ("page", request.page.to_string()),
        ("per", request.page_size.to_string()),
        ("saleCmdtDvsnCode", "KOR".to_string()),
        ("saleCmdtClstCode", request.identifier.clone()),
        ("isEvent", "false".to_string()),
        ("isPackage", "false".to_string()),
        ("isMDPicked", "false".to_string()),
        ("sort", request.sort.clone()),
    ]
}

/// Query string of the review listing endpoint.
pub fn review_query(request: &PageRequest) -> Vec<(&'static str, String)> {
    vec![
        ("page", request.page.to_string()),
        ("pageLimit", request.page_size.to_string()),
        ("reviewSort", request.sort.clone()),
        ("revwPatrCode", "002".to_string()),
        ("saleCmdtid", request.identifier.clone()),
    ]
}

// Pulls `data.<key>` out of a response; a null list is an empty page, a missing one is a shape error
fn extract_records(json: &Value, key: &str) -> AppResult<Vec<Record>> {
    let data = json
        .get("data")
        .filter(|d| d.is_object())
        .ok_or_else(|| AppError::ApiShape("response has no 'data' object".to_string()))?;

    match data.get(key) {
        None => Err(AppError::ApiShape(format!("response has no 'data.{}'", key))),
        Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map.clone()),
                other => Err(AppError::ApiShape(format!("'{}' holds a non-object entry: {}", key, other))),
            })
            .collect(),
        Some(other) => Err(AppError::ApiShape(format!("'data.{}' is not an array: {}", key, other))),
    }
}

/// Decodes a catalog response body (`data.tabContents`, `data.totalCount`).
pub fn parse_catalog_page(body: &str) -> AppResult<Page> {
    let json: Value = serde_json::from_str(body)?;
    let records = extract_records(&json, "tabContents")?;
    // Accept the count as a number or a numeric string
    let declared_total = json.pointer("/data/totalCount").and_then(|v| match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });
    Ok(Page { records, declared_total })
}

/// Decodes a review response body (`data.reviewList`); no total is reported.
pub fn parse_review_page(body: &str) -> AppResult<Page> {
    let json: Value = serde_json::from_str(body)?;
    let records = extract_records(&json, "reviewList")?;
    Ok(Page { records, declared_total: None })
}

/// HTTP page source for one listing kind.
pub struct KyoboClient {
    http: Client,
    settings: ApiSettings,
    kind: CollectionKind,
}

impl KyoboClient {
    pub fn new(http: Client, settings: ApiSettings, kind: CollectionKind) -> Self {
        KyoboClient { http, settings, kind }
    }

    async fn get_text(&self, url: &str, query: &[(&'static str, String)], referer: Option<String>) -> AppResult<String> {
        let mut request = self.http.get(url).query(query);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }
        let response = request.send().await?.error_for_status()?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(url, status = %status, body_len = body.len(), "Received response");
        Ok(body)
    }
}

#[async_trait]
impl PageSource for KyoboClient {
    async fn fetch_page(&self, request: &PageRequest) -> AppResult<Page> {
        match self.kind {
            CollectionKind::Book => {
                let body = self.get_text(&self.settings.catalog_url, &catalog_query(request), None).await?;
                parse_catalog_page(&body)
            }
            CollectionKind::Review => {
                let referer = format!("{}/{}", DETAIL_PAGE_BASE, request.identifier);
                let body = self.get_text(&self.settings.review_url, &review_query(request), Some(referer)).await?;
                parse_review_page(&body)
            }
        }
    }
}
