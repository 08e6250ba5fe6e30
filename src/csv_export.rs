// CSV output of collected records and the matching reader

use chrono::{DateTime, Local};
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{
    error::AppResult,
    models::{CollectionKind, Record},
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const PRODUCT_INFO: &str = "productInfo";

/// Where a column's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// Top-level key of the record
    Item(&'static str),
    /// Key inside the nested `productInfo` object
    ProductInfo(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub header: &'static str,
    pub source: FieldSource,
}

const fn item(header: &'static str, key: &'static str) -> Column {
    Column { header, source: FieldSource::Item(key) }
}

const fn info(header: &'static str, key: &'static str) -> Column {
    Column { header, source: FieldSource::ProductInfo(key) }
}

pub const CATALOG_COLUMNS: &[Column] = &[
    item("상품ID", "saleCmdtId"),
    item("상품명", "cmdtName"),
    item("상품코드", "cmdtcode"),
    item("상품그룹구분코드", "saleCmdtGrpDvsnCode"),
    item("상품구분코드", "saleCmdtDvsnCode"),
    item("상품분류코드", "saleCmdtClstCode"),
    item("출판사명", "pbcmName"),
    item("출시일", "rlseDate"),
    item("내용소개", "inbukCntt"),
    item("가격", "price"),
    item("상품상태코드", "cmdtCdtnCode"),
    item("배송구분코드", "bkbnShpCode"),
    item("전체리뷰내용", "whlRevwCont"),
    item("리뷰평균평점", "revwRvgrAvg"),
    item("베스트키워드명", "bestEmtnKywrName"),
    item("상품분류명", "saleCmdtClstName"),
    item("문화공간", "clturPlce"),
    item("기간", "period"),
    item("전시상품구분코드", "enbsCmdtDvsnCode"),
    info("좋아요", "like"),
    info("장바구니", "basket"),
    info("구매", "buy"),
    info("직접구매", "direct"),
    info("상세보기", "viewDetails"),
    info("스티키", "sticky"),
    info("재입고여부", "reStockOnOff"),
    info("출시여부", "releaseOnOff"),
    info("배송코드", "shippingCode"),
    info("배송텍스트", "shippingText"),
    info("배송종류", "shippingKind"),
    info("오늘의책", "todayBook"),
    info("오늘의책라벨", "todayBookLabel"),
    info("MD추천", "mdChoice"),
    info("특별주문", "specialOrder"),
    info("교보전용", "onlyKyobo"),
    info("한정판매", "limitSale"),
    info("사은품", "gifts"),
    info("이벤트", "event"),
    info("소득공제", "incomeDeduction"),
    info("고정가격", "fixPrice"),
    info("제본", "bind"),
    info("할인가격", "cutPrice"),
];

// Header names are also the reporter's required input columns
pub const REVIEW_NUMBER: &str = "리뷰번호";
pub const MEMBER_ID: &str = "회원ID";
pub const WRITTEN_AT: &str = "작성일시";
pub const CONTENT: &str = "리뷰내용";
pub const KEYWORDS: &str = "감정키워드";
pub const RATING: &str = "평점";

pub const REVIEW_COLUMNS: &[Column] = &[
    item(REVIEW_NUMBER, "revwNum"),
    item(MEMBER_ID, "mmbrId"),
    item(WRITTEN_AT, "cretDttm"),
    item(CONTENT, "revwCntt"),
    item(KEYWORDS, "revwEmtnKywrName"),
    item(RATING, "revwRvgr"),
];

pub fn columns_for(kind: CollectionKind) -> &'static [Column] {
    match kind {
        CollectionKind::Book => CATALOG_COLUMNS,
        CollectionKind::Review => REVIEW_COLUMNS,
    }
}

/// Renders a JSON value as a CSV cell: strings verbatim, null as empty.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn lookup<'a>(record: &'a Record, source: FieldSource) -> Option<&'a Value> {
    match source {
        FieldSource::Item(key) => record.get(key),
        FieldSource::ProductInfo(key) => record.get(PRODUCT_INFO).and_then(|v| v.get(key)),
    }
}

/// `카테고리118_도서목록_20240101_120000.csv` / `교보_S0001_리뷰_20240101_120000.csv`
pub fn output_file_name(kind: CollectionKind, identifier: &str, at: DateTime<Local>) -> String {
    let timestamp = at.format("%Y%m%d_%H%M%S");
    match kind {
        CollectionKind::Book => format!("카테고리{}_도서목록_{}.csv", identifier, timestamp),
        CollectionKind::Review => format!("교보_{}_리뷰_{}.csv", identifier, timestamp),
    }
}

fn create_with_bom(path: &Path) -> AppResult<csv::Writer<File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;
    Ok(csv::Writer::from_writer(file))
}

/// Writes records against a fixed schema, one row each, in collection order.
pub fn write_records(path: &Path, columns: &[Column], records: &[Record]) -> AppResult<()> {
    let mut writer = create_with_bom(path)?;
    writer.write_record(columns.iter().map(|c| c.header))?;
    for record in records {
        writer.write_record(
            columns
                .iter()
                .map(|c| lookup(record, c.source).map(render_value).unwrap_or_default()),
        )?;
    }
    writer.flush()?;
    tracing::debug!(path = %path.display(), rows = records.len(), "Wrote CSV");
    Ok(())
}

/// Writes every field seen in any record, `productInfo` keys flattened in.
pub fn write_raw_records(path: &Path, records: &[Record]) -> AppResult<()> {
    let mut headers: IndexSet<String> = IndexSet::new();
    for record in records {
        for (key, value) in record {
            match (key.as_str(), value) {
                (PRODUCT_INFO, Value::Object(nested)) => headers.extend(nested.keys().cloned()),
                _ => {
                    headers.insert(key.clone());
                }
            }
        }
    }

    let mut writer = create_with_bom(path)?;
    writer.write_record(headers.iter())?;
    for record in records {
        let nested = record.get(PRODUCT_INFO).and_then(Value::as_object);
        let row = headers.iter().map(|h| {
            record
                .get(h)
                .filter(|_| h.as_str() != PRODUCT_INFO || nested.is_none())
                .or_else(|| nested.and_then(|n| n.get(h)))
                .map(render_value)
                .unwrap_or_default()
        });
        writer.write_record(row)?;
    }
    writer.flush()?;
    tracing::debug!(path = %path.display(), rows = records.len(), columns = headers.len(), "Wrote raw CSV");
    Ok(())
}

/// Writes a collection into `dir` under a timestamped name and returns the path.
pub fn save_collection(
    dir: &Path,
    kind: CollectionKind,
    identifier: &str,
    records: &[Record],
    raw: bool,
) -> AppResult<PathBuf> {
    let path = dir.join(output_file_name(kind, identifier, Local::now()));
    if raw {
        write_raw_records(&path, records)?;
    } else {
        write_records(&path, columns_for(kind), records)?;
    }
    Ok(path)
}

/// A CSV loaded as header → cell maps, headers in file order.
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<IndexMap<String, String>>,
}

impl CsvTable {
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|c| !self.headers.iter().any(|h| h == *c))
            .map(|c| c.to_string())
            .collect()
    }
}

/// Reads a CSV, tolerating a leading BOM. Short rows yield empty cells.
pub fn read_rows(path: &Path) -> AppResult<CsvTable> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), record.get(i).unwrap_or("").to_string()))
            .collect();
        rows.push(row);
    }
    Ok(CsvTable { headers, rows })
}
