// HTML report rendering (askama) and report output paths

use askama::Template;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{
    analysis::ReportContext,
    config::ReportSettings,
    error::AppResult,
};

// Define the template struct pointing to the report file
#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate<'a> {
    title: &'a str,
    wordcloud_file: String,
    keyword_chart: String,
    rating_chart: String,
    sentiment_chart: String,
    mean_rating: String,
    min_rating: String,
    max_rating: String,
    review_count: String,
    top_keyword_text: String,
    summary: &'a str,
    positive: usize,
    negative: usize,
    neutral: usize,
    mean_sentiment: String,
    insights: &'a [String],
}

/// Output locations for one reporter run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPaths {
    pub output_dir: PathBuf,
    pub wordcloud_path: PathBuf,
    pub report_path: PathBuf,
    pub font_path: PathBuf,
}

/// Title usable in file names: quotes dropped, spaces to underscores.
pub fn safe_title(title: &str) -> String {
    title.replace('"', "").replace(' ', "_")
}

impl ReportPaths {
    /// An explicit report path decides the directory; otherwise
    /// `<output_dir>/<safe_title>_report.html`. The PNG sits next to the report.
    pub fn resolve(title: &str, output: Option<&Path>, settings: &ReportSettings) -> Self {
        let safe = safe_title(title);
        let (output_dir, report_path) = match output {
            Some(path) => {
                let dir = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                let file = path.file_name().map(PathBuf::from).unwrap_or_else(|| PathBuf::from(format!("{}_report.html", safe)));
                (dir.clone(), dir.join(file))
            }
            None => {
                let dir = settings.output_dir.clone();
                let report = dir.join(format!("{}_report.html", safe));
                (dir, report)
            }
        };
        ReportPaths {
            wordcloud_path: output_dir.join(format!("{}_wordcloud.png", safe)),
            output_dir,
            report_path,
            font_path: settings.font_path.clone(),
        }
    }
}

// Inline <script> safe JSON
fn script_json(value: &Value) -> AppResult<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn keyword_chart(ctx: &ReportContext) -> Value {
    let labels: Vec<&String> = ctx.keyword_frequencies.keys().collect();
    let counts: Vec<usize> = ctx.keyword_frequencies.values().copied().collect();
    json!({
        "type": "bar",
        "data": {
            "labels": labels,
            "datasets": [{
                "label": "감정 키워드 빈도수",
                "data": counts,
                "backgroundColor": "rgba(0, 0, 0, 0.8)"
            }]
        },
        "options": {
            "plugins": { "legend": { "display": false } },
            "scales": {
                "y": { "beginAtZero": true, "grid": { "color": "rgba(0, 0, 0, 0.1)" } },
                "x": { "grid": { "display": false } }
            }
        }
    })
}

pub fn rating_chart(ctx: &ReportContext) -> Value {
    let months: Vec<&String> = ctx.monthly.keys().collect();
    let means: Vec<f64> = ctx.monthly.values().map(|m| m.mean).collect();
    let counts: Vec<usize> = ctx.monthly.values().map(|m| m.count).collect();
    json!({
        "type": "line",
        "data": {
            "labels": months,
            "datasets": [
                {
                    "label": "평균 평점",
                    "data": means,
                    "borderColor": "rgb(75, 192, 192)",
                    "backgroundColor": "rgba(75, 192, 192, 0.1)",
                    "fill": true,
                    "tension": 0.3,
                    "yAxisID": "y",
                    "borderWidth": 2
                },
                {
                    "label": "리뷰 수",
                    "data": counts,
                    "borderColor": "rgb(255, 99, 132)",
                    "backgroundColor": "rgba(255, 99, 132, 0.1)",
                    "fill": true,
                    "tension": 0.3,
                    "yAxisID": "y1",
                    "borderWidth": 2
                }
            ]
        },
        "options": {
            "interaction": { "mode": "index", "intersect": false },
            "plugins": {
                "title": {
                    "display": true,
                    "text": ["월별 평균 평점 및 리뷰 수 변화 추이", "(평점: 좌측 축, 리뷰 수: 우측 축)"],
                    "font": { "size": 16, "weight": "bold" },
                    "padding": 20
                },
                "legend": { "position": "top", "labels": { "usePointStyle": true, "padding": 15 } }
            },
            "scales": {
                "y": {
                    "type": "linear",
                    "position": "left",
                    "min": 0,
                    "max": 5,
                    "title": { "display": true, "text": "평균 평점 (0-5)" },
                    "grid": { "color": "rgba(75, 192, 192, 0.1)" },
                    "ticks": { "color": "rgb(75, 192, 192)" }
                },
                "y1": {
                    "type": "linear",
                    "position": "right",
                    "min": 0,
                    "title": { "display": true, "text": "리뷰 수" },
                    "grid": { "display": false },
                    "ticks": { "color": "rgb(255, 99, 132)" }
                },
                "x": {
                    "title": { "display": true, "text": "월별" },
                    "grid": { "display": false }
                }
            }
        }
    })
}

pub fn sentiment_chart(ctx: &ReportContext) -> Value {
    let s = &ctx.sentiment;
    json!({
        "type": "doughnut",
        "data": {
            "labels": ["긍정", "부정", "중립"],
            "datasets": [{
                "data": [s.positive, s.negative, s.neutral],
                "backgroundColor": ["rgb(75, 192, 192)", "rgb(255, 99, 132)", "rgb(201, 203, 207)"]
            }]
        },
        "options": { "plugins": { "legend": { "position": "bottom" } } }
    })
}

/// Renders the report document. The image is referenced by file name only.
pub fn render_report(ctx: &ReportContext, title: &str, wordcloud_path: &Path) -> AppResult<String> {
    let wordcloud_file = wordcloud_path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stat = |f: fn(&crate::analysis::RatingStats) -> f64| {
        ctx.rating.as_ref().map(|r| format!("{:.1}점", f(r))).unwrap_or_else(|| "-".to_string())
    };
    let top_keyword_text = ctx
        .top_keywords
        .iter()
        .map(|(k, c)| format!("{}({}회)", k, c))
        .collect::<Vec<_>>()
        .join(", ");

    let template = ReportTemplate {
        title,
        wordcloud_file,
        keyword_chart: script_json(&keyword_chart(ctx))?,
        rating_chart: script_json(&rating_chart(ctx))?,
        sentiment_chart: script_json(&sentiment_chart(ctx))?,
        mean_rating: stat(|r| r.mean),
        min_rating: stat(|r| r.min),
        max_rating: stat(|r| r.max),
        review_count: group_thousands(ctx.rating.map(|r| r.count).unwrap_or(0)),
        top_keyword_text,
        summary: &ctx.summary,
        positive: ctx.sentiment.positive,
        negative: ctx.sentiment.negative,
        neutral: ctx.sentiment.neutral,
        mean_sentiment: format!("{:.2}", ctx.sentiment.mean_score),
        insights: &ctx.insights,
    };
    Ok(template.render()?)
}

/// Renders and writes the report, creating the directory if needed.
pub fn write_report(ctx: &ReportContext, title: &str, wordcloud_path: &Path, report_path: &Path) -> AppResult<()> {
    let html = render_report(ctx, title, wordcloud_path)?;
    if let Some(parent) = report_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(report_path, html)?;
    tracing::info!(path = %report_path.display(), "Report written");
    Ok(())
}
