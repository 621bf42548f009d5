use anyhow::anyhow;
use serde::Serialize;

use crate::entities::RatingView;

pub const CSV_HEADERS: [&str; 8] = [
    "Review ID",
    "User Name",
    "User Email",
    "Event Title",
    "Event Date",
    "Rating",
    "Comment",
    "Review Date",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl TryFrom<&str> for ExportFormat {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(anyhow!("unsupported export format '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportRow {
    review_id: String,
    user_name: String,
    user_email: String,
    event_title: String,
    event_date: String,
    rating: String,
    comment: String,
    review_date: String,
}

impl From<&RatingView> for ExportRow {
    fn from(view: &RatingView) -> Self {
        Self {
            review_id: view.rating.id.clone(),
            user_name: view.user_name.clone(),
            user_email: view.user_email.clone(),
            event_title: view.event_title.clone(),
            event_date: view.event_date.format("%Y-%m-%d").to_string(),
            rating: view.rating.rating.normalize().to_string(),
            comment: view.rating.display_comment().unwrap_or_default(),
            review_date: view.rating.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

impl ExportRow {
    fn cells(&self) -> [&str; 8] {
        [
            &self.review_id,
            &self.user_name,
            &self.user_email,
            &self.event_title,
            &self.event_date,
            &self.rating,
            &self.comment,
            &self.review_date,
        ]
    }
}

pub fn render_reviews(format: ExportFormat, rows: &[RatingView]) -> anyhow::Result<String> {
    let rows: Vec<ExportRow> = rows.iter().map(ExportRow::from).collect();
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(&rows)?),
        ExportFormat::Csv => {
            let mut lines = Vec::with_capacity(rows.len() + 1);
            lines.push(CSV_HEADERS.join(","));
            for row in &rows {
                let cells: Vec<String> = row.cells().iter().map(|cell| csv_cell(cell)).collect();
                lines.push(cells.join(","));
            }
            Ok(lines.join("\n"))
        }
    }
}

/// Quotes cells containing a delimiter, quote or line break; inner quotes are doubled.
pub fn csv_cell(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
