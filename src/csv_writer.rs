use chrono::NaiveDate;
use log::info;
use std::fmt;
use std::str::FromStr;

use crate::models::Listing;

/// Label written to the sector/title columns unless configured otherwise.
pub const DEFAULT_LABEL: &str = "맛있는녀석들";

const HEADERED_COLUMNS: [&str; 13] = [
    "id",
    "sector",
    "title",
    "name",
    "type",
    "chef",
    "address",
    "lat",
    "lng",
    "date",
    "area",
    "user_score",
    "review_cnt",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// Written inside double quotes
    Quoted(String),
    /// Written as-is
    Bare(String),
}

impl Cell {
    fn quoted(text: impl Into<String>) -> Self {
        Cell::Quoted(text.into())
    }

    fn bare(text: impl Into<String>) -> Self {
        Cell::Bare(text.into())
    }
}

pub type Row = Vec<Cell>;

/// Values shared by every row of one run.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub date: NaiveDate,
    pub label: String,
}

impl RenderContext {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            label: DEFAULT_LABEL.to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// CSV dialect of the generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Headerless 14-column layout matching the existing show files.
    /// Every cell is quoted; embedded quotes are not escaped.
    #[default]
    Legacy,
    /// 13 named columns with a header row; quoted cells double their quotes.
    Headered,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" | "a" => Ok(OutputFormat::Legacy),
            "headered" | "b" => Ok(OutputFormat::Headered),
            other => Err(anyhow::anyhow!(
                "Unknown output format '{}', expected 'legacy' or 'headered'",
                other
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Legacy => f.write_str("legacy"),
            OutputFormat::Headered => f.write_str("headered"),
        }
    }
}

impl OutputFormat {
    pub fn header(&self) -> Option<Row> {
        match self {
            OutputFormat::Legacy => None,
            OutputFormat::Headered => Some(HEADERED_COLUMNS.iter().map(|c| Cell::bare(*c)).collect()),
        }
    }

    /// Builds the cells for one listing. `seq` is 1-based.
    pub fn build_row(&self, seq: usize, listing: &Listing, ctx: &RenderContext) -> Row {
        let record = &listing.record;
        match self {
            OutputFormat::Legacy => vec![
                Cell::quoted("0"),
                Cell::quoted("show"),
                Cell::quoted(ctx.label.as_str()),
                Cell::quoted(listing.display_name.as_str()),
                Cell::quoted("restaurant"),
                Cell::quoted(""),
                Cell::quoted(""),
                Cell::quoted(""),
                Cell::quoted(""),
                Cell::quoted(listing.address.as_str()),
                Cell::quoted(record.lat()),
                Cell::quoted(record.lng()),
                Cell::quoted(""),
                Cell::quoted(ctx.date_string()),
            ],
            OutputFormat::Headered => vec![
                Cell::bare(seq.to_string()),
                Cell::bare(ctx.label.as_str()),
                Cell::bare(ctx.label.as_str()),
                Cell::quoted(listing.display_name.as_str()),
                Cell::quoted(record.category()),
                Cell::bare(""),
                Cell::quoted(listing.address.as_str()),
                Cell::bare(record.lat()),
                Cell::bare(record.lng()),
                Cell::bare(ctx.date_string()),
                Cell::bare(record.area_tags().into_iter().next().unwrap_or_default()),
                Cell::bare(record.user_score()),
                Cell::bare(record.review_cnt()),
            ],
        }
    }

    pub fn render_cell(&self, cell: &Cell) -> String {
        match (self, cell) {
            (_, Cell::Bare(text)) => text.clone(),
            // TODO: escape embedded quotes once the legacy files are checked for names containing them
            (OutputFormat::Legacy, Cell::Quoted(text)) => format!("\"{}\"", text),
            (OutputFormat::Headered, Cell::Quoted(text)) => {
                format!("\"{}\"", text.replace('"', "\"\""))
            }
        }
    }

    pub fn render_row(&self, row: &Row) -> String {
        row.iter()
            .map(|cell| self.render_cell(cell))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Renders the full text: optional header, then one line per listing, joined by `\n`.
    pub fn render(&self, listings: &[Listing], ctx: &RenderContext) -> String {
        let mut lines = Vec::with_capacity(listings.len() + 1);
        if let Some(header) = self.header() {
            lines.push(self.render_row(&header));
        }
        for (idx, listing) in listings.iter().enumerate() {
            let row = self.build_row(idx + 1, listing, ctx);
            lines.push(self.render_row(&row));
        }
        info!("Rendered {} rows in {} format.", listings.len(), self);
        lines.join("\n")
    }
}
