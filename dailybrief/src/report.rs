//! Markdown rendering of one run.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use common::OutputConfig;
use std::fmt::Write as _;

use crate::model::{CategoryItems, NewsItem};
use crate::output::{display_offset, report_file_name, TimeSlot};

pub const ITEMS_PER_CATEGORY: usize = 5;
pub const PREVIEW_CHARS: usize = 500;

/// Everything the renderer needs besides the collected items
#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    pub date: NaiveDate,
    pub summary: Option<&'a str>,
    pub generated_at: Option<DateTime<Utc>>,
    pub slot: Option<TimeSlot>,
    pub title: &'a str,
    pub footer: &'a str,
    pub display_offset: FixedOffset,
}

impl<'a> ReportContext<'a> {
    pub fn new(date: NaiveDate, output: &'a OutputConfig) -> Self {
        Self {
            date,
            summary: None,
            generated_at: None,
            slot: None,
            title: &output.title,
            footer: &output.footer,
            display_offset: display_offset(output.display_utc_offset_hours),
        }
    }

    pub fn with_summary(mut self, summary: Option<&'a str>) -> Self {
        self.summary = summary;
        self
    }

    pub fn with_generated_at(mut self, generated_at: Option<DateTime<Utc>>) -> Self {
        self.generated_at = generated_at;
        self
    }

    pub fn with_slot(mut self, slot: Option<TimeSlot>) -> Self {
        self.slot = slot;
        self
    }
}

/// Rendered report and the file name it is stored under
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub markdown: String,
    pub file_name: String,
}

impl Report {
    pub fn render(ctx: &ReportContext<'_>, result: &[CategoryItems]) -> Self {
        Self {
            markdown: render_markdown(ctx, result),
            file_name: report_file_name(ctx.date, ctx.slot),
        }
    }
}

/// Render the report. Categories without items are left out and each
/// category shows at most `ITEMS_PER_CATEGORY` items.
pub fn render_markdown(ctx: &ReportContext<'_>, result: &[CategoryItems]) -> String {
    let mut md = String::new();

    let _ = write!(md, "# {}\n\nDate: {}", ctx.title, ctx.date.format("%Y-%m-%d"));
    if let Some(slot) = ctx.slot {
        let _ = write!(md, " {}", slot.label());
    }
    md.push_str("\n\n");

    if let Some(ts) = ctx.generated_at {
        let local = ts.with_timezone(&ctx.display_offset);
        let _ = write!(md, "_Generated at: {}_\n\n", local.format("%Y-%m-%d %H:%M:%S (UTC%:z)"));
    }

    if let Some(summary) = ctx.summary.map(str::trim).filter(|s| !s.is_empty()) {
        let _ = write!(md, "## 📝 Today's Summary\n\n{}\n\n---\n\n", summary);
    }

    for block in result.iter().filter(|b| !b.items.is_empty()) {
        let _ = write!(md, "## 🔥 {}\n\n", block.category);
        for item in block.items.iter().take(ITEMS_PER_CATEGORY) {
            render_item(&mut md, item);
        }
    }

    let _ = writeln!(md, "---\n{}", ctx.footer);
    md
}

fn render_item(md: &mut String, item: &NewsItem) {
    let _ = write!(md, "- **{}**  \n", item.title);
    match item.source_type.label() {
        Some(label) => {
            let _ = write!(md, "  Source: {} ({})  \n", item.source, label);
        }
        None => {
            let _ = write!(md, "  Source: {}  \n", item.source);
        }
    }

    let content = item.best_content().trim();
    if !content.is_empty() {
        let label = if item.has_full_text() { "full text" } else { "RSS snippet" };
        let _ = write!(md, "  Preview ({}): {}  \n", label, preview(content));
    }

    let _ = write!(md, "  Link: {}\n\n", item.link);
}

/// First `PREVIEW_CHARS` characters on one line, with an ellipsis when cut.
pub fn preview(content: &str) -> String {
    let flat = content.replace("\r\n", " ").replace('\n', " ");
    if flat.chars().count() > PREVIEW_CHARS {
        let head: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        flat
    }
}
