//! Summary prompt assembly under a hard character budget.
//!
//! The prompt is `prefix + item list + suffix`. The item list is a fixed
//! framework (category headers, index, title and source per record) with one
//! content slot per record. When the pre-trimmed contents do not fit in what
//! the skeleton and framework leave of the budget, every record is cut by the
//! same ratio, never below a minimal readable length. A final hard cut catches
//! whatever the floor pushes over the limit.
//!
//! Lengths are counted in Unicode scalar values.

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, info, warn};

use crate::model::{CategoryItems, ContentType};

pub const DEFAULT_MAX_PROMPT_CHARS: usize = 30_000;
pub const DEFAULT_MAX_ITEM_CHARS: usize = 800;
/// Records taken per category, matching what the report shows.
pub const ITEMS_PER_CATEGORY: usize = 5;
/// Proportional truncation never keeps fewer characters than this.
pub const MIN_KEPT_CHARS: usize = 100;
/// Room left for the ellipsis when cutting to a ratio-derived target.
pub const ELLIPSIS_RESERVE: usize = 10;
pub const ELLIPSIS: &str = "...";
pub const NO_DETAIL: &str = "(title only, no detail)";
/// Characters removed from the budget before appending `TRUNCATION_NOTICE`.
pub const HARD_CUT_MARGIN: usize = 100;
pub const TRUNCATION_NOTICE: &str = "\n\n(content truncated)";

const FRAMEWORK_HEADING: &str = "Today's research and technology news:\n\n";

/// Size limits applied while building the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptBudget {
    pub max_prompt_chars: usize,
    pub max_item_chars: usize,
}

impl Default for PromptBudget {
    fn default() -> Self {
        Self {
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
            max_item_chars: DEFAULT_MAX_ITEM_CHARS,
        }
    }
}

/// One item as presented to the LLM
#[derive(Debug, Clone, PartialEq)]
pub struct NewsRecord {
    pub category: String,
    pub title: String,
    pub source: String,
    /// Pre-trimmed content, empty when the item had no text
    pub content: String,
    pub content_label: &'static str,
}

/// Instructions surrounding the item list
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSkeleton {
    pub prefix: String,
    pub suffix: String,
}

impl PromptSkeleton {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Standard daily-summary instructions for a run at `timestamp`.
    pub fn daily(timestamp: DateTime<Utc>, display_offset: FixedOffset) -> Self {
        let local = timestamp.with_timezone(&display_offset);
        let prefix = format!(
            "Current timestamp: {}\n\nBelow are the research and technology news items collected today ({}):\n\n",
            timestamp.to_rfc3339(),
            local.format("%Y-%m-%d %H:%M:%S (UTC%:z)"),
        );
        let suffix = "\n\nWrite a concise summary of today's news above, covering:\n\
            1. The most important technical trends and hot topics of the day (as bullet points)\n\
            2. Research directions or breakthroughs worth following\n\
            3. A short analysis or outlook\n\
            4. Separate advice for developers, researchers and students\n\n\
            Requirements: professional and technically rich, may be lively but must stay factual, \
            explained in plain language. Around 600-1200 words, adjusted to the material.";
        Self::new(prefix, suffix)
    }

    pub fn char_len(&self) -> usize {
        self.prefix.chars().count() + self.suffix.chars().count()
    }
}

/// Prompt ready to send, with the figures used to build it
#[derive(Debug, Clone)]
pub struct BuiltPrompt {
    pub text: String,
    /// Budget left for the item list once the skeleton is accounted for
    pub available_chars: i64,
    /// Item-list characters that are not record content
    pub framework_chars: usize,
    /// Budget left for record contents
    pub available_for_content: i64,
    pub total_content_chars: usize,
    /// Set when contents were cut proportionally
    pub reduction_ratio: Option<f64>,
    /// Set when the safety net cut the assembled prompt
    pub hard_truncated: bool,
    /// Content inserted for each record, in record order
    pub inserted: Vec<String>,
}

impl BuiltPrompt {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Flatten a run into prompt records: at most `ITEMS_PER_CATEGORY` per
/// category, full text preferred over the feed snippet.
///
/// Any non-blank content is kept, however short. There is no minimum
/// length below which an item is reduced to its title.
pub fn flatten_records(result: &[CategoryItems], max_item_chars: usize) -> Vec<NewsRecord> {
    let mut records = Vec::new();

    for block in result {
        for item in block.items.iter().take(ITEMS_PER_CATEGORY) {
            let content = pretrim(item.best_content(), max_item_chars);
            let content_label = if content.is_empty() {
                "none"
            } else {
                match item.content_type {
                    ContentType::Fulltext if item.has_full_text() => "full text",
                    _ => "RSS snippet",
                }
            };

            let title = if item.title.is_empty() {
                "Untitled".to_string()
            } else {
                item.title.clone()
            };

            records.push(NewsRecord {
                category: block.category.clone(),
                title,
                source: item.source.clone(),
                content,
                content_label,
            });
        }
    }

    records
}

/// Trim, cap at `max_chars` (appending an ellipsis when cut), and flatten
/// newlines to spaces.
pub fn pretrim(content: &str, max_chars: usize) -> String {
    let trimmed = content.trim();
    let capped = if trimmed.chars().count() > max_chars {
        let head: String = trimmed.chars().take(max_chars).collect();
        format!("{}{}", head.trim(), ELLIPSIS)
    } else {
        trimmed.to_string()
    };
    capped.replace('\n', " ")
}

/// Content kept for one record under proportional reduction.
/// The floor applies even when it exceeds the ratio-derived target.
pub fn reduce_content(content: &str, ratio: f64) -> String {
    let original = content.chars().count();
    let target = (original as f64 * ratio).floor() as i64;
    let keep = (target - ELLIPSIS_RESERVE as i64).max(MIN_KEPT_CHARS as i64) as usize;
    let head: String = content.chars().take(keep).collect();
    format!("{}{}", head.trim(), ELLIPSIS)
}

/// Assemble the summary prompt for `records` within `budget`.
pub fn build_prompt(
    records: &[NewsRecord],
    skeleton: &PromptSkeleton,
    budget: &PromptBudget,
) -> BuiltPrompt {
    let available_chars = budget.max_prompt_chars as i64 - skeleton.char_len() as i64;

    // Per-record text around the content slot, computed once and reused for
    // both the length ledger and the final concatenation.
    let mut index = 0;
    let mut current_category: Option<&str> = None;
    let mut heads = Vec::with_capacity(records.len());
    for record in records {
        let mut head = String::new();
        if current_category != Some(record.category.as_str()) {
            head.push_str(&format!("[{}]\n", record.category));
            current_category = Some(record.category.as_str());
            index = 0;
        }
        index += 1;
        head.push_str(&format!(
            "\n{}. {} (source: {})\n   Content ({}): ",
            index, record.title, record.source, record.content_label
        ));
        heads.push(head);
    }
    const SLOT_TAIL: &str = "\n";

    let framework_chars = FRAMEWORK_HEADING.chars().count()
        + heads.iter().map(|h| h.chars().count()).sum::<usize>()
        + SLOT_TAIL.len() * records.len();
    let available_for_content = available_chars - framework_chars as i64;
    let total_content_chars: usize = records.iter().map(|r| r.content.chars().count()).sum();

    debug!(
        skeleton_chars = skeleton.char_len(),
        available_chars,
        framework_chars,
        available_for_content,
        total_content_chars,
        "prompt budget"
    );

    let (inserted, reduction_ratio): (Vec<String>, Option<f64>) =
        if total_content_chars > 0 && total_content_chars as i64 > available_for_content {
            let ratio = available_for_content as f64 / total_content_chars as f64;
            info!(
                target_chars = available_for_content,
                ratio_percent = %format!("{:.1}", ratio * 100.0),
                "news content over budget, reducing every record"
            );
            let reduced = records.iter().map(|r| reduce_content(&r.content, ratio)).collect();
            (reduced, Some(ratio))
        } else {
            let verbatim = records
                .iter()
                .map(|r| {
                    if r.content.is_empty() {
                        NO_DETAIL.to_string()
                    } else {
                        r.content.clone()
                    }
                })
                .collect();
            (verbatim, None)
        };

    let mut item_list = String::from(FRAMEWORK_HEADING);
    for (head, content) in heads.iter().zip(&inserted) {
        item_list.push_str(head);
        item_list.push_str(content);
        item_list.push_str(SLOT_TAIL);
    }

    let mut text = format!("{}{}{}", skeleton.prefix, item_list, skeleton.suffix);
    let mut hard_truncated = false;
    let assembled = text.chars().count();
    if assembled > budget.max_prompt_chars {
        warn!(assembled, limit = budget.max_prompt_chars, "prompt still over budget, cutting it");
        let head: String = text
            .chars()
            .take(budget.max_prompt_chars.saturating_sub(HARD_CUT_MARGIN))
            .collect();
        text = format!("{}{}", head, TRUNCATION_NOTICE);
        hard_truncated = true;
    }

    BuiltPrompt {
        text,
        available_chars,
        framework_chars,
        available_for_content,
        total_content_chars,
        reduction_ratio,
        hard_truncated,
        inserted,
    }
}
