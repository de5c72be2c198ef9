//! Converts a freeform analysis report into an ordered sequence of typed
//! presentation blocks. The classifier is a single forward pass over lines;
//! each line is matched against an explicit ordered rule list and the first
//! matching rule wins.

pub mod tables;

use serde::Serialize;

use crate::analysis::Report;

/// One unit of structured presentation content in the published report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph { text: String },
    BulletItem { text: String },
    Callout { text: String, icon: String },
    Table { rows: Vec<Vec<String>> },
}

const GROWTH_ICON: &str = "📈";
const TARGET_ICON: &str = "🎯";
const WARNING_ICON: &str = "⚠️";
const CHECK_ICON: &str = "✅";
const MONEY_ICON: &str = "💰";
const UP_TREND_ICON: &str = "📈";
const DOWN_TREND_ICON: &str = "📉";
const IDEA_ICON: &str = "💡";
const ATTENTION_ICON: &str = "📌";
const FOOTER_ICON: &str = "🤖";

/// Keyword families for level-2 heading icons, first match wins.
const HEADING_ICON_FAMILIES: &[(&[&str], &str)] = &[
    (&["opportunity", "market", "size"], GROWTH_ICON),
    (&["strategy", "position", "competitive"], TARGET_ICON),
    (&["risk", "challenge", "threat"], WARNING_ICON),
    (&["recommend", "action", "next"], CHECK_ICON),
    (&["financial", "revenue", "cost"], MONEY_ICON),
];

/// Keyword families for bullet icons, first match wins; no match, no icon.
const BULLET_ICON_FAMILIES: &[(&[&str], &str)] = &[
    (
        &["increase", "grow", "opportunity", "positive", "strong"],
        UP_TREND_ICON,
    ),
    (
        &["decrease", "reduce", "risk", "negative", "challenge"],
        DOWN_TREND_ICON,
    ),
    (
        &["recommend", "should", "action", "implement"],
        IDEA_ICON,
    ),
    (
        &["competitive", "advantage", "differentiate"],
        TARGET_ICON,
    ),
];

const CALLOUT_MARKERS: &[&str] = &["important", "key insight", "critical", "note:"];

/// Formats one report into its block sequence. Never fails: an empty report
/// still yields the title heading, the per-type preamble table, and the
/// footer callout.
pub fn format_report(report: &Report) -> Vec<Block> {
    let mut blocks = Vec::new();

    blocks.push(Block::Heading {
        level: 1,
        text: format!(
            "{} {} — {}",
            report.analysis_type.icon(),
            report.analysis_type.display_name(),
            report.project_name
        ),
    });

    blocks.push(tables::preamble_table(
        report.analysis_type,
        &report.raw_text,
    ));

    for line in report.raw_text.lines() {
        if let Some(block) = classify_line(line) {
            blocks.push(block);
        }
    }

    blocks.push(Block::Callout {
        text: format!(
            "Generated by AI analysis on {}. Review with domain experts before acting.",
            report.generated_at.format("%Y-%m-%d %H:%M UTC")
        ),
        icon: FOOTER_ICON.to_string(),
    });

    blocks
}

struct Rule {
    matches: fn(&str) -> bool,
    build: fn(&str) -> Block,
}

/// Priority-ordered classifier: heading rules before bullet rules, before the
/// callout rule, before the fallback paragraph rule.
const RULES: &[Rule] = &[
    Rule {
        matches: is_major_heading,
        build: build_major_heading,
    },
    Rule {
        matches: is_sub_heading,
        build: build_sub_heading,
    },
    Rule {
        matches: is_bullet,
        build: build_bullet,
    },
    Rule {
        matches: is_callout,
        build: build_callout,
    },
    Rule {
        matches: is_paragraph,
        build: build_paragraph,
    },
];

/// Classifies one line; `None` means the line emits no block.
pub fn classify_line(line: &str) -> Option<Block> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    RULES
        .iter()
        .find(|rule| (rule.matches)(trimmed))
        .map(|rule| (rule.build)(trimmed))
}

fn wholly_bold(line: &str) -> bool {
    line.len() > 4 && line.starts_with("**") && line.ends_with("**")
}

fn is_major_heading(line: &str) -> bool {
    line.starts_with("## ") || (wholly_bold(line) && line.chars().count() > 10)
}

fn build_major_heading(line: &str) -> Block {
    let text = line
        .strip_prefix("## ")
        .unwrap_or(line)
        .trim_matches('*')
        .trim()
        .to_string();
    let text = match heading_icon(&text) {
        Some(icon) => format!("{icon} {text}"),
        None => text,
    };
    Block::Heading { level: 2, text }
}

fn is_sub_heading(line: &str) -> bool {
    if line.starts_with("### ") {
        return true;
    }
    line.chars().next().is_some_and(|c| c.is_ascii_digit())
        && ordinal_rest(line).is_some()
        && line.contains("**")
}

/// The text after a leading `N. ` ordinal, if the line has one.
fn ordinal_rest(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    line[digits..].strip_prefix(". ")
}

fn build_sub_heading(line: &str) -> Block {
    let stripped = line.strip_prefix("### ").unwrap_or(line);
    let stripped = ordinal_rest(stripped).unwrap_or(stripped);
    Block::Heading {
        level: 3,
        text: stripped.replace("**", "").trim().to_string(),
    }
}

fn is_bullet(line: &str) -> bool {
    line.starts_with("- ") || line.starts_with("• ")
}

fn build_bullet(line: &str) -> Block {
    let text = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("• "))
        .unwrap_or(line)
        .trim()
        .to_string();
    let text = match bullet_icon(&text) {
        Some(icon) => format!("{icon} {text}"),
        None => text,
    };
    Block::BulletItem { text }
}

fn is_callout(line: &str) -> bool {
    let lower = line.to_lowercase();
    CALLOUT_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn build_callout(line: &str) -> Block {
    Block::Callout {
        text: line.replace("**", "").trim().to_string(),
        icon: ATTENTION_ICON.to_string(),
    }
}

fn is_paragraph(line: &str) -> bool {
    line.chars().count() > 15
        && !line.starts_with('*')
        && !line.starts_with('#')
        && !line.starts_with('-')
}

fn build_paragraph(line: &str) -> Block {
    Block::Paragraph {
        text: line.to_string(),
    }
}

fn first_family_match(
    families: &[(&[&str], &'static str)],
    text: &str,
) -> Option<&'static str> {
    let lower = text.to_lowercase();
    families
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(_, icon)| *icon)
}

fn heading_icon(text: &str) -> Option<&'static str> {
    first_family_match(HEADING_ICON_FAMILIES, text)
}

fn bullet_icon(text: &str) -> Option<&'static str> {
    first_family_match(BULLET_ICON_FAMILIES, text)
}
