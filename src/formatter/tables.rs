//! Per-category preamble tables. Most categories carry a static,
//! category-level placeholder matrix; the risk matrix is extracted from the
//! report text when it carries labelled risk entries, falling back to a fixed
//! default set when it does not.

use crate::analysis::AnalysisType;

use super::Block;

const MAX_EXTRACTED_RISKS: usize = 8;

/// Bold headings containing one of these start a new risk entry even without
/// an explicit `Risk:` label.
const RISK_HEADING_KEYWORDS: &[&str] = &[
    "risk",
    "compliance",
    "regulatory",
    "supply",
    "security",
    "operational",
    "financial",
    "market",
];

pub fn preamble_table(analysis_type: AnalysisType, raw_text: &str) -> Block {
    match analysis_type {
        AnalysisType::Risk => risk_matrix(raw_text),
        AnalysisType::Technical => phase_timeline(),
        AnalysisType::Financial => projection_table(),
        AnalysisType::Market | AnalysisType::Competitive | AnalysisType::Solution => {
            comparison_matrix()
        }
    }
}

fn comparison_matrix() -> Block {
    Block::Table {
        rows: vec![
            row(&["Category", "Current State", "Opportunity", "Priority"]),
            row(&["Market Position", "Emerging", "Expansion", "High"]),
            row(&["Customer Base", "Established", "Cross-sell", "Medium"]),
            row(&["Differentiation", "Moderate", "Brand-led", "High"]),
            row(&["Channel Reach", "Direct", "New channels", "Medium"]),
        ],
    }
}

fn phase_timeline() -> Block {
    Block::Table {
        rows: vec![
            row(&["Phase", "Duration", "Focus"]),
            row(&["Discovery", "2-4 weeks", "Requirements and architecture"]),
            row(&["MVP Build", "6-10 weeks", "Core features"]),
            row(&["Hardening", "2-4 weeks", "Testing and integration"]),
            row(&["Launch", "1-2 weeks", "Deployment and monitoring"]),
        ],
    }
}

fn projection_table() -> Block {
    Block::Table {
        rows: vec![
            row(&["Metric", "Year 1", "Year 2", "Year 3"]),
            row(&["Revenue", "Ramp-up", "Growth", "Scale"]),
            row(&["Costs", "Build-heavy", "Stabilizing", "Optimized"]),
            row(&["Net Margin", "Negative", "Break-even", "Positive"]),
        ],
    }
}

/// The risk probability/impact/priority matrix. Rows are extracted from
/// `Risk:` / `Probability:` / `Impact:` / `Priority:` labelled lines and bold
/// risk-domain headings in the report text; the static default set is the
/// fallback when extraction yields nothing.
fn risk_matrix(raw_text: &str) -> Block {
    let extracted = extract_risks(raw_text);
    let rows = if extracted.is_empty() {
        default_risks()
    } else {
        extracted
    };

    let mut table = vec![row(&["Risk", "Probability", "Impact", "Priority"])];
    table.extend(rows.into_iter().map(RiskEntry::into_row));
    Block::Table { rows: table }
}

fn default_risks() -> Vec<RiskEntry> {
    vec![
        RiskEntry::named("Regulatory & Compliance", "Medium", "High", "High"),
        RiskEntry::named("Supply Chain & Operations", "Medium", "Medium", "Medium"),
        RiskEntry::named("Market & Customer", "Medium", "High", "High"),
        RiskEntry::named("Technology & Security", "Low", "High", "Medium"),
        RiskEntry::named("Financial & Business Model", "Medium", "Medium", "Medium"),
    ]
}

#[derive(Debug, Clone)]
struct RiskEntry {
    name: String,
    probability: Option<String>,
    impact: Option<String>,
    priority: Option<String>,
}

impl RiskEntry {
    fn new(name: String) -> Self {
        Self {
            name,
            probability: None,
            impact: None,
            priority: None,
        }
    }

    fn named(name: &str, probability: &str, impact: &str, priority: &str) -> Self {
        Self {
            name: name.to_string(),
            probability: Some(probability.to_string()),
            impact: Some(impact.to_string()),
            priority: Some(priority.to_string()),
        }
    }

    fn into_row(self) -> Vec<String> {
        let fill = |v: Option<String>| v.unwrap_or_else(|| "Medium".to_string());
        vec![
            self.name,
            fill(self.probability),
            fill(self.impact),
            fill(self.priority),
        ]
    }
}

fn extract_risks(raw_text: &str) -> Vec<RiskEntry> {
    let mut entries: Vec<RiskEntry> = Vec::new();

    for raw_line in raw_text.lines() {
        let line = strip_markers(raw_line);
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = label_value(&line, "risk") {
            if !rest.is_empty() && entries.len() < MAX_EXTRACTED_RISKS {
                entries.push(RiskEntry::new(rest));
            }
            continue;
        }

        if is_risk_heading(raw_line) && entries.len() < MAX_EXTRACTED_RISKS {
            entries.push(RiskEntry::new(line));
            continue;
        }

        let Some(current) = entries.last_mut() else {
            continue;
        };
        if let Some(value) = label_value(&line, "probability") {
            current.probability.get_or_insert(normalize_level(&value));
        } else if let Some(value) = label_value(&line, "impact") {
            current.impact.get_or_insert(normalize_level(&value));
        } else if let Some(value) = label_value(&line, "priority") {
            current.priority.get_or_insert(normalize_level(&value));
        }
    }

    entries
}

/// Drops list markers and bold markers so labels can be matched uniformly.
fn strip_markers(line: &str) -> String {
    line.trim()
        .trim_start_matches("- ")
        .trim_start_matches("• ")
        .replace("**", "")
        .trim()
        .to_string()
}

/// The value of a `Label: value` line, case-insensitive on the label.
fn label_value(line: &str, label: &str) -> Option<String> {
    let (head, tail) = line.split_once(':')?;
    if head.trim().eq_ignore_ascii_case(label) {
        Some(tail.trim().to_string())
    } else {
        None
    }
}

fn is_risk_heading(raw_line: &str) -> bool {
    let trimmed = raw_line.trim();
    let bold = trimmed.len() > 4 && trimmed.starts_with("**") && trimmed.ends_with("**");
    if !bold {
        return false;
    }
    let lower = trimmed.to_lowercase();
    RISK_HEADING_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

fn normalize_level(value: &str) -> String {
    let lower = value.to_lowercase();
    if lower.starts_with("high") {
        "High".to_string()
    } else if lower.starts_with("med") {
        "Medium".to_string()
    } else if lower.starts_with("low") {
        "Low".to_string()
    } else {
        value.chars().take(30).collect()
    }
}

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_rows(block: Block) -> Vec<Vec<String>> {
        match block {
            Block::Table { rows } => rows,
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn test_static_preambles_have_header_rows() {
        for ty in [
            AnalysisType::Market,
            AnalysisType::Competitive,
            AnalysisType::Technical,
            AnalysisType::Financial,
            AnalysisType::Solution,
        ] {
            let rows = table_rows(preamble_table(ty, "ignored body text"));
            assert!(rows.len() >= 3, "{ty:?} table too small");
            let width = rows[0].len();
            assert!(rows.iter().all(|r| r.len() == width), "{ty:?} ragged rows");
        }
    }

    #[test]
    fn test_risk_matrix_extracts_labelled_entries() {
        let text = "\
Risk: Supplier concentration
Probability: High
Impact: Medium
Priority: High

Risk: Payment fraud
- Probability: low likelihood given current controls
Impact: High
";
        let rows = table_rows(preamble_table(AnalysisType::Risk, text));
        assert_eq!(rows[0], vec!["Risk", "Probability", "Impact", "Priority"]);
        assert_eq!(
            rows[1],
            vec!["Supplier concentration", "High", "Medium", "High"]
        );
        // missing priority defaults to Medium; lowercase level normalized
        assert_eq!(rows[2], vec!["Payment fraud", "Low", "High", "Medium"]);
    }

    #[test]
    fn test_risk_matrix_accepts_bold_domain_headings() {
        let text = "\
**Regulatory & Compliance Risks**
Probability: Medium
Impact: High
";
        let rows = table_rows(preamble_table(AnalysisType::Risk, text));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "Regulatory & Compliance Risks");
        assert_eq!(rows[1][1], "Medium");
        assert_eq!(rows[1][2], "High");
    }

    #[test]
    fn test_risk_matrix_falls_back_to_default_five() {
        let rows = table_rows(preamble_table(
            AnalysisType::Risk,
            "No structured risks in this text at all.",
        ));
        // header plus the five defaults
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[1][0], "Regulatory & Compliance");
        assert_eq!(rows[5][0], "Financial & Business Model");
    }

    #[test]
    fn test_risk_matrix_empty_text_uses_defaults() {
        let rows = table_rows(preamble_table(AnalysisType::Risk, ""));
        assert_eq!(rows.len(), 6);
    }

    #[test]
    fn test_extraction_caps_entries() {
        let mut text = String::new();
        for i in 0..20 {
            text.push_str(&format!("Risk: generated risk {i}\nProbability: High\n"));
        }
        let rows = table_rows(preamble_table(AnalysisType::Risk, &text));
        assert_eq!(rows.len(), MAX_EXTRACTED_RISKS + 1);
    }

    #[test]
    fn test_normalize_level_variants() {
        assert_eq!(normalize_level("High - significant exposure"), "High");
        assert_eq!(normalize_level("medium"), "Medium");
        assert_eq!(normalize_level("LOW likelihood"), "Low");
        assert_eq!(normalize_level("Unclear"), "Unclear");
    }

    #[test]
    fn test_orphan_labels_before_any_risk_ignored() {
        let text = "Probability: High\nImpact: High\n";
        let rows = table_rows(preamble_table(AnalysisType::Risk, text));
        // nothing extracted, defaults apply
        assert_eq!(rows.len(), 6);
    }
}
