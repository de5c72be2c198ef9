use crate::analysis::Report;
use crate::error::AppError;
use crate::llm::{GenerateRequest, LlmClient};

/// Priority assigned when the score response cannot be parsed.
pub const DEFAULT_PRIORITY_SCORE: i64 = 5;
/// Per-report excerpt budget fed into the summary context.
const EXCERPT_CHARS: usize = 500;

/// Builds the executive recommendation and a 1-10 priority score from the
/// successful analysis reports, via one summary call and one scoring call.
#[tracing::instrument(
    name = "pipeline_stage summary",
    skip(llm, description, reports),
    fields(
        pipeline.stage = "summary",
        summary.reports = reports.len(),
        summary.priority_score = tracing::field::Empty,
    )
)]
pub async fn executive_summary(
    llm: &LlmClient,
    model: &str,
    project_name: &str,
    description: &str,
    reports: &[Report],
) -> Result<(String, i64), AppError> {
    let context = build_context(project_name, description, reports);

    let recommendation = llm
        .generate(&GenerateRequest {
            model: model.to_string(),
            system: context.clone(),
            prompt: RECOMMENDATION_PROMPT.to_string(),
            temperature: 0.3,
            max_tokens: 800,
            stage: "summary".to_string(),
        })
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?
        .content;

    let score_resp = llm
        .generate(&GenerateRequest {
            model: model.to_string(),
            system: context,
            prompt: SCORE_PROMPT.to_string(),
            temperature: 0.0,
            max_tokens: 10,
            stage: "summary".to_string(),
        })
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;

    let priority_score = parse_priority_score(&score_resp.content);
    tracing::Span::current().record("summary.priority_score", priority_score);

    Ok((recommendation, priority_score))
}

/// The generic fallback recommendation used when the summary step fails.
pub fn fallback_recommendation(project_name: &str, report_count: usize) -> String {
    format!(
        "Analysis complete for {project_name}. {report_count} comprehensive reports created \
         as child pages. Review detailed analysis for strategic insights."
    )
}

const RECOMMENDATION_PROMPT: &str = "\
Create a concise executive recommendation for leadership:

## 🎯 EXECUTIVE SUMMARY
[2-3 sentences on overall project viability and strategic fit]

## 💼 STRATEGIC IMPACT
- Revenue potential
- Competitive positioning
- Brand alignment

## 🚀 RECOMMENDATION
**[GO/NO-GO/CONDITIONAL]** - [Clear rationale in 1-2 sentences]

## 📊 NEXT STEPS
- Priority 1: [Most important action]
- Priority 2: [Second priority]

Keep it executive-level, strategic, and actionable.";

const SCORE_PROMPT: &str = "\
Based on the analysis context, rate this project's priority for the intake \
backlog on a scale of 1 (lowest) to 10 (highest). Respond with a single \
integer and nothing else.";

fn build_context(project_name: &str, description: &str, reports: &[Report]) -> String {
    let mut context = format!(
        "PROJECT ANALYSIS SUMMARY\nProject: {project_name}\nDescription: {description}\n\n\
         Completed analyses with excerpts:\n"
    );
    for report in reports {
        let excerpt: String = report.raw_text.chars().take(EXCERPT_CHARS).collect();
        context.push_str(&format!(
            "\n--- {} ---\n{}\n",
            report.analysis_type.display_name(),
            excerpt
        ));
    }
    context
}

/// Parses the scoring response as an integer in [1, 10]. Out-of-range values
/// clamp; unparsable responses fall back to the default.
pub fn parse_priority_score(content: &str) -> i64 {
    let digits: String = content
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    match digits.parse::<i64>() {
        Ok(score) => score.clamp(1, 10),
        Err(_) => DEFAULT_PRIORITY_SCORE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisType;
    use chrono::Utc;

    #[test]
    fn test_parse_priority_score_plain_integer() {
        assert_eq!(parse_priority_score("7"), 7);
    }

    #[test]
    fn test_parse_priority_score_clamps_high() {
        assert_eq!(parse_priority_score("15"), 10);
    }

    #[test]
    fn test_parse_priority_score_clamps_low() {
        assert_eq!(parse_priority_score("0"), 1);
    }

    #[test]
    fn test_parse_priority_score_fallback() {
        assert_eq!(parse_priority_score("banana"), DEFAULT_PRIORITY_SCORE);
        assert_eq!(parse_priority_score(""), DEFAULT_PRIORITY_SCORE);
    }

    #[test]
    fn test_parse_priority_score_embedded_integer() {
        assert_eq!(parse_priority_score("Priority: 8 out of 10"), 8);
        assert_eq!(parse_priority_score("8/10"), 8);
    }

    #[test]
    fn test_build_context_truncates_excerpts() {
        let report = Report {
            project_name: "P".to_string(),
            analysis_type: AnalysisType::Market,
            raw_text: "y".repeat(EXCERPT_CHARS * 3),
            generated_at: Utc::now(),
        };
        let context = build_context("P", "D", std::slice::from_ref(&report));
        assert!(context.contains("Market Analysis"));
        // excerpt budget, not the full report
        assert!(context.len() < EXCERPT_CHARS * 2 + 200);
    }

    #[test]
    fn test_fallback_recommendation_mentions_counts() {
        let text = fallback_recommendation("Loyalty App", 4);
        assert!(text.contains("Loyalty App"));
        assert!(text.contains('4'));
    }
}
