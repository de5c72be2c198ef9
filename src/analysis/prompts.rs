use super::AnalysisType;

pub const SYSTEM_PROMPT: &str =
    "You are a business analyst providing professional project analysis for an \
     internal project-intake review. Be specific and actionable; use markdown \
     headings, numbered sections, and bullet points.";

/// Fills the fixed instructional template for one analysis category.
/// Inputs are interpolated verbatim; empty strings pass through unchanged.
pub fn build_prompt(
    analysis_type: AnalysisType,
    project_name: &str,
    description: &str,
    company_context: &str,
) -> String {
    let body = match analysis_type {
        AnalysisType::Market => MARKET_TEMPLATE,
        AnalysisType::Competitive => COMPETITIVE_TEMPLATE,
        AnalysisType::Risk => RISK_TEMPLATE,
        AnalysisType::Technical => TECHNICAL_TEMPLATE,
        AnalysisType::Financial => FINANCIAL_TEMPLATE,
        AnalysisType::Solution => SOLUTION_TEMPLATE,
    };

    format!(
        "You are analyzing a proposed project for {company_context}.\n\n\
         Project to Analyze:\n\
         Project Name: {project_name}\n\
         Description: {description}\n\n\
         {body}"
    )
}

const MARKET_TEMPLATE: &str = "\
Provide comprehensive market analysis covering:

1. **Market Opportunity**
   - Market size in the category this project addresses
   - Growth trends over the next three years
   - Customer spending patterns relevant to this offering
   - Seasonal trends and purchasing behaviors

2. **Target Customer Analysis**
   - Primary demographics and psychographics
   - Pain points this project could address
   - Purchase drivers and price sensitivity

3. **Market Trends**
   - Channel trends (direct, retail, subscription)
   - Relevant regulatory considerations
   - The role of social proof and reviews in this category

4. **Market Positioning Opportunity**
   - How this project could differentiate from established players
   - Positioning and messaging opportunities

5. **Revenue Opportunity Assessment**
   - Estimated market share capture potential
   - Customer lifetime value considerations
   - Cross-selling opportunities with the existing portfolio

6. **Market Entry Timing**
   - Current saturation in this category
   - Optimal launch timing and scale-up considerations

Provide specific, actionable insights with estimated numbers where possible.";

const COMPETITIVE_TEMPLATE: &str = "\
Analyze the competitive landscape for this project:

1. **Direct Competitor Analysis**
   - Identify the three most relevant competitors
   - For each: market position, pricing strategy, distribution, strengths
   - How could this project compete or differentiate against each?

2. **Our Competitive Advantages**
   - Existing strengths this project can leverage
   - New competitive advantages it could create

3. **Competitive Gaps & Opportunities**
   - Underserved segments and unmet customer needs
   - Pricing gaps where this project could position

4. **Marketing & Distribution Analysis**
   - Competitor marketing strategies worth noting
   - Recommended go-to-market approach for this project

5. **Competitive Response Prediction**
   - How might competitors respond, and on what timeline?
   - Defensive strategies to prepare

6. **Market Share Capture Strategy**
   - Realistic share goals for the first 12-24 months
   - Customer acquisition from competitor brands

Focus on actionable competitive intelligence with specific positioning
recommendations.";

const RISK_TEMPLATE: &str = "\
Identify and analyze risks across these categories:

1. **Regulatory & Compliance Risks**
   - Applicable regulations and approval requirements
   - Labeling, claims, or certification obligations

2. **Supply Chain & Operational Risks**
   - Sourcing reliability, supplier dependency, capacity constraints
   - Quality control failures and recall exposure

3. **Market & Customer Risks**
   - Demand uncertainty and trend shifts
   - Reputation exposure and competitive pressure

4. **Technology & Security Risks**
   - Delivery risk given current team capacity
   - Integration, availability, and data-protection concerns

5. **Financial & Business Model Risks**
   - Acquisition costs, churn, carrying costs
   - Investment recovery timeline

For each risk, provide lines in this form so they can be tabulated:
Risk: <short name>
Probability: High/Medium/Low
Impact: High/Medium/Low
Priority: High/Medium/Low
followed by mitigation strategies, contingency plans, and early warning
indicators. Prioritize risks by their relevance to this project.";

const TECHNICAL_TEMPLATE: &str = "\
Analyze the following technical aspects:

1. **Technology Stack Assessment**
   - Recommended technologies and frameworks
   - Infrastructure requirements and third-party integrations

2. **Development Complexity**
   - Complexity rating (Low/Medium/High)
   - Key technical challenges and critical decisions

3. **Resource Requirements**
   - Team size, skills, and roles required
   - Development timeline estimation

4. **Scalability Considerations**
   - Performance requirements and scaling challenges
   - Architecture recommendations

5. **Technical Risks**
   - Technology-related risks, dependencies, and limitations
   - Mitigation strategies

6. **Implementation Approach**
   - Recommended development phases
   - MVP versus full feature set
   - Testing and deployment strategy

Provide practical, actionable technical guidance.";

const FINANCIAL_TEMPLATE: &str = "\
Provide financial assessment covering:

1. **Cost Analysis**
   - Development costs (one-time) and operational costs (ongoing)
   - Infrastructure, personnel, and marketing costs

2. **Revenue Projections**
   - Potential revenue streams and model recommendations
   - Market-size-based revenue estimates and pricing strategy

3. **Financial Metrics**
   - Break-even timeline, ROI projections, payback period

4. **Funding Requirements**
   - Initial investment, working capital, funding milestones

5. **Financial Risks & Sensitivity**
   - Key assumptions, best/worst-case scenarios, mitigation

6. **Business Model Validation**
   - Unit economics and scalability of the financial model
   - Monetization timeline

Provide realistic estimates and ranges where appropriate.";

const SOLUTION_TEMPLATE: &str = "\
Act as a solution strategist researching how similar problems have been
solved across industries.

## Problem Identification & Analysis
- What is the core problem this project is trying to solve, and for whom?
- Underlying causes versus symptoms; why has it not been solved yet?
- Customer, revenue, and technical impact of leaving it unsolved

## Cross-Industry Solution Research
Identify companies across different industries (SaaS, e-commerce,
subscription, enterprise, consumer D2C) that have successfully addressed
similar challenges, and what made their approaches work.

## Solution Recommendations
Recommend 3-5 specific solutions. For each:
- The company and industry context it is drawn from
- Their approach, implementation strategy, and measured results
- How to adapt it here: feasibility, timeline, and resource estimates

## Proposed Solution Evaluation
If the project description contains a proposed solution, evaluate it:
strengths, gaps, failure points, enhancement suggestions.

## Integrated Solution Strategy
- Hybrid approach combining the strongest elements
- Phased implementation roadmap with milestones and success metrics

## Final Recommendations
- The #1 recommended approach and why, with backup options
- Industry benchmarks to track

Focus on ACTIONABLE, SPECIFIC solutions proven in real companies.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_interpolates_inputs() {
        let prompt = build_prompt(
            AnalysisType::Market,
            "Loyalty App",
            "A mobile loyalty program",
            "Acme Corp, a retail chain",
        );
        assert!(prompt.contains("Project Name: Loyalty App"));
        assert!(prompt.contains("Description: A mobile loyalty program"));
        assert!(prompt.contains("Acme Corp"));
        assert!(prompt.contains("Market Opportunity"));
    }

    #[test]
    fn test_build_prompt_allows_empty_inputs() {
        let prompt = build_prompt(AnalysisType::Risk, "", "", "");
        assert!(prompt.contains("Project Name: \n"));
        assert!(prompt.contains("Description: \n"));
    }

    #[test]
    fn test_each_type_has_distinct_template() {
        let prompts: Vec<String> = AnalysisType::ALL
            .iter()
            .map(|ty| build_prompt(*ty, "P", "D", "C"))
            .collect();
        for (i, a) in prompts.iter().enumerate() {
            for b in prompts.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_risk_template_requests_tabulatable_labels() {
        let prompt = build_prompt(AnalysisType::Risk, "P", "D", "C");
        assert!(prompt.contains("Risk: <short name>"));
        assert!(prompt.contains("Probability: High/Medium/Low"));
    }
}
