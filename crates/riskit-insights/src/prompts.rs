//! Prompt templates, system instructions and response schemas for each use-case.

use riskit_core::{GenerationRequest, OutputSchema, UseCase};

use crate::model::{AnalyzeRequest, ArchitectRequest, CompareRequest};

/// Holdings requested from the architect
pub const PORTFOLIO_NODES: usize = 10;

/// Points in each holding's trend series
pub const TREND_POINTS: usize = 7;

/// Fundamental metrics requested from the audit
pub const ANALYSIS_METRICS: usize = 6;

/// Catalysts requested from the audit
pub const ANALYSIS_CATALYSTS: usize = 3;

/// Sentiment entries expected from the audit (bullish, bearish)
pub const SENTIMENT_ENTRIES: usize = 2;

/// Events requested from the pulse
pub const PULSE_ITEMS: usize = 5;

const ARCHITECT_INSTRUCTION: &str = "You are a Quantitative Architect.
MARKET RESOLUTION: If the user provides a country name like \"Pakistan\", \"USA\", or \"UK\", resolve it to its primary stock exchange (e.g., Pakistan Stock Exchange, NYSE/NASDAQ, London Stock Exchange).
PORTFOLIO: Return exactly 10 nodes.
DATA FIDELITY: The \"trend\" array MUST contain 7 integers with high variance (e.g., [42, 58, 31, 89, 64, 95, 72]). Do not return flat or repetitive values.
If Halal is true, strictly exclude non-halal entities. Return JSON.";

const COMPARE_INSTRUCTION: &str = "Risk Arb Specialist: Compare two nodes across distinct financial dimensions. \
Provide unique values for s1Value/s2Value. \
Ensure the s1Percent/s2Percent values represent relative dominance clearly. Output JSON.";

const ANALYZE_INSTRUCTION: &str = "Analyze the ticker health.
If input is a country name (e.g. \"Pakistan\"), analyze its main stock index (PSX).
HEALTH: Decimal between 0 and 1.
METRICS: Include 6 data-driven metrics: Market Cap, P/E Ratio, Dividend Yield, Price/Book, Debt-to-Equity, and Beta. Status is positive, negative or neutral.
SENTIMENT: Two entries labeled Bullish and Bearish, scored 0 to 100.
CATALYSTS: Include 3 specific catalysts with high/medium/low impact.
Output JSON.";

const PULSE_INSTRUCTION: &str = "Fetch 5 real-time market news events. Output JSON.";

const PULSE_PROMPT: &str = "Latest high-impact financial events globally.";

pub fn architect(request: &ArchitectRequest) -> GenerationRequest {
    let prompt = format!(
        "Architect a portfolio for ${} in the {} ecosystem. Horizon: {}. Halal: {}.",
        request.amount, request.market, request.horizon, request.halal
    );
    GenerationRequest::new(UseCase::Architect, prompt, ARCHITECT_INSTRUCTION, portfolio_schema())
        .with_grounding(true)
}

pub fn compare(request: &CompareRequest) -> GenerationRequest {
    let prompt = format!(
        "Compare {} vs {} in context of {}. Halal filter: {}.",
        request.s1.trim(),
        request.s2.trim(),
        request.market,
        request.halal
    );
    GenerationRequest::new(UseCase::Compare, prompt, COMPARE_INSTRUCTION, comparison_schema())
        .with_grounding(true)
}

pub fn analyze(request: &AnalyzeRequest) -> GenerationRequest {
    let prompt = format!(
        "Deep Audit of {} in {}. Horizon: {}. Halal: {}.",
        request.ticker.trim(),
        request.market,
        request.horizon,
        request.halal
    );
    GenerationRequest::new(UseCase::Analyze, prompt, ANALYZE_INSTRUCTION, analysis_schema())
        .with_grounding(true)
}

pub fn pulse() -> GenerationRequest {
    GenerationRequest::new(UseCase::Pulse, PULSE_PROMPT, PULSE_INSTRUCTION, pulse_schema())
        .with_grounding(true)
}

fn portfolio_schema() -> OutputSchema {
    let node = OutputSchema::object([
        ("ticker", OutputSchema::string()),
        ("name", OutputSchema::string()),
        ("trend", OutputSchema::array(OutputSchema::integer())),
    ])
    .all_required();

    OutputSchema::object([
        ("strategy", OutputSchema::string()),
        ("nodes", OutputSchema::array(node)),
    ])
    .all_required()
}

fn comparison_schema() -> OutputSchema {
    let metric = OutputSchema::object([
        ("label", OutputSchema::string()),
        ("s1Value", OutputSchema::string()),
        ("s2Value", OutputSchema::string()),
        ("s1Percent", OutputSchema::number()),
        ("s2Percent", OutputSchema::number()),
    ])
    .all_required();

    OutputSchema::object([
        ("winner", OutputSchema::string()),
        ("decision", OutputSchema::string()),
        ("summary", OutputSchema::string()),
        ("scorecard", OutputSchema::array(metric)),
    ])
    .all_required()
}

fn analysis_schema() -> OutputSchema {
    let metric = OutputSchema::object([
        ("label", OutputSchema::string()),
        ("value", OutputSchema::string()),
        ("status", OutputSchema::one_of(["positive", "negative", "neutral"])),
    ]);
    let sentiment = OutputSchema::object([
        ("label", OutputSchema::string()),
        ("score", OutputSchema::number()),
    ]);
    let catalyst = OutputSchema::object([
        ("title", OutputSchema::string()),
        ("impact", OutputSchema::one_of(["high", "medium", "low"])),
    ]);

    OutputSchema::object([
        ("ticker", OutputSchema::string()),
        ("name", OutputSchema::string()),
        ("health", OutputSchema::number().describe("Decimal between 0 and 1")),
        ("desc", OutputSchema::string()),
        ("short", OutputSchema::string()),
        ("long", OutputSchema::string()),
        ("metrics", OutputSchema::array(metric)),
        ("sentiment", OutputSchema::array(sentiment)),
        ("catalysts", OutputSchema::array(catalyst)),
    ])
    .all_required()
}

fn pulse_schema() -> OutputSchema {
    OutputSchema::array(OutputSchema::object([
        ("title", OutputSchema::string()),
        ("time", OutputSchema::string()),
        ("impact", OutputSchema::string()),
        ("sector", OutputSchema::string()),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskit_core::SchemaType;
    use rust_decimal_macros::dec;

    #[test]
    fn test_architect_prompt() {
        let request = ArchitectRequest {
            amount: dec!(50000),
            market: "Pakistan".into(),
            horizon: "Long Term".into(),
            halal: true,
        };
        let generation = architect(&request);
        assert_eq!(generation.use_case, UseCase::Architect);
        assert_eq!(
            generation.prompt,
            "Architect a portfolio for $50000 in the Pakistan ecosystem. Horizon: Long Term. Halal: true."
        );
        assert!(generation.system_instruction.contains("exactly 10 nodes"));
        assert!(generation.use_grounding);
        assert_eq!(generation.schema.required, vec!["strategy", "nodes"]);
    }

    #[test]
    fn test_comparison_schema_uses_wire_names() {
        let generation = compare(&CompareRequest::new(" BTC ", "ETH"));
        assert!(generation.prompt.starts_with("Compare BTC vs ETH"));
        let scorecard = generation.schema.property("scorecard").unwrap();
        let metric = scorecard.items.as_deref().unwrap();
        assert!(metric.property("s1Percent").is_some());
        assert_eq!(metric.required.len(), 5);
    }

    #[test]
    fn test_analysis_schema_enums() {
        let generation = analyze(&AnalyzeRequest::new("NVDA"));
        let catalysts = generation.schema.property("catalysts").unwrap();
        let impact = catalysts.items.as_deref().unwrap().property("impact").unwrap();
        assert_eq!(impact.enum_values, vec!["high", "medium", "low"]);
    }

    #[test]
    fn test_pulse_is_array_rooted() {
        let generation = pulse();
        assert!(generation.schema.is_array_rooted());
        assert_eq!(
            generation.schema.items.as_deref().unwrap().schema_type,
            SchemaType::Object
        );
    }
}
