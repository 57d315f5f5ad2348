use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    Buy,
    Hold,
    Sell,
    #[serde(rename = "No action")]
    NoAction,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Buy => "Buy",
            Recommendation::Hold => "Hold",
            Recommendation::Sell => "Sell",
            Recommendation::NoAction => "No action",
        }
    }
}

/// The structured form an assistant reply may take when the user asked for a
/// trading/decision prescription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRecommendation {
    pub recommendation: Recommendation,
    pub confidence: f64,
    pub risk_score: i32,
    pub rationale: String,
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl StructuredRecommendation {
    fn validate(&self) -> Result<(), ParseFailure> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ParseFailure {
                stage: "contract",
                detail: format!("confidence must be between 0 and 1 (got {})", self.confidence),
            });
        }
        if !(0..=100).contains(&self.risk_score) {
            return Err(ParseFailure {
                stage: "contract",
                detail: format!("risk_score must be between 0 and 100 (got {})", self.risk_score),
            });
        }
        Ok(())
    }
}

/// Extraction failed; the reply stays plain text. This is an expected branch,
/// not an exception path.
#[derive(Debug, Clone)]
pub struct ParseFailure {
    pub stage: &'static str,
    pub detail: String,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "structured reply rejected at {}: {}", self.stage, self.detail)
    }
}

impl std::error::Error for ParseFailure {}

// Pull the first fenced code block (``` or ```json, any case) out of a reply.
fn extract_fenced(text: &str) -> Option<String> {
    let start = text.find("```")?;
    let mut inner = &text[start + 3..];
    if inner
        .get(..4)
        .is_some_and(|tag| tag.eq_ignore_ascii_case("json"))
    {
        inner = &inner[4..];
    }
    let end = inner.find("```")?;
    Some(inner[..end].trim().to_string())
}

/// Best-effort parse of an assistant reply into a recommendation. Accepts a
/// fenced block anywhere in the text, or the whole reply as bare JSON.
pub fn parse_structured_reply(raw: &str) -> Result<StructuredRecommendation, ParseFailure> {
    let json_text = extract_fenced(raw).unwrap_or_else(|| raw.trim().to_string());
    let parsed = serde_json::from_str::<StructuredRecommendation>(&json_text).map_err(|e| {
        ParseFailure {
            stage: "json",
            detail: e.to_string(),
        }
    })?;
    parsed.validate()?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_reply_json() -> String {
        json!({
            "recommendation": "Buy",
            "confidence": 0.8,
            "risk_score": 20,
            "rationale": "x",
            "steps": ["a"],
        })
        .to_string()
    }

    #[test]
    fn parses_fenced_json_block() {
        let raw = format!("```json\n{}\n```", valid_reply_json());
        let parsed = parse_structured_reply(&raw).unwrap();
        assert_eq!(parsed.recommendation, Recommendation::Buy);
        assert_eq!(parsed.confidence, 0.8);
        assert_eq!(parsed.risk_score, 20);
        assert_eq!(parsed.rationale, "x");
        assert_eq!(parsed.steps, vec!["a".to_string()]);
        assert_eq!(parsed.note, None);
    }

    #[test]
    fn parses_fence_with_uppercase_tag_and_surrounding_prose() {
        let raw = format!(
            "Here you go:\n```JSON\n{}\n```\nLet me know.",
            valid_reply_json()
        );
        let parsed = parse_structured_reply(&raw).unwrap();
        assert_eq!(parsed.recommendation, Recommendation::Buy);
    }

    #[test]
    fn parses_whole_reply_as_bare_json() {
        let parsed = parse_structured_reply(&valid_reply_json()).unwrap();
        assert_eq!(parsed.recommendation, Recommendation::Buy);
    }

    #[test]
    fn plain_prose_is_a_parse_failure() {
        let err = parse_structured_reply("Momentum looks weak this week.").unwrap_err();
        assert_eq!(err.stage, "json");
    }

    #[test]
    fn no_action_variant_round_trips() {
        let raw = json!({
            "recommendation": "No action",
            "confidence": 0.1,
            "risk_score": 5,
            "rationale": "insufficient data",
            "steps": [],
            "note": "ask again after earnings",
        })
        .to_string();
        let parsed = parse_structured_reply(&raw).unwrap();
        assert_eq!(parsed.recommendation, Recommendation::NoAction);
        assert_eq!(parsed.note.as_deref(), Some("ask again after earnings"));
    }

    #[test]
    fn rejects_confidence_out_of_range() {
        let raw = json!({
            "recommendation": "Sell",
            "confidence": 1.5,
            "risk_score": 50,
            "rationale": "x",
            "steps": [],
        })
        .to_string();
        let err = parse_structured_reply(&raw).unwrap_err();
        assert_eq!(err.stage, "contract");
    }

    #[test]
    fn rejects_risk_score_out_of_range() {
        let raw = json!({
            "recommendation": "Hold",
            "confidence": 0.5,
            "risk_score": 150,
            "rationale": "x",
            "steps": [],
        })
        .to_string();
        let err = parse_structured_reply(&raw).unwrap_err();
        assert_eq!(err.stage, "contract");
    }
}
