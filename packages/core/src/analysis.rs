//! Analyzer output schema produced by processing endpoints.
//!
//! Mirrors the JSON shape the original dashboard returns from its message
//! analyzer: detection flag, engagement metrics, extracted intelligence
//! arrays, free-text agent notes, and the suggested next reply.

use serde::{Deserialize, Serialize};

/// Structured facts extracted from a scammer conversation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedIntelligence {
    pub bank_accounts: Vec<String>,
    pub upi_ids: Vec<String>,
    pub phishing_links: Vec<String>,
    pub phone_numbers: Vec<String>,
    pub suspicious_keywords: Vec<String>,
    pub scam_tactics: Vec<String>,
    pub emotional_manipulation: Vec<String>,
}

/// Engagement bookkeeping reported alongside each analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMetrics {
    pub engagement_duration_seconds: u64,
    pub total_messages_exchanged: u64,
}

/// One analyzer verdict for one submission.
///
/// This is the success-response body callers receive; the gateway forwards
/// it untouched, so endpoints own every field including `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// `"success"` for a completed analysis; endpoints may report their own
    /// internal failures with `"error"` and the relay passes them through.
    pub status: String,

    /// Whether the analyzer judged the conversation to be a scam attempt.
    pub scam_detected: bool,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub engagement_metrics: Option<EngagementMetrics>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub extracted_intelligence: Option<ExtractedIntelligence>,

    /// Free-text analyst notes.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub agent_notes: Option<String>,

    /// Suggested reply to keep the counterpart engaged.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub next_response: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn deserializes_original_response_shape() {
        let report: AnalysisReport = serde_json::from_value(json!({
            "status": "success",
            "scamDetected": true,
            "engagementMetrics": {
                "engagementDurationSeconds": 5,
                "totalMessagesExchanged": 1
            },
            "extractedIntelligence": {
                "bankAccounts": ["000111222"],
                "upiIds": [],
                "phishingLinks": ["http://fake-bank.co"],
                "phoneNumbers": [],
                "suspiciousKeywords": ["urgent"],
                "scamTactics": ["urgency"],
                "emotionalManipulation": []
            },
            "agentNotes": "classic phishing",
            "nextResponse": "Oh dear, which bank did you say?"
        }))
        .unwrap();

        assert!(report.scam_detected);
        let intel = report.extracted_intelligence.unwrap();
        assert_eq!(intel.phishing_links, vec!["http://fake-bank.co"]);
        assert_eq!(
            report.engagement_metrics.unwrap().total_messages_exchanged,
            1
        );
    }

    #[test]
    fn serializes_camel_case() {
        let report = AnalysisReport {
            status: "success".into(),
            scam_detected: false,
            engagement_metrics: None,
            extracted_intelligence: Some(ExtractedIntelligence::default()),
            agent_notes: None,
            next_response: Some("hi".into()),
        };
        let wire = serde_json::to_value(&report).unwrap();
        assert_eq!(wire["scamDetected"], false);
        assert_eq!(wire["nextResponse"], "hi");
        assert!(wire["extractedIntelligence"]["bankAccounts"].is_array());
        assert!(wire.get("agentNotes").is_none());
    }
}
