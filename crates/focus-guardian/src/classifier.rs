//! Classifier contract
//!
//! The classifier looks at a screen sample, names the active application or
//! website, and judges it against the user's goal. Its replies come from a
//! language model, so decoding here is deliberately forgiving: odd field
//! types and missing fields fall back to the documented defaults instead of
//! failing the tick.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GuardianError;

/// Default reason when the model gives none
pub const DEFAULT_REASON: &str = "Potential distraction detected";

/// Alert intensity assigned by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    /// Parse a severity label; anything unrecognised is `Medium`
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "low" | "mild" | "minor" => Severity::Low,
            "high" | "severe" | "critical" | "urgent" => Severity::High,
            _ => Severity::Medium,
        }
    }
}

/// Verdict for one observed activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub allowed: bool,
    pub reason: String,
    pub suggestion: Option<String>,
    pub severity: Severity,
}

impl Classification {
    /// An "allowed" verdict with the given reason
    pub fn allowed(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
            suggestion: None,
            severity: Severity::Low,
        }
    }

    /// Decode a model reply. The reply must contain a JSON object; it may be
    /// wrapped in prose or a code fence.
    pub fn from_reply(reply: &str) -> Result<Self, GuardianError> {
        let value = parse_json_object(reply)?;
        Ok(Self::from_value(&value))
    }

    /// Decode a JSON object, filling gaps with defaults
    pub fn from_value(value: &Value) -> Self {
        let allowed = match value.get("allowed") {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map(|n| n != 0.0).unwrap_or(true),
            Some(Value::String(s)) => !matches!(
                s.trim().to_lowercase().as_str(),
                "false" | "no" | "0" | "distraction" | "disallowed"
            ),
            _ => true,
        };

        let reason = text_field(value, "reason").unwrap_or_else(|| DEFAULT_REASON.to_string());
        let suggestion = text_field(value, "suggestion");
        let severity = value
            .get("severity")
            .and_then(Value::as_str)
            .map(Severity::parse_lenient)
            .unwrap_or_default();

        Self {
            allowed,
            reason,
            suggestion,
            severity,
        }
    }
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Extract and parse the first JSON object embedded in `text`
pub fn parse_json_object(text: &str) -> Result<Value, GuardianError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let slice = match (start, end) {
        (Some(s), Some(e)) if s < e => &text[s..=e],
        _ => {
            return Err(GuardianError::Classifier(format!(
                "reply contains no JSON object: {}",
                truncate_for_log(text)
            )))
        }
    };

    let value: Value = serde_json::from_str(slice)
        .map_err(|e| GuardianError::Classifier(format!("malformed JSON reply: {}", e)))?;

    if !value.is_object() {
        return Err(GuardianError::Classifier("reply is not a JSON object".into()));
    }
    Ok(value)
}

fn truncate_for_log(text: &str) -> String {
    const LIMIT: usize = 120;
    if text.chars().count() > LIMIT {
        format!("{}...", text.chars().take(LIMIT).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Broad category of an observed activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Work,
    Education,
    Entertainment,
    #[default]
    Other,
}

impl ActivityKind {
    fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "work" => Self::Work,
            "education" => Self::Education,
            "entertainment" => Self::Entertainment,
            _ => Self::Other,
        }
    }
}

/// One application/website the vision step detected on screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedActivity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    /// Visible text or title
    pub content: String,
    /// 1-100
    pub confidence: f64,
}

impl ObservedActivity {
    /// Decode one entry of the vision reply's `activities` array
    pub fn from_value(value: &Value) -> Option<Self> {
        let name = text_field(value, "name")?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .map(ActivityKind::parse_lenient)
            .unwrap_or_default();
        let content = text_field(value, "content").unwrap_or_default();
        let confidence = match value.get("confidence") {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().trim_end_matches('%').parse().unwrap_or(0.0),
            _ => 0.0,
        };

        Some(Self {
            name,
            kind,
            content,
            confidence,
        })
    }

    /// Decode a full vision reply `{ "activities": [...] }`
    pub fn list_from_reply(reply: &str) -> Result<Vec<Self>, GuardianError> {
        let value = parse_json_object(reply)?;
        Ok(value
            .get("activities")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Self::from_value).collect())
            .unwrap_or_default())
    }

    /// Pick the most confident detection strictly above `threshold`
    pub fn select(activities: Vec<Self>, threshold: f64) -> Option<Self> {
        activities
            .into_iter()
            .filter(|a| a.confidence > threshold)
            .fold(None, |best: Option<Self>, a| match best {
                Some(b) if b.confidence >= a.confidence => Some(b),
                _ => Some(a),
            })
    }
}

/// What the classifier concluded for one poll
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    /// The activity judged, if anything was detected
    pub activity: Option<ObservedActivity>,
    pub classification: Classification,
}

/// A captured screen image
#[derive(Debug, Clone)]
pub struct ScreenSample {
    pub png: Vec<u8>,
}

impl ScreenSample {
    pub fn new(png: Vec<u8>) -> Self {
        Self { png }
    }

    /// `data:` URL suitable for vision chat APIs
    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", BASE64_STANDARD.encode(&self.png))
    }
}

/// Result of one poll tick as seen by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    OnTrack {
        activity: Option<String>,
    },
    Distraction {
        activity: Option<String>,
        result: Classification,
    },
    ClassifierFailed {
        error: String,
    },
}

impl PollOutcome {
    pub fn from_assessment(assessment: Assessment) -> Self {
        let activity = assessment.activity.map(|a| a.name);
        if assessment.classification.allowed {
            PollOutcome::OnTrack { activity }
        } else {
            PollOutcome::Distraction {
                activity,
                result: assessment.classification,
            }
        }
    }
}

impl From<Result<Assessment, GuardianError>> for PollOutcome {
    fn from(result: Result<Assessment, GuardianError>) -> Self {
        match result {
            Ok(assessment) => Self::from_assessment(assessment),
            Err(e) => Self::ClassifierFailed {
                error: e.to_string(),
            },
        }
    }
}

/// Judges the current screen against a goal
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, goal: &str, sample: &ScreenSample) -> Result<Assessment, GuardianError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_reply() {
        let c = Classification::from_reply(
            r#"{"allowed": false, "reason": "YouTube gaming video", "suggestion": "Close the tab", "severity": "high"}"#,
        )
        .unwrap();

        assert!(!c.allowed);
        assert_eq!(c.reason, "YouTube gaming video");
        assert_eq!(c.suggestion.as_deref(), Some("Close the tab"));
        assert_eq!(c.severity, Severity::High);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let c = Classification::from_value(&json!({}));
        assert!(c.allowed);
        assert_eq!(c.reason, DEFAULT_REASON);
        assert_eq!(c.suggestion, None);
        assert_eq!(c.severity, Severity::Medium);
    }

    #[test]
    fn test_lenient_field_types() {
        let c = Classification::from_value(&json!({
            "allowed": "false",
            "severity": "SEVERE",
            "suggestion": "   "
        }));
        assert!(!c.allowed);
        assert_eq!(c.severity, Severity::High);
        assert_eq!(c.suggestion, None);

        assert!(!Classification::from_value(&json!({"allowed": 0})).allowed);
        assert!(Classification::from_value(&json!({"allowed": "yes"})).allowed);
        assert_eq!(
            Classification::from_value(&json!({"severity": "whatever"})).severity,
            Severity::Medium
        );
    }

    #[test]
    fn test_reply_wrapped_in_prose() {
        let reply = "Sure! Here you go:\n```json\n{\"allowed\": true, \"reason\": \"Editing report\"}\n```";
        let c = Classification::from_reply(reply).unwrap();
        assert!(c.allowed);
        assert_eq!(c.reason, "Editing report");
    }

    #[test]
    fn test_non_json_reply_is_classifier_error() {
        let err = Classification::from_reply("DISTRACTION youtube").unwrap_err();
        assert!(matches!(err, GuardianError::Classifier(_)));
    }

    #[test]
    fn test_activity_list_and_selection() {
        let reply = r#"{"activities": [
            {"name": "youtube.com", "type": "entertainment", "content": "Let's play", "confidence": 60},
            {"name": "VS Code", "type": "work", "content": "report.md", "confidence": "90"},
            {"name": "Slack", "type": "chat", "confidence": 80},
            {"type": "work", "confidence": 99}
        ]}"#;

        let activities = ObservedActivity::list_from_reply(reply).unwrap();
        assert_eq!(activities.len(), 3);
        assert_eq!(activities[2].kind, ActivityKind::Other);

        let selected = ObservedActivity::select(activities, 65.0).unwrap();
        assert_eq!(selected.name, "VS Code");
        assert_eq!(selected.kind, ActivityKind::Work);
    }

    #[test]
    fn test_selection_threshold_is_exclusive() {
        let activities = vec![ObservedActivity {
            name: "Docs".into(),
            kind: ActivityKind::Work,
            content: String::new(),
            confidence: 65.0,
        }];
        assert!(ObservedActivity::select(activities, 65.0).is_none());
    }

    #[test]
    fn test_poll_outcome_from_assessment() {
        let outcome = PollOutcome::from_assessment(Assessment {
            activity: None,
            classification: Classification::allowed("nothing detected"),
        });
        assert_eq!(outcome, PollOutcome::OnTrack { activity: None });

        let failed: PollOutcome = Err(GuardianError::Classifier("timeout".into())).into();
        assert!(matches!(failed, PollOutcome::ClassifierFailed { .. }));
    }

    #[test]
    fn test_data_url() {
        let sample = ScreenSample::new(vec![0x89, b'P', b'N', b'G']);
        assert_eq!(sample.to_data_url(), "data:image/png;base64,iVBORw==");
    }
}
