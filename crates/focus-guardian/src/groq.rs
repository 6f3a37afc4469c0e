//! Groq classifier
//!
//! Talks to an OpenAI-compatible chat completions endpoint in three steps:
//! goal rules are derived once at startup, then every poll runs a vision
//! call to name the active window and a text call to judge it against the
//! goal and rules.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classifier::{
    parse_json_object, Assessment, Classification, Classifier, ObservedActivity, ScreenSample,
};
use crate::config::Config;
use crate::error::GuardianError;

const VISION_PROMPT: &str = r#"Analyze ONLY the active window and identify the primary application or website.

Return JSON with confidence scores (1-100):
{
    "activities": [
        {
            "name": "exact-app-or-domain",
            "type": "work|education|entertainment|other",
            "content": "visible text/title",
            "confidence": 75
        }
    ]
}"#;

/// Enforcement rules derived from the user's goal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalRules {
    /// Applications and websites that serve the goal
    pub allowed_resources: Vec<String>,
    /// Resource -> the purpose it may be used for
    pub allowed_purposes: Value,
    /// Resource -> criteria its content must meet
    pub content_rules: Value,
    /// Enforcement level, 1-5
    pub strictness: Value,
}

impl GoalRules {
    /// Decode a rules reply, tolerating missing or oddly typed fields
    pub fn from_reply(reply: &str) -> Result<Self, GuardianError> {
        let value = parse_json_object(reply)?;

        let allowed_resources = match value.get("allowed_resources") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) => vec![s.clone()],
            _ => Vec::new(),
        };

        Ok(Self {
            allowed_resources,
            allowed_purposes: value.get("allowed_purposes").cloned().unwrap_or(Value::Null),
            content_rules: value.get("content_rules").cloned().unwrap_or(Value::Null),
            strictness: value.get("strictness").cloned().unwrap_or(Value::Null),
        })
    }
}

/// Prompt asking the text model to turn a goal into rules
pub fn rules_prompt(goal: &str) -> String {
    format!(
        r#"Analyze this productivity goal and create enforcement rules:
Goal: "{goal}"

Return JSON with:
- allowed_resources: list of allowed apps/websites
- allowed_purposes: specific usage purposes
- content_rules: content validation criteria
- strictness: level of enforcement (1-5)

Example response for "Study ML on YouTube":
{{
    "allowed_resources": ["youtube.com"],
    "allowed_purposes": {{"youtube.com": "machine learning tutorials"}},
    "content_rules": {{"youtube.com": "Video titles must contain ML/AI keywords"}},
    "strictness": 4
}}"#
    )
}

/// Prompt asking the text model to judge one activity
pub fn validation_prompt(goal: &str, activity: &ObservedActivity, rules: &GoalRules) -> String {
    let activity = serde_json::to_string(activity).unwrap_or_default();
    let rules = serde_json::to_string(rules).unwrap_or_default();
    format!(
        r#"Verify if this activity aligns with the user's goal:
User Goal: "{goal}"
Activity: {activity}
Rules: {rules}

Consider:
1. Resource allowlist
2. Purpose matching
3. Content relevance
4. Current context

Return JSON response:
{{
    "allowed": boolean,
    "reason": "explanation",
    "suggestion": "productivity tip",
    "severity": "low|medium|high"
}}"#
    )
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

const JSON_OBJECT: ResponseFormat = ResponseFormat { kind: "json_object" };

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

impl ChatMessage {
    fn user(text: String) -> Self {
        Self {
            role: "user",
            content: MessageContent::Text(text),
        }
    }

    fn user_with_image(text: &str, sample: &ScreenSample) -> Self {
        Self {
            role: "user",
            content: MessageContent::Parts(vec![
                ContentPart::Text {
                    text: text.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: sample.to_data_url(),
                    },
                },
            ]),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Vision + validation classifier backed by the Groq API
#[derive(Clone)]
pub struct GroqClassifier {
    client: Client,
    endpoint: String,
    api_key: String,
    vision_model: String,
    text_model: String,
    confidence_threshold: f64,
    rules: GoalRules,
}

impl GroqClassifier {
    /// Build a client from configuration. Requires a resolvable API key.
    pub fn from_config(config: &Config) -> Result<Self, GuardianError> {
        let api_key = config.api_key()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GuardianError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key,
            vision_model: config.vision_model.clone(),
            text_model: config.text_model.clone(),
            confidence_threshold: config.confidence_threshold,
            rules: GoalRules::default(),
        })
    }

    pub fn rules(&self) -> &GoalRules {
        &self.rules
    }

    /// Derive goal rules. Any failure here is a configuration error: without
    /// rules the validator has nothing to judge against.
    pub async fn prepare(&mut self, goal: &str) -> Result<&GoalRules, GuardianError> {
        let reply = self
            .chat(&self.text_model, vec![ChatMessage::user(rules_prompt(goal))], 0.2, 400)
            .await
            .map_err(|e| GuardianError::Configuration(format!("could not derive goal rules: {e}")))?;
        let rules = GoalRules::from_reply(&reply)
            .map_err(|e| GuardianError::Configuration(format!("could not derive goal rules: {e}")))?;

        tracing::info!(resources = ?rules.allowed_resources, "goal rules derived");
        self.rules = rules;
        Ok(&self.rules)
    }

    async fn detect(&self, sample: &ScreenSample) -> Result<Option<ObservedActivity>, GuardianError> {
        let reply = self
            .chat(
                &self.vision_model,
                vec![ChatMessage::user_with_image(VISION_PROMPT, sample)],
                0.1,
                500,
            )
            .await?;
        let activities = ObservedActivity::list_from_reply(&reply)?;
        tracing::debug!(count = activities.len(), "vision detections");
        Ok(ObservedActivity::select(activities, self.confidence_threshold))
    }

    async fn validate(
        &self,
        goal: &str,
        activity: &ObservedActivity,
    ) -> Result<Classification, GuardianError> {
        let prompt = validation_prompt(goal, activity, &self.rules);
        let reply = self
            .chat(&self.text_model, vec![ChatMessage::user(prompt)], 0.1, 300)
            .await?;
        Classification::from_reply(&reply)
    }

    async fn chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, GuardianError> {
        let request = ChatRequest {
            model,
            messages,
            temperature,
            max_tokens,
            response_format: JSON_OBJECT,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GuardianError::Classifier(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(http_error(status, &body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GuardianError::Classifier(format!("unreadable response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GuardianError::Classifier("response contained no content".into()))
    }
}

fn http_error(status: StatusCode, body: &str) -> GuardianError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    GuardianError::Classifier(format!("HTTP {}: {}", status.as_u16(), message))
}

#[async_trait]
impl Classifier for GroqClassifier {
    async fn classify(&self, goal: &str, sample: &ScreenSample) -> Result<Assessment, GuardianError> {
        let Some(activity) = self.detect(sample).await? else {
            return Ok(Assessment {
                activity: None,
                classification: Classification::allowed("No activity detected"),
            });
        };

        let classification = self.validate(goal, &activity).await?;
        Ok(Assessment {
            activity: Some(activity),
            classification,
        })
    }
}
