use std::time::Duration;

use crate::fire_time::ReminderTime;
use crate::locale::{labels, resolve_language};
use crate::models::Settings;

const PLACEHOLDER_TASK: &str = "{task}";
const SUGGESTION_TIMEOUT: Duration = Duration::from_secs(20);
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// A text model behind some API. Failures come back as display strings.
pub trait TextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, String>;
}

pub fn build_prompt(settings: &Settings, task_text: &str) -> String {
    labels(resolve_language(&settings.language))
        .suggestion_prompt
        .replace(PLACEHOLDER_TASK, task_text.trim())
}

/// First `DD:DD` run in `text` that is also a valid clock time.
pub fn extract_reminder_time(text: &str) -> Option<ReminderTime> {
    text.as_bytes()
        .windows(5)
        .filter(|w| {
            w[0].is_ascii_digit()
                && w[1].is_ascii_digit()
                && w[2] == b':'
                && w[3].is_ascii_digit()
                && w[4].is_ascii_digit()
        })
        .filter_map(|w| std::str::from_utf8(w).ok())
        .find_map(|candidate| ReminderTime::parse(candidate).ok())
}

/// Settings win; the environment variable is the fallback for bundled builds.
pub fn resolve_api_key(settings: &Settings, env_value: Option<String>) -> Option<String> {
    let configured = settings.ai_api_key.trim();
    if !configured.is_empty() {
        return Some(configured.to_string());
    }
    env_value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub async fn suggest_reminder_time(
    generator: &impl TextGenerator,
    settings: &Settings,
    task_text: &str,
) -> Result<ReminderTime, String> {
    if task_text.trim().is_empty() {
        return Err("empty task text".to_string());
    }
    let prompt = build_prompt(settings, task_text);
    let reply = tokio::time::timeout(SUGGESTION_TIMEOUT, generator.generate(&prompt))
        .await
        .map_err(|_| "ai suggestion timed out".to_string())??;

    match extract_reminder_time(&reply) {
        Some(time) => {
            log::info!("ai suggested reminder_time={time}");
            Ok(time)
        }
        None => {
            log::warn!("ai reply has no usable HH:MM reply={:?}", reply.trim());
            Err("ai reply has no HH:MM time".to_string())
        }
    }
}

pub fn build_gemini_payload(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [
          { "parts": [ { "text": prompt } ] }
        ],
        "generationConfig": {
          "temperature": 0.2,
          "maxOutputTokens": 16
        }
    })
}

/// Concatenated text parts of the first candidate, or the API's error message.
pub fn parse_gemini_response(body: &str) -> Result<String, String> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|err| format!("invalid gemini json: {err}"))?;

    if let Some(message) = value["error"]["message"].as_str() {
        return Err(format!("gemini error: {message}"));
    }

    let parts = value["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| "gemini response has no candidates".to_string())?;
    let text: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();
    if text.trim().is_empty() {
        return Err("empty ai response".to_string());
    }
    Ok(text)
}

#[cfg(all(feature = "app", not(test)))]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

#[cfg(all(feature = "app", not(test)))]
impl GeminiClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, String> {
        let api_key = resolve_api_key(settings, std::env::var(API_KEY_ENV).ok())
            .ok_or_else(|| "missing gemini api key".to_string())?;
        let http = reqwest::Client::builder()
            .timeout(SUGGESTION_TIMEOUT)
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;
        Ok(Self {
            http,
            api_key,
            model: settings.ai_model.trim().to_string(),
        })
    }
}

#[cfg(all(feature = "app", not(test)))]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&build_gemini_payload(prompt))
            .send()
            .await
            .map_err(|err| format!("gemini request failed: {err}"))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|err| format!("failed to read gemini response: {err}"))?;
        if !status.is_success() {
            return Err(format!("gemini http {status}: {text}"));
        }
        parse_gemini_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(Result<String, String>);

    impl TextGenerator for Canned {
        async fn generate(&self, _prompt: &str) -> Result<String, String> {
            self.0.clone()
        }
    }

    struct Hangs;

    impl TextGenerator for Hangs {
        async fn generate(&self, _prompt: &str) -> Result<String, String> {
            std::future::pending().await
        }
    }

    fn turkish() -> Settings {
        let mut settings = Settings::default();
        settings.language = "tr".to_string();
        settings
    }

    #[test]
    fn prompt_embeds_the_trimmed_task_text() {
        let prompt = build_prompt(&turkish(), "  ilaç iç ");
        assert!(prompt.contains("\"ilaç iç\""));
        assert!(prompt.contains("HH:MM"));
        assert!(!prompt.contains(PLACEHOLDER_TASK));

        let mut english = Settings::default();
        english.language = "en".to_string();
        assert!(build_prompt(&english, "water plants").starts_with("Suggest"));
    }

    #[test]
    fn extract_takes_the_first_valid_time() {
        assert_eq!(extract_reminder_time("09:00").unwrap().to_string(), "09:00");
        assert_eq!(
            extract_reminder_time("Önerim: 14:30 olur").unwrap().to_string(),
            "14:30"
        );
        assert_eq!(
            extract_reminder_time("25:99 is wrong, use 18:00").unwrap().to_string(),
            "18:00"
        );
        // Like a regex scan, a run inside a longer number still counts.
        assert_eq!(extract_reminder_time("123:45").unwrap().to_string(), "23:45");
    }

    #[test]
    fn extract_needs_two_digit_fields() {
        assert!(extract_reminder_time("9:00").is_none());
        assert!(extract_reminder_time("sabah").is_none());
        assert!(extract_reminder_time("").is_none());
    }

    #[test]
    fn api_key_prefers_settings_over_env() {
        let mut settings = Settings::default();
        assert_eq!(resolve_api_key(&settings, None), None);
        assert_eq!(resolve_api_key(&settings, Some("  ".into())), None);
        assert_eq!(
            resolve_api_key(&settings, Some(" env-key ".into())).as_deref(),
            Some("env-key")
        );
        settings.ai_api_key = "cfg-key".to_string();
        assert_eq!(
            resolve_api_key(&settings, Some("env-key".into())).as_deref(),
            Some("cfg-key")
        );
    }

    #[test]
    fn gemini_payload_wraps_the_prompt() {
        let payload = build_gemini_payload("hello");
        assert_eq!(payload["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn gemini_response_parsing_covers_success_and_errors() {
        let ok = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"09:"},{"text":"30"}]}}]}"#;
        assert_eq!(parse_gemini_response(ok).unwrap(), "09:30");

        let api_err = r#"{"error":{"code":400,"message":"API key not valid"}}"#;
        assert_eq!(
            parse_gemini_response(api_err).unwrap_err(),
            "gemini error: API key not valid"
        );

        assert!(parse_gemini_response(r#"{"candidates":[]}"#).is_err());
        assert!(parse_gemini_response("not json").is_err());
        let blank = r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#;
        assert_eq!(parse_gemini_response(blank).unwrap_err(), "empty ai response");
    }

    #[tokio::test]
    async fn suggestion_returns_the_parsed_time() {
        let generator = Canned(Ok("Bence 07:45 uygun.".to_string()));
        let time = suggest_reminder_time(&generator, &turkish(), "koşu").await.unwrap();
        assert_eq!(time.to_string(), "07:45");
    }

    #[tokio::test]
    async fn suggestion_failures_are_plain_errors() {
        let generator = Canned(Ok("no idea".to_string()));
        assert!(suggest_reminder_time(&generator, &turkish(), "koşu").await.is_err());

        let generator = Canned(Err("gemini http 500".to_string()));
        assert_eq!(
            suggest_reminder_time(&generator, &turkish(), "koşu").await.unwrap_err(),
            "gemini http 500"
        );

        assert_eq!(
            suggest_reminder_time(&generator, &turkish(), "   ").await.unwrap_err(),
            "empty task text"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn suggestion_gives_up_after_the_timeout() {
        let err = suggest_reminder_time(&Hangs, &turkish(), "koşu").await.unwrap_err();
        assert_eq!(err, "ai suggestion timed out");
    }
}
