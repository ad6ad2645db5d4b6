use crate::model::TriviaSettings;
use crate::trivia::TriviaFetcher;
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Asks an OpenAI-compatible chat completions endpoint for track trivia.
pub struct ChatTriviaFetcher {
    agent: ureq::Agent,
    endpoint: String,
    model: String,
    api_key: String,
}

impl ChatTriviaFetcher {
    /// `None` when trivia is disabled or no API key is present; callers treat
    /// that as "no backend".
    pub fn from_settings(settings: &TriviaSettings) -> Option<Self> {
        if !settings.enabled {
            return None;
        }
        let api_key = env::var(&settings.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())?;

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(settings.timeout_secs.max(1))))
            .build()
            .into();

        Some(Self {
            agent,
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            api_key,
        })
    }
}

impl TriviaFetcher for ChatTriviaFetcher {
    fn fetch(&self, title: &str, artist: &str) -> Result<String> {
        let payload = request_body(&self.model, title, artist).to_string();
        let body = self
            .agent
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .send(payload.as_str())
            .with_context(|| format!("trivia request to {} failed", self.endpoint))?
            .body_mut()
            .read_to_string()
            .context("failed to read trivia response")?;

        parse_reply(&body)
    }
}

fn request_body(model: &str, title: &str, artist: &str) -> serde_json::Value {
    let subject = if artist.is_empty() {
        format!("the song \"{title}\"")
    } else {
        format!("the song \"{title}\" by {artist}")
    };
    serde_json::json!({
        "model": model,
        "messages": [
            {
                "role": "system",
                "content": "You write short music trivia for a terminal dashboard. Answer in markdown with at most five bullet points."
            },
            {
                "role": "user",
                "content": format!("Share a few interesting facts about {subject}.")
            }
        ]
    })
}

fn parse_reply(body: &str) -> Result<String> {
    let json: serde_json::Value =
        serde_json::from_str(body).context("trivia response is not JSON")?;
    let text = json
        .pointer("/choices/0/message/content")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .context("trivia response has no content")?;
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_content_is_extracted() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  - fact one\n"}}]}"#;
        assert_eq!(parse_reply(body).expect("content"), "- fact one");
    }

    #[test]
    fn empty_reply_is_an_error() {
        assert!(parse_reply(r#"{"choices":[]}"#).is_err());
        assert!(parse_reply("not json").is_err());
    }

    #[test]
    fn request_mentions_artist_when_known() {
        let body = request_body("m", "Song", "Band");
        let prompt = body
            .pointer("/messages/1/content")
            .and_then(serde_json::Value::as_str)
            .expect("prompt");
        assert!(prompt.contains("\"Song\" by Band"));
        assert_eq!(body["model"], "m");
    }

    #[test]
    fn disabled_settings_yield_no_backend() {
        let settings = TriviaSettings {
            enabled: false,
            ..TriviaSettings::default()
        };
        assert!(ChatTriviaFetcher::from_settings(&settings).is_none());

        let missing_key = TriviaSettings {
            api_key_env: String::from("TUNE_REMOTE_TEST_KEY_THAT_IS_NEVER_SET"),
            ..TriviaSettings::default()
        };
        assert!(ChatTriviaFetcher::from_settings(&missing_key).is_none());
    }
}
