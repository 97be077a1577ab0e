use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::{LabelScore, LabeledSpan, SpanCategory, TextGenerator, TokenLabeler, ZeroShotClassifier};
use crate::config::AppConfig;

/// Hugging Face Inference API provider. One instance serves all three
/// capabilities, each backed by its own hosted model. Inference calls are
/// stateless and may run concurrently; the client enforces a per-call
/// timeout.
pub struct HfProvider {
    base_url: String,
    token: String,
    zero_shot_model: String,
    ner_model: String,
    text2text_model: String,
    client: reqwest::Client,
}

impl HfProvider {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.model_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: config.hf_api_url.trim_end_matches('/').to_string(),
            token: config.hf_api_token.clone(),
            zero_shot_model: config.zero_shot_model.clone(),
            ner_model: config.ner_model.clone(),
            text2text_model: config.text2text_model.clone(),
            client,
        })
    }

    async fn call_model(&self, model: &str, body: serde_json::Value) -> anyhow::Result<serde_json::Value> {
        let url = format!("{}/models/{}", self.base_url, model);
        let mut req = self.client.post(&url).json(&body);
        if !self.token.is_empty() {
            req = req.bearer_auth(&self.token);
        }

        let resp = req
            .send()
            .await
            .with_context(|| format!("failed to call inference API for {model}"))?;

        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .with_context(|| format!("failed to parse inference response from {model}"))?;

        if !status.is_success() {
            anyhow::bail!("inference API error for {model} ({status}): {data}");
        }
        Ok(data)
    }

    /// Issues one tiny request per model so that cold models are loaded
    /// before the first user request. Bounded by `retries` attempts per
    /// model; exhaustion is fatal to startup.
    pub async fn warm_up(&self, retries: u32) -> anyhow::Result<()> {
        let probes: [(&str, serde_json::Value); 3] = [
            (
                self.zero_shot_model.as_str(),
                json!({"inputs": "ping", "parameters": {"candidate_labels": ["test"]}}),
            ),
            (self.ner_model.as_str(), json!({"inputs": "ping"})),
            (self.text2text_model.as_str(), json!({"inputs": "ping"})),
        ];

        for (model, body) in probes {
            let mut last_err = None;
            let mut ok = false;
            for attempt in 1..=retries {
                match self.call_model(model, body.clone()).await {
                    Ok(_) => {
                        tracing::info!(model, "model ready");
                        ok = true;
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(model, attempt, error = %e, "model warm-up failed");
                        last_err = Some(e);
                    }
                }
            }
            if !ok {
                return Err(last_err
                    .unwrap_or_else(|| anyhow::anyhow!("no attempts made"))
                    .context(format!("model {model} unavailable after {retries} attempts")));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ZeroShotClassifier for HfProvider {
    async fn classify(&self, text: &str, labels: &[String]) -> anyhow::Result<Vec<LabelScore>> {
        let body = json!({
            "inputs": text,
            "parameters": { "candidate_labels": labels, "multi_label": false },
        });
        let data = self.call_model(&self.zero_shot_model, body).await?;

        let labels = data["labels"]
            .as_array()
            .context("missing labels in zero-shot response")?;
        let scores = data["scores"]
            .as_array()
            .context("missing scores in zero-shot response")?;

        Ok(labels
            .iter()
            .zip(scores)
            .filter_map(|(l, s)| {
                Some(LabelScore {
                    label: l.as_str()?.to_string(),
                    score: s.as_f64()?,
                })
            })
            .collect())
    }
}

#[async_trait]
impl TokenLabeler for HfProvider {
    async fn label(&self, text: &str) -> anyhow::Result<Vec<LabeledSpan>> {
        let data = self
            .call_model(&self.ner_model, json!({"inputs": text}))
            .await?;

        let items = data
            .as_array()
            .context("unexpected token-classification response shape")?;

        Ok(items
            .iter()
            .filter_map(|item| {
                let tag = item["entity_group"].as_str()?;
                Some(LabeledSpan {
                    category: SpanCategory::from_tag(tag),
                    text: item["word"].as_str()?.trim().to_string(),
                    start: item["start"].as_u64()? as usize,
                })
            })
            .collect())
    }
}

#[async_trait]
impl TextGenerator for HfProvider {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let data = self
            .call_model(&self.text2text_model, json!({"inputs": prompt}))
            .await?;

        data[0]["generated_text"]
            .as_str()
            .map(|s| s.trim().to_string())
            .context("missing generated_text in response")
    }
}
