//! Cohere inference backend implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use cairn_core::{
    defaults, EmbedInputType, EmbeddingBackend, Error, GenerationBackend, GenerationOptions,
    Result, Vector,
};

/// Cohere inference backend.
///
/// Speaks the v1 `/embed` and `/generate` endpoints with bearer-token auth.
pub struct CohereBackend {
    client: Client,
    base_url: String,
    api_key: String,
    embed_model: String,
    gen_model: String,
    dimension: usize,
    embed_timeout_secs: u64,
    gen_timeout_secs: u64,
}

impl CohereBackend {
    /// Create a backend with explicit configuration.
    pub fn with_config(
        base_url: String,
        api_key: String,
        embed_model: String,
        gen_model: String,
        dimension: usize,
    ) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("HTTP client: {}", e)))?;

        debug!(
            subsystem = "inference",
            component = "cohere",
            model = %gen_model,
            embed_model = %embed_model,
            dimension = dimension,
            "Initializing Cohere backend"
        );

        Ok(Self {
            client,
            base_url,
            api_key,
            embed_model,
            gen_model,
            dimension,
            embed_timeout_secs: defaults::EMBED_TIMEOUT_SECS,
            gen_timeout_secs: defaults::GEN_TIMEOUT_SECS,
        })
    }

    /// Create from environment variables.
    ///
    /// `COHERE_API_KEY` is required; `COHERE_BASE_URL`, `CAIRN_EMBED_MODEL`,
    /// `CAIRN_GEN_MODEL`, `CAIRN_EMBED_DIM`, `CAIRN_EMBED_TIMEOUT_SECS`, and
    /// `CAIRN_GEN_TIMEOUT_SECS` override defaults.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("COHERE_API_KEY")
            .map_err(|_| Error::Config("COHERE_API_KEY is not set".to_string()))?;
        let base_url = std::env::var("COHERE_BASE_URL")
            .unwrap_or_else(|_| defaults::COHERE_BASE_URL.to_string());
        let embed_model = std::env::var("CAIRN_EMBED_MODEL")
            .unwrap_or_else(|_| defaults::EMBED_MODEL.to_string());
        let gen_model =
            std::env::var("CAIRN_GEN_MODEL").unwrap_or_else(|_| defaults::GEN_MODEL.to_string());
        let dimension = std::env::var("CAIRN_EMBED_DIM")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults::EMBED_DIMENSION);

        let mut backend = Self::with_config(base_url, api_key, embed_model, gen_model, dimension)?;

        if let Some(secs) = std::env::var("CAIRN_EMBED_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            backend.embed_timeout_secs = secs;
        }
        if let Some(secs) = std::env::var("CAIRN_GEN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            backend.gen_timeout_secs = secs;
        }

        Ok(backend)
    }
}

#[derive(Serialize)]
struct EmbedRequest {
    texts: Vec<String>,
    model: String,
    input_type: String,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    max_tokens: u32,
    temperature: f32,
    stop_sequences: Vec<String>,
}

#[derive(Deserialize)]
struct Generation {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    generations: Vec<Generation>,
}

#[async_trait]
impl EmbeddingBackend for CohereBackend {
    async fn embed(&self, text: &str, input_type: EmbedInputType) -> Result<Vector> {
        let start = Instant::now();
        let request = EmbedRequest {
            texts: vec![text.to_string()],
            model: self.embed_model.clone(),
            input_type: input_type.as_str().to_string(),
        };

        let response = self
            .client
            .post(format!("{}/v1/embed", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(self.embed_timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "Cohere returned {}: {}",
                status, body
            )));
        }

        let result: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("failed to parse response: {}", e)))?;

        let vector = result
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("empty embeddings in response".to_string()))?;

        debug!(
            subsystem = "inference",
            component = "cohere",
            op = "embed",
            model = %self.embed_model,
            dimension = vector.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Embedding complete"
        );

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.embed_model
    }
}

#[async_trait]
impl GenerationBackend for CohereBackend {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let start = Instant::now();
        let request = GenerateRequest {
            model: self.gen_model.clone(),
            prompt: prompt.to_string(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            stop_sequences: options.stop_sequences.clone(),
        };

        let response = self
            .client
            .post(format!("{}/v1/generate", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(self.gen_timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Cohere returned {}: {}",
                status, body
            )));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("failed to parse response: {}", e)))?;

        let text = result
            .generations
            .into_iter()
            .next()
            .map(|g| g.text.trim().to_string())
            .unwrap_or_default();

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            subsystem = "inference",
            component = "cohere",
            op = "generate",
            model = %self.gen_model,
            prompt_len = prompt.len(),
            response_len = text.len(),
            duration_ms = elapsed,
            "Generation complete"
        );
        if elapsed > 30_000 {
            warn!(
                subsystem = "inference",
                component = "cohere",
                duration_ms = elapsed,
                slow = true,
                "Slow generation call"
            );
        }

        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.gen_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(base_url: String) -> CohereBackend {
        CohereBackend::with_config(
            base_url,
            "test-key".to_string(),
            "embed-english-v3.0".to_string(),
            "command-r-plus".to_string(),
            4,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_embed_sends_input_type_and_parses_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embed"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "embed-english-v3.0",
                "input_type": "search_document",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[0.1, 0.2, 0.3, 0.4]]
            })))
            .mount(&server)
            .await;

        let vector = backend(server.uri())
            .embed("hello", EmbedInputType::Document)
            .await
            .unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[tokio::test]
    async fn test_embed_query_input_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embed"))
            .and(body_partial_json(serde_json::json!({
                "input_type": "search_query",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[1.0, 0.0, 0.0, 0.0]]
            })))
            .mount(&server)
            .await;

        let vector = backend(server.uri())
            .embed("what is rust", EmbedInputType::Query)
            .await
            .unwrap();
        assert_eq!(vector.len(), 4);
    }

    #[tokio::test]
    async fn test_embed_empty_embeddings_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embed"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "embeddings": [] })),
            )
            .mount(&server)
            .await;

        let err = backend(server.uri())
            .embed("hello", EmbedInputType::Document)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[tokio::test]
    async fn test_generate_sends_options_and_trims_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/generate"))
            .and(body_partial_json(serde_json::json!({
                "model": "command-r-plus",
                "max_tokens": 150,
                "temperature": 0.3,
                "stop_sequences": ["--END--"],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "generations": [{"text": "  An answer.\n"}]
            })))
            .mount(&server)
            .await;

        let text = backend(server.uri())
            .generate("prompt", &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "An answer.");
    }

    #[tokio::test]
    async fn test_generate_http_error_surfaces_as_inference_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/generate"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let err = backend(server.uri())
            .generate("prompt", &GenerationOptions::default())
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("429"));
        assert!(msg.contains("rate limited"));
    }

    #[tokio::test]
    async fn test_generate_empty_generations_yields_empty_string() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "generations": [] })),
            )
            .mount(&server)
            .await;

        let text = backend(server.uri())
            .generate("prompt", &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "");
    }
}
