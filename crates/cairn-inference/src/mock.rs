//! Mock inference backend for deterministic testing.
//!
//! Generates hash-seeded embeddings and canned generation responses so
//! pipeline tests run without a network. Identical input always yields an
//! identical vector.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use cairn_core::{
    EmbedInputType, EmbeddingBackend, Error, GenerationBackend, GenerationOptions, Result, Vector,
};

#[derive(Debug, Clone)]
struct MockConfig {
    dimension: usize,
    fixed_responses: HashMap<String, String>,
    default_response: String,
    fail_embed: bool,
    fail_generate: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            dimension: 1024,
            fixed_responses: HashMap::new(),
            default_response: "Mock response".to_string(),
            fail_embed: false,
            fail_generate: false,
        }
    }
}

/// A logged backend call, for assertions.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

/// Mock inference backend for testing.
#[derive(Clone, Default)]
pub struct MockBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl MockBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        Arc::make_mut(&mut self.config).dimension = dimension;
        self
    }

    /// Set the default generation response.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Map a specific prompt to a specific response.
    pub fn with_response_mapping(
        mut self,
        prompt: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .fixed_responses
            .insert(prompt.into(), response.into());
        self
    }

    /// Make every embed call fail.
    pub fn with_failing_embed(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_embed = true;
        self
    }

    /// Make every generate call fail.
    pub fn with_failing_generate(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_generate = true;
        self
    }

    /// All logged calls, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of generate calls made.
    pub fn generate_call_count(&self) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == "generate")
            .count()
    }

    fn log(&self, operation: &str, input: &str) {
        self.call_log.lock().unwrap().push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
        });
    }
}

/// Deterministic pseudo-embedding seeded from the text's hash.
fn seeded_vector(text: &str, dimension: usize) -> Vector {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    text.hash(&mut hasher);
    let mut state = hasher.finish();
    (0..dimension)
        .map(|_| {
            // xorshift step per component
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state % 1000) as f32 / 1000.0 - 0.5
        })
        .collect()
}

#[async_trait]
impl EmbeddingBackend for MockBackend {
    async fn embed(&self, text: &str, _input_type: EmbedInputType) -> Result<Vector> {
        self.log("embed", text);
        if self.config.fail_embed {
            return Err(Error::Embedding("mock embed failure".to_string()));
        }
        Ok(seeded_vector(text, self.config.dimension))
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn generate(&self, prompt: &str, _options: &GenerationOptions) -> Result<String> {
        self.log("generate", prompt);
        if self.config.fail_generate {
            return Err(Error::Inference("mock generate failure".to_string()));
        }
        Ok(self
            .config
            .fixed_responses
            .get(prompt)
            .cloned()
            .unwrap_or_else(|| self.config.default_response.clone()))
    }

    fn model_name(&self) -> &str {
        "mock-gen"
    }
}
