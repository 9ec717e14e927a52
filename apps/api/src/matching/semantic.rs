//! Semantic matcher — sentence embeddings and cosine similarity.
//!
//! The encoder is a frozen pretrained model behind the `Encoder` trait. `main` builds one
//! `SemanticMatcher` at startup and shares it through `AppState`; nothing here trains or
//! mutates the model.

use std::path::PathBuf;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use thiserror::Error;
use tracing::info;

pub type Embedding = Vec<f32>;

/// Model identifier of the production encoder.
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";
/// Output size of the hashing encoder; matches all-MiniLM-L6-v2.
pub const HASHING_DIMENSION: usize = 384;

#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("failed to load embedding model '{model}': {message}")]
    Load { model: String, message: String },

    #[error("embedding inference failed: {0}")]
    Inference(String),

    #[error("encoder returned {got} vectors for {expected} inputs")]
    BatchMismatch { expected: usize, got: usize },
}

/// A frozen text encoder producing fixed-length vectors.
pub trait Encoder: Send + Sync {
    fn model_name(&self) -> &str;

    fn dimension(&self) -> usize;

    /// Encodes every text; only ever called with non-blank inputs.
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EncoderError>;
}

// ────────────────────────────────────────────────────────────────────────────
// FastEmbedEncoder — ONNX all-MiniLM-L6-v2
// ────────────────────────────────────────────────────────────────────────────

pub struct FastEmbedEncoder {
    model: TextEmbedding,
    dimension: usize,
}

impl FastEmbedEncoder {
    /// Loads the model (downloading it into `cache_dir` on first use) and probes its
    /// output size. Any failure here is fatal for the caller.
    pub fn load(cache_dir: Option<PathBuf>) -> Result<Self, EncoderError> {
        let load_err = |message: String| EncoderError::Load {
            model: DEFAULT_MODEL.to_string(),
            message,
        };

        let mut options =
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }

        let model = TextEmbedding::try_new(options).map_err(|e| load_err(e.to_string()))?;
        let dimension = model
            .embed(vec!["dimension probe"], None)
            .map_err(|e| load_err(e.to_string()))?
            .first()
            .map(Vec::len)
            .ok_or_else(|| load_err("model returned no embedding for probe".to_string()))?;

        info!("Embedding model {DEFAULT_MODEL} loaded ({dimension} dimensions)");
        Ok(Self { model, dimension })
    }
}

impl Encoder for FastEmbedEncoder {
    fn model_name(&self) -> &str {
        DEFAULT_MODEL
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EncoderError> {
        self.model
            .embed(texts.to_vec(), None)
            .map_err(|e| EncoderError::Inference(e.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HashingEncoder — deterministic offline bag-of-words encoder
// ────────────────────────────────────────────────────────────────────────────

/// Signed feature hashing over lowercase alphanumeric tokens, L2-normalized.
/// Texts sharing vocabulary land close together; no model files are needed.
pub struct HashingEncoder {
    dimension: usize,
}

impl HashingEncoder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed(&self, text: &str) -> Embedding {
        let mut vec = vec![0.0_f32; self.dimension];
        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = fnv1a_64(token.as_bytes());
            let index = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vec[index] += sign;
        }
        normalize(&mut vec);
        vec
    }
}

impl Default for HashingEncoder {
    fn default() -> Self {
        Self::new(HASHING_DIMENSION)
    }
}

impl Encoder for HashingEncoder {
    fn model_name(&self) -> &str {
        "hashing"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EncoderError> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vec {
        *value /= norm;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SemanticMatcher
// ────────────────────────────────────────────────────────────────────────────

/// Owns the loaded encoder. Construct once, share by reference (or `Arc`).
pub struct SemanticMatcher {
    encoder: Box<dyn Encoder>,
}

impl SemanticMatcher {
    pub fn new(encoder: impl Encoder + 'static) -> Self {
        Self {
            encoder: Box::new(encoder),
        }
    }

    pub fn model_name(&self) -> &str {
        self.encoder.model_name()
    }

    pub fn dimension(&self) -> usize {
        self.encoder.dimension()
    }

    /// Blank text encodes to the zero vector of the model's dimensionality.
    pub fn encode(&self, text: &str) -> Result<Embedding, EncoderError> {
        let mut out = self.encode_many(&[text])?;
        Ok(out.pop().unwrap_or_else(|| vec![0.0; self.dimension()]))
    }

    /// Encodes several texts in one model call, preserving input order.
    pub fn encode_many(&self, texts: &[&str]) -> Result<Vec<Embedding>, EncoderError> {
        let non_blank: Vec<&str> = texts
            .iter()
            .copied()
            .filter(|t| !t.trim().is_empty())
            .collect();

        let encoded = if non_blank.is_empty() {
            Vec::new()
        } else {
            self.encoder.encode_batch(&non_blank)?
        };
        if encoded.len() != non_blank.len() {
            return Err(EncoderError::BatchMismatch {
                expected: non_blank.len(),
                got: encoded.len(),
            });
        }

        let mut encoded = encoded.into_iter();
        Ok(texts
            .iter()
            .map(|t| {
                if t.trim().is_empty() {
                    vec![0.0; self.dimension()]
                } else {
                    encoded.next().unwrap_or_default()
                }
            })
            .collect())
    }

    /// Cosine similarity in [-1, 1]; 0 when either vector is zero or lengths differ.
    pub fn similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        (dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }

    pub fn text_similarity(&self, a: &str, b: &str) -> Result<f32, EncoderError> {
        let embeddings = self.encode_many(&[a, b])?;
        Ok(Self::similarity(&embeddings[0], &embeddings[1]))
    }
}
