use crate::error::{Result, VectorStoreError};
use fastembed::{EmbeddingModel as FastEmbedModel, InitOptions, TextEmbedding};
use once_cell::sync::OnceCell;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use unicode_segmentation::UnicodeSegmentation;

pub const DEFAULT_DIMENSION: usize = 384;

/// Output size of all-MiniLM-L6-v2.
pub const FAST_MODEL_DIMENSION: usize = 384;

const FAST_MODEL_NAME: &str = "all-MiniLM-L6-v2";
const FAST_BATCH_SIZE: usize = 64;
const BIGRAM_WEIGHT: f32 = 0.5;

static FAST_MODEL: OnceCell<Arc<Mutex<TextEmbedding>>> = OnceCell::new();

/// Deterministic text → vector mapping.
///
/// Implementations must return the same vector for the same text on every
/// call and every vector must have `dimension()` entries. The index
/// normalizes whatever it receives, so unit length is not required.
pub trait Embedder: Send + Sync {
    fn dimension(&self) -> usize;

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embed_batch(&[text])?;
        embeddings
            .pop()
            .ok_or_else(|| VectorStoreError::EmbeddingError("Empty embedding result".to_string()))
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum EmbeddingMode {
    /// Sentence-transformer model run through ONNX Runtime.
    #[default]
    Fast,
    /// Feature hashing over words and word bigrams. Offline fallback.
    Hashed,
    /// One pseudo-random vector per distinct text; similarity carries no meaning.
    Stub,
}

impl EmbeddingMode {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "hashed" => Ok(Self::Hashed),
            "stub" => Ok(Self::Stub),
            other => Err(VectorStoreError::EmbeddingError(format!(
                "Unsupported RECO_EMBEDDING_MODE '{other}' (expected 'fast', 'hashed' or 'stub')"
            ))),
        }
    }

    pub fn from_env() -> Result<Self> {
        match env::var("RECO_EMBEDDING_MODE") {
            Ok(raw) => Self::parse(&raw),
            Err(_) => Ok(Self::default()),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Hashed => "hashed",
            Self::Stub => "stub",
        }
    }
}

/// Cache directory for downloaded model files (`RECO_MODEL_DIR`).
///
/// `None` leaves the choice to fastembed.
#[must_use]
pub fn model_dir() -> Option<PathBuf> {
    env::var("RECO_MODEL_DIR")
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
}

fn dimension_from_env() -> Result<usize> {
    let Ok(raw) = env::var("RECO_EMBEDDING_DIM") else {
        return Ok(DEFAULT_DIMENSION);
    };
    match raw.trim().parse::<usize>() {
        Ok(dim) if dim > 0 => Ok(dim),
        _ => Err(VectorStoreError::EmbeddingError(format!(
            "Invalid RECO_EMBEDDING_DIM '{raw}' (expected a positive integer)"
        ))),
    }
}

/// Process-wide all-MiniLM-L6-v2 session; loaded once, shared by every model.
#[derive(Clone)]
struct FastBackend {
    model: Arc<Mutex<TextEmbedding>>,
}

impl fmt::Debug for FastBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FastBackend")
            .field("model", &FAST_MODEL_NAME)
            .finish()
    }
}

impl FastBackend {
    fn load() -> Result<Self> {
        let model = FAST_MODEL.get_or_try_init(|| -> Result<_> {
            let mut options =
                InitOptions::new(FastEmbedModel::AllMiniLML6V2).with_show_download_progress(false);
            if let Some(dir) = model_dir() {
                options = options.with_cache_dir(dir);
            }
            log::info!("Loading embedding model {FAST_MODEL_NAME}");
            let model = TextEmbedding::try_new(options).map_err(|err| {
                VectorStoreError::EmbeddingError(format!("Cannot load {FAST_MODEL_NAME}: {err}"))
            })?;
            Ok(Arc::new(Mutex::new(model)))
        })?;
        Ok(Self {
            model: Arc::clone(model),
        })
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut model = self.model.lock().unwrap_or_else(PoisonError::into_inner);
        model
            .embed(texts.to_vec(), Some(FAST_BATCH_SIZE))
            .map_err(|err| VectorStoreError::EmbeddingError(format!("{FAST_MODEL_NAME}: {err}")))
    }
}

#[derive(Clone, Debug)]
struct HashedBackend {
    dimension: usize,
}

impl HashedBackend {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0_f32; self.dimension];
        let words: Vec<String> = text.unicode_words().map(str::to_lowercase).collect();

        for word in &words {
            self.accumulate(&mut vec, word, 1.0);
            if word.contains('_') {
                for part in word.split('_').filter(|p| !p.is_empty()) {
                    self.accumulate(&mut vec, part, 1.0);
                }
            }
        }
        for pair in words.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.accumulate(&mut vec, &bigram, BIGRAM_WEIGHT);
        }

        normalize(&mut vec);
        vec
    }

    fn accumulate(&self, vec: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a_64(feature.as_bytes());
        let bucket = (hash % self.dimension as u64) as usize;
        let sign = if hash >> 63 == 1 { -1.0 } else { 1.0 };
        vec[bucket] += sign * weight;
    }
}

#[derive(Clone, Debug)]
struct StubBackend {
    dimension: usize,
}

impl StubBackend {
    fn embed(&self, text: &str) -> Vec<f32> {
        stub_embed(text, self.dimension)
    }
}

#[derive(Clone, Debug)]
enum EmbeddingBackend {
    Fast(FastBackend),
    Hashed(HashedBackend),
    Stub(StubBackend),
}

/// Built-in embedder selected by `RECO_EMBEDDING_MODE` / `RECO_EMBEDDING_DIM`.
#[derive(Clone, Debug)]
pub struct EmbeddingModel {
    backend: EmbeddingBackend,
    dimension: usize,
}

impl EmbeddingModel {
    pub fn new() -> Result<Self> {
        Self::from_env()
    }

    pub fn from_env() -> Result<Self> {
        let mode = EmbeddingMode::from_env()?;
        let dimension = dimension_from_env()?;
        Self::with_mode(mode, dimension)
    }

    pub fn with_mode(mode: EmbeddingMode, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(VectorStoreError::EmbeddingError(
                "Embedding dimension must be positive".to_string(),
            ));
        }
        let backend = match mode {
            EmbeddingMode::Fast => {
                if dimension != FAST_MODEL_DIMENSION {
                    return Err(VectorStoreError::InvalidDimension {
                        expected: FAST_MODEL_DIMENSION,
                        actual: dimension,
                    });
                }
                EmbeddingBackend::Fast(FastBackend::load()?)
            }
            EmbeddingMode::Hashed => EmbeddingBackend::Hashed(HashedBackend { dimension }),
            EmbeddingMode::Stub => EmbeddingBackend::Stub(StubBackend { dimension }),
        };
        log::debug!(
            "Embedding model ready: mode={}, dim={dimension}",
            mode.as_str()
        );
        Ok(Self { backend, dimension })
    }

    #[must_use]
    pub const fn mode(&self) -> EmbeddingMode {
        match self.backend {
            EmbeddingBackend::Fast(_) => EmbeddingMode::Fast,
            EmbeddingBackend::Hashed(_) => EmbeddingMode::Hashed,
            EmbeddingBackend::Stub(_) => EmbeddingMode::Stub,
        }
    }
}

impl Embedder for EmbeddingModel {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let vectors = match &self.backend {
            EmbeddingBackend::Fast(fast) => return fast.embed_batch(texts),
            EmbeddingBackend::Hashed(hashed) => texts.iter().map(|t| hashed.embed(t)).collect(),
            EmbeddingBackend::Stub(stub) => texts.iter().map(|t| stub.embed(t)).collect(),
        };
        Ok(vectors)
    }
}

pub(crate) fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vec {
        *value /= norm;
    }
}

pub(crate) fn ensure_dimension(vec: &[f32], expected: usize) -> Result<()> {
    if vec.len() != expected {
        return Err(VectorStoreError::InvalidDimension {
            expected,
            actual: vec.len(),
        });
    }
    Ok(())
}

fn stub_embed(text: &str, dimension: usize) -> Vec<f32> {
    let mut state =
        fnv1a_64(text.as_bytes()) ^ (dimension as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut vec = Vec::with_capacity(dimension);
    for _ in 0..dimension {
        let bits = splitmix64(&mut state);
        let high = (bits >> 32) as u32;
        let mantissa = high >> 9;
        let unit = f32::from_bits(0x3f80_0000 | mantissa) - 1.0;
        vec.push(unit.mul_add(2.0, -1.0));
    }
    normalize(&mut vec);
    vec
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn hashed_embeddings_are_deterministic_and_unit_length() {
        let model = EmbeddingModel::with_mode(EmbeddingMode::Hashed, 64).unwrap();
        let text = "Customer service situational judgement";
        let a = model.embed(text).unwrap();
        let b = model.embed(text).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!((norm(&a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn hashed_embeddings_reward_shared_vocabulary() {
        let model = EmbeddingModel::with_mode(EmbeddingMode::Hashed, DEFAULT_DIMENSION).unwrap();
        let query = model.embed("customer service representative").unwrap();
        let close = model
            .embed("SJT for customer service and retail roles")
            .unwrap();
        let far = model.embed("deductive numerical reasoning").unwrap();
        assert!(dot(&query, &close) > dot(&query, &far));
    }

    #[test]
    fn underscore_facets_share_features_with_plain_words() {
        let model = EmbeddingModel::with_mode(EmbeddingMode::Hashed, DEFAULT_DIMENSION).unwrap();
        let facet = model.embed("cognitive_ability").unwrap();
        let words = model.embed("general cognitive ability").unwrap();
        assert!(dot(&facet, &words) > 0.0);
    }

    #[test]
    fn text_without_words_embeds_to_zero() {
        let model = EmbeddingModel::with_mode(EmbeddingMode::Hashed, 16).unwrap();
        let v = model.embed(". ").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn stub_embeddings_depend_on_text_and_dimension() {
        assert_eq!(stub_embed("hello", 8), stub_embed("hello", 8));
        assert_ne!(stub_embed("hello", 8), stub_embed("world", 8));
        assert_eq!(stub_embed("hello", 12).len(), 12);
        assert!((norm(&stub_embed("hello", 8)) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn batch_preserves_input_order() {
        let model = EmbeddingModel::with_mode(EmbeddingMode::Stub, 8).unwrap();
        let out = model.embed_batch(&["hello", "world", "again"]).unwrap();
        assert_eq!(out[0], stub_embed("hello", 8));
        assert_eq!(out[1], stub_embed("world", 8));
        assert_eq!(out[2], stub_embed("again", 8));
    }

    #[test]
    fn mode_parsing_rejects_unknown_values() {
        assert_eq!(EmbeddingMode::parse("STUB").unwrap(), EmbeddingMode::Stub);
        assert_eq!(
            EmbeddingMode::parse(" hashed ").unwrap(),
            EmbeddingMode::Hashed
        );
        assert_eq!(EmbeddingMode::parse("fast").unwrap(), EmbeddingMode::Fast);
        assert_eq!(EmbeddingMode::default(), EmbeddingMode::Fast);
        let err = EmbeddingMode::parse("onnx").unwrap_err();
        assert!(err.to_string().contains("onnx"), "unexpected error: {err}");
        assert!(EmbeddingModel::with_mode(EmbeddingMode::Hashed, 0).is_err());
    }

    #[test]
    fn fast_mode_rejects_foreign_dimension_before_loading() {
        let err = EmbeddingModel::with_mode(EmbeddingMode::Fast, 128).unwrap_err();
        assert!(matches!(
            err,
            VectorStoreError::InvalidDimension {
                expected: FAST_MODEL_DIMENSION,
                actual: 128
            }
        ));
    }

    #[test]
    #[ignore = "Requires all-MiniLM-L6-v2 download"]
    fn fast_embeddings_capture_paraphrases() {
        let model = EmbeddingModel::with_mode(EmbeddingMode::Fast, FAST_MODEL_DIMENSION).unwrap();
        assert_eq!(model.mode(), EmbeddingMode::Fast);

        let query = model.embed("Cashier helping shoppers at the till").unwrap();
        let close = model.embed("Retail store sales assistant").unwrap();
        let far = model.embed("Quarterly tax accounting audit").unwrap();
        assert_eq!(query.len(), FAST_MODEL_DIMENSION);
        let cosine = |a: &[f32], b: &[f32]| dot(a, b) / (norm(a) * norm(b));
        assert!(cosine(&query, &close) > cosine(&query, &far));
    }
}
