//! Kernel engine: Gram and cross matrices of encoding-pair similarities.
//!
//! The engine owns an injected [`EvaluationBackend`] plus a [`KernelConfig`]
//! and produces the two matrices the classifier needs: the square
//! train-train Gram matrix and the rectangular test-train cross matrix.
//! Entry (i, j) is the squared-overlap similarity between the encodings of
//! rows i and j.
//!
//! Cost model: each matrix needs O(n·m) backend evaluations and every
//! evaluation's cost grows with encoding depth (2^d statevector, or shots
//! on a device). That quadratic growth is why [`KernelConfig::max_train_samples`]
//! caps the usable training-set size explicitly instead of letting runs
//! quietly take hours.

use crate::backend::{EncodingPair, EvaluationBackend};
use crate::encoding::{encode, EncoderConfig, EncodingDescription};
use crate::error::{EntrelazarError, Result};
use crate::primitives::Matrix;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Engine configuration.
///
/// # Examples
///
/// ```
/// use entrelazar::kernel::KernelConfig;
/// use std::time::Duration;
///
/// let config = KernelConfig::new()
///     .with_resamples(3)
///     .with_max_retries(5)
///     .with_run_budget(Duration::from_secs(120));
/// assert_eq!(config.resamples, 3);
/// ```
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Backend evaluations averaged per entry (≥ 1). Useful for
    /// sample-based backends; exact backends gain nothing from > 1.
    pub resamples: usize,
    /// Upper bound on training-set size. Evaluation cost is quadratic in
    /// n, so the cap is explicit rather than implicit.
    pub max_train_samples: usize,
    /// Retry ceiling for transient backend failures.
    pub max_retries: usize,
    /// Base delay of the exponential retry backoff.
    pub retry_backoff: Duration,
    /// Wall-clock budget per matrix computation; exceeding it fails the
    /// run rather than producing a partial matrix.
    pub run_budget: Duration,
    /// Explicit opt-in: replace an exhausted backend with a classical RBF
    /// similarity for the remainder of the run. Never enabled by default
    /// and never silent (see [`KernelEngine::fell_back`]).
    pub classical_fallback: bool,
}

impl KernelConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resamples: 1,
            max_train_samples: 300,
            max_retries: 3,
            retry_backoff: Duration::from_millis(100),
            run_budget: Duration::from_secs(600),
            classical_fallback: false,
        }
    }

    /// Sets the per-entry resample count.
    #[must_use]
    pub fn with_resamples(mut self, resamples: usize) -> Self {
        self.resamples = resamples;
        self
    }

    /// Sets the training-set size cap.
    #[must_use]
    pub fn with_max_train_samples(mut self, cap: usize) -> Self {
        self.max_train_samples = cap;
        self
    }

    /// Sets the retry ceiling.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the backoff base delay.
    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Sets the per-run wall-clock budget.
    #[must_use]
    pub fn with_run_budget(mut self, budget: Duration) -> Self {
        self.run_budget = budget;
        self
    }

    /// Opts in to the classical degraded mode.
    #[must_use]
    pub fn with_classical_fallback(mut self, enabled: bool) -> Self {
        self.classical_fallback = enabled;
        self
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Memoization key: exact bit patterns of both vectors plus the encoder
/// configuration. Pair order is normalized so K(a, b) and K(b, a) share
/// one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    lo: Box<[u64]>,
    hi: Box<[u64]>,
    encoder: EncoderConfig,
}

impl CacheKey {
    fn new(a: &[f64], b: &[f64], encoder: &EncoderConfig) -> Self {
        let a_bits: Box<[u64]> = a.iter().map(|v| v.to_bits()).collect();
        let b_bits: Box<[u64]> = b.iter().map(|v| v.to_bits()).collect();
        let (lo, hi) = if a_bits <= b_bits {
            (a_bits, b_bits)
        } else {
            (b_bits, a_bits)
        };
        Self {
            lo,
            hi,
            encoder: *encoder,
        }
    }
}

/// Kernel engine over an injected evaluation backend.
///
/// # Examples
///
/// ```
/// use entrelazar::backend::StatevectorBackend;
/// use entrelazar::encoding::EncoderConfig;
/// use entrelazar::kernel::{KernelConfig, KernelEngine};
/// use entrelazar::primitives::Matrix;
///
/// let x = Matrix::from_vec(3, 2, vec![0.1, 0.9, 2.0, 1.1, 0.4, 2.8]).unwrap();
/// let mut engine = KernelEngine::new(StatevectorBackend::new(), KernelConfig::new());
/// let k = engine.train_matrix(&x, &EncoderConfig::new()).unwrap();
/// assert_eq!(k.shape(), (3, 3));
/// assert!((k.get(0, 0) - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct KernelEngine<B> {
    backend: B,
    config: KernelConfig,
    cache: HashMap<CacheKey, f64>,
    fell_back: bool,
}

impl<B: EvaluationBackend> KernelEngine<B> {
    /// Creates an engine from a backend instance and configuration.
    #[must_use]
    pub fn new(backend: B, config: KernelConfig) -> Self {
        Self {
            backend,
            config,
            cache: HashMap::new(),
            fell_back: false,
        }
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// True once the engine has substituted the classical fallback
    /// similarity for the quantum backend. Callers that opted in to the
    /// degraded mode can (and should) check this after a run.
    #[must_use]
    pub fn fell_back(&self) -> bool {
        self.fell_back
    }

    /// Computes the n×n train-train Gram matrix.
    ///
    /// Only upper-triangle pairs are evaluated; the lower triangle
    /// mirrors them. Afterwards the matrix is symmetrized as
    /// K ← (K + Kᵀ)/2 and clipped to [0, 1], the one repair step the
    /// pipeline permits.
    ///
    /// # Errors
    ///
    /// - [`EntrelazarError::Configuration`] if n exceeds the training cap
    ///   or the encoder configuration is invalid.
    /// - [`EntrelazarError::DataShape`] if `x` is empty.
    /// - [`EntrelazarError::BackendUnavailable`] once retries and the run
    ///   budget are exhausted (unless the classical fallback is opted in).
    pub fn train_matrix(&mut self, x: &Matrix<f64>, encoder: &EncoderConfig) -> Result<Matrix<f64>> {
        let n = x.n_rows();
        if n == 0 {
            return Err(EntrelazarError::shape_mismatch(
                "train kernel",
                "at least 1 row",
                "0 rows",
            ));
        }
        if n > self.config.max_train_samples {
            return Err(EntrelazarError::config(
                "n_train",
                n,
                &format!("at most {} samples (quadratic evaluation cost)", self.config.max_train_samples),
            ));
        }

        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| (i..n).map(move |j| (i, j)))
            .collect();
        let mut k = self.fill_pairs(x, x, &pairs, encoder, n, n)?;
        for i in 0..n {
            for j in (i + 1)..n {
                let v = k.get(i, j);
                k.set(j, i, v);
            }
        }
        k.symmetrize();
        k.clip(0.0, 1.0);
        Ok(k)
    }

    /// Computes the n×m cross matrix between two sets (rows of `a` against
    /// rows of `b`), clipped to [0, 1].
    ///
    /// Entries whose (vector, vector, config) triple was already computed
    /// in this engine's lifetime are served from the memo cache, so a
    /// cross kernel that reuses training vectors costs only the new pairs.
    ///
    /// # Errors
    ///
    /// Same as [`KernelEngine::train_matrix`], plus
    /// [`EntrelazarError::DataShape`] when the two sets disagree on
    /// feature dimension.
    pub fn cross_matrix(
        &mut self,
        a: &Matrix<f64>,
        b: &Matrix<f64>,
        encoder: &EncoderConfig,
    ) -> Result<Matrix<f64>> {
        if a.n_rows() == 0 || b.n_rows() == 0 {
            return Err(EntrelazarError::shape_mismatch(
                "cross kernel",
                "at least 1 row on each side",
                format!("{}x{} rows", a.n_rows(), b.n_rows()),
            ));
        }
        if a.n_cols() != b.n_cols() {
            return Err(EntrelazarError::shape_mismatch(
                "cross kernel",
                format!("{} features", a.n_cols()),
                format!("{} features", b.n_cols()),
            ));
        }

        let (n, m) = (a.n_rows(), b.n_rows());
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| (0..m).map(move |j| (i, j)))
            .collect();
        let mut k = self.fill_pairs(a, b, &pairs, encoder, n, m)?;
        k.clip(0.0, 1.0);
        Ok(k)
    }

    /// Fills the requested (i, j) cells of an n×m matrix, serving from the
    /// cache where possible and batching the rest into one backend call.
    fn fill_pairs(
        &mut self,
        a: &Matrix<f64>,
        b: &Matrix<f64>,
        pairs: &[(usize, usize)],
        encoder: &EncoderConfig,
        n: usize,
        m: usize,
    ) -> Result<Matrix<f64>> {
        let started = Instant::now();
        let encoded_a: Vec<EncodingDescription> = (0..n)
            .map(|i| encode(a.row_slice(i), encoder))
            .collect::<Result<_>>()?;
        let encoded_b: Vec<EncodingDescription> = (0..m)
            .map(|j| encode(b.row_slice(j), encoder))
            .collect::<Result<_>>()?;

        // Invalid configurations fail even in degraded mode.
        if self.fell_back {
            return Ok(self.classical_matrix(a, b, pairs, n, m));
        }

        // Deduplicate against the memo cache first; only misses go out.
        let mut missing: Vec<(usize, usize, CacheKey)> = Vec::new();
        for &(i, j) in pairs {
            let key = CacheKey::new(a.row_slice(i), b.row_slice(j), encoder);
            if !self.cache.contains_key(&key) && !missing.iter().any(|(_, _, k)| *k == key) {
                missing.push((i, j, key));
            }
        }

        if !missing.is_empty() {
            let resamples = self.config.resamples.max(1);
            let mut batch = Vec::with_capacity(missing.len() * resamples);
            for &(i, j, _) in &missing {
                for _ in 0..resamples {
                    batch.push(EncodingPair {
                        left: &encoded_a[i],
                        right: &encoded_b[j],
                    });
                }
            }
            let values = match self.evaluate_with_retry(&batch, started) {
                Ok(values) => values,
                Err(err @ EntrelazarError::BackendUnavailable { .. }) => {
                    if self.config.classical_fallback {
                        // Degraded mode, latched for the rest of the run.
                        // The memo cache holds quantum values only, so it
                        // is dropped along with the backend.
                        self.fell_back = true;
                        self.cache.clear();
                        return Ok(self.classical_matrix(a, b, pairs, n, m));
                    }
                    return Err(err);
                }
                Err(err) => return Err(err),
            };
            if values.len() != batch.len() {
                return Err(EntrelazarError::shape_mismatch(
                    "backend batch result",
                    format!("{} values", batch.len()),
                    format!("{} values", values.len()),
                ));
            }
            for (idx, (_, _, key)) in missing.into_iter().enumerate() {
                let chunk = &values[idx * resamples..(idx + 1) * resamples];
                let mean = chunk.iter().sum::<f64>() / resamples as f64;
                self.cache.insert(key, mean);
            }
        }

        let mut k = Matrix::zeros(n, m);
        for &(i, j) in pairs {
            let key = CacheKey::new(a.row_slice(i), b.row_slice(j), encoder);
            let value = self.cache.get(&key).copied().unwrap_or(0.0);
            k.set(i, j, value);
        }
        Ok(k)
    }

    /// One batch evaluation with exponential backoff on transient failure.
    ///
    /// The run budget is checked before every attempt; an over-budget run
    /// fails rather than returning a partial matrix.
    fn evaluate_with_retry(
        &self,
        batch: &[EncodingPair<'_>],
        started: Instant,
    ) -> Result<Vec<f64>> {
        let mut attempts = 0usize;
        loop {
            if started.elapsed() >= self.config.run_budget {
                return Err(EntrelazarError::BackendUnavailable {
                    backend: self.backend.name().to_string(),
                    attempts,
                });
            }
            match self.backend.evaluate_batch(batch) {
                Ok(values) => return Ok(values),
                Err(EntrelazarError::BackendUnavailable { .. })
                    if attempts < self.config.max_retries =>
                {
                    let exp = u32::try_from(attempts.min(16)).unwrap_or(16);
                    std::thread::sleep(self.config.retry_backoff * 2u32.pow(exp));
                    attempts += 1;
                }
                Err(EntrelazarError::BackendUnavailable { backend, .. }) => {
                    return Err(EntrelazarError::BackendUnavailable {
                        backend,
                        attempts: attempts + 1,
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Classical degraded-mode similarity: RBF on the raw vectors with
    /// γ = 1/d. Values lie in (0, 1] so downstream range invariants hold.
    fn classical_matrix(
        &self,
        a: &Matrix<f64>,
        b: &Matrix<f64>,
        pairs: &[(usize, usize)],
        n: usize,
        m: usize,
    ) -> Matrix<f64> {
        let gamma = 1.0 / a.n_cols() as f64;
        let mut k = Matrix::zeros(n, m);
        for &(i, j) in pairs {
            let dist_sq: f64 = a
                .row_slice(i)
                .iter()
                .zip(b.row_slice(j))
                .map(|(u, v)| (u - v) * (u - v))
                .sum();
            k.set(i, j, (-gamma * dist_sq).exp());
        }
        k
    }
}
