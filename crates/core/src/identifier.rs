//! SKU, product-number, and barcode generation.
//!
//! Candidates are produced by pure functions; uniqueness is checked through
//! the [`IdentifierLookup`] seam so the same bounded-retry loop serves the
//! database-backed import path and in-memory tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;

use async_trait::async_trait;
use rand::Rng;
use regex::Regex;

use crate::product::MAX_IDENTIFIER_LENGTH;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default SKU pattern. Each run of zeros becomes random digits of equal width.
pub const DEFAULT_SKU_PATTERN: &str = "PROD000000";

/// Pattern for system-assigned product numbers.
pub const PRODUCT_NUMBER_PATTERN: &str = "PN0000000000";

/// Width of the random suffix appended when a pattern has no zero-run.
pub const SUFFIX_WIDTH: usize = 6;

/// Default cap on uniqueness retries before falling back.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1_000;

/// Random digits appended to the Unix timestamp in a barcode.
pub const BARCODE_RANDOM_WIDTH: usize = 3;

static ZERO_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("0+").expect("valid regex"));

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("valid regex"));

static FALLBACK_SEQ: AtomicU64 = AtomicU64::new(0);

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

/// A pattern with zero-runs to fill, plus an optional prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierPattern {
    pattern: String,
    prefix: String,
}

impl IdentifierPattern {
    pub fn new(pattern: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            prefix: prefix.into(),
        }
    }

    /// The default SKU pattern with no prefix.
    pub fn default_sku() -> Self {
        Self::new(DEFAULT_SKU_PATTERN, "")
    }

    /// The product-number pattern.
    pub fn product_number() -> Self {
        Self::new(PRODUCT_NUMBER_PATTERN, "")
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Produce one candidate using the thread-local RNG.
    pub fn candidate(&self) -> String {
        self.candidate_with(&mut rand::rng())
    }

    /// Produce one candidate using the given RNG.
    pub fn candidate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let body = if ZERO_RUN_RE.is_match(&self.pattern) {
            ZERO_RUN_RE
                .replace_all(&self.pattern, |caps: &regex::Captures<'_>| {
                    random_digits(rng, caps[0].len())
                })
                .into_owned()
        } else {
            format!("{}{}", self.pattern, random_digits(rng, SUFFIX_WIDTH))
        };
        format!("{}{body}", self.prefix)
    }
}

impl Default for IdentifierPattern {
    fn default() -> Self {
        Self::default_sku()
    }
}

/// Zero-padded random numeral of exactly `width` digits.
fn random_digits<R: Rng + ?Sized>(rng: &mut R, width: usize) -> String {
    (0..width)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Barcode candidate: current Unix timestamp followed by three random digits.
///
/// Collision resistance is low by nature; barcodes are advisory.
pub fn barcode_candidate() -> String {
    let mut rng = rand::rng();
    format!(
        "{}{}",
        chrono::Utc::now().timestamp(),
        random_digits(&mut rng, BARCODE_RANDOM_WIDTH)
    )
}

/// Deterministic disambiguator used once retries are exhausted.
///
/// Millisecond timestamp plus a process-wide sequence number, so two
/// fallbacks from the same process never coincide.
pub fn fallback_identifier(candidate: &str) -> String {
    let seq = FALLBACK_SEQ.fetch_add(1, Ordering::Relaxed);
    format!(
        "{candidate}-{}{seq:04}",
        chrono::Utc::now().timestamp_millis()
    )
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check a caller-supplied SKU or barcode: allowed characters are letters,
/// digits, hyphen, underscore, and dot.
pub fn validate_identifier(label: &str, value: &str) -> Result<(), String> {
    if value.len() > MAX_IDENTIFIER_LENGTH {
        return Err(format!(
            "{label} exceeds maximum length of {MAX_IDENTIFIER_LENGTH} characters"
        ));
    }
    if !IDENTIFIER_RE.is_match(value) {
        return Err(format!(
            "{label} may only contain letters, digits, hyphens, underscores, and dots"
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Bounded uniqueness loop
// ---------------------------------------------------------------------------

/// Answers "is this identifier already in use?".
#[async_trait]
pub trait IdentifierLookup: Send {
    type Error: Send;

    async fn is_taken(&mut self, candidate: &str) -> Result<bool, Self::Error>;
}

/// A generated identifier and how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedIdentifier {
    pub value: String,
    /// Number of candidates checked.
    pub attempts: u32,
    /// `true` when the retry cap was hit and the fallback suffix was used.
    pub used_fallback: bool,
}

/// Draw candidates until one is free, at most `max_attempts` times, then fall
/// back to [`fallback_identifier`]. Always terminates.
pub async fn generate_unique<L, F>(
    mut next_candidate: F,
    max_attempts: u32,
    lookup: &mut L,
) -> Result<GeneratedIdentifier, L::Error>
where
    L: IdentifierLookup + ?Sized,
    F: FnMut() -> String + Send,
{
    let mut last = String::new();
    for attempt in 1..=max_attempts.max(1) {
        let candidate = next_candidate();
        if !lookup.is_taken(&candidate).await? {
            return Ok(GeneratedIdentifier {
                value: candidate,
                attempts: attempt,
                used_fallback: false,
            });
        }
        last = candidate;
    }

    Ok(GeneratedIdentifier {
        value: fallback_identifier(&last),
        attempts: max_attempts.max(1),
        used_fallback: true,
    })
}
