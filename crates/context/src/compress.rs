//! Section-preserving compression of structured context.
//!
//! Keeps whole sections while they fit, truncates the first section that
//! does not (if enough budget is left to be worth it), and drops everything
//! after it. The running total is an exact [`TokenTally`], so the result is
//! always within budget and compressing it again is a no-op.

use tracing::{debug, info};

use crate::structure::SECTION_SEPARATOR;
use crate::token::{TokenTally, estimate_tokens};

/// Minimum remaining budget, in tokens, for a partial section to be kept.
pub const MIN_TRUNCATION_TOKENS: usize = 50;

/// Appended to a truncated section.
pub const TRUNCATION_MARKER: &str = "\n[... content truncated ...]";

/// Compress `text` to at most `max_tokens` estimated tokens.
///
/// Returns `text` unchanged when it already fits.
pub fn compress(text: &str, max_tokens: usize) -> String {
    let before = estimate_tokens(text);
    if before <= max_tokens {
        return text.to_string();
    }

    info!(tokens = before, max_tokens, "Context over budget, compressing");

    let mut kept: Vec<String> = Vec::new();
    let mut total = TokenTally::default();

    for section in text.split(SECTION_SEPARATOR) {
        let tally = TokenTally::of(section);
        if (total + tally).tokens() <= max_tokens {
            kept.push(section.to_string());
            total += tally;
            continue;
        }

        let remaining = max_tokens - total.tokens();
        if remaining > MIN_TRUNCATION_TOKENS {
            kept.push(truncate_section(section, tally, total, max_tokens, remaining));
        } else {
            debug!(remaining, "Dropped section that no longer fits");
        }
        break;
    }

    let compressed = kept.join(SECTION_SEPARATOR);
    info!(
        before,
        after = estimate_tokens(&compressed),
        sections = kept.len(),
        "Compression complete"
    );
    compressed
}

/// Cut `section` to roughly `remaining` tokens and append the marker.
///
/// The first cut is proportional (`remaining × chars / tokens`); it is then
/// tightened until `total` plus the marked section fits `max_tokens`.
fn truncate_section(
    section: &str,
    tally: TokenTally,
    total: TokenTally,
    max_tokens: usize,
    remaining: usize,
) -> String {
    let chars = section.chars().count();
    let chars_per_token = chars as f64 / tally.tokens().max(1) as f64;
    let mut keep = ((remaining as f64 * chars_per_token) as usize).min(chars);

    loop {
        let candidate = format!("{}{TRUNCATION_MARKER}", char_prefix(section, keep).trim_end());
        if (total + TokenTally::of(&candidate)).tokens() <= max_tokens || keep == 0 {
            debug!(kept_chars = keep, of = chars, "Truncated section");
            return candidate;
        }
        keep = keep.saturating_sub((keep / 10).max(1));
    }
}

/// The first `n` characters of `text`, cut on a char boundary.
fn char_prefix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
