//! Budgeted packet selection.
//!
//! # Algorithm
//!
//! 1. Partition into pinned (system instructions) and scorable packets
//! 2. Pinned packets claim their tokens first; if nothing remains, return them alone
//! 3. Score the rest, dropping any whose relevance is below `min_relevance`
//! 4. Stable-sort by combined score, descending (first-gathered wins ties)
//! 5. Accept in rank order until the first packet that would overflow, then stop
//!
//! Step 5 is a greedy approximation of budgeted knapsack: once a packet is
//! rejected, smaller lower-ranked packets are never considered.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tessera_config::ContextConfig;
use tracing::{debug, warn};

use crate::packet::ContextPacket;
use crate::score;

/// The outcome of selection: pinned packets first, then accepted packets in
/// rank order.
#[derive(Debug, Clone)]
pub struct Selection {
    pub packets: Vec<ContextPacket>,
    pub stats: SelectionStats,
}

impl Selection {
    pub fn total_tokens(&self) -> usize {
        self.packets.iter().map(|p| p.token_count()).sum()
    }
}

/// Bookkeeping about a single selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionStats {
    /// Packets offered to the selector.
    pub candidates: usize,
    /// Pinned packets kept unconditionally.
    pub pinned: usize,
    /// Tokens claimed by pinned packets.
    pub pinned_tokens: usize,
    /// Scorable packets dropped for low relevance.
    pub below_relevance: usize,
    /// Ranked packets not accepted because the budget ran out.
    pub over_budget: usize,
    /// Total tokens of the selection.
    pub tokens_used: usize,
    /// Token budget the selection was made against.
    pub budget: usize,
    /// Pinned content alone filled the budget.
    pub pinned_only: bool,
}

/// Select packets that fit `available_tokens`.
///
/// The token sum of the result never exceeds `available_tokens`, except when
/// pinned content alone already does; then only the pinned packets are
/// returned.
pub fn select(
    packets: Vec<ContextPacket>,
    query: &str,
    available_tokens: usize,
    config: &ContextConfig,
    now: DateTime<Utc>,
) -> Selection {
    let candidates = packets.len();
    let (pinned, others): (Vec<_>, Vec<_>) = packets.into_iter().partition(|p| p.is_pinned());

    let pinned_tokens: usize = pinned.iter().map(|p| p.token_count()).sum();
    let mut stats = SelectionStats {
        candidates,
        pinned: pinned.len(),
        pinned_tokens,
        budget: available_tokens,
        ..SelectionStats::default()
    };

    if pinned_tokens > config.pinned_reserve() {
        warn!(
            pinned_tokens,
            reserve = config.pinned_reserve(),
            "Pinned content exceeds its reserved share"
        );
    }

    if pinned_tokens >= available_tokens {
        warn!(
            pinned_tokens,
            available_tokens, "Pinned instructions exhausted the token budget"
        );
        stats.pinned_only = true;
        stats.tokens_used = pinned_tokens;
        return Selection {
            packets: pinned,
            stats,
        };
    }

    let mut ranked: Vec<(f64, ContextPacket)> = Vec::with_capacity(others.len());
    for packet in others {
        let scores = score::score_packet(&packet, query, now);
        if scores.relevance < config.min_relevance() {
            stats.below_relevance += 1;
            continue;
        }
        let combined = scores.combined(config.relevance_weight(), config.recency_weight());
        ranked.push((combined, packet.with_relevance(scores.relevance)));
    }

    // `sort_by` is stable, so equal scores keep gather order.
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut selected = pinned;
    let mut used = pinned_tokens;
    let ranked_len = ranked.len();
    for (accepted, (_, packet)) in ranked.into_iter().enumerate() {
        if used + packet.token_count() > available_tokens {
            stats.over_budget = ranked_len - accepted;
            break;
        }
        used += packet.token_count();
        selected.push(packet);
    }

    stats.tokens_used = used;
    debug!(
        selected = selected.len(),
        tokens = used,
        budget = available_tokens,
        dropped_relevance = stats.below_relevance,
        dropped_budget = stats.over_budget,
        "Selected context packets"
    );

    Selection {
        packets: selected,
        stats,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
