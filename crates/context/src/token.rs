//! Token estimation utilities.
//!
//! Uses a mixed-script heuristic: each CJK ideograph counts as one token and
//! each whitespace-delimited word as 1.3 tokens, floored. Every pipeline stage
//! (selection, compression, reporting) uses this one estimator, so budget
//! checks made in one stage hold in the next.
//!
//! The 1.3 factor is applied in integer arithmetic (`words * 13 / 10`) so the
//! floor is exact and never drifts with floating-point error.

use std::ops::{Add, AddAssign};

/// Estimate the token count for a string.
pub fn estimate_tokens(text: &str) -> usize {
    TokenTally::of(text).tokens()
}

fn is_cjk_ideograph(ch: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&ch)
}

/// Raw counts behind an estimate.
///
/// Tallies add exactly across texts joined by whitespace, whereas floored
/// estimates do not (`1 + 1 != floor(2.6)`). Use a tally whenever a running
/// total must match the estimate of the concatenated text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenTally {
    pub cjk_chars: usize,
    pub words: usize,
}

impl TokenTally {
    pub fn of(text: &str) -> Self {
        Self {
            cjk_chars: text.chars().filter(|c| is_cjk_ideograph(*c)).count(),
            words: text.split_whitespace().count(),
        }
    }

    pub fn tokens(&self) -> usize {
        self.cjk_chars + self.words * 13 / 10
    }
}

impl Add for TokenTally {
    type Output = TokenTally;

    fn add(self, rhs: Self) -> Self::Output {
        TokenTally {
            cjk_chars: self.cjk_chars + rhs.cjk_chars,
            words: self.words + rhs.words,
        }
    }
}

impl AddAssign for TokenTally {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
