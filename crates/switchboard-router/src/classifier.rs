// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic request complexity classification.
//!
//! Classifies user prompts into Simple/Moderate/Complex tiers using
//! zero-cost heuristic rules. No LLM pre-call, no network, no latency.
//! Deterministic: identical input always yields the identical tier.

use switchboard_core::ComplexityTier;

/// Result of classifying a request's complexity.
#[derive(Debug, Clone)]
pub struct Classification {
    /// The classified complexity tier.
    pub tier: ComplexityTier,
    /// Confidence in the classification (0.0-1.0).
    pub confidence: f32,
    /// Human-readable reason for the classification.
    pub reason: &'static str,
}

/// Trivial exchange patterns (exact match, case-insensitive).
const SIMPLE_EXACT: &[&str] = &[
    "hi", "hello", "hey", "thanks", "thank you", "bye", "ok", "okay",
    "yes", "no", "sure", "good", "great", "cool", "nice", "got it",
    "yep", "nope", "yeah", "nah", "sounds good",
];

/// Short factual question patterns (contains, case-insensitive).
const SIMPLE_QUESTIONS: &[&str] = &[
    "what time", "what day", "what date", "how are you",
    "what's up", "who are you", "what's your name",
    "what is the time", "what is the date",
];

/// Complex work indicator patterns (contains, case-insensitive).
const COMPLEX_INDICATORS: &[&str] = &[
    "analyze", "compare", "evaluate", "implement", "design",
    "architecture", "trade-off", "tradeoff", "pros and cons",
    "step by step", "explain in detail", "debug", "refactor",
    "code review", "write a function", "write code", "write a program",
    "optimize", "algorithm", "strategy", "in depth", "comprehensive",
];

/// Heuristic complexity classifier with zero cost and zero latency.
pub struct Classifier {
    /// Confidence threshold below which a classification is treated as
    /// uncertain and defaults to Moderate.
    confidence_threshold: f32,
}

impl Classifier {
    /// Create a classifier with the given confidence threshold.
    pub fn new(confidence_threshold: f32) -> Self {
        Self {
            confidence_threshold,
        }
    }

    /// Classify a prompt's complexity using heuristic signals.
    ///
    /// An explicit `hint` overrides scoring entirely. Without one, when the
    /// scored confidence falls below the threshold the result defaults to
    /// [`ComplexityTier::Moderate`] -- uncertainty is non-fatal by design.
    pub fn classify(&self, user_prompt: &str, hint: Option<ComplexityTier>) -> Classification {
        if let Some(tier) = hint {
            return Classification {
                tier,
                confidence: 1.0,
                reason: "explicit complexity hint",
            };
        }

        let trimmed = user_prompt.trim();
        if trimmed.is_empty() {
            return Classification {
                tier: ComplexityTier::Simple,
                confidence: 1.0,
                reason: "empty prompt",
            };
        }

        let mut score: i32 = 0;
        let lower = trimmed.to_lowercase();

        // Signal 1: Prompt length
        let word_count = trimmed.split_whitespace().count();
        score += Self::length_score(word_count);

        // Signal 2: Trivial exchange exact match
        if SIMPLE_EXACT.iter().any(|p| lower == *p) {
            score -= 3;
        }

        // Signal 3: Short factual question patterns
        if SIMPLE_QUESTIONS.iter().any(|q| lower.contains(q)) {
            score -= 2;
        }

        // Signal 4: Complex work indicators
        if COMPLEX_INDICATORS.iter().any(|c| lower.contains(c)) {
            score += 2;
        }

        // Signal 5: Code blocks
        if trimmed.contains("```") {
            score += 3;
        }

        // Signal 6: Multi-sentence prompts
        if Self::count_sentences(trimmed) >= 3 {
            score += 1;
        }

        // Signal 7: Structured multi-part prompts (bullet or numbered lists)
        if Self::list_line_count(trimmed) >= 3 {
            score += 1;
        }

        let (tier, confidence, reason) = Self::score_to_tier(score);

        // Uncertain classifications default to the middle tier.
        if confidence < self.confidence_threshold && tier != ComplexityTier::Moderate {
            return Classification {
                tier: ComplexityTier::Moderate,
                confidence,
                reason: "low confidence, defaulting to moderate",
            };
        }

        Classification {
            tier,
            confidence,
            reason,
        }
    }

    fn length_score(word_count: usize) -> i32 {
        match word_count {
            0..=3 => -2,
            4..=15 => 0,
            16..=50 => 1,
            _ => 2,
        }
    }

    fn count_sentences(text: &str) -> usize {
        let mut count = 0;
        for c in text.chars() {
            if c == '.' || c == '?' || c == '!' {
                count += 1;
            }
        }
        // At least 1 sentence if there's text
        count.max(1)
    }

    fn list_line_count(text: &str) -> usize {
        text.lines()
            .map(str::trim_start)
            .filter(|line| {
                line.starts_with("- ")
                    || line.starts_with("* ")
                    || line
                        .split_once('.')
                        .is_some_and(|(head, _)| !head.is_empty() && head.chars().all(|c| c.is_ascii_digit()))
            })
            .count()
    }

    fn score_to_tier(score: i32) -> (ComplexityTier, f32, &'static str) {
        if score <= -2 {
            let confidence = ((-score) as f32 / 5.0).min(1.0);
            (ComplexityTier::Simple, confidence, "simple request indicators")
        } else if score >= 2 {
            let confidence = (score as f32 / 5.0).min(1.0);
            (ComplexityTier::Complex, confidence, "complex request indicators")
        } else {
            let confidence = 1.0 - (score.unsigned_abs() as f32 / 3.0);
            (ComplexityTier::Moderate, confidence, "moderate complexity")
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(0.4)
    }
}
