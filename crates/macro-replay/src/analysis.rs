//! Statistics and optimisation hints for a recorded event sequence.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::event::{EventKind, MacroEvent};

/// Shortest kind sequence reported as a pattern.
pub const MIN_PATTERN_LENGTH: usize = 3;

/// Most patterns reported by [`analyze`].
pub const MAX_PATTERNS: usize = 5;

/// Share of pointer moves above which a recording counts as move-heavy.
const POINTER_MOVE_SHARE: f64 = 0.7;

/// Average gap in milliseconds below which a recording counts as fast.
const FAST_GAP_MS: f64 = 10.0;

/// A kind sequence immediately followed by a copy of itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepeatedPattern {
    /// The repeated kinds.
    pub kinds: Vec<EventKind>,
    /// Number of events in one repetition.
    pub length: usize,
    /// Index of the first event of the first repetition.
    pub start_index: usize,
    /// Back-to-back repetitions found.
    pub repetitions: usize,
}

/// Result of [`analyze`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MacroAnalysis {
    /// Number of events.
    pub total_events: usize,
    /// Event count per kind name.
    pub kind_counts: BTreeMap<String, usize>,
    /// Up to [`MAX_PATTERNS`] repeated sequences.
    pub patterns: Vec<RepeatedPattern>,
    /// Human-readable suggestions.
    pub suggestions: Vec<String>,
    /// Timestamp of the last event.
    pub duration_ms: f64,
}

/// Analyze an event sequence.
#[must_use]
pub fn analyze(events: &[MacroEvent]) -> MacroAnalysis {
    let Some(last) = events.last() else {
        return MacroAnalysis::default();
    };

    let mut kind_counts = BTreeMap::new();
    for event in events {
        *kind_counts.entry(event.kind.name().to_string()).or_insert(0) += 1;
    }

    let patterns = detect_patterns(events);
    let suggestions = suggestions(events, &kind_counts, &patterns);

    MacroAnalysis {
        total_events: events.len(),
        kind_counts,
        patterns,
        suggestions,
        duration_ms: last.timestamp,
    }
}

fn detect_patterns(events: &[MacroEvent]) -> Vec<RepeatedPattern> {
    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
    let n = kinds.len();
    let mut patterns = Vec::new();

    for length in MIN_PATTERN_LENGTH..n / 2 {
        for start in 0..n - 2 * length {
            let first = &kinds[start..start + length];
            let second = &kinds[start + length..start + 2 * length];
            if first == second {
                patterns.push(RepeatedPattern {
                    kinds: first.to_vec(),
                    length,
                    start_index: start,
                    repetitions: 2,
                });
                if patterns.len() == MAX_PATTERNS {
                    return patterns;
                }
            }
        }
    }

    patterns
}

fn suggestions(
    events: &[MacroEvent],
    kind_counts: &BTreeMap<String, usize>,
    patterns: &[RepeatedPattern],
) -> Vec<String> {
    let mut out = Vec::new();
    let total = events.len() as f64;

    let moves = kind_counts
        .get(EventKind::PointerMove.name())
        .copied()
        .unwrap_or(0);
    if moves as f64 > total * POINTER_MOVE_SHARE {
        out.push(
            "High number of pointer movements. Consider reducing recording sensitivity."
                .to_string(),
        );
    }

    if !patterns.is_empty() {
        out.push(format!(
            "Detected {} repetitive patterns. Consider using loops.",
            patterns.len()
        ));
    }

    if events.len() > 1 {
        let span: f64 = events
            .windows(2)
            .map(|pair| pair[1].timestamp - pair[0].timestamp)
            .sum();
        let average_gap = span / (events.len() - 1) as f64;
        if average_gap < FAST_GAP_MS {
            out.push("Very fast macro. Consider adding delays for reliability.".to_string());
        }
    }

    out
}
