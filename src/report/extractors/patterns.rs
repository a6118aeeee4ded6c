//! Pattern selection (格局选用).

use super::{after_label, FieldExtractor};
use crate::report::accumulator::{Accumulator, Fragment};
use crate::report::record::{PatternAnalysis, PatternQuality};

const PATTERN_LABEL: &str = "格局选用";
const SEGMENT_DELIMITERS: [char; 2] = ['：', '；'];
const FAVORABLE_MARKER: char = '喜';
const UNFAVORABLE_MARKER: char = '忌';

pub struct PatternExtractor;

impl FieldExtractor for PatternExtractor {
    fn name(&self) -> &'static str {
        "patterns"
    }

    fn extract(&self, line: &str, _acc: &Accumulator) -> Vec<Fragment> {
        let Some(rest) = after_label(line, PATTERN_LABEL) else {
            return Vec::new();
        };
        parse_patterns(rest)
            .map(Fragment::Patterns)
            .into_iter()
            .collect()
    }
}

/// Parse the text following the pattern label.
fn parse_patterns(text: &str) -> Option<PatternAnalysis> {
    let mut segments = text
        .split(SEGMENT_DELIMITERS)
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let mut analysis = PatternAnalysis {
        primary_pattern: segments.next()?.to_string(),
        ..Default::default()
    };

    for segment in segments {
        if let Some(quality) = quality_of(segment) {
            analysis.pattern_quality = analysis.pattern_quality.max(quality);
        } else if !segment.contains([FAVORABLE_MARKER, UNFAVORABLE_MARKER]) {
            analysis.secondary_patterns.push(segment.to_string());
        }
    }

    analysis.favorable_elements = marker_span(text, FAVORABLE_MARKER, UNFAVORABLE_MARKER);
    analysis.unfavorable_elements = marker_span(text, UNFAVORABLE_MARKER, FAVORABLE_MARKER);

    Some(analysis)
}

fn quality_of(segment: &str) -> Option<PatternQuality> {
    if segment.contains("最佳") {
        Some(PatternQuality::Best)
    } else if segment.contains('佳') {
        Some(PatternQuality::Good)
    } else {
        None
    }
}

/// Characters after `marker` up to `stop` (or end of text), one token each.
fn marker_span(text: &str, marker: char, stop: char) -> Vec<String> {
    let Some((_, after)) = text.split_once(marker) else {
        return Vec::new();
    };
    after
        .split(stop)
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace() && !is_punctuation(*c))
        .map(|c| c.to_string())
        .collect()
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || matches!(c, '：' | '；' | '，' | '、' | '。')
}
