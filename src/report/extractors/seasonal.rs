//! Seasonal adjustment (调候) and the substitute-decade variant (金不换).

use std::sync::LazyLock;

use regex::Regex;

use super::{after_label, FieldExtractor};
use crate::report::accumulator::{Accumulator, Fragment};
use crate::report::record::{PriorityEntry, SeasonalAdjustment};
use crate::report::vocab::{char_class, STEMS};

const SEASONAL_LABEL: &str = "调候";
const JINBUHUAN_LABEL: &str = "金不换";
const DECADE_SUFFIX: &str = "大运";

static PRIORITY_RE: LazyLock<Regex> = LazyLock::new(|| stem_run_after(r"(\d)"));
static FAVORABLE_RE: LazyLock<Regex> = LazyLock::new(|| stem_run_after("喜"));
static UNFAVORABLE_RE: LazyLock<Regex> = LazyLock::new(|| stem_run_after("忌"));

/// `prefix` followed by a captured run of stems.
fn stem_run_after(prefix: &str) -> Regex {
    Regex::new(&format!("{}({}+)", prefix, char_class(&STEMS))).expect("valid regex")
}

/// Splits a line at the `金不换` label: text before it is the primary
/// seasonal adjustment, text after it the substitute-decade one.
pub struct SeasonalExtractor;

impl FieldExtractor for SeasonalExtractor {
    fn name(&self) -> &'static str {
        "seasonal_adjustment"
    }

    fn extract(&self, line: &str, _acc: &Accumulator) -> Vec<Fragment> {
        let (head, tail) = match line.split_once(JINBUHUAN_LABEL) {
            Some((head, tail)) => (head, Some(tail)),
            None => (line, None),
        };

        let mut fragments = Vec::new();
        if let Some(seasonal) = after_label(head, SEASONAL_LABEL).and_then(parse_seasonal) {
            fragments.push(Fragment::Seasonal(seasonal));
        }
        if let Some(seasonal) = tail.and_then(|t| parse_seasonal(jinbuhuan_body(t))) {
            fragments.push(Fragment::JinbuhuanSeasonal(seasonal));
        }
        fragments
    }
}

/// Body of the substitute-decade section, past its own labels.
fn jinbuhuan_body(tail: &str) -> &str {
    let tail = tail.trim_start();
    let tail = tail.strip_prefix(DECADE_SUFFIX).unwrap_or(tail);
    let tail = if tail.contains(SEASONAL_LABEL) {
        after_label(tail, SEASONAL_LABEL).unwrap_or(tail)
    } else {
        tail
    };
    tail.trim_start_matches([':', '：']).trim()
}

/// Parse `1壬2丙戊3丁 喜丙 忌癸` style text. `None` when nothing is there.
pub fn parse_seasonal(text: &str) -> Option<SeasonalAdjustment> {
    let description = text.trim().trim_end_matches(['#', ' ', '\t']).trim();
    if description.is_empty() {
        return None;
    }

    let mut seasonal = SeasonalAdjustment {
        description: description.to_string(),
        ..Default::default()
    };

    for cap in PRIORITY_RE.captures_iter(description) {
        let Ok(priority) = cap[1].parse::<u32>() else {
            continue;
        };
        for god in cap[2].chars() {
            seasonal.priority_order.push(PriorityEntry { priority, god });
            if !seasonal.adjustment_gods.contains(&god) {
                seasonal.adjustment_gods.push(god);
            }
        }
    }

    seasonal.favorable_gods = stems_after(&FAVORABLE_RE, description);
    seasonal.unfavorable_gods = stems_after(&UNFAVORABLE_RE, description);

    if seasonal.priority_order.is_empty() && !seasonal.favorable_gods.is_empty() {
        seasonal.adjustment_gods = seasonal.favorable_gods.clone();
    }

    Some(seasonal)
}

fn stems_after(re: &Regex, text: &str) -> Vec<char> {
    re.captures_iter(text)
        .flat_map(|cap| cap[1].chars().collect::<Vec<_>>())
        .collect()
}
