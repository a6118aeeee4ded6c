//! Four pillars: the labelled primary form and the stem/branch row fallback.

use tracing::debug;

use super::{after_label, FieldExtractor};
use crate::report::accumulator::{Accumulator, Fragment};
use crate::report::record::FourPillars;
use crate::report::vocab::{is_branch, is_pillar, is_stem};

const FOUR_PILLARS_LABEL: &str = "四柱";

/// `四柱：甲子 乙丑 丙寅 丁卯 ...` -- the first four tokens after the label.
pub struct FourPillarsExtractor;

impl FieldExtractor for FourPillarsExtractor {
    fn name(&self) -> &'static str {
        "four_pillars"
    }

    fn extract(&self, line: &str, _acc: &Accumulator) -> Vec<Fragment> {
        let Some(rest) = after_label(line, FOUR_PILLARS_LABEL) else {
            return Vec::new();
        };
        let tokens: Vec<&str> = rest.split_whitespace().take(4).collect();
        if tokens.len() < 4 || !tokens.iter().all(|t| is_pillar(t)) {
            return Vec::new();
        }
        FourPillars::from_tokens(&tokens)
            .map(Fragment::FourPillars)
            .into_iter()
            .collect()
    }
}

/// Rebuild the pillars from an unlabelled stem row and branch row.
///
/// The last matching row of each kind is used. Returns `None` unless both
/// rows are present with exactly four symbols.
pub fn reconstruct_from_rows<'a, I>(lines: I) -> Option<FourPillars>
where
    I: Iterator<Item = &'a str> + Clone,
{
    let stems = lines.clone().filter_map(|l| symbol_row(l, is_stem)).last()?;
    let branches = lines.filter_map(|l| symbol_row(l, is_branch)).last()?;

    let pillars: Vec<String> = stems
        .iter()
        .zip(&branches)
        .map(|(s, b)| format!("{}{}", s, b))
        .collect();
    debug!("Reconstructed four pillars from rows: {:?}", pillars);
    FourPillars::from_tokens(&pillars)
}

/// A row of exactly four whitespace-separated single symbols accepted by `accept`.
fn symbol_row(line: &str, accept: fn(char) -> bool) -> Option<Vec<char>> {
    let mut symbols = Vec::with_capacity(4);
    for token in line.split_whitespace() {
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if accept(c) => symbols.push(c),
            _ => return None,
        }
    }
    (symbols.len() == 4).then_some(symbols)
}
