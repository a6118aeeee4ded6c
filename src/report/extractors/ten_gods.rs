//! Ten-gods row: a line made up solely of ten-god tokens.

use super::FieldExtractor;
use crate::report::accumulator::{Accumulator, Fragment};
use crate::report::vocab::is_ten_god;

const MIN_TOKENS: usize = 3;
const MAX_TOKENS: usize = 8;

pub struct TenGodsExtractor;

impl FieldExtractor for TenGodsExtractor {
    fn name(&self) -> &'static str {
        "ten_gods"
    }

    fn extract(&self, line: &str, _acc: &Accumulator) -> Vec<Fragment> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if !(MIN_TOKENS..=MAX_TOKENS).contains(&tokens.len())
            || !tokens.iter().all(|t| is_ten_god(t))
        {
            return Vec::new();
        }
        vec![Fragment::TenGods(
            tokens.into_iter().map(str::to_string).collect(),
        )]
    }
}
