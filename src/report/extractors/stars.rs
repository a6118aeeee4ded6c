//! Spiritual stars (神煞).

use super::FieldExtractor;
use crate::report::accumulator::{Accumulator, Fragment};
use crate::report::vocab::SPIRITUAL_STARS;

/// Every known star name on the line. A `神煞` marker line without any
/// known name contributes nothing.
pub struct SpiritualStarsExtractor;

impl FieldExtractor for SpiritualStarsExtractor {
    fn name(&self) -> &'static str {
        "spiritual_stars"
    }

    fn extract(&self, line: &str, _acc: &Accumulator) -> Vec<Fragment> {
        SPIRITUAL_STARS
            .iter()
            .filter(|star| line.contains(**star))
            .map(|star| Fragment::SpiritualStar(star.to_string()))
            .collect()
    }
}
