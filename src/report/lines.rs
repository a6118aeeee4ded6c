//! Line scanner: splits engine output into trimmed lines.

/// A restartable view over the trimmed lines of a report.
///
/// Cloning is cheap and yields an independent cursor from the same position,
/// so several passes can walk the same text.
#[derive(Debug, Clone)]
pub struct ReportLines<'a> {
    inner: std::str::Lines<'a>,
}

impl<'a> ReportLines<'a> {
    /// Leading and trailing blank lines are dropped; blank lines in the
    /// middle of the report are kept as empty strings.
    pub fn new(text: &'a str) -> Self {
        Self {
            inner: text.trim().lines(),
        }
    }
}

impl<'a> Iterator for ReportLines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(str::trim)
    }
}
