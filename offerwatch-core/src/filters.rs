use std::fmt;

use crate::error::WatchError;

/// Ordered, non-empty list of postal codes a watch is bound to.
///
/// Replaced wholesale on every change; equality is by value so that
/// re-submitting the active set can be recognised as a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterSet {
    tokens: Vec<String>,
}

impl FilterSet {
    pub fn new<I, S>(tokens: I) -> Result<Self, WatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        // Commas separate codes in the saved record, so split on them here
        // too; a set then reads back from disk exactly as it was applied.
        let tokens: Vec<String> = tokens
            .into_iter()
            .map(Into::into)
            .flat_map(|t| {
                t.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_owned)
                    .collect::<Vec<_>>()
            })
            .collect();
        if tokens.is_empty() {
            return Err(WatchError::EmptyFilters);
        }
        Ok(Self { tokens })
    }

    /// Whitespace separated tokens, as typed after a command.
    pub fn parse(line: &str) -> Result<Self, WatchError> {
        Self::new(line.split_whitespace())
    }

    /// Reads the comma joined form written by [`FilterSet::to_record`].
    /// A blank record means nothing was saved.
    pub fn from_record(record: &str) -> Option<Self> {
        Self::new(record.trim().split(',')).ok()
    }

    pub fn to_record(&self) -> String {
        self.tokens.join(",")
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

}

impl fmt::Display for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(", "))
    }
}
