use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};

use crate::core::{AppError, Result};

/// Document families that carry human-readable sequential numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFamily {
    Sale,
    Invoice,
}

impl DocumentFamily {
    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentFamily::Sale => "SAL",
            DocumentFamily::Invoice => "INV",
        }
    }
}

/// Lookup port for the highest persisted number of a family.
///
/// Implemented by the sale and invoice repositories over their own number
/// columns. "Highest" is lexicographic, which matches numeric order because
/// sequences are zero-padded.
#[async_trait]
pub trait NumberSource: Send + Sync {
    async fn latest_number(&self, prefix: &str) -> Result<Option<String>>;
}

/// Attempts a caller makes at generate-and-insert before giving up.
///
/// Reading the current maximum and inserting the successor are separate
/// steps, so two concurrent requests can compute the same number. The
/// number columns carry unique indexes; on a `Conflict` the caller
/// regenerates (seeing the winner's insert) and retries.
pub const MAX_NUMBER_ATTEMPTS: u32 = 3;

/// Exponential backoff before retrying a collided number insert.
pub fn collision_backoff(attempt: u32) -> Duration {
    Duration::from_millis(10u64 << attempt.min(6))
}

/// Produces the next number in a per-month sequence, rendered as
/// `PREFIX-YYYYMM-NNNN`.
pub struct SequenceGenerator;

impl SequenceGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Next number for `family` at instant `at`.
    ///
    /// Inspects the highest existing number with this month's prefix and
    /// increments its trailing integer; a fresh month starts at 1.
    pub async fn next_number<S>(
        &self,
        source: &S,
        family: DocumentFamily,
        at: DateTime<Utc>,
    ) -> Result<String>
    where
        S: NumberSource + ?Sized,
    {
        let prefix = Self::month_prefix(family, at);
        let latest = source.latest_number(&prefix).await?;

        let next_seq = match latest {
            Some(number) => Self::parse_sequence(&number)? + 1,
            None => 1,
        };

        Ok(format!("{}{:04}", prefix, next_seq))
    }

    /// `PREFIX-YYYYMM-` part shared by all numbers of a family in a month.
    pub fn month_prefix(family: DocumentFamily, at: DateTime<Utc>) -> String {
        format!("{}-{:04}{:02}-", family.prefix(), at.year(), at.month())
    }

    /// Trailing integer of an existing document number.
    fn parse_sequence(number: &str) -> Result<u32> {
        let tail = number
            .rsplit('-')
            .next()
            .ok_or_else(|| AppError::internal(format!("Malformed document number: {}", number)))?;

        tail.parse::<u32>().map_err(|_| {
            AppError::internal(format!("Malformed document number sequence: {}", number))
        })
    }
}

impl Default for SequenceGenerator {
    fn default() -> Self {
        Self::new()
    }
}
