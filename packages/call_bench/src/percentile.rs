use std::fmt::{self, Display};
use std::num::NonZero;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A requested percentile, interpreted against a base that grows with the number of digits.
///
/// Values below 100 are ordinary percentiles against a base of 100. Values with three or more
/// digits encode extra significant digits: the base is multiplied by 10 for every decimal digit
/// of `value / 100`, so `100` means 100 per 1000 (the 10th percentile), `999` means 999 per 1000
/// (the 99.9th percentile) and `9999` means 9999 per 10000 (the 99.99th percentile).
///
/// Negative inputs are clamped to 0 instead of being rejected, so a single bad request never
/// fails a whole run.
///
/// # Examples
///
/// ```
/// use call_bench::Percentile;
///
/// let p999 = Percentile::new(999);
/// assert_eq!(p999.base(), 1000);
/// assert_eq!(p999.label(), "TP999");
///
/// assert_eq!(Percentile::new(-5).value(), 0);
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
#[serde(from = "i64", into = "u32")]
pub struct Percentile(u32);

impl Percentile {
    /// The median.
    pub const P50: Self = Self(50);

    /// The 99th percentile.
    pub const P99: Self = Self(99);

    /// The 99.9th percentile, expressed against a base of 1000.
    pub const P999: Self = Self(999);

    /// Creates a percentile from an arbitrary integer, clamping it into the valid range.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(u32::try_from(value.max(0)).unwrap_or(u32::MAX))
    }

    /// The value as requested, after clamping.
    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }

    /// The scale against which [`value()`][Self::value] is interpreted (100, 1000, ...).
    #[must_use]
    pub fn base(self) -> u64 {
        if self.0 < 100 {
            return 100;
        }

        let mut base: u64 = 100;
        let mut shift = self.0 / 100;

        while shift > 0 {
            base = base.saturating_mul(10);
            shift /= 10;
        }

        base
    }

    /// The nearest-rank index of this percentile in an ascending sample set of the given size.
    ///
    /// The index is `floor(value * sample_count / base)`, clamped to the last sample.
    #[must_use]
    pub fn rank(self, sample_count: NonZero<usize>) -> usize {
        let last = sample_count.get().saturating_sub(1);

        let scaled = u128::from(self.0).saturating_mul(sample_count.get() as u128);

        #[expect(
            clippy::integer_division,
            reason = "nearest-rank estimator floors by definition"
        )]
        let index = scaled
            .checked_div(u128::from(self.base()))
            .expect("base is never zero");

        usize::try_from(index).unwrap_or(usize::MAX).min(last)
    }

    /// The label used for this percentile in reports, e.g. `TP99` or `TP999`.
    #[must_use]
    pub fn label(self) -> String {
        format!("TP{}", self.0)
    }
}

impl Display for Percentile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Percentile {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<Percentile> for u32 {
    fn from(value: Percentile) -> Self {
        value.0
    }
}

impl FromStr for Percentile {
    type Err = Error;

    /// Parses `99`, `p99` or `TP99` (case-insensitive). Negative values are clamped to 0.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();

        let digits = lower
            .strip_prefix("tp")
            .or_else(|| lower.strip_prefix('p'))
            .unwrap_or(&lower);

        digits
            .parse::<i64>()
            .map(Self::new)
            .map_err(|_parse_error| Error::InvalidPercentile {
                invalid_value: trimmed.to_string(),
            })
    }
}

/// The percentiles reported when the caller does not ask for specific ones.
pub const DEFAULT_PERCENTILES: [Percentile; 3] = [Percentile(50), Percentile(90), Percentile(99)];
