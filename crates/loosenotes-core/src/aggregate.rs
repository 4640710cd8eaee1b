//! Rating aggregate: the cached `(average, count)` pair stored on a note.
//!
//! The average is the arithmetic mean of integer star values rounded to one
//! decimal place with round-half-to-even. The rounding is done on integers
//! (sum * 10 / count) so the result never depends on binary float
//! representation: a mean of exactly 2.25 always rounds to 2.2 and 2.35 to 2.4.

use serde::{Deserialize, Serialize};

/// Cached rating summary for one note.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingAggregate {
    /// Rounded mean. Exactly `0.0` when `count == 0`, otherwise in `[1.0, 5.0]`.
    #[serde(rename = "average_rating")]
    pub average: f64,
    #[serde(rename = "rating_count")]
    pub count: u32,
}

impl RatingAggregate {
    /// The aggregate of a note with no ratings.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            average: 0.0,
            count: 0,
        }
    }

    /// Builds the aggregate from a sum of values and the number of ratings.
    ///
    /// This is the form the database path uses: `SUM(value)` and `COUNT(*)`
    /// come back from one query and are folded here.
    #[must_use]
    pub fn from_totals(sum: u64, count: u32) -> Self {
        if count == 0 {
            return Self::empty();
        }
        let tenths = round_half_even_tenths(sum, u64::from(count));
        Self {
            average: tenths as f64 / 10.0,
            count,
        }
    }

    /// Builds the aggregate from the individual rating values.
    #[must_use]
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let (sum, count) = values
            .into_iter()
            .fold((0u64, 0u32), |(sum, count), v| (sum + u64::from(v), count + 1));
        Self::from_totals(sum, count)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Default for RatingAggregate {
    fn default() -> Self {
        Self::empty()
    }
}

/// Returns `round_half_even(sum / count, 1) * 10` as an integer.
///
/// `count` must be non-zero.
#[must_use]
pub fn round_half_even_tenths(sum: u64, count: u64) -> u64 {
    debug_assert!(count > 0);
    let scaled = sum * 10;
    let quotient = scaled / count;
    let remainder = scaled % count;

    match (remainder * 2).cmp(&count) {
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Less => quotient,
        std::cmp::Ordering::Equal => quotient + (quotient & 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_is_zero() {
        let agg = RatingAggregate::from_values(std::iter::empty());
        assert_eq!(agg.average, 0.0);
        assert_eq!(agg.count, 0);
        assert!(agg.is_empty());
    }

    #[test]
    fn single_value() {
        let agg = RatingAggregate::from_values([4]);
        assert_eq!(agg.average, 4.0);
        assert_eq!(agg.count, 1);
    }

    #[test]
    fn mean_of_two_and_four() {
        let agg = RatingAggregate::from_values([2, 4]);
        assert_eq!(agg.average, 3.0);
        assert_eq!(agg.count, 2);
    }

    #[test]
    fn repeating_decimal_rounds_to_nearest() {
        // 5 / 3 = 1.666..
        assert_eq!(RatingAggregate::from_values([1, 1, 3]).average, 1.7);
        // 4 / 3 = 1.333..
        assert_eq!(RatingAggregate::from_values([1, 1, 2]).average, 1.3);
    }

    #[test]
    fn exact_halves_round_to_even() {
        // 9 / 4 = 2.25 -> 2.2
        assert_eq!(RatingAggregate::from_values([1, 2, 3, 3]).average, 2.2);
        // 47 / 20 = 2.35 -> 2.4
        let values = [3u8; 7].into_iter().chain([2u8; 13]);
        assert_eq!(RatingAggregate::from_values(values).average, 2.4);
        // Below the star range, but the helper does not care.
        assert_eq!(round_half_even_tenths(9, 20), 4);
        assert_eq!(round_half_even_tenths(11, 20), 6);
    }

    #[test]
    fn average_stays_in_star_range() {
        let agg = RatingAggregate::from_values([5; 1000]);
        assert_eq!(agg.average, 5.0);
        let agg = RatingAggregate::from_values([1; 7]);
        assert_eq!(agg.average, 1.0);
    }

    #[test]
    fn serializes_with_public_field_names() {
        let json = serde_json::to_value(RatingAggregate::from_values([2, 4])).unwrap();
        assert_eq!(json["average_rating"], 3.0);
        assert_eq!(json["rating_count"], 2);
    }
}
