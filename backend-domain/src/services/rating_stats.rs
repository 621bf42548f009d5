use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::entities::{Rating, MAX_RATING, MIN_RATING};

/// Raw aggregates a store can compute in a single pass (or a single query).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingTotals {
    pub total: u64,
    pub sum: Decimal,
    pub this_month: u64,
    /// Counts for buckets 1..=5, index 0 is bucket 1.
    pub buckets: [u64; 5],
}

impl RatingTotals {
    pub fn record(&mut self, rating: &Rating, month_start: DateTime<Utc>) {
        self.total += 1;
        self.sum += rating.rating;
        if rating.created_at >= month_start {
            self.this_month += 1;
        }
        self.buckets[usize::from(rating.bucket() - MIN_RATING)] += 1;
    }

    pub fn from_ratings<'a>(
        ratings: impl IntoIterator<Item = &'a Rating>,
        month_start: DateTime<Utc>,
    ) -> Self {
        let mut totals = Self::default();
        for rating in ratings {
            totals.record(rating, month_start);
        }
        totals
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingBucketCount {
    pub rating: u8,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingStats {
    pub total_reviews: u64,
    pub average_rating: Decimal,
    pub reviews_this_month: u64,
    pub rating_distribution: Vec<RatingBucketCount>,
}

impl From<RatingTotals> for RatingStats {
    fn from(totals: RatingTotals) -> Self {
        let average_rating = if totals.total == 0 {
            Decimal::ZERO
        } else {
            (totals.sum / Decimal::from(totals.total))
                .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        };
        let rating_distribution = (MIN_RATING..=MAX_RATING)
            .map(|rating| RatingBucketCount {
                rating,
                count: totals.buckets[usize::from(rating - MIN_RATING)],
            })
            .collect();
        Self {
            total_reviews: totals.total,
            average_rating,
            reviews_this_month: totals.this_month,
            rating_distribution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rating(value: Decimal, created_at: DateTime<Utc>) -> Rating {
        Rating {
            id: format!("r-{value}-{}", created_at.timestamp()),
            event_id: "e1".to_string(),
            user_id: "u1".to_string(),
            rating: value,
            comment: None,
            flagged: false,
            hidden: false,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn stats_average_rounds_to_one_decimal() {
        let month_start = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
        let old = Utc.with_ymd_and_hms(2026, 9, 15, 0, 0, 0).unwrap();
        let new = Utc.with_ymd_and_hms(2026, 10, 2, 0, 0, 0).unwrap();
        let ratings = vec![
            rating(Decimal::from(5), old),
            rating(Decimal::from(4), new),
            rating(Decimal::from(4), new),
        ];
        let stats = RatingStats::from(RatingTotals::from_ratings(&ratings, month_start));
        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.average_rating, Decimal::new(43, 1));
        assert_eq!(stats.reviews_this_month, 2);
    }

    #[test]
    fn distribution_partitions_every_rating() {
        let at = Utc.with_ymd_and_hms(2026, 10, 2, 0, 0, 0).unwrap();
        let values = [10, 15, 20, 35, 40, 45, 50, 50];
        let ratings: Vec<Rating> = values
            .iter()
            .map(|v| rating(Decimal::new(*v, 1), at))
            .collect();
        let stats = RatingStats::from(RatingTotals::from_ratings(&ratings, at));
        let counted: u64 = stats.rating_distribution.iter().map(|b| b.count).sum();
        assert_eq!(counted, stats.total_reviews);
        assert_eq!(stats.rating_distribution.len(), 5);
        assert_eq!(stats.rating_distribution[4], RatingBucketCount { rating: 5, count: 2 });
        assert!(stats.average_rating >= Decimal::ONE && stats.average_rating <= Decimal::from(5));
    }

    #[test]
    fn empty_store_reports_zero_average() {
        let stats = RatingStats::from(RatingTotals::default());
        assert_eq!(stats.average_rating, Decimal::ZERO);
        assert!(stats.rating_distribution.iter().all(|b| b.count == 0));
    }
}
