// Rating entity
// A user's 1-5 review of an event they attended

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::value_objects::ReviewModeration;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub rating: Decimal,
    pub comment: Option<String>,
    pub flagged: bool,
    pub hidden: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rating {
    pub fn moderation(&self) -> ReviewModeration {
        ReviewModeration {
            flagged: self.flagged,
            hidden: self.hidden,
        }
    }

    pub fn set_moderation(&mut self, moderation: ReviewModeration) {
        self.flagged = moderation.flagged;
        self.hidden = moderation.hidden;
    }

    /// Comment as legacy consumers expect it, with moderation markers prepended.
    pub fn display_comment(&self) -> Option<String> {
        self.comment
            .as_deref()
            .map(|comment| self.moderation().decorate(comment))
    }

    /// Star bucket in 1..=5; a rating r falls into bucket floor(r).
    pub fn bucket(&self) -> u8 {
        rating_bucket(self.rating)
    }
}

pub fn rating_bucket(value: Decimal) -> u8 {
    value
        .floor()
        .to_u8()
        .unwrap_or(MIN_RATING)
        .clamp(MIN_RATING, MAX_RATING)
}

/// Rating joined with the submitter and the event it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingView {
    #[serde(flatten)]
    pub rating: Rating,
    pub user_name: String,
    pub user_email: String,
    pub event_title: String,
    pub event_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingSort {
    #[default]
    Newest,
    Oldest,
    Highest,
    Lowest,
}

impl RatingSort {
    pub fn compare(&self, a: &Rating, b: &Rating) -> Ordering {
        match self {
            RatingSort::Newest => b.created_at.cmp(&a.created_at),
            RatingSort::Oldest => a.created_at.cmp(&b.created_at),
            RatingSort::Highest => b
                .rating
                .cmp(&a.rating)
                .then_with(|| b.created_at.cmp(&a.created_at)),
            RatingSort::Lowest => a
                .rating
                .cmp(&b.rating)
                .then_with(|| b.created_at.cmp(&a.created_at)),
        }
    }
}

impl From<&str> for RatingSort {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "oldest" => RatingSort::Oldest,
            "highest" => RatingSort::Highest,
            "lowest" => RatingSort::Lowest,
            _ => RatingSort::Newest,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RatingFilter {
    pub search: Option<String>,
    pub rating_bucket: Option<u8>,
    pub event_id: Option<String>,
    pub sort_by: RatingSort,
}

impl RatingFilter {
    /// Search is a case-insensitive OR over submitter name/email, event title and comment.
    pub fn matches(&self, view: &RatingView) -> bool {
        if let Some(event_id) = self.event_id.as_deref() {
            if view.rating.event_id != event_id {
                return false;
            }
        }
        if let Some(bucket) = self.rating_bucket {
            let lower = Decimal::from(bucket);
            let upper = lower + Decimal::ONE;
            if view.rating.rating < lower || view.rating.rating >= upper {
                return false;
            }
        }
        if let Some(search) = self.search.as_deref() {
            let needle = search.to_lowercase();
            let hit = view.user_name.to_lowercase().contains(&needle)
                || view.user_email.to_lowercase().contains(&needle)
                || view.event_title.to_lowercase().contains(&needle)
                || view
                    .rating
                    .comment
                    .as_deref()
                    .map(|comment| comment.to_lowercase().contains(&needle))
                    .unwrap_or(false);
            if !hit {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn view(rating: Decimal, comment: &str) -> RatingView {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        RatingView {
            rating: Rating {
                id: "r1".to_string(),
                event_id: "e1".to_string(),
                user_id: "u1".to_string(),
                rating,
                comment: Some(comment.to_string()),
                flagged: false,
                hidden: false,
                created_at: at,
                updated_at: at,
            },
            user_name: "Ada Obi".to_string(),
            user_email: "ada@example.com".to_string(),
            event_title: "Lagos Jazz Night".to_string(),
            event_date: at,
        }
    }

    #[test]
    fn bucket_is_half_open() {
        let filter = RatingFilter {
            rating_bucket: Some(4),
            ..Default::default()
        };
        assert!(filter.matches(&view(Decimal::new(4, 0), "ok")));
        assert!(filter.matches(&view(Decimal::new(45, 1), "ok")));
        assert!(!filter.matches(&view(Decimal::new(5, 0), "ok")));
        assert!(!filter.matches(&view(Decimal::new(39, 1), "ok")));
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let row = view(Decimal::new(5, 0), "Great SOUND");
        for needle in ["ada obi", "EXAMPLE.COM", "jazz", "sound"] {
            let filter = RatingFilter {
                search: Some(needle.to_string()),
                ..Default::default()
            };
            assert!(filter.matches(&row), "needle {needle}");
        }
        let filter = RatingFilter {
            search: Some("afrobeats".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&row));
    }

    #[test]
    fn five_star_rating_lands_in_top_bucket() {
        assert_eq!(rating_bucket(Decimal::new(5, 0)), 5);
        assert_eq!(rating_bucket(Decimal::new(19, 1)), 1);
    }

    #[test]
    fn display_comment_marks_hidden_reviews() {
        let mut row = view(Decimal::new(3, 0), "original text").rating;
        row.hidden = true;
        assert_eq!(row.display_comment().as_deref(), Some("[HIDDEN] original text"));
        assert_eq!(row.comment.as_deref(), Some("original text"));
    }

    #[test]
    fn unknown_sort_falls_back_to_newest() {
        assert_eq!(RatingSort::from("random"), RatingSort::Newest);
        assert_eq!(RatingSort::from("Highest"), RatingSort::Highest);
    }
}
