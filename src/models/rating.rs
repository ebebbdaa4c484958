//! Rating values and rating aggregates.
//!
//! The persisted scale is 1..=5. Some displays index ratings 0..=4; that
//! mapping is `rating - 1` and only happens through [`Rating::to_display_index`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::utils::round2;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: i32 = 1;
    pub const MAX: i32 = 5;

    pub fn new(value: i32) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Rating(value as u8))
    }

    pub fn value(&self) -> i32 {
        self.0 as i32
    }

    pub fn to_display_index(&self) -> u8 {
        self.0 - 1
    }

    pub fn from_display_index(index: u8) -> Option<Self> {
        Self::new(index as i32 + 1)
    }

    pub fn all() -> impl Iterator<Item = Rating> {
        (Self::MIN..=Self::MAX).map(|v| Rating(v as u8))
    }
}

impl TryFrom<i32> for Rating {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Rating::new(value).ok_or_else(|| format!("rating must be between {} and {}", Rating::MIN, Rating::MAX))
    }
}

impl From<Rating> for i32 {
    fn from(value: Rating) -> Self {
        value.value()
    }
}

/// Average and histogram over the ratings of a set of shots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingAggregate {
    pub average_rating: f64,
    pub total_shots: i64,
    pub rated_shots: i64,
    /// rating value -> number of shots with that rating
    pub distribution: BTreeMap<i32, i64>,
}

impl RatingAggregate {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from `(rating, count)` rows as produced by a `GROUP BY rating` query.
    /// `None` ratings count toward `total_shots` only.
    pub fn from_counts<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (Option<i32>, i64)>,
    {
        let mut agg = Self::empty();
        for (rating, count) in rows {
            agg.add(rating, count);
        }
        agg.recompute_average();
        agg
    }

    /// Build from individual shot ratings.
    pub fn from_ratings<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = Option<i32>>,
    {
        Self::from_counts(ratings.into_iter().map(|r| (r, 1)))
    }

    fn add(&mut self, rating: Option<i32>, count: i64) {
        if count <= 0 {
            return;
        }
        self.total_shots += count;
        if let Some(r) = rating {
            self.rated_shots += count;
            *self.distribution.entry(r).or_insert(0) += count;
        }
    }

    fn recompute_average(&mut self) {
        self.average_rating = if self.rated_shots == 0 {
            0.0
        } else {
            let sum: i64 = self.distribution.iter().map(|(r, c)| *r as i64 * c).sum();
            sum as f64 / self.rated_shots as f64
        };
    }

    pub fn merge(&mut self, other: &RatingAggregate) {
        self.total_shots += other.total_shots;
        self.rated_shots += other.rated_shots;
        for (r, c) in &other.distribution {
            *self.distribution.entry(*r).or_insert(0) += c;
        }
        self.recompute_average();
    }

    pub fn display_average(&self) -> f64 {
        round2(self.average_rating)
    }

    pub fn count_for_rating(&self, rating: i32) -> i64 {
        self.distribution.get(&rating).copied().unwrap_or(0)
    }

    pub fn percentage_for_rating(&self, rating: i32) -> f64 {
        if self.rated_shots == 0 {
            return 0.0;
        }
        self.count_for_rating(rating) as f64 / self.rated_shots as f64 * 100.0
    }

    /// `(rating, percentage)` for every rating on the scale, including zeros.
    pub fn distribution_percentages(&self) -> Vec<(i32, f64)> {
        Rating::all()
            .map(|r| (r.value(), self.percentage_for_rating(r.value())))
            .collect()
    }

    pub fn has_ratings(&self) -> bool {
        self.rated_shots > 0
    }
}
