//! Shot history filters.
//!
//! A shot matches when it satisfies every non-empty dimension; within one
//! dimension any listed value matches. An empty dimension does not restrict.

use serde::{Deserialize, Serialize};

use crate::models::ids::{BeanId, ProfileId};
use crate::models::rating::Rating;

/// Immutable criteria consumed by the shot repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotFilterCriteria {
    bean_ids: Vec<BeanId>,
    made_for_ids: Vec<ProfileId>,
    ratings: Vec<Rating>,
}

impl ShotFilterCriteria {
    /// No restriction on any dimension.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn builder() -> ShotFilterBuilder {
        ShotFilterBuilder::default()
    }

    pub fn bean_ids(&self) -> &[BeanId] {
        &self.bean_ids
    }

    pub fn made_for_ids(&self) -> &[ProfileId] {
        &self.made_for_ids
    }

    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    pub fn has_filters(&self) -> bool {
        !self.bean_ids.is_empty() || !self.made_for_ids.is_empty() || !self.ratings.is_empty()
    }

    /// Number of active dimensions.
    pub fn active_dimensions(&self) -> usize {
        [!self.bean_ids.is_empty(), !self.made_for_ids.is_empty(), !self.ratings.is_empty()]
            .iter()
            .filter(|active| **active)
            .count()
    }

    /// In-memory form of the predicate the repository applies in SQL.
    pub fn matches(&self, bean_id: BeanId, made_for_id: Option<ProfileId>, rating: Option<i32>) -> bool {
        let bean_ok = self.bean_ids.is_empty() || self.bean_ids.contains(&bean_id);
        let made_for_ok =
            self.made_for_ids.is_empty() || made_for_id.is_some_and(|id| self.made_for_ids.contains(&id));
        let rating_ok = self.ratings.is_empty() || rating.is_some_and(|r| self.ratings.iter().any(|f| f.value() == r));
        bean_ok && made_for_ok && rating_ok
    }

    pub(crate) fn bean_id_values(&self) -> Vec<i64> {
        self.bean_ids.iter().map(|id| id.0).collect()
    }

    pub(crate) fn made_for_id_values(&self) -> Vec<i64> {
        self.made_for_ids.iter().map(|id| id.0).collect()
    }

    pub(crate) fn rating_values(&self) -> Vec<i32> {
        self.ratings.iter().map(Rating::value).collect()
    }
}

/// Mutable form edited by a filter sheet, frozen with [`ShotFilterBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct ShotFilterBuilder {
    bean_ids: Vec<BeanId>,
    made_for_ids: Vec<ProfileId>,
    ratings: Vec<Rating>,
}

fn push_unique<T: PartialEq>(values: &mut Vec<T>, value: T) {
    if !values.contains(&value) {
        values.push(value);
    }
}

fn toggle<T: PartialEq>(values: &mut Vec<T>, value: T) {
    if let Some(pos) = values.iter().position(|v| *v == value) {
        values.remove(pos);
    } else {
        values.push(value);
    }
}

impl ShotFilterBuilder {
    pub fn bean(mut self, id: BeanId) -> Self {
        self.add_bean(id);
        self
    }

    pub fn made_for(mut self, id: ProfileId) -> Self {
        self.add_made_for(id);
        self
    }

    pub fn rating(mut self, rating: Rating) -> Self {
        self.add_rating(rating);
        self
    }

    pub fn add_bean(&mut self, id: BeanId) {
        push_unique(&mut self.bean_ids, id);
    }

    pub fn add_made_for(&mut self, id: ProfileId) {
        push_unique(&mut self.made_for_ids, id);
    }

    pub fn add_rating(&mut self, rating: Rating) {
        push_unique(&mut self.ratings, rating);
    }

    pub fn remove_bean(&mut self, id: BeanId) {
        self.bean_ids.retain(|v| *v != id);
    }

    pub fn remove_made_for(&mut self, id: ProfileId) {
        self.made_for_ids.retain(|v| *v != id);
    }

    pub fn remove_rating(&mut self, rating: Rating) {
        self.ratings.retain(|v| *v != rating);
    }

    pub fn toggle_bean(&mut self, id: BeanId) {
        toggle(&mut self.bean_ids, id);
    }

    pub fn toggle_made_for(&mut self, id: ProfileId) {
        toggle(&mut self.made_for_ids, id);
    }

    pub fn toggle_rating(&mut self, rating: Rating) {
        toggle(&mut self.ratings, rating);
    }

    pub fn clear(&mut self) {
        self.bean_ids.clear();
        self.made_for_ids.clear();
        self.ratings.clear();
    }

    pub fn has_filters(&self) -> bool {
        !self.bean_ids.is_empty() || !self.made_for_ids.is_empty() || !self.ratings.is_empty()
    }

    pub fn build(&self) -> ShotFilterCriteria {
        ShotFilterCriteria {
            bean_ids: self.bean_ids.clone(),
            made_for_ids: self.made_for_ids.clone(),
            ratings: self.ratings.clone(),
        }
    }
}

impl From<&ShotFilterCriteria> for ShotFilterBuilder {
    fn from(criteria: &ShotFilterCriteria) -> Self {
        Self {
            bean_ids: criteria.bean_ids.clone(),
            made_for_ids: criteria.made_for_ids.clone(),
            ratings: criteria.ratings.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(v: i32) -> Rating {
        Rating::new(v).unwrap()
    }

    #[test]
    fn empty_criteria_has_no_filters_and_matches_everything() {
        let c = ShotFilterCriteria::none();
        assert!(!c.has_filters());
        assert_eq!(c.active_dimensions(), 0);
        assert!(c.matches(BeanId(1), None, None));
    }

    #[test]
    fn one_value_in_any_dimension_activates_filters() {
        assert!(ShotFilterCriteria::builder().bean(BeanId(1)).build().has_filters());
        assert!(ShotFilterCriteria::builder().made_for(ProfileId(1)).build().has_filters());
        assert!(ShotFilterCriteria::builder().rating(rating(4)).build().has_filters());
    }

    #[test]
    fn dimensions_are_conjunctive_values_disjunctive() {
        let c = ShotFilterCriteria::builder()
            .bean(BeanId(1))
            .bean(BeanId(2))
            .rating(rating(5))
            .build();
        assert_eq!(c.active_dimensions(), 2);
        assert!(c.matches(BeanId(1), None, Some(5)));
        assert!(c.matches(BeanId(2), Some(ProfileId(9)), Some(5)));
        assert!(!c.matches(BeanId(3), None, Some(5)));
        assert!(!c.matches(BeanId(1), None, Some(4)));
        assert!(!c.matches(BeanId(1), None, None));
    }

    #[test]
    fn made_for_filter_rejects_shots_without_recipient() {
        let c = ShotFilterCriteria::builder().made_for(ProfileId(7)).build();
        assert!(c.matches(BeanId(1), Some(ProfileId(7)), None));
        assert!(!c.matches(BeanId(1), None, None));
    }

    #[test]
    fn builder_deduplicates_and_toggles() {
        let mut b = ShotFilterBuilder::default();
        b.add_bean(BeanId(1));
        b.add_bean(BeanId(1));
        b.toggle_rating(rating(3));
        b.toggle_rating(rating(3));
        b.toggle_made_for(ProfileId(2));
        let c = b.build();
        assert_eq!(c.bean_ids(), &[BeanId(1)]);
        assert!(c.ratings().is_empty());
        assert_eq!(c.made_for_ids(), &[ProfileId(2)]);

        b.clear();
        assert!(!b.has_filters());
        // criteria built earlier is unaffected by later builder edits
        assert!(c.has_filters());
    }

    #[test]
    fn builder_round_trips_through_criteria() {
        let c = ShotFilterCriteria::builder().bean(BeanId(4)).rating(rating(2)).build();
        let mut b = ShotFilterBuilder::from(&c);
        b.remove_bean(BeanId(4));
        let edited = b.build();
        assert!(edited.bean_ids().is_empty());
        assert_eq!(edited.rating_values(), vec![2]);
    }
}
