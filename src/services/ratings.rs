//! Rating aggregation over live shots.

use log::debug;
use std::collections::{BTreeMap, BTreeSet};

use crate::db::pool::{DbConn, DbPool};
use crate::error::JournalResult;
use crate::models::ids::{BagId, BeanId};
use crate::models::rating::RatingAggregate;
use crate::repos::shots as shot_repo;

#[derive(Clone)]
pub struct RatingService {
    pool: DbPool,
}

impl RatingService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> JournalResult<DbConn> {
        Ok(self.pool.get()?)
    }

    pub fn bag_rating(&self, bag_id: BagId) -> JournalResult<RatingAggregate> {
        let mut conn = self.conn()?;
        let rows = shot_repo::rating_counts_for_bag(&mut conn, bag_id.0)?;
        Ok(RatingAggregate::from_counts(rows))
    }

    /// Across every live bag of the bean.
    pub fn bean_rating(&self, bean_id: BeanId) -> JournalResult<RatingAggregate> {
        let mut conn = self.conn()?;
        let rows = shot_repo::rating_counts_for_bean(&mut conn, bean_id.0)?;
        Ok(RatingAggregate::from_counts(rows))
    }

    /// One entry per distinct requested bag, from a single grouped query.
    /// Bags without shots (or unknown ids) map to an empty aggregate.
    pub fn bag_ratings_batch(&self, bag_ids: &[BagId]) -> JournalResult<BTreeMap<BagId, RatingAggregate>> {
        let requested = bag_ids.iter().copied().collect::<BTreeSet<_>>();
        if requested.is_empty() {
            return Ok(BTreeMap::new());
        }
        let ids = requested.iter().map(|id| id.0).collect::<Vec<_>>();
        let mut conn = self.conn()?;
        let rows = shot_repo::rating_counts_for_bags(&mut conn, &ids)?;

        let mut grouped: BTreeMap<BagId, Vec<(Option<i32>, i64)>> = BTreeMap::new();
        for (bag_id, rating, count) in rows {
            grouped.entry(BagId(bag_id)).or_default().push((rating, count));
        }
        debug!("Rating batch: {} bag(s) requested, {} with shots", requested.len(), grouped.len());

        Ok(requested
            .into_iter()
            .map(|id| {
                let agg = grouped
                    .remove(&id)
                    .map(RatingAggregate::from_counts)
                    .unwrap_or_else(RatingAggregate::empty);
                (id, agg)
            })
            .collect())
    }
}
