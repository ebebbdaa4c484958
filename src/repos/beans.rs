use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use diesel::SqliteConnection;

use crate::db::models::{Bag, Bean, BeanChanges, NewBag, NewBean};
use crate::db::scopes;
use crate::schema::{bags, beans, shot_records};

/// Insert a bean together with its first bag.
pub fn insert_with_first_bag(
    conn: &mut SqliteConnection,
    row: &NewBean,
    roast_date: NaiveDate,
) -> QueryResult<(Bean, Bag)> {
    conn.transaction(|conn| {
        let bean: Bean = diesel::insert_into(beans::table)
            .values(row)
            .returning(Bean::as_returning())
            .get_result(conn)?;
        let bag: Bag = diesel::insert_into(bags::table)
            .values(&NewBag::new(bean.id, roast_date))
            .returning(Bag::as_returning())
            .get_result(conn)?;
        Ok((bean, bag))
    })
}

pub fn get(conn: &mut SqliteConnection, id: i64) -> QueryResult<Option<Bean>> {
    scopes::beans::live()
        .filter(beans::id.eq(id))
        .select(Bean::as_select())
        .first(conn)
        .optional()
}

pub fn find_by_name(conn: &mut SqliteConnection, name: &str) -> QueryResult<Option<Bean>> {
    scopes::beans::live()
        .filter(beans::name.eq(name.to_string()))
        .select(Bean::as_select())
        .first(conn)
        .optional()
}

pub fn list(conn: &mut SqliteConnection, active_only: bool) -> QueryResult<Vec<Bean>> {
    let mut query = scopes::beans::live().select(Bean::as_select());
    if active_only {
        query = query.filter(beans::is_active.eq(true));
    }
    query.order((beans::name.asc(), beans::id.asc())).load(conn)
}

pub fn update(conn: &mut SqliteConnection, id: i64, changes: &BeanChanges) -> QueryResult<usize> {
    diesel::update(beans::table.filter(beans::id.eq(id)).filter(scopes::beans::not_deleted()))
        .set(changes)
        .execute(conn)
}

/// Soft-delete a bean, its bags and their shots. Returns rows flagged on the bean table.
pub fn soft_delete_cascade(conn: &mut SqliteConnection, id: i64, now: NaiveDateTime) -> QueryResult<usize> {
    conn.transaction(|conn| {
        let bag_ids = bags::table.filter(bags::bean_id.eq(id)).select(bags::id);
        diesel::update(
            shot_records::table
                .filter(shot_records::bag_id.eq_any(bag_ids))
                .filter(scopes::shots::not_deleted()),
        )
        .set((shot_records::is_deleted.eq(true), shot_records::last_modified_at.eq(now)))
        .execute(conn)?;
        diesel::update(bags::table.filter(bags::bean_id.eq(id)).filter(scopes::bags::not_deleted()))
            .set((bags::is_deleted.eq(true), bags::last_modified_at.eq(now)))
            .execute(conn)?;
        diesel::update(beans::table.filter(beans::id.eq(id)).filter(scopes::beans::not_deleted()))
            .set((beans::is_deleted.eq(true), beans::last_modified_at.eq(now)))
            .execute(conn)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewShotRecord;
    use crate::repos::{bags as bag_repo, shots as shot_repo, test_conn};
    use crate::utils::now_utc;

    #[test]
    fn bean_is_created_with_one_bag() {
        let mut conn = test_conn();
        let roast = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let (bean, bag) = insert_with_first_bag(&mut conn, &NewBean::new("Guji"), roast).unwrap();
        assert_eq!(bag.bean_id, bean.id);
        assert_eq!(bag.roast_date, roast);
        assert!(!bag.is_complete);
        let summaries = bag_repo::summaries_for_bean(&mut conn, bean.id, true).unwrap();
        assert_eq!(summaries.len(), 1);
    }

    #[test]
    fn soft_delete_cascades_to_bags_and_shots() {
        let mut conn = test_conn();
        let roast = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let (bean, bag) = insert_with_first_bag(&mut conn, &NewBean::new("Guji"), roast).unwrap();
        let (other, other_bag) = insert_with_first_bag(&mut conn, &NewBean::new("Huila"), roast).unwrap();
        shot_repo::insert(&mut conn, &NewShotRecord::new(bag.id, 18.0, "12", 28.0, 36.0, "Espresso"), &[]).unwrap();
        shot_repo::insert(&mut conn, &NewShotRecord::new(other_bag.id, 18.0, "12", 28.0, 36.0, "Espresso"), &[])
            .unwrap();

        assert_eq!(soft_delete_cascade(&mut conn, bean.id, now_utc()).unwrap(), 1);

        assert!(get(&mut conn, bean.id).unwrap().is_none());
        assert!(bag_repo::get(&mut conn, bag.id).unwrap().is_none());
        assert!(bag_repo::summaries_for_bean(&mut conn, bean.id, true).unwrap().is_empty());
        assert!(shot_repo::rating_counts_for_bean(&mut conn, bean.id).unwrap().is_empty());
        assert!(shot_repo::rating_counts_for_bags(&mut conn, &[bag.id]).unwrap().is_empty());
        assert_eq!(shot_repo::total_count(&mut conn).unwrap(), 1);
        assert_eq!(shot_repo::rating_counts_for_bean(&mut conn, other.id).unwrap(), vec![(None, 1)]);
        assert!(get(&mut conn, other.id).unwrap().is_some());
        // deleting again touches nothing
        assert_eq!(soft_delete_cascade(&mut conn, bean.id, now_utc()).unwrap(), 0);
    }

    #[test]
    fn list_orders_by_name_and_respects_active_flag() {
        let mut conn = test_conn();
        let roast = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut retired = NewBean::new("Yirgacheffe");
        retired.is_active = false;
        insert_with_first_bag(&mut conn, &retired, roast).unwrap();
        insert_with_first_bag(&mut conn, &NewBean::new("Antigua"), roast).unwrap();

        let all = list(&mut conn, false).unwrap();
        assert_eq!(all.iter().map(|b| b.name.as_str()).collect::<Vec<_>>(), vec!["Antigua", "Yirgacheffe"]);
        assert_eq!(list(&mut conn, true).unwrap().len(), 1);
        assert!(find_by_name(&mut conn, "Antigua").unwrap().is_some());
    }
}
