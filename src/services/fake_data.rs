//! Deterministic demo journal: a small equipment shelf, two people, a few
//! beans with two bags each and about a month of morning shots.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::info;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::db::models::{drink_types, EquipmentType, NewBag, NewBean, NewEquipment, NewShotRecord, NewUserProfile};
use crate::db::pool::DbPool;
use crate::error::{JournalError, JournalResult};
use crate::repos::{bags as bag_repo, beans as bean_repo, equipment as equipment_repo, profiles as profile_repo, shots as shot_repo};
use crate::utils::{now_utc, round2};

pub const DEFAULT_SEED: u64 = 0x0E59_8E55_0F00_D1E5;
const DAYS_OF_SHOTS: i64 = 30;
const TARGET_TIME_S: f64 = 28.0;

const MACHINES: [&str; 2] = ["Linea Mini", "Gaggia Classic Pro"];
const GRINDER: &str = "Niche Zero";
const TAMPER: &str = "Normcore Tamper";
const PUCK_SCREEN: &str = "58mm Puck Screen";
const PROFILES: [&str; 2] = ["Alex", "Sam"];
const BEANS: [(&str, Option<&str>, Option<&str>); 3] = [
    ("Ethiopia Guji", Some("Square Mile"), Some("Ethiopia")),
    ("Colombia Huila", Some("Onyx"), Some("Colombia")),
    ("House Espresso", None, None),
];
const DRINKS: [&str; 6] = [
    drink_types::ESPRESSO,
    drink_types::ESPRESSO,
    drink_types::RISTRETTO,
    drink_types::CORTADO,
    drink_types::CAPPUCCINO,
    drink_types::FLAT_WHITE,
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub equipment: usize,
    pub profiles: usize,
    pub beans: usize,
    pub bags: usize,
    pub shots: usize,
}

struct Shelf {
    machines: Vec<i64>,
    grinder: i64,
    tamper: i64,
    puck_screen: i64,
    profiles: Vec<i64>,
}

/// One bean's bags, oldest first, as `(bag_id, roast_date)`.
type BeanBags = Vec<(i64, NaiveDate)>;

/// Seed the journal unless it already has beans. Returns `None` when skipped.
pub fn seed(pool: &DbPool, seed: u64) -> JournalResult<Option<SeedSummary>> {
    let mut conn = pool.get()?;
    if !bean_repo::list(&mut conn, false)?.is_empty() {
        info!("Fake data: journal already has beans; skipping");
        return Ok(None);
    }
    let today = Utc::now().date_naive();
    let mut rng = SmallRng::seed_from_u64(seed);

    let summary = conn.transaction::<_, JournalError, _>(|conn| {
        let mut summary = SeedSummary::default();
        let shelf = ensure_shelf(conn, &mut summary)?;
        let beans = ensure_beans(conn, today, &mut summary)?;

        let start = today - Duration::days(DAYS_OF_SHOTS);
        for day in 0..DAYS_OF_SHOTS {
            let date = start + Duration::days(day);
            let pulls = if rng.random_bool(0.5) { 2 } else { 1 };
            for pull in 0..pulls {
                let bags = &beans[(day as usize + pull) % beans.len()];
                let Some(bag_id) = bag_for_date(bags, date) else {
                    continue;
                };
                let pulled_at = morning(date, pull, &mut rng);
                let (row, accessories) = shot(bag_id, pulled_at, &shelf, &mut rng);
                shot_repo::insert(conn, &row, &accessories)?;
                summary.shots += 1;
            }
        }

        // Older bags are finished by now.
        for bags in &beans {
            if let Some((first, _)) = bags.first()
                && bags.len() > 1
            {
                bag_repo::set_complete(conn, *first, true, now_utc())?;
            }
        }
        Ok(summary)
    })?;

    info!(
        "Fake data: complete (equipment={}, profiles={}, beans={}, bags={}, shots={})",
        summary.equipment, summary.profiles, summary.beans, summary.bags, summary.shots
    );
    Ok(Some(summary))
}

fn ensure_shelf(conn: &mut SqliteConnection, summary: &mut SeedSummary) -> JournalResult<Shelf> {
    let mut add = |conn: &mut SqliteConnection, name: &str, kind: EquipmentType| -> JournalResult<i64> {
        summary.equipment += 1;
        Ok(equipment_repo::insert(conn, &NewEquipment::new(name, kind))?.id)
    };
    let mut machines = Vec::with_capacity(MACHINES.len());
    for name in MACHINES {
        machines.push(add(conn, name, EquipmentType::Machine)?);
    }
    let grinder = add(conn, GRINDER, EquipmentType::Grinder)?;
    let tamper = add(conn, TAMPER, EquipmentType::Tamper)?;
    let puck_screen = add(conn, PUCK_SCREEN, EquipmentType::PuckScreen)?;

    let mut profiles = Vec::with_capacity(PROFILES.len());
    for name in PROFILES {
        profiles.push(profile_repo::insert(conn, &NewUserProfile::new(name))?.id);
        summary.profiles += 1;
    }
    Ok(Shelf {
        machines,
        grinder,
        tamper,
        puck_screen,
        profiles,
    })
}

fn ensure_beans(conn: &mut SqliteConnection, today: NaiveDate, summary: &mut SeedSummary) -> JournalResult<Vec<BeanBags>> {
    let mut all = Vec::with_capacity(BEANS.len());
    for (index, (name, roaster, origin)) in BEANS.into_iter().enumerate() {
        let mut row = NewBean::new(name);
        row.roaster = roaster.map(str::to_string);
        row.origin = origin.map(str::to_string);
        let first_roast = today - Duration::days(44 - 3 * index as i64);
        let (_, first) = bean_repo::insert_with_first_bag(conn, &row, first_roast)?;
        let second_roast = today - Duration::days(14 - 2 * index as i64);
        let second = bag_repo::insert(conn, &NewBag::new(first.bean_id, second_roast))?;
        summary.beans += 1;
        summary.bags += 2;
        all.push(vec![(first.id, first.roast_date), (second.id, second.roast_date)]);
    }
    Ok(all)
}

/// Newest bag already roasted on `date`.
fn bag_for_date(bags: &[(i64, NaiveDate)], date: NaiveDate) -> Option<i64> {
    bags.iter().rev().find(|(_, roast)| *roast <= date).map(|(id, _)| *id)
}

fn morning(date: NaiveDate, pull: usize, rng: &mut SmallRng) -> NaiveDateTime {
    let minute = rng.random_range(0..60);
    date.and_time(NaiveTime::MIN) + Duration::hours(7 + pull as i64) + Duration::minutes(minute)
}

fn shot(bag_id: i64, pulled_at: NaiveDateTime, shelf: &Shelf, rng: &mut SmallRng) -> (NewShotRecord, Vec<i64>) {
    let dose = round2(18.0 + rng.random_range(-0.5..=0.5));
    // One step of grind is worth roughly four seconds of extraction.
    let grind_offset: f64 = rng.random_range(-1.0..=1.0);
    let grind = format!("{:.1}", 14.0 + grind_offset);
    let expected_output = round2(dose * 2.0);
    let drink = DRINKS[rng.random_range(0..DRINKS.len())];

    let mut row = NewShotRecord::new(bag_id, dose, grind, TARGET_TIME_S, expected_output, drink);
    row.pulled_at = pulled_at;
    row.last_modified_at = pulled_at;

    let deviation = -grind_offset * 4.0 + rng.random_range(-2.0..=2.0);
    let actual_time = round2((TARGET_TIME_S + deviation).max(12.0));
    row.actual_time = Some(actual_time);
    row.actual_output = Some(round2(expected_output + rng.random_range(-3.0..=3.0)));

    let machine = shelf.machines[rng.random_range(0..shelf.machines.len())];
    row.machine_id = Some(machine);
    row.grinder_id = Some(shelf.grinder);
    if machine == shelf.machines[0] {
        row.preinfusion_time = Some(5.0);
    }
    row.made_by_id = Some(shelf.profiles[0]);
    row.made_for_id = Some(shelf.profiles[rng.random_range(0..shelf.profiles.len())]);

    // Close to the target time tastes best; some shots never get rated.
    if !rng.random_bool(0.15) {
        let rating = (5.0 - deviation.abs() / 2.5).round().clamp(1.0, 5.0) as i32;
        row.rating = Some(rating);
    }

    let mut accessories = vec![shelf.tamper];
    if rng.random_bool(0.5) {
        accessories.push(shelf.puck_screen);
    }
    (row, accessories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::open_in_memory;
    use chrono::Timelike;
    use crate::services::ratings::RatingService;
    use crate::services::shots::ShotService;

    #[test]
    fn seeds_once() {
        let pool = open_in_memory().expect("pool");
        let summary = seed(&pool, DEFAULT_SEED).unwrap().expect("first run seeds");
        assert_eq!(summary.beans, BEANS.len());
        assert_eq!(summary.bags, BEANS.len() * 2);
        assert!(summary.shots >= DAYS_OF_SHOTS as usize);

        let shots = ShotService::new(pool.clone());
        assert_eq!(shots.total_count().unwrap(), summary.shots as i64);
        assert!(seed(&pool, DEFAULT_SEED).unwrap().is_none());
        assert_eq!(shots.total_count().unwrap(), summary.shots as i64);
    }

    #[test]
    fn same_seed_same_journal() {
        let a = open_in_memory().unwrap();
        let b = open_in_memory().unwrap();
        let left = seed(&a, 7).unwrap().unwrap();
        let right = seed(&b, 7).unwrap().unwrap();
        assert_eq!(left, right);

        let mut conn_a = a.get().unwrap();
        let mut conn_b = b.get().unwrap();
        let ratings = |conn: &mut SqliteConnection| {
            let mut bags = bag_repo::active_for_shot_logging(conn).unwrap().into_iter().map(|b| b.id.0).collect::<Vec<_>>();
            bags.sort_unstable();
            shot_repo::rating_counts_for_bags(conn, &bags).unwrap()
        };
        let mut left_counts = ratings(&mut conn_a);
        let mut right_counts = ratings(&mut conn_b);
        left_counts.sort_unstable();
        right_counts.sort_unstable();
        assert_eq!(left_counts, right_counts);
    }

    #[test]
    fn demo_shelf_and_morning_pulls() {
        let pool = open_in_memory().unwrap();
        let summary = seed(&pool, DEFAULT_SEED).unwrap().unwrap();
        assert_eq!(summary.equipment, MACHINES.len() + 3);
        assert_eq!(summary.profiles, PROFILES.len());

        let mut rng = SmallRng::seed_from_u64(1);
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        for pull in 0..2 {
            let at = morning(date, pull, &mut rng);
            assert_eq!(at.date(), date);
            assert_eq!(at.hour(), 7 + pull as u32);
        }
    }

    #[test]
    fn seeded_ratings_stay_on_scale() {
        let pool = open_in_memory().unwrap();
        seed(&pool, DEFAULT_SEED).unwrap();
        let bags = {
            let mut conn = pool.get().unwrap();
            bag_repo::active_for_shot_logging(&mut conn).unwrap()
        };
        assert_eq!(bags.len(), BEANS.len());
        let batch = RatingService::new(pool)
            .bag_ratings_batch(&bags.iter().map(|b| b.id).collect::<Vec<_>>())
            .unwrap();
        assert_eq!(batch.len(), bags.len());
        for agg in batch.values() {
            assert!(agg.rated_shots <= agg.total_shots);
            assert!(agg.distribution.keys().all(|r| (1..=5).contains(r)));
        }
    }
}
