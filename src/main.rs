use chrono::Utc;
use espresso_journal::config::Config;
use espresso_journal::env_file::{self, LoadedEnvFile};
use espresso_journal::services::{fake_data, Journal};
use log::{error, info, warn};

pub fn run() -> Result<(), String> {
    // 1) Load config
    let cfg = Config::from_env().map_err(|e| e.to_string())?;
    info!(
        "Config loaded (database={}, pool_size={}, history_page_size={}, seed_demo_data={}, voice_threshold={:.2})",
        cfg.database_url, cfg.pool_size, cfg.history_page_size, cfg.seed_demo_data, cfg.voice_confidence_threshold
    );

    // 2) Open the store and apply pending migrations
    let journal = Journal::open(&cfg).map_err(|e| format!("Opening journal failed: {}", e))?;
    info!("Journal store ready");

    // 3) Demo data
    if cfg.seed_demo_data {
        match fake_data::seed(&journal.pool, fake_data::DEFAULT_SEED).map_err(|e| format!("Seeding demo data failed: {}", e))? {
            Some(summary) => info!("Demo data seeded ({} shot(s))", summary.shots),
            None => info!("Demo data already present"),
        }
    } else {
        info!("Demo data seeding disabled via SEED_DEMO_DATA={}", cfg.seed_demo_data);
    }

    // 4) Overview
    let total = journal.shots.total_count().map_err(|e| e.to_string())?;
    info!("{} shot(s) in the journal", total);
    match journal.shots.most_recent().map_err(|e| e.to_string())? {
        Some(shot) => info!(
            "Most recent: {} of {} at {} ({}g in, ratio {}, {} vs target, rating {})",
            shot.drink_type,
            shot.bean_name,
            shot.pulled_at.format("%Y-%m-%d %H:%M"),
            shot.dose_in,
            shot.brew_ratio()
                .map(|r| format!("1:{:.1}", r))
                .unwrap_or_else(|| "-".to_string()),
            shot.time_deviation()
                .map(|d| format!("{:+.0}s", d))
                .unwrap_or_else(|| "no time".to_string()),
            shot.rating.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string())
        ),
        None => info!("No shots logged yet"),
    }

    let bags = journal.bags.active_for_shot_logging().map_err(|e| e.to_string())?;
    if bags.is_empty() {
        warn!("No open bags; add a bean or a bag before logging shots");
    }
    let ratings = journal
        .ratings
        .bag_ratings_batch(&bags.iter().map(|b| b.id).collect::<Vec<_>>())
        .map_err(|e| e.to_string())?;
    let today = Utc::now().date_naive();
    for bag in &bags {
        let agg = ratings.get(&bag.id).cloned().unwrap_or_default();
        let average = if agg.has_ratings() {
            format!("average {:.2}", agg.display_average())
        } else {
            "unrated".to_string()
        };
        info!(
            "Open bag {}, {} day(s) off roast: {} shot(s), {} rated, {}",
            bag.label(),
            bag.days_since_roast(today),
            agg.total_shots,
            agg.rated_shots,
            average
        );
    }

    let page = journal.shots.history(0, cfg.history_page_size).map_err(|e| e.to_string())?;
    info!(
        "History: page 1 of {} holds {} shot(s)",
        page.total_pages.max(1),
        page.items.len()
    );

    Ok(())
}

fn configure_env_from_cli() -> Result<Option<LoadedEnvFile>, String> {
    let cli = env_file::parse_args(std::env::args_os().skip(1))?;
    let cwd = std::env::current_dir().map_err(|e| format!("unable to read current directory: {}", e))?;
    env_file::load(&cli, &cwd)
}

fn main() {
    let loaded_env = match configure_env_from_cli() {
        Ok(info) => info,
        Err(err) => {
            eprintln!("fatal: {}", err);
            std::process::exit(1);
        }
    };

    // Init logging after environment so RUST_LOG from .env is respected.
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    if let Some(info) = loaded_env.as_ref() {
        let origin = if info.explicit { "CLI-specified" } else { "default" };
        info!(
            "Environment loaded from {} .env file: {} ({} value(s) applied)",
            origin,
            info.path.display(),
            info.applied
        );
    }

    info!(
        "espresso-journal {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = run() {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}
