//! Live shoot status tool: inspects the persisted session record and prints the
//! leaderboard of the referenced shoot.
//!
//! Usage: `live-shoot [CODE]`. Without a code the shoot named by the session record is
//! looked up.

use std::env;

use anyhow::Context;
use live_shoot::{
    config::LiveShootConfig,
    dao::{
        models::{PersistedSessionRecord, now_millis},
        session_store::{FileSessionStore, SessionStore},
    },
    dto::{shoot::Shoot, validation::normalize_shoot_code},
    services::{http_shoot_service::HttpShootService, shoot_service::ShootService},
};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = LiveShootConfig::load();
    let store = FileSessionStore::new(&config.storage_dir);
    let record = store
        .load()
        .with_context(|| format!("reading session record {}", store.path().display()))?;

    match &record {
        Some(record) => describe_record(record, &config),
        None => println!("No live shoot session stored in {}", store.path().display()),
    }

    let code = env::args()
        .nth(1)
        .map(|code| normalize_shoot_code(&code))
        .or_else(|| record.as_ref().map(|record| record.shoot_code.clone()));
    let Some(code) = code else {
        return Ok(());
    };

    let Some(url) = config.service_url.as_deref() else {
        warn!("no shoot service URL configured; set LIVE_SHOOT_SERVICE_URL to fetch shoots");
        return Ok(());
    };

    let service = HttpShootService::new(url).context("building shoot service client")?;
    info!(code = %code, url, "fetching shoot");
    let shoot = service
        .get_shoot(code.clone())
        .await
        .with_context(|| format!("fetching shoot {code}"))?;

    match shoot {
        Some(shoot) => print_leaderboard(&shoot),
        None => println!("Shoot {code} does not exist"),
    }

    Ok(())
}

fn describe_record(record: &PersistedSessionRecord, config: &LiveShootConfig) {
    let now = now_millis();
    let minutes = record.age_at(now).as_secs() / 60;
    let state = if record.is_expired_at(now, config.session_max_age) {
        "expired"
    } else {
        "active"
    };
    println!(
        "Session {state}: {} in shoot {} shooting {} (joined {}, {minutes} min ago)",
        record.archer_name,
        record.shoot_code,
        record.round_name,
        format_millis(record.joined_at)
    );
}

fn format_millis(millis: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|time| time.format(&Rfc3339).ok())
        .unwrap_or_else(|| "invalid-timestamp".into())
}

fn print_leaderboard(shoot: &Shoot) {
    match &shoot.title {
        Some(title) => println!("Shoot {}: {title}", shoot.code),
        None => println!("Shoot {}", shoot.code),
    }

    if shoot.participants.is_empty() {
        println!("  no archers yet");
        return;
    }

    let mut ranked: Vec<_> = shoot.participants.iter().collect();
    ranked.sort_by(|a, b| b.total_score.cmp(&a.total_score));
    for (position, participant) in ranked.iter().enumerate() {
        let marker = if participant.finished { " (finished)" } else { "" };
        println!(
            "  {:>2}. {:<24} {:>5} after {:>3} arrows [{}]{marker}",
            position + 1,
            participant.archer_name,
            participant.total_score,
            participant.arrows_shot,
            participant.round_name,
        );
    }
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
