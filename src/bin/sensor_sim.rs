//! Water-quality sensor simulator.
//!
//! Posts one synthetic reading per tick to the ingestion endpoint. Villages
//! are the districts from [`regions::STATE_DISTRICTS`], so the names match the
//! symptom report form exactly.
//!
//! # Environment Variables
//! - `SIM_TARGET_URL` (optional) – ingestion URL (default: `http://127.0.0.1:8080/api/water/post`)
//! - `SIM_INTERVAL_SECS` (optional) – seconds between readings (default: 3)
//! - `SIM_MAX_TICKS` (optional) – stop after this many readings (default: run until Ctrl-C)
use std::{env, time::Duration};

use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use rand::{rngs::StdRng, Rng, SeedableRng};
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use aarogya_sentinel::regions;
use aarogya_sentinel::telemetry::{self, LogSettings};

// ---

const DEFAULT_TARGET: &str = "http://127.0.0.1:8080/api/water/post";

struct SimConfig {
    target_url: String,
    interval: Duration,
    max_ticks: Option<u64>,
}

impl SimConfig {
    fn from_env() -> Result<Self> {
        // ---
        let target_url = env::var("SIM_TARGET_URL").unwrap_or_else(|_| DEFAULT_TARGET.to_string());
        let interval_secs = match env::var("SIM_INTERVAL_SECS") {
            Ok(v) => v
                .trim()
                .parse::<u64>()
                .map_err(|e| anyhow!("Invalid SIM_INTERVAL_SECS: {}", e))?,
            Err(_) => 3,
        };
        if interval_secs == 0 {
            return Err(anyhow!("SIM_INTERVAL_SECS must be at least 1"));
        }
        let max_ticks = match env::var("SIM_MAX_TICKS") {
            Ok(v) => Some(
                v.trim()
                    .parse::<u64>()
                    .map_err(|e| anyhow!("Invalid SIM_MAX_TICKS: {}", e))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            target_url,
            interval: Duration::from_secs(interval_secs),
            max_ticks,
        })
    }
}

/// One simulated sensor site.
#[derive(Debug, Clone)]
struct Site {
    village: &'static str,
    state: &'static str,
    lat: f64,
    lng: f64,
    ph: f64,
    turbidity: f64,
    tds: f64,
}

#[derive(Debug, Serialize)]
struct ReadingPayload<'a> {
    village: &'a str,
    state: &'a str,
    ph: f64,
    turbidity: f64,
    tds: f64,
    lat: f64,
    lng: f64,
}

fn round(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn build_sites(rng: &mut impl Rng) -> Vec<Site> {
    // ---
    regions::all_districts()
        .map(|(state, district)| Site {
            village: district,
            state,
            lat: round(rng.gen_range(25.5..27.5), 5),
            lng: round(rng.gen_range(91.0..95.0), 5),
            ph: round(rng.gen_range(6.5..7.5), 2),
            turbidity: round(rng.gen_range(1.0..4.0), 2),
            tds: rng.gen_range(150..=300) as f64,
        })
        .collect()
}

/// Random walk around the site baseline, kept within plausible sensor bounds.
fn drift(site: &mut Site, rng: &mut impl Rng) {
    // ---
    site.ph = round((site.ph + rng.gen_range(-0.1..=0.1)).clamp(5.4, 8.8), 2);
    site.turbidity = round((site.turbidity + rng.gen_range(-0.3..=0.3)).clamp(0.5, 12.0), 2);
    site.tds = (site.tds + rng.gen_range(-10..=10) as f64).clamp(50.0, 700.0);
}

/// Values for this tick: occasionally unsafe or borderline, otherwise the baseline.
fn sample(site: &Site, rng: &mut impl Rng) -> (f64, f64, f64) {
    // ---
    let roll: f64 = rng.gen();
    if roll < 0.10 {
        let ph = if rng.gen_bool(0.5) { 5.0 } else { 9.0 };
        (ph, round(rng.gen_range(6.0..12.0), 2), rng.gen_range(501..=700) as f64)
    } else if roll < 0.30 {
        let ph = if rng.gen_bool(0.5) { 6.0 } else { 8.6 };
        (ph, round(rng.gen_range(5.0..6.0), 2), rng.gen_range(400..=500) as f64)
    } else {
        (site.ph, site.turbidity, site.tds)
    }
}

async fn post_reading(client: &Client, url: &str, payload: &ReadingPayload<'_>) -> Result<u16> {
    // ---
    let resp = client.post(url).json(payload).send().await?;
    Ok(resp.status().as_u16())
}

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    telemetry::init(&LogSettings::from_env("info"));

    let cfg = SimConfig::from_env()?;
    let mut rng = StdRng::from_entropy();
    let mut sites = build_sites(&mut rng);
    if sites.is_empty() {
        return Err(anyhow!("No districts configured; nothing to simulate"));
    }

    let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
    info!(
        "Simulating {} sites -> {} every {:?}",
        sites.len(),
        cfg.target_url,
        cfg.interval
    );

    let mut ticker = tokio::time::interval(cfg.interval);
    let mut sent: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping after {} readings", sent);
                break;
            }
        }

        let idx = rng.gen_range(0..sites.len());
        let site = &mut sites[idx];
        drift(site, &mut rng);
        let (ph, turbidity, tds) = sample(site, &mut rng);

        let payload = ReadingPayload {
            village: site.village,
            state: site.state,
            ph,
            turbidity,
            tds,
            lat: site.lat,
            lng: site.lng,
        };

        match post_reading(&client, &cfg.target_url, &payload).await {
            Ok(status) => info!(
                village = payload.village,
                ph, turbidity, tds, status, "reading sent"
            ),
            Err(e) => warn!(village = payload.village, "Failed to send reading: {}", e),
        }

        sent += 1;
        if cfg.max_ticks.is_some_and(|max| sent >= max) {
            info!("Reached SIM_MAX_TICKS ({})", sent);
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_sites_cover_every_district_with_safe_baseline() {
        // ---
        let mut rng = StdRng::seed_from_u64(7);
        let sites = build_sites(&mut rng);
        assert_eq!(sites.len(), regions::all_districts().count());
        for s in &sites {
            assert!((6.5..=7.5).contains(&s.ph));
            assert!((1.0..=4.0).contains(&s.turbidity));
            assert!((150.0..=300.0).contains(&s.tds));
            assert!((25.5..=27.5).contains(&s.lat));
            assert!((91.0..=95.0).contains(&s.lng));
        }
    }

    #[test]
    fn test_drift_stays_in_bounds() {
        // ---
        let mut rng = StdRng::seed_from_u64(42);
        let mut site = build_sites(&mut rng).remove(0);
        for _ in 0..5_000 {
            drift(&mut site, &mut rng);
            assert!((5.4..=8.8).contains(&site.ph));
            assert!((0.5..=12.0).contains(&site.turbidity));
            assert!((50.0..=700.0).contains(&site.tds));
        }
    }

    #[test]
    fn test_samples_are_baseline_warning_or_unsafe() {
        // ---
        let mut rng = StdRng::seed_from_u64(3);
        let site = build_sites(&mut rng).remove(0);
        for _ in 0..1_000 {
            let (ph, turbidity, tds) = sample(&site, &mut rng);
            let baseline = ph == site.ph && turbidity == site.turbidity && tds == site.tds;
            let warning = (ph == 6.0 || ph == 8.6) && (400.0..=500.0).contains(&tds);
            let unsafe_ = (ph == 5.0 || ph == 9.0) && (501.0..=700.0).contains(&tds);
            assert!(baseline || warning || unsafe_, "unexpected sample {ph} {turbidity} {tds}");
        }
    }
}
