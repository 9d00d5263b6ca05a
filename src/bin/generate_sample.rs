//! Writes a small temperature series to try the fit by hand.
//!
//! Hourly readings over two days with a daily cycle on a slow warming trend,
//! plus a header line, an empty reading and an "N/A" reading that the loader drops.
//!
//!   cargo run --bin generate_sample -- sample/temperatures.csv

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use std::path::PathBuf;
use tempfit::{celsius_to_fahrenheit, COLUMNS, DT_FORMAT};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let fout = PathBuf::from(
        std::env::args()
            .nth(1)
            .unwrap_or_else(|| "temperatures.csv".to_string()),
    );
    if let Some(dir) = fout.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let start = NaiveDate::from_ymd_opt(2023, 3, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid start date")?;
    let mut wtr = csv::Writer::from_path(&fout)
        .with_context(|| format!("creating {}", fout.display()))?;
    wtr.write_record(&COLUMNS)?;
    for h in 0..48 {
        let t = start + Duration::hours(h);
        let stamp = t.format(DT_FORMAT).to_string();
        let hour = h as f64;
        let phase = 2. * std::f64::consts::PI * (hour - 9.) / 24.;
        let celsius = 18. + 0.05 * hour - 4. * phase.cos();
        let celsius = (celsius * 10.).round() / 10.;
        match h {
            13 => wtr.write_record(&[stamp.as_str(), "", ""])?,
            30 => wtr.write_record(&[stamp.as_str(), "N/A", "N/A"])?,
            _ => wtr.write_record(&[
                stamp,
                celsius.to_string(),
                format!("{:.1}", celsius_to_fahrenheit(celsius)),
            ])?,
        }
    }
    wtr.flush()?;
    log::info!("wrote 48 hourly readings to {}", fout.display());
    Ok(())
}
