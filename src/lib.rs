use chrono::prelude::*;
use std::path::{Path, PathBuf};
pub mod error;
pub mod fit;
pub mod input;
pub mod load;
pub mod plot;
pub mod save;

pub use error::Error;
pub use fit::FitParameters;
pub use input::FitMode;

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

pub const DT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// positional names of the three input columns
pub const COLUMNS: [&str; 3] = ["Time-Stamp", "Temperature/°C", "Temperature/°F"];
pub const PREDICTION_COLUMNS: [&str; 2] = ["Prediction/°C", "Prediction/°F"];

const MS_PER_DAY: f64 = 86_400_000.;

pub fn celsius_to_fahrenheit(t: f64) -> f64 {
    t * 9. / 5. + 32.
}

/// Numeric time encoding: days since 1970-01-01 00:00:00,
/// with the time of day as fractional part.
pub trait DateTimeNum: Sized {
    fn to_day_number(&self) -> f64;
    fn from_day_number(days: f64) -> Option<Self>;
}

impl DateTimeNum for NaiveDateTime {
    fn to_day_number(&self) -> f64 {
        let utc = self.and_utc();
        let ms = utc.timestamp() as f64 * 1000. + utc.timestamp_subsec_nanos() as f64 / 1e6;
        ms / MS_PER_DAY
    }

    /// rounds to the millisecond
    fn from_day_number(days: f64) -> Option<NaiveDateTime> {
        if !days.is_finite() {
            return None;
        }
        let ms = (days * MS_PER_DAY).round();
        if ms.abs() > i64::MAX as f64 {
            return None;
        }
        DateTime::from_timestamp_millis(ms as i64).map(|dt| dt.naive_utc())
    }
}

/// The measurement table: temperature time series in file order
#[derive(Debug, Clone, Default)]
pub struct TimeTemperature {
    pub time: Vec<NaiveDateTime>,
    pub celsius: Vec<f64>,
    /// third input column, kept verbatim for the output table
    pub fahrenheit: Vec<String>,
}

impl TimeTemperature {
    pub fn new(capacity: usize) -> TimeTemperature {
        TimeTemperature {
            time: Vec::with_capacity(capacity),
            celsius: Vec::with_capacity(capacity),
            fahrenheit: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

impl std::fmt::Display for TimeTemperature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", COLUMNS.join(", "))?;
        for ((t, c), fh) in self.time.iter().zip(&self.celsius).zip(&self.fahrenheit) {
            writeln!(f, "{}, {}, {}", t.format(DT_FORMAT), c, fh)?;
        }
        Ok(())
    }
}

/// The measurement table augmented with the fitted values
#[derive(Debug, Clone)]
pub struct FittedSeries {
    pub data: TimeTemperature,
    pub predicted_celsius: Vec<f64>,
    pub predicted_fahrenheit: Vec<f64>,
}

impl FittedSeries {
    /// one output record per observation, in table order
    pub fn records(&self) -> impl Iterator<Item = [String; 5]> + '_ {
        self.data
            .time
            .iter()
            .zip(&self.data.celsius)
            .zip(&self.data.fahrenheit)
            .zip(self.predicted_celsius.iter().zip(&self.predicted_fahrenheit))
            .map(|(((t, c), fh), (pc, pf))| {
                [
                    t.format(DT_FORMAT).to_string(),
                    c.to_string(),
                    fh.clone(),
                    pc.to_string(),
                    pf.to_string(),
                ]
            })
    }
}

impl std::fmt::Display for FittedSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header: Vec<&str> = COLUMNS.iter().chain(&PREDICTION_COLUMNS).copied().collect();
        writeln!(f, "{}", header.join(", "))?;
        for record in self.records() {
            writeln!(f, "{}", record.join(", "))?;
        }
        Ok(())
    }
}

pub fn min_and_max<T: std::cmp::PartialOrd + Copy>(s: &[T]) -> Option<(T, T)> {
    let mut self_iter = s.iter();
    let (mut min, mut max) = match self_iter.next() {
        Some(v) => (*v, *v),
        None => return None,
    };
    for es in self_iter {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    Some((min, max))
}

/// Files produced by a run, all next to the input file.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub parameters: PathBuf,
    pub predictions: PathBuf,
    pub plot: PathBuf,
}

impl OutputPaths {
    pub fn new(input: &Path, mode: FitMode) -> OutputPaths {
        let dir = input.parent().unwrap_or_else(|| Path::new(""));
        OutputPaths {
            parameters: dir.join(format!("{}_fit_parameters.csv", mode)),
            predictions: dir.join(format!("{}_predictions.csv", mode)),
            plot: dir.join(format!("{}_fit.png", mode)),
        }
    }
}

/// read, clean, fit and save, without plotting
pub fn fit_and_save(
    input: &Path,
    mode: FitMode,
) -> Result<(FittedSeries, FitParameters, OutputPaths), Error> {
    let paths = OutputPaths::new(input, mode);
    let data = load::read_data(input)?;
    println!("\nData extracted:");
    println!("{}", data);

    let (series, params) = fit::fit_data(data, mode)?;
    println!("\n{} fit parameters: {}", mode.title(), mode.model());

    save::save_fit_params(&params, &paths.parameters)?;
    save::save_predictions(&series, &paths.predictions)?;
    Ok((series, params, paths))
}

/// The whole pipeline: read, clean, fit, save and plot.
pub fn run(input: &Path, mode: FitMode) -> Result<OutputPaths, Error> {
    let (series, _, paths) = fit_and_save(input, mode)?;
    plot::FitPlot::new(&paths.plot, mode).draw(&series)?;
    log::info!("plot saved to {}", paths.plot.display());
    Ok(paths)
}
