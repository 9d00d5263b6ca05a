use super::error::SaveError;
use super::fit::FitParameters;
use super::input::FitMode;
use super::{FittedSeries, COLUMNS, PREDICTION_COLUMNS};
use std::path::Path;

fn write_err(path: &Path) -> impl Fn(csv::Error) -> SaveError + '_ {
    move |source| SaveError::Write {
        path: path.to_path_buf(),
        source,
    }
}

/// writes the coefficient names and values as a two-line csv, then echoes them
pub fn save_fit_params(params: &FitParameters, fout: &Path) -> Result<(), SaveError> {
    let mut wtr = csv::Writer::from_path(fout).map_err(write_err(fout))?;
    wtr.write_record(params.labels()).map_err(write_err(fout))?;
    wtr.write_record(params.coefficients.iter().map(|c| c.to_string()))
        .map_err(write_err(fout))?;
    wtr.flush().map_err(|e| write_err(fout)(e.into()))?;
    println!("{}", params);
    log::info!("fit parameters saved to {}", fout.display());
    Ok(())
}

/// writes the measurement table with the predicted columns, then echoes it
pub fn save_predictions(series: &FittedSeries, fout: &Path) -> Result<(), SaveError> {
    let mut wtr = csv::Writer::from_path(fout).map_err(write_err(fout))?;
    wtr.write_record(COLUMNS.iter().chain(&PREDICTION_COLUMNS))
        .map_err(write_err(fout))?;
    for record in series.records() {
        wtr.write_record(&record).map_err(write_err(fout))?;
    }
    wtr.flush().map_err(|e| write_err(fout)(e.into()))?;
    println!("\nPredictions:");
    println!("{}", series);
    log::info!("predictions saved to {}", fout.display());
    Ok(())
}

impl FitParameters {
    /// Reads a parameter file written by [`save_fit_params`].
    pub fn from_csv(fin: &Path) -> Result<FitParameters, SaveError> {
        let read_err = |source| SaveError::Read {
            path: fin.to_path_buf(),
            source,
        };
        let malformed = |reason: String| SaveError::Malformed {
            path: fin.to_path_buf(),
            reason,
        };
        let mut rdr = csv::Reader::from_path(fin).map_err(read_err)?;
        let labels: Vec<String> = rdr
            .headers()
            .map_err(read_err)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let mode = FitMode::from_coefficient_count(labels.len())
            .ok_or_else(|| malformed(format!("{} coefficients", labels.len())))?;
        let record = rdr
            .records()
            .next()
            .ok_or_else(|| malformed("no values".to_string()))?
            .map_err(read_err)?;
        let coefficients = record
            .iter()
            .map(|v| {
                v.trim()
                    .parse::<f64>()
                    .map_err(|e| malformed(format!("'{}': {}", v, e)))
            })
            .collect::<Result<Vec<f64>, SaveError>>()?;
        let params = FitParameters { mode, coefficients };
        if params.labels() != labels.as_slice() {
            return Err(malformed(format!("unexpected header {:?}", labels)));
        }
        Ok(params)
    }
}
