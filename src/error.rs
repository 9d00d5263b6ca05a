use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading and cleaning the input spreadsheet.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported file extension '{0}', expected xlsx, xlsm, xlsb, xls, ods or csv")]
    UnsupportedExtension(String),

    #[error("could not open spreadsheet {path}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("spreadsheet {0} has no worksheet")]
    NoWorksheet(PathBuf),

    #[error("could not read csv {path}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("row {row}: could not parse '{value}' as a timestamp")]
    Timestamp { row: usize, value: String },
}

#[derive(Debug, Error)]
pub enum FitError {
    #[error("no valid observations to fit")]
    NoData,

    #[error("least squares solve failed: {0}")]
    Solve(&'static str),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("could not write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("could not read parameters from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed parameter file {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("nothing to plot")]
    Empty,

    #[error("could not draw {path}: {message}")]
    Draw { path: PathBuf, message: String },
}

/// A fit option other than linear or quadratic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid option: '{0}'. Please choose 'linear' or 'quadratic'.")]
pub struct InvalidFitMode(pub String);

/// Any failure of the read, fit, save, plot pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Fit(#[from] FitError),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error(transparent)]
    Plot(#[from] PlotError),
}
