//! Least squares polynomial regression of temperature against time.
//!
//! Time enters the regression as the day number since the unix epoch,
//! see [`DateTimeNum`](super::DateTimeNum).

use super::error::FitError;
use super::input::FitMode;
use super::{celsius_to_fahrenheit, DateTimeNum, FittedSeries, TimeTemperature};
use nalgebra::{DMatrix, DVector};
use std::fmt;

/// coefficient names, highest power first
pub const LABELS: [&str; 3] = ["a", "b", "c"];

/// Fitted polynomial coefficients, highest power first.
#[derive(Debug, Clone, PartialEq)]
pub struct FitParameters {
    pub mode: FitMode,
    pub coefficients: Vec<f64>,
}

impl FitParameters {
    pub fn labels(&self) -> &'static [&'static str] {
        &LABELS[..self.coefficients.len()]
    }

    /// evaluates the polynomial at x with Horner's scheme
    pub fn eval(&self, x: f64) -> f64 {
        polyval(&self.coefficients, x)
    }
}

impl fmt::Display for FitParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self.coefficients.iter().map(|c| c.to_string()).collect();
        let widths: Vec<usize> = values.iter().map(|v| v.len()).collect();
        let header: Vec<String> = self
            .labels()
            .iter()
            .zip(&widths)
            .map(|(l, w)| format!("{:>w$}", l, w = w))
            .collect();
        writeln!(f, "{}", header.join(" "))?;
        write!(f, "{}", values.join(" "))
    }
}

pub fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().fold(0., |acc, c| acc * x + c)
}

/// Ordinary least squares fit of a polynomial of the given degree.
///
/// The Vandermonde columns are scaled to unit norm before the SVD solve and
/// singular values below `n * eps * max(sigma)` are discarded, so an
/// underdetermined problem returns the minimum norm solution.
pub fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Result<Vec<f64>, FitError> {
    let n = x.len().min(y.len());
    if n == 0 {
        return Err(FitError::NoData);
    }
    let k = degree + 1;
    let mut lhs = DMatrix::from_fn(n, k, |i, j| x[i].powi((degree - j) as i32));
    let scale: Vec<f64> = lhs
        .column_iter()
        .map(|c| match c.norm() {
            s if s == 0. => 1.,
            s => s,
        })
        .collect();
    for (j, s) in scale.iter().enumerate() {
        lhs.column_mut(j).unscale_mut(*s);
    }
    let rhs = DVector::from_column_slice(&y[..n]);
    let svd = lhs.svd(true, true);
    let rcond = n as f64 * f64::EPSILON * svd.singular_values.max();
    let solution = svd.solve(&rhs, rcond).map_err(FitError::Solve)?;
    Ok(solution
        .iter()
        .zip(&scale)
        .map(|(c, s)| c / s)
        .collect())
}

fn distinct_count(x: &[f64]) -> usize {
    let mut sorted = x.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup();
    sorted.len()
}

/// Fits the temperature series and adds the predicted columns.
///
/// Fewer distinct time stamps than coefficients leave the fit underdetermined;
/// this is logged and the minimum norm solution is kept.
pub fn fit_data(
    data: TimeTemperature,
    mode: FitMode,
) -> Result<(FittedSeries, FitParameters), FitError> {
    let x: Vec<f64> = data.time.iter().map(|t| t.to_day_number()).collect();
    let distinct = distinct_count(&x);
    if distinct > 0 && distinct <= mode.degree() {
        log::warn!(
            "{} fit with only {} distinct time stamps is underdetermined",
            mode,
            distinct
        );
    }
    let coefficients = polyfit(&x, &data.celsius, mode.degree())?;
    let params = FitParameters { mode, coefficients };
    log::debug!("{} fit coefficients {:?}", mode, params.coefficients);

    let predicted_celsius: Vec<f64> = x.iter().map(|&xi| params.eval(xi)).collect();
    let predicted_fahrenheit = predicted_celsius
        .iter()
        .map(|&c| celsius_to_fahrenheit(c))
        .collect();
    let series = FittedSeries {
        data,
        predicted_celsius,
        predicted_fahrenheit,
    };
    Ok((series, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn hourly(celsius: &[f64]) -> TimeTemperature {
        let mut tt = TimeTemperature::new(celsius.len());
        for (i, c) in celsius.iter().enumerate() {
            tt.time.push(start() + Duration::hours(i as i64));
            tt.celsius.push(*c);
            tt.fahrenheit.push(celsius_to_fahrenheit(*c).to_string());
        }
        tt
    }

    #[test]
    fn horner() {
        assert_eq!(polyval(&[2., -3., 1.], 2.), 3.);
        assert_eq!(polyval(&[4.], 10.), 4.);
    }

    #[test]
    fn polyfit_recovers_exact_polynomials() {
        let x: Vec<f64> = (0..8).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = x.iter().map(|v| 3. * v * v - 2. * v + 7.).collect();
        let c = polyfit(&x, &y, 2).unwrap();
        for (got, want) in c.iter().zip(&[3., -2., 7.]) {
            assert!((got - want).abs() < 1e-9, "{:?}", c);
        }
    }

    #[test]
    fn polyfit_least_squares_line() {
        let x = [0., 1., 2., 3.];
        let y = [0.5, 0.5, 2.5, 2.5];
        let c = polyfit(&x, &y, 1).unwrap();
        assert!((c[0] - 0.8).abs() < 1e-12);
        assert!((c[1] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn polyfit_without_data() {
        assert!(matches!(polyfit(&[], &[], 1), Err(FitError::NoData)));
    }

    #[test]
    fn linear_fit_of_evenly_spaced_series() {
        let data = hourly(&[10., 12., 14., 16., 18.]);
        let x0 = start().to_day_number();
        let (series, params) = fit_data(data, FitMode::Linear).unwrap();
        assert_eq!(params.labels(), &["a", "b"]);
        // 2 degrees per hour is 48 degrees per day
        assert!((params.coefficients[0] - 48.).abs() < 1e-6);
        assert!((params.eval(x0) - 10.).abs() < 1e-6);
        for (p, c) in series
            .predicted_celsius
            .iter()
            .zip(&series.data.celsius)
        {
            assert!((p - c).abs() < 1e-6);
        }
    }

    #[test]
    fn quadratic_fit_follows_a_parabola() {
        let celsius: Vec<f64> = (0..12)
            .map(|h| {
                let h = h as f64;
                20. - 0.25 * (h - 6.) * (h - 6.)
            })
            .collect();
        let (series, params) = fit_data(hourly(&celsius), FitMode::Quadratic).unwrap();
        assert_eq!(params.labels(), &["a", "b", "c"]);
        assert!(params.coefficients[0] < 0.);
        for (p, c) in series.predicted_celsius.iter().zip(&celsius) {
            assert!((p - c).abs() < 1e-3, "{} vs {}", p, c);
        }
    }

    #[test]
    fn fahrenheit_follows_celsius_prediction() {
        let (series, _) = fit_data(hourly(&[3., 5., 4., 8., 7.]), FitMode::Quadratic).unwrap();
        for (c, f) in series
            .predicted_celsius
            .iter()
            .zip(&series.predicted_fahrenheit)
        {
            assert_eq!(*f, c * 9. / 5. + 32.);
        }
    }

    #[test]
    fn underdetermined_quadratic_still_fits() {
        let (series, params) = fit_data(hourly(&[10., 12.]), FitMode::Quadratic).unwrap();
        assert_eq!(params.coefficients.len(), 3);
        assert!(params.coefficients.iter().all(|c| c.is_finite()));
        assert_eq!(series.predicted_celsius.len(), 2);
    }

    #[test]
    fn empty_table_is_an_error() {
        let res = fit_data(TimeTemperature::new(0), FitMode::Linear);
        assert!(matches!(res, Err(FitError::NoData)));
    }

    #[test]
    fn parameters_display_as_table() {
        let p = FitParameters {
            mode: FitMode::Linear,
            coefficients: vec![48., -10.5],
        };
        assert_eq!(p.to_string(), " a     b\n48 -10.5");
    }
}
