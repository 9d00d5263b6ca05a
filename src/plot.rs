use super::error::PlotError;
use super::input::FitMode;
use super::{min_and_max, DateTimeNum, FittedSeries};
use chrono::prelude::*;
use chrono::Duration;
use plotters::coord::ranged1d::{DefaultFormatting, KeyPointHint, Ranged};
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

/// 7x5 inches at 200 dpi
pub const PLOT_SIZE: (u32, u32) = (1400, 1000);

/// maximum number of labelled ticks on the time axis
pub const MAX_TICKS: usize = 24;

/// hourly grid lines are dropped beyond two weeks
pub const MAX_HOURLY_TICKS: usize = 14 * 24;

const TICK_HOURS: [i64; 5] = [1, 2, 3, 6, 12];

/// Chooses the spacing of the time ticks: hourly if it fits,
/// otherwise a coarser divisor of the day, otherwise whole days.
pub fn suitable_tick_step(span: Duration) -> Duration {
    let fits = |step: Duration| span.num_seconds() / step.num_seconds() < MAX_TICKS as i64;
    for &h in TICK_HOURS.iter() {
        if fits(Duration::hours(h)) {
            return Duration::hours(h);
        }
    }
    let days = span.num_days() / MAX_TICKS as i64 + 1;
    Duration::days(days)
}

/// Tick positions from the first step boundary at or after start, up to end.
/// Boundaries are aligned on midnight so that every day start is a tick.
pub fn time_ticks(start: NaiveDateTime, end: NaiveDateTime) -> Vec<NaiveDateTime> {
    let step = suitable_tick_step(end - start);
    let mut tick = first_boundary(start, step);
    let mut ticks = Vec::new();
    while tick <= end {
        ticks.push(tick);
        tick += step;
    }
    ticks
}

/// Every full hour between start and end, empty if there are too many.
pub fn hourly_ticks(start: NaiveDateTime, end: NaiveDateTime) -> Vec<NaiveDateTime> {
    if (end - start).num_hours() as usize > MAX_HOURLY_TICKS {
        return Vec::new();
    }
    let mut tick = first_boundary(start, Duration::hours(1));
    let mut ticks = Vec::new();
    while tick <= end {
        ticks.push(tick);
        tick += Duration::hours(1);
    }
    ticks
}

/// first multiple of step (at most a day) counted from midnight, at or after t
fn first_boundary(t: NaiveDateTime, step: Duration) -> NaiveDateTime {
    let midnight = t.date().and_time(NaiveTime::MIN);
    let offset = (t - midnight).num_milliseconds();
    let step_ms = step.num_milliseconds().min(Duration::days(1).num_milliseconds());
    midnight + Duration::milliseconds((offset + step_ms - 1) / step_ms * step_ms)
}

/// Time axis in day numbers.
///
/// Bold key points are the labelled ticks from [`time_ticks`],
/// light key points the hourly grid from [`hourly_ticks`].
#[derive(Debug, Clone)]
pub struct DayAxis {
    start: f64,
    end: f64,
    bold: Vec<f64>,
    light: Vec<f64>,
}

impl DayAxis {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> DayAxis {
        let days = |ticks: Vec<NaiveDateTime>| -> Vec<f64> {
            ticks.iter().map(DateTimeNum::to_day_number).collect()
        };
        DayAxis {
            start: start.to_day_number(),
            end: end.to_day_number(),
            bold: days(time_ticks(start, end)),
            light: days(hourly_ticks(start, end)),
        }
    }

    pub fn bold_points(&self) -> &[f64] {
        &self.bold
    }

    pub fn light_points(&self) -> &[f64] {
        &self.light
    }
}

impl Ranged for DayAxis {
    type FormatOption = DefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        let pixels = limit.1 - limit.0;
        if pixels == 0 || self.end <= self.start {
            return limit.1;
        }
        let fraction = (value - self.start) / (self.end - self.start);
        limit.0 + (pixels as f64 * fraction + 1e-3).floor() as i32
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        if hint.weight().allow_light_points() {
            self.light.clone()
        } else {
            self.bold.clone()
        }
    }

    fn range(&self) -> Range<f64> {
        self.start..self.end
    }
}

/// day start gets the date, every other tick the time of day
pub fn tick_label(t: &NaiveDateTime) -> String {
    if t.time() == NaiveTime::MIN {
        t.format("%d-%m-%Y").to_string()
    } else {
        t.format("%H:%M:%S").to_string()
    }
}

/// Render context for the fit chart.
///
/// The drawing area lives only inside [`FitPlot::draw`].
pub struct FitPlot<'a> {
    fout: &'a Path,
    size: (u32, u32),
    mode: FitMode,
}

impl<'a> FitPlot<'a> {
    pub fn new(fout: &'a Path, mode: FitMode) -> FitPlot<'a> {
        FitPlot {
            fout,
            size: PLOT_SIZE,
            mode,
        }
    }

    fn draw_err<E: std::fmt::Display>(&self, e: E) -> PlotError {
        PlotError::Draw {
            path: self.fout.to_path_buf(),
            message: e.to_string(),
        }
    }

    /// scatter of the measurements and line of the fit, saved as png
    pub fn draw(&self, series: &FittedSeries) -> Result<(), PlotError> {
        let time = &series.data.time;
        let (tmin, tmax) = min_and_max(&time[..]).ok_or(PlotError::Empty)?;
        let tspan = match tmax - tmin {
            d if d <= Duration::zero() => Duration::hours(1),
            d => d,
        };
        let tmargin = tspan / 20;
        let xaxis = DayAxis::new(tmin - tmargin, tmax + tmargin);

        let values: Vec<f64> = series
            .data
            .celsius
            .iter()
            .chain(&series.predicted_celsius)
            .copied()
            .filter(|v| v.is_finite())
            .collect();
        let (ymin, ymax) = min_and_max(&values[..]).ok_or(PlotError::Empty)?;
        let ymargin = match (ymax - ymin) / 10. {
            m if m > 0. => m,
            _ => 1.,
        };
        let ymin = ymin - ymargin;
        let ymax = ymax + ymargin;

        let root = BitMapBackend::new(self.fout, self.size).into_drawing_area();
        root.fill(&WHITE).map_err(|e| self.draw_err(e))?;
        let mut chart = ChartBuilder::on(&root)
            .caption(format!("{} Fit", self.mode.title()), ("sans-serif", 40))
            .margin(20)
            .x_label_area_size(80)
            .y_label_area_size(100)
            .build_cartesian_2d(xaxis, ymin..ymax)
            .map_err(|e| self.draw_err(e))?;
        chart
            .configure_mesh()
            .light_line_style(RGBColor(235, 235, 235).stroke_width(1))
            .bold_line_style(RGBColor(180, 180, 180).stroke_width(1))
            .set_all_tick_mark_size(4)
            .x_labels(MAX_TICKS)
            .label_style(("sans-serif", 20))
            .x_desc("Time Stamp")
            .y_desc("Temperature (°C)")
            .x_label_formatter(&|x: &f64| match NaiveDateTime::from_day_number(*x) {
                Some(t) => tick_label(&t),
                None => format!("{:.3}", x),
            })
            .y_label_formatter(&|y: &f64| format!("{:.1}", y))
            .draw()
            .map_err(|e| self.draw_err(e))?;

        let points = time
            .iter()
            .zip(&series.data.celsius)
            .map(|(t, c)| Circle::new((t.to_day_number(), *c), 5, BLUE.filled()));
        chart
            .draw_series(points)
            .map_err(|e| self.draw_err(e))?
            .label("Original Data")
            .legend(|(x, y)| Circle::new((x + 10, y), 5, BLUE.filled()));

        let line = LineSeries::new(
            time.iter()
                .zip(&series.predicted_celsius)
                .map(|(t, p)| (t.to_day_number(), *p)),
            RED.stroke_width(2),
        );
        chart
            .draw_series(line)
            .map_err(|e| self.draw_err(e))?
            .label("Fitted Line")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font(("sans-serif", 20))
            .draw()
            .map_err(|e| self.draw_err(e))?;
        root.present().map_err(|e| self.draw_err(e))?;
        Ok(())
    }
}
