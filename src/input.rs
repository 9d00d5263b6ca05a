pub use super::error::InvalidFitMode;
use super::VERSION;
use clap::{App, Arg};
use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

/// The regression model, i.e., the degree of the fitted polynomial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    Linear,
    Quadratic,
}

impl FitMode {
    pub const ALL: [FitMode; 2] = [FitMode::Linear, FitMode::Quadratic];

    pub fn degree(self) -> usize {
        match self {
            FitMode::Linear => 1,
            FitMode::Quadratic => 2,
        }
    }

    /// lowercase name, used in prompts and output file names
    pub fn name(self) -> &'static str {
        match self {
            FitMode::Linear => "linear",
            FitMode::Quadratic => "quadratic",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            FitMode::Linear => "Linear",
            FitMode::Quadratic => "Quadratic",
        }
    }

    /// human readable model, e.g. "ax + b"
    pub fn model(self) -> &'static str {
        match self {
            FitMode::Linear => "ax + b",
            FitMode::Quadratic => "ax^2 + bx + c",
        }
    }

    /// recover the mode from the number of polynomial coefficients
    pub fn from_coefficient_count(n: usize) -> Option<FitMode> {
        FitMode::ALL.iter().copied().find(|m| m.degree() + 1 == n)
    }
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FitMode {
    type Err = InvalidFitMode;

    /// case-insensitive, surrounding whitespace is ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        FitMode::ALL
            .iter()
            .copied()
            .find(|m| m.name() == lower)
            .ok_or(InvalidFitMode(lower))
    }
}

/// Optional answers given on the command line instead of at the prompts.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub file: Option<PathBuf>,
    pub mode: Option<FitMode>,
    pub verbose: bool,
}

/// Takes the CLI arguments; anything missing is asked interactively later.
pub fn parse_cli() -> CliArgs {
    let arg_file = Arg::with_name("file")
        .help("spreadsheet with time stamp, temperature [°C] and temperature [°F] columns")
        .short("f")
        .long("file")
        .takes_value(true);
    let arg_mode = Arg::with_name("mode")
        .help("regression model")
        .short("m")
        .long("mode")
        .takes_value(true)
        .case_insensitive(true)
        .possible_values(&["linear", "quadratic"]);
    let arg_verbose = Arg::with_name("verbose")
        .help("print debug information")
        .short("v")
        .long("verbose")
        .takes_value(false)
        .required(false);
    let cli_args = App::new("tempfit")
        .version(VERSION.unwrap_or("unknown"))
        .about("fit a linear or quadratic trend to a temperature time series")
        .arg(arg_file)
        .arg(arg_mode)
        .arg(arg_verbose)
        .get_matches();
    CliArgs {
        file: cli_args.value_of("file").map(PathBuf::from),
        mode: cli_args.value_of("mode").and_then(|m| m.parse().ok()),
        verbose: cli_args.is_present("verbose"),
    }
}

fn read_answer<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> io::Result<String> {
    write!(output, "{}", question)?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed before an answer was given",
        ));
    }
    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}

/// Asks for the data file; existence and format are checked when loading.
pub fn prompt_path<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<PathBuf> {
    let answer = read_answer(input, output, "\nEnter the file relative path (with .xlsx): ")?;
    Ok(PathBuf::from(answer.trim()))
}

/// Asks for the fit mode until a valid one is given.
pub fn prompt_mode<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<FitMode> {
    loop {
        let answer = read_answer(input, output, "Choose the fit option (linear or quadratic): ")?;
        match answer.parse::<FitMode>() {
            Ok(mode) => return Ok(mode),
            Err(e) => writeln!(output, "{}", e)?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn mode_parsing_ignores_case() {
        for s in &["linear", "Linear", "LINEAR", " linear\n"] {
            assert_eq!(s.parse::<FitMode>(), Ok(FitMode::Linear));
        }
        for s in &["quadratic", "QUADRATIC", "QuAdRaTiC"] {
            assert_eq!(s.parse::<FitMode>(), Ok(FitMode::Quadratic));
        }
    }

    #[test]
    fn mode_parsing_rejects_others() {
        for s in &["", "cubic", "lin", "linear quadratic", "2"] {
            assert!(s.parse::<FitMode>().is_err(), "accepted {:?}", s);
        }
    }

    #[test]
    fn invalid_mode_names_the_answer() {
        let err = " Cubic ".parse::<FitMode>().unwrap_err();
        assert_eq!(err, InvalidFitMode("cubic".to_string()));
        assert_eq!(
            err.to_string(),
            "Invalid option: 'cubic'. Please choose 'linear' or 'quadratic'."
        );
    }

    #[test]
    fn prompt_mode_asks_again_until_valid() {
        let mut input = Cursor::new("cubic\n\nQUADRATIC\n");
        let mut output = Vec::new();
        let mode = prompt_mode(&mut input, &mut output).unwrap();
        assert_eq!(mode, FitMode::Quadratic);
        let printed = String::from_utf8(output).unwrap();
        assert_eq!(printed.matches("Choose the fit option").count(), 3);
        assert!(printed.contains("Invalid option: 'cubic'"));
    }

    #[test]
    fn prompt_mode_fails_on_eof() {
        let mut input = Cursor::new("nope\n");
        let mut output = Vec::new();
        let err = prompt_mode(&mut input, &mut output).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn prompt_path_keeps_the_answer() {
        let mut input = Cursor::new("data/temps.xlsx\r\n");
        let mut output = Vec::new();
        let path = prompt_path(&mut input, &mut output).unwrap();
        assert_eq!(path, PathBuf::from("data/temps.xlsx"));
    }

    #[test]
    fn degree_follows_coefficient_count() {
        assert_eq!(FitMode::from_coefficient_count(2), Some(FitMode::Linear));
        assert_eq!(FitMode::from_coefficient_count(3), Some(FitMode::Quadratic));
        assert_eq!(FitMode::from_coefficient_count(4), None);
    }
}
