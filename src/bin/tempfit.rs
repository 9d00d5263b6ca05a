use anyhow::{Context, Result};
use std::io;
use tempfit::input::{parse_cli, prompt_mode, prompt_path};

fn main() -> Result<()> {
    let args = parse_cli();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    let file = match args.file {
        Some(f) => f,
        None => prompt_path(&mut input, &mut output).context("reading the file path")?,
    };
    let mode = match args.mode {
        Some(m) => m,
        None => prompt_mode(&mut input, &mut output).context("reading the fit option")?,
    };

    let paths = tempfit::run(&file, mode)
        .with_context(|| format!("{} fit of {}", mode, file.display()))?;
    log::info!(
        "done, results in {}, {} and {}",
        paths.parameters.display(),
        paths.predictions.display(),
        paths.plot.display()
    );
    Ok(())
}
