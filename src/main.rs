use wincur::cli::{Args, ParsedArgs, process_cursor};

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

fn main() -> Result<()> {
    let raw_args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(raw_args.log_filter()),
    )
    .init();

    let args = ParsedArgs::from_args(raw_args)?;
    let dump = args.dump.as_deref();

    // one bad file shouldn't hide the rest
    let process = |path: &PathBuf| match process_cursor(path, dump) {
        Ok(line) => {
            println!("{line}");
            true
        }
        Err(err) => {
            log::error!("{err:#}");
            false
        }
    };

    let failed = if args.use_rayon {
        args.cursor_paths
            .par_iter()
            .map(process)
            .filter(|ok| !ok)
            .count()
    } else {
        args.cursor_paths
            .iter()
            .map(process)
            .filter(|ok| !ok)
            .count()
    };

    if failed > 0 {
        bail!(
            "failed to decode {failed} of {} cursor(s)",
            args.cursor_paths.len()
        );
    }

    Ok(())
}
