use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueHint};
use log::{error, info};

use slicemerge::batch::{self, BatchReport};
use slicemerge::{Config, MergeMode, SampleLookup};

#[derive(Parser, Debug)]
#[command(author, version, about = "Merge and normalize slice traces across brains", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Average the n-th slice of every brain folder into results/Snn.csv
    Merge(CombineArgs),
    /// Put one channel of the n-th slice of two brains side by side in results/Snn.csv
    Split(CombineArgs),
    /// Normalize one channel into [0, 1] across a folder of slices
    Normalize(NormalizeArgs),
}

#[derive(Parser, Debug)]
struct CombineArgs {
    /// Folder holding one sub-folder of slice files per brain
    #[arg(short, long, default_value = "brains", value_hint = ValueHint::DirPath)]
    input: PathBuf,

    /// Folder the combined slices are written to
    #[arg(short, long, default_value = "results", value_hint = ValueHint::DirPath)]
    output: PathBuf,

    /// Evenly spaced steps per combined slice
    #[arg(short, long)]
    resolution: Option<usize>,

    /// 1-based channel taken from each brain by `split`
    #[arg(short, long)]
    channel: Option<usize>,

    /// How values between input samples are obtained
    #[arg(long, value_enum)]
    lookup: Option<SampleLookup>,

    /// JSON file with base settings; flags override it
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct NormalizeArgs {
    /// Folder of slice files to normalize together
    #[arg(short, long, default_value = "slices", value_hint = ValueHint::DirPath)]
    input: PathBuf,

    /// Folder the normalized slices are written to
    #[arg(short, long, default_value = "results", value_hint = ValueHint::DirPath)]
    output: PathBuf,

    /// 1-based channel to normalize
    #[arg(short, long)]
    channel: Option<usize>,

    /// JSON file with base settings; flags override it
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(report) => {
            error!(
                "{} of {} outputs failed",
                report.failed.len(),
                report.failed.len() + report.written.len()
            );
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<BatchReport> {
    let report = match cli.command {
        Command::Merge(args) => combine(&args, MergeMode::Average)?,
        Command::Split(args) => combine(&args, MergeMode::Split)?,
        Command::Normalize(args) => {
            let config = args.to_config()?;
            let inputs = batch::list_trace_files(&args.input)?;
            batch::run_normalize(&inputs, &args.output, &config)?
        }
    };

    info!("wrote {} file(s)", report.written.len());
    Ok(report)
}

fn combine(args: &CombineArgs, mode: MergeMode) -> Result<BatchReport> {
    let config = args.to_config(mode)?;
    let groups = batch::discover_groups(&args.input)?;
    batch::run_combine(&groups, &args.output, &config)
}

impl CombineArgs {
    /// The JSON config (or defaults) with every given flag applied on top.
    /// The subcommand decides the mode.
    fn to_config(&self, mode: MergeMode) -> Result<Config> {
        let mut config = base_config(self.config.as_ref())?;
        config.mode = mode;
        if let Some(resolution) = self.resolution {
            config.resolution = resolution;
        }
        if let Some(channel) = self.channel {
            config.channel = channel;
        }
        if let Some(lookup) = self.lookup {
            config.lookup = lookup;
        }
        Ok(config)
    }
}

impl NormalizeArgs {
    fn to_config(&self) -> Result<Config> {
        let mut config = base_config(self.config.as_ref())?;
        if let Some(channel) = self.channel {
            config.channel = channel;
        }
        Ok(config)
    }
}

fn base_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::from_json_file(path),
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Command {
        Cli::try_parse_from(std::iter::once("slicemerge").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    fn json_config(dir: &tempfile::TempDir) -> String {
        let path = dir.path().join("run.json");
        std::fs::write(
            &path,
            r#"{ "resolution": 250, "channel": 3, "mode": "average", "lookup": "linear" }"#,
        )
        .unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn flags_override_json_values() {
        let dir = tempfile::tempdir().unwrap();
        let json = json_config(&dir);
        let Command::Split(args) = parse(&["split", "--config", &json, "-c", "2", "--lookup", "next-sample"])
        else {
            panic!("expected split");
        };
        let config = args.to_config(MergeMode::Split).unwrap();
        assert_eq!(config.mode, MergeMode::Split);
        assert_eq!(config.channel, 2);
        assert_eq!(config.lookup, SampleLookup::NextSample);
        assert_eq!(config.resolution, 250);
    }

    #[test]
    fn json_values_stand_without_flags() {
        let dir = tempfile::tempdir().unwrap();
        let json = json_config(&dir);
        let Command::Merge(args) = parse(&["merge", "--config", &json]) else {
            panic!("expected merge");
        };
        let config = args.to_config(MergeMode::Average).unwrap();
        assert_eq!(
            (config.resolution, config.channel, config.lookup),
            (250, 3, SampleLookup::Linear)
        );

        let Command::Normalize(args) = parse(&["normalize", "--config", &json, "-c", "1"]) else {
            panic!("expected normalize");
        };
        let config = args.to_config().unwrap();
        assert_eq!((config.channel, config.resolution), (1, 250));
    }

    #[test]
    fn defaults_without_config_file() {
        let Command::Merge(args) = parse(&["merge", "-r", "100"]) else {
            panic!("expected merge");
        };
        assert_eq!(args.input, PathBuf::from("brains"));
        assert_eq!(args.output, PathBuf::from("results"));
        let config = args.to_config(MergeMode::Average).unwrap();
        assert_eq!(config, Config { resolution: 100, ..Config::default() });
    }

    #[test]
    fn subcommands_are_merge_split_normalize() {
        assert!(matches!(parse(&["merge"]), Command::Merge(_)));
        assert!(matches!(parse(&["split"]), Command::Split(_)));
        assert!(matches!(parse(&["normalize"]), Command::Normalize(_)));
        assert!(Cli::try_parse_from(["slicemerge", "combine"]).is_err());
        assert!(Cli::try_parse_from(["slicemerge", "merge", "--mode", "split"]).is_err());
    }
}
