// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command-line interface code.
//!
//! Only 2 things should be public in this module: `Mmp` and `Mmp::run`.


use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use clap::{AppSettings, Args, Parser, Subcommand};
use indexmap::IndexMap;
use log::{debug, info};
use serde::Serialize;

use crate::{
    binning::BinnedGrid,
    params::DeploymentParams,
    pipeline::{process_deployment, RawDeployment},
    MmpError, PROGRESS_BARS,
};

#[derive(Debug, Parser)]
#[clap(
    version,
    author,
    about = "Processing of McLane Moored Profiler CTD, engineering and current-meter data"
)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(disable_help_subcommand = true)]
#[clap(infer_subcommands = true)]
#[clap(propagate_version = true)]
#[clap(infer_long_args = true)]
pub struct Mmp {
    #[clap(flatten)]
    global_opts: GlobalArgs,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Don't draw progress bars.
    #[clap(long)]
    #[clap(global = true)]
    no_progress_bars: bool,

    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[clap(short, long, parse(from_occurrences))]
    #[clap(global = true)]
    verbosity: u8,

    /// Only verify that inputs were correctly ingested and print out
    /// high-level information.
    #[clap(long)]
    #[clap(global = true)]
    dry_run: bool,
}

#[derive(Debug, Subcommand)]
#[clap(arg_required_else_help = true)]
enum Command {
    #[clap(about = "Process the raw profiles of a deployment into binned products.")]
    Process(ProcessArgs),

    #[clap(about = "Check that a parameter file can be read and print what it resolves to.")]
    VerifyParams(VerifyParamsArgs),
}

#[derive(Debug, Args)]
struct ProcessArgs {
    /// The deployment's processing parameters, as a TOML or JSON file.
    #[clap(name = "PARAMETER_FILE", parse(from_os_str))]
    params_file: PathBuf,

    /// The raw CTD, engineering and current-meter profiles, as JSON.
    #[clap(short, long, parse(from_os_str))]
    raw: PathBuf,

    /// Where to write the binned grids.
    #[clap(short, long, default_value = "mmp_binned.json", parse(from_os_str))]
    output: PathBuf,

    /// Also write the processed (unbinned) collections, their padded and
    /// flat layouts, and the phase ambiguity records here.
    #[clap(long, parse(from_os_str))]
    processed: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct VerifyParamsArgs {
    #[clap(name = "PARAMETER_FILES", parse(from_os_str))]
    params_files: Vec<PathBuf>,
}

impl Mmp {
    pub fn run(self) -> Result<(), MmpError> {
        let GlobalArgs {
            no_progress_bars,
            verbosity,
            dry_run,
        } = self.global_opts;
        setup_logging(verbosity)?;
        // Enable progress bars if the user didn't say "no progress bars".
        if !no_progress_bars {
            PROGRESS_BARS.store(true);
        }

        let sub_command = match &self.command {
            Command::Process(_) => "process",
            Command::VerifyParams(_) => "verify-params",
        };
        info!("mmp {} {}", sub_command, env!("CARGO_PKG_VERSION"));

        match self.command {
            Command::Process(args) => args.run(dry_run)?,
            Command::VerifyParams(args) => args.run()?,
        }

        info!("mmp {} complete.", sub_command);
        Ok(())
    }
}

impl ProcessArgs {
    fn run(self, dry_run: bool) -> Result<(), MmpError> {
        let params = DeploymentParams::read(&self.params_file)?;
        debug!("Parameters: {params:?}");
        let raw = read_raw_deployment(&self.raw)?;
        info!(
            "Read {} CTD, {} engineering and {} current-meter profiles from {}",
            raw.ctd.len(),
            raw.eng.len(),
            raw.current_meter.len(),
            self.raw.display()
        );
        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let products = process_deployment(raw, &params)?;

        let binned: IndexMap<String, &BinnedGrid> = products
            .binned
            .iter()
            .map(|g| (g.instrument.to_string(), g))
            .collect();
        write_json(&self.output, &binned)?;
        info!("Wrote binned grids to {}", self.output.display());

        if let Some(processed) = self.processed {
            write_json(&processed, &products)?;
            info!("Wrote processed profiles to {}", processed.display());
        }
        Ok(())
    }
}

impl VerifyParamsArgs {
    fn run(self) -> Result<(), MmpError> {
        for file in self.params_files {
            let params = DeploymentParams::read(&file)?;
            info!("{} is a valid parameter file:", file.display());
            for line in toml::to_string_pretty(&params)?.lines() {
                info!("    {line}");
            }
        }
        Ok(())
    }
}

fn read_raw_deployment(file: &Path) -> Result<RawDeployment, MmpError> {
    let reader = BufReader::new(File::open(file)?);
    serde_json::from_reader(reader).map_err(|err| MmpError::RawDeployment {
        file: file.to_path_buf(),
        err,
    })
}

fn write_json<T: Serialize + ?Sized>(file: &Path, value: &T) -> Result<(), MmpError> {
    let mut f = BufWriter::new(File::create(file)?);
    serde_json::to_writer_pretty(&mut f, value)?;
    f.flush()?;
    Ok(())
}

/// Activate a logger. All log messages are put onto `stdout`. `env_logger`
/// automatically only uses colours and fancy symbols if we're on a tty (e.g. a
/// terminal); piped output will be formatted sensibly. Source code lines are
/// displayed in log messages when verbosity >= 3.
fn setup_logging(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stdout);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        2 => builder.filter_level(log::LevelFilter::Trace),
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
            builder.format(|buf, record| {
                let timestamp = buf.timestamp();
                let level = record.level();
                let target = record.target();
                let line = record.line().unwrap_or(0);
                let message = record.args();

                writeln!(buf, "[{timestamp} {level} {target}:{line}] {message}")
            })
        }
    };
    builder.try_init()
}
