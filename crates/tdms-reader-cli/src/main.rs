//! tdmsinfo: print the groups, channels and properties of a TDMS file.

mod error;
mod listing;

use std::path::PathBuf;

use arrow::{array::Array, util::pretty::pretty_format_columns};
use clap::{ArgAction, Parser};
use log::{LevelFilter, info};
use snafu::ResultExt;
use tdms_reader_core::{OpenOptions, SourceKind, TdmsFile};

use crate::{
    error::{
        CliResult, FormatChannelSnafu, OpenFileSnafu, ReadChannelSnafu, SerializeJsonSnafu,
    },
    listing::FileListing,
};

#[derive(Debug, Parser)]
#[command(name = "tdmsinfo", version, about = "Displays TDMS file metadata")]
struct Cli {
    /// Path to the TDMS file to read
    path: PathBuf,

    /// Keep the readable prefix of a file whose last segment is truncated
    #[arg(long, default_value_t = false)]
    recover: bool,

    /// Include file, group and channel properties
    #[arg(short, long, default_value_t = false)]
    properties: bool,

    /// Print the listing as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Print the values of one channel instead of the listing
    #[arg(long, num_args = 2, value_names = ["GROUP", "CHANNEL"])]
    channel: Option<Vec<String>>,

    /// Maximum number of values printed with --channel
    #[arg(long, default_value_t = 20)]
    limit: usize,

    /// Memory-map the file instead of using positioned reads
    #[arg(long, default_value_t = false)]
    mmap: bool,

    /// Log progress: -v for info, -vv for debug (ignores RUST_LOG)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    match verbose {
        0 => env_logger::init(),
        1 => env_logger::builder().filter_level(LevelFilter::Info).init(),
        _ => env_logger::builder().filter_level(LevelFilter::Debug).init(),
    }
}

fn dump_channel(file: &TdmsFile, group: &str, channel: &str, limit: usize) -> CliResult<()> {
    let array = file
        .channel_array(group, channel)
        .context(ReadChannelSnafu { group, channel })?;
    let shown = limit.min(array.len());
    let table = pretty_format_columns(channel, &[array.slice(0, shown)])
        .context(FormatChannelSnafu { group, channel })?;
    println!("{table}");
    if array.len() > shown {
        println!("... {} more values", array.len() - shown);
    }
    Ok(())
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let path = cli.path.display().to_string();
    let source = if cli.mmap {
        SourceKind::Mmap
    } else {
        SourceKind::Buffered
    };
    let file = OpenOptions::new()
        .recover_truncated(cli.recover)
        .source(source)
        .open(&cli.path)
        .context(OpenFileSnafu { path: path.clone() })?;
    info!("opened {path}: {file:?}");

    if let Some(offset) = file.truncated_at() {
        eprintln!("warning: {path} is truncated; ignoring data from byte {offset} on");
    }

    if let Some([group, channel]) = cli.channel.as_deref() {
        return dump_channel(&file, group, channel, cli.limit);
    }

    let listing = FileListing::build(&path, &file, cli.properties)?;
    if cli.json {
        let json = serde_json::to_string_pretty(&listing).context(SerializeJsonSnafu)?;
        println!("{json}");
    } else {
        print!("{listing}");
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
