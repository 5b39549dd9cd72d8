//! Binary entry point for the `dsstore` inspection CLI.
#![forbid(unsafe_code)]

#[path = "cli/config.rs"]
mod config;
#[path = "cli/ui.rs"]
mod ui;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use dsstore::{
    alias::AliasRecord,
    logging::{init_logging, LoggingError},
    storage::{
        allocator::DirectoryEntry,
        btree::{BTreeMetadata, TreeStats},
        freespace::{self, FreeRange},
    },
    BinaryPlistDecoder, DecodeOptions, DsStore, DsStoreError, FourCC, Record, RecordValue,
};
use serde::Serialize;
use thiserror::Error;

use config::{CliConfig, ConfigError};
use ui::Ui;

const DEFAULT_LOG_LEVEL: &str = "warn";
const BLOB_PREVIEW_BYTES: usize = 32;

#[derive(Parser, Debug)]
#[command(
    name = "dsstore",
    version,
    about = "Inspect macOS .DS_Store files",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "DSSTORE_CONFIG",
        value_name = "FILE",
        help = "Path to cli.toml"
    )]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, help = "Output format")]
    format: Option<OutputFormat>,

    #[arg(long, global = true, value_enum, help = "Colour theme for text output")]
    theme: Option<Theme>,

    #[arg(
        long,
        global = true,
        env = "DSSTORE_LOG",
        value_name = "FILTER",
        help = "Log filter, e.g. warn or dsstore=debug"
    )]
    log_level: Option<String>,

    #[command(flatten)]
    decode: DecodeArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    #[arg(long, global = true, help = "Largest tree height accepted")]
    max_depth: Option<u32>,

    #[arg(
        long,
        global = true,
        help = "Keep embedded property lists as raw blobs"
    )]
    raw_plists: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the allocator header, directory and tree metadata
    Info {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// List records in key order
    Records(RecordsCmd),
    /// Show coalesced free space
    Free {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// Decode the folder's background image alias
    Alias {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct RecordsCmd {
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    #[arg(long, help = "Only records for this filename")]
    filename: Option<String>,

    #[arg(long = "type", value_name = "CODE", help = "Only records with this type, e.g. Iloc")]
    record_type: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Theme {
    Auto,
    Light,
    Dark,
    Plain,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
    #[error("{}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: DsStoreError,
    },
    #[error("background alias: {0}")]
    Alias(DsStoreError),
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no input file given and no home directory to default to")]
    NoInput,
    #[error("record type '{0}' is not a four-byte code")]
    InvalidRecordType(String),
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.clone())?;

    let level = cli
        .log_level
        .as_deref()
        .or_else(|| config.log_level())
        .unwrap_or(DEFAULT_LOG_LEVEL);
    init_logging(level)?;
    tracing::debug!(config = ?config.path(), "loaded CLI config");

    let format = cli.format.or(config.format()).unwrap_or(OutputFormat::Text);
    let ui = Ui::new(cli.theme.or(config.theme()).unwrap_or(Theme::Auto));
    let options = build_decode_options(&cli.decode, &config);

    match cli.command {
        Command::Info { file } => {
            let store = open(file, &config, &options)?;
            let report = InfoReport::new(&store);
            emit(format, &report, || print_info_text(&ui, &report))?;
        }
        Command::Records(cmd) => {
            let store = open(cmd.file.clone(), &config, &options)?;
            let wanted_type = cmd.record_type.as_deref().map(parse_fourcc).transpose()?;
            let records: Vec<&Record> = store
                .records()
                .filter(|r| cmd.filename.as_deref().map_or(true, |name| r.filename == name))
                .filter(|r| wanted_type.map_or(true, |code| r.record_type == code))
                .collect();
            emit(format, &records, || print_records_text(&ui, &records))?;
        }
        Command::Free { file } => {
            let store = open(file, &config, &options)?;
            let report = FreeReport::new(&store);
            emit(format, &report, || print_free_text(&ui, &report))?;
        }
        Command::Alias { file } => {
            let store = open(file, &config, &options)?;
            let alias = store.background_alias().map_err(CliError::Alias)?;
            emit(format, &alias, || print_alias_text(&ui, alias.as_ref()))?;
        }
    }
    Ok(())
}

fn build_decode_options(args: &DecodeArgs, config: &CliConfig) -> DecodeOptions {
    let mut opts = DecodeOptions::default();
    if let Some(depth) = args.max_depth.or(config.max_depth()) {
        opts.max_depth = depth;
    }
    opts.decode_embedded_plists = !(args.raw_plists || config.raw_plists());
    opts
}

fn resolve_input(file: Option<PathBuf>, config: &CliConfig) -> Result<PathBuf, CliError> {
    file.or_else(|| config.default_path().cloned())
        .or_else(|| dirs::home_dir().map(|home| home.join(".DS_Store")))
        .ok_or(CliError::NoInput)
}

fn open(
    file: Option<PathBuf>,
    config: &CliConfig,
    options: &DecodeOptions,
) -> Result<DsStore, CliError> {
    let path = resolve_input(file, config)?;
    DsStore::open_with(&path, options, &BinaryPlistDecoder)
        .map_err(|source| CliError::Decode { path, source })
}

fn parse_fourcc(raw: &str) -> Result<FourCC, CliError> {
    <[u8; 4]>::try_from(raw.as_bytes())
        .map(FourCC)
        .map_err(|_| CliError::InvalidRecordType(raw.to_string()))
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), CliError>
where
    T: Serialize,
    F: FnOnce(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}

#[derive(Serialize)]
struct InfoReport<'a> {
    prologue: u32,
    info_block_offset: u32,
    info_block_size: u32,
    block_count: u32,
    directory: &'a [DirectoryEntry],
    tree: BTreeMetadata,
    stats: TreeStats,
    verification: Option<String>,
}

impl<'a> InfoReport<'a> {
    fn new(store: &'a DsStore) -> Self {
        Self {
            prologue: store.prologue,
            info_block_offset: store.header.info_block_offset,
            info_block_size: store.header.info_block_size,
            block_count: store.allocator.block_count(),
            directory: &store.allocator.directory,
            tree: store.btree.meta,
            stats: store.btree.stats(),
            verification: store.btree.verify_counts().err().map(|e| e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct FreeReport<'a> {
    ranges: &'a [FreeRange],
    total_free: u64,
    inconsistency: Option<String>,
}

impl<'a> FreeReport<'a> {
    fn new(store: &'a DsStore) -> Self {
        Self {
            ranges: &store.free_ranges,
            total_free: store.total_free(),
            inconsistency: freespace::check_consistency(&store.free_ranges)
                .err()
                .map(|e| e.to_string()),
        }
    }
}

fn print_info_text(ui: &Ui, report: &InfoReport<'_>) {
    ui.fields(
        "Allocator",
        [
            ("prologue", report.prologue.to_string()),
            ("info offset", format!("0x{:x}", report.info_block_offset)),
            ("info size", report.info_block_size.to_string()),
            ("blocks", report.block_count.to_string()),
        ],
    );
    ui.entries(
        "Directory",
        report
            .directory
            .iter()
            .map(|entry| format!("{} -> block {}", entry.name, entry.block)),
    );
    ui.fields(
        "B-tree",
        [
            ("root", report.tree.root_block.to_string()),
            ("levels", report.tree.num_levels.to_string()),
            ("records", report.tree.num_records.to_string()),
            ("nodes", report.tree.num_nodes.to_string()),
            ("page size", report.tree.page_size.to_string()),
            ("leaves", report.stats.leaves.to_string()),
            ("internal", report.stats.internal.to_string()),
        ],
    );
    ui.verdict(report.verification.as_deref(), "tree matches its metadata");
}

fn print_records_text(ui: &Ui, records: &[&Record]) {
    for record in records {
        ui.record(&record.filename, record.record_type, &describe_value(&record.value));
    }
}

fn describe_value(value: &RecordValue) -> String {
    match value {
        RecordValue::Long(v) | RecordValue::Short(v) => v.to_string(),
        RecordValue::Bool(v) => v.to_string(),
        RecordValue::Blob(bytes) => describe_blob(bytes),
        RecordValue::Type(code) => code.to_string(),
        RecordValue::Text(text) => format!("{text:?}"),
        RecordValue::Comp(v) => v.to_string(),
        RecordValue::Date(ts) => ts
            .to_datetime()
            .and_then(|dt| dt.format(&time::format_description::well_known::Rfc3339).ok())
            .unwrap_or_else(|| format!("{} ticks", ts.0)),
        RecordValue::PropertyList(plist) => {
            serde_json::to_string(plist).unwrap_or_else(|e| format!("<{e}>"))
        }
        RecordValue::Undecoded { bytes, error } => {
            format!("undecoded ({error}) {}", describe_blob(bytes))
        }
    }
}

fn describe_blob(bytes: &[u8]) -> String {
    let shown = &bytes[..bytes.len().min(BLOB_PREVIEW_BYTES)];
    let ellipsis = if bytes.len() > shown.len() { "…" } else { "" };
    format!("{} bytes {}{ellipsis}", bytes.len(), hex::encode(shown))
}

fn print_free_text(ui: &Ui, report: &FreeReport<'_>) {
    ui.heading("Free ranges");
    for range in report.ranges {
        ui.free_range(range.start, range.end);
    }
    ui.note(&format!("{} bytes free in {} ranges", report.total_free, report.ranges.len()));
    ui.verdict(report.inconsistency.as_deref(), "free ranges do not overlap");
}

fn print_alias_text(ui: &Ui, alias: Option<&AliasRecord>) {
    let Some(alias) = alias else {
        ui.note("no background image alias");
        return;
    };
    ui.fields(
        "Alias",
        [
            ("kind", format!("{:?}", alias.kind)),
            ("volume", alias.target_volume().to_string()),
            ("target", alias.target_name().to_string()),
            ("parent dir", alias.parent_dir_id.to_string()),
            ("file type", alias.file_type.to_string()),
            ("creator", alias.file_creator.to_string()),
            ("version", alias.version.to_string()),
        ],
    );
    ui.entries(
        "Items",
        alias.items.iter().map(|item| match &item.text {
            Some(text) => format!("{:?}: {text}", item.tag),
            None => format!("{:?}: {} bytes", item.tag, item.data.len()),
        }),
    );
}
