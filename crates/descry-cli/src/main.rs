//! descry - Turn serialized protobuf descriptors into JSON schema trees
//!
//! This tool reads a `FileDescriptorSet` (as written by
//! `protoc --descriptor_set_out`) or a single `FileDescriptorProto`, builds
//! the normalized schema tree and prints it as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use descry_core::schema::{Enum, MapField, Service, Type};
use descry_core::{
    convert_file_descriptor, convert_file_descriptor_set, visit, ConversionOptions, Namespace,
    VisitContext, Visitor,
};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

/// Turn serialized protobuf descriptors into JSON schema trees
#[derive(Parser, Debug)]
#[command(name = "descry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Serialized descriptor file; reads stdin when absent or `-`
    input: Option<PathBuf>,

    /// Input is a single FileDescriptorProto instead of a FileDescriptorSet
    #[arg(long)]
    single_file: bool,

    /// Keep field names as written instead of camelCasing them
    #[arg(long)]
    keep_case: bool,

    /// Sort reserved names and ranges
    #[arg(long)]
    sort_reserved: bool,

    /// Rewrite type references to fully-qualified names
    #[arg(long)]
    absolute_types: bool,

    /// Write JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit single-line JSON
    #[arg(long)]
    compact: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn options(&self) -> ConversionOptions {
        ConversionOptions::new()
            .keep_case(self.keep_case)
            .sort_reserved(self.sort_reserved)
            .absolute_types(self.absolute_types)
    }
}

/// Counts what ended up in the tree
#[derive(Debug, Default, PartialEq, Eq)]
struct Stats {
    types: usize,
    maps: usize,
    enums: usize,
    services: usize,
}

impl Visitor for Stats {
    fn visit_type(&mut self, _: &Type, _: &mut VisitContext<'_>) {
        self.types += 1;
    }

    fn visit_map_field(&mut self, _: &MapField, _: &mut VisitContext<'_>) {
        self.maps += 1;
    }

    fn visit_enum(&mut self, _: &Enum, _: &mut VisitContext<'_>) {
        self.enums += 1;
    }

    fn visit_service(&mut self, _: &Service, _: &mut VisitContext<'_>) {
        self.services += 1;
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let data = read_input(cli.input.as_deref())?;
    debug!("Read {} bytes of descriptor data", data.len());

    let root = convert(cli, &data)?;

    let mut stats = Stats::default();
    visit(&root, &mut stats);
    info!(
        "Built {} types ({} map fields), {} enums, {} services",
        stats.types, stats.maps, stats.enums, stats.services
    );

    let mut rendered = if cli.compact {
        serde_json::to_string(&root.to_json())?
    } else {
        serde_json::to_string_pretty(&root.to_json())?
    };
    rendered.push('\n');

    match &cli.output {
        Some(path) => write_output(path, &rendered),
        None => std::io::stdout()
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout"),
    }
}

fn convert(cli: &Cli, data: &[u8]) -> Result<Namespace> {
    let options = cli.options();
    if cli.single_file {
        convert_file_descriptor(data, &options).context("Failed to convert FileDescriptorProto")
    } else {
        convert_file_descriptor_set(data, &options).context("Failed to convert FileDescriptorSet")
    }
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) if path != Path::new("-") => {
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        _ => {
            let mut data = Vec::new();
            std::io::stdin()
                .read_to_end(&mut data)
                .context("Failed to read stdin")?;
            Ok(data)
        }
    }
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write file: {}", path.display()))
}
