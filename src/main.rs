use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use log::info;
use structured_logger::json::new_writer;
use structured_logger::Builder;

use overpass_rs::config::load_config;
use overpass_rs::errors::Result;
use overpass_rs::format::{geojson, osm_xml};
use overpass_rs::{ElementKind, Overpass, OverpassConfig, Query, ResultSet};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// Element count per kind
    Summary,
    Geojson,
    OsmXml,
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
/// Send an Overpass QL query and print what came back
struct Args {
    /// JSON file with the client configuration
    #[clap(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[clap(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,

    /// File holding the query, `-` reads it from stdin
    #[clap(value_name = "QUERY")]
    query: PathBuf,
}

fn setup_logging(level: &str) {
    Builder::with_level(level)
        .with_target_writer("*", new_writer(io::stderr()))
        .init();
}

fn read_query(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut query = String::new();
        io::stdin().read_to_string(&mut query)?;
        Ok(query)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn print_summary(result: &ResultSet, mut out: impl Write) -> Result<()> {
    for kind in ElementKind::ALL {
        writeln!(out, "{kind}s: {}", result.count(kind))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => OverpassConfig::default(),
    };
    setup_logging(&config.log_level);

    let query = read_query(&args.query)?;
    let api = Overpass::new(config)?;
    info!(url = api.url(); "Running query");
    let result = api.query(&query)?;

    let stdout = io::stdout().lock();
    match args.format {
        OutputFormat::Summary => print_summary(&result, stdout)?,
        OutputFormat::Geojson => geojson::dump(&result, stdout, true, true)?,
        OutputFormat::OsmXml => osm_xml::dump(&result, stdout)?,
    }
    Ok(())
}
