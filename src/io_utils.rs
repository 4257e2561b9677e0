//! I/O utilities for snapshot input and schema document output.
//!
//! All file I/O in shape-probe flows through this module:
//!
//! - **Format resolution**: extension-based detection (`.yml`/`.yaml` → YAML,
//!   anything else → JSON) with a manual `--format` override.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.
//! - **Serialization**: `serde_json` for JSON, `serde_yaml` for YAML.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Serialize, de::DeserializeOwned};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_format(path: Option<&Path>, provided: Option<DocumentFormat>) -> DocumentFormat {
    if let Some(format) = provided {
        return format;
    }
    match path
        .filter(|p| !is_dash(p))
        .and_then(|p| p.extension())
        .and_then(|ext| ext.to_str())
    {
        Some(ext) if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml") => {
            DocumentFormat::Yaml
        }
        _ => DocumentFormat::Json,
    }
}

fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    if is_dash(path) {
        Ok(Box::new(io::stdin().lock()))
    } else {
        Ok(Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        )))
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(p) if !is_dash(p) => Ok(Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        ))),
        _ => Ok(Box::new(io::stdout())),
    }
}

pub fn read_document<T: DeserializeOwned>(
    path: &Path,
    format: Option<DocumentFormat>,
) -> Result<T> {
    let mut reader = open_input(path)?;
    let mut raw = String::new();
    reader
        .read_to_string(&mut raw)
        .with_context(|| format!("Reading {path:?}"))?;
    parse_document(&raw, resolve_format(Some(path), format))
}

pub fn parse_document<T: DeserializeOwned>(raw: &str, format: DocumentFormat) -> Result<T> {
    match format {
        DocumentFormat::Json => serde_json::from_str(raw).context("Parsing JSON document"),
        DocumentFormat::Yaml => serde_yaml::from_str(raw).context("Parsing YAML document"),
    }
}

pub fn render_document<T: Serialize>(value: &T, format: DocumentFormat) -> Result<String> {
    match format {
        DocumentFormat::Json => {
            let mut rendered =
                serde_json::to_string_pretty(value).context("Serializing JSON document")?;
            rendered.push('\n');
            Ok(rendered)
        }
        DocumentFormat::Yaml => serde_yaml::to_string(value).context("Serializing YAML document"),
    }
}

pub fn write_document<T: Serialize>(
    path: Option<&Path>,
    value: &T,
    format: Option<DocumentFormat>,
) -> Result<()> {
    let rendered = render_document(value, resolve_format(path, format))?;
    let mut writer = open_output(path)?;
    writer
        .write_all(rendered.as_bytes())
        .context("Writing output document")?;
    writer.flush().context("Flushing output document")
}
