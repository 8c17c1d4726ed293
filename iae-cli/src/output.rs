use std::io::Write;

use clap::ArgEnum;
use serde_json::Value;

/// How fetched documents are written to stdout.
#[derive(ArgEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// A JSON array of documents
    Json,
    /// Comma separated rows
    Csv,
    /// Tab separated rows
    Tsv,
}

impl OutputFormat {
    /// The field delimiter for row output, `None` for JSON.
    pub const fn delimiter(self) -> Option<u8> {
        match self {
            Self::Json => None,
            Self::Csv => Some(b','),
            Self::Tsv => Some(b'\t'),
        }
    }
}

/// Streams documents as a pretty printed JSON array.
///
/// The brackets are written around the documents as they arrive, one document
/// at a time, so a listing larger than memory can still be emitted.
pub fn json_array<W, I>(mut out: W, docs: I) -> eyre::Result<()>
where
    W: Write,
    I: Iterator<Item = eyre::Result<Value>>,
{
    writeln!(out, "[")?;
    let mut first = true;
    for doc in docs {
        let doc = doc?;
        if !first {
            writeln!(out, ",")?;
        }
        first = false;
        let text = serde_json::to_string_pretty(&doc)?;
        writeln!(out, "{text}")?;
    }
    writeln!(out, "]")?;
    Ok(())
}

/// Writes a header row and one delimited row per document.
pub fn delimited<W, I>(out: W, delimiter: u8, header: &[&str], rows: I) -> eyre::Result<()>
where
    W: Write,
    I: Iterator<Item = eyre::Result<Vec<String>>>,
{
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(out);

    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row?)?;
    }
    writer.flush()?;
    Ok(())
}
