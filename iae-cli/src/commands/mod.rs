use std::io::{self, Write};

use crate::output::{self, OutputFormat};

use iae::{marc, Doc, Links};

use clap::Subcommand;
use eyre::eyre;
use log::trace;
use serde_json::Value;

// Ebook listings run much longer than collection listings, so they fetch
// larger pages.
const EBOOK_PAGE_SIZE: usize = 100;

#[derive(Subcommand)]
#[non_exhaustive]
pub enum Commands {
    /// List the collections held in the collection
    ///
    /// Documents are reduced to their identifier and description. Any listed
    /// identifier can be passed back as the `--collection` option of the
    /// other commands.
    ListCollections,

    /// List the ebooks held in the collection
    ///
    /// With `--clio` every document is enriched with its CLIO catalog record,
    /// which is slow and subject to the catalog's rate limiting.
    ListEbooks,

    /// Fetch a single document by its Internet Archive identifier
    #[clap(arg_required_else_help = true)]
    Ebook {
        /// The Internet Archive document identifier
        identifier: String,
    },

    /// Fetch a single MARC record from CLIO and print it as JSON
    #[clap(arg_required_else_help = true)]
    Clio {
        /// The CLIO bib id
        bib_id: String,
    },
}

impl Commands {
    pub fn execute(
        self,
        collection: &str,
        format: OutputFormat,
        clio: bool,
        page_size: Option<usize>,
    ) -> eyre::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();

        match self {
            Commands::ListCollections => {
                trace!("Listing collections in '{collection}'");
                let docs =
                    iae::collections_in(collection, page_size.unwrap_or(iae::DEFAULT_PAGE_SIZE));
                match format.delimiter() {
                    None => {
                        let summaries = docs.map(|doc| Ok(collection_summary(&doc?)));
                        output::json_array(&mut out, summaries)
                    }
                    Some(delimiter) => {
                        let rows = docs.map(|doc| {
                            let doc = doc?;
                            Ok(vec![
                                field_text(&doc, "identifier"),
                                field_text(&doc, "description"),
                            ])
                        });
                        output::delimited(&mut out, delimiter, &["identifier", "description"], rows)
                    }
                }
            }
            Commands::ListEbooks => {
                trace!("Listing ebooks in '{collection}'");
                let docs = iae::ebooks_in(collection, page_size.unwrap_or(EBOOK_PAGE_SIZE));
                match format.delimiter() {
                    None => {
                        let docs = docs.map(|doc| Ok(Value::Object(annotate(doc?, clio)?)));
                        output::json_array(&mut out, docs)
                    }
                    Some(delimiter) => {
                        let rows = docs.map(|doc| {
                            let doc = doc?;
                            let bib_id = iae::bib_id(&doc).unwrap_or_default();
                            Ok(vec![field_text(&doc, "identifier"), bib_id])
                        });
                        output::delimited(&mut out, delimiter, &["identifier", "clio_id"], rows)
                    }
                }
            }
            Commands::Ebook { identifier } => {
                trace!("Fetching the document '{identifier}'");
                let doc = iae::document_by_identifier(&identifier)?.ok_or_else(|| {
                    eyre!("No document found with the identifier of '{identifier}'")
                })?;
                match format.delimiter() {
                    None => {
                        let doc = annotate(doc, clio)?;
                        let text = serde_json::to_string_pretty(&Value::Object(doc))?;
                        writeln!(out, "{text}")?;
                        Ok(())
                    }
                    Some(delimiter) => {
                        let bib_id = iae::bib_id(&doc).unwrap_or_default();
                        let row = vec![field_text(&doc, "identifier"), bib_id];
                        output::delimited(
                            &mut out,
                            delimiter,
                            &["identifier", "clio_id"],
                            std::iter::once(Ok(row)),
                        )
                    }
                }
            }
            Commands::Clio { bib_id } => {
                trace!("Fetching the CLIO record '{bib_id}'");
                let record = iae::record_by_bib_id(&bib_id)?;
                let text = serde_json::to_string_pretty(&record.to_json())?;
                writeln!(out, "{text}")?;
                Ok(())
            }
        }
    }
}

/// Adds the derived links and, when asked for, the CLIO record to a document.
///
/// A document without a recognisable bib id gets an empty placeholder record
/// so that the `clio` key is present on every document of a listing.
fn annotate(mut doc: Doc, with_clio: bool) -> eyre::Result<Doc> {
    let links = doc
        .get("identifier")
        .and_then(Value::as_str)
        .map(Links::from_identifier);

    if with_clio {
        let record = match iae::bib_id(&doc) {
            Some(bib_id) => iae::record_by_bib_id(&bib_id)?,
            None => marc::Record::default(),
        };
        doc.insert("clio".to_owned(), record.to_json());
    }
    if let Some(links) = links {
        doc.insert("links".to_owned(), serde_json::to_value(links)?);
    }
    Ok(doc)
}

fn collection_summary(doc: &Doc) -> Value {
    serde_json::json!({
        "identifier": doc.get("identifier").cloned().unwrap_or(Value::Null),
        "description": doc.get("description").cloned().unwrap_or(Value::Null),
    })
}

// Archive metadata values are strings more often than not, but repeated
// fields come back as arrays.
fn field_text(doc: &Doc, key: &str) -> String {
    match doc.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(values)) => {
            let parts: Vec<&str> = values.iter().filter_map(Value::as_str).collect();
            parts.join(" ")
        }
        None | Some(Value::Null) => String::new(),
        Some(value) => value.to_string(),
    }
}
