#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::missing_safety_doc,
    clippy::missing_const_for_fn
)]
#![allow(clippy::as_conversions, clippy::mod_module_files)]

use std::{error, process};

mod commands;
mod output;

use commands::Commands;
use output::OutputFormat;

use clap::{Args, Parser};

fn main() {
    if let Err(err) = try_main() {
        eprintln!("{err}");
        process::exit(2);
    }
}

fn try_main() -> Result<(), Box<dyn error::Error>> {
    let Cli {
        command,
        global_opts:
            GlobalOpts {
                collection,
                format,
                clio,
                page_size,
                verbosity,
                quiet,
            },
    } = Cli::parse();

    setup_errlog(verbosity as usize, quiet)?;

    command.execute(&collection, format, clio, page_size)?;
    Ok(())
}

fn setup_errlog(verbosity: usize, quiet: bool) -> Result<(), Box<dyn error::Error>> {
    // if quiet then ignore verbosity but still show errors
    let verbosity = if quiet { 1 } else { verbosity + 2 };

    stderrlog::new().verbosity(verbosity).init()?;
    Ok(())
}

#[derive(Parser)]
#[clap(name = "iae")]
#[clap(about = "Fetch Internet Archive ebook metadata, with CLIO catalog enrichment")]
#[clap(version, author)]
#[clap(arg_required_else_help = true)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(flatten)]
    global_opts: GlobalOpts,
}

#[derive(Debug, Args)]
struct GlobalOpts {
    /// The Internet Archive collection to query
    #[clap(
        short = 'C',
        long,
        default_value = "ColumbiaUniversityLibraries",
        global = true
    )]
    collection: String,

    /// How to display the fetched data
    #[clap(short = 'F', long, arg_enum, default_value = "json", global = true)]
    format: OutputFormat,

    /// Enrich documents with their CLIO catalog records
    #[clap(long, global = true)]
    clio: bool,

    /// Documents fetched per search page
    #[clap(short = 'n', long, global = true)]
    page_size: Option<usize>,

    /// How chatty the program is when performing commands
    ///
    /// The number of times this flag is used will increase how chatty
    /// the program is.
    #[clap(short, long, parse(from_occurrences), global = true)]
    verbosity: u8,

    /// Prevents the program from logging progress to stderr, errors will still be printed.
    #[clap(short, long, global = true)]
    quiet: bool,
}
