//! folio - normalize a text or PalmDoc file into a flow document

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use folio::import::{self, ParagraphBreak, TextConfig};
use folio::sink::{HtmlConfig, HtmlSink, RawSink, RecordingSink};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// Indented trace of sink calls
    Raw,
    /// XHTML document
    Html,
    /// Sink calls as JSON
    Events,
}

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Normalize documents into a balanced flow structure", long_about = None)]
#[command(after_help = "EXAMPLES:
    folio notes.txt                    Print the raw event trace
    folio book.pdb book.html -f html   Convert a PalmDoc e-book to XHTML
    folio notes.txt -f events -b       Dump JSON events, blank-line paragraphs")]
struct Cli {
    /// Input file (.pdb/.prc for PalmDoc, anything else is read as text)
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (defaults to stdout)
    #[arg(value_name = "OUTPUT")]
    output: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Raw)]
    format: OutputFormat,

    /// Input encoding label (e.g. utf-8, windows-1252, iso-8859-2)
    #[arg(short, long)]
    encoding: Option<String>,

    /// Separate paragraphs by blank lines instead of newlines
    #[arg(short, long)]
    blank_lines: bool,

    /// Suppress status messages
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let mut config = TextConfig {
        paragraphs: if cli.blank_lines {
            ParagraphBreak::BlankLine
        } else {
            ParagraphBreak::Line
        },
        ..TextConfig::default()
    };
    if let Some(label) = &cli.encoding {
        config = config
            .with_encoding_label(label)
            .ok_or_else(|| format!("unknown encoding: {label}"))?;
    }

    let importer = import::open(Path::new(&cli.input), config).map_err(|e| e.to_string())?;

    let rendered = match cli.format {
        OutputFormat::Raw => {
            let mut sink = RawSink::new();
            import::convert(importer.as_ref(), &mut sink).map_err(|e| e.to_string())?;
            sink.into_string()
        }
        OutputFormat::Html => {
            let mut sink = HtmlSink::with_config(HtmlConfig::default());
            import::convert(importer.as_ref(), &mut sink).map_err(|e| e.to_string())?;
            sink.into_string()
        }
        OutputFormat::Events => {
            let mut sink = RecordingSink::new();
            import::convert(importer.as_ref(), &mut sink).map_err(|e| e.to_string())?;
            serde_json::to_string_pretty(sink.events()).map_err(|e| e.to_string())?
        }
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, rendered).map_err(|e| e.to_string())?;
            if !cli.quiet {
                eprintln!("Wrote {} -> {path}", cli.input);
            }
        }
        None => print!("{rendered}"),
    }

    Ok(())
}
