//! Tertian CLI — inspect the chord-symbol library from a terminal.
//!
//! `tertian parse "Cm7/E-"` shows the structured symbol and its realized
//! pitches; `tertian classify E3 G3 B-3 C4` names an arbitrary pitch
//! collection; `tertian kinds` lists the registered table.

use clap::{Parser, Subcommand};

use tertian::kind::KindTable;
use tertian::pitch::Pitch;
use tertian::{classify, figure, realize};

#[derive(Parser)]
#[command(name = "tertian", version, about = "Chord-symbol figures on the command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a figure and show its structure and realized pitches.
    Parse {
        /// Figure text, e.g. "Cm7", "G9#5", "F#m11/G#"
        figure: String,
    },
    /// Classify a pitch collection back to a figure.
    Classify {
        /// Pitch names with octaves, e.g. E3 G3 B-3 C4
        notes: Vec<String>,
        /// Treat this pitch as the root instead of finding one.
        #[arg(long)]
        root: Option<String>,
    },
    /// List the registered chord kinds in priority order.
    Kinds,
}

fn main() {
    let cli = Cli::parse();
    if let Err(message) = run(cli) {
        eprintln!("error: {message}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Parse { figure: text } => {
            let symbol = figure::parse(&text).map_err(|e| e.to_string())?;
            println!("root: {}", symbol.root.name());
            if let Some(bass) = &symbol.bass {
                println!("bass: {}", bass.name());
            }
            println!("kind: {}", symbol.kind.as_deref().unwrap_or("(unknown)"));
            for m in &symbol.modifications {
                println!(
                    "mod:  {} degree {} ({:+} semitones)",
                    m.mod_type.keyword(),
                    m.degree,
                    m.alter
                );
            }
            let chord = realize::realize(&symbol).map_err(|e| e.to_string())?;
            println!("pitches: {}", chord.pitch_names().join(" "));
            Ok(())
        }
        Command::Classify { notes, root } => {
            let pitches: Vec<Pitch> = notes
                .iter()
                .map(|n| Pitch::parse(n).ok_or_else(|| format!("bad pitch name: {n:?}")))
                .collect::<Result<_, _>>()?;
            let result = match root {
                Some(name) => {
                    let root =
                        Pitch::parse(&name).ok_or_else(|| format!("bad root name: {name:?}"))?;
                    classify::classify(&pitches, &root)
                }
                None => classify::classify_collection(&pitches).map_err(|e| e.to_string())?,
            };
            match result {
                Some(found) => println!("{} ({})", found.figure, found.kind),
                None => println!("unclassifiable"),
            }
            Ok(())
        }
        Command::Kinds => {
            let table = KindTable::global();
            for def in table.snapshot() {
                let abbrevs = def
                    .abbreviations
                    .iter()
                    .map(|a| if a.is_empty() { "(empty)" } else { a.as_str() })
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("{:28} {:?}  [{}]", def.name, def.family, abbrevs);
            }
            Ok(())
        }
    }
}
