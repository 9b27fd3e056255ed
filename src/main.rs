use anyhow::{Context, Result};
use clap::Parser;

use midi2mom::{convert_file, Error};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(short, long)]
    midi_file: String,

    #[arg(
        long,
        help = "Fail on overlapping note-ons instead of keeping the most recent start"
    )]
    strict: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    match convert_file(&args.midi_file, args.strict) {
        Ok(conversion) => {
            for warning in &conversion.warnings {
                eprintln!("WARNING: {}", warning);
            }
            println!(
                "Successfully created note table: {}",
                conversion.output_path.display()
            );
            Ok(())
        }
        Err(Error::NotMidi { .. }) => {
            // Refused input, not a failure of the tool itself.
            eprintln!("Please select a midi file!");
            Ok(())
        }
        Err(err) => Err(err).with_context(|| format!("convert {}", args.midi_file)),
    }
}
