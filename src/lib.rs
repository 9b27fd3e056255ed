//! MIDI to Mound of Music conversion library
//!
//! Reads a standard MIDI file and writes the flat `id,pitch,time` note
//! table the Mound of Music chart pipeline loads. Event timing comes from
//! the file's tempo map; pitches are remapped onto the game's three-octave
//! encoding, with anything outside it flagged for transposition.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use midly::Smf;
use thiserror::Error;

pub mod extractor;
pub mod note;
pub mod pitch_map;
pub mod table;

pub use extractor::Extractor;
pub use note::{MomNote, NoteEvent, OutOfRange};

/// Errors that can end a conversion run.
#[derive(Error, Debug)]
pub enum Error {
    /// The source path does not end in `.mid`.
    #[error("not a midi file: {}", .path.display())]
    NotMidi { path: PathBuf },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed midi data: {0}")]
    Midi(#[from] midly::Error),

    #[error("table serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// SMPTE-timed files carry no beat grid to price ticks against.
    #[error("SMPTE timecode division is not supported")]
    SmpteTiming,

    /// The key sits outside the whole piano range and has no table entry.
    #[error("key {key} at sequence {sequence} has no pitch mapping")]
    UnmappedKey { key: u8, sequence: u32 },

    /// Strict mode only: a note-on arrived for a key that is still sounding.
    #[error("note-on for key {key} at sequence {sequence} overlaps an open note")]
    OverlappingNote { key: u8, sequence: u32 },
}

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, Error>;

/// The product of one conversion run.
#[derive(Debug)]
pub struct Conversion {
    /// Where the table landed, next to the source file.
    pub output_path: PathBuf,
    /// Table rows, in note-stop order.
    pub notes: Vec<MomNote>,
    /// One entry per note that was mapped into the auxiliary range.
    pub warnings: Vec<OutOfRange>,
}

/// Convert the `.mid` file at `path` and write the note table next to it,
/// with the extension swapped to `.csv`.
///
/// Any other extension is refused up front with [`Error::NotMidi`], before
/// the file is even opened. The table is written through a temp-file
/// rename, so earlier output at the destination survives a failed run
/// intact.
pub fn convert_file(path: impl AsRef<Path>, strict: bool) -> Result<Conversion> {
    let path = path.as_ref();
    if path.extension() != Some(OsStr::new("mid")) {
        return Err(Error::NotMidi {
            path: path.to_path_buf(),
        });
    }

    let data = fs::read(path)?;
    let smf = Smf::parse(&data)?;
    let (notes, warnings) = convert_smf(&smf, strict)?;

    let output_path = path.with_extension("csv");
    table::write_table(&output_path, &notes)?;

    Ok(Conversion {
        output_path,
        notes,
        warnings,
    })
}

/// Run the same pipeline over an already-parsed file, without touching the
/// filesystem. Returns the table rows and the transposition warnings.
pub fn convert_smf(smf: &Smf, strict: bool) -> Result<(Vec<MomNote>, Vec<OutOfRange>)> {
    let mut extractor = Extractor::new(smf.header.timing, strict)?;
    let events = extractor.run(smf)?;
    table::remap(&events)
}
