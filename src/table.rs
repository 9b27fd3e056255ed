use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::note::{MomNote, NoteEvent, OutOfRange};
use crate::pitch_map::{self, Mapping};
use crate::{Error, Result};

/// Remap extracted note events onto the MoM pitch layout.
///
/// Playable keys land in the chart proper. Keys on the rest of the piano
/// map into the auxiliary range and come back as warnings, so the chart
/// author knows the part needs transposing. A key outside both tables
/// aborts the conversion.
pub fn remap(events: &[NoteEvent]) -> Result<(Vec<MomNote>, Vec<OutOfRange>)> {
    let mut notes = Vec::with_capacity(events.len());
    let mut warnings = Vec::new();

    for event in events {
        let pitch = match pitch_map::lookup(event.key) {
            Some(Mapping::Playable(pitch)) => pitch,
            Some(Mapping::OutOfRange(pitch)) => {
                warnings.push(OutOfRange {
                    sequence: event.sequence,
                    pitch,
                });
                pitch
            }
            None => {
                return Err(Error::UnmappedKey {
                    key: event.key,
                    sequence: event.sequence,
                })
            }
        };
        notes.push(MomNote {
            id: event.sequence,
            pitch,
            time: round_millis(event.onset),
        });
    }

    Ok((notes, warnings))
}

// The table's time grid is milliseconds.
fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

/// Render the note table as CSV with an `id,pitch,time` header row. Times
/// carry exactly three decimals.
pub fn render(notes: &[MomNote]) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut data);
        writer.write_record(["id", "pitch", "time"])?;
        for note in notes {
            writer.write_record([
                note.id.to_string(),
                note.pitch.to_string(),
                format!("{:.3}", note.time),
            ])?;
        }
        writer.flush()?;
    }
    Ok(data)
}

/// Write the rendered table to `path` through a temp-file rename, so a
/// failed run never leaves a truncated table behind.
pub fn write_table(path: &Path, notes: &[MomNote]) -> Result<()> {
    let data = render(notes)?;

    let tmp_path = match path.file_name() {
        Some(name) => {
            let mut tmp_name = OsString::from(name);
            tmp_name.push(".tmp");
            path.with_file_name(tmp_name)
        }
        None => {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "table path has no file name",
            )))
        }
    };

    {
        let mut f = fs::File::create(&tmp_path)?;
        f.write_all(&data)?;
        f.sync_all()?;
    }

    #[cfg(windows)]
    {
        if path.exists() {
            // Windows rename fails if the destination exists.
            fs::remove_file(path)?;
        }
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}
