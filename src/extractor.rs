use std::collections::HashMap;

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

use crate::note::NoteEvent;
use crate::{Error, Result};

// microseconds per second
const MICROS_PER_SEC: f64 = 1_000_000.0;

/// MIDI default tempo: 500,000 µs per quarter note (120 BPM), in effect
/// until the stream's first tempo event.
const DEFAULT_TEMPO: u32 = 500_000;

/// Walks every track of a decoded file with one running clock, pairing
/// note-ons with their note-offs into timed [`NoteEvent`]s.
///
/// All timing state lives here, so one `Extractor` serves exactly one
/// conversion run. The clock, tempo and open notes carry over from one
/// track to the next; multi-track input gets plain accumulation, not a
/// true merge of simultaneous tracks.
pub struct Extractor {
    ticks_per_beat: u16,
    tempo: u32, // microseconds per quarter note
    tick_secs: f64,
    clock: f64, // elapsed seconds since the start of the walk
    sequence: u32,
    open_notes: HashMap<u8, OpenNote>,
    strict: bool,
}

/// Start-side half of a note, parked until its note-off arrives.
#[derive(Debug, Clone, Copy)]
struct OpenNote {
    sequence: u32,
    onset: f64,
}

impl Extractor {
    /// Build an extractor for a file with the given header timing. Strict
    /// mode turns the "most recent start wins" overwrite for overlapping
    /// note-ons into a hard error.
    pub fn new(timing: Timing, strict: bool) -> Result<Self> {
        let ticks_per_beat = match timing {
            Timing::Metrical(tpb) => tpb.as_int(),
            Timing::Timecode(..) => return Err(Error::SmpteTiming),
        };
        Ok(Self {
            ticks_per_beat,
            tempo: DEFAULT_TEMPO,
            tick_secs: tick_seconds(DEFAULT_TEMPO, ticks_per_beat),
            clock: 0.0,
            sequence: 0,
            open_notes: HashMap::new(),
            strict,
        })
    }

    /// Visit every event of every track in stream order and collect the
    /// completed notes. The result is ordered by note-off; sequence ids
    /// number the note-ons.
    pub fn run(&mut self, smf: &Smf) -> Result<Vec<NoteEvent>> {
        let mut notes = Vec::new();
        for track in &smf.tracks {
            for event in track {
                if let Some(note) = self.process_event(event)? {
                    notes.push(note);
                }
            }
        }
        Ok(notes)
    }

    fn process_event(&mut self, event: &TrackEvent) -> Result<Option<NoteEvent>> {
        // A tempo event re-prices its own delta: the new rate takes effect
        // before the clock advances past it.
        if let TrackEventKind::Meta(MetaMessage::Tempo(tempo)) = event.kind {
            self.set_tempo(tempo.as_int());
        }
        self.clock += f64::from(event.delta.as_int()) * self.tick_secs;

        match event.kind {
            TrackEventKind::Midi {
                message: MidiMessage::NoteOn { key, vel },
                ..
            } if vel.as_int() > 0 => {
                self.open_note(key.as_int())?;
                Ok(None)
            }
            // A note-on with velocity 0 means note-off.
            TrackEventKind::Midi {
                message: MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. },
                ..
            } => Ok(self.close_note(key.as_int())),
            // Everything else only advances the clock.
            _ => Ok(None),
        }
    }

    fn open_note(&mut self, key: u8) -> Result<()> {
        self.sequence += 1;
        if self.strict && self.open_notes.contains_key(&key) {
            return Err(Error::OverlappingNote {
                key,
                sequence: self.sequence,
            });
        }
        self.open_notes.insert(
            key,
            OpenNote {
                sequence: self.sequence,
                onset: self.clock,
            },
        );
        Ok(())
    }

    fn close_note(&mut self, key: u8) -> Option<NoteEvent> {
        // A stop with no matching start is dropped.
        self.open_notes.remove(&key).map(|open| NoteEvent {
            sequence: open.sequence,
            key,
            onset: open.onset,
        })
    }

    fn set_tempo(&mut self, micros_per_beat: u32) {
        self.tempo = micros_per_beat;
        self.tick_secs = tick_seconds(self.tempo, self.ticks_per_beat);
    }
}

fn tick_seconds(tempo: u32, ticks_per_beat: u16) -> f64 {
    // MIDI tempo is in microseconds per quarter note
    f64::from(tempo) / (f64::from(ticks_per_beat) * MICROS_PER_SEC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use midly::{Format, Fps, Header};

    fn smf_with(tracks: Vec<Vec<TrackEvent<'static>>>) -> Smf<'static> {
        Smf {
            header: Header::new(Format::SingleTrack, Timing::Metrical(480.into())),
            tracks,
        }
    }

    fn note_on(delta: u32, key: u8, vel: u8) -> TrackEvent<'static> {
        TrackEvent {
            delta: delta.into(),
            kind: TrackEventKind::Midi {
                channel: 0.into(),
                message: MidiMessage::NoteOn {
                    key: key.into(),
                    vel: vel.into(),
                },
            },
        }
    }

    fn note_off(delta: u32, key: u8) -> TrackEvent<'static> {
        TrackEvent {
            delta: delta.into(),
            kind: TrackEventKind::Midi {
                channel: 0.into(),
                message: MidiMessage::NoteOff {
                    key: key.into(),
                    vel: 0.into(),
                },
            },
        }
    }

    fn tempo(delta: u32, micros_per_beat: u32) -> TrackEvent<'static> {
        TrackEvent {
            delta: delta.into(),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(micros_per_beat.into())),
        }
    }

    fn try_extract(tracks: Vec<Vec<TrackEvent<'static>>>, strict: bool) -> Result<Vec<NoteEvent>> {
        let smf = smf_with(tracks);
        let mut extractor = Extractor::new(smf.header.timing, strict)?;
        extractor.run(&smf)
    }

    fn extract(events: Vec<TrackEvent<'static>>) -> Vec<NoteEvent> {
        try_extract(vec![events], false).expect("extraction failed")
    }

    #[test]
    fn constant_tempo_accumulates_linearly() {
        // 480 ticks per beat at the default tempo: one beat is half a second.
        let notes = extract(vec![
            note_on(0, 60, 100),
            note_off(480, 60),
            note_on(480, 62, 100),
            note_off(240, 62),
        ]);
        assert_eq!(notes.len(), 2);
        assert_eq!((notes[0].sequence, notes[0].key), (1, 60));
        assert_approx_eq!(notes[0].onset, 0.0);
        assert_eq!((notes[1].sequence, notes[1].key), (2, 62));
        assert_approx_eq!(notes[1].onset, 1.0);
    }

    #[test]
    fn tempo_change_partitions_the_clock() {
        // 480 ticks take 0.5s at the default tempo, 0.25s after the change.
        let notes = extract(vec![
            note_on(0, 60, 100),
            note_off(480, 60),
            tempo(0, 250_000),
            note_on(0, 62, 100),
            note_off(480, 62),
            note_on(0, 64, 100),
            note_off(480, 64),
        ]);
        let onsets: Vec<f64> = notes.iter().map(|n| n.onset).collect();
        assert_approx_eq!(onsets[0], 0.0);
        assert_approx_eq!(onsets[1], 0.5);
        assert_approx_eq!(onsets[2], 0.75);
    }

    #[test]
    fn tempo_event_delta_uses_the_new_rate() {
        let notes = extract(vec![
            note_on(0, 60, 100),
            tempo(480, 250_000),
            note_on(0, 62, 100),
            note_off(0, 62),
            note_off(0, 60),
        ]);
        // The 480 ticks leading up to the tempo event are priced at the new
        // 250,000 µs rate, not the default.
        assert_approx_eq!(notes[0].onset, 0.25);
    }

    #[test]
    fn unmatched_note_off_is_ignored() {
        let notes = extract(vec![
            note_off(0, 60),
            note_on(120, 62, 100),
            note_off(120, 62),
            note_off(0, 62),
        ]);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].key, 62);
    }

    #[test]
    fn ids_follow_start_order_not_stop_order() {
        let notes = extract(vec![
            note_on(0, 60, 100),
            note_on(240, 62, 100),
            note_off(240, 62),
            note_off(240, 60),
        ]);
        // 62 completes first but keeps the later id.
        assert_eq!(notes.len(), 2);
        assert_eq!((notes[0].sequence, notes[0].key), (2, 62));
        assert_eq!((notes[1].sequence, notes[1].key), (1, 60));
    }

    #[test]
    fn duplicate_start_overwrites_by_default() {
        let notes = extract(vec![
            note_on(0, 60, 100),
            note_on(480, 60, 100),
            note_off(480, 60),
        ]);
        // The first start is dropped; the survivor carries the newer id
        // and onset.
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].sequence, 2);
        assert_approx_eq!(notes[0].onset, 0.5);
    }

    #[test]
    fn strict_mode_rejects_overlapping_starts() {
        let result = try_extract(
            vec![vec![
                note_on(0, 60, 100),
                note_on(480, 60, 100),
                note_off(480, 60),
            ]],
            true,
        );
        assert!(matches!(
            result,
            Err(Error::OverlappingNote {
                key: 60,
                sequence: 2
            })
        ));
    }

    #[test]
    fn velocity_zero_note_on_closes_the_note() {
        let notes = extract(vec![note_on(0, 60, 100), note_on(480, 60, 0)]);
        assert_eq!(notes.len(), 1);
        assert_eq!((notes[0].sequence, notes[0].key), (1, 60));
        assert_approx_eq!(notes[0].onset, 0.0);
    }

    #[test]
    fn clock_and_ids_carry_across_tracks() {
        let notes = try_extract(
            vec![
                vec![note_on(0, 60, 100), note_off(480, 60)],
                vec![note_on(0, 62, 100), note_off(480, 62)],
            ],
            false,
        )
        .expect("extraction failed");
        assert_eq!(notes.len(), 2);
        // The second track starts where the first left off.
        assert_approx_eq!(notes[1].onset, 0.5);
        assert_eq!(notes[1].sequence, 2);
    }

    #[test]
    fn smpte_timing_is_rejected() {
        let result = Extractor::new(Timing::Timecode(Fps::Fps25, 40), false);
        assert!(matches!(result, Err(Error::SmpteTiming)));
    }
}
