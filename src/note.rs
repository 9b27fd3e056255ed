use std::fmt;

/// A completed note as the extractor hands it over, before pitch remapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    /// 1-based count of note-ons seen at the moment this note started.
    pub sequence: u32,
    /// Raw MIDI key number (0-127).
    pub key: u8,
    pub onset: f64, // in seconds
}

/// One row of the Mound of Music note table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomNote {
    pub id: u32,
    /// MoM pitch encoding; negative values are sharpened degrees.
    pub pitch: i16,
    pub time: f64, // in seconds, rounded to milliseconds
}

/// A note that only the out-of-range table could map. The note is still
/// emitted; the chart author has to transpose it by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRange {
    pub sequence: u32,
    pub pitch: i16,
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pitch {} at sequence {} is out of range and needs transposition",
            self.pitch, self.sequence
        )
    }
}
