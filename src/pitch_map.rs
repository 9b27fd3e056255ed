use once_cell::sync::Lazy;
use std::collections::HashMap;

/// MIDI key → MoM pitch for the game's playable three octaves (C3-B5).
/// |pitch| = octave digit × 10 + scale degree 1-7; negative = sharpened.
const PLAYABLE: [(u8, i16); 36] = [
    (48, 41),
    (49, -41),
    (50, 42),
    (51, -42),
    (52, 43),
    (53, 44),
    (54, -44),
    (55, 45),
    (56, -45),
    (57, 46),
    (58, -46),
    (59, 47),
    (60, 51),
    (61, -51),
    (62, 52),
    (63, -52),
    (64, 53),
    (65, 54),
    (66, -54),
    (67, 55),
    (68, -55),
    (69, 56),
    (70, -56),
    (71, 57),
    (72, 61),
    (73, -61),
    (74, 62),
    (75, -62),
    (76, 63),
    (77, 64),
    (78, -64),
    (79, 65),
    (80, -65),
    (81, 66),
    (82, -66),
    (83, 67),
];

/// The rest of the 88-key piano range (A0-B2 and C6-C8). These keys map to
/// a diagnostic MoM value only; charts using them need manual transposition.
const OUT_OF_RANGE: [(u8, i16); 52] = [
    (21, 16),
    (22, -16),
    (23, 17),
    (24, 21),
    (25, -21),
    (26, 22),
    (27, -22),
    (28, 23),
    (29, 24),
    (30, -24),
    (31, 25),
    (32, -25),
    (33, 26),
    (34, -26),
    (35, 27),
    (36, 31),
    (37, -31),
    (38, 32),
    (39, -32),
    (40, 33),
    (41, 34),
    (42, -34),
    (43, 35),
    (44, -35),
    (45, 36),
    (46, -36),
    (47, 37),
    (84, 71),
    (85, -71),
    (86, 72),
    (87, -72),
    (88, 73),
    (89, 74),
    (90, -74),
    (91, 75),
    (92, -75),
    (93, 76),
    (94, -76),
    (95, 77),
    (96, 81),
    (97, -81),
    (98, 82),
    (99, -82),
    (100, 83),
    (101, 84),
    (102, -84),
    (103, 85),
    (104, -85),
    (105, 86),
    (106, -86),
    (107, 87),
    (108, 91),
];

static PLAYABLE_MAP: Lazy<HashMap<u8, i16>> = Lazy::new(|| PLAYABLE.iter().copied().collect());

static OUT_OF_RANGE_MAP: Lazy<HashMap<u8, i16>> =
    Lazy::new(|| OUT_OF_RANGE.iter().copied().collect());

/// Result of looking up one MIDI key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mapping {
    /// The key sits inside the playable range.
    Playable(i16),
    /// The key got the fallback encoding and warrants a transposition warning.
    OutOfRange(i16),
}

/// Map a raw MIDI key to its MoM pitch. `None` means the key falls outside
/// even the piano range and the conversion has to stop.
pub fn lookup(key: u8) -> Option<Mapping> {
    if let Some(&pitch) = PLAYABLE_MAP.get(&key) {
        return Some(Mapping::Playable(pitch));
    }
    OUT_OF_RANGE_MAP
        .get(&key)
        .map(|&pitch| Mapping::OutOfRange(pitch))
}
