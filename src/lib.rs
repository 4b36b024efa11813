//! Sonolus chart ingestion for the score editor.
//!
//! Converts a Sonolus-format chart document (a flat list of typed entities
//! with symbolic references) into an editor-facing [`Score`]: id-keyed notes,
//! reassembled hold and guide structures with resolved curve geometry, and
//! tempo / time-scale tracks.
//!
//! The entry points are [`parse_slice`] for raw JSON bytes and
//! [`parse_value`] for an already-decoded document. Loading is pure and
//! all-or-nothing: any malformed input fails with a [`LoadError`] naming the
//! offending entity where possible, and non-fatal anomalies are reported
//! through the `log` facade.

pub mod parsing;
pub mod score;

pub use parsing::{parse_slice, parse_value, parse_value_with, LoadError};
pub use score::easing::EaseType;
pub use score::hold::{FadeType, GuideColor, HoldNote, HoldNoteType, HoldStep, HoldStepType};
pub use score::id::IdAllocator;
pub use score::note::{FlickType, Note, NoteType};
pub use score::timing::{HiSpeedChange, Layer, Tempo, DEFAULT_BPM, TICKS_PER_BEAT};
pub use score::{Metadata, Score};
