pub mod archetype;
pub mod entity;
pub mod geometry;
pub mod slide;

use std::error::Error;
use std::fmt;

use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;

use crate::parsing::archetype::EntityKind;
use crate::parsing::entity::RawScore;
use crate::parsing::slide::SlideAssembler;
use crate::score::id::IdAllocator;
use crate::score::timing::Tempo;
use crate::score::Score;

/// Why a chart document could not be loaded. Loading is all-or-nothing; the
/// first failure aborts and names the offending entity where one exists.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadError {
    /// Archetype string outside the known taxonomy.
    UnknownArchetype(String),
    /// A note-only taxonomy predicate was asked about a non-note.
    NotANote(EntityKind),
    /// An `ease` field outside {-1, 0, +1}.
    InvalidEase { entity: String, value: f64 },
    /// An undetermined ease survived into curve evaluation.
    EaseUnresolved { hold_id: i32 },
    /// An attached tick sits on a segment with zero tick span.
    DegenerateSegment { hold_id: i32, tick: i32 },
    /// The slide fragment stream could not be recombined.
    MalformedSlide(String),
    /// The document itself is the wrong shape.
    StructuralAssertion(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::UnknownArchetype(name) => write!(f, "Unknown archetype '{}'", name),
            LoadError::NotANote(kind) => write!(f, "Entity kind {:?} is not a note", kind),
            LoadError::InvalidEase { entity, value } => {
                write!(f, "Entity '{}' has invalid ease value {}", entity, value)
            }
            LoadError::EaseUnresolved { hold_id } => {
                write!(f, "Slide {} evaluated an unresolved ease", hold_id)
            }
            LoadError::DegenerateSegment { hold_id, tick } => write!(
                f,
                "Attached tick at {} in slide {} lies on a zero-length segment",
                tick, hold_id
            ),
            LoadError::MalformedSlide(detail) => write!(f, "Malformed slide: {}", detail),
            LoadError::StructuralAssertion(detail) => {
                write!(f, "Malformed chart document: {}", detail)
            }
        }
    }
}

impl Error for LoadError {}

/// Parses a chart document from raw JSON bytes.
pub fn parse_slice(bytes: &[u8]) -> Result<Score, LoadError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|err| LoadError::StructuralAssertion(format!("invalid JSON: {}", err)))?;
    parse_value(&value)
}

/// Converts a decoded chart document into a score, with note and hi-speed
/// ids starting from zero.
pub fn parse_value(document: &Value) -> Result<Score, LoadError> {
    parse_value_with(document, &mut IdAllocator::new())
}

/// Like [`parse_value`] but drawing ids from a caller-owned allocator, so
/// ids keep climbing across documents.
pub fn parse_value_with(
    document: &Value,
    ids: &mut IdAllocator,
) -> Result<Score, LoadError> {
    let raw = RawScore::deserialize(document)
        .map_err(|err| LoadError::StructuralAssertion(err.to_string()))?;

    let mut score = Score::new();
    score.metadata.music_offset_ms = (-1000.0 * raw.bgm_offset) as f32;

    let mut assembler = SlideAssembler::new();
    for entity in &raw.entities {
        debug!("Entity '{}' ({})", entity.name, entity.archetype);
        assembler.process(&mut score, ids, entity)?;
    }

    geometry::reconcile_open_ends(&mut score)?;
    geometry::resolve_attached(&mut score)?;
    finalize(&mut score);

    info!(
        "Loaded chart: {} notes, {} holds, {} tempo changes, {} layers",
        score.notes.len(),
        score.hold_notes.len(),
        score.tempo_changes.len(),
        score.layers.len()
    );
    Ok(score)
}

/// Guarantees a tempo track: a default tempo when the chart declares none,
/// and changes ordered by tick (source order kept for equal ticks).
fn finalize(score: &mut Score) {
    if score.tempo_changes.is_empty() {
        score.tempo_changes.push(Tempo::default());
    }
    score.tempo_changes.sort_by_key(|tempo| tempo.tick);
}
