use std::collections::HashMap;

use log::{debug, warn};

use crate::parsing::archetype::{EntityCategory, EntityKind};
use crate::parsing::entity::{EntityData, RawEntity};
use crate::parsing::LoadError;
use crate::score::easing::EaseType;
use crate::score::hold::{FadeType, GuideColor, HoldNote, HoldNoteType, HoldStep, HoldStepType};
use crate::score::id::IdAllocator;
use crate::score::note::{FlickType, Note, NoteType};
use crate::score::timing::{beat_to_tick, HiSpeedChange, Layer, Tempo};
use crate::score::Score;

/// Streaming assembler for the entity list.
///
/// Slides arrive as scattered fragments (start, ticks, connectors, end); the
/// assembler regroups them around `current_slide` and resolves the symbolic
/// `head` references through `ref_to_id`. All fragments of one slide are
/// assumed to be consecutive in the document, the start first and the end
/// last.
#[derive(Debug, Default)]
pub struct SlideAssembler {
    current_slide: Option<i32>,
    ref_to_id: HashMap<String, i32>,
}

impl SlideAssembler {
    pub fn new() -> Self {
        SlideAssembler::default()
    }

    /// Dispatches one entity into the score.
    pub fn process(
        &mut self,
        score: &mut Score,
        ids: &mut IdAllocator,
        entity: &RawEntity,
    ) -> Result<(), LoadError> {
        let kind = EntityKind::from_name(&entity.archetype)?;

        // Stage scaffolding and auto-inserted judgement ticks carry nothing
        // the editor keeps.
        if matches!(
            kind,
            EntityKind::Initialization
                | EntityKind::InputManager
                | EntityKind::Stage
                | EntityKind::IgnoredSlideTick
                | EntityKind::SimLine
        ) {
            debug!("Skipping {} entity '{}'", entity.archetype, entity.name);
            return Ok(());
        }

        let data = EntityData::from_entity(entity);
        match kind.category() {
            EntityCategory::Timing => self.process_timing(score, ids, entity, kind, &data),
            EntityCategory::Single => self.process_single(score, ids, entity, kind, &data),
            EntityCategory::SlideStart => self.process_slide_start(score, ids, entity, kind, &data),
            EntityCategory::SlideTick => self.process_slide_tick(score, ids, entity, kind, &data),
            EntityCategory::SlideEnd => self.process_slide_end(score, ids, entity, kind, &data),
            EntityCategory::Connector => self.process_connector(score, entity, kind, &data),
            EntityCategory::GuideSlide => self.process_guide(score, ids, entity, kind, &data),
            EntityCategory::Init | EntityCategory::Other => {
                debug!("Unhandled entity '{}' ({})", entity.name, entity.archetype);
                Ok(())
            }
        }
    }

    fn process_timing(
        &mut self,
        score: &mut Score,
        ids: &mut IdAllocator,
        entity: &RawEntity,
        kind: EntityKind,
        data: &EntityData,
    ) -> Result<(), LoadError> {
        match kind {
            EntityKind::TimeScaleGroup => {
                score.layers.push(Layer { name: entity.name.clone() });
            }
            EntityKind::TimeScaleChange => {
                let id = ids.next_hi_speed_id();
                let tick = require_tick(entity, data)?;
                let speed = data
                    .number("timeScale")
                    .or_else(|| data.number("#TIMESCALE"))
                    .ok_or_else(|| missing(entity, "timeScale"))?;
                let layer = owning_layer(&entity.name);
                score
                    .hi_speed_changes
                    .insert(id, HiSpeedChange { id, tick, speed: speed as f32, layer });
            }
            EntityKind::BpmChange => {
                let tick = require_tick(entity, data)?;
                let bpm = data.number("#BPM").ok_or_else(|| missing(entity, "#BPM"))? as f32;
                score.tempo_changes.push(Tempo { tick, bpm });
            }
            _ => unreachable!("non-timing kind dispatched as timing"),
        }
        Ok(())
    }

    fn process_single(
        &mut self,
        score: &mut Score,
        ids: &mut IdAllocator,
        entity: &RawEntity,
        kind: EntityKind,
        data: &EntityData,
    ) -> Result<(), LoadError> {
        // Damage notes live outside the note code block, so the taxonomy
        // predicates don't apply; they are never critical or friction.
        let (note_type, critical, friction) = if kind == EntityKind::DamageNote {
            (NoteType::Damage, false, false)
        } else {
            (NoteType::Tap, kind.critical()?, kind.friction()?)
        };

        let id = ids.next_note_id();
        score.notes.insert(
            id,
            Note {
                id,
                note_type,
                parent_id: -1,
                tick: require_tick(entity, data)?,
                lane: data.lane().ok_or_else(|| missing(entity, "lane"))?,
                width: data.width().ok_or_else(|| missing(entity, "size"))?,
                critical,
                friction,
                flick: data.flick(),
                layer: data.layer_index("timeScaleGroup"),
            },
        );
        Ok(())
    }

    fn process_slide_start(
        &mut self,
        score: &mut Score,
        ids: &mut IdAllocator,
        entity: &RawEntity,
        kind: EntityKind,
        data: &EntityData,
    ) -> Result<(), LoadError> {
        self.warn_if_dangling(score);

        let id = ids.next_note_id();
        score.notes.insert(
            id,
            Note {
                id,
                note_type: NoteType::Hold,
                parent_id: -1,
                tick: require_tick(entity, data)?,
                lane: data.lane().ok_or_else(|| missing(entity, "lane"))?,
                width: data.width().ok_or_else(|| missing(entity, "size"))?,
                critical: kind.critical()?,
                friction: kind.friction()?,
                flick: FlickType::None,
                layer: data.layer_index("timeScaleGroup"),
            },
        );

        // End note, ease types and slide kind are still unknown here.
        let mut hold = HoldNote::new(id);
        if kind == EntityKind::HiddenSlideStart {
            hold.start_type = HoldNoteType::Hidden;
        }
        score.hold_notes.insert(id, hold);

        self.ref_to_id.insert(entity.name.clone(), id);
        self.current_slide = Some(id);
        Ok(())
    }

    fn process_slide_tick(
        &mut self,
        score: &mut Score,
        ids: &mut IdAllocator,
        entity: &RawEntity,
        kind: EntityKind,
        data: &EntityData,
    ) -> Result<(), LoadError> {
        let slide_id = self.current_slide.ok_or_else(|| {
            LoadError::MalformedSlide(format!(
                "slide tick '{}' appears outside any slide",
                entity.name
            ))
        })?;
        // Guides are closed on arrival and never carry ticks
        if score.hold_notes.get(&slide_id).map_or(false, |hold| hold.is_guide()) {
            return Err(LoadError::MalformedSlide(format!(
                "slide tick '{}' tries to continue guide slide {}",
                entity.name, slide_id
            )));
        }

        let attached = matches!(
            kind,
            EntityKind::NormalAttachedSlideTick | EntityKind::CriticalAttachedSlideTick
        );
        let step_type = if attached {
            HoldStepType::Skip
        } else if kind == EntityKind::HiddenSlideTick {
            HoldStepType::Hidden
        } else {
            HoldStepType::Normal
        };

        let id = ids.next_note_id();
        // Attached ticks carry no geometry of their own; the placeholder is
        // replaced once the surrounding curve is known.
        let (lane, width) = if attached {
            (0.0, 2.0)
        } else {
            (
                data.lane().ok_or_else(|| missing(entity, "lane"))?,
                data.width().ok_or_else(|| missing(entity, "size"))?,
            )
        };
        score.notes.insert(
            id,
            Note {
                id,
                note_type: NoteType::HoldMid,
                parent_id: slide_id,
                tick: require_tick(entity, data)?,
                lane,
                width,
                critical: kind.critical()?,
                friction: false,
                flick: FlickType::None,
                layer: data.layer_index("timeScaleGroup"),
            },
        );

        let hold = self.current_hold_mut(score, entity)?;
        hold.steps.push(HoldStep {
            id,
            step_type,
            // A later connector names this tick's ease; attached ticks never
            // get one.
            ease: if attached { EaseType::Linear } else { EaseType::Undetermined },
        });

        if !attached {
            self.ref_to_id.insert(entity.name.clone(), id);
        }
        Ok(())
    }

    fn process_slide_end(
        &mut self,
        score: &mut Score,
        ids: &mut IdAllocator,
        entity: &RawEntity,
        kind: EntityKind,
        data: &EntityData,
    ) -> Result<(), LoadError> {
        let slide_id = self.current_slide.ok_or_else(|| {
            LoadError::MalformedSlide(format!(
                "slide end '{}' appears before any slide start",
                entity.name
            ))
        })?;
        if score.hold_notes.get(&slide_id).map_or(false, |hold| hold.is_guide()) {
            return Err(LoadError::MalformedSlide(format!(
                "slide end '{}' tries to close guide slide {}",
                entity.name, slide_id
            )));
        }

        let id = ids.next_note_id();
        score.notes.insert(
            id,
            Note {
                id,
                note_type: NoteType::HoldEnd,
                parent_id: slide_id,
                tick: require_tick(entity, data)?,
                lane: data.lane().ok_or_else(|| missing(entity, "lane"))?,
                width: data.width().ok_or_else(|| missing(entity, "size"))?,
                critical: kind.critical()?,
                friction: kind.friction()?,
                flick: data.flick(),
                layer: data.layer_index("timeScaleGroup"),
            },
        );

        let notes = &score.notes;
        let hold = score.hold_notes.get_mut(&slide_id).ok_or_else(|| {
            LoadError::MalformedSlide(format!("slide {} vanished before its end", slide_id))
        })?;
        hold.end_id = id;
        // Keep insertion order for equal ticks
        hold.steps
            .sort_by_key(|step| notes.get(&step.id).map_or(i32::MAX, |note| note.tick));
        Ok(())
    }

    fn process_connector(
        &mut self,
        score: &mut Score,
        entity: &RawEntity,
        kind: EntityKind,
        data: &EntityData,
    ) -> Result<(), LoadError> {
        let slide_id = self.current_slide.ok_or_else(|| {
            LoadError::MalformedSlide(format!(
                "connector '{}' appears outside any slide",
                entity.name
            ))
        })?;

        let ease = decode_ease(entity, data)?;
        let head = data
            .ref_target("head")
            .ok_or_else(|| missing(entity, "head"))?;
        let target_id = *self.ref_to_id.get(head).ok_or_else(|| {
            LoadError::MalformedSlide(format!(
                "connector '{}' references unknown head '{}'",
                entity.name, head
            ))
        })?;

        let hold = self.current_hold_mut(score, entity)?;
        if hold.is_guide() {
            warn!(
                "Connector '{}' targets guide slide {}; mixing connector kinds",
                entity.name, slide_id
            );
        }
        let step = hold.step_with_id_mut(target_id).ok_or_else(|| {
            LoadError::MalformedSlide(format!(
                "connector '{}' head '{}' is not part of slide {}",
                entity.name, head, slide_id
            ))
        })?;
        step.ease = ease;

        // Connectors are the authoritative source of criticality for their
        // head note; the last one seen wins.
        if let Some(note) = score.notes.get_mut(&target_id) {
            note.critical = kind.critical()?;
        }
        Ok(())
    }

    fn process_guide(
        &mut self,
        score: &mut Score,
        ids: &mut IdAllocator,
        entity: &RawEntity,
        kind: EntityKind,
        data: &EntityData,
    ) -> Result<(), LoadError> {
        self.warn_if_dangling(score);

        let critical = kind.critical()?;
        let friction = kind.friction()?;
        let start_layer = guide_layer(entity, data, "startTimeScaleGroup", "headTimeScaleGroup")?;
        let end_layer = guide_layer(entity, data, "endTimeScaleGroup", "tailTimeScaleGroup")?;

        let start_id = ids.next_note_id();
        let end_id = ids.next_note_id();
        score.notes.insert(
            start_id,
            Note {
                id: start_id,
                note_type: NoteType::Hold,
                parent_id: -1,
                tick: guide_tick(entity, data, "startBeat")?,
                lane: guide_lane(entity, data, "startLane", "startSize")?,
                width: guide_width(entity, data, "startSize")?,
                critical,
                friction,
                flick: FlickType::None,
                layer: start_layer,
            },
        );
        score.notes.insert(
            end_id,
            Note {
                id: end_id,
                note_type: NoteType::HoldEnd,
                parent_id: start_id,
                tick: guide_tick(entity, data, "endBeat")?,
                lane: guide_lane(entity, data, "endLane", "endSize")?,
                width: guide_width(entity, data, "endSize")?,
                critical,
                friction,
                flick: FlickType::None,
                layer: end_layer,
            },
        );

        let mut hold = HoldNote::new(start_id);
        hold.start.ease = decode_ease(entity, data)?;
        hold.end_id = end_id;
        hold.start_type = HoldNoteType::Guide;
        hold.end_type = HoldNoteType::Guide;
        hold.fade = decode_bounded(entity, data, "fade", 2)
            .map(|index| FadeType::from_index(index).unwrap_or_default())?;
        hold.guide_color = decode_bounded(entity, data, "color", 7)
            .map(|index| GuideColor::from_index(index).unwrap_or_default())?;
        score.hold_notes.insert(start_id, hold);

        // Guides take part in the slide stream like any other start, so a
        // stray connector naming one is caught instead of silently ignored.
        self.ref_to_id.insert(entity.name.clone(), start_id);
        self.current_slide = Some(start_id);
        Ok(())
    }

    fn current_hold_mut<'a>(
        &self,
        score: &'a mut Score,
        entity: &RawEntity,
    ) -> Result<&'a mut HoldNote, LoadError> {
        let slide_id = self.current_slide.ok_or_else(|| {
            LoadError::MalformedSlide(format!(
                "entity '{}' needs a slide but none is open",
                entity.name
            ))
        })?;
        score.hold_notes.get_mut(&slide_id).ok_or_else(|| {
            LoadError::MalformedSlide(format!("slide {} is not in the score", slide_id))
        })
    }

    /// Cheap detector for out-of-order slide streams: a slide left behind
    /// with neither an end nor any tick that could become one.
    fn warn_if_dangling(&self, score: &Score) {
        if let Some(previous) = self.current_slide {
            if let Some(hold) = score.hold_notes.get(&previous) {
                if hold.end_id == -1 && hold.steps.is_empty() {
                    warn!("Slide {} was never finished before the next slide began", previous);
                }
            }
        }
    }
}

// --- Field Helpers ---

fn missing(entity: &RawEntity, key: &str) -> LoadError {
    LoadError::StructuralAssertion(format!(
        "entity '{}' ({}) is missing '{}'",
        entity.name, entity.archetype, key
    ))
}

fn require_tick(entity: &RawEntity, data: &EntityData) -> Result<i32, LoadError> {
    data.tick().ok_or_else(|| missing(entity, "#BEAT"))
}

/// Wire tri-value ease: +1 in, -1 out, 0 linear; absent reads as linear.
fn decode_ease(entity: &RawEntity, data: &EntityData) -> Result<EaseType, LoadError> {
    let Some(value) = data.number("ease") else {
        return Ok(EaseType::Linear);
    };
    data.integer("ease")
        .and_then(EaseType::from_signum)
        .ok_or(LoadError::InvalidEase { entity: entity.name.clone(), value })
}

fn decode_bounded(
    entity: &RawEntity,
    data: &EntityData,
    key: &str,
    max: i64,
) -> Result<i64, LoadError> {
    match data.number(key) {
        None => Ok(0),
        Some(value) => match data.integer(key) {
            Some(index) if (0..=max).contains(&index) => Ok(index),
            _ => Err(LoadError::StructuralAssertion(format!(
                "entity '{}' has '{}' = {} outside 0..={}",
                entity.name, key, value, max
            ))),
        },
    }
}

fn guide_tick(entity: &RawEntity, data: &EntityData, key: &str) -> Result<i32, LoadError> {
    data.number(key)
        .map(beat_to_tick)
        .ok_or_else(|| missing(entity, key))
}

fn guide_lane(
    entity: &RawEntity,
    data: &EntityData,
    lane_key: &str,
    size_key: &str,
) -> Result<f32, LoadError> {
    let lane = data.number(lane_key).ok_or_else(|| missing(entity, lane_key))?;
    let size = data.number(size_key).ok_or_else(|| missing(entity, size_key))?;
    Ok((lane - size + 6.0) as f32)
}

fn guide_width(entity: &RawEntity, data: &EntityData, size_key: &str) -> Result<f32, LoadError> {
    data.number(size_key)
        .map(|size| (size * 2.0) as f32)
        .ok_or_else(|| missing(entity, size_key))
}

/// The two group references of a guide endpoint must agree; either one names
/// the endpoint's layer.
fn guide_layer(
    entity: &RawEntity,
    data: &EntityData,
    primary: &str,
    alias: &str,
) -> Result<i32, LoadError> {
    if let (Some(a), Some(b)) = (data.ref_target(primary), data.ref_target(alias)) {
        if a != b {
            return Err(LoadError::StructuralAssertion(format!(
                "guide '{}': '{}' ({}) and '{}' ({}) disagree",
                entity.name, primary, a, alias, b
            )));
        }
    }
    if data.get(primary).is_some() {
        Ok(data.layer_index(primary))
    } else {
        Ok(data.layer_index(alias))
    }
}

/// Layer owning a time-scale change, taken from the trailing group number in
/// the entity name's segment before its final ':'.
fn owning_layer(name: &str) -> i32 {
    let head = match name.rfind(':') {
        Some(split) => &name[..split],
        None => name,
    };
    let digits = head.len() - head.chars().rev().take_while(char::is_ascii_digit).count();
    match head[digits..].parse::<i32>() {
        Ok(group) => group + 1,
        Err(_) => {
            warn!("Time scale change '{}' names no group, using default layer", name);
            0
        }
    }
}
