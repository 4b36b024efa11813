use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::parsing::LoadError;

/// Coarse dispatch category of an entity.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntityCategory {
    Init,
    Timing,
    Single,
    SlideStart,
    SlideTick,
    SlideEnd,
    Connector,
    GuideSlide,
    Other,
}

/// Entity archetypes as they appear in the document.
///
/// The discriminants are load-bearing: the high nibble is the note category,
/// bit 0 is criticality and bit 1 friction (where the category has friction
/// variants). `is_note`, `category`, `critical` and `friction` are all bit
/// tests against these values, so the numbering cannot be rearranged.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum EntityKind {
    // Initialization-related
    Initialization = 0,
    InputManager   = 1,
    Stage          = 2,

    // Time scale and BPM changes
    TimeScaleGroup  = 3,
    TimeScaleChange = 4,
    BpmChange       = 5,

    // Single note
    NormalTap         = 0x10,
    CriticalTap       = 0x11,
    NormalTrace       = 0x12,
    CriticalTrace     = 0x13,
    NormalFlick       = 0x14,
    CriticalFlick     = 0x15,
    NormalTraceFlick  = 0x16,
    CriticalTraceFlick = 0x17,

    // Slide start
    NormalSlideStart        = 0x20,
    CriticalSlideStart      = 0x21,
    NormalTraceSlideStart   = 0x22,
    CriticalTraceSlideStart = 0x23,
    /// Doubles as the endpoint marker of guide slides.
    HiddenSlideStart        = 0x24,

    // Slide tick
    NormalSlideTick           = 0x30,
    CriticalSlideTick         = 0x31,
    /// Diamond that rides the curve without controlling it.
    NormalAttachedSlideTick   = 0x32,
    CriticalAttachedSlideTick = 0x33,
    /// Controls the curve without a diamond.
    HiddenSlideTick           = 0x34,
    /// Auto-inserted half-beat judgement ticks; not chart content.
    IgnoredSlideTick          = 0x35,

    // Slide end
    NormalSlideEnd        = 0x40,
    CriticalSlideEnd      = 0x41,
    NormalTraceSlideEnd   = 0x42,
    CriticalTraceSlideEnd = 0x43,
    NormalSlideEndFlick   = 0x44,
    CriticalSlideEndFlick = 0x45,

    // Slide connector (slide bar)
    NormalSlideConnector   = 0x50,
    CriticalSlideConnector = 0x51,

    // Guide slide
    Guide = 0x60,

    // Others
    SimLine    = 0x70,
    DamageNote = 0x71,
}

static NAME_TABLE: Lazy<HashMap<&'static str, EntityKind>> = Lazy::new(|| {
    use EntityKind::*;
    HashMap::from([
        ("Initialization", Initialization),
        ("InputManager", InputManager),
        ("Stage", Stage),
        ("TimeScaleGroup", TimeScaleGroup),
        ("TimeScaleChange", TimeScaleChange),
        // Official charts carry the raw engine name for these two
        ("#TIMESCALE_CHANGE", TimeScaleChange),
        ("#BPM_CHANGE", BpmChange),
        ("NormalTapNote", NormalTap),
        ("CriticalTapNote", CriticalTap),
        ("NormalTraceNote", NormalTrace),
        ("CriticalTraceNote", CriticalTrace),
        ("NormalFlickNote", NormalFlick),
        ("CriticalFlickNote", CriticalFlick),
        ("NormalTraceFlickNote", NormalTraceFlick),
        ("CriticalTraceFlickNote", CriticalTraceFlick),
        ("NormalSlideStartNote", NormalSlideStart),
        ("CriticalSlideStartNote", CriticalSlideStart),
        ("NormalTraceSlideStartNote", NormalTraceSlideStart),
        ("CriticalTraceSlideStartNote", CriticalTraceSlideStart),
        ("HiddenSlideStartNote", HiddenSlideStart),
        ("NormalSlideTickNote", NormalSlideTick),
        ("CriticalSlideTickNote", CriticalSlideTick),
        ("NormalAttachedSlideTickNote", NormalAttachedSlideTick),
        ("CriticalAttachedSlideTickNote", CriticalAttachedSlideTick),
        ("HiddenSlideTickNote", HiddenSlideTick),
        ("IgnoredSlideTickNote", IgnoredSlideTick),
        ("NormalSlideEndNote", NormalSlideEnd),
        ("CriticalSlideEndNote", CriticalSlideEnd),
        ("NormalTraceSlideEndNote", NormalTraceSlideEnd),
        ("CriticalTraceSlideEndNote", CriticalTraceSlideEnd),
        ("NormalSlideEndFlickNote", NormalSlideEndFlick),
        ("CriticalSlideEndFlickNote", CriticalSlideEndFlick),
        ("NormalSlideConnector", NormalSlideConnector),
        ("CriticalSlideConnector", CriticalSlideConnector),
        ("Guide", Guide),
        ("SimLine", SimLine),
        ("DamageNote", DamageNote),
    ])
});

impl EntityKind {
    pub fn from_name(name: &str) -> Result<EntityKind, LoadError> {
        NAME_TABLE
            .get(name)
            .copied()
            .ok_or_else(|| LoadError::UnknownArchetype(name.to_string()))
    }

    #[inline]
    pub fn code(&self) -> i32 {
        *self as i32
    }

    #[inline]
    pub fn is_note(&self) -> bool {
        (0x10..0x70).contains(&self.code())
    }

    pub fn category(&self) -> EntityCategory {
        // Damage notes sit in the "other" code block but are placed like taps.
        if *self == EntityKind::DamageNote {
            return EntityCategory::Single;
        }
        match self.code() {
            0..=2 => EntityCategory::Init,
            3..=5 => EntityCategory::Timing,
            code => match code >> 4 {
                0x1 => EntityCategory::Single,
                0x2 => EntityCategory::SlideStart,
                0x3 => EntityCategory::SlideTick,
                0x4 => EntityCategory::SlideEnd,
                0x5 => EntityCategory::Connector,
                0x6 => EntityCategory::GuideSlide,
                _ => EntityCategory::Other,
            },
        }
    }

    /// Whether this note archetype is the critical (yellow) variant.
    /// Fails on non-note entities.
    pub fn critical(&self) -> Result<bool, LoadError> {
        if !self.is_note() {
            return Err(LoadError::NotANote(*self));
        }
        if *self == EntityKind::IgnoredSlideTick || self.code() >= 0x60 {
            return Ok(false);
        }
        Ok(self.code() & 1 != 0)
    }

    /// Whether this note archetype is a trace (friction) variant.
    /// Fails on non-note entities.
    pub fn friction(&self) -> Result<bool, LoadError> {
        if !self.is_note() {
            return Err(LoadError::NotANote(*self));
        }
        let upper = self.code() & 0xF0;
        if upper != 0x10 && upper != 0x20 && upper != 0x40 {
            return Ok(false);
        }
        Ok(self.code() & 2 != 0)
    }
}
