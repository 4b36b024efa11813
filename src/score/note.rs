#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoteType {
    Tap,
    Hold,
    HoldMid,
    HoldEnd,
    Damage,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum FlickType {
    #[default]
    None,
    Default,
    Left,
    Right,
}

impl FlickType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlickType::None => "none",
            FlickType::Default => "default",
            FlickType::Left => "left",
            FlickType::Right => "right",
        }
    }
}

/// A single placed note. Hold mids and ends point back at their start note
/// through `parent_id`; every other note carries `parent_id == -1`.
#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub id: i32,
    pub note_type: NoteType,
    pub parent_id: i32,
    pub tick: i32,
    /// Left edge in the 0..12 lane coordinate system (center at 6).
    pub lane: f32,
    /// Width in half-lane units; at least 1 for anything playable.
    pub width: f32,
    pub critical: bool,
    pub friction: bool,
    pub flick: FlickType,
    pub layer: i32,
}
