use crate::score::easing::EaseType;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HoldStepType {
    Normal,
    Hidden,
    /// Attached tick: renders a diamond but does not control the curve.
    Skip,
}

impl HoldStepType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HoldStepType::Normal => "normal",
            HoldStepType::Hidden => "hidden",
            HoldStepType::Skip => "skip",
        }
    }
}

/// One anchor of a hold: the id of a `Hold` or `HoldMid` note plus the ease
/// of the curve segment leaving it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HoldStep {
    pub id: i32,
    pub step_type: HoldStepType,
    pub ease: EaseType,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum HoldNoteType {
    #[default]
    Normal,
    Hidden,
    Guide,
}

impl HoldNoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HoldNoteType::Normal => "normal",
            HoldNoteType::Hidden => "hidden",
            HoldNoteType::Guide => "guide",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum GuideColor {
    #[default]
    Neutral,
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    Cyan,
    Black,
}

impl GuideColor {
    pub fn from_index(index: i64) -> Option<GuideColor> {
        match index {
            0 => Some(GuideColor::Neutral),
            1 => Some(GuideColor::Red),
            2 => Some(GuideColor::Green),
            3 => Some(GuideColor::Blue),
            4 => Some(GuideColor::Yellow),
            5 => Some(GuideColor::Purple),
            6 => Some(GuideColor::Cyan),
            7 => Some(GuideColor::Black),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GuideColor::Neutral => "guide_neutral",
            GuideColor::Red => "guide_red",
            GuideColor::Green => "guide_green",
            GuideColor::Blue => "guide_blue",
            GuideColor::Yellow => "guide_yellow",
            GuideColor::Purple => "guide_purple",
            GuideColor::Cyan => "guide_cyan",
            GuideColor::Black => "guide_black",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum FadeType {
    #[default]
    Out,
    None,
    In,
}

impl FadeType {
    pub fn from_index(index: i64) -> Option<FadeType> {
        match index {
            0 => Some(FadeType::Out),
            1 => Some(FadeType::None),
            2 => Some(FadeType::In),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FadeType::Out => "fade_out",
            FadeType::None => "fade_none",
            FadeType::In => "fade_in",
        }
    }
}

/// Slide aggregate keyed by its start note id. Steps are the mid anchors in
/// tick order; `end_id` is -1 only while the slide is still being assembled.
#[derive(Clone, Debug, PartialEq)]
pub struct HoldNote {
    pub start: HoldStep,
    pub steps: Vec<HoldStep>,
    pub end_id: i32,
    pub start_type: HoldNoteType,
    pub end_type: HoldNoteType,
    pub fade: FadeType,
    pub guide_color: GuideColor,
}

impl HoldNote {
    pub fn new(start_id: i32) -> Self {
        HoldNote {
            start: HoldStep {
                id: start_id,
                step_type: HoldStepType::Normal,
                ease: EaseType::Linear,
            },
            steps: Vec::new(),
            end_id: -1,
            start_type: HoldNoteType::Normal,
            end_type: HoldNoteType::Normal,
            fade: FadeType::Out,
            guide_color: GuideColor::Neutral,
        }
    }

    pub fn is_guide(&self) -> bool {
        self.start_type == HoldNoteType::Guide || self.end_type == HoldNoteType::Guide
    }

    /// Looks up the start or a mid step carrying the given note id.
    pub fn step_with_id(&self, id: i32) -> Option<&HoldStep> {
        if self.start.id == id {
            return Some(&self.start);
        }
        self.steps.iter().find(|step| step.id == id)
    }

    pub fn step_with_id_mut(&mut self, id: i32) -> Option<&mut HoldStep> {
        if self.start.id == id {
            return Some(&mut self.start);
        }
        self.steps.iter_mut().find(|step| step.id == id)
    }
}
