/// Curve shape of one hold segment.
///
/// `Undetermined` only exists while a slide is being assembled: ticks enter
/// the stream before the connector that names their ease. A finished score
/// never contains it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum EaseType {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    EaseOutIn,
    Undetermined,
}

impl EaseType {
    /// Decodes the wire tri-value: +1 ease-in, -1 ease-out, 0 linear.
    pub fn from_signum(value: i64) -> Option<EaseType> {
        match value {
            1 => Some(EaseType::EaseIn),
            -1 => Some(EaseType::EaseOut),
            0 => Some(EaseType::Linear),
            _ => None,
        }
    }

    /// Maps a normalized segment time `u` in [0, 1] to curve progress.
    /// Returns `None` for `Undetermined`, which has no curve.
    pub fn apply(&self, u: f32) -> Option<f32> {
        match self {
            EaseType::Linear => Some(u),
            EaseType::EaseIn => Some(u * u),
            EaseType::EaseOut => Some(1.0 - (1.0 - u) * (1.0 - u)),
            EaseType::EaseInOut => {
                if u < 0.5 {
                    Some(2.0 * u * u)
                } else {
                    Some(1.0 - (1.0 - u) * (1.0 - u) * 2.0)
                }
            }
            EaseType::EaseOutIn => {
                let sign = if u < 0.5 { -2.0 } else { 2.0 };
                Some(0.5 + (0.5 - u) * (0.5 - u) * sign)
            }
            EaseType::Undetermined => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EaseType::Linear => "linear",
            EaseType::EaseIn => "ease_in",
            EaseType::EaseOut => "ease_out",
            EaseType::EaseInOut => "ease_in_out",
            EaseType::EaseOutIn => "ease_out_in",
            EaseType::Undetermined => "undetermined",
        }
    }
}
