use std::collections::HashMap;

use log::debug;

use crate::parsing::LoadError;
use crate::score::easing::EaseType;
use crate::score::hold::{HoldNoteType, HoldStepType};
use crate::score::note::{Note, NoteType};
use crate::score::Score;

/// Settles slides whose end never arrived as an explicit slide-end entity.
///
/// A trailing step still carrying `Undetermined` ease on an endless hold is
/// the slide's actual end (a hidden tick closed the stream); it is promoted
/// out of the step list. Any other leftover `Undetermined`, or a hold that
/// remains endless, means the document's slide stream was broken.
pub fn reconcile_open_ends(score: &mut Score) -> Result<(), LoadError> {
    for (&hold_id, hold) in score.hold_notes.iter_mut() {
        let last = hold.steps.len().wrapping_sub(1);
        for index in 0..hold.steps.len() {
            if hold.steps[index].ease != EaseType::Undetermined {
                continue;
            }
            if index != last || hold.end_id != -1 {
                return Err(LoadError::MalformedSlide(format!(
                    "slide {} has an unresolved ease on step {}",
                    hold_id, index
                )));
            }
            let Some(step) = hold.steps.pop() else {
                continue;
            };
            debug!("Promoting trailing tick {} to the end of slide {}", step.id, hold_id);
            hold.end_id = step.id;
            if hold.end_type == HoldNoteType::Normal {
                hold.end_type = HoldNoteType::Hidden;
            }
            if let Some(note) = score.notes.get_mut(&step.id) {
                note.note_type = NoteType::HoldEnd;
            }
        }
        if hold.end_id == -1 {
            return Err(LoadError::MalformedSlide(format!("slide {} has no end", hold_id)));
        }
    }
    Ok(())
}

/// Second pass: gives attached (Skip) ticks their lane and width.
///
/// Walks each hold right to left so the bracketing curve segment is known
/// before the attached ticks inside it are reached. Re-running the pass on a
/// resolved score recomputes the same values, since the anchors never move.
pub fn resolve_attached(score: &mut Score) -> Result<(), LoadError> {
    let Score { notes, hold_notes, .. } = score;
    for (&hold_id, hold) in hold_notes.iter() {
        // Nearest non-attached anchor strictly below `index`, falling back
        // to the slide start; its ease shapes the segment above it.
        let anchor_below = |index: usize| {
            hold.steps[..index]
                .iter()
                .rfind(|step| step.step_type != HoldStepType::Skip)
                .map_or((hold.start.id, hold.start.ease), |step| (step.id, step.ease))
        };

        let mut segment_end = hold.end_id;
        let (mut segment_start, mut segment_ease) = anchor_below(hold.steps.len());

        for index in (0..hold.steps.len()).rev() {
            let step = &hold.steps[index];
            if step.step_type != HoldStepType::Skip {
                segment_end = step.id;
                let (start, ease) = anchor_below(index);
                segment_start = start;
                segment_ease = ease;
                continue;
            }

            let tick = fetch(notes, step.id, hold_id)?.tick;
            let start = fetch(notes, segment_start, hold_id)?;
            let end = fetch(notes, segment_end, hold_id)?;
            let span = end.tick - start.tick;
            if span <= 0 {
                return Err(LoadError::DegenerateSegment { hold_id, tick });
            }
            let u = (tick - start.tick) as f32 / span as f32;
            let progress = segment_ease
                .apply(u)
                .ok_or(LoadError::EaseUnresolved { hold_id })?;
            let left = lerp(start.lane, end.lane, progress);
            let right = lerp(start.lane + start.width, end.lane + end.width, progress);

            if let Some(note) = notes.get_mut(&step.id) {
                note.lane = left.round();
                note.width = (right - left).round().max(1.0);
            }
        }
    }
    Ok(())
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn fetch(notes: &HashMap<i32, Note>, id: i32, hold_id: i32) -> Result<Note, LoadError> {
    notes.get(&id).cloned().ok_or_else(|| {
        LoadError::MalformedSlide(format!("slide {} references missing note {}", hold_id, id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_edges() {
        assert_eq!(lerp(2.0, 6.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 6.0, 1.0), 6.0);
        assert_eq!(lerp(2.0, 6.0, 0.5), 4.0);
    }
}
