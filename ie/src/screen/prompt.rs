//! Interaction prompt policy.
//!
//! The prompt lists up to two rows ("Focused" and "Gathering") with a key hint
//! (the selector) pointing at the active one. Only the gathering row is worth
//! triggering, so the selector has to sit closer to it than to the focus row.

use crate::{DetectionSet, Label};

/// Layout of the prompt as seen in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptLayout {
    /// Neither prompt row is visible.
    Absent,
    /// Selector sits on the gathering row.
    Aligned,
    /// Selector and gathering row visible but misaligned; scrolling may fix it.
    Adjustable,
    /// Gathering row visible without a selector.
    GatherWithoutSelector,
    /// Focus row visible, gathering row missing.
    FocusOnly,
}

/// Vertical distance used when a row is missing; larger than any frame.
const FAR: u32 = 1_000_000_000;

/// True only when both the selector and the gathering row are present and
/// `|cy(sel) - cy(gather)| + tolerance < |cy(sel) - cy(focus)|`.
///
/// A missing focus row counts as infinitely far away.
pub fn is_target_aligned(set: &DetectionSet, tolerance: u32) -> bool {
    let (Some(sel), Some(gather)) = (set.get(Label::Selector), set.get(Label::GatherIndicator)) else {
        return false;
    };
    let cy = sel.bbox.center().1;

    let dg = cy.abs_diff(gather.bbox.center().1);
    let df = set
        .get(Label::FocusIndicator)
        .map_or(FAR, |focus| cy.abs_diff(focus.bbox.center().1));

    dg.saturating_add(tolerance) < df
}

/// The focus or the gathering row is visible.
#[inline]
pub fn has_prompt(set: &DetectionSet) -> bool {
    set.has_target()
}

pub fn classify(set: &DetectionSet, tolerance: u32) -> PromptLayout {
    let sel = set.get(Label::Selector).is_some();
    let gather = set.get(Label::GatherIndicator).is_some();
    let focus = set.get(Label::FocusIndicator).is_some();

    match (gather, sel, focus) {
        (true, true, _) if is_target_aligned(set, tolerance) => PromptLayout::Aligned,
        (true, true, _) => PromptLayout::Adjustable,
        (true, false, _) => PromptLayout::GatherWithoutSelector,
        (false, _, true) => PromptLayout::FocusOnly,
        (false, _, false) => PromptLayout::Absent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoxRect, Detection, Rect};

    fn row(label: Label, cy: u32) -> Detection {
        Detection {
            label,
            score: 0.9,
            bbox: BoxRect::new(10, cy - 10, 60, cy + 10),
        }
    }

    fn set(rows: &[Detection]) -> DetectionSet {
        let mut set = DetectionSet::new(Rect::new(0, 0, 400, 400));
        for r in rows {
            set.insert(*r);
        }
        set
    }

    #[test]
    fn requires_selector_and_gather() {
        assert!(!is_target_aligned(&set(&[]), 16));
        assert!(!is_target_aligned(&set(&[row(Label::Selector, 100)]), 16));
        assert!(!is_target_aligned(&set(&[row(Label::GatherIndicator, 100)]), 16));
        assert!(!is_target_aligned(
            &set(&[row(Label::GatherIndicator, 100), row(Label::FocusIndicator, 100)]),
            16
        ));
    }

    #[test]
    fn missing_focus_counts_as_far() {
        let s = set(&[row(Label::Selector, 100), row(Label::GatherIndicator, 300)]);
        assert!(is_target_aligned(&s, 16));
        assert_eq!(classify(&s, 16), PromptLayout::Aligned);
    }

    #[test]
    fn selector_near_gather_row() {
        let s = set(&[
            row(Label::Selector, 202),
            row(Label::GatherIndicator, 200),
            row(Label::FocusIndicator, 150),
        ]);
        assert!(is_target_aligned(&s, 16));
    }

    #[test]
    fn tolerance_boundary_is_strict() {
        // dg = 0, df = 16: 0 + 16 < 16 is false.
        let s = set(&[
            row(Label::Selector, 200),
            row(Label::GatherIndicator, 200),
            row(Label::FocusIndicator, 216),
        ]);
        assert!(!is_target_aligned(&s, 16));
        assert!(is_target_aligned(&s, 15));
        assert_eq!(classify(&s, 16), PromptLayout::Adjustable);
    }

    #[test]
    fn selector_on_focus_row() {
        let s = set(&[
            row(Label::Selector, 150),
            row(Label::GatherIndicator, 200),
            row(Label::FocusIndicator, 150),
        ]);
        assert!(!is_target_aligned(&s, 16));
    }

    #[test]
    fn classify_partial_layouts() {
        assert_eq!(classify(&set(&[]), 16), PromptLayout::Absent);
        assert_eq!(classify(&set(&[row(Label::FocusIndicator, 50)]), 16), PromptLayout::FocusOnly);
        assert_eq!(classify(&set(&[row(Label::Selector, 50)]), 16), PromptLayout::Absent);
        assert_eq!(
            classify(&set(&[row(Label::Selector, 50), row(Label::FocusIndicator, 50)]), 16),
            PromptLayout::FocusOnly
        );
        assert_eq!(
            classify(&set(&[row(Label::GatherIndicator, 50)]), 16),
            PromptLayout::GatherWithoutSelector
        );
        assert!(has_prompt(&set(&[row(Label::FocusIndicator, 50)])));
        assert!(has_prompt(&set(&[row(Label::GatherIndicator, 50)])));
        assert!(!has_prompt(&set(&[row(Label::Selector, 50)])));
    }
}
