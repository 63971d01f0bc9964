//! The editable field set backing the enrichment preview/edit screens.
//!
//! Both orchestrators stage a suggestion into an [`EnrichForm`] for review.
//! The form is an ordered list of labeled text fields with exactly one
//! focused field at a time; focus moves cyclically with modulo arithmetic.
//! The batch flow excludes the description field so externally synced
//! descriptions can never be edited.

use crate::llm::Enrichment;
use crate::tui::input::InputField;

const FIELDS_WITH_DESCRIPTION: &[&str] = &[
    "Description",
    "Beacons",
    "Directions",
    "Project",
    "Priority",
    "Due",
    "Scheduled",
    "Effort",
    "Impact",
    "Estimate",
    "Fun",
    "Blocks",
];

/// An ordered set of labeled input fields with cyclic focus.
pub struct EnrichForm {
    labels: Vec<&'static str>,
    inputs: Vec<InputField>,
    focused: usize,
}

impl EnrichForm {
    /// Create a form. `with_description` is false for the batch flow, where
    /// the description is not editable.
    pub fn new(with_description: bool) -> Self {
        let labels: Vec<&'static str> = FIELDS_WITH_DESCRIPTION
            .iter()
            .copied()
            .filter(|l| with_description || *l != "Description")
            .collect();
        let inputs = labels.iter().map(|_| InputField::new()).collect();
        let mut form = EnrichForm {
            labels,
            inputs,
            focused: 0,
        };
        form.apply_focus();
        form
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn focused_index(&self) -> usize {
        self.focused
    }

    pub fn is_last_focused(&self) -> bool {
        self.focused == self.len() - 1
    }

    /// Labeled fields in order, for rendering.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &InputField)> {
        self.labels.iter().copied().zip(self.inputs.iter())
    }

    /// Move focus to the next field, wrapping.
    pub fn focus_next(&mut self) {
        self.focused = (self.focused + 1) % self.len();
        self.apply_focus();
    }

    /// Move focus to the previous field, wrapping.
    pub fn focus_prev(&mut self) {
        self.focused = (self.focused + self.len() - 1) % self.len();
        self.apply_focus();
    }

    /// Reset focus to the first field.
    pub fn focus_first(&mut self) {
        self.focused = 0;
        self.apply_focus();
    }

    fn apply_focus(&mut self) {
        for (i, input) in self.inputs.iter_mut().enumerate() {
            input.focused = i == self.focused;
        }
    }

    pub fn focused_input_mut(&mut self) -> &mut InputField {
        &mut self.inputs[self.focused]
    }

    /// Load all fields from a staged suggestion, discarding unconfirmed
    /// keystrokes from any previous edit session.
    pub fn populate(&mut self, e: &Enrichment) {
        for (label, input) in self.labels.iter().zip(self.inputs.iter_mut()) {
            let value = match *label {
                "Description" => e.description.clone(),
                "Beacons" => e.beacons.join(" "),
                "Directions" => e.directions.join(" "),
                "Project" => e.project.clone(),
                "Priority" => e.priority.clone(),
                "Due" => e.due.clone(),
                "Scheduled" => e.scheduled.clone(),
                "Effort" => e.effort.clone(),
                "Impact" => e.impact.clone(),
                "Estimate" => e.estimate.clone(),
                "Fun" => e.fun.clone(),
                "Blocks" => e.blocks.to_string(),
                _ => String::new(),
            };
            input.set_value(&value);
        }
        self.focus_first();
    }

    /// Commit the focused field's text into the staged suggestion.
    pub fn commit_focused(&self, e: &mut Enrichment) {
        let value = self.inputs[self.focused].value.clone();
        match self.labels[self.focused] {
            "Description" => e.description = value,
            "Beacons" => e.beacons = split_tags(&value),
            "Directions" => e.directions = split_tags(&value),
            "Project" => e.project = value,
            "Priority" => e.priority = value,
            "Due" => e.due = value,
            "Scheduled" => e.scheduled = value,
            "Effort" => e.effort = value,
            "Impact" => e.impact = value,
            "Estimate" => e.estimate = value,
            "Fun" => e.fun = value,
            "Blocks" => e.blocks = parse_blocks(&value),
            _ => {}
        }
    }
}

/// Split a space-separated tag list, dropping empty entries.
pub fn split_tags(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

/// Parse the blocking-count field leniently: the leading digit run counts,
/// anything else (including empty input) coerces to 0.
pub fn parse_blocks(s: &str) -> u32 {
    let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_cycle_returns_to_start() {
        for with_description in [true, false] {
            let mut form = EnrichForm::new(with_description);
            let n = form.len();
            for _ in 0..n {
                form.focus_next();
            }
            assert_eq!(form.focused_index(), 0);
            for _ in 0..n {
                form.focus_prev();
            }
            assert_eq!(form.focused_index(), 0);
        }
    }

    #[test]
    fn exactly_one_field_is_focused() {
        let mut form = EnrichForm::new(true);
        form.focus_next();
        form.focus_next();
        let focused: Vec<_> = form.fields().filter(|(_, f)| f.focused).collect();
        assert_eq!(focused.len(), 1);
        assert_eq!(focused[0].0, "Directions");
    }

    #[test]
    fn focus_prev_wraps_from_first() {
        let mut form = EnrichForm::new(true);
        form.focus_prev();
        assert_eq!(form.focused_index(), form.len() - 1);
        assert!(form.is_last_focused());
    }

    #[test]
    fn batch_form_has_no_description_field() {
        let form = EnrichForm::new(false);
        assert!(form.fields().all(|(label, _)| label != "Description"));
        assert_eq!(form.len(), FIELDS_WITH_DESCRIPTION.len() - 1);
    }

    #[test]
    fn populate_then_commit_round_trips_tags() {
        let mut e = Enrichment {
            beacons: vec!["b.great.dev".into(), "b.organized".into()],
            ..Enrichment::default()
        };
        let mut form = EnrichForm::new(true);
        form.populate(&e);
        form.focus_next(); // Beacons
        form.focused_input_mut().set_value("b.healthy  b.learning");
        form.commit_focused(&mut e);
        assert_eq!(e.beacons, vec!["b.healthy", "b.learning"]);
    }

    #[test]
    fn commit_only_touches_the_focused_field() {
        let mut e = Enrichment {
            description: "original".into(),
            priority: "H".into(),
            ..Enrichment::default()
        };
        let mut form = EnrichForm::new(true);
        form.populate(&e);
        form.focused_input_mut().set_value("rewritten");
        form.commit_focused(&mut e);
        assert_eq!(e.description, "rewritten");
        assert_eq!(e.priority, "H");
    }

    #[test]
    fn parse_blocks_is_lenient() {
        assert_eq!(parse_blocks("3"), 3);
        assert_eq!(parse_blocks(" 12 "), 12);
        assert_eq!(parse_blocks("7 tasks"), 7);
        assert_eq!(parse_blocks(""), 0);
        assert_eq!(parse_blocks("lots"), 0);
        assert_eq!(parse_blocks("-2"), 0);
    }
}
