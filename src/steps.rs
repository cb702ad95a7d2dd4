//! # Configurator steps
//!
//! The package configurator walks a menu's categories one step at a time.
//! Each step requires a minimum number of selections before the flow may
//! advance; completing a category raises an upsell prompt exactly once per
//! crossing of the threshold. All transitions here are pure — the routes
//! feed them the refreshed cart and perform the remote side effects.

use std::collections::{HashMap, HashSet};

use crate::models::{CartEnvelope, MenuContent};

/// Units currently selected in one category.
///
/// The cart's own menu echo is the source of truth when the backend sends a
/// live `currentCount`. It does not always do so; the fallback reconstructs
/// the count from raw line items whose product id belongs to the category.
pub fn selected_count(
    category: &MenuContent,
    envelope: &CartEnvelope,
    valid_product_ids: &HashSet<String>,
) -> u32 {
    let echo = envelope
        .cart
        .menu
        .as_ref()
        .and_then(|menu| menu.contents.iter().find(|c| c.name == category.name));

    if let Some(count) = echo.and_then(|c| c.current_count) {
        return count;
    }

    envelope
        .products
        .iter()
        .filter(|product| valid_product_ids.contains(&product.product_id))
        .map(|product| product.quantity)
        .sum()
}

/// Per-category modal bookkeeping. Edge-triggered: the upsell prompt fires
/// on the crossing from below the required count to at-or-above it, not on
/// every observation at or above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryProgress {
    pub has_shown_modal: bool,
    pub last_count: u32,
}

impl CategoryProgress {
    pub fn new(count: u32) -> Self {
        Self {
            has_shown_modal: false,
            last_count: count,
        }
    }

    /// Record a fresh observation. Returns true when the upsell prompt
    /// should open now.
    pub fn observe(&mut self, current: u32, required: u32) -> bool {
        if current < required {
            // Dropping below the threshold re-arms the prompt.
            self.has_shown_modal = false;
            self.last_count = current;
            return false;
        }

        if !self.has_shown_modal && current > self.last_count {
            self.has_shown_modal = true;
            self.last_count = current;
            return true;
        }

        self.last_count = current;
        false
    }
}

/// Outcome of a forward transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Gate unmet; the index is unchanged and the message names both counts.
    Blocked(String),
    /// Moved to the contained step index.
    Advanced(usize),
    /// Last step passed its gate. The caller commits the package remotely
    /// and drops the flow only when that call succeeds.
    Finalize,
}

/// One configurator session: step index, per-category prompt state, the
/// upsell modal, and the product currently tracked as the extra candidate.
#[derive(Debug, Clone)]
pub struct StepFlow {
    pub menu_id: u32,
    pub guests: u32,
    step: usize,
    categories: HashMap<String, CategoryProgress>,
    modal_open: bool,
    pub selected_extra: Option<String>,
}

impl StepFlow {
    pub fn new(menu_id: u32, guests: u32) -> Self {
        Self {
            menu_id,
            guests,
            step: 0,
            categories: HashMap::new(),
            modal_open: false,
            selected_extra: None,
        }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn modal_open(&self) -> bool {
        self.modal_open
    }

    /// Snap back to the first step if the menu shrank under us.
    pub fn clamp(&mut self, total_steps: usize) {
        if total_steps > 0 && self.step >= total_steps {
            self.step = 0;
        }
    }

    /// Feed the latest count for the active category through the
    /// edge-trigger. Opens the modal when a new crossing is observed.
    pub fn observe_category(&mut self, name: &str, current: u32, required: u32) {
        let progress = self
            .categories
            .entry(name.to_string())
            .or_insert_with(|| CategoryProgress::new(current));

        if progress.observe(current, required) {
            self.modal_open = true;
        }
    }

    pub fn close_modal(&mut self) {
        self.modal_open = false;
    }

    /// Gated forward transition. `current` is the freshly recomputed count
    /// for the active category.
    pub fn advance(
        &mut self,
        total_steps: usize,
        category_name: &str,
        required: u32,
        current: u32,
    ) -> Advance {
        if current < required {
            return Advance::Blocked(gate_message(category_name, required, current));
        }

        self.modal_open = false;
        if self.step + 1 < total_steps {
            self.step += 1;
            Advance::Advanced(self.step)
        } else {
            Advance::Finalize
        }
    }

    pub fn previous(&mut self) {
        if self.step > 0 {
            self.step -= 1;
            self.modal_open = false;
        }
    }

    /// Jump to an arbitrary step: strictly earlier steps are always
    /// reachable, the immediate next step only when the current gate is
    /// satisfied, everything beyond that never.
    pub fn jump_to(&mut self, target: usize, total_steps: usize, gate_satisfied: bool) -> bool {
        if target >= total_steps {
            return false;
        }
        let allowed = target < self.step || (target == self.step + 1 && gate_satisfied);
        if allowed {
            self.step = target;
            self.modal_open = false;
        }
        allowed
    }
}

/// Validation message shown when a step's minimum is unmet.
pub fn gate_message(category: &str, required: u32, current: u32) -> String {
    let plural = if required > 1 { "s" } else { "" };
    format!(
        "Bitte wählen Sie mindestens {required} {category} Artikel{plural}. \
         Sie haben {current} ausgewählt."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CartEnvelope;

    fn envelope(json: &str) -> CartEnvelope {
        serde_json::from_str(json).unwrap()
    }

    fn category(name: &str, count: u32) -> MenuContent {
        MenuContent {
            name: name.to_string(),
            ids: vec![61],
            count,
            current_count: None,
        }
    }

    #[test]
    fn menu_echo_count_wins_over_line_item_sum() {
        let envelope = envelope(
            r#"{
                "cart":{"menu":{"name":"Menü Klassik","contents":[
                    {"name":"Vorspeise","ids":[61],"count":2,"currentCount":5}
                ]}},
                "products":[{"cart_id":"1","product_id":"7","name":"Hummus","quantity":1,"price":0,"total":0}]
            }"#,
        );
        let ids: HashSet<String> = ["7".to_string()].into();

        assert_eq!(selected_count(&category("Vorspeise", 2), &envelope, &ids), 5);
    }

    #[test]
    fn line_items_are_summed_when_no_echo_exists() {
        let envelope = envelope(
            r#"{"products":[
                {"cart_id":"1","product_id":"7","name":"Hummus","quantity":2,"price":0,"total":0},
                {"cart_id":"2","product_id":"8","name":"Falafel","quantity":1,"price":0,"total":0},
                {"cart_id":"3","product_id":"99","name":"Fremd","quantity":4,"price":0,"total":0}
            ]}"#,
        );
        let ids: HashSet<String> = ["7".to_string(), "8".to_string()].into();

        assert_eq!(selected_count(&category("Vorspeise", 2), &envelope, &ids), 3);
    }

    #[test]
    fn modal_fires_once_per_crossing() {
        let mut progress = CategoryProgress::new(1);

        // Count grows to the threshold: fire once.
        assert!(progress.observe(2, 2));
        // Re-rendering with the same count stays silent.
        assert!(!progress.observe(2, 2));
        // Growing further while already shown stays silent.
        assert!(!progress.observe(3, 2));
    }

    #[test]
    fn dropping_below_threshold_rearms_the_modal() {
        let mut progress = CategoryProgress::new(1);
        assert!(progress.observe(2, 2));

        // Removing an item resets eligibility.
        assert!(!progress.observe(1, 2));
        assert!(!progress.has_shown_modal);

        // A fresh crossing fires again.
        assert!(progress.observe(2, 2));
    }

    #[test]
    fn blocked_advance_reports_both_counts_and_keeps_the_step() {
        let mut flow = StepFlow::new(3, 4);

        match flow.advance(3, "Vorspeise", 2, 1) {
            Advance::Blocked(message) => {
                assert!(message.contains('2'), "missing required count: {message}");
                assert!(message.contains('1'), "missing actual count: {message}");
                assert!(message.contains("Vorspeise"));
            }
            other => panic!("expected Blocked, got {other:?}"),
        }
        assert_eq!(flow.step(), 0);
    }

    #[test]
    fn advance_walks_steps_and_finalizes_on_the_last() {
        let mut flow = StepFlow::new(3, 4);

        assert_eq!(flow.advance(2, "Vorspeise", 1, 1), Advance::Advanced(1));
        assert_eq!(flow.advance(2, "Dessert", 1, 2), Advance::Finalize);
        // Finalize leaves the index in place; the caller exits on success.
        assert_eq!(flow.step(), 1);
    }

    #[test]
    fn previous_saturates_at_zero() {
        let mut flow = StepFlow::new(3, 4);
        flow.previous();
        assert_eq!(flow.step(), 0);

        assert_eq!(flow.advance(3, "Vorspeise", 0, 0), Advance::Advanced(1));
        flow.previous();
        assert_eq!(flow.step(), 0);
    }

    #[test]
    fn jump_rules() {
        let mut flow = StepFlow::new(3, 4);
        assert_eq!(flow.advance(4, "A", 0, 0), Advance::Advanced(1));
        assert_eq!(flow.advance(4, "B", 0, 0), Advance::Advanced(2));

        // Strictly earlier: always allowed.
        assert!(flow.jump_to(0, 4, false));
        assert_eq!(flow.step(), 0);

        // Next step: only when the gate is satisfied.
        assert!(!flow.jump_to(1, 4, false));
        assert_eq!(flow.step(), 0);
        assert!(flow.jump_to(1, 4, true));
        assert_eq!(flow.step(), 1);

        // Beyond next: never.
        assert!(!flow.jump_to(3, 4, true));
        // Out of range: never.
        assert!(!flow.jump_to(4, 4, true));
    }

    #[test]
    fn step_changes_force_close_the_modal() {
        let mut flow = StepFlow::new(3, 4);
        flow.observe_category("Vorspeise", 1, 2);
        flow.observe_category("Vorspeise", 2, 2);
        assert!(flow.modal_open());

        assert_eq!(flow.advance(3, "Vorspeise", 2, 2), Advance::Advanced(1));
        assert!(!flow.modal_open());
    }

    #[test]
    fn end_to_end_vorspeise_scenario() {
        // Category "Vorspeise" requires 2; the cart holds 1 matching item.
        let mut flow = StepFlow::new(3, 4);
        flow.observe_category("Vorspeise", 1, 2);

        match flow.advance(3, "Vorspeise", 2, 1) {
            Advance::Blocked(message) => {
                assert!(message.contains('2') && message.contains('1'));
            }
            other => panic!("expected Blocked, got {other:?}"),
        }

        // Adding one more crosses the threshold: the modal opens once.
        flow.observe_category("Vorspeise", 2, 2);
        assert!(flow.modal_open());
        flow.close_modal();

        // Re-render with an unchanged count: stays closed.
        flow.observe_category("Vorspeise", 2, 2);
        assert!(!flow.modal_open());

        // Remove one, re-add: a new crossing fires again.
        flow.observe_category("Vorspeise", 1, 2);
        flow.observe_category("Vorspeise", 2, 2);
        assert!(flow.modal_open());
    }
}
