//! The editable checklist: explicit display order, periodically normalized
//! by a check-state sort.

use std::collections::HashSet;

use tracing::warn;
use uuid::Uuid;

use crate::models::checklist::ChecklistItem;

/// Ordered checklist. Ids are unique on every exit path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecklistModel {
    items: Vec<ChecklistItem>,
}

impl ChecklistModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt stored items in their stored order. A repeated id gets a fresh one.
    pub fn from_items(mut items: Vec<ChecklistItem>) -> Self {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &mut items {
            if !seen.insert(item.id) {
                let fresh = Uuid::new_v4();
                warn!(duplicate = %item.id, replacement = %fresh, "Duplicate checklist id repaired");
                item.id = fresh;
                seen.insert(fresh);
            }
        }
        Self { items }
    }

    /// Replace every item with newly extracted ones.
    pub fn replace_with_extracted(&mut self, items: Vec<ChecklistItem>) {
        *self = Self::from_items(items);
    }

    pub fn items(&self) -> &[ChecklistItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&ChecklistItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.items.iter().position(|i| i.id == id)
    }

    // ── Mutations ──

    /// Append an unchecked item ranked after everything present.
    /// Blank text is ignored.
    pub fn add(&mut self, text: &str) -> Option<Uuid> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let item = ChecklistItem::new(text, self.items.len());
        let id = item.id;
        self.items.push(item);
        Some(id)
    }

    /// Flip the check state. The caller re-sorts afterwards.
    pub fn toggle(&mut self, id: Uuid) -> bool {
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.is_checked = !item.is_checked;
                true
            }
            None => false,
        }
    }

    /// Replace the text. Blank text leaves the item untouched.
    pub fn edit(&mut self, id: Uuid, new_text: &str) -> bool {
        let new_text = new_text.trim();
        if new_text.is_empty() {
            return false;
        }
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.text = new_text.to_string();
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self, id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() != before
    }

    /// Move the item at `from` so it ends up at `to`.
    /// Holds until the next `sort`. Out-of-range positions are a no-op.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.items.len();
        if from >= len || to >= len {
            return false;
        }
        if from != to {
            let item = self.items.remove(from);
            self.items.insert(to, item);
        }
        true
    }

    /// Drag-and-drop form of `reorder`: the dragged item takes the target's slot.
    pub fn move_item(&mut self, dragged: Uuid, target: Uuid) -> bool {
        if dragged == target {
            return false;
        }
        match (self.position(dragged), self.position(target)) {
            (Some(from), Some(to)) => self.reorder(from, to),
            _ => false,
        }
    }

    /// Unchecked first, then ascending `original_index`. Stable for ties.
    pub fn sort(&mut self) {
        self.items.sort_by(ChecklistItem::display_cmp);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn texts(model: &ChecklistModel) -> Vec<&str> {
        model.items().iter().map(|i| i.text.as_str()).collect()
    }

    fn model_of(names: &[&str]) -> ChecklistModel {
        let mut model = ChecklistModel::new();
        for name in names {
            model.add(name);
        }
        model
    }

    fn is_display_sorted(model: &ChecklistModel) -> bool {
        model
            .items()
            .windows(2)
            .all(|w| w[0].display_cmp(&w[1]) != std::cmp::Ordering::Greater)
    }

    #[test]
    fn add_assigns_rank_from_length() {
        let mut model = model_of(&["milk", "eggs", "bread"]);
        let id = model.add("butter").unwrap();
        let item = model.get(id).unwrap();
        assert_eq!(item.original_index, 3);
        assert!(!item.is_checked);
        assert_eq!(model.position(id), Some(3));
    }

    #[test]
    fn add_ignores_blank_text() {
        let mut model = model_of(&["milk"]);
        assert!(model.add("").is_none());
        assert!(model.add("   ").is_none());
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn toggle_then_sort_moves_checked_last() {
        let mut model = model_of(&["a", "b", "c", "d"]);
        let a = model.items()[0].id;
        let c = model.items()[2].id;
        assert!(model.toggle(a));
        assert!(model.toggle(c));
        model.sort();
        assert_eq!(texts(&model), vec!["b", "d", "a", "c"]);
        assert!(is_display_sorted(&model));

        assert!(model.toggle(a));
        model.sort();
        assert_eq!(texts(&model), vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn toggle_unknown_id_is_noop() {
        let mut model = model_of(&["a"]);
        let before = model.clone();
        assert!(!model.toggle(Uuid::new_v4()));
        assert_eq!(model, before);
    }

    #[test]
    fn edit_replaces_text_but_ignores_empty() {
        let mut model = model_of(&["mlik"]);
        let id = model.items()[0].id;
        assert!(model.edit(id, "milk"));
        assert!(!model.edit(id, ""));
        assert_eq!(model.get(id).unwrap().text, "milk");
        assert!(!model.edit(Uuid::new_v4(), "eggs"));
    }

    #[test]
    fn delete_unknown_id_leaves_model_unchanged() {
        let mut model = model_of(&["a", "b"]);
        let before = model.clone();
        assert!(!model.delete(Uuid::new_v4()));
        assert_eq!(model, before);
    }

    #[test]
    fn delete_keeps_remaining_order_and_ranks() {
        let mut model = model_of(&["a", "b", "c"]);
        let b = model.items()[1].id;
        assert!(model.delete(b));
        assert_eq!(texts(&model), vec!["a", "c"]);
        assert_eq!(model.items()[1].original_index, 2);

        // Rank ties after delete + add keep insertion order on sort.
        let d = model.add("d").unwrap();
        assert_eq!(model.get(d).unwrap().original_index, 2);
        model.sort();
        assert_eq!(texts(&model), vec!["a", "c", "d"]);
    }

    #[test]
    fn reorder_moves_item_and_next_sort_overrides_it() {
        let mut model = model_of(&["a", "b", "c"]);
        assert!(model.reorder(0, 2));
        assert_eq!(texts(&model), vec!["b", "c", "a"]);

        let b = model.items()[0].id;
        model.toggle(b);
        model.sort();
        assert_eq!(texts(&model), vec!["a", "c", "b"]);
    }

    #[test]
    fn reorder_out_of_range_is_noop() {
        let mut model = model_of(&["a", "b"]);
        assert!(!model.reorder(5, 0));
        assert!(!model.reorder(0, 2));
        assert_eq!(texts(&model), vec!["a", "b"]);
    }

    #[test]
    fn move_item_takes_target_slot() {
        let mut model = model_of(&["a", "b", "c", "d"]);
        let d = model.items()[3].id;
        let b = model.items()[1].id;
        assert!(model.move_item(d, b));
        assert_eq!(texts(&model), vec!["a", "d", "b", "c"]);

        assert!(!model.move_item(d, d));
        assert!(!model.move_item(d, Uuid::new_v4()));
    }

    #[test]
    fn sort_is_idempotent() {
        let mut model = model_of(&["a", "b", "c"]);
        let b = model.items()[1].id;
        model.toggle(b);
        model.sort();
        let once = model.clone();
        model.sort();
        assert_eq!(model, once);
    }

    #[test]
    fn from_items_repairs_duplicate_ids() {
        let first = ChecklistItem::new("a", 0);
        let mut second = ChecklistItem::new("b", 1);
        second.id = first.id;

        let model = ChecklistModel::from_items(vec![first.clone(), second]);
        assert_eq!(model.items()[0].id, first.id);
        assert_ne!(model.items()[1].id, first.id);
        assert_eq!(texts(&model), vec!["a", "b"]);
    }

    #[test]
    fn ids_stay_unique_through_mixed_operations() {
        let mut model = model_of(&["a", "b", "c", "d", "e"]);
        let ids: Vec<Uuid> = model.items().iter().map(|i| i.id).collect();
        model.toggle(ids[1]);
        model.reorder(4, 0);
        model.delete(ids[2]);
        model.delete(ids[2]);
        model.add("f");
        model.move_item(ids[0], ids[3]);
        model.sort();

        let unique: HashSet<Uuid> = model.items().iter().map(|i| i.id).collect();
        assert_eq!(unique.len(), model.len());
        assert_eq!(model.len(), 5);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(String),
        Toggle(usize),
        Edit(usize, String),
        Delete(usize),
        Reorder(usize, usize),
        Move(usize, usize),
        Sort,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            "[a-z ]{0,6}".prop_map(Op::Add),
            any::<usize>().prop_map(Op::Toggle),
            (any::<usize>(), "[a-z ]{0,6}").prop_map(|(i, t)| Op::Edit(i, t)),
            any::<usize>().prop_map(Op::Delete),
            (0usize..12, 0usize..12).prop_map(|(f, t)| Op::Reorder(f, t)),
            (any::<usize>(), any::<usize>()).prop_map(|(d, t)| Op::Move(d, t)),
            Just(Op::Sort),
        ]
    }

    fn id_at(model: &ChecklistModel, index: usize) -> Uuid {
        if model.is_empty() {
            Uuid::new_v4()
        } else {
            model.items()[index % model.len()].id
        }
    }

    fn apply(model: &mut ChecklistModel, op: Op) {
        match op {
            Op::Add(text) => {
                model.add(&text);
            }
            Op::Toggle(i) => {
                let id = id_at(model, i);
                model.toggle(id);
            }
            Op::Edit(i, text) => {
                let id = id_at(model, i);
                model.edit(id, &text);
            }
            Op::Delete(i) => {
                let id = id_at(model, i);
                model.delete(id);
            }
            Op::Reorder(from, to) => {
                model.reorder(from, to);
            }
            Op::Move(d, t) => {
                let (dragged, target) = (id_at(model, d), id_at(model, t));
                model.move_item(dragged, target);
            }
            Op::Sort => model.sort(),
        }
    }

    proptest! {
        #[test]
        fn prop_sort_orders_any_edit_history(ops in prop::collection::vec(op_strategy(), 0..40)) {
            let mut model = model_of(&["milk", "eggs", "bread"]);
            for op in ops {
                apply(&mut model, op);
            }
            let before: HashSet<Uuid> = model.items().iter().map(|i| i.id).collect();
            prop_assert_eq!(before.len(), model.len());

            model.sort();

            let checked_from = model.items().iter().position(|i| i.is_checked).unwrap_or(model.len());
            prop_assert!(model.items()[checked_from..].iter().all(|i| i.is_checked));
            prop_assert!(is_display_sorted(&model));
            let after: HashSet<Uuid> = model.items().iter().map(|i| i.id).collect();
            prop_assert_eq!(after, before);
            prop_assert!(model.items().iter().all(|i| !i.text.trim().is_empty()));
        }
    }
}
