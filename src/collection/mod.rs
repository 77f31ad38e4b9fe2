//! Client-side snapshot of one sibling set.
//!
//! Every transform returns a new collection and leaves `self` untouched, so a
//! controller can keep the previous value around as a rollback snapshot.

use thiserror::Error;
use uuid::Uuid;

/// Anything with a stable id and a position among its siblings
pub trait Positioned {
    fn id(&self) -> Uuid;
    fn display_order(&self) -> i32;
    fn set_display_order(&mut self, order: i32);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    #[error("Index {index} out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderedCollection<T> {
    // Backing order is arbitrary after inserts; render through `sorted()`
    items: Vec<T>,
}

impl<T> Default for OrderedCollection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Positioned + Clone> OrderedCollection<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    /// Ascending by `display_order`; ties keep backing position (stable sort)
    pub fn sorted(&self) -> Vec<&T> {
        let mut view: Vec<&T> = self.items.iter().collect();
        view.sort_by_key(|item| item.display_order());
        view
    }

    /// Owned copy of the sorted view
    pub fn to_sorted_vec(&self) -> Vec<T> {
        self.sorted().into_iter().cloned().collect()
    }

    /// Move the item at sorted position `from` to sorted position `to` and
    /// renumber every item to `position + 1`.
    pub fn with_reordered(&self, from: usize, to: usize) -> Result<Self, CollectionError> {
        let len = self.items.len();
        for index in [from, to] {
            if index >= len {
                return Err(CollectionError::IndexOutOfRange { index, len });
            }
        }

        let mut items = self.to_sorted_vec();
        let moved = items.remove(from);
        items.insert(to, moved);
        for (position, item) in items.iter_mut().enumerate() {
            item.set_display_order(position as i32 + 1);
        }

        Ok(Self { items })
    }

    /// Replace the entity with the same id, or append it
    pub fn with_upserted(&self, entity: T) -> Self {
        let mut items = self.items.clone();
        match items.iter_mut().find(|item| item.id() == entity.id()) {
            Some(slot) => *slot = entity,
            None => items.push(entity),
        }
        Self { items }
    }

    pub fn with_removed(&self, id: Uuid) -> Self {
        Self {
            items: self
                .items
                .iter()
                .filter(|item| item.id() != id)
                .cloned()
                .collect(),
        }
    }

    /// Apply `f` to the entity with `id`; `None` when absent
    pub fn with_updated(&self, id: Uuid, f: impl FnOnce(&mut T)) -> Option<Self> {
        let mut items = self.items.clone();
        let slot = items.iter_mut().find(|item| item.id() == id)?;
        f(slot);
        Some(Self { items })
    }

    /// `max(display_order) + 1`, or 1 for an empty set. Saturates at `i32::MAX`.
    pub fn next_display_order(&self) -> i32 {
        self.items
            .iter()
            .map(Positioned::display_order)
            .max()
            .unwrap_or(0)
            .saturating_add(1)
    }

    /// Put every item that is also in `snapshot` back at its snapshot order and
    /// backing position. Items added since keep their own order; items removed
    /// since stay removed.
    pub fn with_orders_restored(&self, snapshot: &Self) -> Self {
        let mut items: Vec<T> = snapshot
            .items
            .iter()
            .filter_map(|old| {
                let mut current = self.get(old.id())?.clone();
                current.set_display_order(old.display_order());
                Some(current)
            })
            .collect();
        items.extend(
            self.items
                .iter()
                .filter(|item| !snapshot.contains(item.id()))
                .cloned(),
        );
        Self { items }
    }

    /// `(id, display_order)` for every item, in sorted order
    pub fn order_pairs(&self) -> Vec<(Uuid, i32)> {
        self.sorted()
            .into_iter()
            .map(|item| (item.id(), item.display_order()))
            .collect()
    }

    /// Pairs whose `display_order` differs from `before`, in sorted order
    pub fn changed_orders(&self, before: &Self) -> Vec<(Uuid, i32)> {
        self.order_pairs()
            .into_iter()
            .filter(|(id, order)| before.get(*id).map(Positioned::display_order) != Some(*order))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn into_inner(self) -> Vec<T> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: Uuid,
        name: &'static str,
        order: i32,
    }

    impl Positioned for Item {
        fn id(&self) -> Uuid {
            self.id
        }
        fn display_order(&self) -> i32 {
            self.order
        }
        fn set_display_order(&mut self, order: i32) {
            self.order = order;
        }
    }

    fn item(name: &'static str, order: i32) -> Item {
        Item { id: Uuid::new_v4(), name, order }
    }

    fn names(c: &OrderedCollection<Item>) -> Vec<&'static str> {
        c.sorted().iter().map(|i| i.name).collect()
    }

    fn orders(c: &OrderedCollection<Item>) -> Vec<i32> {
        c.sorted().iter().map(|i| i.order).collect()
    }

    #[test]
    fn sorted_is_stable_on_ties() {
        let c = OrderedCollection::new(vec![item("b", 2), item("x", 1), item("y", 1), item("a", 0)]);
        assert_eq!(names(&c), vec!["a", "x", "y", "b"]);
    }

    #[test]
    fn reorder_moves_last_to_front_and_renumbers() {
        let c = OrderedCollection::new(vec![item("A", 1), item("B", 2), item("C", 3)]);
        let next = c.with_reordered(2, 0).unwrap();

        assert_eq!(names(&next), vec!["C", "A", "B"]);
        assert_eq!(orders(&next), vec![1, 2, 3]);
        // pure: original untouched
        assert_eq!(names(&c), vec!["A", "B", "C"]);
    }

    #[test]
    fn reorder_densifies_sparse_orders() {
        let c = OrderedCollection::new(vec![item("A", 10), item("B", 10), item("C", 40), item("D", 7)]);
        let next = c.with_reordered(0, 3).unwrap();

        assert_eq!(names(&next), vec!["A", "B", "C", "D"]);
        assert_eq!(orders(&next), vec![1, 2, 3, 4]);
    }

    #[test]
    fn reorder_is_a_permutation_for_every_index_pair() {
        let c = OrderedCollection::new((0..5).map(|i| item("n", i * 3)).collect());
        let mut before: Vec<Uuid> = c.iter().map(|i| i.id).collect();
        before.sort();

        for from in 0..5 {
            for to in 0..5 {
                let next = c.with_reordered(from, to).unwrap();
                let mut after: Vec<Uuid> = next.iter().map(|i| i.id).collect();
                after.sort();
                assert_eq!(after, before);
                assert_eq!(orders(&next), vec![1, 2, 3, 4, 5]);
                assert_eq!(next.sorted()[to].id, c.sorted()[from].id);
            }
        }
    }

    #[test]
    fn reorder_rejects_out_of_range() {
        let c = OrderedCollection::new(vec![item("A", 1)]);
        assert_eq!(
            c.with_reordered(0, 1),
            Err(CollectionError::IndexOutOfRange { index: 1, len: 1 })
        );
    }

    #[test]
    fn upsert_replaces_or_appends() {
        let a = item("A", 1);
        let c = OrderedCollection::new(vec![a.clone()]);

        let renamed = c.with_upserted(Item { name: "A2", ..a.clone() });
        assert_eq!(renamed.len(), 1);
        assert_eq!(names(&renamed), vec!["A2"]);

        let grown = c.with_upserted(item("B", 2));
        assert_eq!(grown.len(), 2);
    }

    #[test]
    fn remove_excludes_only_matching_id() {
        let a = item("A", 1);
        let c = OrderedCollection::new(vec![a.clone(), item("B", 2)]);
        let next = c.with_removed(a.id);

        assert_eq!(names(&next), vec!["B"]);
        assert_eq!(c.with_removed(Uuid::new_v4()).len(), 2);
    }

    #[test]
    fn next_order_defaults_to_one() {
        assert_eq!(OrderedCollection::<Item>::default().next_display_order(), 1);
        let c = OrderedCollection::new(vec![item("A", 4), item("B", 2)]);
        assert_eq!(c.next_display_order(), 5);
    }

    #[test]
    fn next_order_saturates_at_max() {
        let c = OrderedCollection::new(vec![item("A", i32::MAX)]);
        assert_eq!(c.next_display_order(), i32::MAX);
    }

    #[test]
    fn restoring_orders_keeps_items_added_since() {
        let c = OrderedCollection::new(vec![item("A", 1), item("B", 1), item("C", 3)]);
        let moved = c.with_reordered(2, 0).unwrap();
        let grown = moved.with_upserted(item("D", moved.next_display_order()));

        let restored = grown.with_orders_restored(&c);
        assert_eq!(names(&restored), vec!["A", "B", "C", "D"]);
        assert_eq!(orders(&restored), vec![1, 1, 3, 4]);
    }

    #[test]
    fn restoring_orders_drops_items_removed_since() {
        let a = item("A", 1);
        let c = OrderedCollection::new(vec![a.clone(), item("B", 2)]);
        let shrunk = c.with_reordered(1, 0).unwrap().with_removed(a.id);

        let restored = shrunk.with_orders_restored(&c);
        assert_eq!(names(&restored), vec!["B"]);
        assert_eq!(orders(&restored), vec![2]);
    }

    #[test]
    fn changed_orders_lists_only_moved_items() {
        let c = OrderedCollection::new(vec![item("A", 1), item("B", 2), item("C", 3), item("D", 4)]);
        let next = c.with_reordered(2, 1).unwrap();
        let changed = next.changed_orders(&c);

        let c_id = c.sorted()[2].id;
        let b_id = c.sorted()[1].id;
        assert_eq!(changed, vec![(c_id, 2), (b_id, 3)]);
    }
}
