use std::fmt::{self, Debug};
use std::hash::Hash;

use hashbrown::hash_map::Entry;
use log::trace;

use crate::util::{HashMap, IndexSet};
use crate::ValueNumber;

/// A bidirectional store associating entities with [`ValueNumber`]s.
///
/// The forward direction is a functional relation: each entity maps to at
/// most one number. The reverse direction is a multimap: the entities
/// sharing one number form its congruence class, queried with
/// [`congruence`](VnTable::congruence).
///
/// `VnTable` attaches no meaning to the numbers it stores; the numbering
/// policy lives in [`ValueNumbering`](crate::ValueNumbering). The entity
/// type `T` is any cheap handle (an arena id, an index, a raw key) whose
/// referent the caller keeps alive for the duration of any query.
///
/// There is no internal locking. Shared references may be read from many
/// threads at once; the borrow checker rules out concurrent mutation within
/// safe code.
#[derive(Clone)]
pub struct VnTable<T> {
    forward: HashMap<T, ValueNumber>,
    classes: HashMap<ValueNumber, IndexSet<T>>,
}

impl<T> Default for VnTable<T> {
    fn default() -> Self {
        VnTable {
            forward: HashMap::default(),
            classes: HashMap::default(),
        }
    }
}

impl<T: Debug> Debug for VnTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VnTable")
            .field("forward", &self.forward)
            .field("classes", &self.classes)
            .finish()
    }
}

impl<T: Copy + Eq + Hash> VnTable<T> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value number currently associated with `key`, if any.
    pub fn value(&self, key: T) -> Option<ValueNumber> {
        self.forward.get(&key).copied()
    }

    /// Iterates over the congruence class of `vn`: every entity currently
    /// mapped to that number.
    ///
    /// This is a live view over the table, not a snapshot; the order is
    /// unspecified but stable as long as the table is not mutated. An
    /// unknown `vn` yields an empty iterator, not an error.
    pub fn congruence(&self, vn: ValueNumber) -> Congruents<'_, T> {
        Congruents {
            inner: self.classes.get(&vn).map(|members| members.iter()),
        }
    }

    /// Associates `key` with `vn`, replacing any previous association.
    ///
    /// If `key` was already mapped to a different number, it is removed from
    /// that number's congruence class and added to `vn`'s in one step. A
    /// repeat insertion of an already-present pair is a no-op.
    pub fn insert_or_replace(&mut self, key: T, vn: ValueNumber) {
        match self.forward.entry(key) {
            Entry::Occupied(mut entry) => {
                let old = entry.insert(vn);
                if old == vn {
                    return;
                }
                trace!("Moving entity from vn {} to vn {}", old, vn);
                let members = self
                    .classes
                    .get_mut(&old)
                    .unwrap_or_else(|| panic!("entity mapped to {} but class is missing", old));
                members.swap_remove(&key);
                if members.is_empty() {
                    self.classes.remove(&old);
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(vn);
            }
        }
        self.classes.entry(vn).or_default().insert(key);
    }

    /// Drops every association. `value` returns `None` for all previously
    /// known entities afterwards.
    pub fn clear(&mut self) {
        self.forward.clear();
        self.classes.clear();
    }

    /// Returns the number of entities with an association.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Returns `true` if the table holds no associations.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Iterates over the distinct value numbers that have at least one
    /// member, in unspecified order.
    pub fn value_numbers(&self) -> impl ExactSizeIterator<Item = ValueNumber> + '_ {
        self.classes.keys().copied()
    }
}

/// Iterator over the members of one congruence class.
///
/// Returned by [`VnTable::congruence`].
pub struct Congruents<'a, T> {
    inner: Option<indexmap::set::Iter<'a, T>>,
}

impl<'a, T: Copy> Iterator for Congruents<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.inner.as_mut()?.next().copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            Some(iter) => iter.size_hint(),
            None => (0, Some(0)),
        }
    }
}

impl<'a, T: Copy> ExactSizeIterator for Congruents<'a, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn vn(n: u64) -> ValueNumber {
        ValueNumber::from(n)
    }

    fn class(table: &VnTable<u32>, n: u64) -> Vec<u32> {
        let mut members: Vec<u32> = table.congruence(vn(n)).collect();
        members.sort();
        members
    }

    #[test]
    fn lookup_both_directions() {
        let mut table = VnTable::default();
        table.insert_or_replace(1u32, vn(10));
        table.insert_or_replace(2, vn(10));
        table.insert_or_replace(3, vn(20));

        assert_eq!(table.value(1), Some(vn(10)));
        assert_eq!(table.value(3), Some(vn(20)));
        assert_eq!(table.value(4), None);

        assert_eq!(class(&table, 10), vec![1, 2]);
        assert_eq!(class(&table, 20), vec![3]);
        assert_eq!(class(&table, 99), Vec::<u32>::new());
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn replace_moves_between_classes() {
        let mut table = VnTable::default();
        table.insert_or_replace(1u32, vn(10));
        table.insert_or_replace(2, vn(10));

        table.insert_or_replace(1, vn(20));
        assert_eq!(table.value(1), Some(vn(20)));
        assert_eq!(class(&table, 10), vec![2]);
        assert_eq!(class(&table, 20), vec![1]);

        // the functional relation never grows on replace
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn repeat_insert_is_noop() {
        let mut table = VnTable::default();
        table.insert_or_replace(7u32, vn(3));
        table.insert_or_replace(7, vn(3));
        assert_eq!(table.len(), 1);
        assert_eq!(class(&table, 3), vec![7]);
    }

    #[test]
    fn emptied_class_disappears() {
        let mut table = VnTable::default();
        table.insert_or_replace(1u32, vn(10));
        table.insert_or_replace(1, vn(20));
        assert_eq!(table.value_numbers().count(), 1);
        assert_eq!(table.congruence(vn(10)).len(), 0);
    }

    #[test]
    fn clear_forgets_everything() {
        let mut table = VnTable::default();
        for i in 0..100u32 {
            table.insert_or_replace(i, vn(u64::from(i % 7)));
        }
        table.clear();
        assert!(table.is_empty());
        for i in 0..100u32 {
            assert_eq!(table.value(i), None);
        }
        assert_eq!(table.congruence(vn(0)).len(), 0);
    }

    #[test]
    fn congruence_matches_lookup() {
        let mut table = VnTable::default();
        for i in 0..50u32 {
            table.insert_or_replace(i, vn(u64::from(i % 5)));
        }
        for n in table.value_numbers().collect::<Vec<_>>() {
            for e in table.congruence(n) {
                assert_eq!(table.value(e), Some(n));
            }
        }
        for i in 0..50u32 {
            let n = table.value(i).unwrap();
            assert!(table.congruence(n).any(|e| e == i));
        }
    }
}
