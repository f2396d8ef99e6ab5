use std::sync::{Arc, Mutex};

use crate::data::Set;

/// Type-erased view of a [`SetContainer`].
///
/// The engine and drivers fill result rows through this trait without knowing
/// the concrete record type.
pub trait SetContainerPar {
    /// Append a default-constructed record and return it for in-place population.
    fn append(&mut self) -> &mut dyn Set;

    /// Discard the most recently appended record, e.g. a row that failed to
    /// convert halfway through. Returns `false` when the container is empty.
    fn remove_last(&mut self) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result container shared between a caller and a worker thread.
pub type SharedContainer = Arc<Mutex<dyn SetContainerPar + Send>>;

/// Ordered, append-only collection of result records.
///
/// Records come back in insertion order through [`iter`](SetContainer::iter) and
/// [`iter_mut`](SetContainer::iter_mut), both of which run in either direction.
/// There is no positional lookup; copy the records out with
/// [`into_records`](SetContainer::into_records) when random access is needed.
#[derive(Debug, Clone, PartialEq)]
pub struct SetContainer<T> {
    data: Vec<T>,
}

impl<T> Default for SetContainer<T> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

impl<T> SetContainer<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Wrap in the shared handle expected by [`QueryArgs`](crate::statement::QueryArgs).
    #[must_use]
    pub fn shared(self) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(self))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.data.first()
    }

    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.data.last()
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.data.first_mut()
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.data.last_mut()
    }

    #[must_use]
    pub fn into_records(self) -> Vec<T> {
        self.data
    }
}

impl<T: Default> SetContainer<T> {
    /// Typed counterpart of [`SetContainerPar::append`].
    pub fn new_record(&mut self) -> &mut T {
        self.data.push(T::default());
        let last = self.data.len() - 1;
        &mut self.data[last]
    }
}

impl<T: Set + Default> SetContainerPar for SetContainer<T> {
    fn append(&mut self) -> &mut dyn Set {
        self.new_record()
    }

    fn remove_last(&mut self) -> bool {
        self.data.pop().is_some()
    }

    fn len(&self) -> usize {
        SetContainer::len(self)
    }
}

impl<'a, T> IntoIterator for &'a SetContainer<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut SetContainer<T> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T> IntoIterator for SetContainer<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FieldMut, IntN};
    use crate::types::Text;

    #[derive(Debug, Default, PartialEq)]
    struct Row {
        id: IntN,
        name: Text,
    }

    crate::sql_set!(Row { id: IntN, name: Text });

    fn fill(container: &mut dyn SetContainerPar, id: i32, name: &str) {
        let record = container.append();
        if let Some(FieldMut::IntN(n)) = record.field_mut(0) {
            n.set(id);
        }
        if let Some(FieldMut::Text(t)) = record.field_mut(1) {
            *t = name.to_string();
        }
    }

    #[test]
    fn append_through_erased_view_keeps_order() {
        let mut rows = SetContainer::<Row>::new();
        fill(&mut rows, 1, "a");
        fill(&mut rows, 2, "b");
        fill(&mut rows, 3, "c");
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        let backwards: Vec<_> = rows.iter().rev().map(|r| r.id.get().copied()).collect();
        assert_eq!(backwards, [Some(3), Some(2), Some(1)]);
    }

    #[test]
    fn append_then_remove_last_restores_size() {
        let mut rows = SetContainer::<Row>::new();
        fill(&mut rows, 1, "kept");
        let before = SetContainerPar::len(&rows);
        rows.append();
        assert_eq!(SetContainerPar::len(&rows), before + 1);
        assert!(rows.remove_last());
        assert_eq!(SetContainerPar::len(&rows), before);
        assert_eq!(rows.back().map(|r| r.name.as_str()), Some("kept"));
    }

    #[test]
    fn remove_last_on_empty_is_refused() {
        let mut rows = SetContainer::<Row>::new();
        assert!(!rows.remove_last());
        assert!(SetContainerPar::is_empty(&rows));
        assert!(rows.front().is_none());
    }

    #[test]
    fn new_records_are_default() {
        let mut rows = SetContainer::<Row>::new();
        let row = rows.new_record();
        assert!(row.id.is_null());
        for row in &mut rows {
            row.name.push_str("x");
        }
        assert_eq!(rows.into_records(), vec![Row { id: IntN::null(), name: "x".into() }]);
    }
}
