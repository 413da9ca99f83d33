//! A bidirectional association between macro-state labels and state ids,
//! used to intern macro states during determinization: a label is looked up
//! before a fresh id is spent on it.

use crate::math::Bijection;
use crate::StateId;

/// Bidirectional map between label values and state identifiers. Both
/// directions are injective; every operation is logarithmic.
#[derive(Debug, Clone)]
pub struct TagMap<T: Ord>(Bijection<T, StateId>);

impl<T: Ord + Clone> Default for TagMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> TagMap<T> {
    /// Creates an empty map.
    pub fn new() -> Self {
        TagMap(Bijection::new())
    }

    /// Number of associations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no association is stored.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Associates `tag` with `id`. Neither side may be present already.
    pub fn put(&mut self, tag: T, id: StateId) {
        assert!(
            !self.contains(&tag) && !self.contains_id(id),
            "tag map entries must be fresh on both sides"
        );
        self.0.insert(tag, id);
    }

    /// Looks up the id associated with `tag`.
    pub fn get(&self, tag: &T) -> Option<StateId> {
        self.0.get_by_left(tag).copied()
    }

    /// Looks up the label associated with `id`.
    pub fn tag_of(&self, id: StateId) -> Option<&T> {
        self.0.get_by_right(&id)
    }

    /// Whether `tag` is associated with some id.
    pub fn contains(&self, tag: &T) -> bool {
        self.0.contains_left(tag)
    }

    /// Whether `id` carries a label.
    pub fn contains_id(&self, id: StateId) -> bool {
        self.0.contains_right(&id)
    }

    /// Removes the association of `id`, returning its label.
    pub fn remove_id(&mut self, id: StateId) -> Option<T> {
        self.0.remove_by_right(&id).map(|(tag, _)| tag)
    }

    /// Returns the id of `tag` if it is known, otherwise binds `tag` to
    /// `fresh` and returns that.
    pub fn put_or_get(&mut self, tag: T, fresh: StateId) -> StateId {
        if let Some(id) = self.get(&tag) {
            return id;
        }
        self.put(tag, fresh);
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_directions() {
        let mut map = TagMap::new();
        map.put("x".to_string(), 0);
        map.put("y".to_string(), 3);

        assert_eq!(map.get(&"x".to_string()), Some(0));
        assert_eq!(map.get(&"y".to_string()), Some(3));
        assert_eq!(map.tag_of(3).map(String::as_str), Some("y"));
        assert!(map.contains(&"x".to_string()));
        assert!(map.contains_id(0));
        assert!(!map.contains_id(1));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn put_or_get_interns() {
        let mut map = TagMap::new();
        assert_eq!(map.put_or_get("a".to_string(), 0), 0);
        assert_eq!(map.put_or_get("b".to_string(), 1), 1);
        // the label is known, the fresh id must not be spent
        assert_eq!(map.put_or_get("a".to_string(), 2), 0);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn erase_by_id() {
        let mut map = TagMap::new();
        map.put(7u32, 1);
        assert_eq!(map.remove_id(1), Some(7));
        assert!(!map.contains(&7));
        assert_eq!(map.remove_id(1), None);
    }

    #[test]
    #[should_panic]
    fn double_put_rejected() {
        let mut map = TagMap::new();
        map.put(1u32, 0);
        map.put(1u32, 1);
    }
}
