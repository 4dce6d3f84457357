use once_cell::unsync::OnceCell;

use std::cmp::Ordering;
use std::fmt::{self, Debug};
use std::hash::{Hash, Hasher};

use crate::collection::{BidirectionalCollection, Collection};

/// Carry state threaded through odometer advancement, least-significant component first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvancementFlag {
    /// The previous component wrapped; this component should try to advance.
    Attempt,
    /// Some component advanced without wrapping; more-significant components stay put.
    Hold,
}

/// Borrow state threaded through odometer retreat, least-significant component first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetreatFlag {
    Attempt,
    Hold,
}

/// Wraps one constituent collection and memoizes its length and boundary indices.
///
/// Replacing the wrapped collection through [Cached::set] forgets everything memoized.
#[derive(Clone)]
pub struct Cached<C: Collection> {
    base: C,
    len: OnceCell<usize>,
    first: OnceCell<Option<C::Index>>,
    last: OnceCell<Option<C::Index>>,
}

impl<C: Collection> Cached<C> {
    pub fn new(base: C) -> Self {
        Cached {
            base,
            len: OnceCell::new(),
            first: OnceCell::new(),
            last: OnceCell::new(),
        }
    }

    pub fn base(&self) -> &C {
        &self.base
    }

    pub fn into_base(self) -> C {
        self.base
    }

    /// Replaces the wrapped collection, returning the old one.
    pub fn set(&mut self, base: C) -> C {
        self.len.take();
        self.first.take();
        self.last.take();
        std::mem::replace(&mut self.base, base)
    }

    pub fn len(&self) -> usize {
        *self.len.get_or_init(|| self.base.len())
    }

    pub fn is_empty(&self) -> bool {
        self.first().is_none()
    }

    /// The first subscriptable index, or `None` if the collection is empty.
    pub fn first(&self) -> Option<&C::Index> {
        self.first
            .get_or_init(|| {
                let start = self.base.start_index();
                if start == self.base.end_index() {
                    None
                } else {
                    Some(start)
                }
            })
            .as_ref()
    }

    /// The last subscriptable index, or `None` if the collection is empty.
    pub fn last(&self) -> Option<&C::Index> {
        self.last
            .get_or_init(|| {
                let first = self.first()?.clone();
                let offset = isize::try_from(self.len() - 1).expect("length should fit in isize");
                Some(self.base.index_offset_by(&first, offset))
            })
            .as_ref()
    }

    fn bounds(&self) -> (&C::Index, &C::Index) {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => panic!("wraparound navigation requires a non-empty collection"),
        }
    }

    /// Returns the index following `index`, wrapping around to the first index.
    ///
    /// Sets `flag` to [AdvancementFlag::Hold] when no wrap was needed. On wraparound the
    /// flag is left untouched so the carry propagates to the next component.
    pub fn next_subscriptable_index(
        &self,
        index: &C::Index,
        flag: &mut AdvancementFlag,
    ) -> C::Index {
        let (first, last) = self.bounds();
        if index == last {
            first.clone()
        } else {
            *flag = AdvancementFlag::Hold;
            self.base.index_after(index)
        }
    }

    /// The index following `index`, or `None` if `index` is the last one.
    pub fn subscriptable_index_after(&self, index: &C::Index) -> Option<C::Index> {
        if index == self.last()? {
            None
        } else {
            Some(self.base.index_after(index))
        }
    }

    /// Number of steps from the first subscriptable index to `index`.
    pub fn offset_of(&self, index: &C::Index) -> usize {
        let first = self
            .first()
            .expect("an empty collection has no subscriptable indices");
        usize::try_from(self.base.distance(first, index))
            .expect("index should not precede the first index")
    }

    /// The subscriptable index `offset` steps after the first one.
    pub fn index_at(&self, offset: usize) -> C::Index {
        assert!(
            offset < self.len(),
            "offset {offset} is outside a collection of length {}",
            self.len()
        );
        let first = self
            .first()
            .expect("a non-empty collection has a first index");
        let offset = isize::try_from(offset).expect("offset should fit in isize");
        self.base.index_offset_by(first, offset)
    }

    pub fn is_subscriptable(&self, index: &C::Index) -> bool {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => first <= index && index <= last,
            _ => false,
        }
    }

    pub fn element(&self, index: &C::Index) -> C::Element {
        self.base.element(index)
    }
}

impl<C: BidirectionalCollection> Cached<C> {
    /// Returns the index preceding `index`, wrapping around to the last index.
    ///
    /// Sets `flag` to [RetreatFlag::Hold] when no wrap was needed.
    pub fn previous_subscriptable_index(&self, index: &C::Index, flag: &mut RetreatFlag) -> C::Index {
        let (first, last) = self.bounds();
        if index == first {
            last.clone()
        } else {
            *flag = RetreatFlag::Hold;
            self.base.index_before(index)
        }
    }

    /// The index preceding `index`, or `None` if `index` is the first one.
    pub fn subscriptable_index_before(&self, index: &C::Index) -> Option<C::Index> {
        if index == self.first()? {
            None
        } else {
            Some(self.base.index_before(index))
        }
    }
}

impl<C: Collection + PartialEq> PartialEq for Cached<C> {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
    }
}

impl<C: Collection + Eq> Eq for Cached<C> {}

impl<C: Collection + PartialOrd> PartialOrd for Cached<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.base.partial_cmp(&other.base)
    }
}

impl<C: Collection + Ord> Ord for Cached<C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.base.cmp(&other.base)
    }
}

impl<C: Collection + Hash> Hash for Cached<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.base.hash(state)
    }
}

impl<C: Collection + Debug> Debug for Cached<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.base, f)
    }
}

#[cfg(feature = "serde")]
impl<C: Collection + serde::Serialize> serde::Serialize for Cached<C> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.base, serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, C: Collection + serde::Deserialize<'de>> serde::Deserialize<'de> for Cached<C> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        C::deserialize(deserializer).map(Cached::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_of_empty_collection() {
        let c = Cached::new(Vec::<u8>::new());
        assert_eq!(c.len(), 0);
        assert!(c.is_empty());
        assert_eq!(c.first(), None);
        assert_eq!(c.last(), None);
        assert!(!c.is_subscriptable(&0));
    }

    #[test]
    fn test_next_subscriptable_index_wraps_and_carries() {
        let c = Cached::new(10u32..13);
        let mut flag = AdvancementFlag::Attempt;
        assert_eq!(c.next_subscriptable_index(&10, &mut flag), 11);
        assert_eq!(flag, AdvancementFlag::Hold);

        let mut flag = AdvancementFlag::Attempt;
        assert_eq!(c.next_subscriptable_index(&12, &mut flag), 10);
        assert_eq!(flag, AdvancementFlag::Attempt);
    }

    #[test]
    fn test_previous_subscriptable_index_wraps_and_borrows() {
        let c = Cached::new(vec!['a', 'b', 'c']);
        let mut flag = RetreatFlag::Attempt;
        assert_eq!(c.previous_subscriptable_index(&2, &mut flag), 1);
        assert_eq!(flag, RetreatFlag::Hold);

        let mut flag = RetreatFlag::Attempt;
        assert_eq!(c.previous_subscriptable_index(&0, &mut flag), 2);
        assert_eq!(flag, RetreatFlag::Attempt);
    }

    #[test]
    fn test_non_wrapping_neighbours() {
        let c = Cached::new(vec![1, 2]);
        assert_eq!(c.subscriptable_index_after(&0), Some(1));
        assert_eq!(c.subscriptable_index_after(&1), None);
        assert_eq!(c.subscriptable_index_before(&1), Some(0));
        assert_eq!(c.subscriptable_index_before(&0), None);
    }

    #[test]
    fn test_set_forgets_memoized_fields() {
        let mut c = Cached::new(vec![1, 2, 3]);
        assert_eq!(c.len(), 3);
        assert_eq!(c.last(), Some(&2));
        let old = c.set(vec![7]);
        assert_eq!(old, vec![1, 2, 3]);
        assert_eq!(c.len(), 1);
        assert_eq!(c.first(), Some(&0));
        assert_eq!(c.last(), Some(&0));

        c.set(vec![]);
        assert!(c.is_empty());
        assert_eq!(c.last(), None);
    }

    #[test]
    fn test_offsets_round_trip() {
        let c = Cached::new(-3i64..4);
        for offset in 0..c.len() {
            assert_eq!(c.offset_of(&c.index_at(offset)), offset);
        }
    }

    #[test]
    #[should_panic(expected = "requires a non-empty collection")]
    fn test_wraparound_on_empty_panics() {
        let c = Cached::new(0u8..0);
        let mut flag = AdvancementFlag::Attempt;
        c.next_subscriptable_index(&0, &mut flag);
    }
}
