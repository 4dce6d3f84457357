use std::cmp::Ordering;
use std::fmt::{self, Debug};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::collection::{BidirectionalCollection, Collection, Iter, RandomAccessCollection};
use crate::error::NavigationError;
use crate::index::Index;
use crate::tuple::{Constituents, RandomAccessConstituents, Slot};

/// The largest number of constituents a combinator can hold.
pub const MAX_ARITY: usize = 9;

/// The cached constituent tuple of a [Storage].
pub type PartsOf<S> = <<S as Storage>::Constituents as Constituents>::Parts;

/// The memoizing backing record of a combinator: cached constituents plus the position
/// algebra over them.
///
/// Implementations memoize derived quantities lazily. [Storage::invalidate] must forget
/// all of them.
pub trait Storage: Clone {
    type Constituents: Constituents;
    type Position: Clone + Ord + Hash + Debug;
    type Element;

    /// Name used in `Debug` output.
    const NAME: &'static str;

    fn from_parts(parts: PartsOf<Self>) -> Self;
    fn parts(&self) -> &PartsOf<Self>;
    fn parts_mut(&mut self) -> &mut PartsOf<Self>;
    fn into_parts(self) -> PartsOf<Self>;

    fn invalidate(&mut self);

    fn len(&self) -> usize;
    fn first_position(&self) -> Option<&Self::Position>;
    fn last_position(&self) -> Option<&Self::Position>;

    /// The position following `position`, or `None` if it was the last one.
    fn position_after(&self, position: &Self::Position) -> Option<Self::Position>;

    fn linear_position(&self, position: &Self::Position) -> usize;

    /// The position at `linear`, which must be less than [Storage::len].
    fn position_for_linear(&self, linear: usize) -> Self::Position;

    fn element(&self, position: &Self::Position) -> Self::Element;
    fn is_subscriptable(&self, position: &Self::Position) -> bool;
}

pub trait BidirectionalStorage: Storage {
    /// The position preceding `position`, or `None` if it was the first one.
    fn position_before(&self, position: &Self::Position) -> Option<Self::Position>;
}

/// A read-only, value-semantic view combining several constituent collections.
///
/// Copies share one reference-counted [Storage]. Replacing a constituent with
/// [Combinator::set] or [Combinator::with] mutates the storage in place when this value
/// is its only owner, and clones it first otherwise, so copies never observe each
/// other's replacements.
pub struct Combinator<S: Storage> {
    storage: Rc<S>,
}

impl<S: Storage> Combinator<S> {
    pub fn new(constituents: S::Constituents) -> Self {
        Self::from_parts(constituents.into_parts())
    }

    fn from_parts(parts: PartsOf<S>) -> Self {
        Combinator {
            storage: Rc::new(S::from_parts(parts)),
        }
    }

    /// A copy of the constituent tuple.
    pub fn constituents(&self) -> S::Constituents {
        <S::Constituents as Constituents>::clone_from_parts(self.storage.parts())
    }

    /// Returns the constituent tuple, cloning it only if the storage is shared.
    pub fn into_constituents(self) -> S::Constituents {
        match Rc::try_unwrap(self.storage) {
            Ok(storage) => <S::Constituents as Constituents>::from_parts(storage.into_parts()),
            Err(shared) => <S::Constituents as Constituents>::clone_from_parts(shared.parts()),
        }
    }

    pub fn component<const K: usize>(&self) -> &<S::Constituents as Slot<K>>::Value
    where
        S::Constituents: Slot<K>,
    {
        <S::Constituents as Slot<K>>::slot(self.storage.parts()).base()
    }

    /// Replaces constituent `K`, returning the previous value.
    pub fn set<const K: usize>(
        &mut self,
        value: <S::Constituents as Slot<K>>::Value,
    ) -> <S::Constituents as Slot<K>>::Value
    where
        S::Constituents: Slot<K>,
    {
        let storage = self.storage_mut();
        let previous = <S::Constituents as Slot<K>>::slot_mut(storage.parts_mut()).set(value);
        storage.invalidate();
        previous
    }

    /// Returns this combinator with constituent `K` replaced.
    ///
    /// Consumes `self`, so the storage is reused when no other copy shares it.
    pub fn with<const K: usize>(mut self, value: <S::Constituents as Slot<K>>::Value) -> Self
    where
        S::Constituents: Slot<K>,
    {
        self.set::<K>(value);
        self
    }

    pub(crate) fn storage(&self) -> &S {
        &self.storage
    }

    fn storage_mut(&mut self) -> &mut S {
        if Rc::strong_count(&self.storage) > 1 {
            log::trace!("Cloning shared {} storage before replacement", S::NAME);
        }
        Rc::make_mut(&mut self.storage)
    }

    #[track_caller]
    fn check_subscriptable(&self, position: &S::Position) {
        if !self.storage.is_subscriptable(position) {
            panic!("{}", NavigationError::InvalidPosition(format!("{position:?}")));
        }
    }

    /// Whether `self` and `other` are backed by the same storage allocation.
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.storage, &other.storage)
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.first_position().is_none()
    }

    pub fn start_index(&self) -> Index<S::Position> {
        self.storage.first_position().cloned().into()
    }

    pub fn end_index(&self) -> Index<S::Position> {
        Index::End
    }

    /// Panics if `index` is [Index::End] or a position that is not subscriptable.
    pub fn index_after(&self, index: &Index<S::Position>) -> Index<S::Position> {
        match index {
            Index::Position(position) => {
                self.check_subscriptable(position);
                self.storage.position_after(position).into()
            }
            Index::End => panic!("{}", NavigationError::AdvancePastEnd),
        }
    }

    /// Returns the element at `index`.
    ///
    /// Panics if `index` is [Index::End] or a position that is not subscriptable.
    #[track_caller]
    pub fn get(&self, index: &Index<S::Position>) -> S::Element {
        match self.try_get(index) {
            Ok(element) => element,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_get(&self, index: &Index<S::Position>) -> Result<S::Element, NavigationError> {
        match index {
            Index::Position(position) if self.storage.is_subscriptable(position) => {
                Ok(self.storage.element(position))
            }
            Index::Position(position) => Err(NavigationError::InvalidPosition(format!(
                "{position:?}"
            ))),
            Index::End => Err(NavigationError::SubscriptEnd),
        }
    }

    /// The offset of `index` from the start index; [Index::End] maps to [Combinator::len].
    pub fn linear_position(&self, index: &Index<S::Position>) -> usize {
        match index {
            Index::Position(position) => self.storage.linear_position(position),
            Index::End => self.len(),
        }
    }

    /// The index `linear` steps after the start index.
    ///
    /// Panics if `linear` exceeds [Combinator::len].
    pub fn index_at_linear(&self, linear: usize) -> Index<S::Position> {
        let len = self.len();
        assert!(linear <= len, "linear position {linear} exceeds length {len}");
        if linear == len {
            Index::End
        } else {
            Index::Position(self.storage.position_for_linear(linear))
        }
    }

    /// Panics if the result would precede the start index or follow the end index.
    #[track_caller]
    pub fn index_offset_by(&self, index: &Index<S::Position>, offset: isize) -> Index<S::Position> {
        match self.try_index_offset_by(index, offset) {
            Ok(index) => index,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_index_offset_by(
        &self,
        index: &Index<S::Position>,
        offset: isize,
    ) -> Result<Index<S::Position>, NavigationError> {
        if offset == 0 {
            return Ok(index.clone());
        }
        let from = self.linear_position(index);
        let len = self.len();
        let out_of_bounds = NavigationError::OffsetOutOfBounds { from, offset, len };
        let target = from.checked_add_signed(offset).ok_or(out_of_bounds.clone())?;
        if target > len {
            return Err(out_of_bounds);
        }
        Ok(self.index_at_linear(target))
    }

    pub fn distance(&self, from: &Index<S::Position>, to: &Index<S::Position>) -> isize {
        let from = self.linear_position(from);
        let to = self.linear_position(to);
        let magnitude = isize::try_from(from.abs_diff(to)).expect("distance should fit in isize");
        if to >= from {
            magnitude
        } else {
            -magnitude
        }
    }

    pub fn iter(&self) -> Iter<'_, Self> {
        Iter::new(self)
    }
}

impl<S: BidirectionalStorage> Combinator<S> {
    /// Panics if `index` is the start index or a position that is not subscriptable.
    pub fn index_before(&self, index: &Index<S::Position>) -> Index<S::Position> {
        let previous = match index {
            Index::Position(position) => {
                self.check_subscriptable(position);
                self.storage.position_before(position)
            }
            Index::End => self.storage.last_position().cloned(),
        };
        match previous {
            Some(position) => Index::Position(position),
            None => panic!("{}", NavigationError::RetreatBeforeStart),
        }
    }
}

impl<S: Storage> Clone for Combinator<S> {
    fn clone(&self) -> Self {
        Combinator {
            storage: Rc::clone(&self.storage),
        }
    }
}

impl<S: Storage> Collection for Combinator<S> {
    type Element = S::Element;
    type Index = Index<S::Position>;

    fn start_index(&self) -> Self::Index {
        Combinator::start_index(self)
    }

    fn end_index(&self) -> Self::Index {
        Index::End
    }

    fn index_after(&self, index: &Self::Index) -> Self::Index {
        Combinator::index_after(self, index)
    }

    fn element(&self, index: &Self::Index) -> Self::Element {
        self.get(index)
    }

    fn len(&self) -> usize {
        Combinator::len(self)
    }

    fn is_empty(&self) -> bool {
        Combinator::is_empty(self)
    }

    fn index_offset_by(&self, index: &Self::Index, offset: isize) -> Self::Index {
        Combinator::index_offset_by(self, index, offset)
    }

    fn distance(&self, from: &Self::Index, to: &Self::Index) -> isize {
        Combinator::distance(self, from, to)
    }
}

impl<S: BidirectionalStorage> BidirectionalCollection for Combinator<S> {
    fn index_before(&self, index: &Self::Index) -> Self::Index {
        Combinator::index_before(self, index)
    }
}

impl<S> RandomAccessCollection for Combinator<S>
where
    S: BidirectionalStorage,
    S::Constituents: RandomAccessConstituents,
{
}

impl<'a, S: Storage> IntoIterator for &'a Combinator<S> {
    type Item = S::Element;
    type IntoIter = Iter<'a, Combinator<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<S> PartialEq for Combinator<S>
where
    S: Storage,
    PartsOf<S>: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        // Storage is never mutated while shared, so one allocation means one value.
        self.shares_storage_with(other) || self.storage.parts() == other.storage.parts()
    }
}

impl<S> Eq for Combinator<S>
where
    S: Storage,
    PartsOf<S>: Eq,
{
}

impl<S> PartialOrd for Combinator<S>
where
    S: Storage,
    PartsOf<S>: PartialOrd,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.shares_storage_with(other) {
            return Some(Ordering::Equal);
        }
        self.storage.parts().partial_cmp(other.storage.parts())
    }
}

impl<S> Ord for Combinator<S>
where
    S: Storage,
    PartsOf<S>: Ord,
{
    fn cmp(&self, other: &Self) -> Ordering {
        if self.shares_storage_with(other) {
            return Ordering::Equal;
        }
        self.storage.parts().cmp(other.storage.parts())
    }
}

impl<S> Hash for Combinator<S>
where
    S: Storage,
    PartsOf<S>: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.storage.parts().hash(state)
    }
}

impl<S> Debug for Combinator<S>
where
    S: Storage,
    PartsOf<S>: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(S::NAME).field(self.storage.parts()).finish()
    }
}

#[cfg(feature = "serde")]
impl<S> serde::Serialize for Combinator<S>
where
    S: Storage,
    PartsOf<S>: serde::Serialize,
{
    fn serialize<Ser: serde::Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        serde::Serialize::serialize(self.storage.parts(), serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, S> serde::Deserialize<'de> for Combinator<S>
where
    S: Storage,
    PartsOf<S>: serde::Deserialize<'de>,
{
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <PartsOf<S> as serde::Deserialize<'de>>::deserialize(deserializer).map(Self::from_parts)
    }
}
