use auto_impl::auto_impl;
use num_traits::PrimInt;

use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;
use std::iter::FusedIterator;
use std::ops::Range;

/// A finite, multi-pass sequence addressed by ordered indices.
///
/// Indices must be ordered consistently with traversal: `index_after(i) > i` for every
/// subscriptable `i`, and `end_index()` is greater than every subscriptable index.
#[auto_impl(&, Box, Rc)]
pub trait Collection {
    type Element;
    type Index: Clone + Ord + Hash + Debug;

    fn start_index(&self) -> Self::Index;

    /// The past-the-end index. Never subscriptable.
    fn end_index(&self) -> Self::Index;

    fn index_after(&self, index: &Self::Index) -> Self::Index;

    /// Returns the element at `index`.
    ///
    /// Panics if `index` is not subscriptable.
    fn element(&self, index: &Self::Index) -> Self::Element;

    fn len(&self) -> usize {
        let distance = self.distance(&self.start_index(), &self.end_index());
        usize::try_from(distance).expect("end index should not precede start index")
    }

    fn is_empty(&self) -> bool {
        self.start_index() == self.end_index()
    }

    /// Returns the index `offset` steps from `index`.
    ///
    /// The default implementation walks forward one step at a time and panics on negative
    /// offsets. Collections with cheaper navigation should override it.
    fn index_offset_by(&self, index: &Self::Index, offset: isize) -> Self::Index {
        assert!(
            offset >= 0,
            "forward-only collection cannot step backwards by {}",
            -offset
        );
        let end = self.end_index();
        let mut index = index.clone();
        for _ in 0..offset {
            assert!(index != end, "offset steps past the end index");
            index = self.index_after(&index);
        }
        index
    }

    /// The signed number of steps from `from` to `to`.
    fn distance(&self, from: &Self::Index, to: &Self::Index) -> isize {
        let (mut cursor, upper, sign) = if from <= to {
            (from.clone(), to, 1)
        } else {
            (to.clone(), from, -1)
        };
        let mut steps = 0isize;
        while &cursor != upper {
            cursor = self.index_after(&cursor);
            steps += 1;
        }
        sign * steps
    }
}

pub trait BidirectionalCollection: Collection {
    fn index_before(&self, index: &Self::Index) -> Self::Index;
}

impl<T: BidirectionalCollection + ?Sized> BidirectionalCollection for &T {
    fn index_before(&self, index: &Self::Index) -> Self::Index {
        T::index_before(self, index)
    }
}

impl<T: BidirectionalCollection + ?Sized> BidirectionalCollection for Box<T> {
    fn index_before(&self, index: &Self::Index) -> Self::Index {
        T::index_before(self, index)
    }
}

impl<T: BidirectionalCollection + ?Sized> BidirectionalCollection for std::rc::Rc<T> {
    fn index_before(&self, index: &Self::Index) -> Self::Index {
        T::index_before(self, index)
    }
}

/// Marker for collections whose `index_offset_by` and `distance` are O(1).
#[auto_impl(&, Box, Rc)]
pub trait RandomAccessCollection: BidirectionalCollection {}

pub trait CollectionExt: Collection {
    /// Iterates over the elements of the collection in index order.
    fn elements(&self) -> Iter<'_, Self> {
        Iter::new(self)
    }

    /// A lazy view applying `f` to each element on access.
    fn map_elements<F, U>(self, f: F) -> Mapped<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Element) -> U,
    {
        Mapped { base: self, f }
    }
}

impl<C: Collection + ?Sized> CollectionExt for C {}

/// Borrowing iterator over any [Collection].
pub struct Iter<'a, C: Collection + ?Sized> {
    collection: &'a C,
    front: C::Index,
    back: C::Index,
}

impl<'a, C: Collection + ?Sized> Iter<'a, C> {
    pub fn new(collection: &'a C) -> Self {
        Iter {
            front: collection.start_index(),
            back: collection.end_index(),
            collection,
        }
    }
}

impl<C: Collection + ?Sized> Clone for Iter<'_, C> {
    fn clone(&self) -> Self {
        Iter {
            collection: self.collection,
            front: self.front.clone(),
            back: self.back.clone(),
        }
    }
}

impl<C: Collection + ?Sized> Iterator for Iter<'_, C> {
    type Item = C::Element;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let element = self.collection.element(&self.front);
        self.front = self.collection.index_after(&self.front);
        Some(element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.collection.distance(&self.front, &self.back))
            .expect("iterator front should not pass its back");
        (remaining, Some(remaining))
    }
}

impl<C: BidirectionalCollection + ?Sized> DoubleEndedIterator for Iter<'_, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back = self.collection.index_before(&self.back);
        Some(self.collection.element(&self.back))
    }
}

impl<C: Collection + ?Sized> ExactSizeIterator for Iter<'_, C> {}

impl<C: Collection + ?Sized> FusedIterator for Iter<'_, C> {}

/// A [Collection] whose elements are computed by applying a function to another
/// collection's elements. Built by [CollectionExt::map_elements].
#[derive(Clone)]
pub struct Mapped<C, F> {
    base: C,
    f: F,
}

impl<C: Debug, F> Debug for Mapped<C, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapped").field("base", &self.base).finish()
    }
}

impl<C, F, U> Collection for Mapped<C, F>
where
    C: Collection,
    F: Fn(C::Element) -> U,
{
    type Element = U;
    type Index = C::Index;

    fn start_index(&self) -> Self::Index {
        self.base.start_index()
    }

    fn end_index(&self) -> Self::Index {
        self.base.end_index()
    }

    fn index_after(&self, index: &Self::Index) -> Self::Index {
        self.base.index_after(index)
    }

    fn element(&self, index: &Self::Index) -> U {
        (self.f)(self.base.element(index))
    }

    fn len(&self) -> usize {
        self.base.len()
    }

    fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    fn index_offset_by(&self, index: &Self::Index, offset: isize) -> Self::Index {
        self.base.index_offset_by(index, offset)
    }

    fn distance(&self, from: &Self::Index, to: &Self::Index) -> isize {
        self.base.distance(from, to)
    }
}

impl<C, F, U> BidirectionalCollection for Mapped<C, F>
where
    C: BidirectionalCollection,
    F: Fn(C::Element) -> U,
{
    fn index_before(&self, index: &Self::Index) -> Self::Index {
        self.base.index_before(index)
    }
}

impl<C, F, U> RandomAccessCollection for Mapped<C, F>
where
    C: RandomAccessCollection,
    F: Fn(C::Element) -> U,
{
}

fn offset_usize(index: usize, offset: isize, len: usize) -> usize {
    let Some(result) = index.checked_add_signed(offset) else {
        panic!("offset {offset} from index {index} precedes the start index");
    };
    assert!(
        result <= len,
        "offset {offset} from index {index} passes the end index {len}"
    );
    result
}

fn signed_distance(from: usize, to: usize) -> isize {
    let magnitude = isize::try_from(from.abs_diff(to)).expect("distance should fit in isize");
    if to >= from {
        magnitude
    } else {
        -magnitude
    }
}

impl<T: Clone> Collection for [T] {
    type Element = T;
    type Index = usize;

    fn start_index(&self) -> usize {
        0
    }

    fn end_index(&self) -> usize {
        <[T]>::len(self)
    }

    fn index_after(&self, index: &usize) -> usize {
        assert!(*index < <[T]>::len(self), "cannot advance past the end index");
        index + 1
    }

    fn element(&self, index: &usize) -> T {
        self[*index].clone()
    }

    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn is_empty(&self) -> bool {
        <[T]>::is_empty(self)
    }

    fn index_offset_by(&self, index: &usize, offset: isize) -> usize {
        offset_usize(*index, offset, <[T]>::len(self))
    }

    fn distance(&self, from: &usize, to: &usize) -> isize {
        signed_distance(*from, *to)
    }
}

impl<T: Clone> BidirectionalCollection for [T] {
    fn index_before(&self, index: &usize) -> usize {
        assert!(*index > 0, "cannot retreat before the start index");
        index - 1
    }
}

impl<T: Clone> RandomAccessCollection for [T] {}

impl<T: Clone> Collection for Vec<T> {
    type Element = T;
    type Index = usize;

    fn start_index(&self) -> usize {
        0
    }

    fn end_index(&self) -> usize {
        self.as_slice().end_index()
    }

    fn index_after(&self, index: &usize) -> usize {
        self.as_slice().index_after(index)
    }

    fn element(&self, index: &usize) -> T {
        self[*index].clone()
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }

    fn index_offset_by(&self, index: &usize, offset: isize) -> usize {
        offset_usize(*index, offset, Vec::len(self))
    }

    fn distance(&self, from: &usize, to: &usize) -> isize {
        signed_distance(*from, *to)
    }
}

impl<T: Clone> BidirectionalCollection for Vec<T> {
    fn index_before(&self, index: &usize) -> usize {
        self.as_slice().index_before(index)
    }
}

impl<T: Clone> RandomAccessCollection for Vec<T> {}

impl<T: Clone> Collection for VecDeque<T> {
    type Element = T;
    type Index = usize;

    fn start_index(&self) -> usize {
        0
    }

    fn end_index(&self) -> usize {
        VecDeque::len(self)
    }

    fn index_after(&self, index: &usize) -> usize {
        assert!(*index < VecDeque::len(self), "cannot advance past the end index");
        index + 1
    }

    fn element(&self, index: &usize) -> T {
        self[*index].clone()
    }

    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn is_empty(&self) -> bool {
        VecDeque::is_empty(self)
    }

    fn index_offset_by(&self, index: &usize, offset: isize) -> usize {
        offset_usize(*index, offset, VecDeque::len(self))
    }

    fn distance(&self, from: &usize, to: &usize) -> isize {
        signed_distance(*from, *to)
    }
}

impl<T: Clone> BidirectionalCollection for VecDeque<T> {
    fn index_before(&self, index: &usize) -> usize {
        assert!(*index > 0, "cannot retreat before the start index");
        index - 1
    }
}

impl<T: Clone> RandomAccessCollection for VecDeque<T> {}

/// Integer ranges are lazy collections whose indices are their own elements.
impl<T> Collection for Range<T>
where
    T: PrimInt + Hash + Debug,
{
    type Element = T;
    type Index = T;

    fn start_index(&self) -> T {
        self.start
    }

    fn end_index(&self) -> T {
        // Reversed ranges are empty.
        self.end.max(self.start)
    }

    fn index_after(&self, index: &T) -> T {
        assert!(*index < self.end, "cannot advance past the end index");
        *index + T::one()
    }

    fn element(&self, index: &T) -> T {
        assert!(
            self.start <= *index && *index < self.end,
            "index {index:?} is outside {self:?}"
        );
        *index
    }

    fn len(&self) -> usize {
        usize::try_from(self.distance(&self.start_index(), &self.end_index()))
            .expect("range length should fit in usize")
    }

    fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    fn index_offset_by(&self, index: &T, offset: isize) -> T {
        let base = index.to_i128().expect("range index should fit in i128");
        let moved = base + offset as i128;
        let result = num_traits::cast::<i128, T>(moved)
            .unwrap_or_else(|| panic!("offset {offset} from {index:?} overflows the index type"));
        assert!(
            self.start_index() <= result && result <= self.end_index(),
            "offset {offset} from {index:?} leaves {self:?}"
        );
        result
    }

    fn distance(&self, from: &T, to: &T) -> isize {
        let from = from.to_i128().expect("range index should fit in i128");
        let to = to.to_i128().expect("range index should fit in i128");
        isize::try_from(to - from).expect("distance should fit in isize")
    }
}

impl<T> BidirectionalCollection for Range<T>
where
    T: PrimInt + Hash + Debug,
{
    fn index_before(&self, index: &T) -> T {
        assert!(*index > self.start, "cannot retreat before the start index");
        *index - T::one()
    }
}

impl<T> RandomAccessCollection for Range<T> where T: PrimInt + Hash + Debug {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_vec_navigation() {
        let v = vec!['a', 'b', 'c'];
        assert_eq!(Collection::len(&v), 3);
        assert_eq!(v.index_offset_by(&0, 2), 2);
        assert_eq!(v.index_offset_by(&3, -3), 0);
        assert_eq!(v.distance(&2, &0), -2);
        assert_eq!(v.element(&1), 'b');
    }

    #[test]
    fn test_reversed_range_is_empty() {
        #[allow(clippy::reversed_empty_ranges)]
        let r = 5i32..2;
        assert!(Collection::is_empty(&r));
        assert_eq!(Collection::len(&r), 0);
        assert_eq!(r.start_index(), r.end_index());
    }

    #[test]
    fn test_unsigned_range_steps_backwards() {
        let r = 3u8..9;
        assert_eq!(r.index_offset_by(&8, -5), 3);
        assert_eq!(r.distance(&8, &3), -5);
    }

    #[test]
    #[should_panic(expected = "passes the end index")]
    fn test_vec_offset_past_end_panics() {
        let v = vec![1, 2];
        v.index_offset_by(&1, 2);
    }

    #[test]
    #[should_panic(expected = "cannot step backwards")]
    fn test_default_offset_is_forward_only() {
        struct Countdown(u8);

        impl Collection for Countdown {
            type Element = u8;
            type Index = u8;

            fn start_index(&self) -> u8 {
                0
            }

            fn end_index(&self) -> u8 {
                self.0
            }

            fn index_after(&self, index: &u8) -> u8 {
                index + 1
            }

            fn element(&self, index: &u8) -> u8 {
                self.0 - index
            }
        }

        let c = Countdown(4);
        assert_eq!(c.len(), 4);
        assert_eq!(c.distance(&3, &1), -2);
        assert_eq!(c.elements().collect::<Vec<_>>(), vec![4, 3, 2, 1]);
        c.index_offset_by(&2, -1);
    }

    #[test]
    fn test_mapped_is_lazy_view() {
        let squares = (0u32..5).map_elements(|x| x * x);
        assert_eq!(squares.elements().collect::<Vec<_>>(), vec![0, 1, 4, 9, 16]);
        assert_eq!(squares.elements().rev().next(), Some(16));
        assert_eq!(squares.elements().len(), 5);
    }

    #[test]
    fn test_borrowed_slices_are_collections() {
        let owned = vec![String::from("x"), String::from("y")];
        let borrowed: &[String] = &owned;
        assert_eq!(
            Collection::element(&borrowed, &1),
            String::from("y")
        );
        assert_eq!(borrowed.elements().collect::<Vec<_>>(), owned);
    }

    proptest! {
        #[test]
        fn test_range_offset_matches_distance(
            start in -20i64..20, len in 0i64..20, a in 0i64..20, b in 0i64..20
        ) {
            let r = start..start + len;
            let (a, b) = (start + a.min(len), start + b.min(len));
            let d = r.distance(&a, &b);
            prop_assert_eq!(r.index_offset_by(&a, d), b);
        }
    }
}
