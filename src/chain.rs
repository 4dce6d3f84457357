use std::ops::Range;

use once_cell::unsync::OnceCell;
use smallvec::SmallVec;

use crate::storage::{BidirectionalStorage, Combinator, PartsOf, Storage, MAX_ARITY};
use crate::tuple::{BidirectionalChainConstituents, ChainConstituents};

/// The concatenation of a tuple of collections sharing one element type.
///
/// ```
/// # use conjoin::Chain;
/// let c = Chain::new((vec![1, 2], vec![3, 4, 5]));
/// assert_eq!(c.len(), 5);
/// assert_eq!(c.get(&c.index_offset_by(&c.start_index(), 3)), 4);
/// ```
pub type Chain<C> = Combinator<ChainStorage<C>>;

#[derive(Clone)]
pub struct ChainStorage<C: ChainConstituents> {
    parts: C::Parts,
    ranges: SmallVec<[OnceCell<Range<usize>>; MAX_ARITY]>,
    first: OnceCell<Option<C::Position>>,
    last: OnceCell<Option<C::Position>>,
}

impl<C: ChainConstituents> ChainStorage<C> {
    /// The linear positions occupied by `component`. Empty constituents get an empty
    /// range at the offset where they would start.
    pub fn range_for(&self, component: usize) -> Range<usize> {
        self.ranges[component]
            .get_or_init(|| {
                let start = match component {
                    0 => 0,
                    _ => self.range_for(component - 1).end,
                };
                log::trace!("Computing chain range for component {}", component);
                let end = start
                    .checked_add(C::count_of(&self.parts, component))
                    .expect("chain length should fit in usize");
                start..end
            })
            .clone()
    }
}

impl<C: ChainConstituents> Storage for ChainStorage<C> {
    type Constituents = C;
    type Position = C::Position;
    type Element = C::Element;

    const NAME: &'static str = "Chain";

    fn from_parts(parts: PartsOf<Self>) -> Self {
        ChainStorage {
            parts,
            ranges: (0..C::ARITY).map(|_| OnceCell::new()).collect(),
            first: OnceCell::new(),
            last: OnceCell::new(),
        }
    }

    fn parts(&self) -> &PartsOf<Self> {
        &self.parts
    }

    fn parts_mut(&mut self) -> &mut PartsOf<Self> {
        &mut self.parts
    }

    fn into_parts(self) -> PartsOf<Self> {
        self.parts
    }

    fn invalidate(&mut self) {
        for range in &mut self.ranges {
            range.take();
        }
        self.first.take();
        self.last.take();
    }

    fn len(&self) -> usize {
        self.range_for(C::ARITY - 1).end
    }

    fn first_position(&self) -> Option<&C::Position> {
        self.first
            .get_or_init(|| (0..C::ARITY).find_map(|k| C::first_in(&self.parts, k)))
            .as_ref()
    }

    fn last_position(&self) -> Option<&C::Position> {
        self.last
            .get_or_init(|| (0..C::ARITY).rev().find_map(|k| C::last_in(&self.parts, k)))
            .as_ref()
    }

    /// Steps within the tagged constituent, then on to the first index of the next
    /// non-empty one.
    fn position_after(&self, position: &C::Position) -> Option<C::Position> {
        C::after_within(&self.parts, position).or_else(|| {
            let component = C::component_of(position);
            (component + 1..C::ARITY).find_map(|k| C::first_in(&self.parts, k))
        })
    }

    fn linear_position(&self, position: &C::Position) -> usize {
        let component = C::component_of(position);
        self.range_for(component).start + C::offset_within(&self.parts, position)
    }

    fn position_for_linear(&self, linear: usize) -> C::Position {
        debug_assert!(linear < self.len());
        let mut component = 0;
        while linear >= self.range_for(component).end {
            component += 1;
        }
        let offset = linear - self.range_for(component).start;
        C::position_at(&self.parts, component, offset)
    }

    fn element(&self, position: &C::Position) -> C::Element {
        C::element(&self.parts, position)
    }

    fn is_subscriptable(&self, position: &C::Position) -> bool {
        C::is_subscriptable(&self.parts, position)
    }
}

impl<C: BidirectionalChainConstituents> BidirectionalStorage for ChainStorage<C> {
    fn position_before(&self, position: &C::Position) -> Option<C::Position> {
        C::before_within(&self.parts, position).or_else(|| {
            let component = C::component_of(position);
            (0..component)
                .rev()
                .find_map(|k| C::last_in(&self.parts, k))
        })
    }
}

impl<C: ChainConstituents> Chain<C> {
    /// See [ChainStorage::range_for].
    pub fn range_for(&self, component: usize) -> Range<usize> {
        assert!(component < C::ARITY, "component {component} is out of range");
        self.storage().range_for(component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{ChainPosition, Index};
    use crate::product::Product;
    use proptest::prelude::*;
    use proptest_derive::Arbitrary;
    use std::collections::VecDeque;

    #[test]
    fn test_chain_of_two_vecs() {
        let c = Chain::new((vec![1, 2], vec![3, 4, 5]));
        assert_eq!(c.len(), 5);
        let idx = c.index_offset_by(&c.start_index(), 3);
        assert_eq!(idx, Index::Position(ChainPosition::C1(1)));
        assert_eq!(c.get(&idx), 4);
        assert_eq!(c.iter().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert_eq!(c.range_for(0), 0..2);
        assert_eq!(c.range_for(1), 2..5);
    }

    #[test]
    fn test_empty_constituents_are_skipped() {
        let c = Chain::new((
            Vec::<u8>::new(),
            vec![1u8],
            0u8..0,
            VecDeque::from(vec![2u8, 3]),
        ));
        assert_eq!(c.len(), 3);
        assert_eq!(c.start_index(), Index::Position(ChainPosition::C1(0)));
        assert_eq!(c.iter().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(c.iter().rev().collect::<Vec<_>>(), vec![3, 2, 1]);
        assert_eq!(c.range_for(2), 1..1);
        assert_eq!(c.index_at_linear(1), Index::Position(ChainPosition::C3(0)));
        assert_eq!(
            c.index_before(&Index::Position(ChainPosition::C3(0))),
            Index::Position(ChainPosition::C1(0))
        );
    }

    #[test]
    fn test_all_empty_chain() {
        let c = Chain::new((Vec::<i32>::new(), 3..3));
        assert_eq!(c.len(), 0);
        assert!(c.is_empty());
        assert_eq!(c.start_index(), c.end_index());
        assert_eq!(c.iter().count(), 0);
    }

    #[test]
    #[should_panic(expected = "cannot retreat before the start index")]
    fn test_retreating_before_start_panics() {
        let c = Chain::new((Vec::<i32>::new(), vec![4]));
        c.index_before(&c.start_index());
    }

    #[test]
    #[should_panic(expected = "cannot advance past the end index")]
    fn test_advancing_past_end_panics() {
        let c = Chain::new((vec![1], vec![2]));
        c.index_after(&c.end_index());
    }

    #[test]
    #[should_panic(expected = "not subscriptable")]
    fn test_advancing_foreign_position_panics() {
        let c = Chain::new((5u8..8, 10u8..12));
        c.index_after(&Index::Position(ChainPosition::C0(1)));
    }

    #[test]
    #[should_panic(expected = "not subscriptable")]
    fn test_retreating_foreign_position_panics() {
        let c = Chain::new((5u8..8, 10u8..12));
        c.index_before(&Index::Position(ChainPosition::C1(20)));
    }

    #[test]
    fn test_nine_constituents() {
        let c = Chain::new((
            Vec::<u32>::new(),
            vec![0u32],
            1u32..3,
            VecDeque::from(vec![3u32]),
            Vec::<u32>::new(),
            4u32..4,
            vec![4u32, 5],
            6u32..7,
            Vec::<u32>::new(),
        ));
        let expected = (0u32..7).collect::<Vec<_>>();
        assert_eq!(c.len(), 7);
        assert_eq!(c.iter().collect::<Vec<_>>(), expected);
        let mut backward = c.iter().rev().collect::<Vec<_>>();
        backward.reverse();
        assert_eq!(backward, expected);
        assert_eq!(c.index_at_linear(6), Index::Position(ChainPosition::C7(6)));
        assert_eq!(c.range_for(8), 7..7);
        for linear in 0..c.len() {
            assert_eq!(c.linear_position(&c.index_at_linear(linear)), linear);
        }

        let c = c.with::<8>(vec![7, 8]);
        assert_eq!(c.len(), 9);
        assert_eq!(
            c.index_before(&c.end_index()),
            Index::Position(ChainPosition::C8(1))
        );
        let c = c.with::<8>(vec![]);
        assert_eq!(c.len(), 7);
        assert_eq!(
            c.index_before(&c.end_index()),
            Index::Position(ChainPosition::C7(6))
        );
    }

    #[test]
    #[should_panic(expected = "chain length should fit in usize")]
    fn test_length_overflow_panics() {
        #[derive(Clone)]
        struct Huge;

        impl crate::collection::Collection for Huge {
            type Element = usize;
            type Index = usize;

            fn start_index(&self) -> usize {
                0
            }

            fn end_index(&self) -> usize {
                usize::MAX
            }

            fn index_after(&self, index: &usize) -> usize {
                index + 1
            }

            fn element(&self, index: &usize) -> usize {
                *index
            }

            fn len(&self) -> usize {
                usize::MAX
            }
        }

        Chain::new((Huge, Huge)).len();
    }

    #[test]
    fn test_try_get_rejects_stale_positions() {
        let c = Chain::new((vec!['a'], vec!['b', 'c']));
        assert!(c.try_get(&Index::Position(ChainPosition::C0(1))).is_err());
        assert_eq!(c.try_get(&Index::Position(ChainPosition::C1(1))), Ok('c'));
    }

    #[test]
    fn test_set_recomputes_ranges() {
        let mut c = Chain::new((vec![1, 2], vec![3], vec![4, 5]));
        assert_eq!(c.range_for(2), 3..5);
        assert_eq!(c.set::<0>(vec![]), vec![1, 2]);
        assert_eq!(c.range_for(2), 1..3);
        assert_eq!(c.start_index(), Index::Position(ChainPosition::C1(0)));
        let c = c.with::<2>(vec![]);
        assert_eq!(c.len(), 1);
        assert_eq!(
            c.index_before(&c.end_index()),
            Index::Position(ChainPosition::C1(0))
        );
    }

    #[test]
    fn test_cow_leaves_copies_untouched() {
        let x = Chain::new((vec![1, 2], vec![3]));
        let y = x.clone();
        assert!(x.shares_storage_with(&y));
        let z = x.with::<1>(vec![7, 8, 9]);
        assert_eq!(y.iter().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(z.iter().collect::<Vec<_>>(), vec![1, 2, 7, 8, 9]);
        assert_eq!(y.component::<1>(), &vec![3]);
    }

    #[test]
    fn test_chain_of_products() {
        let front = Product::new((vec![0, 1], vec!['a', 'b']));
        let back = Product::new((vec![9], vec!['z']));
        let c = Chain::new((front, back));
        assert_eq!(c.len(), 5);
        assert_eq!(
            c.iter().collect::<Vec<_>>(),
            vec![(0, 'a'), (0, 'b'), (1, 'a'), (1, 'b'), (9, 'z')]
        );
        assert_eq!(c.get(&c.index_before(&c.end_index())), (9, 'z'));
        assert_eq!(c.get(&c.index_at_linear(2)), (1, 'a'));
    }

    #[test]
    fn test_product_of_chains() {
        let digits = Chain::new((0..2, 5..6));
        let p = Product::new((digits, vec!["x", "y"]));
        assert_eq!(p.len(), 6);
        assert_eq!(p.get(&p.index_at_linear(5)), (5, "y"));
    }

    #[test]
    fn test_debug_names_the_combinator() {
        let c = Chain::new((vec![1], vec![2]));
        assert_eq!(format!("{c:?}"), "Chain(([1], [2]))");
    }

    #[derive(Debug, Clone, Arbitrary)]
    enum Piece {
        Empty,
        Run {
            start: u8,
            #[proptest(strategy = "1u8..6")]
            len: u8,
        },
    }

    impl Piece {
        fn to_vec(&self) -> Vec<u32> {
            match *self {
                Piece::Empty => vec![],
                Piece::Run { start, len } => {
                    (0..len).map(|i| u32::from(start) + u32::from(i)).collect()
                }
            }
        }
    }

    proptest! {
        #[test]
        fn test_chain_matches_concatenation(a: Piece, b: Piece, c: Piece) {
            let (a, b, c) = (a.to_vec(), b.to_vec(), c.to_vec());
            let expected = [a.clone(), b.clone(), c.clone()].concat();
            let chain = Chain::new((a, VecDeque::from(b), c));
            prop_assert_eq!(chain.len(), expected.len());
            prop_assert_eq!(chain.iter().collect::<Vec<_>>(), expected.clone());
            let mut backward = chain.iter().rev().collect::<Vec<_>>();
            backward.reverse();
            prop_assert_eq!(backward, expected);

            let mut index = chain.start_index();
            for linear in 0..chain.len() {
                prop_assert_eq!(&index, &chain.index_at_linear(linear));
                prop_assert_eq!(chain.linear_position(&index), linear);
                index = chain.index_after(&index);
            }
            prop_assert_eq!(index, chain.end_index());
        }

        #[test]
        fn test_offsets_agree_with_distance(
            a in 0usize..4, b in 0usize..4, from in 0usize..9, to in 0usize..9
        ) {
            let chain = Chain::new((0..a, 10..10 + b));
            let (from, to) = (from % (chain.len() + 1), to % (chain.len() + 1));
            let from = chain.index_at_linear(from);
            let to = chain.index_at_linear(to);
            let d = chain.distance(&from, &to);
            prop_assert_eq!(chain.index_offset_by(&from, d), to);
        }
    }
}
