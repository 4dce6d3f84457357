//! Per-arity glue between tuples of constituents and the generic combinator algorithms.
//!
//! The odometer, stride, and range logic in [crate::product] and [crate::chain] is written
//! once against runtime component numbers. The traits here let that logic reach into the
//! `k`-th element of a heterogeneous tuple; [impl_constituents] generates them for tuples
//! of two to nine constituents.

use std::fmt::Debug;
use std::hash::Hash;

use crate::cached::{AdvancementFlag, Cached, RetreatFlag};
use crate::collection::{BidirectionalCollection, Collection, RandomAccessCollection};
use crate::index::ChainPosition;

/// A tuple of constituent collections.
pub trait Constituents: Clone {
    const ARITY: usize;

    /// The same tuple with each constituent wrapped in a [Cached].
    type Parts: Clone;

    fn into_parts(self) -> Self::Parts;
    fn from_parts(parts: Self::Parts) -> Self;
    fn clone_from_parts(parts: &Self::Parts) -> Self;
}

/// Constituents of a Cartesian product. Positions are tuples of constituent indices.
pub trait ProductConstituents: Constituents {
    type Position: Clone + Ord + Hash + Debug;
    type Element;

    fn count_of(parts: &Self::Parts, component: usize) -> usize;

    /// The tuple of every constituent's first index, or `None` if any constituent is empty.
    fn first_position(parts: &Self::Parts) -> Option<Self::Position>;
    fn last_position(parts: &Self::Parts) -> Option<Self::Position>;

    /// Advances one component of `position` with wraparound.
    fn advance_component(
        parts: &Self::Parts,
        component: usize,
        position: &mut Self::Position,
        flag: &mut AdvancementFlag,
    );

    fn offset_of(parts: &Self::Parts, component: usize, position: &Self::Position) -> usize;

    /// Builds the position whose `k`-th index is `offsets[k]` steps from constituent `k`'s
    /// first index.
    fn position_at(parts: &Self::Parts, offsets: &[usize]) -> Self::Position;

    fn element(parts: &Self::Parts, position: &Self::Position) -> Self::Element;
    fn is_subscriptable(parts: &Self::Parts, position: &Self::Position) -> bool;
}

pub trait BidirectionalProductConstituents: ProductConstituents {
    fn retreat_component(
        parts: &Self::Parts,
        component: usize,
        position: &mut Self::Position,
        flag: &mut RetreatFlag,
    );
}

/// Constituents of a chain, all sharing one element type.
pub trait ChainConstituents: Constituents {
    type Position: Clone + Ord + Hash + Debug;
    type Element;

    fn count_of(parts: &Self::Parts, component: usize) -> usize;
    fn component_of(position: &Self::Position) -> usize;
    fn first_in(parts: &Self::Parts, component: usize) -> Option<Self::Position>;
    fn last_in(parts: &Self::Parts, component: usize) -> Option<Self::Position>;

    /// The next position inside the same constituent, if any.
    fn after_within(parts: &Self::Parts, position: &Self::Position) -> Option<Self::Position>;
    fn offset_within(parts: &Self::Parts, position: &Self::Position) -> usize;
    fn position_at(parts: &Self::Parts, component: usize, offset: usize) -> Self::Position;
    fn element(parts: &Self::Parts, position: &Self::Position) -> Self::Element;
    fn is_subscriptable(parts: &Self::Parts, position: &Self::Position) -> bool;
}

pub trait BidirectionalChainConstituents: ChainConstituents {
    fn before_within(parts: &Self::Parts, position: &Self::Position) -> Option<Self::Position>;
}

/// Constituents that all support constant-time offsetting.
pub trait RandomAccessConstituents: Constituents {}

/// Typed access to constituent `K`.
pub trait Slot<const K: usize>: Constituents {
    type Value: Collection + Clone;

    fn slot(parts: &Self::Parts) -> &Cached<Self::Value>;
    fn slot_mut(parts: &mut Self::Parts) -> &mut Cached<Self::Value>;
}

#[track_caller]
fn no_such_component(component: usize, arity: usize) -> ! {
    panic!("component {component} is out of range for {arity} constituents")
}

macro_rules! impl_constituents {
    ($arity:literal; $($idx:tt : $T:ident : $V:ident),+) => {
        impl<$($T: Collection + Clone),+> Constituents for ($($T,)+) {
            const ARITY: usize = $arity;
            type Parts = ($(Cached<$T>,)+);

            fn into_parts(self) -> Self::Parts {
                ($(Cached::new(self.$idx),)+)
            }

            fn from_parts(parts: Self::Parts) -> Self {
                ($(parts.$idx.into_base(),)+)
            }

            fn clone_from_parts(parts: &Self::Parts) -> Self {
                ($(parts.$idx.base().clone(),)+)
            }
        }

        impl<$($T: Collection + Clone),+> ProductConstituents for ($($T,)+) {
            type Position = ($(<$T as Collection>::Index,)+);
            type Element = ($(<$T as Collection>::Element,)+);

            fn count_of(parts: &Self::Parts, component: usize) -> usize {
                match component {
                    $($idx => parts.$idx.len(),)+
                    _ => no_such_component(component, $arity),
                }
            }

            fn first_position(parts: &Self::Parts) -> Option<Self::Position> {
                Some(($(parts.$idx.first()?.clone(),)+))
            }

            fn last_position(parts: &Self::Parts) -> Option<Self::Position> {
                Some(($(parts.$idx.last()?.clone(),)+))
            }

            fn advance_component(
                parts: &Self::Parts,
                component: usize,
                position: &mut Self::Position,
                flag: &mut AdvancementFlag,
            ) {
                match component {
                    $($idx => {
                        position.$idx = parts.$idx.next_subscriptable_index(&position.$idx, flag);
                    })+
                    _ => no_such_component(component, $arity),
                }
            }

            fn offset_of(parts: &Self::Parts, component: usize, position: &Self::Position) -> usize {
                match component {
                    $($idx => parts.$idx.offset_of(&position.$idx),)+
                    _ => no_such_component(component, $arity),
                }
            }

            fn position_at(parts: &Self::Parts, offsets: &[usize]) -> Self::Position {
                assert_eq!(offsets.len(), $arity);
                ($(parts.$idx.index_at(offsets[$idx]),)+)
            }

            fn element(parts: &Self::Parts, position: &Self::Position) -> Self::Element {
                ($(parts.$idx.element(&position.$idx),)+)
            }

            fn is_subscriptable(parts: &Self::Parts, position: &Self::Position) -> bool {
                $(parts.$idx.is_subscriptable(&position.$idx))&&+
            }
        }

        impl<$($T: BidirectionalCollection + Clone),+> BidirectionalProductConstituents
            for ($($T,)+)
        {
            fn retreat_component(
                parts: &Self::Parts,
                component: usize,
                position: &mut Self::Position,
                flag: &mut RetreatFlag,
            ) {
                match component {
                    $($idx => {
                        position.$idx =
                            parts.$idx.previous_subscriptable_index(&position.$idx, flag);
                    })+
                    _ => no_such_component(component, $arity),
                }
            }
        }

        impl<E, $($T: Collection<Element = E> + Clone),+> ChainConstituents for ($($T,)+) {
            type Position = ChainPosition<$(<$T as Collection>::Index),+>;
            type Element = E;

            fn count_of(parts: &Self::Parts, component: usize) -> usize {
                match component {
                    $($idx => parts.$idx.len(),)+
                    _ => no_such_component(component, $arity),
                }
            }

            fn component_of(position: &Self::Position) -> usize {
                position.component()
            }

            fn first_in(parts: &Self::Parts, component: usize) -> Option<Self::Position> {
                match component {
                    $($idx => parts.$idx.first().cloned().map(ChainPosition::$V),)+
                    _ => no_such_component(component, $arity),
                }
            }

            fn last_in(parts: &Self::Parts, component: usize) -> Option<Self::Position> {
                match component {
                    $($idx => parts.$idx.last().cloned().map(ChainPosition::$V),)+
                    _ => no_such_component(component, $arity),
                }
            }

            #[allow(unreachable_patterns)]
            fn after_within(
                parts: &Self::Parts,
                position: &Self::Position,
            ) -> Option<Self::Position> {
                match position {
                    $(ChainPosition::$V(i) => {
                        parts.$idx.subscriptable_index_after(i).map(ChainPosition::$V)
                    })+
                    _ => unreachable!("unused chain position variants are uninhabited"),
                }
            }

            #[allow(unreachable_patterns)]
            fn offset_within(parts: &Self::Parts, position: &Self::Position) -> usize {
                match position {
                    $(ChainPosition::$V(i) => parts.$idx.offset_of(i),)+
                    _ => unreachable!("unused chain position variants are uninhabited"),
                }
            }

            fn position_at(parts: &Self::Parts, component: usize, offset: usize) -> Self::Position {
                match component {
                    $($idx => ChainPosition::$V(parts.$idx.index_at(offset)),)+
                    _ => no_such_component(component, $arity),
                }
            }

            #[allow(unreachable_patterns)]
            fn element(parts: &Self::Parts, position: &Self::Position) -> E {
                match position {
                    $(ChainPosition::$V(i) => parts.$idx.element(i),)+
                    _ => unreachable!("unused chain position variants are uninhabited"),
                }
            }

            #[allow(unreachable_patterns)]
            fn is_subscriptable(parts: &Self::Parts, position: &Self::Position) -> bool {
                match position {
                    $(ChainPosition::$V(i) => parts.$idx.is_subscriptable(i),)+
                    _ => false,
                }
            }
        }

        impl<E, $($T: BidirectionalCollection<Element = E> + Clone),+>
            BidirectionalChainConstituents for ($($T,)+)
        {
            #[allow(unreachable_patterns)]
            fn before_within(
                parts: &Self::Parts,
                position: &Self::Position,
            ) -> Option<Self::Position> {
                match position {
                    $(ChainPosition::$V(i) => {
                        parts.$idx.subscriptable_index_before(i).map(ChainPosition::$V)
                    })+
                    _ => unreachable!("unused chain position variants are uninhabited"),
                }
            }
        }

        impl<$($T: RandomAccessCollection + Clone),+> RandomAccessConstituents for ($($T,)+) {}

        impl_constituents!(@slots [$($T),+] $($idx : $T),+);
    };
    (@slots $all:tt $($idx:tt : $T:ident),+) => {
        $(impl_constituents!(@slot $all $idx $T);)+
    };
    (@slot [$($All:ident),+] $idx:tt $T:ident) => {
        impl<$($All: Collection + Clone),+> Slot<$idx> for ($($All,)+) {
            type Value = $T;

            fn slot(parts: &Self::Parts) -> &Cached<$T> {
                &parts.$idx
            }

            fn slot_mut(parts: &mut Self::Parts) -> &mut Cached<$T> {
                &mut parts.$idx
            }
        }
    };
}

impl_constituents!(2; 0: A0: C0, 1: A1: C1);
impl_constituents!(3; 0: A0: C0, 1: A1: C1, 2: A2: C2);
impl_constituents!(4; 0: A0: C0, 1: A1: C1, 2: A2: C2, 3: A3: C3);
impl_constituents!(5; 0: A0: C0, 1: A1: C1, 2: A2: C2, 3: A3: C3, 4: A4: C4);
impl_constituents!(6; 0: A0: C0, 1: A1: C1, 2: A2: C2, 3: A3: C3, 4: A4: C4, 5: A5: C5);
impl_constituents!(
    7; 0: A0: C0, 1: A1: C1, 2: A2: C2, 3: A3: C3, 4: A4: C4, 5: A5: C5, 6: A6: C6
);
impl_constituents!(
    8; 0: A0: C0, 1: A1: C1, 2: A2: C2, 3: A3: C3, 4: A4: C4, 5: A5: C5, 6: A6: C6, 7: A7: C7
);
impl_constituents!(
    9; 0: A0: C0, 1: A1: C1, 2: A2: C2, 3: A3: C3, 4: A4: C4, 5: A5: C5, 6: A6: C6, 7: A7: C7,
    8: A8: C8
);
