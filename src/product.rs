use divrem::DivRem;
use once_cell::unsync::OnceCell;
use smallvec::SmallVec;

use crate::cached::{AdvancementFlag, RetreatFlag};
use crate::storage::{BidirectionalStorage, Combinator, PartsOf, Storage, MAX_ARITY};
use crate::tuple::{BidirectionalProductConstituents, ProductConstituents};

/// The Cartesian product of a tuple of collections, in row-major order: the last
/// constituent varies fastest.
///
/// ```
/// # use conjoin::Product;
/// let p = Product::new((vec![1, 2], vec!["x", "y", "z"]));
/// assert_eq!(p.len(), 6);
/// assert_eq!(p.get(&p.index_at_linear(4)), (2, "y"));
/// ```
pub type Product<C> = Combinator<ProductStorage<C>>;

#[derive(Clone)]
pub struct ProductStorage<C: ProductConstituents> {
    parts: C::Parts,
    len: OnceCell<usize>,
    strides: SmallVec<[OnceCell<usize>; MAX_ARITY]>,
    first: OnceCell<Option<C::Position>>,
    last: OnceCell<Option<C::Position>>,
}

impl<C: ProductConstituents> ProductStorage<C> {
    /// Number of linear positions spanned by one step of `component`, holding every
    /// less-significant component fixed.
    pub fn stride_for(&self, component: usize) -> usize {
        *self.strides[component].get_or_init(|| {
            if component + 1 == C::ARITY {
                1
            } else {
                let next = component + 1;
                self.stride_for(next) * C::count_of(&self.parts, next)
            }
        })
    }
}

impl<C: ProductConstituents> Storage for ProductStorage<C> {
    type Constituents = C;
    type Position = C::Position;
    type Element = C::Element;

    const NAME: &'static str = "Product";

    fn from_parts(parts: PartsOf<Self>) -> Self {
        ProductStorage {
            parts,
            len: OnceCell::new(),
            strides: (0..C::ARITY).map(|_| OnceCell::new()).collect(),
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
        self.len.take();
        for stride in &mut self.strides {
            stride.take();
        }
        self.first.take();
        self.last.take();
    }

    fn len(&self) -> usize {
        *self.len.get_or_init(|| {
            log::trace!("Computing product length over {} constituents", C::ARITY);
            if (0..C::ARITY).any(|k| C::count_of(&self.parts, k) == 0) {
                return 0;
            }
            (0..C::ARITY)
                .try_fold(1usize, |acc, k| acc.checked_mul(C::count_of(&self.parts, k)))
                .expect("product length should fit in usize")
        })
    }

    fn first_position(&self) -> Option<&C::Position> {
        self.first
            .get_or_init(|| C::first_position(&self.parts))
            .as_ref()
    }

    fn last_position(&self) -> Option<&C::Position> {
        self.last
            .get_or_init(|| C::last_position(&self.parts))
            .as_ref()
    }

    /// Odometer increment: the last component advances first and each wrap carries into
    /// the next more-significant component. Returns `None` when every component wrapped.
    fn position_after(&self, position: &C::Position) -> Option<C::Position> {
        let mut next = position.clone();
        let mut flag = AdvancementFlag::Attempt;
        for component in (0..C::ARITY).rev() {
            if flag == AdvancementFlag::Attempt {
                C::advance_component(&self.parts, component, &mut next, &mut flag);
            }
        }
        match flag {
            AdvancementFlag::Hold => Some(next),
            AdvancementFlag::Attempt => None,
        }
    }

    fn linear_position(&self, position: &C::Position) -> usize {
        (0..C::ARITY)
            .map(|k| self.stride_for(k) * C::offset_of(&self.parts, k, position))
            .sum()
    }

    fn position_for_linear(&self, linear: usize) -> C::Position {
        debug_assert!(linear < self.len());
        let mut offsets = SmallVec::<[usize; MAX_ARITY]>::with_capacity(C::ARITY);
        let mut remaining = linear;
        for k in 0..C::ARITY {
            let (offset, r) = remaining.div_rem(self.stride_for(k));
            debug_assert!(offset < C::count_of(&self.parts, k));
            offsets.push(offset);
            remaining = r;
        }
        debug_assert_eq!(remaining, 0);
        C::position_at(&self.parts, &offsets)
    }

    fn element(&self, position: &C::Position) -> C::Element {
        C::element(&self.parts, position)
    }

    fn is_subscriptable(&self, position: &C::Position) -> bool {
        C::is_subscriptable(&self.parts, position)
    }
}

impl<C: BidirectionalProductConstituents> BidirectionalStorage for ProductStorage<C> {
    /// Odometer decrement, mirroring [Storage::position_after].
    fn position_before(&self, position: &C::Position) -> Option<C::Position> {
        let mut previous = position.clone();
        let mut flag = RetreatFlag::Attempt;
        for component in (0..C::ARITY).rev() {
            if flag == RetreatFlag::Attempt {
                C::retreat_component(&self.parts, component, &mut previous, &mut flag);
            }
        }
        match flag {
            RetreatFlag::Hold => Some(previous),
            RetreatFlag::Attempt => None,
        }
    }
}

impl<C: ProductConstituents> Product<C> {
    /// See [ProductStorage::stride_for].
    pub fn stride_for(&self, component: usize) -> usize {
        assert!(component < C::ARITY, "component {component} is out of range");
        self.storage().stride_for(component)
    }
}
