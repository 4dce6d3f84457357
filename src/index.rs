use std::convert::Infallible;

/// An index into a combinator: either a position addressing one element, or the
/// past-the-end sentinel.
///
/// `End` orders after every position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Index<P> {
    Position(P),
    End,
}

impl<P> Index<P> {
    pub fn position(&self) -> Option<&P> {
        match self {
            Index::Position(p) => Some(p),
            Index::End => None,
        }
    }

    pub fn into_position(self) -> Option<P> {
        match self {
            Index::Position(p) => Some(p),
            Index::End => None,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Index::End)
    }
}

impl<P> From<Option<P>> for Index<P> {
    fn from(position: Option<P>) -> Self {
        position.map_or(Index::End, Index::Position)
    }
}

/// Placeholder index type for the unused variants of [ChainPosition].
pub type Unused = Infallible;

/// A position in a chain of up to nine constituents: an index into exactly one
/// constituent, tagged by which.
///
/// Chains of fewer constituents leave the trailing variants [Unused], so they cannot be
/// constructed. Ordering compares the tag first, which matches traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChainPosition<
    I0,
    I1,
    I2 = Unused,
    I3 = Unused,
    I4 = Unused,
    I5 = Unused,
    I6 = Unused,
    I7 = Unused,
    I8 = Unused,
> {
    C0(I0),
    C1(I1),
    C2(I2),
    C3(I3),
    C4(I4),
    C5(I5),
    C6(I6),
    C7(I7),
    C8(I8),
}

impl<I0, I1, I2, I3, I4, I5, I6, I7, I8> ChainPosition<I0, I1, I2, I3, I4, I5, I6, I7, I8> {
    /// Which constituent this position indexes into.
    pub fn component(&self) -> usize {
        match self {
            ChainPosition::C0(_) => 0,
            ChainPosition::C1(_) => 1,
            ChainPosition::C2(_) => 2,
            ChainPosition::C3(_) => 3,
            ChainPosition::C4(_) => 4,
            ChainPosition::C5(_) => 5,
            ChainPosition::C6(_) => 6,
            ChainPosition::C7(_) => 7,
            ChainPosition::C8(_) => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_orders_after_positions() {
        assert!(Index::Position(usize::MAX) < Index::End);
        assert!(Index::Position((0, 'z')) > Index::Position((0, 'a')));
    }

    #[test]
    fn test_chain_positions_order_by_component_first() {
        let a: ChainPosition<u32, char> = ChainPosition::C0(100);
        let b: ChainPosition<u32, char> = ChainPosition::C1('a');
        assert!(a < b);
        assert_eq!(b.component(), 1);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Index::from(Some(3)), Index::Position(3));
        assert_eq!(Index::<u8>::from(None), Index::End);
    }
}
