#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("cannot subscript the end index")]
    SubscriptEnd,
    #[error("cannot advance past the end index")]
    AdvancePastEnd,
    #[error("cannot retreat before the start index")]
    RetreatBeforeStart,
    #[error("position {0} is not subscriptable in its constituents")]
    InvalidPosition(String),
    #[error("offset {offset} from linear position {from} leaves 0..={len}")]
    OffsetOutOfBounds { from: usize, offset: isize, len: usize },
}
