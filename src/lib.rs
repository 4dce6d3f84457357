pub mod cached;
pub mod chain;
pub mod collection;
pub mod error;
pub mod index;
pub mod product;
pub mod storage;
pub mod tuple;

pub use chain::Chain;
pub use collection::{BidirectionalCollection, Collection, CollectionExt, RandomAccessCollection};
pub use error::NavigationError;
pub use index::{ChainPosition, Index};
pub use product::Product;
pub use storage::Combinator;
