pub mod btree;
pub mod error;
pub mod metadata;
pub mod node;
pub mod page;
pub mod record;

pub use btree::Btree;
pub use error::BtreeError;
pub use record::{FixedBytesRecord, Record};
