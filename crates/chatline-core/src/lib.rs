//! Read path of the chat backend: walks paginated store queries to
//! completion and fans per-conversation detail fetches out concurrently.

pub mod fanout;
pub mod pager;
pub mod readers;
pub mod records;
pub mod service;
pub mod tables;

pub use chatline_db::{Result, StoreError};
pub use fanout::FanOutAggregator;
pub use readers::Readers;
pub use service::ChatService;
pub use tables::Tables;
