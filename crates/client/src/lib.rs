//! Client side of the transactions backend: the typed REST client, the
//! shared query cache and the cache-coordinated reads and writes the pages
//! use.

pub mod api;
pub mod cache;
pub mod error;
pub mod queries;

pub use api::{ApiClient, TransactionApi};
pub use cache::{FetchMode, KeyPattern, QueryCache, QueryKey, Subscription};
pub use error::{ClientError, Result};
pub use queries::{QueryData, TransactionCache, TransactionQueries};
