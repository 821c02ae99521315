//! Transport- and storage-agnostic query primitives.
//!
//! A [`Query`] is the loosely typed mapping handlers and domain code build
//! (`{"status": "PAID", "total__gte": 100, "OR": [...]}`); [`build`] turns it
//! into a [`Predicate`] tree that a storage adapter compiles to SQL.
//! Ordering keys and the page arithmetic used by paginated listings live here
//! too, so they can be tested without a database.

pub mod error;
pub mod order;
pub mod page;
pub mod predicate;

pub use error::QueryError;
pub use order::{OrderKey, SortDir};
pub use page::{PageParams, Pagination, PaginationInfo, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
pub use predicate::{build, Lookup, Operand, Predicate};

/// Field name (optionally `__lookup` suffixed) or operator key → value/sub-query.
pub type Query = serde_json::Map<String, serde_json::Value>;

/// Reserved operator keys. A field literally named like one of these cannot be
/// filtered by equality through a [`Query`].
pub const AND: &str = "AND";
pub const OR: &str = "OR";
pub const NOT: &str = "NOT";
/// Marker key for field-to-field comparison: `{"score__gt": {"F": "high_score"}}`.
pub const FIELD_REF: &str = "F";
