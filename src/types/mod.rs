pub mod error;
pub mod models;

pub use error::{GateError, Result};
pub use models::{ChildPage, PageContent, PageSearchResult, Paginated};
