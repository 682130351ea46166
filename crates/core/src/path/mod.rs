//! Path algebra for search-path roots.
//!
//! - [`resolve`] turns a raw path or `file:`/`jar:` URL into a canonical,
//!   `/`-separated absolute form
//! - [`split_path_list`] splits a delimited path list without breaking URL
//!   schemes, quoted pieces or bracketed pieces
//! - [`RootFilter`] is the user-supplied inclusion predicate

pub mod filter;
pub mod resolve;
pub mod split;

pub use filter::{RootFilter, passes_filters, passes_filters_both};
pub use resolve::{resolve, sanitize_entry_path};
pub use split::{PATH_LIST_DELIMITER, split_path_list};
