mod categories;
mod types;

pub use categories::{build_categories, display_name, filter_by_location, Category, PREFERRED_ORDER};
pub use types::{Document, PublishedDate};
