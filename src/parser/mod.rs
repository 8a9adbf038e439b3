//! Download URL parsing.
//!
//! - [`parse_limit`] strips a `#limit=N[k|m]` throttle directive
//! - [`validate_url`] checks that what remains is a fetchable web URL

mod error;
mod limit;
mod url;

pub use error::{MAX_URL_LENGTH, ParseError};
pub use limit::parse_limit;
pub use url::validate_url;
