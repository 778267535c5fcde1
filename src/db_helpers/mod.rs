//! Every SQL statement the service runs, one file per entity.
//!
//! Inserts that hand back the new row run in a transaction and are committed
//! before the helper returns.

mod category_helpers;
mod comment_helpers;
mod post_helpers;
mod profile_helpers;
mod user_helpers;

pub use category_helpers::*;
pub use comment_helpers::*;
pub use post_helpers::*;
pub use profile_helpers::*;
pub use user_helpers::*;
