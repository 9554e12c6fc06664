pub mod error;
pub mod filter_where;
pub mod projection;
pub mod types;

pub use error::FilterError;
pub use filter_where::{json_eq, FilterWhere};
pub use projection::Projection;
pub use types::*;
