//! Plan bindings: capture the hints of one statement and replay them onto
//! another of the same shape.

mod cache;
mod codec;
mod hints_set;
mod record;

pub use cache::BindingCache;
pub use codec::CURRENT_VERSION;
pub use hints_set::{bind_hints, collect_hints, parse_hints_set, HintSet};
pub use record::{BindRecord, BindStatus};
