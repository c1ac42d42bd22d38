//! Flow coordination
//!
//! Entry point that classifies each callback request, dispatches it to the
//! matching phase of [`OidcFlowEngine`](crate::OidcFlowEngine) and applies the
//! cleanup policy when a phase fails.

mod errors;
mod filter;

pub use errors::CoordinationError;
pub use filter::FlowFilter;
