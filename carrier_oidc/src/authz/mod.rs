mod registry;
mod tracker;
mod transaction;
mod types;

pub use registry::{ContinuationRegistry, StepUpContinuation, StepUpRequest};
pub use tracker::AuthorizationContextTracker;
pub use transaction::{TRANSACTION_TYPE, TransactionContinuation};
pub use types::{AuthorizationContext, AuthorizationKind};
