//! Built-in middleware stages.
//!
//! | Stage | Name | Rejects with |
//! |---|---|---|
//! | [`RecoverPanic`] | `recover_panic` | 500 when the rest of the chain panics |
//! | [`MethodGate`] | `method_not_allowed` | 405 for methods outside its set |
//! | [`Authenticate`] | `authenticate` | 401 without a verifiable bearer token |
//!
//! Routes list `RecoverPanic` first so it guards every other stage.

mod auth;
mod method;
mod recover;

pub use auth::{bearer_token, Authenticate, BEARER_PREFIX};
pub use method::MethodGate;
pub use recover::RecoverPanic;
