//! Request middleware: bearer token extraction and body validation

mod auth;
mod validate;

pub use auth::AuthenticatedUser;
pub use validate::ValidatedJson;
