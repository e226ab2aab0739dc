//! Shared error plumbing.
//!
//! parley crates report failures as `rootcause::Report<C>` where `C` is the
//! crate's own error enum. Callers that need to react to a specific failure
//! (the bot classifying backend errors, for instance) inspect the report's
//! current context instead of matching on strings.

use rootcause::Report;

/// Result carrying a rootcause report with context type `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
