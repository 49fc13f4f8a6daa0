pub mod cors;
pub mod envelope;
pub mod rate_limit;
pub mod validation;

pub use cors::create_cors_layer;
pub use envelope::wrap_bare_errors;
pub use rate_limit::{rate_limit_middleware, RateLimitLayer};
pub use validation::{ValidPath, ValidatedJson};
