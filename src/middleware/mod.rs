/// Middleware module
///
/// Request-level guards for protected routes.

mod access_guard;

pub use access_guard::AccessGuard;
