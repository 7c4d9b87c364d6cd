use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

pub const CSRF_COOKIE: &str = "expenses_csrf";
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Alias the demo deployment resolves when no EMPLOYEE_ALIAS is configured.
/// A production replacement derives the alias from a verified credential.
pub const DEMO_EMPLOYEE_ALIAS: &str = "johndoe";

const CSRF_TOKEN_LEN: usize = 32;

/// Verified identity of the requesting employee, resolved by the host layer
/// and injected into the request. The workflow treats it as an opaque input
/// and never re-derives it.
#[derive(Debug, Clone)]
pub struct CurrentEmployee {
    pub employee_id: Uuid,
    pub display_name: String,
    pub manager: String,
}

/// Marker injected only when a mutating request carried a valid
/// anti-forgery token. Mutation resolvers require its presence.
#[derive(Debug, Clone, Copy)]
pub struct MutationToken;

/// Random per-session token for the double-submit anti-forgery scheme: the
/// value is issued as a cookie and must be echoed back in the
/// `x-csrf-token` header on every mutating request.
pub fn issue_csrf_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CSRF_TOKEN_LEN)
        .map(char::from)
        .collect()
}

pub fn token_matches(header: &str, cookie: &str) -> bool {
    !cookie.is_empty() && header == cookie
}
