//! Tenant context

/// Tenant scope for one gateway instance
///
/// Passed explicitly into every handler; all store lookups and writes are
/// scoped by `client_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientContext {
    pub client_id: i64,
}

impl ClientContext {
    pub fn new(client_id: i64) -> Self {
        Self { client_id }
    }
}

impl Default for ClientContext {
    fn default() -> Self {
        Self { client_id: 1 }
    }
}
