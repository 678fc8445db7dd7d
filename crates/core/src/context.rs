//! Per-request authorization context.

/// API token and tenant scope for one user action.
///
/// Every scoped store call takes this explicitly. There is no ambient
/// session state anywhere in the crate, so a call site always shows which
/// organization it acts for.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub api_token: String,
    pub organization_id: u64,
}

impl RequestContext {
    pub fn new(api_token: impl Into<String>, organization_id: u64) -> Self {
        Self {
            api_token: api_token.into(),
            organization_id,
        }
    }
}
