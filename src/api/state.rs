use std::sync::Arc;

use crate::{auth::AuthProvider, db::Repository, services::providers::MetadataProvider};

/// Shared application state
///
/// Every collaborator sits behind a trait object so tests can run the real
/// router against in-memory stand-ins.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub auth: Arc<dyn AuthProvider>,
    pub metadata: Arc<dyn MetadataProvider>,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn Repository>,
        auth: Arc<dyn AuthProvider>,
        metadata: Arc<dyn MetadataProvider>,
    ) -> Self {
        Self {
            repo,
            auth,
            metadata,
        }
    }
}
