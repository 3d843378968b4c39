use std::sync::Arc;

use crate::auth::AuthKeys;
use crate::store::Store;

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub auth: Arc<AuthKeys>,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn new(store: Store, jwt_secret: &str, bcrypt_cost: u32) -> Self {
        AppState {
            store,
            auth: Arc::new(AuthKeys::new(jwt_secret)),
            bcrypt_cost,
        }
    }
}
