use crate::{config::Config, db::AttemptStore};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub store: AttemptStore,
    pub config: Config,
}

impl FromRef<AppState> for AttemptStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
