use crate::config::Config;
use crate::flippy::{Flippy, Group, User};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub flippy: Flippy,
    pub config: Arc<Config>,
    pub user: Arc<User>,
    pub group: Arc<Group>,
}

impl AppState {
    /// State wired with the demo actors
    pub fn new(flippy: Flippy, config: Config) -> Self {
        Self {
            flippy,
            config: Arc::new(config),
            user: Arc::new(User {
                name: "Jane Doe".to_string(),
                id: 1,
            }),
            group: Arc::new(Group {
                name: "Power Users".to_string(),
                id: 15,
            }),
        }
    }

    /// Name of the feature the demo endpoints operate on
    pub fn feature(&self) -> &str {
        &self.config.feature
    }
}
