use librarian_core::Librarian;
use prometheus::Registry;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub librarian: Arc<Librarian>,
    pub registry: Registry,
    /// Redirect target of `GET /`
    pub homepage: String,
}

impl AppState {
    pub fn new(librarian: Librarian, registry: Registry, homepage: impl Into<String>) -> Self {
        Self {
            librarian: Arc::new(librarian),
            registry,
            homepage: homepage.into(),
        }
    }
}
