//! Presenter Port
//!
//! The visual collaborator. It receives the final ranked view and the live
//! query; layout, styling and input handling are entirely its business.

use crate::domain::ScoredToken;

pub trait Presenter: Send + Sync {
    /// Render the current ranked view
    fn render(&self, view: &[ScoredToken], query: &str);
}
