// Place records — the corpus the core-word model learns from.

pub mod loader;
pub mod models;
pub mod store;
