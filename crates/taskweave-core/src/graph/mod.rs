//! Graph module: per-project dependency relation and its validation.

mod dependency;

pub use dependency::DependencyGraph;
