pub mod analyze;
pub mod reconcile;
pub mod runtime;
