//! UI state reconciliation and observer fan-out

mod observers;
mod reconciler;

pub use observers::{ObserverRegistry, StateObserver};
pub use reconciler::{ReconcileInput, StateReconciler, reconcile};
