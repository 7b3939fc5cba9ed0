pub mod reconciler;

pub use reconciler::HistoryReconciler;
