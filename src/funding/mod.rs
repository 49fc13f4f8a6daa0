// Donation funding: turning gateway-confirmed payments into ledger entries
pub mod reconciler;

pub use reconciler::{DonationReconciler, ReconcileOutcome};
