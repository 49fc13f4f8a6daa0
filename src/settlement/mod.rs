// Settlement: releasing held campaign funds to the owner's bank
pub mod payout;

pub use payout::{PayoutReceipt, PayoutTrigger};
