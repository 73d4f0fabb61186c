mod holding;
mod id;

pub use holding::{Holding, HoldingError, HoldingKind, NewHolding};
pub use id::{HoldingId, HoldingIdError};
