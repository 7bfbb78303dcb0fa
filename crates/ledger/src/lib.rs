//! Order ledger for the storefront order core.
//!
//! Placement reserves stock line by line and compensates on failure:
//! 1. Validate the order (amounts, quantities, address)
//! 2. Reserve each line item in list order
//! 3. Persist the order
//!
//! If step 2 or 3 fails, the reservations already made are released in
//! reverse order and the original error is returned.

pub mod config;
pub mod error;
pub mod owners;
pub mod reservation;
pub mod service;

pub use config::LedgerConfig;
pub use error::{ErrorKind, LedgerError, Result};
pub use owners::{OwnedOrder, OwnerSummary, with_owners};
pub use reservation::{ReservationLog, ReservationState, Reserved};
pub use service::{OrderFilter, OrderLedger};
