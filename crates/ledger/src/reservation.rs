//! Compensation log for stock reserved during order placement.

use common::{OrderId, ProductId};

/// The state of a placement's reservations.
///
/// State transitions:
/// ```text
/// Pending ──► Reserving ──┬──► Committed
///                         └──► Compensating ──► RolledBack
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReservationState {
    /// Nothing reserved yet.
    #[default]
    Pending,

    /// Line items are being reserved.
    Reserving,

    /// A step failed and reserved stock is being released.
    Compensating,

    /// The order was persisted; reservations are final (terminal state).
    Committed,

    /// Every recorded reservation was released (terminal state).
    RolledBack,
}

impl ReservationState {
    /// Returns true if more reservations may be recorded.
    pub fn can_reserve(&self) -> bool {
        matches!(self, ReservationState::Pending | ReservationState::Reserving)
    }

    /// Returns true if compensation can begin.
    pub fn can_compensate(&self) -> bool {
        matches!(self, ReservationState::Pending | ReservationState::Reserving)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationState::Committed | ReservationState::RolledBack
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationState::Pending => "Pending",
            ReservationState::Reserving => "Reserving",
            ReservationState::Compensating => "Compensating",
            ReservationState::Committed => "Committed",
            ReservationState::RolledBack => "RolledBack",
        }
    }
}

impl std::fmt::Display for ReservationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One successful reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reserved {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Tracks which line items of an order have been reserved so exactly those
/// can be released if placement fails.
#[derive(Debug, Clone)]
pub struct ReservationLog {
    order_id: OrderId,
    state: ReservationState,
    reserved: Vec<Reserved>,
}

impl ReservationLog {
    pub fn new(order_id: OrderId) -> Self {
        Self {
            order_id,
            state: ReservationState::Pending,
            reserved: Vec::new(),
        }
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn state(&self) -> ReservationState {
        self.state
    }

    pub fn reserved(&self) -> &[Reserved] {
        &self.reserved
    }

    /// Records a successful reservation.
    pub fn record(&mut self, product_id: ProductId, quantity: u32) {
        debug_assert!(self.state.can_reserve(), "record in {}", self.state);
        self.state = ReservationState::Reserving;
        self.reserved.push(Reserved {
            product_id,
            quantity,
        });
    }

    /// Starts compensation. Returns the reservations to undo, most recent
    /// first.
    pub fn begin_compensation(&mut self) -> Vec<Reserved> {
        if !self.state.can_compensate() {
            return Vec::new();
        }
        self.state = ReservationState::Compensating;
        self.reserved.iter().rev().copied().collect()
    }

    /// Marks compensation finished.
    pub fn rolled_back(&mut self) {
        self.state = ReservationState::RolledBack;
    }

    /// Marks the reservations final.
    pub fn commit(&mut self) {
        self.state = ReservationState::Committed;
    }
}
