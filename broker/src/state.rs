//! The connection lifecycle shared by [`crate::AmqpEventBus`] and
//! [`crate::AmqpCommandBus`]: `Init -> Running -> Closing -> Closed`.
//!
//! A bus is constructed in `Init` (connected, exchange declared, but not
//! yet consuming), moves to `Running` once `start()` spawns its consumer
//! task, to `Closing` while `close()` cancels and drains that task, and
//! finally to `Closed`. The transition is one-way: a closed bus cannot be
//! restarted.

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of an AMQP-backed bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerState {
    /// Connected, exchange/queue topology declared, not yet consuming.
    Init,
    /// Consumer task running; publish and handler registration both work.
    Running,
    /// `close()` has been called; the consumer task is being drained.
    Closing,
    /// Fully shut down. Any further operation fails.
    Closed,
}

const INIT: u8 = 0;
const RUNNING: u8 = 1;
const CLOSING: u8 = 2;
const CLOSED: u8 = 3;

pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(INIT))
    }

    pub(crate) fn get(&self) -> BrokerState {
        match self.0.load(Ordering::SeqCst) {
            RUNNING => BrokerState::Running,
            CLOSING => BrokerState::Closing,
            CLOSED => BrokerState::Closed,
            _ => BrokerState::Init,
        }
    }

    pub(crate) fn start(&self) {
        self.0.store(RUNNING, Ordering::SeqCst);
    }

    pub(crate) fn begin_close(&self) {
        self.0.store(CLOSING, Ordering::SeqCst);
    }

    pub(crate) fn finish_close(&self) {
        self.0.store(CLOSED, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_init() {
        assert_eq!(StateCell::new().get(), BrokerState::Init);
    }

    #[test]
    fn transitions_follow_the_documented_order() {
        let cell = StateCell::new();
        cell.start();
        assert_eq!(cell.get(), BrokerState::Running);
        cell.begin_close();
        assert_eq!(cell.get(), BrokerState::Closing);
        cell.finish_close();
        assert_eq!(cell.get(), BrokerState::Closed);
    }
}
