//! Session phase and per-tick status.

/// Lifecycle of one recording session. `Finalized` is terminal; the only
/// way back to `Recording` is starting a new session via `begin()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Recording,
    Finalized,
}

/// Public status of a single control-loop tick.
#[derive(Debug, Clone, Copy)]
pub enum TickStatus {
    /// Window still filling; elapsed whole seconds since the session began.
    Sampling { elapsed_s: u32 },
    /// Window complete; carries the calibrated distance for this session.
    Finalized { distance_m: f64 },
}
