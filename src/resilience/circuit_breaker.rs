use crate::{Error, Result};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Breaker position as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half-open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerSnapshot {
    pub state: CircuitState,
    pub max_failures: u32,
    pub reset_timeout_ms: u64,
    pub consecutive_failures: u32,
    /// Remaining open time in ms, if currently open.
    pub open_remaining_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub max_failures: u32,
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            max_failures: 3,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the consecutive-failure threshold that opens the circuit
    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures;
        self
    }

    /// Set how long the circuit stays open before a probe is allowed
    pub fn with_reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout = timeout;
        self
    }
}

#[derive(Debug)]
struct State {
    circuit: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

/// Three-state circuit breaker around the remote AI call.
///
/// - Closed: calls pass through; a success resets the failure counter
/// - Open: calls rejected with `ServiceUnavailable` until the reset timeout
///   elapses, then the next attempt becomes the Half-Open probe
/// - Half-Open: exactly one probe; success closes the circuit, failure
///   re-opens it and refreshes the open timestamp
///
/// Invariant: the circuit is Open only when `consecutive_failures` has
/// reached `max_failures`.
pub struct CircuitBreaker {
    cfg: CircuitBreakerConfig,
    state: Mutex<State>,
}

impl CircuitBreaker {
    pub fn new(cfg: CircuitBreakerConfig) -> Self {
        Self {
            cfg,
            state: Mutex::new(State {
                circuit: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_in_flight: false,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A panic while holding the lock leaves the counters intact;
        // recover the guard rather than wedging the breaker shut.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Admission check. Must be called before every provider attempt; the
    /// open-to-half-open transition happens here, on the attempt that finds
    /// the reset timeout expired.
    ///
    /// Returns a [`CallPermit`] tied to this attempt. Record the outcome on
    /// the permit; a permit dropped without an outcome (the call future was
    /// cancelled) releases the Half-Open probe slot so the breaker can
    /// never wedge waiting for a result that will not arrive.
    pub fn allow(&self) -> Result<CallPermit<'_>> {
        let mut st = self.lock();
        match st.circuit {
            CircuitState::Closed => Ok(CallPermit::new(self, false)),
            CircuitState::Open => {
                let opened_at = match st.opened_at {
                    Some(t) => t,
                    // Open without a timestamp cannot happen via the public
                    // API; treat it as an expired cooldown.
                    None => return Ok(self.begin_probe(&mut st)),
                };
                if opened_at.elapsed() > self.cfg.reset_timeout {
                    Ok(self.begin_probe(&mut st))
                } else {
                    let remaining = self.cfg.reset_timeout.saturating_sub(opened_at.elapsed());
                    Err(Error::ServiceUnavailable {
                        retry_after_ms: Some(remaining.as_millis() as u64),
                    })
                }
            }
            CircuitState::HalfOpen => {
                if st.probe_in_flight {
                    // Only one probe at a time; everyone else still fails fast.
                    Err(Error::ServiceUnavailable {
                        retry_after_ms: None,
                    })
                } else {
                    st.probe_in_flight = true;
                    Ok(CallPermit::new(self, true))
                }
            }
        }
    }

    fn begin_probe(&self, st: &mut State) -> CallPermit<'_> {
        st.circuit = CircuitState::HalfOpen;
        st.probe_in_flight = true;
        CallPermit::new(self, true)
    }

    /// Release the probe slot without recording an outcome. The circuit
    /// stays Half-Open; the next attempt becomes the new probe.
    fn abandon_probe(&self) {
        let mut st = self.lock();
        if st.circuit == CircuitState::HalfOpen {
            st.probe_in_flight = false;
        }
    }

    /// Record a successful call: close the circuit and reset failures.
    pub fn record_success(&self) {
        let mut st = self.lock();
        st.circuit = CircuitState::Closed;
        st.consecutive_failures = 0;
        st.opened_at = None;
        st.probe_in_flight = false;
    }

    /// Record a failed call. Opens the circuit at the threshold, and
    /// re-opens it immediately when the Half-Open probe fails.
    pub fn record_failure(&self) {
        let mut st = self.lock();
        st.consecutive_failures = st.consecutive_failures.saturating_add(1);
        st.probe_in_flight = false;
        let tripped = st.consecutive_failures >= self.cfg.max_failures;
        if tripped || st.circuit == CircuitState::HalfOpen {
            st.circuit = CircuitState::Open;
            st.opened_at = Some(Instant::now());
        }
    }

    /// Current stored state, without triggering the open-to-half-open check.
    pub fn state(&self) -> CircuitState {
        self.lock().circuit
    }

    pub fn snapshot(&self) -> CircuitBreakerSnapshot {
        let now = Instant::now();
        let st = self.lock();
        let open_remaining_ms = match (st.circuit, st.opened_at) {
            (CircuitState::Open, Some(opened_at)) => {
                let deadline = opened_at + self.cfg.reset_timeout;
                if deadline > now {
                    Some((deadline - now).as_millis() as u64)
                } else {
                    None
                }
            }
            _ => None,
        };
        CircuitBreakerSnapshot {
            state: st.circuit,
            max_failures: self.cfg.max_failures,
            reset_timeout_ms: self.cfg.reset_timeout.as_millis() as u64,
            consecutive_failures: st.consecutive_failures,
            open_remaining_ms,
        }
    }

    /// Check if a request is allowed, discarding the permit.
    pub fn allow_request(&self) -> bool {
        self.allow().is_ok()
    }
}

/// Admission for one call attempt.
///
/// Consume the permit with [`record_success`](CallPermit::record_success)
/// or [`record_failure`](CallPermit::record_failure). If the permit is
/// dropped with neither — the attempt was cancelled before the provider
/// answered — a Half-Open probe slot is released rather than held forever.
#[must_use = "record the call outcome on the permit"]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    probe: bool,
    outcome_recorded: bool,
}

impl<'a> CallPermit<'a> {
    fn new(breaker: &'a CircuitBreaker, probe: bool) -> Self {
        Self {
            breaker,
            probe,
            outcome_recorded: false,
        }
    }

    /// Whether this permit is the Half-Open probe.
    pub fn is_probe(&self) -> bool {
        self.probe
    }

    pub fn record_success(mut self) {
        self.outcome_recorded = true;
        self.breaker.record_success();
    }

    pub fn record_failure(mut self) {
        self.outcome_recorded = true;
        self.breaker.record_failure();
    }
}

impl std::fmt::Debug for CallPermit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallPermit")
            .field("probe", &self.probe)
            .field("outcome_recorded", &self.outcome_recorded)
            .finish()
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.outcome_recorded && self.probe {
            self.breaker.abandon_probe();
        }
    }
}
