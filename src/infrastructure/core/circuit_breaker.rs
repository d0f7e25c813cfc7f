use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls pass through
    Closed,
    /// Calls are rejected until the cool-down elapses
    Open,
    /// Probing: successes close the circuit, a failure reopens it
    HalfOpen,
}

/// Thresholds of a circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSettings {
    /// Consecutive failures that open the circuit
    pub failure_threshold: usize,
    /// Consecutive half-open successes that close it again
    pub success_threshold: usize,
    pub cool_down: Duration,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 3,
            cool_down: Duration::from_secs(60),
        }
    }
}

/// Clock-free state machine; the breaker feeds it `Instant`s
#[derive(Debug)]
struct BreakerCore {
    settings: BreakerSettings,
    state: CircuitState,
    failures: usize,
    successes: usize,
    opened_at: Option<Instant>,
}

impl BreakerCore {
    fn new(settings: BreakerSettings) -> Self {
        Self {
            settings,
            state: CircuitState::Closed,
            failures: 0,
            successes: 0,
            opened_at: None,
        }
    }

    /// `Err(remaining)` while open and cooling down
    fn admit(&mut self, now: Instant) -> Result<Option<CircuitState>, Duration> {
        if self.state != CircuitState::Open {
            return Ok(None);
        }
        let elapsed = self
            .opened_at
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or(self.settings.cool_down);
        if elapsed >= self.settings.cool_down {
            self.state = CircuitState::HalfOpen;
            self.successes = 0;
            Ok(Some(CircuitState::HalfOpen))
        } else {
            Err(self.settings.cool_down - elapsed)
        }
    }

    fn record_success(&mut self) -> Option<CircuitState> {
        match self.state {
            CircuitState::HalfOpen => {
                self.successes += 1;
                if self.successes >= self.settings.success_threshold {
                    self.state = CircuitState::Closed;
                    self.failures = 0;
                    self.successes = 0;
                    return Some(CircuitState::Closed);
                }
                None
            }
            _ => {
                self.failures = 0;
                None
            }
        }
    }

    fn record_failure(&mut self, now: Instant) -> Option<CircuitState> {
        self.failures += 1;
        match self.state {
            CircuitState::Closed if self.failures >= self.settings.failure_threshold => {
                self.trip(now);
                Some(CircuitState::Open)
            }
            CircuitState::HalfOpen => {
                self.trip(now);
                Some(CircuitState::Open)
            }
            _ => None,
        }
    }

    fn trip(&mut self, now: Instant) {
        self.state = CircuitState::Open;
        self.successes = 0;
        self.opened_at = Some(now);
    }
}

/// Stops hammering an upstream that keeps failing.
///
/// Shared by every worker that talks to the same endpoint.
pub struct CircuitBreaker {
    name: String,
    core: Mutex<BreakerCore>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, settings: BreakerSettings) -> Self {
        Self {
            name: name.into(),
            core: Mutex::new(BreakerCore::new(settings)),
        }
    }

    /// Runs `f` unless the circuit is open
    pub async fn call<F, T, E>(&self, f: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: std::future::Future<Output = Result<T, E>>,
    {
        {
            let mut core = self.core.lock().await;
            match core.admit(Instant::now()) {
                Ok(Some(_)) => info!("CircuitBreaker [{}]: Open -> HalfOpen, probing", self.name),
                Ok(None) => {}
                Err(remaining) => {
                    return Err(CircuitBreakerError::Open(format!(
                        "Circuit breaker [{}] is open. Retry in {:?}",
                        self.name, remaining
                    )));
                }
            }
        }

        let result = f.await;

        let mut core = self.core.lock().await;
        match result {
            Ok(value) => {
                if core.record_success() == Some(CircuitState::Closed) {
                    info!("CircuitBreaker [{}]: HalfOpen -> Closed", self.name);
                }
                Ok(value)
            }
            Err(e) => {
                let was_half_open = core.state == CircuitState::HalfOpen;
                if core.record_failure(Instant::now()) == Some(CircuitState::Open) {
                    if was_half_open {
                        warn!("CircuitBreaker [{}]: HalfOpen -> Open, trial call failed", self.name);
                    } else {
                        error!(
                            "CircuitBreaker [{}]: Closed -> Open after {} failures",
                            self.name, core.failures
                        );
                    }
                }
                Err(CircuitBreakerError::Inner(e))
            }
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.core.lock().await.state
    }
}

/// Error type for circuit breaker
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error("Circuit breaker is open: {0}")]
    Open(String),

    #[error(transparent)]
    Inner(E),
}
