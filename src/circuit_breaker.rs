use failsafe::{backoff, failure_policy, Config, StateMachine};
use std::time::Duration;

/// Breaker type guarding the market-price service.
pub type PriceCircuitBreaker =
    StateMachine<failure_policy::ConsecutiveFailures<backoff::Exponential>, ()>;

/// Consecutive failures that open the price breaker.
pub const PRICE_FAILURE_THRESHOLD: u32 = 5;

/// Creates the circuit breaker wrapped around market-price lookups.
///
/// # Configuration
///
/// - **Failure threshold**: 5 consecutive failures (errors, timeouts, 429s) trigger OPEN state.
/// - **Backoff**: Exponential backoff from 30s to 5min before attempting recovery.
///
/// While OPEN every lookup resolves to "no price" without touching the network.
pub fn create_price_circuit_breaker() -> PriceCircuitBreaker {
    let backoff_strategy = backoff::exponential(
        Duration::from_secs(30),  // Initial delay
        Duration::from_secs(300), // Maximum delay
    );

    let failure_policy =
        failure_policy::consecutive_failures(PRICE_FAILURE_THRESHOLD, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}
