pub mod circuit_breaker;
pub mod codes;
pub mod locks;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};
pub use codes::{scrambled_code, CodeSequence};
pub use locks::KeyedLocks;
pub use retry::{retry_on_transient, IsTransient, RetryConfig, RetryOutcome, RetryResult};
