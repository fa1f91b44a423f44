// Keypair Generator Port
// Abstraction over the external vanity-search tool

use crate::domain::GeneratedKeypair;
use async_trait::async_trait;
use thiserror::Error;

/// Generation errors.
///
/// None of these are retried; the scheduler fails the whole job with the
/// message verbatim.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Failed to start generator: {0}")]
    SpawnFailed(String),

    #[error("Generation timed out after {0}ms")]
    Timeout(u64),

    #[error("Generator exited with code {exit_code:?}: {output}")]
    ToolFailure {
        exit_code: Option<i32>,
        output: String,
    },

    #[error("Could not parse generator output: {0}")]
    ParseFailure(String),

    #[error("Keypair integrity check failed: {0}")]
    IntegrityFailure(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// Keypair Generator trait
///
/// Implementations:
/// - ToolGenerator: spawns the external search binary (infra-system)
/// - MockGenerator: scripted behavior for tests
#[async_trait]
pub trait KeypairGenerator: Send + Sync {
    /// Produce one keypair whose public key ends with `suffix`
    ///
    /// # Errors
    /// - GenerationError::Timeout if the search exceeds `timeout_ms`
    /// - GenerationError::ToolFailure on a non-zero exit
    /// - GenerationError::ParseFailure if the output lacks an address or key
    /// - GenerationError::IntegrityFailure if the key does not match the address
    async fn generate_one(
        &self,
        suffix: &str,
        timeout_ms: u64,
    ) -> Result<GeneratedKeypair, GenerationError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    /// Mock generator behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Always succeed
        Success,
        /// Always fail with the given error
        Fail(GenerationError),
        /// Succeed until the given 1-based call, which fails
        FailOnCall(usize, GenerationError),
    }

    /// Mock generator for testing
    ///
    /// A gated mock blocks every call until a permit is handed out with
    /// `allow`, or until `release` opens the gate for good. This keeps jobs
    /// `running` long enough for tests to observe the queue.
    pub struct MockGenerator {
        behavior: Mutex<MockBehavior>,
        delay: Duration,
        gate: Option<Semaphore>,
        call_count: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockGenerator {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Mutex::new(behavior),
                delay: Duration::ZERO,
                gate: None,
                call_count: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        pub fn new_success() -> Self {
            Self::new(MockBehavior::Success)
        }

        pub fn new_fail(error: GenerationError) -> Self {
            Self::new(MockBehavior::Fail(error))
        }

        /// Calls block until `allow` or `release` is called
        pub fn new_gated() -> Self {
            let mut generator = Self::new_success();
            generator.gate = Some(Semaphore::new(0));
            generator
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn set_behavior(&self, behavior: MockBehavior) {
            *self.behavior.lock().unwrap() = behavior;
        }

        /// Let `calls` more calls proceed
        pub fn allow(&self, calls: usize) {
            if let Some(gate) = &self.gate {
                gate.add_permits(calls);
            }
        }

        /// Let all blocked and future calls proceed
        pub fn release(&self) {
            if let Some(gate) = &self.gate {
                gate.close();
            }
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        pub fn in_flight(&self) -> usize {
            self.in_flight.load(Ordering::SeqCst)
        }

        /// Highest number of simultaneous calls observed
        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl KeypairGenerator for MockGenerator {
        async fn generate_one(
            &self,
            suffix: &str,
            _timeout_ms: u64,
        ) -> Result<GeneratedKeypair, GenerationError> {
            let call = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
            let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

            if let Some(gate) = &self.gate {
                // A closed gate means released: every acquire fails immediately
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let behavior = self.behavior.lock().unwrap().clone();
            match behavior {
                MockBehavior::Success => Ok(mock_keypair(call, suffix)),
                MockBehavior::Fail(err) => Err(err),
                MockBehavior::FailOnCall(n, err) if n == call => Err(err),
                MockBehavior::FailOnCall(_, _) => Ok(mock_keypair(call, suffix)),
            }
        }
    }

    fn mock_keypair(call: usize, suffix: &str) -> GeneratedKeypair {
        GeneratedKeypair {
            public_key: format!("Mock{}{}", call, suffix),
            secret_key: format!("MockSecret{}", call),
            elapsed_ms: 1,
            tool_elapsed_seconds: Some(0.001),
        }
    }
}
