//! Wait for a remote resource to reach a target state.

use ::std::time::Duration;

use ::atlas_common::{
    error::{ProviderError, Result},
    resource::{ObservedState, StateSet},
    serde::Deserialize,
    tokio::time::{sleep, timeout},
    tracing::{debug, info, warn},
};

use crate::observer::StateObserver;

/// First backoff step between two observations.
const BASE_BACKOFF: Duration = Duration::from_millis(100);
/// Backoff never grows past this.
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// What the poller does when an observation fails with an error
/// other than not-found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(crate = "atlas_common::serde")]
#[serde(tag = "type")]
pub enum ObservationErrorPolicy {
    /// Stop waiting and return the error.
    #[default]
    Abort,
    /// Keep polling through transient errors (transport failures,
    /// throttling, 5xx), up to `max_consecutive` in a row.
    /// Other errors still abort.
    RetryTransient { max_consecutive: u32 },
}

impl ObservationErrorPolicy {
    fn tolerates(&self, error: &ProviderError, consecutive: u32) -> bool {
        match self {
            Self::Abort => false,
            Self::RetryTransient { max_consecutive } => {
                error.is_transient() && consecutive <= *max_consecutive
            }
        }
    }
}

/// Parameters of one wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSpec {
    pub pending: StateSet,
    pub target: StateSet,
    /// Deadline measured from the start of the wait, initial delay included.
    pub timeout: Duration,
    pub min_interval: Duration,
    pub initial_delay: Duration,
    pub on_observation_error: ObservationErrorPolicy,
}

impl PollSpec {
    /// Sleep before observation number `attempt + 1`.
    fn interval_after(&self, attempt: u32) -> Duration {
        let backoff = 1u32
            .checked_shl(attempt)
            .map_or(MAX_BACKOFF, |factor| BASE_BACKOFF.saturating_mul(factor))
            .min(MAX_BACKOFF);
        backoff.max(self.min_interval)
    }
}

/// Observe until the state is in `spec.target`.
///
/// # Return
/// - `Ok(Some(snapshot))` once a target state is observed.
/// - `Ok(None)` if the target was reached by the resource disappearing.
/// - `Err(ProviderError::UnexpectedState { .. })` on a state outside `pending` and `target`.
/// - `Err(ProviderError::ObservationFailed { .. })` when an observation fails
///   and the policy does not tolerate it.
/// - `Err(ProviderError::Timeout { .. })` once `spec.timeout` elapsed.
pub async fn wait_for_state<O: StateObserver>(
    observer: &O,
    spec: &PollSpec,
) -> Result<Option<O::Snapshot>> {
    let mut last_state = None;
    let outcome = timeout(spec.timeout, poll(observer, spec, &mut last_state)).await;
    match outcome {
        Ok(result) => result,
        Err(_) => {
            warn!(
                "Gave up waiting for {} after {:?}",
                observer.resource(),
                spec.timeout
            );
            Err(ProviderError::Timeout {
                resource: observer.resource(),
                timeout: spec.timeout,
                last_state,
            })
        }
    }
}

async fn poll<O: StateObserver>(
    observer: &O,
    spec: &PollSpec,
    last_state: &mut Option<ObservedState>,
) -> Result<Option<O::Snapshot>> {
    info!(
        "Waiting for {} to reach {}",
        observer.resource(),
        spec.target
    );
    // state changes are not visible right after the mutating call
    sleep(spec.initial_delay).await;

    let mut attempt = 0;
    let mut consecutive_errors = 0;
    loop {
        match observer.observe().await {
            Ok(observation) => {
                consecutive_errors = 0;
                let state = observation.state().clone();
                *last_state = Some(state.clone());
                if spec.target.contains(&state) {
                    info!("{} reached {}", observer.resource(), state);
                    return Ok(observation.into_snapshot());
                }
                if !spec.pending.contains(&state) {
                    return Err(ProviderError::UnexpectedState {
                        resource: observer.resource(),
                        state,
                        expected: spec.pending.union(&spec.target),
                    });
                }
                debug!("{} still {}", observer.resource(), state);
            }
            Err(error) => {
                consecutive_errors += 1;
                if !spec.on_observation_error.tolerates(&error, consecutive_errors) {
                    return Err(ProviderError::ObservationFailed {
                        resource: observer.resource(),
                        source: Box::new(error),
                    });
                }
                warn!(
                    "Transient error #{} while observing {}: {}",
                    consecutive_errors,
                    observer.resource(),
                    error
                );
            }
        }
        sleep(spec.interval_after(attempt)).await;
        attempt += 1;
    }
}
