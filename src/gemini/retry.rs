use super::GenerationError;
use log::warn;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// retries after the first attempt
    pub max_retries: u32,
    /// wait before the first retry, doubled for each following one
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(2),
        }
    }
}

/// Blocks the calling thread between attempts.
pub trait Sleeper {
    fn sleep(&self, delay: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        thread::sleep(delay);
    }
}

/// Progress of one generation call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallState {
    Requesting { attempt: u32 },
    Retrying { attempt: u32, delay: Duration },
    Succeeded,
    Failed { message: String },
}

/// Runs `call` until it succeeds, fails with a non-transient error, or the retries are spent.
pub fn with_retry<T, F>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    observer: &dyn Fn(&CallState),
    mut call: F,
) -> Result<T, GenerationError>
where
    F: FnMut() -> Result<T, GenerationError>,
{
    let mut delay = policy.initial_backoff;
    let mut attempt = 1;

    loop {
        observer(&CallState::Requesting { attempt });
        let err = match call() {
            Ok(value) => {
                observer(&CallState::Succeeded);
                return Ok(value);
            }
            Err(err) => err,
        };

        if err.is_transient() && attempt <= policy.max_retries {
            warn!("request failed ({}), retrying in {:?}", err, delay);
            observer(&CallState::Retrying { attempt, delay });
            sleeper.sleep(delay);
            delay *= 2;
            attempt += 1;
            continue;
        }

        let err = if err.is_rate_limited() {
            GenerationError::Overloaded
        } else {
            err
        };
        observer(&CallState::Failed {
            message: err.to_string(),
        });
        return Err(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingSleeper(RefCell<Vec<Duration>>);

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, delay: Duration) {
            self.0.borrow_mut().push(delay);
        }
    }

    fn api(status: u16) -> GenerationError {
        GenerationError::Api {
            status,
            message: String::from("boom"),
        }
    }

    #[test]
    fn retries_transient_errors_with_doubling_backoff() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let result = with_retry(&RetryPolicy::default(), &sleeper, &|_| {}, || {
            calls += 1;
            if calls < 3 {
                Err(api(429))
            } else {
                Ok("done")
            }
        });

        assert_eq!(result.unwrap(), "done");
        assert_eq!(
            *sleeper.0.borrow(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[test]
    fn exhausted_rate_limit_becomes_overloaded() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let result: Result<(), _> = with_retry(&RetryPolicy::default(), &sleeper, &|_| {}, || {
            calls += 1;
            Err(api(429))
        });

        assert!(matches!(result, Err(GenerationError::Overloaded)));
        assert_eq!(calls, 4);
        assert_eq!(
            *sleeper.0.borrow(),
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
    }

    #[test]
    fn exhausted_unavailable_keeps_raw_error() {
        let sleeper = RecordingSleeper::default();
        let result: Result<(), _> =
            with_retry(&RetryPolicy::default(), &sleeper, &|_| {}, || Err(api(503)));
        assert!(matches!(result, Err(GenerationError::Api { status: 503, .. })));
        assert_eq!(sleeper.0.borrow().len(), 3);
    }

    #[test]
    fn other_errors_propagate_immediately() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let result: Result<(), _> = with_retry(&RetryPolicy::default(), &sleeper, &|_| {}, || {
            calls += 1;
            Err(api(400))
        });
        assert!(matches!(result, Err(GenerationError::Api { status: 400, .. })));
        assert_eq!(calls, 1);
        assert!(sleeper.0.borrow().is_empty());
    }

    #[test]
    fn quota_message_is_reported_as_overload() {
        let sleeper = RecordingSleeper::default();
        let result: Result<(), _> = with_retry(&RetryPolicy::default(), &sleeper, &|_| {}, || {
            Err(GenerationError::Api {
                status: 403,
                message: String::from("quota exceeded for project"),
            })
        });
        assert!(matches!(result, Err(GenerationError::Overloaded)));
        assert!(sleeper.0.borrow().is_empty());
    }

    #[test]
    fn observer_sees_state_transitions() {
        let states = RefCell::new(Vec::new());
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let _ = with_retry(
            &RetryPolicy::default(),
            &sleeper,
            &|s| states.borrow_mut().push(s.clone()),
            || {
                calls += 1;
                if calls == 1 {
                    Err(api(503))
                } else {
                    Ok(())
                }
            },
        );

        assert_eq!(
            states.into_inner(),
            vec![
                CallState::Requesting { attempt: 1 },
                CallState::Retrying {
                    attempt: 1,
                    delay: Duration::from_secs(2)
                },
                CallState::Requesting { attempt: 2 },
                CallState::Succeeded,
            ]
        );
    }
}
