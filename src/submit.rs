//! Decision delivery to the external sink.
//!
//! The target URL comes from a field of the matched row and is validated
//! before any network I/O. Delivery is bounded-retry with a linearly growing
//! delay; retries may duplicate delivery at the receiving end, which is
//! accepted, and no idempotency key is attached.
use crate::decision::Decision;
use anyhow::{anyhow, Context, Result};
use std::time::{Duration, Instant};
use ureq::Agent;

/// Terminal result of one submission run.
#[derive(Debug)]
pub enum SubmitOutcome {
    Delivered { attempts: u32 },
    InvalidTarget,
    Unreachable { attempts: u32, last_error: String },
}

/// Retry knobs for one submission run.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

/// Delay before retrying after failed attempt N: `base_delay * N`, so waits
/// grow strictly with each attempt.
pub fn backoff_delay(policy: &RetryPolicy, failed_attempt: u32) -> Duration {
    policy.base_delay * failed_attempt
}

/// Validate a raw target string as an absolute http(s) URL with a host.
/// Returns the trimmed URL, or `None` when it is not usable as a target.
pub fn parse_target(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let (scheme, rest) = trimmed.split_once("://")?;
    if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
        return None;
    }
    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    let host = authority.rsplit('@').next().unwrap_or("");
    let host = host.split(':').next().unwrap_or("");
    if host.is_empty() {
        return None;
    }
    Some(trimmed)
}

/// Delivers one decision body to a URL. The production implementation is
/// [`HttpSink`]; tests substitute a recording sink.
pub trait DecisionSink {
    fn deliver(&mut self, url: &str, decision: &Decision) -> Result<()>;
}

/// POSTs the decision as JSON over HTTP with a per-request timeout. Any
/// transport error or non-2xx response counts as a failed attempt.
pub struct HttpSink {
    agent: Agent,
}

impl HttpSink {
    pub fn new(request_timeout: Duration) -> HttpSink {
        let config = Agent::config_builder()
            .timeout_global(Some(request_timeout))
            .build();
        HttpSink {
            agent: config.into(),
        }
    }
}

impl DecisionSink for HttpSink {
    fn deliver(&mut self, url: &str, decision: &Decision) -> Result<()> {
        let start = Instant::now();
        let response = self
            .agent
            .post(url)
            .send_json(decision)
            .with_context(|| format!("post decision to {url}"))?;
        let status = response.status();
        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis(),
            status = status.as_u16(),
            "decision delivered"
        );
        if status.is_success() {
            Ok(())
        } else {
            Err(anyhow!("decision sink returned status {status}"))
        }
    }
}

/// Deliver `decision` to `raw_target`, retrying up to `policy.max_attempts`
/// times. An unusable target short-circuits with zero delivery attempts.
pub fn submit(
    sink: &mut dyn DecisionSink,
    raw_target: &str,
    decision: &Decision,
    policy: &RetryPolicy,
) -> SubmitOutcome {
    let Some(url) = parse_target(raw_target) else {
        return SubmitOutcome::InvalidTarget;
    };

    let mut last_error = "no delivery attempts allowed".to_string();
    for attempt in 1..=policy.max_attempts {
        match sink.deliver(url, decision) {
            Ok(()) => {
                tracing::info!(attempt, url, "decision accepted by sink");
                return SubmitOutcome::Delivered { attempts: attempt };
            }
            Err(err) => {
                last_error = format!("{err:#}");
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %last_error,
                    "decision delivery failed"
                );
                if attempt < policy.max_attempts {
                    std::thread::sleep(backoff_delay(policy, attempt));
                }
            }
        }
    }

    SubmitOutcome::Unreachable {
        attempts: policy.max_attempts,
        last_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{Decision, Outcome};

    fn decision() -> Decision {
        Decision {
            identifier: "AB-12".to_string(),
            outcome: Outcome::Approve,
            reason: String::new(),
            observed_status: "pending".to_string(),
            line_items: Vec::new(),
        }
    }

    struct FailingSink {
        attempts: u32,
    }

    impl DecisionSink for FailingSink {
        fn deliver(&mut self, _url: &str, _decision: &Decision) -> Result<()> {
            self.attempts += 1;
            Err(anyhow!("connection refused"))
        }
    }

    struct FlakySink {
        attempts: u32,
        succeed_on: u32,
    }

    impl DecisionSink for FlakySink {
        fn deliver(&mut self, _url: &str, _decision: &Decision) -> Result<()> {
            self.attempts += 1;
            if self.attempts >= self.succeed_on {
                Ok(())
            } else {
                Err(anyhow!("temporary failure"))
            }
        }
    }

    fn zero_delay(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_parse_target_accepts_absolute_http_urls() {
        assert_eq!(
            parse_target(" https://example.com/hook "),
            Some("https://example.com/hook")
        );
        assert_eq!(
            parse_target("http://example.com:8080/x?y=1"),
            Some("http://example.com:8080/x?y=1")
        );
    }

    #[test]
    fn test_parse_target_rejects_unusable_strings() {
        assert_eq!(parse_target("not a url"), None);
        assert_eq!(parse_target(""), None);
        assert_eq!(parse_target("ftp://example.com/x"), None);
        assert_eq!(parse_target("https:///missing-host"), None);
        assert_eq!(parse_target("example.com/hook"), None);
    }

    #[test]
    fn test_invalid_target_makes_zero_attempts() {
        let mut sink = FailingSink { attempts: 0 };
        let outcome = submit(&mut sink, "not a url", &decision(), &zero_delay(3));
        assert!(matches!(outcome, SubmitOutcome::InvalidTarget));
        assert_eq!(sink.attempts, 0);
    }

    #[test]
    fn test_exhausts_exactly_max_attempts() {
        let mut sink = FailingSink { attempts: 0 };
        let outcome = submit(&mut sink, "http://example.com/hook", &decision(), &zero_delay(3));
        match outcome {
            SubmitOutcome::Unreachable {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("connection refused"));
            }
            other => panic!("expected unreachable, got {other:?}"),
        }
        assert_eq!(sink.attempts, 3);
    }

    #[test]
    fn test_stops_retrying_after_success() {
        let mut sink = FlakySink {
            attempts: 0,
            succeed_on: 2,
        };
        let outcome = submit(&mut sink, "http://example.com/hook", &decision(), &zero_delay(5));
        assert!(matches!(outcome, SubmitOutcome::Delivered { attempts: 2 }));
        assert_eq!(sink.attempts, 2);
    }

    #[test]
    fn test_backoff_delay_grows_strictly() {
        let policy = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
        };
        let delays: Vec<Duration> = (1..4).map(|n| backoff_delay(&policy, n)).collect();
        assert_eq!(delays[0], Duration::from_millis(100));
        assert!(delays[1] > delays[0]);
        assert!(delays[2] > delays[1]);
    }
}
