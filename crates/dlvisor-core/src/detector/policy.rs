use std::fmt;
use std::time::Duration;

use super::FailureKind;
use crate::config::RestartConfig;
use crate::job::JobRuntimeState;

/// Why a running attempt is abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartCause {
    /// Throughput stayed below the floor for too many samples.
    Slow,
    Failure(FailureKind),
    /// Engine exited non-zero.
    ExitCode(i32),
    /// Engine could not be started.
    SpawnFailed,
}

impl fmt::Display for RestartCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestartCause::Slow => f.write_str("Reached slow speed limit"),
            RestartCause::Failure(kind) => write!(f, "{kind}"),
            RestartCause::ExitCode(code) => write!(f, "Engine exited with status {code}"),
            RestartCause::SpawnFailed => f.write_str("Engine failed to start"),
        }
    }
}

/// Outcome of a restart request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    /// Respawn after `delay`; `remaining` restarts are left after this one.
    Respawn { delay: Duration, remaining: u32 },
    /// Budget exhausted: the job is failed for good.
    GiveUp,
}

impl RestartDecision {
    /// Status text for this decision.
    pub fn describe(&self, cause: RestartCause) -> String {
        match self {
            RestartDecision::Respawn { remaining, .. } => {
                format!("{cause}, restarting (remaining: {remaining})")
            }
            RestartDecision::GiveUp => format!("{cause}, restart limit reached"),
        }
    }
}

/// Bounded restart budget with exponential backoff between respawns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestartPolicy {
    pub restart_limit: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

/// Used when the configured base delay is not a representable duration.
const FALLBACK_BASE_DELAY: Duration = Duration::from_millis(500);

fn base_delay(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or_else(|e| {
        tracing::warn!(secs, error = %e, "invalid restart base delay; using default");
        FALLBACK_BASE_DELAY
    })
}

impl RestartPolicy {
    pub fn from_config(config: &RestartConfig) -> Self {
        Self {
            restart_limit: config.restart_limit,
            base_delay: base_delay(config.base_delay_secs),
            max_delay: Duration::from_secs(config.max_delay_secs),
        }
    }

    /// Decide for the `restart_count`-th restart (1-based, already counted).
    pub fn decide(&self, restart_count: u32) -> RestartDecision {
        if restart_count > self.restart_limit {
            return RestartDecision::GiveUp;
        }
        // base * 2^(n-1), capped.
        let exp = 1u32 << restart_count.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(exp).min(self.max_delay);
        RestartDecision::Respawn {
            delay,
            remaining: self.restart_limit - restart_count,
        }
    }

    /// Count a restart on `state` and decide. Giving up marks the job failed.
    pub fn restart(&self, state: &mut JobRuntimeState) -> RestartDecision {
        let count = state.begin_restart();
        let decision = self.decide(count);
        if decision == RestartDecision::GiveUp {
            state.mark_failed();
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Stage;

    fn policy(limit: u32) -> RestartPolicy {
        RestartPolicy {
            restart_limit: limit,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }

    #[test]
    fn unrepresentable_base_delay_falls_back() {
        for secs in [f64::INFINITY, 1e300, f64::NAN] {
            let config = RestartConfig {
                base_delay_secs: secs,
                ..RestartConfig::default()
            };
            let p = RestartPolicy::from_config(&config);
            assert!(p.base_delay <= FALLBACK_BASE_DELAY, "secs = {secs}");
        }
        let negative = RestartConfig {
            base_delay_secs: -3.0,
            ..RestartConfig::default()
        };
        assert_eq!(RestartPolicy::from_config(&negative).base_delay, Duration::ZERO);
    }

    #[test]
    fn infinite_base_delay_parses_from_toml() {
        let config: RestartConfig = toml::from_str("base_delay_secs = inf").unwrap();
        let p = RestartPolicy::from_config(&config);
        assert_eq!(p.base_delay, FALLBACK_BASE_DELAY);
    }

    #[test]
    fn backoff_doubles_and_is_capped() {
        let p = policy(20);
        let delays: Vec<Duration> = (1..=7)
            .map(|n| match p.decide(n) {
                RestartDecision::Respawn { delay, .. } => delay,
                RestartDecision::GiveUp => panic!("expected respawn"),
            })
            .collect();
        assert_eq!(delays[0], Duration::from_millis(500));
        assert_eq!(delays[1], Duration::from_secs(1));
        assert_eq!(delays[2], Duration::from_secs(2));
        assert_eq!(delays[5], Duration::from_secs(10));
        assert_eq!(delays[6], Duration::from_secs(10));
    }

    #[test]
    fn remaining_budget_counts_down() {
        let p = policy(3);
        assert!(matches!(p.decide(1), RestartDecision::Respawn { remaining: 2, .. }));
        assert!(matches!(p.decide(3), RestartDecision::Respawn { remaining: 0, .. }));
        assert_eq!(p.decide(4), RestartDecision::GiveUp);
    }

    #[test]
    fn job_fails_only_when_restarting_at_the_limit() {
        let p = policy(2);
        let mut state = JobRuntimeState::new();
        state.advance_to(Stage::Primary);
        assert!(matches!(p.restart(&mut state), RestartDecision::Respawn { .. }));
        assert!(matches!(p.restart(&mut state), RestartDecision::Respawn { .. }));
        assert_eq!(state.restart_count(), 2);
        assert_eq!(state.stage(), Stage::Primary);
        assert_eq!(p.restart(&mut state), RestartDecision::GiveUp);
        assert_eq!(state.restart_count(), 3);
        assert_eq!(state.stage(), Stage::Failed);
    }

    #[test]
    fn zero_limit_gives_up_on_first_restart() {
        let p = policy(0);
        let mut state = JobRuntimeState::new();
        assert_eq!(p.restart(&mut state), RestartDecision::GiveUp);
        assert_eq!(state.restart_count(), 1);
    }

    #[test]
    fn describe_names_cause_and_budget() {
        let d = RestartDecision::Respawn {
            delay: Duration::ZERO,
            remaining: 4,
        };
        assert_eq!(
            d.describe(RestartCause::Failure(FailureKind::Forbidden)),
            "Received HTTP Error 403, restarting (remaining: 4)"
        );
        assert_eq!(
            RestartDecision::GiveUp.describe(RestartCause::Slow),
            "Reached slow speed limit, restart limit reached"
        );
    }
}
