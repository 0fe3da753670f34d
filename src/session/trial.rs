//! Time-bounded build check
//!
//! A build with a deadline refuses to run once the deadline has passed, or
//! when the clock reads earlier than the last recorded execution.

use chrono::{DateTime, Utc};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialStatus {
    Valid,
    Expired,
}

pub fn check_trial(
    now: DateTime<Utc>,
    last_execution_ms: Option<i64>,
    deadline: Option<DateTime<Utc>>,
) -> TrialStatus {
    let Some(deadline) = deadline else {
        return TrialStatus::Valid;
    };

    let now_ms = now.timestamp_millis();
    if let Some(previous) = last_execution_ms {
        if now_ms < previous {
            warn!(
                "Clock is behind the last execution ({} < {}), treating build as expired",
                now_ms, previous
            );
            return TrialStatus::Expired;
        }
    }

    if now > deadline {
        warn!("Build deadline {} has passed", deadline);
        return TrialStatus::Expired;
    }

    TrialStatus::Valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_no_deadline_never_expires() {
        let now = at(10);
        let later = (now + Duration::days(1)).timestamp_millis();
        assert_eq!(check_trial(now, Some(later), None), TrialStatus::Valid);
    }

    #[test]
    fn test_before_deadline_is_valid() {
        let previous = at(1).timestamp_millis();
        assert_eq!(check_trial(at(2), Some(previous), Some(at(3))), TrialStatus::Valid);
        assert_eq!(check_trial(at(2), None, Some(at(3))), TrialStatus::Valid);
    }

    #[test]
    fn test_past_deadline_expires() {
        assert_eq!(check_trial(at(5), None, Some(at(3))), TrialStatus::Expired);
    }

    #[test]
    fn test_clock_rollback_expires() {
        let previous = at(2).timestamp_millis();
        assert_eq!(check_trial(at(1), Some(previous), Some(at(3))), TrialStatus::Expired);
    }
}
