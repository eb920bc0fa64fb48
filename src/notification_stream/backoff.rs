use anyhow::bail;
use rand::Rng;
use std::{fmt::Display, str::FromStr, time::Duration};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackoffKind {
    Fixed,
    Exponential,
}

impl FromStr for BackoffKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "exponential" | "exp" => Ok(Self::Exponential),
            other => bail!("unknown backoff: {other}"),
        }
    }
}

impl Display for BackoffKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BackoffKind::Fixed => "fixed",
            BackoffKind::Exponential => "exponential",
        };

        write!(f, "{}", s)
    }
}

/// Wait between the end of one session and the next connection attempt.
#[derive(Clone, Debug)]
pub struct Backoff {
    pub kind: BackoffKind,
    pub base: Duration,
    /// Ceiling for exponential growth (jitter excluded).
    pub max: Duration,
    /// Consecutive failed sessions before giving up. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Backoff {
    pub fn fixed(delay: Duration) -> Self {
        Self {
            kind: BackoffKind::Fixed,
            base: delay,
            max: delay,
            max_attempts: None,
        }
    }

    /// Delay before reconnect number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match self.kind {
            BackoffKind::Fixed => self.base,
            BackoffKind::Exponential => {
                let exp = attempt.saturating_sub(1).min(16);
                let raw = self.base.saturating_mul(1 << exp).min(self.max);

                // up to 20% on top
                let jitter_ms = raw.as_millis() as u64 / 5;
                if jitter_ms == 0 {
                    return raw;
                }
                raw + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
            }
        }
    }

    pub fn exhausted(&self, attempt: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempt >= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_never_grows() {
        let b = Backoff::fixed(Duration::from_secs(30));
        for attempt in [1, 2, 10, 1_000, u32::MAX] {
            assert_eq!(b.delay(attempt), Duration::from_secs(30));
        }
        assert!(!b.exhausted(u32::MAX));
    }

    #[test]
    fn exponential_doubles_up_to_cap() {
        let b = Backoff {
            kind: BackoffKind::Exponential,
            base: Duration::from_secs(1),
            max: Duration::from_secs(10),
            max_attempts: None,
        };

        let first = b.delay(1);
        assert!(first >= Duration::from_secs(1) && first <= Duration::from_millis(1_200));

        let third = b.delay(3);
        assert!(third >= Duration::from_secs(4) && third <= Duration::from_millis(4_800));

        let capped = b.delay(50);
        assert!(capped >= Duration::from_secs(10) && capped <= Duration::from_secs(12));
    }

    #[test]
    fn attempt_cap() {
        let b = Backoff {
            max_attempts: Some(3),
            ..Backoff::fixed(Duration::from_secs(1))
        };
        assert!(!b.exhausted(2));
        assert!(b.exhausted(3));
    }

    #[test]
    fn parses_kind() {
        assert_eq!("Fixed".parse::<BackoffKind>().unwrap(), BackoffKind::Fixed);
        assert_eq!("exp".parse::<BackoffKind>().unwrap(), BackoffKind::Exponential);
        assert!("linear".parse::<BackoffKind>().is_err());
        assert_eq!(BackoffKind::Exponential.to_string(), "exponential");
    }
}
