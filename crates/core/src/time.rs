use chrono::{DateTime, Utc};

/// Where session start and completion timestamps come from.
///
/// The system clock is the default; a frozen clock returns one instant forever,
/// which keeps recorded summaries reproducible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock {
    frozen: Option<DateTime<Utc>>,
}

impl Clock {
    #[must_use]
    pub fn system() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn frozen_at(at: DateTime<Utc>) -> Self {
        Self { frozen: Some(at) }
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.frozen.unwrap_or_else(Utc::now)
    }
}

/// 2023-11-14T22:13:20Z, the instant test sessions start and complete at.
///
/// # Panics
///
/// Panics if the timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).expect("fixed timestamp should be valid")
}

#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::frozen_at(fixed_now())
}
