//! The source of "now" for handlers that depend on the current date.

use std::fmt::Debug;

use time::{Date, OffsetDateTime, UtcOffset};

use crate::{
    Error,
    timezone::{get_local_offset, get_offset_at},
};

/// Provides the current date and time.
pub trait Clock: Debug + Send + Sync {
    /// The current date and time in the server's local timezone.
    fn now(&self) -> OffsetDateTime;

    /// The current date in the server's local timezone.
    fn today(&self) -> Date {
        self.now().date()
    }
}

/// A clock that reads the system time and converts it to a local timezone.
#[derive(Debug, Clone)]
pub struct SystemClock {
    timezone: String,
}

impl SystemClock {
    /// Create a clock for the canonical timezone name `timezone`, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidTimezoneError] if `timezone` is not a known timezone.
    pub fn new(timezone: &str) -> Result<Self, Error> {
        match get_local_offset(timezone) {
            Some(_) => Ok(Self {
                timezone: timezone.to_owned(),
            }),
            None => Err(Error::InvalidTimezoneError(timezone.to_owned())),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let offset = get_offset_at(&self.timezone, now).unwrap_or_else(|| {
            tracing::error!(
                "Could not get the offset for timezone \"{}\", falling back to UTC",
                self.timezone
            );
            UtcOffset::UTC
        });

        now.to_offset(offset)
    }
}

/// A clock that always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}
