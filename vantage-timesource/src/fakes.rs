// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use crate::Clock;

/// Simple static clock that always returns the same time.
#[derive(Debug)]
pub struct StaticClock {
    now: SystemTime,
}

impl StaticClock {
    /// Create a new `StaticClock` that always returns the given time.
    ///
    /// # Examples
    ///
    /// ```
    /// use vantage_timesource::{TimeSource, fakes::StaticClock};
    /// use std::time::UNIX_EPOCH;
    ///
    /// let ts = TimeSource::custom(StaticClock::at(UNIX_EPOCH));
    /// assert_eq!(ts.now(), UNIX_EPOCH);
    /// ```
    pub fn at(time: impl Into<SystemTime>) -> Self {
        Self { now: time.into() }
    }
}

impl Clock for StaticClock {
    fn now(&self) -> SystemTime {
        self.now
    }
}

/// Clock loaded with one time that can be moved forward (or set) through a
/// shared handle.
///
/// Clone the handle, hand one copy to the code under test, and keep the other
/// in the test body to drive time.
#[derive(Debug, Clone)]
pub struct ManualClock(Arc<Mutex<SystemTime>>);

impl ManualClock {
    /// Create a new `ManualClock` started at the given time.
    ///
    /// # Examples
    ///
    /// ```
    /// use vantage_timesource::{TimeSource, fakes::ManualClock};
    /// use std::time::{Duration, UNIX_EPOCH};
    ///
    /// let clock = ManualClock::starting_at(UNIX_EPOCH);
    /// let ts = TimeSource::custom(clock.clone());
    ///
    /// clock.advance(Duration::from_secs(100));
    /// assert_eq!(ts.now(), UNIX_EPOCH + Duration::from_secs(100));
    /// ```
    pub fn starting_at(time: impl Into<SystemTime>) -> Self {
        Self(Arc::new(Mutex::new(time.into())))
    }

    /// Move the clock forward by `elapsed`.
    pub fn advance(&self, elapsed: Duration) {
        let mut guard = self.0.lock().unwrap();
        *guard += elapsed;
    }

    /// Replace the loaded time entirely.
    ///
    /// Unlike [`Self::advance`] this can move the clock backwards, which is
    /// useful for exercising out-of-order timestamp handling.
    pub fn set(&self, time: impl Into<SystemTime>) {
        *self.0.lock().unwrap() = time.into();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.0.lock().unwrap()
    }
}
