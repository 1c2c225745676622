// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

use std::fmt::Debug;
use std::sync::Arc;
use std::time::SystemTime;

/// Fake clocks for testing.
///
/// To enable this module, you must enable the `test-util` feature.
#[cfg(feature = "test-util")]
pub mod fakes;

/// Trait for providing custom wall-clock behavior.
///
/// Implementors can be used to replace the system clock for testing or
/// specialized use cases.
pub trait Clock: Send + Sync + Debug {
    /// Get the current wall-clock time.
    fn now(&self) -> SystemTime;
}

/// Handle to a source of wall-clock time.
///
/// `TimeSource` is cheap to clone and is passed by value to the components
/// that need it. The default is the system clock.
#[derive(Clone, Default)]
pub enum TimeSource {
    /// Use the system clock.
    #[default]
    System,
    /// Use a custom [`Clock`] implementation.
    Custom(Arc<dyn Clock>),
}

impl Debug for TimeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "TimeSource::System"),
            Self::Custom(_) => write!(f, "TimeSource::Custom(..)"),
        }
    }
}

impl TimeSource {
    /// Get the current wall-clock time from this time source.
    ///
    /// # Examples
    ///
    /// ```
    /// use vantage_timesource::TimeSource;
    ///
    /// let ts = TimeSource::System;
    /// let now = ts.now();
    /// ```
    pub fn now(&self) -> SystemTime {
        match self {
            Self::System => SystemTime::now(),
            Self::Custom(clock) => clock.now(),
        }
    }

    /// Create a new `TimeSource` backed by a custom [`Clock`].
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
    pub fn custom(clock: impl Clock + 'static) -> TimeSource {
        Self::Custom(Arc::new(clock))
    }
}
