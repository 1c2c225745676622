//! Measure descriptors identify the quantities an application records.

/// A named quantity values are recorded for, such as request latency.
///
/// Measure names are unique per [`Collector`]; registering a second,
/// different descriptor under an existing name is rejected.
///
/// [`Collector`]: crate::Collector
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Measure {
    name: String,
    description: String,
    unit: String,
}

impl Measure {
    /// Create a descriptor.
    ///
    /// `unit` is a free-form annotation carried through to exporters, for
    /// example `"ms"` or `"By"`.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            unit: unit.into(),
        }
    }

    /// The unique measure name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Unit annotation.
    pub fn unit(&self) -> &str {
        &self.unit
    }
}
