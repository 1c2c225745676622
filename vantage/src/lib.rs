#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod collector;
pub mod error;
pub mod export;
pub mod histogram;
pub mod key;
pub mod measure;
pub mod tag;
pub mod view;

mod aggregator;
mod interval;
mod registry;
mod value;

pub use aggregator::AggregationData;
pub use collector::{Collector, ExportPeriod};
pub use error::Error;
pub use export::{ExportWorker, Row, ViewData, ViewSubscriber};
pub use key::Signature;
pub use measure::Measure;
pub use tag::{Tag, TagKey, TagSet, TagSetBuilder};
pub use view::{Aggregation, ViewDescriptor, Window};
