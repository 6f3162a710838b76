//! Acquisition and publishing pipeline.
//!
//! The pieces here assemble into one flow: [`warmup`] brings the broker and
//! sensor bank online, [`particulate`] keeps the latest PMS frame in a
//! [`slot`], [`aggregator`] folds all sensors into one reading per cycle and
//! [`publisher`] pushes that reading to the broker on a fixed cadence.

pub mod aggregator;
pub mod discovery;
pub mod error;
pub mod particulate;
pub mod publisher;
pub mod reading;
pub mod sensors;
pub mod shutdown;
pub mod slot;
pub mod warmup;
