//! Automotive sales analytics: synthetic sales data, filter selections and
//! the aggregations behind the dashboard views.

pub mod config;
pub mod data;
pub mod pipeline;
