//! Concrete retailer adapters for the skincare matching gateway.
//!
//! Each adapter implements [`skinmatch_engine::traits::RetailerAdapter`] for one retailer/country
//! pair and owns its own [`RequestThrottle`], so one retailer's load never throttles another's.
//! Two variants are provided:
//!
//! * [`RainforestAdapter`]: API-backed Amazon adapter using the Rainforest product API.
//! * [`BootsAdapter`]: scrape-backed boots.com adapter using CSS-selector parsing.
//!
//! By contract, `live_check` never fails: an unreachable backend or unparseable page yields a
//! [`skinmatch_engine::traits::LiveResult`] with an error status instead.
mod boots;
mod config;
mod rainforest;
mod throttle;

pub use boots::BootsAdapter;
pub use config::{BootsConfig, RainforestConfig};
pub use rainforest::RainforestAdapter;
pub use throttle::RequestThrottle;
