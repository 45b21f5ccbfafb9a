//! Read grid power and battery charge data from Marstek CT power meters /
//! battery controllers over the local network.
//!
//! The meter answers a proprietary length-prefixed, XOR-checksummed UDP
//! request/response protocol on port 12345. A query carries the identity of a
//! meter/battery pair; the reply is a `|`-separated ASCII field list with
//! per-phase power, charge/discharge energy counters and Wi-Fi signal
//! strength, from which a signed net battery power is derived.
//!
//! Currently the following data can be accessed:
//!
//! - Grid power, total and per phase (W)
//! - Battery charge/discharge power, total and per phase (W)
//! - Net battery power, positive while discharging (W)
//! - Charge counters
//! - Meter Wi-Fi signal strength (dBm)
//!
//! # Example
//!
//! ```no_run
//! # use std::time::Duration;
//! # use meterread::{MeterClient, QueryIdentity};
//! #
//! # #[tokio::main]
//! # pub async fn main() {
//!     let identity = QueryIdentity {
//!         device_type: "HMG-50".into(),
//!         battery_mac: "AABBCCDDEEFF".into(),
//!         ct_type: "HME-4".into(),
//!         ct_mac: "112233445566".into(),
//!     };
//!     let client = MeterClient::new("192.168.1.60", &identity).unwrap();
//!     loop {
//!         match client.fetch().await {
//!             Ok(report) => println!("grid: {:?} W", report.total_power_w()),
//!             Err(err) => println!("meter unavailable: {err}"),
//!         }
//!         tokio::time::sleep(Duration::from_secs(5)).await;
//!     }
//! # }
//! ```

mod error;
mod frame;
mod meter_client;
mod meter_report;

pub use error::Error;
pub use frame::QueryIdentity;
pub use meter_client::MeterClient;
pub use meter_report::{FieldValue, MeterReport, BATTERY_POWER, FIELD_LABELS};
