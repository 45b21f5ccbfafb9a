//! Query a meter once and print every reported field.
//!
//! Usage: `meterread <host> <device_type> <battery_mac> <ct_type> <ct_mac>`
//!
//! Hardware addresses must be given without separators, e.g. `AABBCCDDEEFF`.

use anyhow::{bail, Context};
use meterread::{MeterClient, QueryIdentity};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [host, device_type, battery_mac, ct_type, ct_mac] = args.as_slice() else {
        bail!("usage: meterread <host> <device_type> <battery_mac> <ct_type> <ct_mac>");
    };

    let identity = QueryIdentity {
        device_type: device_type.clone(),
        battery_mac: battery_mac.clone(),
        ct_type: ct_type.clone(),
        ct_mac: ct_mac.clone(),
    };
    let client = MeterClient::new(host.clone(), &identity)?;

    let report = client.fetch().await.context("meter query failed")?;
    for (label, value) in report.fields() {
        match value {
            Some(value) => println!("{label}: {value}"),
            None => println!("{label}: -"),
        }
    }

    Ok(())
}
