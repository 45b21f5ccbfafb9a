use meterread::{MeterClient, QueryIdentity};
use std::time::Duration;

#[tokio::main]
pub async fn main() {
    let identity = QueryIdentity {
        device_type: "HMG-50".into(),
        battery_mac: "AABBCCDDEEFF".into(),
        ct_type: "HME-4".into(),
        ct_mac: "112233445566".into(),
    };
    let client = MeterClient::new("192.168.1.60", &identity).unwrap();
    loop {
        match client.fetch().await {
            Ok(report) => println!(
                "grid: {:?} W, battery: {:?} W, rssi: {:?} dBm",
                report.total_power_w(),
                report.battery_power_w(),
                report.wifi_rssi_dbm()
            ),
            Err(err) => println!("meter unavailable: {err}"),
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
}
