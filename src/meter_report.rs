//! The decoded measurement set reported by the meter.

use crate::error::Error;
use crate::frame;

/// Labels of the 24 wire fields, in the order the device sends them.
///
/// The order is part of the protocol: segments of the response map onto these
/// labels by position. Do not reorder.
pub const FIELD_LABELS: [&str; 24] = [
    "meter_dev_type",
    "meter_mac_code",
    "hhm_dev_type",
    "hhm_mac_code",
    "A_phase_power",
    "B_phase_power",
    "C_phase_power",
    "total_power",
    "A_chrg_nb",
    "B_chrg_nb",
    "C_chrg_nb",
    "ABC_chrg_nb",
    "wifi_rssi",
    "info_idx",
    "x_chrg_power",
    "A_chrg_power",
    "B_chrg_power",
    "C_chrg_power",
    "ABC_chrg_power",
    "x_dchrg_power",
    "A_dchrg_power",
    "B_dchrg_power",
    "C_dchrg_power",
    "ABC_dchrg_power",
];

/// Label of the derived net-battery-power field.
///
/// Not sent by the device; computed as `ABC_dchrg_power - ABC_chrg_power`,
/// so discharging is positive and charging negative.
pub const BATTERY_POWER: &str = "battery_power";

/// A single reported value. Most fields are numeric, but some (device type,
/// hardware addresses) are opaque identifiers kept as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Int(i64),
    Text(String),
}

impl FieldValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// One complete reading from the meter.
///
/// Every label in [`FIELD_LABELS`] is present in every report; fields the
/// device did not send (short response, empty segment) carry `None` rather
/// than being omitted. The derived [`BATTERY_POWER`] field is appended last.
#[derive(Debug, Clone)]
pub struct MeterReport {
    values: Vec<Option<FieldValue>>,
}

impl MeterReport {
    /// Decode a raw response datagram into a report.
    pub(crate) fn decode(data: &[u8]) -> Result<Self, Error> {
        let message = frame::extract_message(data)?;

        // The message starts with a separator, so the first split segment
        // is empty and carries no field.
        let mut segments = message.split('|');
        segments.next();
        let segments: Vec<&str> = segments.collect();

        let mut values: Vec<Option<FieldValue>> = (0..FIELD_LABELS.len())
            .map(|i| segments.get(i).and_then(|s| parse_field(s)))
            .collect();

        let battery_power = match (
            values[field_index("ABC_dchrg_power")].as_ref().and_then(FieldValue::as_int),
            values[field_index("ABC_chrg_power")].as_ref().and_then(FieldValue::as_int),
        ) {
            (Some(discharge), Some(charge)) => Some(FieldValue::Int(discharge - charge)),
            _ => None,
        };
        values.push(battery_power);

        Ok(Self { values })
    }

    /// Look up a field by label. Returns `None` for an unknown label or for
    /// a known field the device did not report.
    pub fn get(&self, label: &str) -> Option<&FieldValue> {
        if label == BATTERY_POWER {
            return self.values[FIELD_LABELS.len()].as_ref();
        }
        FIELD_LABELS
            .iter()
            .position(|&l| l == label)
            .and_then(|i| self.values[i].as_ref())
    }

    /// All fields in wire order, derived field last.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, Option<&FieldValue>)> + '_ {
        FIELD_LABELS
            .iter()
            .copied()
            .chain(std::iter::once(BATTERY_POWER))
            .zip(self.values.iter().map(Option::as_ref))
    }

    fn int(&self, label: &str) -> Option<i64> {
        self.get(label).and_then(FieldValue::as_int)
    }

    /// Total grid power in watts, summed over all phases.
    pub fn total_power_w(&self) -> Option<i64> {
        self.int("total_power")
    }

    /// Grid power in watts per phase, in phase order A, B, C.
    pub fn phase_power_w(&self) -> [Option<i64>; 3] {
        [
            self.int("A_phase_power"),
            self.int("B_phase_power"),
            self.int("C_phase_power"),
        ]
    }

    /// Net battery power in watts. Positive while discharging, negative
    /// while charging.
    pub fn battery_power_w(&self) -> Option<i64> {
        self.int(BATTERY_POWER)
    }

    /// Meter Wi-Fi signal strength in dBm.
    pub fn wifi_rssi_dbm(&self) -> Option<i64> {
        self.int("wifi_rssi")
    }
}

fn field_index(label: &str) -> usize {
    FIELD_LABELS
        .iter()
        .position(|&l| l == label)
        .unwrap_or_else(|| unreachable!("unknown wire label {label}"))
}

fn parse_field(segment: &str) -> Option<FieldValue> {
    if segment.is_empty() {
        return None;
    }
    match segment.parse::<i64>() {
        Ok(v) => Some(FieldValue::Int(v)),
        Err(_) => Some(FieldValue::Text(segment.to_owned())),
    }
}
