//! Serial port discovery for the HQ device
//!
//! Enumerates the serial ports the OS knows about and picks the first one
//! whose description names a USB-serial chip or board the HQ firmware runs
//! on. Selection is a pure function over [`PortDescriptor`]s so it can be
//! tested without hardware.
//!
//! Enumeration uses sysfs on Linux; enable the `libudev` feature for richer
//! USB descriptions (requires `libudev-dev` and `pkg-config`).

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Chip and board names found in the descriptions of supported devices
pub const DEFAULT_DEVICE_IDENTIFIERS: &[&str] = &[
    "ARDUINO",
    "CH340",
    "CH341",
    "CP210",
    "CP2102",
    "FT232",
    "USB-SERIAL",
    "UART",
    "USB2.0-SERIAL",
];

/// A serial port as shown to operators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDescriptor {
    /// OS path or name (e.g. `/dev/ttyUSB0`, `COM3`)
    pub name: String,
    /// Human-readable description
    pub description: String,
}

impl PortDescriptor {
    /// Create a descriptor
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Describe a port reported by the OS
    fn from_serial_port(port: &serialport::SerialPortInfo) -> Self {
        use serialport::SerialPortType;

        let description = match &port.port_type {
            SerialPortType::UsbPort(usb_info) => describe_usb(
                usb_info.product.as_deref(),
                usb_info.manufacturer.as_deref(),
            ),
            SerialPortType::PciPort => "PCI".to_string(),
            SerialPortType::BluetoothPort => "Bluetooth".to_string(),
            SerialPortType::Unknown => "n/a".to_string(),
        };

        Self::new(port.port_name.clone(), description)
    }

    /// Whether the description contains any of `identifiers`, ignoring case
    pub fn matches<S: AsRef<str>>(&self, identifiers: &[S]) -> bool {
        let description = self.description.to_uppercase();
        identifiers
            .iter()
            .any(|id| description.contains(&id.as_ref().to_uppercase()))
    }
}

fn describe_usb(product: Option<&str>, manufacturer: Option<&str>) -> String {
    product
        .or(manufacturer)
        .map(str::to_string)
        .unwrap_or_else(|| "USB".to_string())
}

/// First port, in enumeration order, whose description matches
pub fn select_port<'a, S: AsRef<str>>(
    ports: &'a [PortDescriptor],
    identifiers: &[S],
) -> Option<&'a PortDescriptor> {
    ports.iter().find(|port| port.matches(identifiers))
}

/// Enumerate every serial port
///
/// Enumeration failures are logged and yield an empty list.
pub fn list_ports() -> Vec<PortDescriptor> {
    match serialport::available_ports() {
        Ok(ports) => ports.iter().map(PortDescriptor::from_serial_port).collect(),
        Err(e) => {
            warn!(error = %e, "Failed to enumerate serial ports");
            Vec::new()
        }
    }
}

/// Find the HQ device among the current ports using `identifiers`
pub fn find_device<S: AsRef<str>>(identifiers: &[S]) -> Option<String> {
    let ports = list_ports();
    for port in &ports {
        debug!(port = %port.name, description = %port.description, "Found serial port");
    }

    match select_port(&ports, identifiers) {
        Some(port) => {
            info!(port = %port.name, description = %port.description, "Found LiFi device");
            Some(port.name.clone())
        }
        None => {
            warn!(count = ports.len(), "No serial port matched a known LiFi device");
            None
        }
    }
}

/// Find the HQ device using the built-in vocabulary
pub fn discover() -> Option<String> {
    find_device(DEFAULT_DEVICE_IDENTIFIERS)
}
