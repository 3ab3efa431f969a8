//! Inventory device records.
//!
//! A [`Device`] is owned by the inventory service.  The editor never mutates
//! one: when a device is dropped onto the canvas, a value copy is stored in
//! the new node's payload and travels with the canvas from then on.
//!
//! Field names and enum spellings match the inventory service's JSON so a
//! device can be passed through the drag-and-drop payload verbatim.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Hardware category of a lab device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceType {
    Firewall,
    Switch,
    Router,
    TrafficShaper,
    Other,
}

/// Domain classification that partitions devices into two worlds.
///
/// PHYSICAL devices can only be wired to PHYSICAL devices and CLOUD devices
/// only to CLOUD devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TopologyType {
    Physical,
    Cloud,
}

impl TopologyType {
    /// Returns the wire spelling (`"PHYSICAL"` or `"CLOUD"`).
    pub fn as_str(self) -> &'static str {
        match self {
            TopologyType::Physical => "PHYSICAL",
            TopologyType::Cloud => "CLOUD",
        }
    }
}

impl fmt::Display for TopologyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Availability of a device in the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceStatus {
    Available,
    Reserved,
    Offline,
    Maintenance,
}

/// A lab device as published by the inventory service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Inventory identifier (a UUID string on the service side).
    pub id: String,
    /// Display name shown on the node.
    pub name: String,
    pub device_type: DeviceType,
    pub topology_type: TopologyType,
    pub status: DeviceStatus,
    #[serde(default)]
    pub location: Option<String>,
    /// Free-form hardware specification blob.
    #[serde(default)]
    pub specs: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub description: Option<String>,
    /// Opaque timestamp strings, kept so the copy round-trips unchanged.
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Device {
    /// Returns `true` if the picker may offer this device as a drag source.
    ///
    /// The editor itself does not re-check this on drop.
    pub fn is_placeable(&self) -> bool {
        self.status == DeviceStatus::Available
    }
}
