//! Declarative configuration intent for one access switch.
//!
//! An intent describes *what* a switch should look like — VLANs, access
//! ranges, the designated active port per VLAN, the uplink trunk, DHCP
//! snooping and Spanning Tree mode — without any command text. The
//! [`SwitchIntent::render`] stage turns it into ordered IOS
//! configuration lines; nothing else in the crate produces command
//! strings.
//!
//! Construction goes through [`SwitchIntentBuilder`], which enforces the
//! structural invariants: unique VLAN ids, non-overlapping access
//! ranges, designated ports inside their range, and a trunk uplink that
//! is not claimed by any access range.

pub mod ports;
mod render;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::IntentError;

pub use ports::{Interface, PortRange, PortSet};

/// A VLAN id in the usable range (1-4094, excluding the reserved
/// 1002-1005 block).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct VlanId(u16);

impl VlanId {
    pub fn new(id: u16) -> Result<Self, IntentError> {
        match id {
            1..=1001 | 1006..=4094 => Ok(Self(id)),
            _ => Err(IntentError::InvalidVlanId(id)),
        }
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for VlanId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u16::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// What the switch does when port-security sees one MAC too many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationAction {
    Shutdown,
    Restrict,
    Protect,
}

impl fmt::Display for ViolationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Shutdown => "shutdown",
            Self::Restrict => "restrict",
            Self::Protect => "protect",
        };
        f.write_str(s)
    }
}

/// Port-security constraints for a designated access port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortSecurity {
    /// Maximum number of learned MAC addresses.
    pub maximum: u8,

    /// Action on violation.
    pub violation: ViolationAction,

    /// Learn addresses sticky (retained in running-config).
    pub sticky: bool,
}

impl Default for PortSecurity {
    fn default() -> Self {
        Self {
            maximum: 1,
            violation: ViolationAction::Shutdown,
            sticky: true,
        }
    }
}

/// One VLAN and the access ports assigned to it.
#[derive(Debug, Clone, Deserialize)]
pub struct VlanPlan {
    /// Numeric VLAN id.
    pub id: VlanId,

    /// VLAN name label.
    pub name: String,

    /// Access-port range assigned to this VLAN.
    pub access: PortRange,

    /// Designated active port. When set, port-security attaches here
    /// and the remaining ports of the range can be shut down.
    #[serde(default)]
    pub active: Option<Interface>,

    /// Port-security on the designated port.
    #[serde(default)]
    pub port_security: Option<PortSecurity>,

    /// Administratively shut down the non-designated ports of the
    /// range. Only meaningful together with `active`.
    #[serde(default = "default_true")]
    pub shutdown_unused: bool,
}

/// The inter-switch uplink.
#[derive(Debug, Clone, Deserialize)]
pub struct TrunkPlan {
    /// Uplink interface carrying tagged traffic.
    pub port: Interface,

    /// Mark the uplink as a DHCP-snooping trusted port.
    #[serde(default = "default_true")]
    pub dhcp_trust: bool,
}

/// DHCP-snooping activation for the device.
///
/// The per-VLAN list is always derived from the declared VLAN set, never
/// spelled out by hand.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DhcpSnoopingPlan {
    /// Additional trusted ports beyond the trunk uplink.
    #[serde(default)]
    pub trusted: PortSet,

    /// Rate limit applied to a set of untrusted ports.
    #[serde(default)]
    pub rate_limit: Option<RateLimit>,
}

/// DHCP packet rate limit over a set of ports.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimit {
    pub ports: PortSet,
    pub pps: u16,
}

/// Spanning Tree operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StpMode {
    RapidPvst,
    Pvst,
    Mst,
}

impl fmt::Display for StpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RapidPvst => "rapid-pvst",
            Self::Pvst => "pvst",
            Self::Mst => "mst",
        };
        f.write_str(s)
    }
}

/// Validated configuration intent for one switch.
///
/// Construct via [`SwitchIntent::builder`]; the builder owns all
/// invariant checks, so an existing `SwitchIntent` is always internally
/// consistent.
#[derive(Debug, Clone)]
pub struct SwitchIntent {
    hostname: Option<String>,
    vlans: Vec<VlanPlan>,
    trunk: Option<TrunkPlan>,
    dhcp_snooping: Option<DhcpSnoopingPlan>,
    stp_mode: Option<StpMode>,
}

impl SwitchIntent {
    pub fn builder() -> SwitchIntentBuilder {
        SwitchIntentBuilder::default()
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    pub fn vlans(&self) -> &[VlanPlan] {
        &self.vlans
    }

    pub fn trunk(&self) -> Option<&TrunkPlan> {
        self.trunk.as_ref()
    }

    pub fn dhcp_snooping(&self) -> Option<&DhcpSnoopingPlan> {
        self.dhcp_snooping.as_ref()
    }

    pub fn stp_mode(&self) -> Option<StpMode> {
        self.stp_mode
    }

    /// Declared VLAN ids, in declaration order.
    pub fn vlan_ids(&self) -> Vec<VlanId> {
        self.vlans.iter().map(|v| v.id).collect()
    }
}

/// Builder for [`SwitchIntent`]. Validation happens in [`Self::build`].
#[derive(Debug, Default)]
pub struct SwitchIntentBuilder {
    hostname: Option<String>,
    vlans: Vec<VlanPlan>,
    trunk: Option<TrunkPlan>,
    dhcp_snooping: Option<DhcpSnoopingPlan>,
    stp_mode: Option<StpMode>,
}

impl SwitchIntentBuilder {
    /// Set the device hostname directive.
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Declare a VLAN plan. Declaration order is preserved in the
    /// rendered output.
    pub fn vlan(mut self, plan: VlanPlan) -> Self {
        self.vlans.push(plan);
        self
    }

    /// Declare the uplink trunk.
    pub fn trunk(mut self, plan: TrunkPlan) -> Self {
        self.trunk = Some(plan);
        self
    }

    /// Enable DHCP snooping.
    pub fn dhcp_snooping(mut self, plan: DhcpSnoopingPlan) -> Self {
        self.dhcp_snooping = Some(plan);
        self
    }

    /// Select the Spanning Tree mode.
    pub fn stp_mode(mut self, mode: StpMode) -> Self {
        self.stp_mode = Some(mode);
        self
    }

    /// Validate and build the intent.
    pub fn build(self) -> Result<SwitchIntent, IntentError> {
        for (i, vlan) in self.vlans.iter().enumerate() {
            // Unique ids
            if let Some(dup) = self.vlans[..i].iter().find(|v| v.id == vlan.id) {
                return Err(IntentError::DuplicateVlan(dup.id.get()));
            }

            // Non-overlapping access ranges
            for earlier in &self.vlans[..i] {
                if let Some(shared) = earlier.access.first_overlap(&vlan.access) {
                    return Err(IntentError::OverlappingRanges {
                        first: earlier.id.get(),
                        second: vlan.id.get(),
                        interface: shared.to_string(),
                    });
                }
            }

            // Designated port must sit inside its own range
            if let Some(active) = &vlan.active {
                if !vlan.access.contains(active) {
                    return Err(IntentError::PortOutsideRange {
                        port: active.to_string(),
                        vlan: vlan.id.get(),
                    });
                }
            } else if vlan.port_security.is_some() {
                return Err(IntentError::PortSecurityWithoutActive {
                    vlan: vlan.id.get(),
                });
            }
        }

        // The uplink cannot double as an access port
        if let Some(trunk) = &self.trunk {
            for vlan in &self.vlans {
                if vlan.access.contains(&trunk.port) {
                    return Err(IntentError::TrunkInAccessRange {
                        port: trunk.port.to_string(),
                        vlan: vlan.id.get(),
                    });
                }
            }
        }

        Ok(SwitchIntent {
            hostname: self.hostname,
            vlans: self.vlans,
            trunk: self.trunk,
            dhcp_snooping: self.dhcp_snooping,
            stp_mode: self.stp_mode,
        })
    }
}

fn default_true() -> bool {
    true
}
