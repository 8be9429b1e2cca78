//! Deployment file loading: device credentials and per-device intent.
//!
//! One TOML file declares every switch of a deployment. Each entry
//! carries the connection parameters consumed by the session layer and
//! the declarative intent consumed by the renderer:
//!
//! ```toml
//! [devices.sw1]
//! host = "192.168.1.2"
//! username = "admin"
//! password = "cisco"
//! secret = "class"
//! hostname = "SW1"
//! stp_mode = "rapid-pvst"
//!
//! [[devices.sw1.vlans]]
//! id = 10
//! name = "alumnos"
//! access = "fa0/1-8"
//! active = "fa0/1"
//! port_security = { maximum = 1, violation = "shutdown", sticky = true }
//!
//! [devices.sw1.trunk]
//! port = "fa0/24"
//!
//! [devices.sw1.dhcp_snooping]
//! rate_limit = { ports = "fa0/1", pps = 15 }
//! ```
//!
//! Passwords and enable secrets deserialize into [`SecretString`] and
//! are redacted from `Debug` output.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;

use crate::error::DeploymentError;
use crate::intent::{DhcpSnoopingPlan, StpMode, SwitchIntent, TrunkPlan, VlanPlan};

/// A whole deployment: named devices in declaration order.
#[derive(Debug, Deserialize)]
pub struct Deployment {
    pub devices: IndexMap<String, Device>,
}

impl Deployment {
    /// Load a deployment from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DeploymentError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| DeploymentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| DeploymentError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a deployment from TOML text.
    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Look up a device by name.
    pub fn device(&self, name: &str) -> Result<&Device, DeploymentError> {
        self.devices
            .get(name)
            .ok_or_else(|| DeploymentError::UnknownDevice(name.to_string()))
    }
}

/// One device entry: connection parameters plus declarative intent.
#[derive(Debug, Deserialize)]
pub struct Device {
    // -- connection parameters --
    /// Hostname or IP address.
    pub host: String,

    /// SSH port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Login username.
    pub username: String,

    /// Login password.
    pub password: SecretString,

    /// Enable secret, when it differs from the login password.
    #[serde(default)]
    pub secret: Option<SecretString>,

    /// Device type selecting the platform definition.
    #[serde(default = "default_device_type")]
    pub device_type: String,

    /// Operation timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // -- intent --
    /// Hostname to configure on the device.
    #[serde(default)]
    pub hostname: Option<String>,

    /// VLAN plans in declaration order.
    #[serde(default)]
    pub vlans: Vec<VlanPlan>,

    /// Uplink trunk.
    #[serde(default)]
    pub trunk: Option<TrunkPlan>,

    /// DHCP snooping activation.
    #[serde(default)]
    pub dhcp_snooping: Option<DhcpSnoopingPlan>,

    /// Spanning Tree mode.
    #[serde(default)]
    pub stp_mode: Option<StpMode>,
}

impl Device {
    /// Build and validate the configuration intent for this device.
    pub fn intent(&self) -> Result<SwitchIntent, crate::error::IntentError> {
        let mut builder = SwitchIntent::builder();
        if let Some(hostname) = &self.hostname {
            builder = builder.hostname(hostname.clone());
        }
        for vlan in &self.vlans {
            builder = builder.vlan(vlan.clone());
        }
        if let Some(trunk) = &self.trunk {
            builder = builder.trunk(trunk.clone());
        }
        if let Some(snooping) = &self.dhcp_snooping {
            builder = builder.dhcp_snooping(snooping.clone());
        }
        if let Some(mode) = self.stp_mode {
            builder = builder.stp_mode(mode);
        }
        builder.build()
    }
}

fn default_port() -> u16 {
    22
}

fn default_device_type() -> String {
    "cisco_ios".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
        [devices.sw1]
        host = "192.168.1.2"
        username = "admin"
        password = "tr0ub4dor"
        secret = "en4ble-pw"
        hostname = "SW1"
        stp_mode = "rapid-pvst"

        [[devices.sw1.vlans]]
        id = 10
        name = "alumnos"
        access = "fa0/1-8"
        active = "fa0/1"
        port_security = { maximum = 1, violation = "shutdown", sticky = true }

        [[devices.sw1.vlans]]
        id = 20
        name = "docentes"
        access = "fa0/9-16"

        [devices.sw1.trunk]
        port = "fa0/24"

        [devices.sw1.dhcp_snooping]
        rate_limit = { ports = "fa0/1,fa0/9", pps = 15 }

        [devices.sw2]
        host = "192.168.1.3"
        port = 2222
        username = "admin"
        password = "cisco"
    "#;

    #[test]
    fn test_parse_sample() {
        let deployment = Deployment::parse(SAMPLE).unwrap();
        assert_eq!(deployment.devices.len(), 2);

        let sw1 = deployment.device("sw1").unwrap();
        assert_eq!(sw1.host, "192.168.1.2");
        assert_eq!(sw1.port, 22);
        assert_eq!(sw1.device_type, "cisco_ios");
        assert_eq!(sw1.password.expose_secret(), "tr0ub4dor");
        assert_eq!(sw1.secret.as_ref().unwrap().expose_secret(), "en4ble-pw");
        assert_eq!(sw1.vlans.len(), 2);
        assert_eq!(sw1.stp_mode, Some(crate::intent::StpMode::RapidPvst));

        let sw2 = deployment.device("sw2").unwrap();
        assert_eq!(sw2.port, 2222);
        assert!(sw2.secret.is_none());
        assert!(sw2.vlans.is_empty());
    }

    #[test]
    fn test_intent_built_from_entry() {
        let deployment = Deployment::parse(SAMPLE).unwrap();
        let intent = deployment.device("sw1").unwrap().intent().unwrap();
        assert_eq!(intent.hostname(), Some("SW1"));
        assert_eq!(intent.vlans().len(), 2);
        assert!(intent.trunk().is_some());
        let lines = intent.render();
        assert!(lines.iter().any(|l| l == "switchport trunk allowed vlan 10,20"));
    }

    #[test]
    fn test_invalid_intent_surfaces_on_build() {
        let raw = r#"
            [devices.bad]
            host = "10.0.0.1"
            username = "admin"
            password = "x"

            [[devices.bad.vlans]]
            id = 10
            name = "a"
            access = "fa0/1-8"

            [[devices.bad.vlans]]
            id = 20
            name = "b"
            access = "fa0/5-12"
        "#;
        let deployment = Deployment::parse(raw).unwrap();
        // Parsing succeeds; the overlap is an intent-level error.
        assert!(deployment.device("bad").unwrap().intent().is_err());
    }

    #[test]
    fn test_unknown_device() {
        let deployment = Deployment::parse(SAMPLE).unwrap();
        assert!(matches!(
            deployment.device("sw9"),
            Err(DeploymentError::UnknownDevice(_))
        ));
    }

    #[test]
    fn test_secrets_redacted_in_debug() {
        let deployment = Deployment::parse(SAMPLE).unwrap();
        let debug = format!("{:?}", deployment.device("sw1").unwrap());
        assert!(!debug.contains("tr0ub4dor"));
        assert!(!debug.contains("en4ble-pw"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let deployment = Deployment::load(file.path()).unwrap();
        assert!(deployment.device("sw1").is_ok());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Deployment::load("/nonexistent/campus.toml"),
            Err(DeploymentError::Read { .. })
        ));
    }

    #[test]
    fn test_bad_vlan_id_rejected_at_parse() {
        let raw = r#"
            [devices.sw1]
            host = "10.0.0.1"
            username = "admin"
            password = "x"

            [[devices.sw1.vlans]]
            id = 1002
            name = "reserved"
            access = "fa0/1"
        "#;
        assert!(Deployment::parse(raw).is_err());
    }
}
