//! # Vlansmith
//!
//! Declarative VLAN, port-security and DHCP-snooping provisioning for
//! Cisco IOS access switches.
//!
//! A deployment file describes each switch twice over: how to reach it
//! (host, credentials, enable secret) and what it should look like
//! (VLANs, access ranges, the designated active port per VLAN, the
//! uplink trunk, DHCP snooping, Spanning Tree mode). Vlansmith renders
//! that intent into an ordered IOS command sequence and drives it over
//! an SSH session provided by [ferrissh]; prompt detection, paging
//! suppression and the privilege-escalation handshake all live in the
//! driver.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vlansmith::{Deployment, IosConnector, provision};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let deployment = Deployment::load("campus.toml")?;
//!     let device = deployment.device("sw1")?;
//!     let intent = device.intent()?;
//!
//!     let report = provision(&IosConnector, "sw1", device, &intent, true).await?;
//!     println!("{}", report.verification);
//!     Ok(())
//! }
//! ```
//!
//! [ferrissh]: https://docs.rs/ferrissh

pub mod deploy;
pub mod error;
pub mod intent;
pub mod orchestrator;
pub mod platform;
pub mod session;

// Re-export main types for convenience
pub use deploy::{Deployment, Device};
pub use error::{
    CommandError, ConnectionError, DeploymentError, Error, IntentError, Result,
};
pub use intent::{
    DhcpSnoopingPlan, Interface, PortRange, PortSecurity, PortSet, RateLimit, StpMode,
    SwitchIntent, SwitchIntentBuilder, TrunkPlan, ViolationAction, VlanId, VlanPlan,
};
pub use orchestrator::{
    Connector, IosConnector, ProvisionError, ProvisionReport, ProvisionState, Step, provision,
};
pub use session::{IosSession, SwitchSession, Transcript, TranscriptEntry};
