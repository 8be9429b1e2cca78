//! Error types for vlansmith.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for vlansmith operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Intent construction errors
    #[error("Intent error: {0}")]
    Intent(#[from] IntentError),

    /// Deployment file errors
    #[error("Deployment error: {0}")]
    Deployment(#[from] DeploymentError),

    /// Connection and authentication errors
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Command execution errors
    #[error("Command error: {0}")]
    Command(#[from] CommandError),
}

/// Errors raised while validating a configuration intent.
#[derive(Error, Debug)]
pub enum IntentError {
    /// VLAN id outside the usable range
    #[error("Invalid VLAN id {0}: must be 1-4094 and outside the reserved 1002-1005 block")]
    InvalidVlanId(u16),

    /// Two VLAN plans declare the same id
    #[error("Duplicate VLAN id {0}")]
    DuplicateVlan(u16),

    /// Interface or range spec could not be parsed
    #[error("Invalid interface spec '{spec}': {reason}")]
    InvalidInterface { spec: String, reason: String },

    /// Access ranges of two VLANs share a port
    #[error("Access ranges of VLANs {first} and {second} overlap at {interface}")]
    OverlappingRanges {
        first: u16,
        second: u16,
        interface: String,
    },

    /// The designated active port is not part of its VLAN's access range
    #[error("Designated port {port} is outside the access range of VLAN {vlan}")]
    PortOutsideRange { port: String, vlan: u16 },

    /// The trunk uplink is also claimed by an access range
    #[error("Trunk port {port} collides with the access range of VLAN {vlan}")]
    TrunkInAccessRange { port: String, vlan: u16 },

    /// Port-security declared without a port to attach it to
    #[error("VLAN {vlan} declares port-security but no designated active port")]
    PortSecurityWithoutActive { vlan: u16 },
}

/// Errors raised while loading the deployment file.
#[derive(Error, Debug)]
pub enum DeploymentError {
    /// Deployment file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Deployment file could not be parsed
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Requested device is not declared in the file
    #[error("Unknown device '{0}'")]
    UnknownDevice(String),
}

/// Transport-level errors (reachability, authentication, privilege).
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Driver could not be constructed from the device parameters
    #[error("Invalid connection parameters for {host}: {source}")]
    InvalidParameters {
        host: String,
        #[source]
        source: ferrissh::Error,
    },

    /// Host unreachable or SSH handshake failed
    #[error("Failed to reach {host}:{port}: {source}")]
    Unreachable {
        host: String,
        port: u16,
        #[source]
        source: ferrissh::Error,
    },

    /// SSH authentication rejected
    #[error("Authentication failed for user '{user}' on {host}")]
    AuthenticationFailed { host: String, user: String },

    /// The enable handshake did not reach privileged exec
    #[error("Privilege escalation failed on {host}")]
    EnableFailed {
        host: String,
        #[source]
        source: Option<ferrissh::Error>,
    },

    /// Device type has no platform definition
    #[error("Unsupported device type '{0}'")]
    UnsupportedDeviceType(String),

    /// Transport failed while closing the session
    #[error("Failed to close session to {host}: {source}")]
    CloseFailed {
        host: String,
        #[source]
        source: ferrissh::Error,
    },
}

/// Errors raised while executing commands on an open session.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Device rejected a configuration line or query
    #[error("Device rejected '{command}': {message}")]
    Rejected { command: String, message: String },

    /// Transport failed mid-exchange
    #[error("Transport error during command exchange: {0}")]
    Transport(#[from] ferrissh::Error),
}

/// Result type alias using vlansmith's Error.
pub type Result<T> = std::result::Result<T, Error>;
