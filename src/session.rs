//! Administrative device sessions.
//!
//! [`SwitchSession`] is the seam between the orchestrator and the SSH
//! automation library: apply a configuration batch, run a read-only
//! query, save the startup config, close. [`IosSession`] is the
//! production implementation over ferrissh's [`GenericDriver`]; tests
//! substitute their own implementation.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use ferrissh::{Driver, DriverBuilder, GenericDriver, InteractiveEvent};
use log::{debug, info};
use secrecy::ExposeSecret;

use crate::deploy::Device;
use crate::error::{CommandError, ConnectionError};
use crate::platform;

/// Saves running-config to startup-config.
pub const SAVE_COMMAND: &str = "write memory";

/// Read-only verification query; output is printed, never parsed.
pub const VERIFY_COMMAND: &str = "show vlan brief";

/// Ordered record of the commands sent in a batch and what the device
/// answered.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

/// One command/output pair.
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    pub command: String,
    pub output: String,
}

impl Transcript {
    pub fn push(&mut self, command: impl Into<String>, output: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            command: command.into(),
            output: output.into(),
        });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "> {}", entry.command)?;
            let output = entry.output.trim_end();
            if !output.is_empty() {
                writeln!(f, "{output}")?;
            }
        }
        Ok(())
    }
}

/// An open administrative session to one switch.
///
/// `close` must be called exactly once per opened session, on success
/// and failure paths alike; the orchestrator owns that discipline.
pub trait SwitchSession: Send {
    /// Send a configuration batch in order; returns the device's
    /// response transcript.
    fn apply(
        &mut self,
        commands: &[String],
    ) -> impl Future<Output = Result<Transcript, CommandError>> + Send;

    /// Run a single read-only query.
    fn query(
        &mut self,
        command: &str,
    ) -> impl Future<Output = Result<String, CommandError>> + Send;

    /// Persist running-config to startup-config.
    fn save(&mut self) -> impl Future<Output = Result<String, CommandError>> + Send;

    /// Terminate the transport.
    fn close(&mut self) -> impl Future<Output = Result<(), ConnectionError>> + Send;
}

/// Production session over a ferrissh driver.
pub struct IosSession {
    driver: GenericDriver,
    host: String,
}

impl IosSession {
    /// Open an authenticated session to `device` and elevate to
    /// privileged exec.
    pub async fn connect(device: &Device) -> Result<Self, ConnectionError> {
        let platform = platform::for_device_type(&device.device_type)?;
        let host = device.host.clone();

        let mut driver = DriverBuilder::new(&device.host)
            .port(device.port)
            .username(&device.username)
            .password(device.password.expose_secret())
            .custom_platform(platform)
            .timeout(Duration::from_secs(device.timeout_secs))
            .build()
            .await
            .map_err(|source| ConnectionError::InvalidParameters {
                host: host.clone(),
                source,
            })?;

        debug!("{host}: opening SSH session as {}", device.username);
        if let Err(source) = driver.open().await {
            return Err(match source {
                ferrissh::Error::Transport(
                    ferrissh::error::TransportError::AuthenticationFailed { user },
                ) => ConnectionError::AuthenticationFailed {
                    host: host.clone(),
                    user,
                },
                source => ConnectionError::Unreachable {
                    host: host.clone(),
                    port: device.port,
                    source,
                },
            });
        }

        let mut session = Self { driver, host };
        session.enable(device).await?;
        info!("{}: connected, privileged exec acquired", session.host);
        Ok(session)
    }

    /// Elevate to privileged exec.
    ///
    /// When the device carries a distinct enable secret, the handshake
    /// is driven interactively; ferrissh's own escalation answers the
    /// enable prompt with the login password, which only works when the
    /// two coincide.
    async fn enable(&mut self, device: &Device) -> Result<(), ConnectionError> {
        if self.driver.current_privilege() == Some("privilege_exec") {
            return Ok(());
        }

        if let Some(secret) = &device.secret {
            let events = [
                InteractiveEvent::new("enable", r"(?mi)^(?:enable\s)?password:\s?$"),
                InteractiveEvent::hidden(
                    secret.expose_secret(),
                    r"(?mi)^[\w.\-@()/: ]{1,63}#\s?$",
                ),
            ];
            let result = self.driver.send_interactive(&events).await.map_err(|source| {
                ConnectionError::EnableFailed {
                    host: self.host.clone(),
                    source: Some(source),
                }
            })?;
            if result.failed {
                return Err(ConnectionError::EnableFailed {
                    host: self.host.clone(),
                    source: None,
                });
            }
            // The interactive exchange bypassed the privilege manager;
            // record where the handshake left us.
            self.driver
                .privilege_manager_mut()
                .set_current("privilege_exec")
                .map_err(|source| ConnectionError::EnableFailed {
                    host: self.host.clone(),
                    source: Some(source),
                })?;
            Ok(())
        } else {
            self.driver
                .acquire_privilege("privilege_exec")
                .await
                .map_err(|source| ConnectionError::EnableFailed {
                    host: self.host.clone(),
                    source: Some(source),
                })
        }
    }

    /// Run one command at the current privilege level and surface
    /// device-side rejections.
    async fn run(&mut self, command: &str) -> Result<String, CommandError> {
        let response = self.driver.send_command(command).await?;
        match response.failure_message {
            Some(message) => Err(CommandError::Rejected {
                command: command.to_string(),
                message,
            }),
            None => Ok(response.result),
        }
    }
}

impl SwitchSession for IosSession {
    async fn apply(&mut self, commands: &[String]) -> Result<Transcript, CommandError> {
        debug!("{}: applying {} configuration lines", self.host, commands.len());
        let refs: Vec<&str> = commands.iter().map(String::as_str).collect();
        let responses = self.driver.send_config(&refs).await?;

        let mut transcript = Transcript::default();
        for response in responses {
            if let Some(message) = response.failure_message {
                return Err(CommandError::Rejected {
                    command: response.command,
                    message,
                });
            }
            transcript.push(response.command, response.result);
        }
        info!("{}: applied {} lines", self.host, transcript.len());
        Ok(transcript)
    }

    async fn query(&mut self, command: &str) -> Result<String, CommandError> {
        debug!("{}: query '{command}'", self.host);
        self.run(command).await
    }

    async fn save(&mut self) -> Result<String, CommandError> {
        debug!("{}: saving startup-config", self.host);
        self.run(SAVE_COMMAND).await
    }

    async fn close(&mut self) -> Result<(), ConnectionError> {
        debug!("{}: closing session", self.host);
        self.driver
            .close()
            .await
            .map_err(|source| ConnectionError::CloseFailed {
                host: self.host.clone(),
                source,
            })
    }
}
