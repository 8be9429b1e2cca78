//! Provisioning orchestration for one device.
//!
//! The pass is strictly sequential: connect, apply the rendered intent,
//! run the verification query, save. Any failing step short-circuits
//! the rest and surfaces as a typed [`ProvisionError`]; the session is
//! closed exactly once after a successful connect, on success and
//! failure paths alike. There is no retry, rollback, or partial-apply
//! detection.

use std::fmt;
use std::future::Future;

use log::{info, warn};
use thiserror::Error;

use crate::deploy::Device;
use crate::error::{CommandError, ConnectionError, Error};
use crate::intent::SwitchIntent;
use crate::session::{IosSession, SwitchSession, Transcript, VERIFY_COMMAND};

/// Where a provisioning pass stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    Idle,
    Connected,
    Configured,
    Verified,
    Saved,
    Failed,
}

/// The step a pass failed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Connect,
    Apply,
    Verify,
    Save,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connect => "connect",
            Self::Apply => "apply",
            Self::Verify => "verify",
            Self::Save => "save",
        };
        f.write_str(s)
    }
}

/// A provisioning pass that did not complete.
#[derive(Debug, Error)]
#[error("{device}: {failed_at} step failed: {source}")]
pub struct ProvisionError {
    /// Device name from the deployment file.
    pub device: String,

    /// Step that failed; later steps were not attempted.
    pub failed_at: Step,

    /// Final state, always [`ProvisionState::Failed`].
    pub state: ProvisionState,

    #[source]
    pub source: Error,
}

/// Outcome of a completed pass.
#[derive(Debug)]
pub struct ProvisionReport {
    pub device: String,

    /// [`ProvisionState::Saved`], or [`ProvisionState::Verified`] when
    /// saving was skipped.
    pub state: ProvisionState,

    /// Transcript of the applied configuration batch.
    pub transcript: Transcript,

    /// Raw output of the verification query, for human inspection.
    pub verification: String,
}

/// Opens sessions for the orchestrator. The production connector talks
/// SSH; tests substitute a scripted one.
pub trait Connector: Send + Sync {
    type Session: SwitchSession;

    fn connect(
        &self,
        device: &Device,
    ) -> impl Future<Output = Result<Self::Session, ConnectionError>> + Send;
}

/// Connector backed by [`IosSession`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IosConnector;

impl Connector for IosConnector {
    type Session = IosSession;

    fn connect(
        &self,
        device: &Device,
    ) -> impl Future<Output = Result<IosSession, ConnectionError>> + Send {
        IosSession::connect(device)
    }
}

/// Run a full provisioning pass for one device.
///
/// Renders `intent`, opens a session, applies the batch, runs the
/// verification query, and saves the startup config unless `save` is
/// false.
pub async fn provision<C: Connector>(
    connector: &C,
    name: &str,
    device: &Device,
    intent: &SwitchIntent,
    save: bool,
) -> Result<ProvisionReport, ProvisionError> {
    let commands = intent.render();
    info!("{name}: provisioning {} ({} lines)", device.host, commands.len());

    let fail = |failed_at: Step, source: Error| ProvisionError {
        device: name.to_string(),
        failed_at,
        state: ProvisionState::Failed,
        source,
    };

    let mut session = connector
        .connect(device)
        .await
        .map_err(|e| fail(Step::Connect, e.into()))?;

    let outcome = steps(&mut session, &commands, save).await;

    // One close per opened session, also when a step failed. A close
    // failure after a step failure is logged, not returned, so the
    // step's error stays visible.
    if let Err(e) = session.close().await {
        warn!("{name}: close failed: {e}");
    }

    match outcome {
        Ok((state, transcript, verification)) => {
            info!("{name}: provisioning finished in state {state:?}");
            Ok(ProvisionReport {
                device: name.to_string(),
                state,
                transcript,
                verification,
            })
        }
        Err((step, source)) => Err(fail(step, source)),
    }
}

/// The connected portion of the pass. Split out so `provision` can
/// close the session regardless of which step failed.
async fn steps<S: SwitchSession>(
    session: &mut S,
    commands: &[String],
    save: bool,
) -> Result<(ProvisionState, Transcript, String), (Step, Error)> {
    let step = |s: Step| move |e: CommandError| (s, Error::from(e));

    let transcript = session.apply(commands).await.map_err(step(Step::Apply))?;
    let verification = session
        .query(VERIFY_COMMAND)
        .await
        .map_err(step(Step::Verify))?;

    if !save {
        return Ok((ProvisionState::Verified, transcript, verification));
    }
    session.save().await.map_err(step(Step::Save))?;
    Ok((ProvisionState::Saved, transcript, verification))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::deploy::Deployment;
    use crate::intent::{SwitchIntent, VlanId, VlanPlan};

    fn test_device() -> Device {
        let deployment = Deployment::parse(
            r#"
            [devices.sw1]
            host = "10.0.0.2"
            username = "admin"
            password = "x"
            "#,
        )
        .unwrap();
        deployment.devices.shift_remove("sw1").unwrap()
    }

    fn test_intent() -> SwitchIntent {
        SwitchIntent::builder()
            .vlan(VlanPlan {
                id: VlanId::new(10).unwrap(),
                name: "alumnos".to_string(),
                access: "fa0/1-8".parse().unwrap(),
                active: None,
                port_security: None,
                shutdown_unused: true,
            })
            .build()
            .unwrap()
    }

    /// What a mock session saw, shared with the test body.
    #[derive(Default)]
    struct SessionLog {
        events: Mutex<Vec<String>>,
        closes: AtomicUsize,
    }

    impl SessionLog {
        fn record(&self, event: &str) {
            self.events.lock().unwrap().push(event.to_string());
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    /// Scripted session: optionally rejects the nth applied directive.
    struct MockSession {
        log: Arc<SessionLog>,
        reject_at: Option<usize>,
    }

    impl SwitchSession for MockSession {
        async fn apply(&mut self, commands: &[String]) -> Result<Transcript, CommandError> {
            self.log.record("apply");
            let mut transcript = Transcript::default();
            for (i, command) in commands.iter().enumerate() {
                if self.reject_at == Some(i) {
                    return Err(CommandError::Rejected {
                        command: command.clone(),
                        message: "% Invalid input detected".to_string(),
                    });
                }
                transcript.push(command.clone(), "");
            }
            Ok(transcript)
        }

        async fn query(&mut self, _command: &str) -> Result<String, CommandError> {
            self.log.record("query");
            Ok("10   alumnos   active".to_string())
        }

        async fn save(&mut self) -> Result<String, CommandError> {
            self.log.record("save");
            Ok("[OK]".to_string())
        }

        async fn close(&mut self) -> Result<(), ConnectionError> {
            self.log.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct MockConnector {
        log: Arc<SessionLog>,
        reject_at: Option<usize>,
        refuse: bool,
    }

    impl MockConnector {
        fn new() -> Self {
            Self {
                log: Arc::new(SessionLog::default()),
                reject_at: None,
                refuse: false,
            }
        }
    }

    impl Connector for MockConnector {
        type Session = MockSession;

        async fn connect(&self, device: &Device) -> Result<MockSession, ConnectionError> {
            if self.refuse {
                return Err(ConnectionError::AuthenticationFailed {
                    host: device.host.clone(),
                    user: device.username.clone(),
                });
            }
            Ok(MockSession {
                log: Arc::clone(&self.log),
                reject_at: self.reject_at,
            })
        }
    }

    #[tokio::test]
    async fn test_full_pass_reaches_saved() {
        let connector = MockConnector::new();
        let report = provision(&connector, "sw1", &test_device(), &test_intent(), true)
            .await
            .unwrap();

        assert_eq!(report.state, ProvisionState::Saved);
        assert_eq!(report.transcript.len(), test_intent().render().len());
        assert!(report.verification.contains("alumnos"));
        assert_eq!(connector.log.events(), vec!["apply", "query", "save"]);
        assert_eq!(connector.log.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_save_stops_at_verified() {
        let connector = MockConnector::new();
        let report = provision(&connector, "sw1", &test_device(), &test_intent(), false)
            .await
            .unwrap();

        assert_eq!(report.state, ProvisionState::Verified);
        assert_eq!(connector.log.events(), vec!["apply", "query"]);
        assert_eq!(connector.log.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_directive_fails_pass_and_skips_rest() {
        let mut connector = MockConnector::new();
        connector.reject_at = Some(2); // third directive

        let err = provision(&connector, "sw1", &test_device(), &test_intent(), true)
            .await
            .unwrap_err();

        assert_eq!(err.failed_at, Step::Apply);
        assert_eq!(err.state, ProvisionState::Failed);
        // No query or save after the failing apply
        assert_eq!(connector.log.events(), vec!["apply"]);
        // The session is still closed, exactly once
        assert_eq!(connector.log.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_closes_nothing() {
        let mut connector = MockConnector::new();
        connector.refuse = true;

        let err = provision(&connector, "sw1", &test_device(), &test_intent(), true)
            .await
            .unwrap_err();

        assert_eq!(err.failed_at, Step::Connect);
        assert!(connector.log.events().is_empty());
        assert_eq!(connector.log.closes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_provision_error_display_names_device() {
        let err = ProvisionError {
            device: "sw1".to_string(),
            failed_at: Step::Apply,
            state: ProvisionState::Failed,
            source: CommandError::Rejected {
                command: "vlan 10".to_string(),
                message: "% Invalid input detected".to_string(),
            }
            .into(),
        };
        let text = err.to_string();
        assert!(text.starts_with("sw1: apply step failed"));
    }
}
