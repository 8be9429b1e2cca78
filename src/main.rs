//! Command-line entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::error;

use vlansmith::session::VERIFY_COMMAND;
use vlansmith::{Deployment, Device, IosConnector, IosSession, SwitchSession, provision};

#[derive(Parser)]
#[command(
    name = "vlansmith",
    version,
    about = "Declarative VLAN provisioning for Cisco IOS access switches"
)]
struct Cli {
    /// Deployment file with device credentials and intent
    #[arg(short, long, default_value = "campus.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a device's configuration, verify it, and save
    Apply {
        /// Device name; all devices in the file when omitted
        device: Option<String>,

        /// Leave the startup config untouched
        #[arg(long)]
        no_save: bool,
    },

    /// Print the rendered command sequence without connecting
    Render {
        /// Device name
        device: String,
    },

    /// Run the read-only verification query only
    Verify {
        /// Device name
        device: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let deployment = Deployment::load(&cli.config)?;

    match cli.command {
        Command::Apply { device, no_save } => {
            let selected: Vec<(&String, &Device)> = match &device {
                Some(name) => {
                    let entry = deployment
                        .devices
                        .get_key_value(name.as_str())
                        .ok_or_else(|| format!("unknown device '{name}'"))?;
                    vec![entry]
                }
                None => deployment.devices.iter().collect(),
            };

            let mut failures = 0usize;
            for (name, device) in selected {
                match apply_one(name, device, !no_save).await {
                    Ok(()) => {}
                    Err(e) => {
                        error!("{e}");
                        failures += 1;
                    }
                }
            }
            if failures > 0 {
                return Err(format!("{failures} device(s) failed").into());
            }
        }

        Command::Render { device } => {
            let intent = deployment.device(&device)?.intent()?;
            for line in intent.render() {
                println!("{line}");
            }
        }

        Command::Verify { device } => {
            let entry = deployment.device(&device)?;
            let mut session = IosSession::connect(entry).await?;
            let result = session.query(VERIFY_COMMAND).await;
            // One close regardless of how the query went
            if let Err(e) = session.close().await {
                error!("{device}: close failed: {e}");
            }
            println!("{}", result?);
        }
    }

    Ok(())
}

async fn apply_one(
    name: &str,
    device: &Device,
    save: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let intent = device.intent()?;
    let report = provision(&IosConnector, name, device, &intent, save).await?;

    println!("--- {name}: configuration transcript ---");
    print!("{}", report.transcript);
    println!("--- {name}: {VERIFY_COMMAND} ---");
    println!("{}", report.verification);
    println!("--- {name}: finished in state {:?} ---", report.state);
    Ok(())
}
