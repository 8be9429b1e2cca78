//! Classic Cisco IOS platform definition for the ferrissh driver.
//!
//! Privilege levels:
//! - `exec` - User EXEC mode with `>` prompt
//! - `privilege_exec` - Privileged EXEC mode with `#` prompt
//! - `configuration` - Configuration mode with `(config*)#` prompt
//!
//! # Prompt Examples
//!
//! ```text
//! SW1>                               # exec mode
//! SW1#                               # privilege_exec mode
//! SW1(config)#                       # configuration mode
//! SW1(config-if)#                    # config sub-mode (interface)
//! SW1(config-vlan)#                  # config sub-mode (vlan)
//! ```

use ferrissh::{PlatformDefinition, PrivilegeLevel};

use crate::error::ConnectionError;

/// Look up the platform definition for a deployment `device_type`.
pub fn for_device_type(device_type: &str) -> Result<PlatformDefinition, ConnectionError> {
    match device_type {
        "cisco_ios" => Ok(cisco_ios()),
        other => Err(ConnectionError::UnsupportedDeviceType(other.to_string())),
    }
}

/// Create the classic Cisco IOS platform definition.
///
/// Uses `(?mi)` flags for multiline (^ matches line start) and
/// case-insensitive matching.
pub fn cisco_ios() -> PlatformDefinition {
    // Exec mode - ">" prompt
    let exec = PrivilegeLevel::new("exec", r"(?mi)^[\w.\-@()/: ]{1,63}>\s?$").unwrap();

    // Privileged EXEC mode - "#" prompt
    // not_contains "(config" prevents matching config mode prompts
    let privilege_exec = PrivilegeLevel::new("privilege_exec", r"(?mi)^[\w.\-@()/: ]{1,63}#\s?$")
        .unwrap()
        .with_parent("exec")
        .with_escalate("enable")
        .with_deescalate("disable")
        .with_auth(r"(?mi)^(?:enable\s)?password:\s?$")
        .unwrap()
        .with_not_contains("(config");

    // Configuration mode - "(config*)" prompt, covers sub-modes like
    // (config-if) and (config-vlan)
    let configuration = PrivilegeLevel::new(
        "configuration",
        r"(?mi)^[\w.\-@()/: ]{1,63}\(config[\w.\-@/:+]{0,32}\)#\s?$",
    )
    .unwrap()
    .with_parent("privilege_exec")
    .with_escalate("configure terminal")
    .with_deescalate("end");

    PlatformDefinition::new("cisco_ios")
        .with_privilege(exec)
        .with_privilege(privilege_exec)
        .with_privilege(configuration)
        .with_default_privilege("privilege_exec")
        .with_failure_pattern("% Invalid input detected")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Access denied")
        .with_failure_pattern("% Bad secrets")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
        .with_terminal_size(511, 24)
}
