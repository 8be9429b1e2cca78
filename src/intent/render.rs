//! Rendering an intent into ordered IOS configuration lines.
//!
//! This is the only place in the crate that produces command text. All
//! interface-scoped lines go through [`Renderer::scoped`], which pairs
//! the entering `interface`/`vlan` line with its `exit`, so rendered
//! output is context-balanced by construction.

use super::{PortRange, PortSet, SwitchIntent};

/// Accumulates configuration lines, keeping interface and VLAN contexts
/// balanced.
struct Renderer {
    lines: Vec<String>,
}

impl Renderer {
    fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Emit a top-level (global configuration) line.
    fn top(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Emit an enclosing context: the entering line, the body, and the
    /// matching `exit`.
    fn scoped<I>(&mut self, enter: String, body: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.lines.push(enter);
        self.lines.extend(body);
        self.lines.push("exit".to_string());
    }
}

/// `interface fa0/1` for a single port, `interface range fa0/1-8`
/// otherwise.
fn enter_range(range: &PortRange) -> String {
    if range.is_single() {
        format!("interface {range}")
    } else {
        format!("interface range {range}")
    }
}

fn enter_set(set: &PortSet) -> String {
    match set.as_single() {
        Some(port) => format!("interface {port}"),
        None => format!("interface range {set}"),
    }
}

impl SwitchIntent {
    /// Render the intent to the ordered command sequence applied in
    /// configuration mode.
    ///
    /// `configure terminal` and `end` are owned by the session's
    /// privilege handling and never appear here; saving the startup
    /// config is a separate privileged-exec step.
    ///
    /// Rendering is pure and deterministic: the same intent always
    /// yields the same sequence.
    pub fn render(&self) -> Vec<String> {
        let mut r = Renderer::new();

        if let Some(hostname) = self.hostname() {
            r.top(format!("hostname {hostname}"));
        }

        // VLANs must exist before any interface references them.
        for vlan in self.vlans() {
            r.scoped(
                format!("vlan {}", vlan.id),
                [format!("name {}", vlan.name)],
            );
        }

        for vlan in self.vlans() {
            r.scoped(
                enter_range(&vlan.access),
                [
                    "switchport mode access".to_string(),
                    format!("switchport access vlan {}", vlan.id),
                ],
            );
        }

        for vlan in self.vlans() {
            let (Some(active), Some(security)) = (&vlan.active, &vlan.port_security) else {
                continue;
            };
            let mut body = vec![
                "switchport port-security".to_string(),
                format!("switchport port-security maximum {}", security.maximum),
                format!("switchport port-security violation {}", security.violation),
            ];
            if security.sticky {
                body.push("switchport port-security mac-address sticky".to_string());
            }
            r.scoped(format!("interface {active}"), body);
        }

        for vlan in self.vlans() {
            if !vlan.shutdown_unused {
                continue;
            }
            // Unused ports are defined relative to the designated one.
            let Some(active) = &vlan.active else {
                continue;
            };
            let unused = vlan.access.without(active);
            if unused.is_empty() {
                continue;
            }
            r.scoped(enter_set(&unused), ["shutdown".to_string()]);
        }

        let snooping = self.dhcp_snooping();

        if let Some(trunk) = self.trunk() {
            let mut body = vec!["switchport mode trunk".to_string()];
            if !self.vlans().is_empty() {
                // The allowed list is always the declared VLAN set.
                body.push(format!("switchport trunk allowed vlan {}", self.vlan_list()));
            }
            if trunk.dhcp_trust && snooping.is_some() {
                body.push("ip dhcp snooping trust".to_string());
            }
            r.scoped(format!("interface {}", trunk.port), body);
        }

        if let Some(snooping) = snooping {
            r.top("ip dhcp snooping");
            if !self.vlans().is_empty() {
                r.top(format!("ip dhcp snooping vlan {}", self.vlan_list()));
            }
            if !snooping.trusted.is_empty() {
                r.scoped(
                    enter_set(&snooping.trusted),
                    ["ip dhcp snooping trust".to_string()],
                );
            }
            if let Some(limit) = &snooping.rate_limit {
                r.scoped(
                    enter_set(&limit.ports),
                    [format!("ip dhcp snooping limit rate {}", limit.pps)],
                );
            }
        }

        if let Some(mode) = self.stp_mode() {
            r.top(format!("spanning-tree mode {mode}"));
        }

        r.lines
    }

    fn vlan_list(&self) -> String {
        self.vlan_ids()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}
