//! Interface names, contiguous port ranges, and comma-joined port sets.
//!
//! Cisco IOS short names are used throughout: `fa0/7` is a single
//! interface, `fa0/1-8` a contiguous range, and `fa0/1,fa0/9,fa0/17` a
//! set of ranges. Parsing normalizes the prefix to lowercase so that
//! `Fa0/1` and `fa0/1` compare equal; rendering always emits lowercase.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::IntentError;

/// Matches `fa0/7`, `gi1/0/24`, or `fa0/1-8` (optional trailing span).
static PORT_SPEC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+(?:\d+/)*)(\d+)(?:\s*-\s*(\d+))?$").unwrap());

fn invalid(spec: &str, reason: &str) -> IntentError {
    IntentError::InvalidInterface {
        spec: spec.to_string(),
        reason: reason.to_string(),
    }
}

/// A single switch interface, e.g. `fa0/7`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Interface {
    stem: String,
    number: u16,
}

impl Interface {
    /// Interface name up to and including the last `/`, e.g. `fa0/`.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Port number after the last `/`.
    pub fn number(&self) -> u16 {
        self.number
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.stem, self.number)
    }
}

impl FromStr for Interface {
    type Err = IntentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = s.trim();
        let caps = PORT_SPEC
            .captures(spec)
            .ok_or_else(|| invalid(spec, "expected a name like fa0/7"))?;
        if caps.get(3).is_some() {
            return Err(invalid(spec, "a single interface cannot carry a range"));
        }
        let number = caps[2]
            .parse()
            .map_err(|_| invalid(spec, "port number out of range"))?;
        Ok(Self {
            stem: caps[1].to_lowercase(),
            number,
        })
    }
}

/// A contiguous run of ports sharing a stem, e.g. `fa0/1-8`.
///
/// A single interface is the degenerate range with `start == end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRange {
    stem: String,
    start: u16,
    end: u16,
}

impl PortRange {
    /// Build a range from its parts. `start` must not exceed `end`.
    pub fn new(stem: impl Into<String>, start: u16, end: u16) -> Result<Self, IntentError> {
        let stem = stem.into().to_lowercase();
        if start > end {
            return Err(invalid(
                &format!("{stem}{start}-{end}"),
                "descending range",
            ));
        }
        Ok(Self { stem, start, end })
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    /// Whether the range names exactly one interface.
    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    /// Number of interfaces covered.
    pub fn len(&self) -> usize {
        usize::from(self.end - self.start) + 1
    }

    /// A range always covers at least one port.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `port` falls inside this range.
    pub fn contains(&self, port: &Interface) -> bool {
        self.stem == port.stem && (self.start..=self.end).contains(&port.number)
    }

    /// Whether two ranges share at least one interface.
    pub fn overlaps(&self, other: &PortRange) -> bool {
        self.stem == other.stem && self.start <= other.end && other.start <= self.end
    }

    /// First interface shared with `other`, if any.
    pub fn first_overlap(&self, other: &PortRange) -> Option<Interface> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Interface {
            stem: self.stem.clone(),
            number: self.start.max(other.start),
        })
    }

    /// Iterate over the interfaces covered by this range.
    pub fn iter(&self) -> impl Iterator<Item = Interface> + '_ {
        (self.start..=self.end).map(|number| Interface {
            stem: self.stem.clone(),
            number,
        })
    }

    /// The ports of this range with `port` removed.
    ///
    /// Splits into at most two runs; used to derive the shutdown set for
    /// the non-designated ports of an access range.
    pub fn without(&self, port: &Interface) -> PortSet {
        if !self.contains(port) {
            return PortSet::from(self.clone());
        }
        let mut ranges = Vec::with_capacity(2);
        if port.number > self.start {
            ranges.push(Self {
                stem: self.stem.clone(),
                start: self.start,
                end: port.number - 1,
            });
        }
        if port.number < self.end {
            ranges.push(Self {
                stem: self.stem.clone(),
                start: port.number + 1,
                end: self.end,
            });
        }
        PortSet { ranges }
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}{}", self.stem, self.start)
        } else {
            write!(f, "{}{}-{}", self.stem, self.start, self.end)
        }
    }
}

impl FromStr for PortRange {
    type Err = IntentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = s.trim();
        let caps = PORT_SPEC
            .captures(spec)
            .ok_or_else(|| invalid(spec, "expected a range like fa0/1-8"))?;
        let start: u16 = caps[2]
            .parse()
            .map_err(|_| invalid(spec, "port number out of range"))?;
        let end: u16 = match caps.get(3) {
            Some(m) => m
                .as_str()
                .parse()
                .map_err(|_| invalid(spec, "port number out of range"))?,
            None => start,
        };
        if start > end {
            return Err(invalid(spec, "descending range"));
        }
        Ok(Self {
            stem: caps[1].to_lowercase(),
            start,
            end,
        })
    }
}

/// An ordered, comma-joined set of port ranges, e.g. `fa0/1,fa0/9-16`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortSet {
    ranges: Vec<PortRange>,
}

impl PortSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, range: PortRange) {
        self.ranges.push(range);
    }

    pub fn ranges(&self) -> &[PortRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn contains(&self, port: &Interface) -> bool {
        self.ranges.iter().any(|r| r.contains(port))
    }

    pub fn overlaps_range(&self, other: &PortRange) -> bool {
        self.ranges.iter().any(|r| r.overlaps(other))
    }

    /// The set as a single interface, when it covers exactly one.
    pub fn as_single(&self) -> Option<Interface> {
        match self.ranges.as_slice() {
            [r] if r.is_single() => Some(Interface {
                stem: r.stem.clone(),
                number: r.start,
            }),
            _ => None,
        }
    }
}

impl From<PortRange> for PortSet {
    fn from(range: PortRange) -> Self {
        Self {
            ranges: vec![range],
        }
    }
}

impl From<Interface> for PortSet {
    fn from(port: Interface) -> Self {
        Self {
            ranges: vec![PortRange {
                stem: port.stem,
                start: port.number,
                end: port.number,
            }],
        }
    }
}

impl fmt::Display for PortSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, range) in self.ranges.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{range}")?;
        }
        Ok(())
    }
}

impl FromStr for PortSet {
    type Err = IntentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = s.trim();
        if spec.is_empty() {
            return Err(invalid(spec, "empty port set"));
        }
        let ranges = spec
            .split(',')
            .map(|part| part.parse())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { ranges })
    }
}

// The deployment file carries interfaces and ranges as plain strings.

macro_rules! string_serde {
    ($ty:ty) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }
    };
}

string_serde!(Interface);
string_serde!(PortRange);
string_serde!(PortSet);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_interface() {
        let intf: Interface = "fa0/7".parse().unwrap();
        assert_eq!(intf.stem(), "fa0/");
        assert_eq!(intf.number(), 7);
        assert_eq!(intf.to_string(), "fa0/7");
    }

    #[test]
    fn test_parse_stacked_interface() {
        let intf: Interface = "gi1/0/24".parse().unwrap();
        assert_eq!(intf.stem(), "gi1/0/");
        assert_eq!(intf.number(), 24);
    }

    #[test]
    fn test_parse_normalizes_case() {
        let a: Interface = "Fa0/1".parse().unwrap();
        let b: Interface = "fa0/1".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_interface_rejects_range() {
        assert!("fa0/1-8".parse::<Interface>().is_err());
        assert!("".parse::<Interface>().is_err());
        assert!("fa0/".parse::<Interface>().is_err());
    }

    #[test]
    fn test_parse_range() {
        let range: PortRange = "fa0/1-8".parse().unwrap();
        assert_eq!(range.start(), 1);
        assert_eq!(range.end(), 8);
        assert_eq!(range.len(), 8);
        assert_eq!(range.to_string(), "fa0/1-8");
    }

    #[test]
    fn test_single_port_range() {
        let range: PortRange = "fa0/24".parse().unwrap();
        assert!(range.is_single());
        assert_eq!(range.to_string(), "fa0/24");
    }

    #[test]
    fn test_descending_range_rejected() {
        assert!("fa0/8-1".parse::<PortRange>().is_err());
    }

    #[test]
    fn test_contains_and_overlap() {
        let r1: PortRange = "fa0/1-8".parse().unwrap();
        let r2: PortRange = "fa0/9-16".parse().unwrap();
        let r3: PortRange = "fa0/8-10".parse().unwrap();
        let gi: PortRange = "gi0/1-8".parse().unwrap();

        assert!(r1.contains(&"fa0/8".parse().unwrap()));
        assert!(!r1.contains(&"fa0/9".parse().unwrap()));
        assert!(!r1.contains(&"gi0/1".parse().unwrap()));

        assert!(!r1.overlaps(&r2));
        assert!(r1.overlaps(&r3));
        assert!(r2.overlaps(&r3));
        assert!(!r1.overlaps(&gi));

        assert_eq!(r1.first_overlap(&r3).unwrap().to_string(), "fa0/8");
    }

    #[test]
    fn test_without_splits_range() {
        let range: PortRange = "fa0/1-8".parse().unwrap();

        let rest = range.without(&"fa0/1".parse().unwrap());
        assert_eq!(rest.to_string(), "fa0/2-8");

        let rest = range.without(&"fa0/5".parse().unwrap());
        assert_eq!(rest.to_string(), "fa0/1-4,fa0/6-8");

        let rest = range.without(&"fa0/8".parse().unwrap());
        assert_eq!(rest.to_string(), "fa0/1-7");

        // Removing a port outside the range leaves it untouched
        let rest = range.without(&"fa0/9".parse().unwrap());
        assert_eq!(rest.to_string(), "fa0/1-8");
    }

    #[test]
    fn test_without_single_port_range_is_empty() {
        let range: PortRange = "fa0/24".parse().unwrap();
        let rest = range.without(&"fa0/24".parse().unwrap());
        assert!(rest.is_empty());
    }

    #[test]
    fn test_port_set_parse_and_display() {
        let set: PortSet = "fa0/1,fa0/9,fa0/17".parse().unwrap();
        assert_eq!(set.ranges().len(), 3);
        assert_eq!(set.to_string(), "fa0/1,fa0/9,fa0/17");
        assert!(set.contains(&"fa0/9".parse().unwrap()));
        assert!(!set.contains(&"fa0/2".parse().unwrap()));

        let mixed: PortSet = "fa0/4-23,gi0/1".parse().unwrap();
        assert_eq!(mixed.to_string(), "fa0/4-23,gi0/1");
    }

    #[test]
    fn test_port_set_as_single() {
        let one: PortSet = "fa0/24".parse().unwrap();
        assert_eq!(one.as_single().unwrap().to_string(), "fa0/24");

        let many: PortSet = "fa0/1-8".parse().unwrap();
        assert!(many.as_single().is_none());
    }

    #[test]
    fn test_empty_set_rejected() {
        assert!("".parse::<PortSet>().is_err());
        assert!(" , ".parse::<PortSet>().is_err());
    }
}
