//! Shared identifiers and diagnostics for the xmp-sim workspace.
//!
//! Kept as its own crate, in the same role `mesh-common` plays for the
//! compiler crates: small types every other crate needs, with no
//! dependencies of its own.

pub mod error;
pub mod ids;

pub use error::{SimError, SimErrorKind};
pub use ids::{ActorId, ActorKind, GpcId, QueueId};

/// A device class a phase may be serviced on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Processor,
    Accelerator,
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Processor => write!(f, "Processor"),
            Device::Accelerator => write!(f, "Accelerator"),
        }
    }
}

/// The set of device classes permitted to execute a phase.
///
/// The domain is exactly `{Processor, Accelerator}`, so a two-bit set beats
/// a `HashSet<Device>` for both clarity and cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceSet(u8);

const PROCESSOR_BIT: u8 = 0b01;
const ACCELERATOR_BIT: u8 = 0b10;

impl DeviceSet {
    pub const fn processor() -> Self {
        DeviceSet(PROCESSOR_BIT)
    }

    pub const fn accelerator() -> Self {
        DeviceSet(ACCELERATOR_BIT)
    }

    pub const fn both() -> Self {
        DeviceSet(PROCESSOR_BIT | ACCELERATOR_BIT)
    }

    pub fn contains(&self, d: Device) -> bool {
        match d {
            Device::Processor => self.0 & PROCESSOR_BIT != 0,
            Device::Accelerator => self.0 & ACCELERATOR_BIT != 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for DeviceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for d in [Device::Processor, Device::Accelerator] {
            if self.contains(d) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{d}")?;
                first = false;
            }
        }
        if first {
            write!(f, "<empty>")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_set_both_contains_each() {
        let s = DeviceSet::both();
        assert!(s.contains(Device::Processor));
        assert!(s.contains(Device::Accelerator));
    }

    #[test]
    fn device_set_single_excludes_other() {
        let s = DeviceSet::processor();
        assert!(s.contains(Device::Processor));
        assert!(!s.contains(Device::Accelerator));
    }

    #[test]
    fn device_set_display() {
        assert_eq!(DeviceSet::both().to_string(), "Processor|Accelerator");
        assert_eq!(DeviceSet::processor().to_string(), "Processor");
        assert_eq!(DeviceSet::default().to_string(), "<empty>");
    }
}
