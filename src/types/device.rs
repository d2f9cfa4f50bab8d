//! Parsed SAT>IP device descriptor

/// Tuner capability reported by a SAT>IP server's `X_SATIPCAP` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// DVB-S2 (and DVB-S)
    Dvbs2,
    /// DVB-T
    Dvbt,
    /// DVB-T2
    Dvbt2,
    /// DVB-C
    Dvbc,
    /// DVB-C2
    Dvbc2,
}

impl Capability {
    /// Parse the `TYPE` half of an `X_SATIPCAP` value (e.g. `DVBS2`).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DVBS2" => Some(Capability::Dvbs2),
            "DVBT" => Some(Capability::Dvbt),
            "DVBT2" => Some(Capability::Dvbt2),
            "DVBC" => Some(Capability::Dvbc),
            "DVBC2" => Some(Capability::Dvbc2),
            _ => None,
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Capability::Dvbs2 => "DVBS2",
            Capability::Dvbt => "DVBT",
            Capability::Dvbt2 => "DVBT2",
            Capability::Dvbc => "DVBC",
            Capability::Dvbc2 => "DVBC2",
        };
        write!(f, "{s}")
    }
}

/// Parsed UPnP device descriptor for a SAT>IP server.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    /// Hostname (or IP) taken from the descriptor URL's authority.
    pub hostname: String,
    /// `device/manufacturer`
    pub manufacturer: String,
    /// `device/modelName`
    pub model_name: String,
    /// `device/serialNumber`
    pub serial_number: String,
    /// Parsed `TYPE` half of `X_SATIPCAP`.
    pub capability: Capability,
    /// Parsed `N` half of `X_SATIPCAP`; number of available tuners.
    pub number_of_tuners: u32,
}

impl std::fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SAT>IP device(hostname={}, manufacturer={}, model={}, serialNumber={}, \
             capability={}, numberOfTuners={})",
            self.hostname,
            self.manufacturer,
            self.model_name,
            self.serial_number,
            self.capability,
            self.number_of_tuners
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_parses_known_types() {
        assert_eq!(Capability::parse("DVBS2"), Some(Capability::Dvbs2));
        assert_eq!(Capability::parse("DVBT2"), Some(Capability::Dvbt2));
        assert_eq!(Capability::parse("FOO"), None);
    }

    #[test]
    fn display_renders_all_fields() {
        let info = DeviceInfo {
            hostname: "192.168.1.10".to_string(),
            manufacturer: "Acme".to_string(),
            model_name: "Tuner9000".to_string(),
            serial_number: "SN123".to_string(),
            capability: Capability::Dvbs2,
            number_of_tuners: 4,
        };
        let rendered = info.to_string();
        assert!(rendered.contains("numberOfTuners=4"));
        assert!(rendered.contains("capability=DVBS2"));
    }
}
