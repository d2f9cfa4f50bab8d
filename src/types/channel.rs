//! Validated tuning parameters for a single transponder

use crate::error::SatIpError;

/// Forward error correction rates accepted on the wire, as the concatenated
/// numerator/denominator digits (e.g. `56` = 5/6).
const VALID_FEC: [u32; 9] = [12, 23, 34, 56, 78, 89, 35, 45, 910];

/// Roll-off factors accepted on the wire.
const VALID_ROLLOFF: [f64; 3] = [0.20, 0.25, 0.35];

/// DVB-S/S2 modulation system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModulationSystem {
    /// DVB-S
    Dvbs,
    /// DVB-S2
    Dvbs2,
}

impl ModulationSystem {
    fn as_str(self) -> &'static str {
        match self {
            ModulationSystem::Dvbs => "dvbs",
            ModulationSystem::Dvbs2 => "dvbs2",
        }
    }
}

/// DVB-S/S2 modulation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModulationType {
    /// QPSK (the only type valid for plain DVB-S)
    Qpsk,
    /// 8PSK
    Psk8,
}

impl ModulationType {
    fn as_str(self) -> &'static str {
        match self {
            ModulationType::Qpsk => "qpsk",
            ModulationType::Psk8 => "8psk",
        }
    }
}

/// Polarisation of the transponder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarisation {
    /// Horizontal
    Horizontal,
    /// Vertical
    Vertical,
}

impl Polarisation {
    fn as_str(self) -> &'static str {
        match self {
            Polarisation::Horizontal => "h",
            Polarisation::Vertical => "v",
        }
    }
}

/// Validated, immutable tuning parameters for one transponder.
///
/// Construction validates every field's range and cross-field constraints;
/// any violation is reported as [`SatIpError::InvalidArgument`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSpec {
    /// Which physical tuner to bind, 1-based. `None` lets the server choose.
    pub frontend: Option<u32>,
    /// DiSEqC satellite position, 1-based.
    pub src: u32,
    /// Frequency in MHz.
    pub frequency: f64,
    /// Symbol rate in symbols/second.
    pub symbol_rate: u32,
    /// Modulation system.
    pub modulation_system: ModulationSystem,
    /// Modulation type.
    pub modulation_type: ModulationType,
    /// Polarisation.
    pub polarisation: Polarisation,
    /// FEC rate, concatenated numerator/denominator digits.
    pub fec: u32,
    /// Roll-off factor.
    pub rolloff: f64,
    /// MPEG-TS PIDs to include.
    pub pids: Vec<u32>,
    /// Optional human-readable label for display.
    pub display_name: Option<String>,
}

impl ChannelSpec {
    /// Construct and validate a new `ChannelSpec`.
    ///
    /// # Errors
    /// Returns [`SatIpError::InvalidArgument`] if any field is out of range,
    /// per §3's invariants.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        frontend: Option<u32>,
        src: u32,
        frequency: f64,
        symbol_rate: u32,
        modulation_system: ModulationSystem,
        modulation_type: ModulationType,
        polarisation: Polarisation,
        fec: u32,
        rolloff: f64,
        pids: Vec<u32>,
        display_name: Option<String>,
    ) -> Result<Self, SatIpError> {
        if let Some(fe) = frontend {
            if fe < 1 || fe > 65535 {
                return Err(SatIpError::InvalidArgument(format!(
                    "frontend {fe} out of range [1, 65535]"
                )));
            }
        }
        if src < 1 || src > 255 {
            return Err(SatIpError::InvalidArgument(format!(
                "src {src} out of range [1, 255]"
            )));
        }
        if frequency <= 0.0 {
            return Err(SatIpError::InvalidArgument(format!(
                "frequency {frequency} must be positive"
            )));
        }
        if modulation_system == ModulationSystem::Dvbs && modulation_type != ModulationType::Qpsk
        {
            return Err(SatIpError::InvalidArgument(
                "dvbs requires modulation_type=qpsk".to_string(),
            ));
        }
        if !VALID_FEC.contains(&fec) {
            return Err(SatIpError::InvalidArgument(format!(
                "fec {fec} not one of {VALID_FEC:?}"
            )));
        }
        if !VALID_ROLLOFF.iter().any(|v| (*v - rolloff).abs() < f64::EPSILON) {
            return Err(SatIpError::InvalidArgument(format!(
                "rolloff {rolloff} not one of {VALID_ROLLOFF:?}"
            )));
        }
        for pid in &pids {
            if *pid > 8191 {
                return Err(SatIpError::InvalidArgument(format!(
                    "pid {pid} out of range [0, 8191]"
                )));
            }
        }

        Ok(Self {
            frontend,
            src,
            frequency,
            symbol_rate,
            modulation_system,
            modulation_type,
            polarisation,
            fec,
            rolloff,
            pids,
            display_name,
        })
    }

    /// Serialize the SETUP/PLAY stream URI query parameters in the exact
    /// field order required for server interop (§4.2).
    #[must_use]
    pub fn to_stream_uri_params(&self) -> String {
        let pids = self
            .pids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        let mut result = format!(
            "?src={}&freq={}&sr={}&msys={}&mtype={}&pol={}&fec={}&ro={}&pids={}",
            self.src,
            self.frequency,
            self.symbol_rate,
            self.modulation_system.as_str(),
            self.modulation_type.as_str(),
            self.polarisation.as_str(),
            self.fec,
            self.rolloff,
            pids
        );

        if let Some(fe) = self.frontend {
            result.push_str(&format!("&fe={fe}"));
        }

        result
    }

    /// A short label for display purposes: `<frequency>/<polarisation>`,
    /// suffixed with `|<display_name>` if one was given.
    #[must_use]
    pub fn display_label(&self) -> String {
        let base = format!("{}/{}", self.frequency, self.polarisation.as_str());
        match &self.display_name {
            Some(name) => format!("{base}|{name}"),
            None => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Result<ChannelSpec, SatIpError> {
        ChannelSpec::new(
            Some(2),
            1,
            10714.25,
            22000,
            ModulationSystem::Dvbs,
            ModulationType::Qpsk,
            Polarisation::Horizontal,
            56,
            0.35,
            vec![0, 1],
            None,
        )
    }

    #[test]
    fn s4_channel_uri_matches_fixed_field_order() {
        let spec = valid().unwrap();
        assert_eq!(
            spec.to_stream_uri_params(),
            "?src=1&freq=10714.25&sr=22000&msys=dvbs&mtype=qpsk&pol=h&fec=56&ro=0.35&pids=0,1&fe=2"
        );
    }

    #[test]
    fn uri_omits_fe_when_frontend_is_none() {
        let spec = ChannelSpec::new(
            None,
            1,
            10714.25,
            22000,
            ModulationSystem::Dvbs,
            ModulationType::Qpsk,
            Polarisation::Horizontal,
            56,
            0.35,
            vec![0],
            None,
        )
        .unwrap();
        assert!(!spec.to_stream_uri_params().contains("&fe="));
    }

    #[test]
    fn rejects_out_of_range_frontend() {
        let err = ChannelSpec::new(
            Some(0),
            1,
            10714.25,
            22000,
            ModulationSystem::Dvbs,
            ModulationType::Qpsk,
            Polarisation::Horizontal,
            56,
            0.35,
            vec![0],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, SatIpError::InvalidArgument(_)));
    }

    #[test]
    fn rejects_invalid_fec() {
        let err = ChannelSpec::new(
            Some(1),
            1,
            10714.25,
            22000,
            ModulationSystem::Dvbs,
            ModulationType::Qpsk,
            Polarisation::Horizontal,
            99,
            0.35,
            vec![0],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, SatIpError::InvalidArgument(_)));
    }

    #[test]
    fn rejects_invalid_rolloff() {
        let err = ChannelSpec::new(
            Some(1),
            1,
            10714.25,
            22000,
            ModulationSystem::Dvbs,
            ModulationType::Qpsk,
            Polarisation::Horizontal,
            56,
            0.5,
            vec![0],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, SatIpError::InvalidArgument(_)));
    }

    #[test]
    fn rejects_pid_out_of_range() {
        let err = ChannelSpec::new(
            Some(1),
            1,
            10714.25,
            22000,
            ModulationSystem::Dvbs,
            ModulationType::Qpsk,
            Polarisation::Horizontal,
            56,
            0.35,
            vec![8192],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, SatIpError::InvalidArgument(_)));
    }

    #[test]
    fn rejects_dvbs_with_8psk() {
        let err = ChannelSpec::new(
            Some(1),
            1,
            10714.25,
            22000,
            ModulationSystem::Dvbs,
            ModulationType::Psk8,
            Polarisation::Horizontal,
            56,
            0.35,
            vec![0],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, SatIpError::InvalidArgument(_)));
    }
}
