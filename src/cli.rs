//! Command-line argument parsing.

use clap::Parser;

use crate::error::SatIpError;
use crate::types::{ChannelSpec, ModulationSystem, ModulationType, Polarisation};

/// A SAT>IP satellite-finder: tune N transponders and display per-tuner
/// signal level/quality as reported by the server's RTCP APP packets.
#[derive(Parser, Debug)]
#[command(name = "satip-finder")]
#[command(version)]
#[command(about = "Tune transponders on a SAT>IP server and display signal level/quality")]
pub struct Args {
    /// Full URL of the UPnP device descriptor XML
    #[arg(short = 's', long = "server-descriptor-url")]
    pub server_descriptor_url: String,

    /// Tune spec, one per tuner: frequency,polarisation,modulation_system,symbol_rate,fec[,name]
    /// e.g. `10714.25,h,dvbs,22000,56,ARD`
    #[arg(short = 't', long = "tune", required = true)]
    pub tune: Vec<String>,
}

/// Parse one `--tune` spec string into a validated `ChannelSpec`.
///
/// Format: `frequency,polarisation,modulation_system,symbol_rate,fec[,name]`.
/// `src` and `rolloff` are not expressible on the CLI and take fixed
/// defaults (`src=1`, `rolloff=0.35`); `pids` defaults to `[0]` as required
/// at SETUP time. `frontend` is pinned to `tuner_index + 1`, binding this
/// channel to the physical tuner at that position in `--tune` order.
///
/// # Errors
/// Returns `SatIpError::InvalidArgument` if the tune spec has the wrong
/// arity, an unparseable numeric field, or an unrecognized enum value.
pub fn parse_tune_spec(spec: &str, tuner_index: usize) -> Result<ChannelSpec, SatIpError> {
    let fields: Vec<&str> = spec.split(',').collect();
    if fields.len() != 5 && fields.len() != 6 {
        return Err(SatIpError::InvalidArgument(format!(
            "tune spec must have 5 or 6 comma-separated fields, got {}: {spec}",
            fields.len()
        )));
    }

    let frequency: f64 = fields[0]
        .parse()
        .map_err(|_| SatIpError::InvalidArgument(format!("invalid frequency: {}", fields[0])))?;

    let polarisation = match fields[1].to_ascii_lowercase().as_str() {
        "h" => Polarisation::Horizontal,
        "v" => Polarisation::Vertical,
        other => {
            return Err(SatIpError::InvalidArgument(format!(
                "invalid polarisation (expected h or v): {other}"
            )));
        }
    };

    let modulation_system = match fields[2].to_ascii_lowercase().as_str() {
        "dvbs" => ModulationSystem::Dvbs,
        "dvbs2" => ModulationSystem::Dvbs2,
        other => {
            return Err(SatIpError::InvalidArgument(format!(
                "invalid modulation system (expected dvbs or dvbs2): {other}"
            )));
        }
    };

    let modulation_type = match modulation_system {
        ModulationSystem::Dvbs => ModulationType::Qpsk,
        ModulationSystem::Dvbs2 => ModulationType::Psk8,
    };

    let symbol_rate: u32 = fields[3]
        .parse()
        .map_err(|_| SatIpError::InvalidArgument(format!("invalid symbol rate: {}", fields[3])))?;

    let fec: u32 = fields[4]
        .parse()
        .map_err(|_| SatIpError::InvalidArgument(format!("invalid fec: {}", fields[4])))?;

    let display_name = fields.get(5).map(|s| (*s).to_string());

    ChannelSpec::new(
        Some(tuner_index as u32 + 1),
        1,
        frequency,
        symbol_rate,
        modulation_system,
        modulation_type,
        polarisation,
        fec,
        0.35,
        vec![0],
        display_name,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tune_spec_without_name() {
        let spec = parse_tune_spec("10714.25,h,dvbs,22000,56", 0).unwrap();
        assert_eq!(spec.frequency, 10714.25);
        assert_eq!(spec.polarisation, Polarisation::Horizontal);
        assert_eq!(spec.modulation_type, ModulationType::Qpsk);
        assert_eq!(spec.display_name, None);
    }

    #[test]
    fn parses_tune_spec_with_name() {
        let spec = parse_tune_spec("10714.25,h,dvbs,22000,56,ARD", 0).unwrap();
        assert_eq!(spec.display_name, Some("ARD".to_string()));
    }

    #[test]
    fn dvbs2_maps_to_8psk_modulation_type() {
        let spec = parse_tune_spec("11493.75,v,dvbs2,27500,34", 0).unwrap();
        assert_eq!(spec.modulation_type, ModulationType::Psk8);
    }

    #[test]
    fn frontend_is_pinned_to_one_based_tuner_index() {
        assert_eq!(
            parse_tune_spec("10714.25,h,dvbs,22000,56", 0).unwrap().frontend,
            Some(1)
        );
        assert_eq!(
            parse_tune_spec("10714.25,h,dvbs,22000,56", 2).unwrap().frontend,
            Some(3)
        );
    }

    #[test]
    fn rejects_malformed_tune_spec() {
        assert!(parse_tune_spec("10714.25,h,dvbs,22000", 0).is_err());
        assert!(parse_tune_spec("not-a-number,h,dvbs,22000,56", 0).is_err());
        assert!(parse_tune_spec("10714.25,x,dvbs,22000,56", 0).is_err());
    }
}
