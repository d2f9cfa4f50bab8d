//! SAT>IP RTCP APP packet parsing (§4.1)

use byteorder::{BigEndian, ByteOrder};

/// Errors raised while walking a compound RTCP datagram or decoding the
/// SAT>IP APP payload.
#[derive(Debug, thiserror::Error)]
pub enum RtcpError {
    /// A packet declared a length that would run past the buffer.
    #[error("RTCP packet length {declared} exceeds remaining buffer of {available} bytes")]
    LengthExceedsBuffer { declared: usize, available: usize },

    /// The version field (top 2 bits of byte 0) was not 2.
    #[error("invalid RTCP version {0}, expected 2")]
    InvalidVersion(u8),

    /// Buffer too short to contain even an RTCP header.
    #[error("buffer too short for an RTCP header: {0} bytes")]
    TooShort(usize),

    /// APP payload identifier field was not zero.
    #[error("invalid SAT>IP APP identifier {0}, expected 0")]
    InvalidIdentifier(u16),

    /// Declared string length didn't match the decoded, NUL-trimmed string.
    #[error("APP string length mismatch: header said {declared}, decoded {actual}")]
    StringLengthMismatch { declared: usize, actual: usize },

    /// `tuner=` field did not have exactly 12 comma-separated values.
    #[error("tuner field has {0} comma-separated values, expected 12")]
    TunerFieldArity(usize),

    /// A numeric sub-field of `tuner=` failed to parse.
    #[error("invalid tuner field value: {0}")]
    InvalidTunerField(String),

    /// `signal_level` or `quality` fell outside its valid range.
    #[error("{field} value {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// The APP payload's application-data string was not valid UTF-8.
    #[error("APP payload is not valid UTF-8")]
    InvalidUtf8,

    /// `lock` was neither `"1"` nor `"0"`.
    #[error("invalid lock value {0:?}, expected \"1\" or \"0\"")]
    InvalidLock(String),
}

const RTCP_PT_APP: u8 = 204;

/// One SAT>IP `SES1` RTCP APP packet, decoded from the wire (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct RtcpAppPacket {
    /// Raw 4-byte ASCII name, expected `"SES1"`.
    pub name: String,
    /// `ver=<major>.<minor>`.
    pub version: String,
    /// `src=<int>`.
    pub source: u32,
    /// First field of `tuner=`.
    pub frontend_id: u32,
    /// Numerical signal level, 0-255.
    pub signal_level: u16,
    /// Whether the tuner reports lock.
    pub lock: bool,
    /// Numerical quality, 0-15.
    pub quality: u16,
    /// Frequency in MHz.
    pub frequency: f64,
    /// `h` or `v`.
    pub polarisation: String,
    /// `dvbs` or `dvbs2`.
    pub system: String,
    /// `qpsk` or `8psk`.
    pub r#type: String,
    /// Whether pilot tones are enabled.
    pub pilots: bool,
    /// Roll-off factor.
    pub roll_off: f64,
    /// Symbol rate in symbols/second.
    pub symbol_rate: u32,
    /// FEC inner rate, concatenated digits.
    pub fec_inner: u32,
    /// `pids=<pid0>,<pid1>,...`.
    pub pids: Vec<u32>,
}

impl RtcpAppPacket {
    /// Percentage derivation of `signal_level`, per §4.1.
    #[must_use]
    pub fn level_pct(&self) -> u32 {
        (u32::from(self.signal_level) * 100) / 255
    }

    /// Percentage derivation of `quality`, per §4.1.
    #[must_use]
    pub fn quality_pct(&self) -> u32 {
        (u32::from(self.quality) * 100) / 15
    }

    fn parse(payload: &[u8]) -> Result<Self, RtcpError> {
        if payload.len() < 8 {
            return Err(RtcpError::TooShort(payload.len()));
        }

        let name = String::from_utf8_lossy(&payload[0..4]).to_string();
        let identifier = BigEndian::read_u16(&payload[4..6]);
        if identifier != 0 {
            return Err(RtcpError::InvalidIdentifier(identifier));
        }
        let string_length = BigEndian::read_u16(&payload[6..8]) as usize;

        let raw = std::str::from_utf8(&payload[8..]).map_err(|_| RtcpError::InvalidUtf8)?;
        let application_data = raw.trim_end_matches('\0');

        if application_data.len() != string_length {
            return Err(RtcpError::StringLengthMismatch {
                declared: string_length,
                actual: application_data.len(),
            });
        }

        let mut version = None;
        let mut source = None;
        let mut tuner_fields: Option<Vec<&str>> = None;
        let mut pids = None;

        for entry in application_data.split(';') {
            if let Some(v) = entry.strip_prefix("ver=") {
                version = Some(v.to_string());
            } else if let Some(v) = entry.strip_prefix("src=") {
                source = Some(
                    v.parse::<u32>()
                        .map_err(|_| RtcpError::InvalidTunerField(format!("src={v}")))?,
                );
            } else if let Some(v) = entry.strip_prefix("tuner=") {
                let fields: Vec<&str> = v.trim().split(',').collect();
                if fields.len() != 12 {
                    return Err(RtcpError::TunerFieldArity(fields.len()));
                }
                tuner_fields = Some(fields);
            } else if let Some(v) = entry.strip_prefix("pids=") {
                let mut parsed = Vec::new();
                for p in v.split(',') {
                    parsed.push(
                        p.parse::<u32>()
                            .map_err(|_| RtcpError::InvalidTunerField(format!("pids={v}")))?,
                    );
                }
                pids = Some(parsed);
            }
        }

        let tuner_fields = tuner_fields.ok_or_else(|| {
            RtcpError::InvalidTunerField("missing tuner= field".to_string())
        })?;

        let parse_field = |idx: usize, name: &'static str| -> Result<&str, RtcpError> {
            tuner_fields
                .get(idx)
                .copied()
                .ok_or_else(|| RtcpError::InvalidTunerField(name.to_string()))
        };

        let frontend_id = parse_field(0, "frontend_id")?
            .parse::<u32>()
            .map_err(|_| RtcpError::InvalidTunerField("frontend_id".to_string()))?;
        let signal_level = parse_field(1, "signal_level")?
            .parse::<u16>()
            .map_err(|_| RtcpError::InvalidTunerField("signal_level".to_string()))?;
        let lock_raw = parse_field(2, "lock")?;
        let lock = match lock_raw {
            "1" => true,
            "0" => false,
            other => return Err(RtcpError::InvalidLock(other.to_string())),
        };
        let quality = parse_field(3, "quality")?
            .parse::<u16>()
            .map_err(|_| RtcpError::InvalidTunerField("quality".to_string()))?;
        let frequency = parse_field(4, "frequency")?
            .parse::<f64>()
            .map_err(|_| RtcpError::InvalidTunerField("frequency".to_string()))?;
        let polarisation = parse_field(5, "polarisation")?.to_string();
        let system = parse_field(6, "system")?.to_string();
        let r#type = parse_field(7, "type")?.to_string();
        let pilots = parse_field(8, "pilots")?.eq_ignore_ascii_case("on");
        let roll_off = parse_field(9, "roll_off")?
            .parse::<f64>()
            .map_err(|_| RtcpError::InvalidTunerField("roll_off".to_string()))?;
        let symbol_rate = parse_field(10, "symbol_rate")?
            .parse::<u32>()
            .map_err(|_| RtcpError::InvalidTunerField("symbol_rate".to_string()))?;
        let fec_inner = parse_field(11, "fec_inner")?
            .parse::<u32>()
            .map_err(|_| RtcpError::InvalidTunerField("fec_inner".to_string()))?;

        if signal_level > 255 {
            return Err(RtcpError::OutOfRange {
                field: "signal_level",
                value: i64::from(signal_level),
                min: 0,
                max: 255,
            });
        }
        if quality > 15 {
            return Err(RtcpError::OutOfRange {
                field: "quality",
                value: i64::from(quality),
                min: 0,
                max: 15,
            });
        }

        Ok(RtcpAppPacket {
            name,
            version: version.unwrap_or_default(),
            source: source.unwrap_or_default(),
            frontend_id,
            signal_level,
            lock,
            quality,
            frequency,
            polarisation,
            system,
            r#type,
            pilots,
            roll_off,
            symbol_rate,
            fec_inner,
            pids: pids.unwrap_or_default(),
        })
    }
}

/// Walks a compound RTCP datagram and returns the first SAT>IP APP packet
/// found, ignoring every other packet type (§4.1, invariant 1).
///
/// # Errors
/// Returns [`RtcpError`] if any RTCP header or the APP payload itself is
/// structurally invalid.
pub fn first_app_packet(packet: &[u8]) -> Result<Option<RtcpAppPacket>, RtcpError> {
    let mut cursor = 0usize;
    let len = packet.len();

    while cursor + 4 < len {
        let packet_start = cursor;
        let byte0 = packet[cursor];
        let version = (byte0 & 0b1100_0000) >> 6;
        if version != 2 {
            return Err(RtcpError::InvalidVersion(version));
        }
        cursor += 1;
        let packet_type = packet[cursor];
        cursor += 1;
        let length_field = BigEndian::read_u16(&packet[cursor..cursor + 2]);
        cursor += 2;
        cursor += 4; // SSRC, ignored

        let full_size = (length_field as usize) * 4 + 4;
        if packet_start + full_size > len {
            return Err(RtcpError::LengthExceedsBuffer {
                declared: packet_start + full_size,
                available: len,
            });
        }

        let specific_data = &packet[cursor..packet_start + full_size];
        cursor = packet_start + full_size;

        if packet_type == RTCP_PT_APP {
            return Ok(Some(RtcpAppPacket::parse(specific_data)?));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    const S1_FIXTURE: &str = "gMgABgCCerUAAAAAAAAAAIx7ggAAAABAAAE3YIHKAAYAgnq1ARFGRjpGRjpGRjpGRjpGRjpGRgCAzAAfAIJ6tVNFUzEAAABudmVyPTEuMDtzcmM9MTt0dW5lcj0xLDExNSwxLDEzLDEwNzE0LGgsZHZicyxxcHNrLG9mZiwwLjM1LDIyMDAwLDU2O3BpZHM9MCwxLDE2LDE3LDI2NiwyMzUzLDIzNTQsMjM1NSwyMzU2LDIzNTcAAA==";

    fn fixture_bytes() -> Vec<u8> {
        base64::engine::general_purpose::STANDARD
            .decode(S1_FIXTURE)
            .unwrap()
    }

    #[test]
    fn s1_decodes_app_packet_and_derives_metrics() {
        let data = fixture_bytes();
        let app = first_app_packet(&data).unwrap().expect("an APP packet");

        assert_eq!(app.name, "SES1");
        assert_eq!(app.version, "1.0");
        assert_eq!(app.source, 1);
        assert_eq!(app.frontend_id, 1);
        assert_eq!(app.signal_level, 115);
        assert!(app.lock);
        assert_eq!(app.quality, 13);
        assert_eq!(app.frequency, 10714.0);
        assert_eq!(app.polarisation, "h");
        assert_eq!(app.system, "dvbs");
        assert_eq!(app.r#type, "qpsk");
        assert!(!app.pilots);
        assert_eq!(app.roll_off, 0.35);
        assert_eq!(app.symbol_rate, 22000);
        assert_eq!(app.fec_inner, 56);
        assert_eq!(
            app.pids,
            vec![0, 1, 16, 17, 266, 2353, 2354, 2355, 2356, 2357]
        );

        assert_eq!(app.level_pct(), 45);
        assert_eq!(app.quality_pct(), 86);
    }

    #[test]
    fn non_app_packets_preceding_the_app_packet_are_skipped() {
        let data = fixture_bytes();
        // the fixture itself contains an SR and an SDES packet before the APP packet
        let result = first_app_packet(&data).unwrap();
        assert!(result.is_some());
    }

    #[test]
    fn empty_buffer_returns_none() {
        assert!(first_app_packet(&[]).unwrap().is_none());
    }

    #[test]
    fn rejects_wrong_version() {
        let mut data = fixture_bytes();
        data[0] = 0b0000_0000; // version bits zeroed
        let err = first_app_packet(&data).unwrap_err();
        assert!(matches!(err, RtcpError::InvalidVersion(0)));
    }

    #[test]
    fn rejects_declared_length_past_buffer() {
        let data = vec![0x80, 204, 0xFF, 0xFF, 0, 0, 0, 0];
        let err = first_app_packet(&data).unwrap_err();
        assert!(matches!(err, RtcpError::LengthExceedsBuffer { .. }));
    }
}
