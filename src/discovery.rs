//! UPnP device-descriptor fetch for a SAT>IP server.

use roxmltree::Document;

use crate::error::SatIpError;
use crate::types::{Capability, DeviceInfo};

const UPNP_NS: &str = "urn:schemas-upnp-org:device-1-0";
const SES_NS: &str = "urn:ses-com:satip";

/// Fetch and parse the UPnP device descriptor XML at `url`.
///
/// The hostname reported in the returned `DeviceInfo` is taken from `url`'s
/// authority, not from any field inside the XML.
///
/// # Errors
/// Returns `SatIpError::TransportError` if the HTTP GET fails, or
/// `SatIpError::InvalidDescriptor` if the XML is unparseable or missing a
/// required field.
pub async fn fetch_device_descriptor(url: &str) -> Result<DeviceInfo, SatIpError> {
    let hostname = hostname_from_url(url)?;

    let body = reqwest::get(url)
        .await
        .map_err(|e| SatIpError::TransportError(format!("fetching device descriptor: {e}")))?
        .text()
        .await
        .map_err(|e| SatIpError::TransportError(format!("reading device descriptor body: {e}")))?;

    parse_device_descriptor(&body, hostname)
}

fn hostname_from_url(url: &str) -> Result<String, SatIpError> {
    let after_scheme = url
        .split_once("://")
        .map_or(url, |(_, rest)| rest);
    let authority = after_scheme.split('/').next().unwrap_or(after_scheme);
    let host = authority.split(':').next().unwrap_or(authority);
    if host.is_empty() {
        return Err(SatIpError::InvalidDescriptor(format!(
            "could not extract hostname from URL: {url}"
        )));
    }
    Ok(host.to_string())
}

/// Parse a device descriptor document already fetched as text.
fn parse_device_descriptor(xml: &str, hostname: String) -> Result<DeviceInfo, SatIpError> {
    let doc = Document::parse(xml)
        .map_err(|e| SatIpError::InvalidDescriptor(format!("XML parse error: {e}")))?;

    let device = doc
        .descendants()
        .find(|n| n.has_tag_name((UPNP_NS, "device")))
        .ok_or_else(|| SatIpError::InvalidDescriptor("missing <device> element".to_string()))?;

    let text_of = |local_name: &str, ns: &str| -> Option<String> {
        device
            .descendants()
            .find(|n| n.has_tag_name((ns, local_name)))
            .and_then(|n| n.text())
            .map(str::trim)
            .map(str::to_string)
    };

    let manufacturer = text_of("manufacturer", UPNP_NS)
        .ok_or_else(|| SatIpError::InvalidDescriptor("missing manufacturer".to_string()))?;
    let model_name = text_of("modelName", UPNP_NS)
        .ok_or_else(|| SatIpError::InvalidDescriptor("missing modelName".to_string()))?;
    let serial_number = text_of("serialNumber", UPNP_NS)
        .ok_or_else(|| SatIpError::InvalidDescriptor("missing serialNumber".to_string()))?;
    let satipcap = text_of("X_SATIPCAP", SES_NS)
        .ok_or_else(|| SatIpError::InvalidDescriptor("missing X_SATIPCAP".to_string()))?;

    let (capability, number_of_tuners) = parse_satipcap(&satipcap)?;

    Ok(DeviceInfo {
        hostname,
        manufacturer,
        model_name,
        serial_number,
        capability,
        number_of_tuners,
    })
}

/// Parse an `X_SATIPCAP` value of the form `<TYPE>-<N>`.
fn parse_satipcap(raw: &str) -> Result<(Capability, u32), SatIpError> {
    let (type_part, count_part) = raw.split_once('-').ok_or_else(|| {
        SatIpError::InvalidDescriptor(format!("malformed X_SATIPCAP: {raw}"))
    })?;

    let capability = Capability::parse(type_part)
        .ok_or_else(|| SatIpError::InvalidDescriptor(format!("unknown capability type: {type_part}")))?;

    let number_of_tuners: u32 = count_part
        .parse()
        .map_err(|_| SatIpError::InvalidDescriptor(format!("invalid tuner count: {count_part}")))?;

    if number_of_tuners < 1 {
        return Err(SatIpError::InvalidDescriptor(
            "number of tuners must be at least 1".to_string(),
        ));
    }

    Ok((capability, number_of_tuners))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0" xmlns:satip="urn:ses-com:satip">
  <device>
    <manufacturer>Acme Tuners</manufacturer>
    <modelName>Tuner9000</modelName>
    <serialNumber>SN123456</serialNumber>
    <satip:X_SATIPCAP>DVBS2-4</satip:X_SATIPCAP>
  </device>
</root>"#;

    #[test]
    fn parses_valid_descriptor() {
        let info = parse_device_descriptor(FIXTURE, "192.168.1.10".to_string()).unwrap();
        assert_eq!(info.hostname, "192.168.1.10");
        assert_eq!(info.manufacturer, "Acme Tuners");
        assert_eq!(info.model_name, "Tuner9000");
        assert_eq!(info.serial_number, "SN123456");
        assert_eq!(info.capability, Capability::Dvbs2);
        assert_eq!(info.number_of_tuners, 4);
    }

    #[test]
    fn rejects_satipcap_missing_tuner_count() {
        let xml = FIXTURE.replace("DVBS2-4", "DVBS2-");
        assert!(matches!(
            parse_device_descriptor(&xml, "h".to_string()),
            Err(SatIpError::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn rejects_satipcap_with_unknown_type() {
        let xml = FIXTURE.replace("DVBS2-4", "FOO-2");
        assert!(matches!(
            parse_device_descriptor(&xml, "h".to_string()),
            Err(SatIpError::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn hostname_is_extracted_from_url_authority() {
        assert_eq!(
            hostname_from_url("http://192.168.1.10:8080/desc.xml").unwrap(),
            "192.168.1.10"
        );
        assert_eq!(
            hostname_from_url("http://my-tuner.local/desc.xml").unwrap(),
            "my-tuner.local"
        );
    }
}
