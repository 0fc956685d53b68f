use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Bulb identifier assigned by the gateway (e.g. "65538")
pub type BulbId = String;

/// Prefix under which the gateway exposes all device resources
const RESOURCE_PREFIX: &str = "/15001";

/// Preset color for mireds below 200 (coolest/whitest)
pub const COLOR_COOL: &str = "f5faf6";
/// Preset color for mireds in 200..300
pub const COLOR_NEUTRAL: &str = "f1e0b5";
/// Preset color for mireds of 300 and above (warmest/reddest)
pub const COLOR_WARM: &str = "efd275";

/// Build the resource path for a bulb
///
/// All bulb control and status requests use this single addressing scheme.
pub fn resource_path(id: &str) -> String {
    format!("{}/{}", RESOURCE_PREFIX, id)
}

/// A semantic bulb command, produced by the accessory layer's change callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulbCommand {
    /// Turn the bulb on or off
    Power { on: bool },
    /// Set the brightness level (0-100 from the accessory layer)
    Brightness { level: u8 },
    /// Set the color temperature in mireds
    Temperature { mireds: u16 },
}

impl BulbCommand {
    /// Translate this command into the gateway's wire payload
    ///
    /// The mapping is total and deterministic: every command value produces
    /// exactly one payload shape, byte-identical across calls.
    pub fn encode(self) -> HubPayload {
        match self {
            BulbCommand::Power { on } => encode_power(on),
            BulbCommand::Brightness { level } => encode_brightness(level),
            BulbCommand::Temperature { mireds } => encode_temperature(mireds),
        }
    }
}

/// Wire payload for a bulb command, keyed by the gateway's numeric
/// resource codes
///
/// Each command produces a minimal object containing only the relevant key;
/// the gateway treats the payload as additive, not a full-state replacement.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HubPayload {
    #[serde(rename = "3311")]
    light_control: Vec<LightSetting>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
struct LightSetting {
    #[serde(rename = "5850", skip_serializing_if = "Option::is_none")]
    on: Option<u8>,
    #[serde(rename = "5851", skip_serializing_if = "Option::is_none")]
    brightness: Option<u8>,
    #[serde(rename = "5706", skip_serializing_if = "Option::is_none")]
    color: Option<String>,
}

impl HubPayload {
    fn single(setting: LightSetting) -> Self {
        Self {
            light_control: vec![setting],
        }
    }
}

/// Encode a power command: `true` maps to integer 1, `false` to 0
pub fn encode_power(on: bool) -> HubPayload {
    HubPayload::single(LightSetting {
        on: Some(u8::from(on)),
        ..LightSetting::default()
    })
}

/// Encode a brightness command
///
/// The level is passed through unchanged; out-of-range values are not
/// clamped here and are left to the gateway to validate.
pub fn encode_brightness(level: u8) -> HubPayload {
    HubPayload::single(LightSetting {
        brightness: Some(level),
        ..LightSetting::default()
    })
}

/// Encode a color temperature command
///
/// The continuous mireds dial is approximated with the three preset colors
/// the gateway supports: below 200 is the coolest white, 200 to 299 the
/// neutral tone, and 300 and above the warmest.
pub fn encode_temperature(mireds: u16) -> HubPayload {
    let color = if mireds < 200 {
        COLOR_COOL
    } else if mireds < 300 {
        COLOR_NEUTRAL
    } else {
        COLOR_WARM
    };

    HubPayload::single(LightSetting {
        color: Some(color.to_string()),
        ..LightSetting::default()
    })
}

/// Parsed form of a gateway status reply for one bulb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubStatusResponse {
    /// Device display name
    #[serde(rename = "9001", default)]
    pub name: String,

    /// Light control block; the gateway reports an array with one entry
    #[serde(rename = "3311", default)]
    pub control: Vec<LightStatus>,
}

/// One entry of the light control block in a status reply
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LightStatus {
    /// On/off state as reported by the gateway (0 or 1)
    #[serde(rename = "5850", default)]
    pub on: u8,

    /// Current brightness level
    #[serde(rename = "5851", default)]
    pub brightness: u8,

    /// Current color as a hex string
    #[serde(rename = "5706", default)]
    pub color: String,
}

impl HubStatusResponse {
    /// Whether the bulb reports itself as on
    pub fn is_on(&self) -> bool {
        self.control.first().is_some_and(|c| c.on == 1)
    }

    /// Reported brightness level
    pub fn brightness(&self) -> u8 {
        self.control.first().map(|c| c.brightness).unwrap_or(0)
    }

    /// Reported color hex string
    pub fn color(&self) -> &str {
        self.control.first().map(|c| c.color.as_str()).unwrap_or("")
    }
}

/// Parse a gateway JSON status reply
///
/// Malformed JSON yields an error rather than a partially-populated
/// structure; the caller decides whether that is fatal.
pub fn decode_status(bytes: &[u8]) -> Result<HubStatusResponse> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn to_value(payload: &HubPayload) -> serde_json::Value {
        serde_json::to_value(payload).unwrap()
    }

    #[test]
    fn power_on_encodes_integer_one() {
        assert_eq!(to_value(&encode_power(true)), json!({"3311": [{"5850": 1}]}));
    }

    #[test]
    fn power_off_encodes_integer_zero() {
        assert_eq!(to_value(&encode_power(false)), json!({"3311": [{"5850": 0}]}));
    }

    #[test]
    fn power_payload_is_byte_exact() {
        let body = serde_json::to_string(&encode_power(true)).unwrap();
        assert_eq!(body, r#"{"3311":[{"5850":1}]}"#);
    }

    #[test]
    fn brightness_passes_level_through_unclamped() {
        for level in [0u8, 1, 50, 100, 101, 255] {
            assert_eq!(
                to_value(&encode_brightness(level)),
                json!({"3311": [{"5851": level}]}),
            );
        }
    }

    #[test]
    fn temperature_buckets_match_preset_boundaries() {
        let cases = [
            (0, COLOR_COOL),
            (199, COLOR_COOL),
            (200, COLOR_NEUTRAL),
            (299, COLOR_NEUTRAL),
            (300, COLOR_WARM),
            (454, COLOR_WARM),
        ];
        for (mireds, color) in cases {
            assert_eq!(
                to_value(&encode_temperature(mireds)),
                json!({"3311": [{"5706": color}]}),
                "mireds {}",
                mireds,
            );
        }
    }

    #[test]
    fn command_encode_matches_free_functions() {
        assert_eq!(BulbCommand::Power { on: true }.encode(), encode_power(true));
        assert_eq!(
            BulbCommand::Brightness { level: 42 }.encode(),
            encode_brightness(42),
        );
        assert_eq!(
            BulbCommand::Temperature { mireds: 250 }.encode(),
            encode_temperature(250),
        );
    }

    #[test]
    fn status_decodes_wire_fields() {
        let body = br#"{"9001":"Floor Lamp","3311":[{"5850":1,"5851":87,"5706":"f1e0b5"}]}"#;
        let status = decode_status(body).unwrap();
        assert_eq!(status.name, "Floor Lamp");
        assert!(status.is_on());
        assert_eq!(status.brightness(), 87);
        assert_eq!(status.color(), "f1e0b5");
    }

    #[test]
    fn malformed_status_is_rejected() {
        assert!(decode_status(b"{\"3311\": not json").is_err());
        assert!(decode_status(b"").is_err());
    }

    #[test]
    fn resource_path_uses_fixed_prefix() {
        assert_eq!(resource_path("65538"), "/15001/65538");
    }
}
