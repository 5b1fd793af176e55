//! Parser for the embedded `grinder.toml`
//!
//! Handles only the TOML subset the grinder configuration needs:
//! - `[section]` headers
//! - `key = value` pairs (string, integer, boolean)
//! - Comments (`# ...`), including trailing ones
//!
//! Every key is optional; missing keys keep their default value.
//! Unknown sections and keys are rejected so typos do not go unnoticed.

use super::hardware::PinConfig;
use super::types::{AutoGrindStopPolicy, GrinderConfig};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not valid in the current section
    UnknownKey,
    /// Line is neither a header nor `key = value`
    MalformedLine,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// Invalid pin string
    InvalidPin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Pins,
    Voltage,
    Grind,
    Input,
    Sampling,
}

/// Parse configuration text on top of [`GrinderConfig::default`]
///
/// The result is not validated; call [`GrinderConfig::validate`] afterwards.
pub fn parse_config(input: &str) -> Result<GrinderConfig, ParseError> {
    let mut config = GrinderConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            let header = line
                .strip_prefix('[')
                .and_then(|l| l.split('#').next())
                .map(str::trim)
                .and_then(|l| l.strip_suffix(']'))
                .ok_or(ParseError::InvalidSection)?;
            section = parse_section_header(header)?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::MalformedLine)?;
        apply_value(&mut config, section, key, value)?;
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "pins" => Ok(Section::Pins),
        "voltage" => Ok(Section::Voltage),
        "grind" => Ok(Section::Grind),
        "input" => Ok(Section::Input),
        "sampling" => Ok(Section::Sampling),
        _ => Err(ParseError::InvalidSection),
    }
}

fn apply_value(
    config: &mut GrinderConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ParseError> {
    match (section, key) {
        (Section::Pins, "button") => config.pins.button = parse_pin(value)?,
        (Section::Pins, "motor") => config.pins.motor = parse_pin(value)?,
        (Section::Pins, "jack") => config.pins.jack = parse_pin(value)?,
        (Section::Pins, "status_led") => config.pins.status_led = parse_pin(value)?,
        (Section::Pins, "voltage_sense") => {
            let pin = parse_pin(value)?;
            if pin.inverted || pin.pull_up {
                return Err(ParseError::InvalidPin);
            }
            config.pins.voltage_sense = pin.pin;
        }

        (Section::Voltage, "charge_start") => config.thresholds.charge_start = parse_int(value)?,
        (Section::Voltage, "charge_stop") => config.thresholds.charge_stop = parse_int(value)?,
        (Section::Voltage, "autogrind_stop_percent") => {
            config.thresholds.autogrind_stop_percent = parse_int(value)?
        }

        (Section::Grind, "tap_timeout_ms") => config.control.tap_timeout_ms = parse_int(value)?,
        (Section::Grind, "safety_stop_ms") => config.control.safety_stop_ms = parse_int(value)?,
        (Section::Grind, "stop_policy") => config.control.stop_policy = parse_stop_policy(value)?,

        (Section::Input, "debounce_ms") => config.debounce_ms = parse_int(value)?,

        (Section::Sampling, "dma_channel") => config.sampling.dma_channel = parse_int(value)?,
        (Section::Sampling, "smoothing") => config.sampling.smoothing = parse_bool(value)?,

        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Strip a trailing comment unless the '#' sits inside a string
    let value = match value.find('#') {
        Some(hash_pos) if value[..hash_pos].matches('"').count() % 2 == 0 => {
            value[..hash_pos].trim()
        }
        _ => value,
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

fn parse_string(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Parse an unsigned integer, accepting TOML `_` digit separators
fn parse_int<T: TryFrom<u64>>(value: &str) -> Result<T, ParseError> {
    let mut digits = 0usize;
    let mut acc: u64 = 0;
    for c in value.chars().filter(|&c| c != '_') {
        let d = c.to_digit(10).ok_or(ParseError::InvalidValue)?;
        acc = acc
            .checked_mul(10)
            .and_then(|a| a.checked_add(u64::from(d)))
            .ok_or(ParseError::InvalidValue)?;
        digits += 1;
    }
    if digits == 0 {
        return Err(ParseError::InvalidValue);
    }
    T::try_from(acc).map_err(|_| ParseError::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_stop_policy(value: &str) -> Result<AutoGrindStopPolicy, ParseError> {
    match parse_string(value) {
        "manual-grind" => Ok(AutoGrindStopPolicy::ManualGrind),
        "stop-first" => Ok(AutoGrindStopPolicy::StopFirst),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse a pin string such as `"gpio5"`, `"!gpio5"` or `"^!gpio3"`
///
/// `!` marks the pin active-low, `^` enables the internal pull-up.
fn parse_pin(value: &str) -> Result<PinConfig, ParseError> {
    let mut s = parse_string(value);
    let mut pin = PinConfig::default();

    loop {
        if let Some(rest) = s.strip_prefix('!') {
            pin.inverted = true;
            s = rest;
        } else if let Some(rest) = s.strip_prefix('^') {
            pin.pull_up = true;
            s = rest;
        } else {
            break;
        }
    }

    let number = s.strip_prefix("gpio").ok_or(ParseError::InvalidPin)?;
    pin.pin = number.parse().map_err(|_| ParseError::InvalidPin)?;
    Ok(pin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pin() {
        let pin = parse_pin("gpio11").unwrap();
        assert_eq!(pin.pin, 11);
        assert!(!pin.inverted);
        assert!(!pin.pull_up);

        let pin = parse_pin("!gpio12").unwrap();
        assert_eq!(pin.pin, 12);
        assert!(pin.inverted);

        let pin = parse_pin("\"^!gpio3\"").unwrap();
        assert_eq!(pin.pin, 3);
        assert!(pin.inverted);
        assert!(pin.pull_up);

        assert_eq!(parse_pin("pin3"), Err(ParseError::InvalidPin));
        assert_eq!(parse_pin("gpioX"), Err(ParseError::InvalidPin));
    }

    #[test]
    fn test_parse_int_with_separators() {
        assert_eq!(parse_int::<u32>("60_000"), Ok(60_000));
        assert_eq!(parse_int::<u16>("1000"), Ok(1000));
        assert_eq!(parse_int::<u16>("70000"), Err(ParseError::InvalidValue));
        assert_eq!(parse_int::<u32>("-1"), Err(ParseError::InvalidValue));
        assert_eq!(parse_int::<u32>("_"), Err(ParseError::InvalidValue));
    }

    #[test]
    fn test_empty_input_gives_defaults() {
        assert_eq!(parse_config(""), Ok(GrinderConfig::default()));
    }

    #[test]
    fn test_parse_full_config() {
        let config_str = r#"
# Grinder board
[pins]
button = "^!gpio4"
motor = "!gpio6"   # motor FET, active-low
jack = "!gpio2"
status_led = "gpio25"
voltage_sense = "gpio27"

[voltage]
charge_start = 1100
charge_stop = 3100
autogrind_stop_percent = 115

[grind]
tap_timeout_ms = 800
safety_stop_ms = 45_000
stop_policy = "stop-first"

[input]
debounce_ms = 25

[sampling]
dma_channel = 2
smoothing = true
"#;

        let config = parse_config(config_str).unwrap();
        assert_eq!(config.pins.button.pin, 4);
        assert!(config.pins.button.pull_up);
        assert_eq!(config.pins.motor.pin, 6);
        assert!(config.pins.motor.inverted);
        assert_eq!(config.pins.voltage_sense, 27);
        assert_eq!(config.thresholds.charge_start, 1100);
        assert_eq!(config.thresholds.charge_stop, 3100);
        assert_eq!(config.thresholds.autogrind_stop_percent, 115);
        assert_eq!(config.control.tap_timeout_ms, 800);
        assert_eq!(config.control.safety_stop_ms, 45_000);
        assert_eq!(config.control.stop_policy, AutoGrindStopPolicy::StopFirst);
        assert_eq!(config.debounce_ms, 25);
        assert_eq!(config.sampling.dma_channel, 2);
        assert!(config.sampling.smoothing);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_config("[grind]\nstop_policy = \"manual-grind\"\n").unwrap();
        assert_eq!(config.control.stop_policy, AutoGrindStopPolicy::ManualGrind);
        assert_eq!(config.control.tap_timeout_ms, 1000);
        assert_eq!(config.thresholds.charge_stop, 3000);
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert_eq!(
            parse_config("[stepper]\nstep_pin = \"gpio1\"\n"),
            Err(ParseError::InvalidSection)
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert_eq!(
            parse_config("[voltage]\ncharge_begin = 1000\n"),
            Err(ParseError::UnknownKey)
        );
        // Keys outside any section
        assert_eq!(parse_config("debounce_ms = 5\n"), Err(ParseError::UnknownKey));
    }

    #[test]
    fn test_malformed_lines_rejected() {
        assert_eq!(parse_config("[pins]\nbutton\n"), Err(ParseError::MalformedLine));
        assert_eq!(parse_config("[pins\n"), Err(ParseError::InvalidSection));
    }

    #[test]
    fn test_bad_values_rejected() {
        assert_eq!(
            parse_config("[sampling]\nsmoothing = yes\n"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_config("[grind]\nstop_policy = \"restart\"\n"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_config("[pins]\nvoltage_sense = \"!gpio26\"\n"),
            Err(ParseError::InvalidPin)
        );
    }
}
