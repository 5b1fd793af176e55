//! Build script for burr-firmware
//!
//! - Sets up linker search paths for memory.x and the link scripts
//! - Validates grinder.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Keys accepted in each section, with the expected value kind
const SCHEMA: &[(&str, &[(&str, Kind)])] = &[
    (
        "pins",
        &[
            ("button", Kind::Pin),
            ("motor", Kind::Pin),
            ("jack", Kind::Pin),
            ("status_led", Kind::Pin),
            ("voltage_sense", Kind::AnalogPin),
        ],
    ),
    (
        "voltage",
        &[
            ("charge_start", Kind::Int(0, 4095)),
            ("charge_stop", Kind::Int(0, 4095)),
            ("autogrind_stop_percent", Kind::Int(101, 1000)),
        ],
    ),
    (
        "grind",
        &[
            ("tap_timeout_ms", Kind::Int(1, 3_600_000)),
            ("safety_stop_ms", Kind::Int(1, 3_600_000)),
            ("stop_policy", Kind::OneOf(&["manual-grind", "stop-first"])),
        ],
    ),
    ("input", &[("debounce_ms", Kind::Int(0, 1000))]),
    (
        "sampling",
        &[("dma_channel", Kind::Int(0, 11)), ("smoothing", Kind::Bool)],
    ),
];

#[derive(Clone, Copy)]
enum Kind {
    Pin,
    AnalogPin,
    Int(i64, i64),
    Bool,
    OneOf(&'static [&'static str]),
}

/// Validate grinder.toml configuration at compile time
fn validate_config() {
    // Re-run if grinder.toml changes
    println!("cargo:rerun-if-changed=grinder.toml");

    let config_path = Path::new("grinder.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: grinder.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds grinder.toml as its board configuration.    ║\n\
            ║  Please create one in the burr-firmware directory.               ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read grinder.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in grinder.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let mut errors = Vec::new();
    validate_schema(&config, &mut errors);
    if errors.is_empty() {
        validate_consistency(&config, &mut errors);
    }

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid grinder configuration                            ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
}

/// Check sections, keys and value types
fn validate_schema(config: &toml::Value, errors: &mut Vec<String>) {
    let root = match config.as_table() {
        Some(t) => t,
        None => return,
    };

    for (section, value) in root {
        let keys = match SCHEMA.iter().find(|(name, _)| *name == section.as_str()) {
            Some((_, keys)) => *keys,
            None => {
                errors.push(format!("unknown section [{}]", section));
                continue;
            }
        };
        let table = match value.as_table() {
            Some(t) => t,
            None => {
                errors.push(format!("[{}] must be a table", section));
                continue;
            }
        };

        for (key, value) in table {
            let kind = match keys.iter().find(|(name, _)| *name == key.as_str()) {
                Some((_, kind)) => *kind,
                None => {
                    errors.push(format!("[{}] unknown key '{}'", section, key));
                    continue;
                }
            };
            if let Err(msg) = check_value(kind, value) {
                errors.push(format!("[{}] {}: {}", section, key, msg));
            }
        }
    }
}

fn check_value(kind: Kind, value: &toml::Value) -> Result<(), String> {
    match kind {
        Kind::Pin | Kind::AnalogPin => {
            let s = value.as_str().ok_or("must be a string")?;
            let (pin, modified) = parse_pin(s).ok_or_else(|| format!("invalid pin '{}'", s))?;
            if pin > 29 {
                return Err(format!("gpio{} does not exist", pin));
            }
            if matches!(kind, Kind::AnalogPin) {
                if modified {
                    return Err("analog input takes no modifiers".into());
                }
                if !(26..=29).contains(&pin) {
                    return Err(format!("gpio{} has no ADC input", pin));
                }
            }
            Ok(())
        }
        Kind::Int(min, max) => {
            let v = value.as_integer().ok_or("must be an integer")?;
            if v < min || v > max {
                return Err(format!("must be {}-{}", min, max));
            }
            Ok(())
        }
        Kind::Bool => value.as_bool().map(|_| ()).ok_or_else(|| "must be true or false".into()),
        Kind::OneOf(options) => {
            let s = value.as_str().ok_or("must be a string")?;
            if options.contains(&s) {
                Ok(())
            } else {
                Err(format!("must be one of {}", options.join(", ")))
            }
        }
    }
}

/// Parse `[!^]*gpioN`, returning the pin number and whether modifiers were present
fn parse_pin(s: &str) -> Option<(u8, bool)> {
    let number = s.trim_start_matches(['!', '^']);
    let modified = number.len() != s.len();
    let pin = number.strip_prefix("gpio")?.parse().ok()?;
    Some((pin, modified))
}

/// Cross-field checks on an already well-typed config
fn validate_consistency(config: &toml::Value, errors: &mut Vec<String>) {
    let int = |section: &str, key: &str, default: i64| {
        config
            .get(section)
            .and_then(|s| s.get(key))
            .and_then(|v| v.as_integer())
            .unwrap_or(default)
    };

    if int("voltage", "charge_start", 1000) >= int("voltage", "charge_stop", 3000) {
        errors.push("charge_start must be below charge_stop".into());
    }
    if int("grind", "tap_timeout_ms", 1000) >= int("grind", "safety_stop_ms", 60_000) {
        errors.push("tap_timeout_ms must be below safety_stop_ms".into());
    }

    let defaults = [
        ("button", 3),
        ("motor", 5),
        ("jack", 1),
        ("status_led", 25),
        ("voltage_sense", 26),
    ];
    let mut used: Vec<(u8, &str)> = Vec::new();
    for (key, default) in defaults {
        let pin = config
            .get("pins")
            .and_then(|p| p.get(key))
            .and_then(|v| v.as_str())
            .and_then(parse_pin)
            .map_or(default, |(pin, _)| pin);
        if let Some((_, other)) = used.iter().find(|(p, _)| *p == pin) {
            errors.push(format!("gpio{} used by both {} and {}", pin, other, key));
        }
        used.push((pin, key));
    }
}
