//! Burr - Battery Coffee Grinder Firmware
//!
//! Main firmware binary for RP2040-based grinder boards. One button
//! drives the motor (tap for auto-grind, hold for manual grind) and
//! the battery voltage decides when to connect the charging jack.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Config as AdcConfig};
use embassy_rp::gpio::{Input, Output};
use embassy_time::Timer;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use burr_core::config::{parse_config, GrinderConfig};
use burr_core::traits::{AdcDmaRegisters, VoltageSource};
use burr_core::GrinderController;
use burr_drivers::filter::Smoothed;
use burr_drivers::output::Relay;
use burr_drivers::sensor::{AdcDmaAverager, Capture};
use burr_drivers::GrinderBoard;
use burr_hal_rp2040::{EmbassyClock, PinBank, PinError, Rp2040AdcDma};

/// Embedded configuration (compiled into firmware)
/// Edit grinder.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../grinder.toml");

/// Conversions averaged per voltage reading
const ADC_SAMPLES: usize = 32;

/// Moving-average window when smoothing is enabled
const SMOOTHING_WINDOW: usize = 16;

/// Status LED on/off time during the startup self-test
const SELF_TEST_MS: u64 = 500;

// DMA target; must outlive every capture
static CAPTURE_BUF: StaticCell<[u16; ADC_SAMPLES]> = StaticCell::new();

type VoltageCapture = Capture<Rp2040AdcDma<'static>, ADC_SAMPLES>;
type Board<V> = GrinderBoard<Input<'static>, Output<'static>, Output<'static>, V, EmbassyClock>;

/// Failure while claiming peripherals
#[derive(Debug, Clone, Copy, Format)]
enum SetupError {
    Pin(PinError),
    AdcTaken,
    NotAnAdcPin(u8),
}

impl From<PinError> for SetupError {
    fn from(e: PinError) -> Self {
        SetupError::Pin(e)
    }
}

/// Sums of the last DMA capture: sniffer and CPU
trait CaptureDiagnostics {
    fn capture_sums(&self) -> (Option<u32>, u32);
}

impl<R: AdcDmaRegisters, const N: usize> CaptureDiagnostics for Capture<R, N> {
    fn capture_sums(&self) -> (Option<u32>, u32) {
        (self.last_hardware_sum(), self.last_sample_sum())
    }
}

impl<S: CaptureDiagnostics + VoltageSource, const K: usize> CaptureDiagnostics for Smoothed<S, K> {
    fn capture_sums(&self) -> (Option<u32>, u32) {
        self.inner().capture_sums()
    }
}

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Burr firmware starting...");

    let p = embassy_rp::init(Default::default());
    let config = load_config();
    let (mut pins, mut rest) = PinBank::new(p);

    let mut led = match pins.take_output(&config.pins.status_led) {
        Ok(led) => led,
        Err(e) => defmt::panic!("Status LED unavailable: {}", e),
    };
    self_test(&mut led).await;

    let io = match claim_io(&mut pins, &config) {
        Ok(io) => io,
        Err(e) => defmt::panic!("GPIO setup failed: {}", e),
    };

    let capture = match claim_voltage_capture(&mut pins, &mut rest, &config) {
        Ok(capture) => capture,
        Err(e) => defmt::panic!("ADC/DMA setup failed: {}", e),
    };
    info!(
        "Voltage sampling: gpio{} via DMA channel {}, {} samples, smoothing={}",
        config.pins.voltage_sense, config.sampling.dma_channel, ADC_SAMPLES, config.sampling.smoothing
    );

    if config.sampling.smoothing {
        let voltage = Smoothed::<_, SMOOTHING_WINDOW>::new(capture);
        control_loop(io.into_board(voltage, &config), &config).await
    } else {
        control_loop(io.into_board(capture, &config), &config).await
    }
}

/// Parse and validate the embedded config, falling back to defaults
fn load_config() -> GrinderConfig {
    let config = match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to parse grinder.toml: {}, using defaults", e);
            return GrinderConfig::default();
        }
    };

    if let Err(e) = config.validate() {
        warn!("Invalid grinder.toml: {}, using defaults", e);
        return GrinderConfig::default();
    }

    info!(
        "Config: charge {}..{}, stop at {}%, tap {}ms, safety {}ms, debounce {}ms",
        config.thresholds.charge_start,
        config.thresholds.charge_stop,
        config.thresholds.autogrind_stop_percent,
        config.control.tap_timeout_ms,
        config.control.safety_stop_ms,
        config.debounce_ms
    );
    config
}

/// Blink the status LED once and leave it on
async fn self_test(led: &mut Output<'static>) {
    led.set_high();
    Timer::after_millis(SELF_TEST_MS).await;
    led.set_low();
    Timer::after_millis(SELF_TEST_MS).await;
    led.set_high();
}

/// Button and switch outputs, claimed but not yet assembled
struct BoardIo {
    button: Input<'static>,
    motor: Output<'static>,
    jack: Output<'static>,
}

impl BoardIo {
    fn into_board<V: VoltageSource>(self, voltage: V, config: &GrinderConfig) -> Board<V> {
        GrinderBoard::new(
            self.button,
            Relay::from_config(self.motor, &config.pins.motor),
            Relay::from_config(self.jack, &config.pins.jack),
            voltage,
            EmbassyClock,
            config,
        )
    }
}

fn claim_io(pins: &mut PinBank, config: &GrinderConfig) -> Result<BoardIo, SetupError> {
    // Outputs first so the FETs are driven inactive as early as possible
    let motor = pins.take_output(&config.pins.motor)?;
    let jack = pins.take_output(&config.pins.jack)?;
    let button = pins.take_input(&config.pins.button)?;

    Ok(BoardIo { button, motor, jack })
}

fn claim_voltage_capture(
    pins: &mut PinBank,
    rest: &mut burr_hal_rp2040::RemainingPeripherals,
    config: &GrinderConfig,
) -> Result<VoltageCapture, SetupError> {
    let gpio = config.pins.voltage_sense;
    let ainsel = config
        .pins
        .voltage_adc_input()
        .ok_or(SetupError::NotAnAdcPin(gpio))?;

    let adc = Adc::new_blocking(rest.take_adc().ok_or(SetupError::AdcTaken)?, AdcConfig::default());
    let input = pins.take_analog(gpio)?;
    let dma = rest.take_dma(config.sampling.dma_channel)?;

    let regs = Rp2040AdcDma::new(adc, input, ainsel, dma, config.sampling.dma_channel);
    let buffer = CAPTURE_BUF.init([0; ADC_SAMPLES]);

    Ok(AdcDmaAverager::new(regs, buffer).begin_capture())
}

/// Run the controller forever
///
/// Each pass re-reads every input, so the loop never blocks; it only
/// yields to let the executor run timers.
async fn control_loop<V>(board: Board<V>, config: &GrinderConfig) -> !
where
    V: VoltageSource + CaptureDiagnostics,
{
    let mut controller = GrinderController::new(board, config.control);
    info!("Grinder ready, state {}", controller.state().kind());

    loop {
        if let Some(transition) = controller.run() {
            info!(
                "{} -> {} (voltage {})",
                transition.from,
                transition.to,
                controller.voltage()
            );
        }

        // The sniffer is unreliable on some targets; the CPU sum is authoritative
        if let (Some(hw), cpu) = controller.hardware().voltage_source().capture_sums() {
            if hw != cpu {
                debug!("Sniffer sum {} differs from sample sum {}", hw, cpu);
            }
        }
        trace!(
            "voltage={} button={}",
            controller.voltage(),
            controller.button_state()
        );

        embassy_futures::yield_now().await;
    }
}
