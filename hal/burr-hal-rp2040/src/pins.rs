//! Dynamic pin allocation for config-driven hardware setup
//!
//! Pins and DMA channels are handed out by number, so the board wiring
//! lives in `grinder.toml` instead of the firmware source.

use burr_core::config::{PinConfig, DMA_CHANNELS, GPIO_COUNT};
use embassy_rp::adc;
use embassy_rp::dma::AnyChannel;
use embassy_rp::gpio::{AnyPin, Input, Level, Output, Pull};
use embassy_rp::peripherals::{ADC, PIN_26, PIN_27, PIN_28, PIN_29};
use embassy_rp::{Peri, Peripherals};

/// Error when requesting a pin or DMA channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin(u8),
    /// Pin already taken
    AlreadyTaken(u8),
    /// Pin has no ADC input
    NotAnalog(u8),
    /// DMA channel out of range (0-11 valid)
    InvalidDmaChannel(u8),
    /// DMA channel already taken
    DmaChannelTaken(u8),
}

/// Pins 0-25 are plain GPIO; 26-29 are kept typed so they can still
/// become ADC inputs.
const DIGITAL_ONLY: usize = 26;

/// Pin bank that holds all GPIO pins and allows taking them by number
pub struct PinBank {
    digital: [Option<Peri<'static, AnyPin>>; DIGITAL_ONLY],
    pin26: Option<Peri<'static, PIN_26>>,
    pin27: Option<Peri<'static, PIN_27>>,
    pin28: Option<Peri<'static, PIN_28>>,
    pin29: Option<Peri<'static, PIN_29>>,
}

impl PinBank {
    /// Split the peripherals into the pin bank and everything else
    pub fn new(p: Peripherals) -> (Self, RemainingPeripherals) {
        let bank = Self {
            digital: [
                Some(p.PIN_0.into()),
                Some(p.PIN_1.into()),
                Some(p.PIN_2.into()),
                Some(p.PIN_3.into()),
                Some(p.PIN_4.into()),
                Some(p.PIN_5.into()),
                Some(p.PIN_6.into()),
                Some(p.PIN_7.into()),
                Some(p.PIN_8.into()),
                Some(p.PIN_9.into()),
                Some(p.PIN_10.into()),
                Some(p.PIN_11.into()),
                Some(p.PIN_12.into()),
                Some(p.PIN_13.into()),
                Some(p.PIN_14.into()),
                Some(p.PIN_15.into()),
                Some(p.PIN_16.into()),
                Some(p.PIN_17.into()),
                Some(p.PIN_18.into()),
                Some(p.PIN_19.into()),
                Some(p.PIN_20.into()),
                Some(p.PIN_21.into()),
                Some(p.PIN_22.into()),
                Some(p.PIN_23.into()),
                Some(p.PIN_24.into()),
                Some(p.PIN_25.into()),
            ],
            pin26: Some(p.PIN_26),
            pin27: Some(p.PIN_27),
            pin28: Some(p.PIN_28),
            pin29: Some(p.PIN_29),
        };

        let remaining = RemainingPeripherals {
            adc: Some(p.ADC),
            dma: [
                Some(p.DMA_CH0.into()),
                Some(p.DMA_CH1.into()),
                Some(p.DMA_CH2.into()),
                Some(p.DMA_CH3.into()),
                Some(p.DMA_CH4.into()),
                Some(p.DMA_CH5.into()),
                Some(p.DMA_CH6.into()),
                Some(p.DMA_CH7.into()),
                Some(p.DMA_CH8.into()),
                Some(p.DMA_CH9.into()),
                Some(p.DMA_CH10.into()),
                Some(p.DMA_CH11.into()),
            ],
        };

        (bank, remaining)
    }

    /// Take a pin by number
    pub fn take(&mut self, pin_num: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        let taken = match pin_num {
            n if (n as usize) < DIGITAL_ONLY => self.digital[n as usize].take(),
            26 => self.pin26.take().map(|p| p.into()),
            27 => self.pin27.take().map(|p| p.into()),
            28 => self.pin28.take().map(|p| p.into()),
            29 => self.pin29.take().map(|p| p.into()),
            n => return Err(PinError::InvalidPin(n)),
        };
        taken.ok_or(PinError::AlreadyTaken(pin_num))
    }

    /// Take an ADC-capable pin and configure it as an analog input
    pub fn take_analog(&mut self, pin_num: u8) -> Result<adc::Channel<'static>, PinError> {
        let taken = match pin_num {
            26 => self.pin26.take().map(|p| adc::Channel::new_pin(p, Pull::None)),
            27 => self.pin27.take().map(|p| adc::Channel::new_pin(p, Pull::None)),
            28 => self.pin28.take().map(|p| adc::Channel::new_pin(p, Pull::None)),
            29 => self.pin29.take().map(|p| adc::Channel::new_pin(p, Pull::None)),
            n if n < GPIO_COUNT => return Err(PinError::NotAnalog(n)),
            n => return Err(PinError::InvalidPin(n)),
        };
        taken.ok_or(PinError::AlreadyTaken(pin_num))
    }

    /// Take a pin as an input, with the pull-up if the config asks for it
    pub fn take_input(&mut self, config: &PinConfig) -> Result<Input<'static>, PinError> {
        let pull = if config.pull_up { Pull::Up } else { Pull::None };
        Ok(Input::new(self.take(config.pin)?, pull))
    }

    /// Take a pin as an output, starting at its inactive level
    pub fn take_output(&mut self, config: &PinConfig) -> Result<Output<'static>, PinError> {
        // Active-low outputs idle high
        Ok(Output::new(self.take(config.pin)?, Level::from(config.inverted)))
    }
}

/// Non-GPIO peripherals the firmware needs after creating the pin bank
pub struct RemainingPeripherals {
    adc: Option<Peri<'static, ADC>>,
    dma: [Option<Peri<'static, AnyChannel>>; DMA_CHANNELS as usize],
}

impl RemainingPeripherals {
    /// Take the ADC block
    pub fn take_adc(&mut self) -> Option<Peri<'static, ADC>> {
        self.adc.take()
    }

    /// Take a DMA channel by number
    pub fn take_dma(&mut self, channel: u8) -> Result<Peri<'static, AnyChannel>, PinError> {
        self.dma
            .get_mut(channel as usize)
            .ok_or(PinError::InvalidDmaChannel(channel))?
            .take()
            .ok_or(PinError::DmaChannelTaken(channel))
    }
}
