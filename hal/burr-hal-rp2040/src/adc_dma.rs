//! ADC capture into a DMA channel
//!
//! The ADC free-runs on a single input and pushes every conversion into
//! its FIFO; the FIFO raises DREQ at a threshold of one sample, pacing
//! a DMA channel that writes 16-bit results into the capture buffer.
//! The DMA sniffer sums the transferred words as they pass.
//!
//! Register access goes through `embassy_rp::pac`. The embassy `Adc`
//! and analog `Channel` are still created and held, so the ADC block
//! stays powered and the input pad stays in analog mode.

use core::sync::atomic::{compiler_fence, Ordering};

use burr_core::traits::AdcDmaRegisters;
use embassy_rp::adc::{Adc, Blocking, Channel};
use embassy_rp::dma::AnyChannel;
use embassy_rp::pac;
use embassy_rp::pac::dma::vals::{Calc, DataSize, TreqSel};
use embassy_rp::Peri;

/// ADC + DMA register bank for one analog input
pub struct Rp2040AdcDma<'d> {
    _adc: Adc<'d, Blocking>,
    _input: Channel<'d>,
    _dma: Peri<'d, AnyChannel>,
    /// ADC input index (0-3 for GPIO26-29)
    ainsel: u8,
    /// DMA channel number matching `_dma`
    channel: u8,
}

impl<'d> Rp2040AdcDma<'d> {
    /// Take ownership of the ADC, the analog input and a DMA channel
    ///
    /// `ainsel` selects the ADC input the channel was created for and
    /// `channel` must be the number of the DMA channel passed in.
    pub fn new(
        adc: Adc<'d, Blocking>,
        input: Channel<'d>,
        ainsel: u8,
        dma: Peri<'d, AnyChannel>,
        channel: u8,
    ) -> Self {
        Self {
            _adc: adc,
            _input: input,
            _dma: dma,
            ainsel,
            channel,
        }
    }

    fn dma(&self) -> pac::dma::Channel {
        pac::DMA.ch(self.channel as usize)
    }
}

impl AdcDmaRegisters for Rp2040AdcDma<'_> {
    fn configure(&mut self) {
        let adc = pac::ADC;
        adc.cs().modify(|w| {
            w.set_rrobin(0);
            w.set_ainsel(self.ainsel);
        });
        // Divider 0: back-to-back conversions, 96 cycles each
        adc.div().modify(|w| {
            w.set_int(0);
            w.set_frac(0);
        });
        adc.fcs().modify(|w| {
            w.set_en(true);
            w.set_dreq_en(true);
            w.set_thresh(1);
            w.set_err(false);
            w.set_shift(false);
        });

        let ch = self.dma();
        ch.read_addr().write_value(adc.fifo().as_ptr() as u32);
        ch.ctrl_trig().write(|w| {
            // Chaining to itself disables chaining
            w.set_chain_to(self.channel);
            w.set_incr_read(false);
            w.set_incr_write(true);
            w.set_irq_quiet(true);
            w.set_treq_sel(TreqSel::ADC);
            w.set_data_size(DataSize::SIZE_HALFWORD);
            w.set_sniff_en(true);
            w.set_en(false);
        });

        pac::DMA.sniff_ctrl().write(|w| {
            w.set_calc(Calc::SUM);
            w.set_dmach(self.channel);
            w.set_en(true);
        });
    }

    fn drain_fifo(&mut self) {
        let adc = pac::ADC;
        while !adc.cs().read().ready() {
            core::hint::spin_loop();
        }
        while !adc.fcs().read().empty() {
            let _ = adc.fifo().read();
        }
    }

    fn reset_accumulator(&mut self) {
        pac::DMA.sniff_data().write_value(0);
    }

    fn arm_transfer(&mut self, buffer: &mut [u16]) {
        let ch = self.dma();
        ch.write_addr().write_value(buffer.as_mut_ptr() as u32);
        ch.trans_count().write_value(buffer.len() as u32);
        // Buffer writes must not be reordered past the trigger
        compiler_fence(Ordering::SeqCst);
        ch.ctrl_trig().modify(|w| w.set_en(true));
    }

    fn start_free_running(&mut self) {
        pac::ADC.cs().modify(|w| {
            w.set_ainsel(self.ainsel);
            w.set_start_many(true);
        });
    }

    fn transfer_busy(&self) -> bool {
        self.dma().ctrl_trig().read().busy()
    }

    fn stop_free_running(&mut self) {
        pac::ADC.cs().modify(|w| w.set_start_many(false));
    }

    fn disarm_transfer(&mut self) {
        let ch = self.dma();
        ch.ctrl_trig().modify(|w| w.set_en(false));
        compiler_fence(Ordering::SeqCst);
    }

    fn accumulator(&self) -> Option<u32> {
        Some(pac::DMA.sniff_data().read())
    }
}
