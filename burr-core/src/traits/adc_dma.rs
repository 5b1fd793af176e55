//! ADC + DMA register-level operations
//!
//! The averaging driver sequences these operations; a chip HAL
//! implements them over the memory-mapped ADC and DMA channel registers.
//! Implementations own the DMA channel they drive so nothing else can
//! race on it.
//!
//! Expected sequence for one capture:
//!
//! ```text
//! configure                        (once)
//! drain_fifo -> reset_accumulator -> arm_transfer -> start_free_running
//! transfer_busy ... transfer_busy == false
//! stop_free_running -> disarm_transfer
//! ```

/// Register-level access to an ADC feeding a DMA channel
pub trait AdcDmaRegisters {
    /// One-time setup: FIFO with DREQ at threshold 1, input select,
    /// full-speed clock divider, DMA paced by the ADC DREQ with
    /// 16-bit write-incrementing transfers, sniffer in sum mode
    fn configure(&mut self);

    /// Wait for the ADC to be ready, then discard anything in its FIFO
    fn drain_fifo(&mut self);

    /// Zero the hardware sum accumulator (sniffer)
    fn reset_accumulator(&mut self);

    /// Point the DMA channel at `buffer`, set the transfer count to
    /// `buffer.len()` and enable the channel
    ///
    /// The hardware keeps writing to `buffer` after this returns; the
    /// caller must not touch it until `transfer_busy` reports false.
    fn arm_transfer(&mut self, buffer: &mut [u16]);

    /// Select the input and start free-running conversions
    fn start_free_running(&mut self);

    /// DMA channel still has transfers outstanding
    fn transfer_busy(&self) -> bool;

    /// Stop free-running conversions
    fn stop_free_running(&mut self);

    /// Disable the DMA channel
    fn disarm_transfer(&mut self);

    /// Value of the hardware sum accumulator, if the target supports it
    fn accumulator(&self) -> Option<u32>;
}
