//! DMA-driven ADC averaging
//!
//! Each reading is the integer mean of `N` back-to-back conversions,
//! written into a buffer by the DMA channel while the CPU keeps running
//! the control loop. The driver is a typestate pair:
//!
//! - [`AdcDmaAverager`]: configured, no transfer in flight
//! - [`Capture`]: a transfer is in flight and owns the buffer
//!
//! Because the in-flight state owns both the registers and the buffer,
//! the buffer cannot be read, or a second capture started, until the
//! DMA has finished. The mean is always computed by the CPU from the
//! buffer; the hardware sum accumulator is kept only for diagnostics.
//!
//! The buffer is `'static` and dropping a driver with a transfer armed
//! waits for it and shuts the hardware down, so the DMA never writes
//! into memory that has been handed back.

use burr_core::traits::{AdcDmaRegisters, VoltageSample, VoltageSource};

fn sum(samples: &[u16]) -> u32 {
    samples.iter().map(|&s| u32::from(s)).sum()
}

/// ADC + DMA averaging driver, idle
pub struct AdcDmaAverager<R: AdcDmaRegisters, const N: usize> {
    regs: R,
    buffer: &'static mut [u16; N],
    armed: bool,
    hardware_sum: Option<u32>,
    sample_sum: u32,
}

impl<R: AdcDmaRegisters, const N: usize> AdcDmaAverager<R, N> {
    const NON_EMPTY: () = assert!(N >= 1, "capture buffer needs at least one sample");

    /// Configure the hardware and take ownership of the sample buffer
    ///
    /// In firmware the buffer comes from a `StaticCell`.
    pub fn new(mut regs: R, buffer: &'static mut [u16; N]) -> Self {
        let () = Self::NON_EMPTY;

        regs.configure();
        Self {
            regs,
            buffer,
            armed: false,
            hardware_sum: None,
            sample_sum: 0,
        }
    }

    /// Start a capture of `N` conversions
    pub fn begin_capture(mut self) -> Capture<R, N> {
        self.arm();
        Capture { inner: self }
    }

    /// Hardware accumulator value from the last completed capture
    pub fn last_hardware_sum(&self) -> Option<u32> {
        self.hardware_sum
    }

    /// CPU-side sum of the last completed capture
    pub fn last_sample_sum(&self) -> u32 {
        self.sample_sum
    }

    /// Samples from the last completed capture
    pub fn samples(&self) -> &[u16; N] {
        self.buffer
    }

    /// Underlying register bank
    pub fn registers(&self) -> &R {
        &self.regs
    }

    fn arm(&mut self) {
        self.regs.drain_fifo();
        self.regs.reset_accumulator();
        self.regs.arm_transfer(&mut self.buffer[..]);
        self.regs.start_free_running();
        self.armed = true;
    }

    fn finish(&mut self) -> VoltageSample {
        // Let the transfer run out before stopping, or the ADC can be
        // left with a conversion pending
        while self.regs.transfer_busy() {
            core::hint::spin_loop();
        }
        self.regs.stop_free_running();
        self.regs.disarm_transfer();
        self.armed = false;

        self.hardware_sum = self.regs.accumulator();
        self.sample_sum = sum(&self.buffer[..]);
        (self.sample_sum / N as u32) as VoltageSample
    }
}

impl<R: AdcDmaRegisters, const N: usize> Drop for AdcDmaAverager<R, N> {
    fn drop(&mut self) {
        if self.armed {
            self.finish();
        }
    }
}

/// ADC + DMA averaging driver with a capture in flight
///
/// Dropping it stops the ADC and disarms the DMA channel once the
/// pending transfer has completed.
pub struct Capture<R: AdcDmaRegisters, const N: usize> {
    inner: AdcDmaAverager<R, N>,
}

impl<R: AdcDmaRegisters, const N: usize> Capture<R, N> {
    /// DMA has written all `N` samples
    pub fn is_complete(&self) -> bool {
        !self.inner.regs.transfer_busy()
    }

    /// Wait for the capture, stop the hardware and return the mean
    /// together with the idle driver
    pub fn await_result(mut self) -> (VoltageSample, AdcDmaAverager<R, N>) {
        let value = self.inner.finish();
        (value, self.inner)
    }

    /// Wait for the capture, return its mean and immediately start the
    /// next one
    ///
    /// This is the steady-state call of the control loop: one capture
    /// always runs in the background while the loop does its work.
    pub fn await_and_rearm(&mut self) -> VoltageSample {
        let value = self.inner.finish();
        self.inner.arm();
        value
    }

    /// Hardware accumulator value from the last completed capture
    pub fn last_hardware_sum(&self) -> Option<u32> {
        self.inner.hardware_sum
    }

    /// CPU-side sum of the last completed capture
    pub fn last_sample_sum(&self) -> u32 {
        self.inner.sample_sum
    }
}

impl<R: AdcDmaRegisters, const N: usize> VoltageSource for Capture<R, N> {
    fn read_voltage(&mut self) -> VoltageSample {
        self.await_and_rearm()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::cell::{Cell, RefCell};
    use std::boxed::Box;
    use std::rc::Rc;
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Op {
        Configure,
        Drain,
        ResetAcc,
        Arm(usize),
        Start,
        Stop,
        Disarm,
    }

    type OpLog = Rc<RefCell<Vec<Op>>>;

    /// Register bank that "transfers" scripted captures into the buffer
    struct FakeRegs {
        captures: Vec<Vec<u16>>,
        next: usize,
        /// Shared so it can be inspected after the driver is gone
        ops: OpLog,
        /// Busy polls to report before each capture completes
        busy_polls: u32,
        remaining: Rc<Cell<u32>>,
        /// Reported accumulator, or the real sum when `None`
        accumulator_override: Option<Option<u32>>,
        armed_sum: u32,
    }

    impl FakeRegs {
        fn new(captures: &[&[u16]]) -> Self {
            Self {
                captures: captures.iter().map(|c| c.to_vec()).collect(),
                next: 0,
                ops: OpLog::default(),
                busy_polls: 3,
                remaining: Rc::new(Cell::new(0)),
                accumulator_override: None,
                armed_sum: 0,
            }
        }

        fn ops(&self) -> Vec<Op> {
            self.ops.borrow().clone()
        }

        fn log(&self) -> (OpLog, Rc<Cell<u32>>) {
            (self.ops.clone(), self.remaining.clone())
        }
    }

    impl AdcDmaRegisters for FakeRegs {
        fn configure(&mut self) {
            self.ops.borrow_mut().push(Op::Configure);
        }

        fn drain_fifo(&mut self) {
            self.ops.borrow_mut().push(Op::Drain);
        }

        fn reset_accumulator(&mut self) {
            self.ops.borrow_mut().push(Op::ResetAcc);
            self.armed_sum = 0;
        }

        fn arm_transfer(&mut self, buffer: &mut [u16]) {
            self.ops.borrow_mut().push(Op::Arm(buffer.len()));
            let capture = &self.captures[self.next.min(self.captures.len() - 1)];
            self.next += 1;
            for (dst, &src) in buffer.iter_mut().zip(capture.iter()) {
                *dst = src;
                self.armed_sum += u32::from(src);
            }
            self.remaining.set(self.busy_polls);
        }

        fn start_free_running(&mut self) {
            self.ops.borrow_mut().push(Op::Start);
        }

        fn transfer_busy(&self) -> bool {
            let left = self.remaining.get();
            if left == 0 {
                return false;
            }
            self.remaining.set(left - 1);
            true
        }

        fn stop_free_running(&mut self) {
            self.ops.borrow_mut().push(Op::Stop);
        }

        fn disarm_transfer(&mut self) {
            self.ops.borrow_mut().push(Op::Disarm);
        }

        fn accumulator(&self) -> Option<u32> {
            self.accumulator_override.unwrap_or(Some(self.armed_sum))
        }
    }

    fn buffer<const N: usize>() -> &'static mut [u16; N] {
        Box::leak(Box::new([0u16; N]))
    }

    #[test]
    fn test_capture_sequence() {
        let avg = AdcDmaAverager::new(FakeRegs::new(&[&[100, 200, 300, 401]]), buffer::<4>());
        let capture = avg.begin_capture();
        assert!(!capture.is_complete());

        let (value, avg) = capture.await_result();
        assert_eq!(value, 250);
        assert_eq!(avg.last_hardware_sum(), Some(1001));
        assert_eq!(avg.samples(), &[100, 200, 300, 401]);

        let regs = avg.registers();
        assert_eq!(
            regs.ops(),
            [
                Op::Configure,
                Op::Drain,
                Op::ResetAcc,
                Op::Arm(4),
                Op::Start,
                Op::Stop,
                Op::Disarm,
            ]
        );
        // Polled until the transfer reported done
        assert_eq!(regs.remaining.get(), 0);
    }

    #[test]
    fn test_rearm_keeps_one_capture_in_flight() {
        let regs = FakeRegs::new(&[&[10, 10, 10, 10], &[20, 20, 20, 24], &[30, 30, 30, 30]]);
        let mut capture = AdcDmaAverager::new(regs, buffer::<4>()).begin_capture();

        assert_eq!(capture.read_voltage(), 10);
        assert!(!capture.is_complete());
        assert_eq!(capture.read_voltage(), 21);
        assert_eq!(capture.last_hardware_sum(), Some(84));

        let (value, avg) = capture.await_result();
        assert_eq!(value, 30);

        let ops = avg.registers().ops();
        let arms = ops.iter().filter(|op| matches!(op, Op::Arm(_))).count();
        let stops = ops.iter().filter(|op| **op == Op::Stop).count();
        assert_eq!(arms, 3);
        assert_eq!(stops, 3);
        // Configured exactly once
        assert_eq!(ops.iter().filter(|op| **op == Op::Configure).count(), 1);
        // Every re-arm follows a full stop
        for w in ops.windows(2) {
            if w[1] == Op::Drain && w[0] != Op::Configure {
                assert_eq!(w[0], Op::Disarm);
            }
        }
    }

    #[test]
    fn test_dropped_capture_stops_hardware() {
        let regs = FakeRegs::new(&[&[100, 200, 300, 401]]);
        let (ops, remaining) = regs.log();

        let capture = AdcDmaAverager::new(regs, buffer::<4>()).begin_capture();
        assert!(!capture.is_complete());
        drop(capture);

        // Waited for the transfer, then stopped the ADC and disarmed the DMA
        assert_eq!(remaining.get(), 0);
        assert!(ops.borrow().ends_with(&[Op::Stop, Op::Disarm]));
    }

    #[test]
    fn test_dropped_rearmed_capture_stops_hardware() {
        let regs = FakeRegs::new(&[&[10, 10], &[20, 20]]);
        let (ops, _) = regs.log();

        let mut capture = AdcDmaAverager::new(regs, buffer::<2>()).begin_capture();
        assert_eq!(capture.read_voltage(), 10);
        drop(capture);

        let ops = ops.borrow();
        assert_eq!(ops.last(), Some(&Op::Disarm));
        assert_eq!(
            ops.iter().filter(|op| **op == Op::Start).count(),
            ops.iter().filter(|op| **op == Op::Stop).count()
        );
    }

    #[test]
    fn test_idle_drop_leaves_hardware_alone() {
        let regs = FakeRegs::new(&[&[7, 9]]);
        let (ops, _) = regs.log();

        let (_, avg) = AdcDmaAverager::new(regs, buffer::<2>())
            .begin_capture()
            .await_result();
        let before = ops.borrow().len();
        drop(avg);

        assert_eq!(ops.borrow().len(), before);
    }

    #[test]
    fn test_hardware_sum_not_trusted() {
        let mut regs = FakeRegs::new(&[&[100, 200, 300, 401]]);
        regs.accumulator_override = Some(Some(0));

        let (value, avg) = AdcDmaAverager::new(regs, buffer::<4>())
            .begin_capture()
            .await_result();
        assert_eq!(value, 250);
        assert_eq!(avg.last_hardware_sum(), Some(0));
        assert_eq!(avg.last_sample_sum(), 1001);
    }

    #[test]
    fn test_no_accumulator() {
        let mut regs = FakeRegs::new(&[&[1000, 1002]]);
        regs.accumulator_override = Some(None);
        regs.busy_polls = 0;

        let capture = AdcDmaAverager::new(regs, buffer::<2>()).begin_capture();
        assert!(capture.is_complete());
        let (value, avg) = capture.await_result();
        assert_eq!(value, 1001);
        assert_eq!(avg.last_hardware_sum(), None);
    }

    #[test]
    fn test_full_scale_no_overflow() {
        let samples = [4095u16; 32];
        let (value, _) = AdcDmaAverager::new(FakeRegs::new(&[&samples]), buffer::<32>())
            .begin_capture()
            .await_result();
        assert_eq!(value, 4095);
    }
}
