//! Simulated JTAG target for running the engine without hardware.
extern crate std;

use std::collections::VecDeque;
use std::vec::Vec;

use crate::pins::JtagPins;

/// The TMS/TDI levels latched on one rising edge of TCK.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Cycle {
    pub tms: bool,
    pub tdi: bool,
}

/// A target whose TDO is its TDI delayed by a fixed number of clock cycles,
/// like a chain of `delay` bypass registers. Before the chain has filled, TDO reads low.
///
/// Every latched cycle is recorded, and so is any change of TMS or TDI while TCK is high.
#[derive(Debug)]
pub struct LoopbackTarget {
    delay: usize,
    chain: VecDeque<bool>,
    tck: bool,
    tms: bool,
    tdi: bool,
    tdo: bool,
    cycles: Vec<Cycle>,
    violations: usize,
}

impl LoopbackTarget {
    pub fn new(delay: usize) -> LoopbackTarget {
        LoopbackTarget {
            delay,
            chain: VecDeque::with_capacity(delay + 1),
            tck: false,
            tms: false,
            tdi: false,
            tdo: false,
            cycles: Vec::new(),
            violations: 0,
        }
    }

    /// All cycles clocked so far, oldest first.
    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    pub fn clear_cycles(&mut self) {
        self.cycles.clear();
    }

    /// Number of times TMS or TDI changed while TCK was high.
    pub fn violations(&self) -> usize {
        self.violations
    }

    fn rising_edge(&mut self) {
        self.cycles.push(Cycle {
            tms: self.tms,
            tdi: self.tdi,
        });
        self.chain.push_back(self.tdi);
        self.tdo = if self.chain.len() > self.delay {
            self.chain.pop_front().unwrap_or(false)
        } else {
            false
        };
    }
}

impl JtagPins for LoopbackTarget {
    fn set_tck(&mut self, high: bool) {
        if high && !self.tck {
            self.tck = true;
            self.rising_edge();
        } else {
            self.tck = high;
        }
    }

    fn set_tms(&mut self, high: bool) {
        if self.tck && self.tms != high {
            self.violations += 1;
        }
        self.tms = high;
    }

    fn set_tdi(&mut self, high: bool) {
        if self.tck && self.tdi != high {
            self.violations += 1;
        }
        self.tdi = high;
    }

    fn tdo(&mut self) -> bool {
        self.tdo
    }
}
