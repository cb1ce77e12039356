//! JTAG line drivers.
use core::convert::Infallible;

use embedded_hal::digital::{InputPin, OutputPin, PinState};

/// The four JTAG signals as seen from the adapter.
///
/// Implementors only set and read levels. The order in which the lines are driven within a
/// clock cycle is fixed by [`JtagPins::cycle`].
pub trait JtagPins {
    fn set_tck(&mut self, high: bool);
    fn set_tms(&mut self, high: bool);
    fn set_tdi(&mut self, high: bool);
    fn tdo(&mut self) -> bool;

    /// Runs one TCK cycle and returns the sampled TDO level.
    ///
    /// Targets latch TMS and TDI on the rising edge of TCK and hold TDO valid while TCK is
    /// high, so the sequence must stay: TCK low, TDI, TMS, TCK high, sample TDO.
    fn cycle(&mut self, tms: bool, tdi: bool) -> bool {
        self.set_tck(false);
        self.set_tdi(tdi);
        self.set_tms(tms);
        self.set_tck(true);
        self.tdo()
    }
}

/// Drives JTAG through `embedded-hal` GPIO pins.
///
/// Bit-banging has no way to recover from a failed pin access, so only pins with
/// infallible operations are accepted, as is the case for memory-mapped MCU GPIO.
pub struct GpioPins<TCK, TMS, TDI, TDO> {
    tck: TCK,
    tms: TMS,
    tdi: TDI,
    tdo: TDO,
}

impl<TCK, TMS, TDI, TDO> GpioPins<TCK, TMS, TDI, TDO>
where
    TCK: OutputPin<Error = Infallible>,
    TMS: OutputPin<Error = Infallible>,
    TDI: OutputPin<Error = Infallible>,
    TDO: InputPin<Error = Infallible>,
{
    pub fn new(tck: TCK, tms: TMS, tdi: TDI, tdo: TDO) -> Self {
        GpioPins { tck, tms, tdi, tdo }
    }

    /// Gives the pins back.
    pub fn release(self) -> (TCK, TMS, TDI, TDO) {
        (self.tck, self.tms, self.tdi, self.tdo)
    }
}

impl<TCK, TMS, TDI, TDO> JtagPins for GpioPins<TCK, TMS, TDI, TDO>
where
    TCK: OutputPin<Error = Infallible>,
    TMS: OutputPin<Error = Infallible>,
    TDI: OutputPin<Error = Infallible>,
    TDO: InputPin<Error = Infallible>,
{
    fn set_tck(&mut self, high: bool) {
        let Ok(()) = self.tck.set_state(PinState::from(high));
    }

    fn set_tms(&mut self, high: bool) {
        let Ok(()) = self.tms.set_state(PinState::from(high));
    }

    fn set_tdi(&mut self, high: bool) {
        let Ok(()) = self.tdi.set_state(PinState::from(high));
    }

    fn tdo(&mut self) -> bool {
        let Ok(high) = self.tdo.is_high();
        high
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use embedded_hal::digital::ErrorType;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec;

    type Log = Rc<RefCell<Vec<(&'static str, bool)>>>;

    struct FakePin {
        name: &'static str,
        log: Log,
        level: bool,
    }

    impl ErrorType for FakePin {
        type Error = Infallible;
    }

    impl OutputPin for FakePin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.log.borrow_mut().push((self.name, false));
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.log.borrow_mut().push((self.name, true));
            Ok(())
        }
    }

    impl InputPin for FakePin {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            self.log.borrow_mut().push((self.name, self.level));
            Ok(self.level)
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.level)
        }
    }

    #[test]
    fn cycle_drives_lines_in_order() {
        let log = Log::default();
        let pin = |name| FakePin {
            name,
            log: log.clone(),
            level: true,
        };
        let mut pins = GpioPins::new(pin("tck"), pin("tms"), pin("tdi"), pin("tdo"));

        assert!(pins.cycle(true, false));
        assert_eq!(
            *log.borrow(),
            vec![
                ("tck", false),
                ("tdi", false),
                ("tms", true),
                ("tck", true),
                ("tdo", true),
            ]
        );
    }
}
