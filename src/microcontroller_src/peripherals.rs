use std::mem;

const PIN_COUNT: usize = 34;
const TIMERS_COUNT: usize = 2;
const DIGITAL_PINS_BOUNDS: (usize, usize) = (0, 33);
const TIMER_BOUND: (usize, usize) = (0, 1);

/// GPIOs the ESP32 cannot use as general purpose input/output: 6 to 11 are wired to the
/// SPI flash and 20, 24, 28 to 31 are not bonded out.
const UNAVAILABLE_PINS: [usize; 12] = [6, 7, 8, 9, 10, 11, 20, 24, 28, 29, 30, 31];

#[derive(Debug, PartialEq, Eq)]
pub enum PeripheralError {
    AlreadyTaken,
    NotAPin,
    NotAModem,
}

/// Represents an esp32 peripheral that can later be turned into its driver
#[derive(Debug, Default, PartialEq, Eq)]
pub enum Peripheral {
    Pin(u8),
    Timer(u8),
    Modem,
    #[default]
    None,
}

impl Peripheral {
    fn take(&mut self) -> Peripheral {
        mem::take(self)
    }

    /// If the Peripheral is a Pin returns the corresponding AnyIOPin.
    /// If not it returns PeripheralError::NotAPin
    #[cfg(target_os = "espidf")]
    pub fn into_any_io_pin(self) -> Result<esp_idf_svc::hal::gpio::AnyIOPin, PeripheralError> {
        use esp_idf_svc::hal::gpio::*;

        let pin = match self {
            Peripheral::Pin(pin_num) => match pin_num {
                0 => unsafe { Gpio0::new().downgrade() },
                1 => unsafe { Gpio1::new().downgrade() },
                2 => unsafe { Gpio2::new().downgrade() },
                3 => unsafe { Gpio3::new().downgrade() },
                4 => unsafe { Gpio4::new().downgrade() },
                5 => unsafe { Gpio5::new().downgrade() },
                12 => unsafe { Gpio12::new().downgrade() },
                13 => unsafe { Gpio13::new().downgrade() },
                14 => unsafe { Gpio14::new().downgrade() },
                15 => unsafe { Gpio15::new().downgrade() },
                16 => unsafe { Gpio16::new().downgrade() },
                17 => unsafe { Gpio17::new().downgrade() },
                18 => unsafe { Gpio18::new().downgrade() },
                19 => unsafe { Gpio19::new().downgrade() },
                21 => unsafe { Gpio21::new().downgrade() },
                22 => unsafe { Gpio22::new().downgrade() },
                23 => unsafe { Gpio23::new().downgrade() },
                25 => unsafe { Gpio25::new().downgrade() },
                26 => unsafe { Gpio26::new().downgrade() },
                27 => unsafe { Gpio27::new().downgrade() },
                32 => unsafe { Gpio32::new().downgrade() },
                33 => unsafe { Gpio33::new().downgrade() },
                _ => return Err(PeripheralError::NotAPin),
            },
            Peripheral::None => return Err(PeripheralError::AlreadyTaken),
            _ => return Err(PeripheralError::NotAPin),
        };
        Ok(pin)
    }

    /// If the Peripheral is the modem returns it, ready for the wifi driver
    #[cfg(target_os = "espidf")]
    pub fn into_modem(self) -> Result<esp_idf_svc::hal::modem::Modem, PeripheralError> {
        match self {
            Peripheral::Modem => Ok(unsafe { esp_idf_svc::hal::modem::Modem::new() }),
            Peripheral::None => Err(PeripheralError::AlreadyTaken),
            _ => Err(PeripheralError::NotAModem),
        }
    }
}

/// Represents the peripherals of the esp32 the node uses and hands each of them out at
/// most once. Subsequent gets of the same peripheral return Peripheral::None.
pub struct Peripherals {
    pins: [Peripheral; PIN_COUNT],
    timers: [Peripheral; TIMERS_COUNT],
    modem: Peripheral,
}

impl Peripherals {
    pub fn new() -> Peripherals {
        let pins: [Peripheral; PIN_COUNT] = std::array::from_fn(|pin_num| {
            if UNAVAILABLE_PINS.contains(&pin_num) {
                Peripheral::None
            } else {
                Peripheral::Pin(pin_num as u8)
            }
        });
        let timers: [Peripheral; TIMERS_COUNT] = [Peripheral::Timer(0), Peripheral::Timer(1)];
        Peripherals {
            pins,
            timers,
            modem: Peripheral::Modem,
        }
    }

    pub fn get_digital_pin(&mut self, pin_num: usize) -> Peripheral {
        if pin_num >= DIGITAL_PINS_BOUNDS.0 && pin_num <= DIGITAL_PINS_BOUNDS.1 {
            return self.pins[pin_num].take();
        }
        Peripheral::None
    }

    pub fn get_timer(&mut self, timer_num: usize) -> Peripheral {
        if timer_num >= TIMER_BOUND.0 && timer_num <= TIMER_BOUND.1 {
            return self.timers[timer_num].take();
        }
        Peripheral::None
    }

    pub fn get_wifi_peripheral(&mut self) -> Peripheral {
        self.modem.take()
    }
}

impl Default for Peripherals {
    fn default() -> Self {
        Self::new()
    }
}
