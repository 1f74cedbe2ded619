//! TI TCA6416A 16-bit I/O expander.
//!
//! Two 8-bit ports, each pin individually configured as input or output.
//! On the X65 the register file is mapped straight into the CPU address
//! space instead of sitting behind I2C.
//!
//! # Registers ($0-$7)
//!
//! | Reg | Name      | Description                              |
//! |-----|-----------|------------------------------------------|
//! | $0  | INPUT0    | Port 0 pin levels, polarity applied (read-only) |
//! | $1  | INPUT1    | Port 1 pin levels, polarity applied (read-only) |
//! | $2  | OUTPUT0   | Port 0 output latch                      |
//! | $3  | OUTPUT1   | Port 1 output latch                      |
//! | $4  | POLARITY0 | Port 0 read inversion (1 = inverted)     |
//! | $5  | POLARITY1 | Port 1 read inversion                    |
//! | $6  | CONFIG0   | Port 0 direction (1 = input)             |
//! | $7  | CONFIG1   | Port 1 direction (1 = input)             |
//!
//! The interrupt output is asserted while any input pin differs from the
//! level captured at the last read of its port's INPUT register.

use emu_core::{Chip, Observable, Pins, Value};

const REG_INPUT0: u8 = 0;
const REG_OUTPUT0: u8 = 2;
const REG_POLARITY0: u8 = 4;
const REG_CONFIG0: u8 = 6;

/// TCA6416A I/O expander.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tca6416a {
    /// Output latches.
    output: [u8; 2],
    /// Read inversion masks.
    polarity: [u8; 2],
    /// Direction masks (1 = input).
    config: [u8; 2],
    /// Levels driven onto the pins from outside.
    external: [u8; 2],
    /// Pin levels captured at the last INPUT read, per port.
    snapshot: [u8; 2],
}

impl Tca6416a {
    /// Create an expander in its power-on state: all pins inputs, pulled
    /// high, output latches high, no inversion.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: [0xFF; 2],
            polarity: [0x00; 2],
            config: [0xFF; 2],
            external: [0xFF; 2],
            snapshot: [0xFF; 2],
        }
    }

    /// Drive the external levels of a port (0 or 1).
    ///
    /// Levels on output-configured pins are ignored: the latch wins.
    pub fn set_port_inputs(&mut self, port: usize, value: u8) {
        self.external[port & 1] = value;
    }

    /// Levels the expander drives on a port. Input pins float high.
    #[must_use]
    pub fn port_outputs(&self, port: usize) -> u8 {
        let p = port & 1;
        self.output[p] | self.config[p]
    }

    /// True while an input pin has changed since its port was last read.
    #[must_use]
    pub fn interrupt(&self) -> bool {
        (0..2).any(|p| (self.level(p) ^ self.snapshot[p]) & self.config[p] != 0)
    }

    /// Pin levels on a port before polarity inversion.
    fn level(&self, port: usize) -> u8 {
        (self.external[port] & self.config[port]) | (self.output[port] & !self.config[port])
    }

    /// Register read. Reading INPUT captures the port for change detection.
    pub fn read(&mut self, reg: u8) -> u8 {
        let port = usize::from(reg & 1);
        match (reg & 0x07) & !1 {
            REG_INPUT0 => {
                let level = self.level(port);
                self.snapshot[port] = level;
                level ^ self.polarity[port]
            }
            REG_OUTPUT0 => self.output[port],
            REG_POLARITY0 => self.polarity[port],
            REG_CONFIG0 => self.config[port],
            _ => unreachable!(),
        }
    }

    /// Register write. INPUT registers ignore writes.
    pub fn write(&mut self, reg: u8, value: u8) {
        let port = usize::from(reg & 1);
        match (reg & 0x07) & !1 {
            REG_INPUT0 => {}
            REG_OUTPUT0 => self.output[port] = value,
            REG_POLARITY0 => self.polarity[port] = value,
            REG_CONFIG0 => self.config[port] = value,
            _ => unreachable!(),
        }
    }
}

impl Default for Tca6416a {
    fn default() -> Self {
        Self::new()
    }
}

impl Chip for Tca6416a {
    fn tick(&mut self, mut pins: Pins) -> Pins {
        if pins.any(Pins::CS_GPIO) {
            let reg = pins.addr16() as u8;
            if pins.is_read() {
                pins = pins.with_data(self.read(reg));
            } else {
                self.write(reg, pins.data());
            }
        }
        pins.with(Pins::GPIO_INT, self.interrupt())
    }

    fn reset(&mut self) {
        let external = self.external;
        *self = Self::new();
        self.external = external;
        self.snapshot = [self.level(0), self.level(1)];
    }
}

impl Observable for Tca6416a {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "input0" => Some((self.level(0) ^ self.polarity[0]).into()),
            "input1" => Some((self.level(1) ^ self.polarity[1]).into()),
            "output0" => Some(self.output[0].into()),
            "output1" => Some(self.output[1].into()),
            "polarity0" => Some(self.polarity[0].into()),
            "polarity1" => Some(self.polarity[1].into()),
            "config0" => Some(self.config[0].into()),
            "config1" => Some(self.config[1].into()),
            "interrupt" => Some(self.interrupt().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "input0", "input1", "output0", "output1", "polarity0", "polarity1", "config0",
            "config1", "interrupt",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(reg: u16) -> Pins {
        Pins::new().with_address(0xFF80 | u32::from(reg)).set(Pins::CS_GPIO)
    }

    fn bus_read(gpio: &mut Tca6416a, reg: u16) -> u8 {
        gpio.tick(select(reg).set(Pins::RW | Pins::VDA)).data()
    }

    fn bus_write(gpio: &mut Tca6416a, reg: u16, value: u8) {
        let _ = gpio.tick(select(reg).set(Pins::VDA).with_data(value));
    }

    #[test]
    fn power_on_state() {
        let mut gpio = Tca6416a::new();
        assert_eq!(gpio.read(0), 0xFF);
        assert_eq!(gpio.read(2), 0xFF);
        assert_eq!(gpio.read(4), 0x00);
        assert_eq!(gpio.read(6), 0xFF);
        assert!(!gpio.interrupt());
    }

    #[test]
    fn output_pins_reflect_the_latch() {
        let mut gpio = Tca6416a::new();
        bus_write(&mut gpio, 6, 0xF0);
        bus_write(&mut gpio, 2, 0x05);
        gpio.set_port_inputs(0, 0x3F);
        assert_eq!(bus_read(&mut gpio, 0), 0x35);
        assert_eq!(gpio.port_outputs(0), 0xF5);
    }

    #[test]
    fn polarity_inverts_reads() {
        let mut gpio = Tca6416a::new();
        gpio.set_port_inputs(1, 0x0F);
        bus_write(&mut gpio, 5, 0xFF);
        assert_eq!(bus_read(&mut gpio, 1), 0xF0);
    }

    #[test]
    fn input_register_ignores_writes() {
        let mut gpio = Tca6416a::new();
        bus_write(&mut gpio, 0, 0x00);
        assert_eq!(bus_read(&mut gpio, 0), 0xFF);
    }

    #[test]
    fn change_on_input_raises_interrupt_until_read() {
        let mut gpio = Tca6416a::new();
        gpio.set_port_inputs(1, 0xFE);
        let pins = gpio.tick(Pins::new());
        assert!(pins.any(Pins::GPIO_INT));

        // Reading the other port leaves it pending.
        let _ = bus_read(&mut gpio, 0);
        assert!(gpio.interrupt());

        let pins = gpio.tick(select(1).set(Pins::RW | Pins::VDA));
        assert_eq!(pins.data(), 0xFE);
        assert!(!pins.any(Pins::GPIO_INT));
    }

    #[test]
    fn output_pins_never_interrupt() {
        let mut gpio = Tca6416a::new();
        bus_write(&mut gpio, 6, 0x00);
        let _ = bus_read(&mut gpio, 0);
        gpio.set_port_inputs(0, 0x00);
        assert!(!gpio.interrupt());
        bus_write(&mut gpio, 2, 0x00);
        assert!(!gpio.interrupt());
    }

    #[test]
    fn reset_keeps_external_levels() {
        let mut gpio = Tca6416a::new();
        gpio.set_port_inputs(0, 0x12);
        bus_write(&mut gpio, 4, 0xFF);
        gpio.reset();
        assert_eq!(gpio.read(4), 0x00);
        assert_eq!(gpio.read(0), 0x12);
        assert!(!gpio.interrupt());
    }
}
