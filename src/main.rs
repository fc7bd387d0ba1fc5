//! IC-R71 Programmer Main Application
//!
//! Entry point for the STM32G474-based programmer firmware.
//! Initializes hardware and runs the command loop.

#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_stm32::gpio::{Flex, Level, Output, Speed};
use embassy_stm32::mode::Blocking;
use embassy_stm32::usart::{self, Uart, UartRx, UartTx};
use {defmt_rtt as _, panic_probe as _};

use r71_programmer::console::Console;
use r71_programmer::hal::data_bus::FlexDataBus;
use r71_programmer::prelude::*;
use r71_programmer::programmer::Programmer;

/// Concrete memory driver for this board
type BoardMemory = R71Memory<
    FlexDataBus<'static>,
    Output<'static>,
    Output<'static>,
    Output<'static>,
    Output<'static>,
    Output<'static>,
    Output<'static>,
    Delay,
>;

/// Byte-at-a-time reader over the blocking UART receiver
struct UartReader(UartRx<'static, Blocking>);

impl embedded_io::ErrorType for UartReader {
    type Error = usart::Error;
}

impl embedded_io::Read for UartReader {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match buf.first_mut() {
            Some(byte) => {
                self.0.blocking_read(core::slice::from_mut(byte))?;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("IC-R71 Programmer Firmware v{}", env!("CARGO_PKG_VERSION"));

    // Initialize STM32G474 peripherals with default clock configuration
    let config = embassy_stm32::Config::default();
    let p = embassy_stm32::init(config);

    info!("Peripherals initialized");

    // Data bus DB0..DB3 on PC0..PC3, starts as inputs with pull-ups
    let bus = FlexDataBus::new(
        Flex::new(p.PC0),
        Flex::new(p.PC1),
        Flex::new(p.PC2),
        Flex::new(p.PC3),
    );

    // Idle levels: chip deselected, counter held in reset, writes protected, LED off
    let pins = ControlPins {
        chip_enable: Output::new(p.PB2, Level::High, Speed::Low),
        write_strobe: Output::new(p.PB0, Level::High, Speed::Low),
        write_protect: Output::new(p.PB7, Level::Low, Speed::Low),
        counter_clock: Output::new(p.PC4, Level::Low, Speed::Low),
        counter_reset: Output::new(p.PC5, Level::High, Speed::Low),
        led: Output::new(p.PA5, Level::High, Speed::Low),
    };
    let memory = R71Memory::new(bus, pins, Delay);

    // USART2 on PA2 (TX) / PA3 (RX), 57600 8-N-1, blocking
    let mut uart_config = usart::Config::default();
    uart_config.baudrate = UART_BAUD_RATE;
    let uart = match Uart::new_blocking(p.USART2, p.PA3, p.PA2, uart_config) {
        Ok(uart) => uart,
        Err(_) => defmt::panic!("USART2 configuration rejected"),
    };
    let (tx, rx) = uart.split();

    info!("Memory driver and UART initialized at {} baud", UART_BAUD_RATE);

    spawner.spawn(programmer_task(memory, tx, rx)).unwrap();
}

/// Command loop - owns the memory and the console for the firmware's lifetime
#[embassy_executor::task]
async fn programmer_task(
    memory: BoardMemory,
    tx: UartTx<'static, Blocking>,
    rx: UartRx<'static, Blocking>,
) {
    let mut console = Console::new(UartReader(rx), tx);
    let mut programmer = Programmer::new(memory);

    if programmer.greet(&mut console).is_err() {
        warn!("banner not sent");
    }

    loop {
        match programmer.serve(&mut console) {
            Ok(Some(command)) => debug!("{} done", command),
            Ok(None) => {}
            Err(e) => {
                error!("{}", e);
                Timer::after(Duration::from_millis(100)).await;
            }
        }
    }
}
