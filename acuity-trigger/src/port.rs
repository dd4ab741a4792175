use crate::TriggerCode;
use log::debug;
use serial2::SerialPort;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("trigger device unavailable: {0}")]
    Io(#[from] std::io::Error),
}

/// Outbound trigger channel. `send` must return promptly whether or not a
/// device is connected; callers treat failure as a degradation, not a fault.
pub trait TriggerPort {
    fn send(&mut self, code: TriggerCode) -> Result<(), TriggerError>;
}

/// Serial transport speaking the recorder's one-byte protocol: write the
/// code, then immediately write zero to rearm the line.
pub struct SerialTrigger {
    port: SerialPort,
}

impl SerialTrigger {
    /// Opens the port and resets the trigger line. The write timeout bounds
    /// every later `send` so a disconnected cable cannot extend a stimulus
    /// frame.
    pub fn open(path: &str, baud_rate: u32, write_timeout: Duration) -> Result<Self, TriggerError> {
        let mut port = SerialPort::open(path, baud_rate)?;
        port.set_write_timeout(write_timeout)?;
        let mut trigger = SerialTrigger { port };
        trigger.write_byte(0)?;
        Ok(trigger)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), TriggerError> {
        self.port.write_all(&[byte])?;
        Ok(())
    }
}

impl TriggerPort for SerialTrigger {
    fn send(&mut self, code: TriggerCode) -> Result<(), TriggerError> {
        self.write_byte(code.value())?;
        self.write_byte(0)?;
        debug!("trigger {} sent", code.value());
        Ok(())
    }
}

/// Stand-in used when no recorder is attached; codes are logged and dropped.
#[derive(Debug, Default)]
pub struct NullTrigger;

impl TriggerPort for NullTrigger {
    fn send(&mut self, code: TriggerCode) -> Result<(), TriggerError> {
        debug!("trigger {} simulated (no device)", code.value());
        Ok(())
    }
}
