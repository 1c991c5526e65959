//! Bit-packed configuration registers.
//!
//! Each register is a named-field struct with a pure `encode()` returning
//! `[low, high]`.  Field positions follow the VCNL4040 datasheet:
//!
//! ```text
//! ALS_CONF   (0x00)  L: IT[7:6]   .  .  PERS[3:2]  INT_EN[1]  SD[0]
//!                    H: reserved
//! PS_CONF1/2 (0x03)  L: DUTY[7:6] PERS[5:4] IT[3:1] SD[0]
//!                    H: HD[3] INT[1:0]
//! PS_CONF3/MS(0x04)  L: MPS[6:5] SMART_PERS[4] AF[3] TRIG[2] SC_EN[0]
//!                    H: WHITE_EN_N[7] MS[6] LED_I[2:0]
//! ```

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ALS
// ---------------------------------------------------------------------------

/// ALS integration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
#[repr(u8)]
pub enum AlsIntegrationTime {
    #[default]
    Ms80 = 0b00,
    Ms160 = 0b01,
    Ms320 = 0b10,
    Ms640 = 0b11,
}

impl AlsIntegrationTime {
    pub const fn millis(self) -> u16 {
        match self {
            Self::Ms80 => 80,
            Self::Ms160 => 160,
            Self::Ms320 => 320,
            Self::Ms640 => 640,
        }
    }

    pub const fn from_millis(ms: u16) -> Option<Self> {
        match ms {
            80 => Some(Self::Ms80),
            160 => Some(Self::Ms160),
            320 => Some(Self::Ms320),
            640 => Some(Self::Ms640),
            _ => None,
        }
    }

    /// Resolution in milli-lux per count (0.12, 0.06, 0.03, 0.015 lux).
    pub const fn millilux_per_step(self) -> u32 {
        match self {
            Self::Ms80 => 120,
            Self::Ms160 => 60,
            Self::Ms320 => 30,
            Self::Ms640 => 15,
        }
    }
}

impl TryFrom<u16> for AlsIntegrationTime {
    type Error = &'static str;

    fn try_from(ms: u16) -> Result<Self, Self::Error> {
        Self::from_millis(ms).ok_or("ALS integration time must be 80, 160, 320 or 640")
    }
}

impl From<AlsIntegrationTime> for u16 {
    fn from(it: AlsIntegrationTime) -> Self {
        it.millis()
    }
}

/// ALS interrupt persistence (consecutive out-of-window samples).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AlsPersistence {
    #[default]
    One = 0b00,
    Two = 0b01,
    Four = 0b10,
    Eight = 0b11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlsConfig {
    pub integration_time: AlsIntegrationTime,
    pub persistence: AlsPersistence,
    pub interrupt_enable: bool,
    pub shutdown: bool,
}

impl AlsConfig {
    pub const fn encode(&self) -> [u8; 2] {
        let low = (self.integration_time as u8) << 6
            | (self.persistence as u8) << 2
            | (self.interrupt_enable as u8) << 1
            | self.shutdown as u8;
        [low, 0x00]
    }
}

// ---------------------------------------------------------------------------
// PS_CONF1 / PS_CONF2
// ---------------------------------------------------------------------------

/// IRED on/off duty ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum PsDuty {
    #[default]
    #[serde(rename = "1/40")]
    OneIn40 = 0b00,
    #[serde(rename = "1/80")]
    OneIn80 = 0b01,
    #[serde(rename = "1/160")]
    OneIn160 = 0b10,
    #[serde(rename = "1/320")]
    OneIn320 = 0b11,
}

/// PS interrupt persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PsPersistence {
    #[default]
    One = 0b00,
    Two = 0b01,
    Three = 0b10,
    Four = 0b11,
}

/// PS integration time, in multiples of the base period T.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum PsIntegrationTime {
    #[default]
    #[serde(rename = "t1")]
    T1 = 0b000,
    #[serde(rename = "t1.5")]
    T1_5 = 0b001,
    #[serde(rename = "t2")]
    T2 = 0b010,
    #[serde(rename = "t2.5")]
    T2_5 = 0b011,
    #[serde(rename = "t3")]
    T3 = 0b100,
    #[serde(rename = "t3.5")]
    T3_5 = 0b101,
    #[serde(rename = "t4")]
    T4 = 0b110,
    #[serde(rename = "t8")]
    T8 = 0b111,
}

/// Which proximity transitions raise the INT pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PsInterruptMode {
    Disabled = 0b00,
    Close = 0b01,
    Away = 0b10,
    #[default]
    CloseAndAway = 0b11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PsConfig12 {
    pub duty: PsDuty,
    pub persistence: PsPersistence,
    pub integration_time: PsIntegrationTime,
    pub shutdown: bool,
    /// 16-bit output; thresholds above 4095 need it.
    pub high_resolution: bool,
    pub interrupt: PsInterruptMode,
}

impl Default for PsConfig12 {
    fn default() -> Self {
        Self {
            duty: PsDuty::default(),
            persistence: PsPersistence::default(),
            integration_time: PsIntegrationTime::default(),
            shutdown: false,
            high_resolution: true,
            interrupt: PsInterruptMode::default(),
        }
    }
}

impl PsConfig12 {
    pub const fn encode(&self) -> [u8; 2] {
        let low = (self.duty as u8) << 6
            | (self.persistence as u8) << 4
            | (self.integration_time as u8) << 1
            | self.shutdown as u8;
        let high = (self.high_resolution as u8) << 3 | self.interrupt as u8;
        [low, high]
    }
}

// ---------------------------------------------------------------------------
// PS_CONF3 / PS_MS
// ---------------------------------------------------------------------------

/// IRED pulses per measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PsMultiPulse {
    #[default]
    One = 0b00,
    Two = 0b01,
    Four = 0b10,
    Eight = 0b11,
}

/// IRED drive current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum LedCurrent {
    #[default]
    #[serde(rename = "50mA")]
    Ma50 = 0b000,
    #[serde(rename = "75mA")]
    Ma75 = 0b001,
    #[serde(rename = "100mA")]
    Ma100 = 0b010,
    #[serde(rename = "120mA")]
    Ma120 = 0b011,
    #[serde(rename = "140mA")]
    Ma140 = 0b100,
    #[serde(rename = "160mA")]
    Ma160 = 0b101,
    #[serde(rename = "180mA")]
    Ma180 = 0b110,
    #[serde(rename = "200mA")]
    Ma200 = 0b111,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PsConfig3 {
    pub multi_pulse: PsMultiPulse,
    pub smart_persistence: bool,
    pub active_force: bool,
    pub trigger: bool,
    pub sunlight_cancellation: bool,
    pub white_channel: bool,
    /// Drive INT as a close/away logic output instead of an interrupt.
    pub logic_output: bool,
    pub led_current: LedCurrent,
}

impl Default for PsConfig3 {
    fn default() -> Self {
        Self {
            multi_pulse: PsMultiPulse::default(),
            smart_persistence: false,
            active_force: false,
            trigger: false,
            sunlight_cancellation: false,
            white_channel: true,
            logic_output: false,
            led_current: LedCurrent::default(),
        }
    }
}

impl PsConfig3 {
    pub const fn encode(&self) -> [u8; 2] {
        let low = (self.multi_pulse as u8) << 5
            | (self.smart_persistence as u8) << 4
            | (self.active_force as u8) << 3
            | (self.trigger as u8) << 2
            | self.sunlight_cancellation as u8;
        // WHITE_EN is active-low.
        let high = (!self.white_channel as u8) << 7
            | (self.logic_output as u8) << 6
            | self.led_current as u8;
        [low, high]
    }
}
