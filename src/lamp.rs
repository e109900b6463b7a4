use crate::display::{Display, LampId};

/// highest level count any lamp supports (seven visible states incl. off)
pub const MAX_LEVELS: u8 = 6;

/// default level count for incandescent gate lamps
pub const GATE_LAMP_LEVELS: u8 = 6;

/// nudges intensities that land exactly on a level boundary upwards, so float
/// noise either side of .5 doesn't make a steady lamp flicker
const LEVEL_BIAS: f64 = 1e-6;

/// colour of a two-level status lamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LampColor {
    White,
    Red,
    Green,
}

/// what a lamp looks like; the quantisation is the same for all of them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LampKind {
    /// multi-level incandescent lamp showing gate glow
    Gate,
    /// two-level coloured status lamp
    Colored(LampColor),
    /// two-position toggle switch
    Toggle,
}

impl LampKind {
    /// level count a lamp of this kind gets, given the gate lamp setting
    pub fn levels(&self, gate_levels: u8) -> u8 {
        match self {
            LampKind::Gate => gate_levels,
            LampKind::Colored(_) | LampKind::Toggle => 1,
        }
    }
}

/// map a [0,1] intensity onto 0..=levels
pub fn quantize(intensity: f64, levels: u8) -> u8 {
    if intensity.is_nan() {
        return 0;
    }
    let l = f64::from(levels);
    (intensity * l + LEVEL_BIAS).round().clamp(0.0, l) as u8
}

/// A single indicator on the panel. It only talks to the display when its
/// quantised level actually changes.
#[derive(Debug, Clone)]
pub struct Lamp {
    id: LampId,
    kind: LampKind,
    levels: u8,
    level: u8,
}

impl Lamp {
    pub fn new(id: LampId, kind: LampKind, levels: u8) -> Self {
        Lamp {
            id,
            kind,
            levels: levels.clamp(1, MAX_LEVELS),
            level: 0,
        }
    }

    pub fn id(&self) -> LampId {
        self.id
    }

    pub fn kind(&self) -> LampKind {
        self.kind
    }

    pub fn levels(&self) -> u8 {
        self.levels
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// set from an intensity; true if the rendered level changed
    pub fn set(&mut self, intensity: f64, display: &mut dyn Display) -> bool {
        let level = quantize(intensity, self.levels);
        if level == self.level {
            return false;
        }
        self.level = level;
        display.set_level(self.id, level);
        true
    }
}
