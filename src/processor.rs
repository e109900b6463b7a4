//! The processor side of the panel: what the panel reads on every refresh, the
//! two things it writes back, and a self-driving test pattern to look at when
//! no real processor is attached.

use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;
use std::time::Duration;

use crate::lamp::{LampColor, LampKind};
use crate::layout::{PanelLayout, UpdateMode};

/// single-bit indicators on the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    // gate lamps
    ICycle,
    ECycle,
    IxCycle,
    Add,
    CarryIn,
    CarryOut,
    Compare,
    HighPositive,
    EqualZero,
    Overflow,
    FieldMark,
    Recomplement,
    // status lamps
    Power,
    Ready,
    Run,
    Manual,
    CheckStop,
    Thermal,
    // toggle switches
    ParityStop,
    IoStop,
    OflowStop,
    ProgramSwitch1,
    ProgramSwitch2,
    ProgramSwitch3,
    ProgramSwitch4,
}

impl Gate {
    pub const ALL: [Gate; 25] = [
        Gate::ICycle,
        Gate::ECycle,
        Gate::IxCycle,
        Gate::Add,
        Gate::CarryIn,
        Gate::CarryOut,
        Gate::Compare,
        Gate::HighPositive,
        Gate::EqualZero,
        Gate::Overflow,
        Gate::FieldMark,
        Gate::Recomplement,
        Gate::Power,
        Gate::Ready,
        Gate::Run,
        Gate::Manual,
        Gate::CheckStop,
        Gate::Thermal,
        Gate::ParityStop,
        Gate::IoStop,
        Gate::OflowStop,
        Gate::ProgramSwitch1,
        Gate::ProgramSwitch2,
        Gate::ProgramSwitch3,
        Gate::ProgramSwitch4,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Gate::ICycle => "I CYCLE",
            Gate::ECycle => "E CYCLE",
            Gate::IxCycle => "IX CYCLE",
            Gate::Add => "ADD",
            Gate::CarryIn => "CARRY IN",
            Gate::CarryOut => "CARRY OUT",
            Gate::Compare => "COMPARE",
            Gate::HighPositive => "HIGH/POS",
            Gate::EqualZero => "EQUAL/ZERO",
            Gate::Overflow => "OVERFLOW",
            Gate::FieldMark => "FIELD MARK",
            Gate::Recomplement => "RECOMP",
            Gate::Power => "POWER",
            Gate::Ready => "READY",
            Gate::Run => "RUN",
            Gate::Manual => "MANUAL",
            Gate::CheckStop => "CHECK STOP",
            Gate::Thermal => "THERMAL",
            Gate::ParityStop => "PARITY STOP",
            Gate::IoStop => "I/O STOP",
            Gate::OflowStop => "O'FLOW STOP",
            Gate::ProgramSwitch1 => "PROGRAM SW 1",
            Gate::ProgramSwitch2 => "PROGRAM SW 2",
            Gate::ProgramSwitch3 => "PROGRAM SW 3",
            Gate::ProgramSwitch4 => "PROGRAM SW 4",
        }
    }

    pub fn kind(&self) -> LampKind {
        match self {
            Gate::Power | Gate::Ready | Gate::Run | Gate::Manual => {
                LampKind::Colored(LampColor::White)
            }
            Gate::CheckStop | Gate::Thermal => LampKind::Colored(LampColor::Red),
            Gate::ParityStop
            | Gate::IoStop
            | Gate::OflowStop
            | Gate::ProgramSwitch1
            | Gate::ProgramSwitch2
            | Gate::ProgramSwitch3
            | Gate::ProgramSwitch4 => LampKind::Toggle,
            _ => LampKind::Gate,
        }
    }
}

/// registers shown as rows of lamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayRegister {
    /// memory address register, fed from whichever address register the
    /// MAR selector knob points at
    Mar,
    /// memory buffer register
    Mbr,
    /// memory inhibit register
    Mir,
    /// operation register
    Op,
}

impl DisplayRegister {
    pub const ALL: [DisplayRegister; 4] = [
        DisplayRegister::Mar,
        DisplayRegister::Mbr,
        DisplayRegister::Mir,
        DisplayRegister::Op,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DisplayRegister::Mar => "MAR",
            DisplayRegister::Mbr => "MBR",
            DisplayRegister::Mir => "MIR",
            DisplayRegister::Op => "OP",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// positions of the MAR selector knob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressRegister {
    Ir1,
    Ir2,
    Ir3,
    Ir4,
    Or1,
    Or2,
    Or3,
    Or4,
    Or5,
    Pr1,
    Pr2,
    Cr1,
}

impl AddressRegister {
    pub const ALL: [AddressRegister; 12] = [
        AddressRegister::Ir1,
        AddressRegister::Ir2,
        AddressRegister::Ir3,
        AddressRegister::Ir4,
        AddressRegister::Or1,
        AddressRegister::Or2,
        AddressRegister::Or3,
        AddressRegister::Or4,
        AddressRegister::Or5,
        AddressRegister::Pr1,
        AddressRegister::Pr2,
        AddressRegister::Cr1,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AddressRegister::Ir1 => "IR1",
            AddressRegister::Ir2 => "IR2",
            AddressRegister::Ir3 => "IR3",
            AddressRegister::Ir4 => "IR4",
            AddressRegister::Or1 => "OR1",
            AddressRegister::Or2 => "OR2",
            AddressRegister::Or3 => "OR3",
            AddressRegister::Or4 => "OR4",
            AddressRegister::Or5 => "OR5",
            AddressRegister::Pr1 => "PR1",
            AddressRegister::Pr2 => "PR2",
            AddressRegister::Cr1 => "CR1",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<AddressRegister> {
        AddressRegister::ALL.get(index).copied()
    }
}

/// What the panel needs from a processor. Reads happen on every refresh tick
/// so they should be cheap; writes only come from the MAR selector knob and
/// the derived MAR display value.
pub trait Processor {
    /// glow of a single-bit indicator, in [0,1]
    fn gate_glow(&self, gate: Gate) -> f64;

    /// per-bit glow of a register, lamp order, in [0,1]
    fn register_glow(&self, register: DisplayRegister) -> &[f64];

    /// raw bit pattern of an address register, 1,2,4,8,C per digit
    fn address_value(&self, register: AddressRegister) -> i64;

    /// where the processor thinks the MAR selector is, if it knows
    fn mar_selector(&self) -> Option<AddressRegister> {
        None
    }

    fn set_mar_selector(&mut self, register: AddressRegister);

    /// the value currently shown in the MAR lamps; debugging aid only
    fn set_mar_display(&mut self, value: i64);
}

/// processors are shared between the panel and whatever drives them
pub type SharedProcessor = Rc<RefCell<dyn Processor>>;

/// Lamp pattern for one decimal digit in 1,2,4,8,C,F order. The C bit gives
/// the digit odd parity over all six bits.
pub fn digit_bits(digit: u8, flag: bool) -> u64 {
    let mut bits = u64::from(digit & 0x0f);
    if flag {
        bits |= 1 << 5;
    }
    if bits.count_ones() % 2 == 0 {
        bits |= 1 << 4;
    }
    bits
}

/// lay a decimal number out as `digits` unflagged digits, least significant
/// digit in the lowest lamps
pub fn encode_digits(mut value: u64, digits: usize, bits_per_digit: usize) -> u64 {
    let mut bits = 0;
    for d in 0..digits {
        bits |= digit_bits((value % 10) as u8, false) << (d * bits_per_digit);
        value /= 10;
    }
    bits
}

/// A processor stand-in that just makes the lamps do something: counting
/// address registers, sweeping gate glow and decaying register glow. All of
/// it is a pure function of the time given to `advance`.
pub struct TestPattern {
    gates: Vec<f64>,
    glows: Vec<Vec<f64>>,
    widths: Vec<(usize, usize)>,
    addresses: [i64; 12],
    mar_selector: AddressRegister,
    mar_display: i64,
    frame: u64,
}

/// glow kept from the previous frame
const AFTERGLOW: f64 = 0.6;

impl TestPattern {
    pub fn new(layout: &PanelLayout) -> Self {
        let mut glows = vec![Vec::new(); DisplayRegister::ALL.len()];
        let mut widths = vec![(0, 5); DisplayRegister::ALL.len()];
        for spec in &layout.registers {
            if spec.mode == UpdateMode::Glow {
                glows[spec.register.index()] = vec![0.0; spec.bit_count()];
            }
            widths[spec.register.index()] = (spec.digits, spec.bits_per_digit());
        }
        TestPattern {
            gates: vec![0.0; Gate::ALL.len()],
            glows,
            widths,
            addresses: [0; 12],
            mar_selector: AddressRegister::Ir1,
            mar_display: 0,
            frame: 0,
        }
    }

    pub fn mar_display(&self) -> i64 {
        self.mar_display
    }

    /// recompute everything for time `now` since start
    pub fn advance(&mut self, now: Duration) {
        let t = now.as_secs_f64();
        let count = (now.as_millis() / 20) as u64;
        if count == self.frame && count != 0 {
            return;
        }
        self.frame = count;

        let (mar_digits, mar_bpd) = self.widths[DisplayRegister::Mar.index()];
        for (i, reg) in AddressRegister::ALL.iter().enumerate() {
            let n = (count + 1111 * i as u64) % 10u64.pow(mar_digits as u32);
            self.addresses[reg.index()] = encode_digits(n, mar_digits, mar_bpd) as i64;
        }

        for (i, gate) in Gate::ALL.iter().enumerate() {
            self.gates[i] = match gate {
                Gate::Power | Gate::Ready => 1.0,
                Gate::Run => f64::from(u8::from(t % 10.0 < 8.0)),
                Gate::Manual => f64::from(u8::from(t % 10.0 >= 8.0)),
                Gate::CheckStop | Gate::Thermal => 0.0,
                Gate::ParityStop | Gate::ProgramSwitch2 | Gate::ProgramSwitch4 => 1.0,
                _ if gate.kind() == LampKind::Toggle => 0.0,
                _ => 0.5 + 0.5 * (t * TAU * 0.25 + i as f64).sin(),
            };
        }

        for reg in DisplayRegister::ALL {
            let (digits, bpd) = self.widths[reg.index()];
            let pattern = encode_digits(count / 3 + 37 * reg.index() as u64, digits, bpd);
            for (bit, glow) in self.glows[reg.index()].iter_mut().enumerate() {
                let on = f64::from(u8::from((pattern >> bit) & 1 == 1));
                *glow = *glow * AFTERGLOW + on * (1.0 - AFTERGLOW);
            }
        }
    }
}

impl Processor for TestPattern {
    fn gate_glow(&self, gate: Gate) -> f64 {
        Gate::ALL
            .iter()
            .position(|g| *g == gate)
            .map_or(0.0, |i| self.gates[i])
    }

    fn register_glow(&self, register: DisplayRegister) -> &[f64] {
        &self.glows[register.index()]
    }

    fn address_value(&self, register: AddressRegister) -> i64 {
        self.addresses[register.index()]
    }

    fn mar_selector(&self) -> Option<AddressRegister> {
        Some(self.mar_selector)
    }

    fn set_mar_selector(&mut self, register: AddressRegister) {
        self.mar_selector = register;
    }

    fn set_mar_display(&mut self, value: i64) {
        self.mar_display = value;
    }
}
