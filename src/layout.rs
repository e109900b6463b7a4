use crate::display::{KnobId, LampId};
use crate::lamp::LampKind;
use crate::processor::{AddressRegister, DisplayRegister, Gate};

/// how a register row gets its data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// numeric bit pattern, diffed against the last one shown
    Value,
    /// one glow intensity per lamp
    Glow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GateSpec {
    pub gate: Gate,
    pub kind: LampKind,
    pub lamp: LampId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterSpec {
    pub register: DisplayRegister,
    pub digits: usize,
    /// digits carry a flag bit
    pub flag: bool,
    pub first_lamp: LampId,
    pub mode: UpdateMode,
}

impl RegisterSpec {
    pub fn bits_per_digit(&self) -> usize {
        if self.flag {
            6
        } else {
            5
        }
    }

    pub fn bit_count(&self) -> usize {
        self.digits * self.bits_per_digit()
    }

    pub fn lamps(&self) -> std::ops::Range<LampId> {
        self.first_lamp..self.first_lamp + self.bit_count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectorSpec {
    pub knob: KnobId,
    pub positions: Vec<AddressRegister>,
    /// knob angle per position, degrees clockwise from up
    pub angles: Vec<f64>,
}

/// Which widgets the panel has and which lamp ids they own. Lamp ids are
/// handed out contiguously: gates first, then each register in turn.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelLayout {
    pub gate_levels: u8,
    pub gates: Vec<GateSpec>,
    pub registers: Vec<RegisterSpec>,
    pub selector: SelectorSpec,
}

impl PanelLayout {
    /// the 1620 console: every gate, MAR/MBR/MIR/OP and the MAR selector
    pub fn standard(gate_levels: u8) -> Self {
        let gates: Vec<GateSpec> = Gate::ALL
            .iter()
            .enumerate()
            .map(|(lamp, gate)| GateSpec {
                gate: *gate,
                kind: gate.kind(),
                lamp,
            })
            .collect();

        let mut next = gates.len();
        let mut registers = Vec::new();
        for (register, digits, flag, mode) in [
            (DisplayRegister::Mar, 5, false, UpdateMode::Value),
            (DisplayRegister::Mbr, 2, true, UpdateMode::Glow),
            (DisplayRegister::Mir, 2, true, UpdateMode::Glow),
            (DisplayRegister::Op, 2, false, UpdateMode::Glow),
        ] {
            let spec = RegisterSpec {
                register,
                digits,
                flag,
                first_lamp: next,
                mode,
            };
            next += spec.bit_count();
            registers.push(spec);
        }

        let positions = AddressRegister::ALL.to_vec();
        let step = 360.0 / positions.len() as f64;
        let angles = (0..positions.len()).map(|i| i as f64 * step).collect();

        PanelLayout {
            gate_levels,
            gates,
            registers,
            selector: SelectorSpec {
                knob: 0,
                positions,
                angles,
            },
        }
    }

    pub fn register(&self, register: DisplayRegister) -> Option<&RegisterSpec> {
        self.registers.iter().find(|r| r.register == register)
    }

    pub fn lamp_count(&self) -> usize {
        self.gates.len() + self.registers.iter().map(|r| r.bit_count()).sum::<usize>()
    }

    /// kind and level count for every lamp id
    pub fn lamp_kinds(&self) -> Vec<(LampKind, u8)> {
        let mut kinds = vec![(LampKind::Gate, self.gate_levels); self.lamp_count()];
        for g in &self.gates {
            kinds[g.lamp] = (g.kind, g.kind.levels(self.gate_levels));
        }
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_widths() {
        let l = PanelLayout::standard(6);
        let mar = l.register(DisplayRegister::Mar).unwrap();
        assert_eq!(mar.bit_count(), 25);
        assert_eq!(mar.mode, UpdateMode::Value);
        assert_eq!(l.register(DisplayRegister::Mbr).unwrap().bit_count(), 12);
        assert_eq!(l.register(DisplayRegister::Mir).unwrap().bit_count(), 12);
        assert_eq!(l.register(DisplayRegister::Op).unwrap().bit_count(), 10);
    }

    #[test]
    fn test_lamp_ids_are_contiguous() {
        let l = PanelLayout::standard(6);
        let mut expected = 0;
        for g in &l.gates {
            assert_eq!(g.lamp, expected);
            expected += 1;
        }
        for r in &l.registers {
            assert_eq!(r.lamps().start, expected);
            expected = r.lamps().end;
        }
        assert_eq!(l.lamp_count(), expected);
        assert_eq!(l.lamp_count(), 25 + 25 + 12 + 12 + 10);
    }

    #[test]
    fn test_lamp_kinds() {
        let l = PanelLayout::standard(4);
        let kinds = l.lamp_kinds();
        assert_eq!(kinds[0], (LampKind::Gate, 4));
        let toggle = l.gates.iter().find(|g| g.gate == Gate::IoStop).unwrap();
        assert_eq!(kinds[toggle.lamp], (LampKind::Toggle, 1));
        let mbr = l.register(DisplayRegister::Mbr).unwrap();
        assert_eq!(kinds[mbr.first_lamp], (LampKind::Gate, 4));
    }

    #[test]
    fn test_selector_angles() {
        let l = PanelLayout::standard(6);
        assert_eq!(l.selector.positions.len(), 12);
        assert_eq!(l.selector.angles.len(), 12);
        assert_eq!(l.selector.angles[3], 90.0);
        assert_eq!(l.selector.positions[11], AddressRegister::Cr1);
    }
}
