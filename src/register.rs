use tracing::trace;

use crate::display::{Display, LampId};
use crate::lamp::{Lamp, LampKind};
use crate::layout::RegisterSpec;
use crate::processor::DisplayRegister;

/// width of the windows a value is diffed in
pub const CHUNK_BITS: u32 = 30;
const CHUNK_MASK: u64 = (1 << CHUNK_BITS) - 1;

/// A row of lamps showing one hardware register, lamp `n` for bit `n`.
///
/// Two ways to feed it:
/// * `update` with a numeric bit pattern; only lamps whose bit changed since
///   the last value are touched
/// * `update_glow` with one intensity per lamp; every lamp is set
pub struct Register {
    name: DisplayRegister,
    digits: usize,
    flag: bool,
    lamps: Vec<Lamp>,
    last_value: u64,
}

impl Register {
    pub fn new(
        name: DisplayRegister,
        first_lamp: LampId,
        digits: usize,
        flag: bool,
        levels: u8,
    ) -> Self {
        let bits_per_digit = if flag { 6 } else { 5 };
        let lamps = (0..digits * bits_per_digit)
            .map(|bit| Lamp::new(first_lamp + bit, LampKind::Gate, levels))
            .collect();
        Register {
            name,
            digits,
            flag,
            lamps,
            last_value: 0,
        }
    }

    pub fn from_spec(spec: &RegisterSpec, levels: u8) -> Self {
        Register::new(spec.register, spec.first_lamp, spec.digits, spec.flag, levels)
    }

    pub fn name(&self) -> DisplayRegister {
        self.name
    }

    pub fn digits(&self) -> usize {
        self.digits
    }

    pub fn has_flag(&self) -> bool {
        self.flag
    }

    pub fn bit_count(&self) -> usize {
        self.lamps.len()
    }

    pub fn lamps(&self) -> &[Lamp] {
        &self.lamps
    }

    /// last value passed to `update`, after normalising
    pub fn last_value(&self) -> u64 {
        self.last_value
    }

    /// Show a numeric bit pattern. The sign is dropped and only the low 30
    /// bits are kept; returns how many lamps changed.
    pub fn update(&mut self, value: i64, display: &mut dyn Display) -> usize {
        let this_value = value.unsigned_abs() & CHUNK_MASK;
        if this_value == self.last_value {
            return 0;
        }

        let mut last = self.last_value;
        let mut this = this_value;
        self.last_value = this_value;

        let mut bit_base = 0;
        let mut changes = 0;
        'chunks: while last != 0 || this != 0 {
            let last_bits = last & CHUNK_MASK;
            let this_bits = this & CHUNK_MASK;
            last >>= CHUNK_BITS;
            this >>= CHUNK_BITS;

            let mut changed = last_bits ^ this_bits;
            while changed != 0 {
                let offset = changed.trailing_zeros();
                let bit_nr = bit_base + offset as usize;
                if bit_nr >= self.lamps.len() {
                    // FIXME: set bits above the register width vanish here
                    // without a trace, which can hide a bad value upstream
                    trace!(register = ?self.name, bit_nr, "bits beyond register width dropped");
                    break 'chunks;
                }
                let on = (this_bits >> offset) & 1;
                if self.lamps[bit_nr].set(on as f64, display) {
                    changes += 1;
                }
                changed &= changed - 1;
            }
            bit_base += CHUNK_BITS as usize;
        }
        changes
    }

    /// Set every lamp from its glow. Extra entries are ignored and lamps
    /// without an entry are left alone. Doesn't touch the cached value.
    pub fn update_glow(&mut self, glow: &[f64], display: &mut dyn Display) -> usize {
        self.lamps
            .iter_mut()
            .zip(glow)
            .map(|(lamp, g)| lamp.set(*g, display))
            .filter(|changed| *changed)
            .count()
    }
}
