use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Modifier, Style};
use tui::text::{Span, Spans};
use tui::widgets::{Block, Borders, Paragraph};
use tui::Terminal;

use crate::lamp::{LampColor, LampKind};
use crate::layout::{PanelLayout, RegisterSpec};

/// index of a lamp across the whole panel
pub type LampId = usize;

/// index of a rotary knob on the panel
pub type KnobId = usize;

/// Display is what the widgets render into. It only ever hears about changes,
/// so an implementation can be a terminal, a canvas or a test recorder
/// without the widgets knowing.
pub trait Display {
    /// a lamp's quantised level changed
    fn set_level(&mut self, lamp: LampId, level: u8);

    /// a knob moved to a new position
    fn set_position(&mut self, knob: KnobId, position: usize);

    /// push any pending changes out; called once per controller tick
    fn present(&mut self) -> Result<(), io::Error>;

    /// release the output device; calling it again must be harmless
    fn close(&mut self) -> Result<(), io::Error> {
        Ok(())
    }
}

/// knob pointer for an angle in degrees, 0 pointing up, clockwise
pub fn knob_glyph(angle: f64) -> &'static str {
    const ARROWS: [&str; 8] = ["↑", "↗", "→", "↘", "↓", "↙", "←", "↖"];
    let sector = ((angle.rem_euclid(360.0) + 22.5) / 45.0).floor() as usize;
    ARROWS[sector % 8]
}

fn lerp(off: u8, on: u8, t: f64) -> u8 {
    (f64::from(off) + (f64::from(on) - f64::from(off)) * t).round() as u8
}

/// colour for a lamp at `level` out of `levels`
pub fn lamp_color(kind: LampKind, level: u8, levels: u8) -> Color {
    let t = if levels == 0 {
        0.0
    } else {
        (f64::from(level) / f64::from(levels)).clamp(0.0, 1.0)
    };
    let (off, on) = match kind {
        LampKind::Gate => ((70, 60, 40), (255, 220, 120)),
        LampKind::Colored(LampColor::White) => ((80, 80, 80), (255, 255, 255)),
        LampKind::Colored(LampColor::Red) => ((90, 30, 30), (255, 40, 40)),
        LampKind::Colored(LampColor::Green) => ((30, 80, 30), (60, 255, 60)),
        LampKind::Toggle => ((160, 160, 160), (255, 255, 255)),
    };
    Color::Rgb(lerp(off.0, on.0, t), lerp(off.1, on.1, t), lerp(off.2, on.2, t))
}

/// per-digit bit labels in lamp order
const BIT_LABELS: [&str; 6] = ["1", "2", "4", "8", "C", "F"];

/// one register as "MAR  [C8421][C8421]...", most significant digit first,
/// each bit label lit according to its lamp
fn register_spans<'a>(
    spec: &RegisterSpec,
    levels: &[u8],
    kinds: &[(LampKind, u8)],
) -> Spans<'a> {
    let bpd = spec.bits_per_digit();
    let mut spans = vec![Span::styled(
        format!("{:<5}", spec.register.label()),
        Style::default().fg(Color::White),
    )];
    for digit in (0..spec.digits).rev() {
        spans.push(Span::raw("["));
        for bit in (0..bpd).rev() {
            let id = spec.first_lamp + digit * bpd + bit;
            let (kind, max) = kinds[id];
            spans.push(Span::styled(
                BIT_LABELS[bit],
                Style::default()
                    .fg(lamp_color(kind, levels[id], max))
                    .add_modifier(Modifier::BOLD),
            ));
        }
        spans.push(Span::raw("]"));
    }
    Spans::from(spans)
}

/// panel drawn into the terminal with TUI and crossterm
pub struct TermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    layout: PanelLayout,
    title: String,
    kinds: Vec<(LampKind, u8)>,
    levels: Vec<u8>,
    positions: Vec<usize>,
    dirty: bool,
    closed: bool,
}

impl TermDisplay {
    pub fn new(layout: PanelLayout, title: &str) -> Result<TermDisplay, io::Error> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        let kinds = layout.lamp_kinds();
        Ok(TermDisplay {
            terminal,
            levels: vec![0; kinds.len()],
            positions: vec![0; 1],
            kinds,
            layout,
            title: title.to_string(),
            dirty: true,
            closed: false,
        })
    }

    fn lines(&self) -> Vec<Spans<'static>> {
        let mut lines = Vec::new();

        // gate and status lamps, four to a row
        for row in self.layout.gates.chunks(4) {
            let mut spans = Vec::new();
            for g in row {
                let (kind, max) = self.kinds[g.lamp];
                let color = lamp_color(kind, self.levels[g.lamp], max);
                let glyph = match kind {
                    LampKind::Toggle if self.levels[g.lamp] > 0 => "▲",
                    LampKind::Toggle => "▼",
                    _ => "●",
                };
                spans.push(Span::styled(glyph, Style::default().fg(color)));
                spans.push(Span::styled(
                    format!(" {:<14}", g.gate.label()),
                    Style::default().fg(Color::Gray),
                ));
            }
            lines.push(Spans::from(spans));
        }
        lines.push(Spans::from(""));

        for spec in &self.layout.registers {
            lines.push(register_spans(spec, &self.levels, &self.kinds));
        }
        lines.push(Spans::from(""));

        let sel = &self.layout.selector;
        let position = self.positions[sel.knob].min(sel.positions.len() - 1);
        let mut spans = vec![
            Span::styled("MAR SELECTOR ", Style::default().fg(Color::White)),
            Span::styled(
                knob_glyph(sel.angles[position]),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
        ];
        for (i, reg) in sel.positions.iter().enumerate() {
            let style = if i == position {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            spans.push(Span::styled(reg.label(), style));
            spans.push(Span::raw(" "));
        }
        lines.push(Spans::from(spans));
        lines.push(Spans::from(""));
        lines.push(Spans::from(Span::styled(
            "←/→ step knob   1-9 0 - = select   q quit",
            Style::default().fg(Color::DarkGray),
        )));
        lines
    }
}

impl Display for TermDisplay {
    fn set_level(&mut self, lamp: LampId, level: u8) {
        if let Some(l) = self.levels.get_mut(lamp) {
            *l = level;
            self.dirty = true;
        }
    }

    fn set_position(&mut self, knob: KnobId, position: usize) {
        if let Some(p) = self.positions.get_mut(knob) {
            *p = position;
            self.dirty = true;
        }
    }

    fn present(&mut self) -> Result<(), io::Error> {
        if self.closed || !self.dirty {
            return Ok(());
        }
        let lines = self.lines();
        let title = self.title.clone();
        let height = lines.len() as u16 + 2;
        self.terminal.draw(|f| {
            let full = f.size();
            let area = Rect::new(0, 0, full.width.min(100), full.height.min(height));
            let panel = Paragraph::new(lines).block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .style(Style::default().bg(Color::Black)),
            );
            f.render_widget(panel, area);
        })?;
        self.dirty = false;
        Ok(())
    }

    fn close(&mut self) -> Result<(), io::Error> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        // try every step, report the first failure
        let raw = disable_raw_mode();
        let screen = execute!(self.terminal.backend_mut(), LeaveAlternateScreen, Show);
        let cursor = self.terminal.show_cursor();
        raw.and(screen).and(cursor)
    }
}

impl Drop for TermDisplay {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// one call made on a `DummyDisplay`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayWrite {
    Level(LampId, u8),
    Position(KnobId, usize),
}

/// useful for testing non-display routines; remembers everything it was told
#[derive(Debug, Default)]
pub struct DummyDisplay {
    writes: Vec<DisplayWrite>,
    presents: usize,
    closes: usize,
    fail_close: bool,
}

impl DummyDisplay {
    pub fn new() -> Self {
        DummyDisplay::default()
    }

    /// a display whose `close` always errors
    pub fn failing_close() -> Self {
        DummyDisplay {
            fail_close: true,
            ..DummyDisplay::default()
        }
    }

    pub fn writes(&self) -> &[DisplayWrite] {
        &self.writes
    }

    pub fn clear(&mut self) {
        self.writes.clear();
    }

    /// positions knob `knob` was moved to, in order
    pub fn positions(&self, knob: KnobId) -> Vec<usize> {
        self.writes
            .iter()
            .filter_map(|w| match *w {
                DisplayWrite::Position(k, p) if k == knob => Some(p),
                _ => None,
            })
            .collect()
    }

    /// level writes only, as (lamp, level)
    pub fn levels(&self) -> Vec<(LampId, u8)> {
        self.writes
            .iter()
            .filter_map(|w| match *w {
                DisplayWrite::Level(id, level) => Some((id, level)),
                _ => None,
            })
            .collect()
    }

    pub fn presents(&self) -> usize {
        self.presents
    }

    pub fn closes(&self) -> usize {
        self.closes
    }
}

impl Display for DummyDisplay {
    fn set_level(&mut self, lamp: LampId, level: u8) {
        self.writes.push(DisplayWrite::Level(lamp, level));
    }

    fn set_position(&mut self, knob: KnobId, position: usize) {
        self.writes.push(DisplayWrite::Position(knob, position));
    }

    fn present(&mut self) -> Result<(), io::Error> {
        self.presents += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), io::Error> {
        self.closes += 1;
        if self.fail_close {
            return Err(io::Error::new(io::ErrorKind::Other, "display already gone"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::DisplayRegister;

    #[test]
    fn test_knob_glyph_sectors() {
        assert_eq!(knob_glyph(0.0), "↑");
        assert_eq!(knob_glyph(30.0), "↗");
        assert_eq!(knob_glyph(90.0), "→");
        assert_eq!(knob_glyph(180.0), "↓");
        assert_eq!(knob_glyph(350.0), "↑");
        assert_eq!(knob_glyph(-90.0), "←");
        assert_eq!(knob_glyph(720.0 + 135.0), "↘");
    }

    #[test]
    fn test_lamp_color_ends() {
        assert_eq!(lamp_color(LampKind::Gate, 0, 6), Color::Rgb(70, 60, 40));
        assert_eq!(lamp_color(LampKind::Gate, 6, 6), Color::Rgb(255, 220, 120));
        assert_eq!(
            lamp_color(LampKind::Colored(LampColor::Red), 1, 1),
            Color::Rgb(255, 40, 40)
        );
    }

    #[test]
    fn test_lamp_color_brightens_with_level() {
        let brightness = |c: Color| match c {
            Color::Rgb(r, g, b) => u32::from(r) + u32::from(g) + u32::from(b),
            _ => 0,
        };
        let mut last = 0;
        for level in 0..=6 {
            let b = brightness(lamp_color(LampKind::Gate, level, 6));
            assert!(b > last || level == 0);
            last = b;
        }
    }

    #[test]
    fn test_register_spans_layout() {
        let layout = PanelLayout::standard(6);
        let kinds = layout.lamp_kinds();
        let levels = vec![0; kinds.len()];
        let spec = layout.register(DisplayRegister::Mbr).unwrap();
        let spans = register_spans(spec, &levels, &kinds);
        // label + 2 digits * (open + 6 bits + close)
        assert_eq!(spans.0.len(), 1 + 2 * 8);
        assert_eq!(spans.0[2].content, "F");
        assert_eq!(spans.0[7].content, "1");
    }

    #[test]
    fn test_dummy_records_in_order() -> Result<(), io::Error> {
        let mut d = DummyDisplay::new();
        d.set_level(2, 5);
        d.set_position(0, 7);
        d.present()?;
        assert_eq!(
            d.writes(),
            &[DisplayWrite::Level(2, 5), DisplayWrite::Position(0, 7)]
        );
        assert_eq!(d.positions(0), vec![7]);
        assert_eq!(d.levels(), vec![(2, 5)]);
        assert_eq!(d.presents(), 1);
        Ok(())
    }

    #[test]
    fn test_dummy_failing_close() {
        let mut d = DummyDisplay::failing_close();
        assert!(d.close().is_err());
        assert!(d.close().is_err());
        assert_eq!(d.closes(), 2);
    }
}
