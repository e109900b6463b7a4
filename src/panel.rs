//! # panel
//!
//! The controller that ties widgets to a processor. It owns every lamp,
//! register and the MAR selector, polls the processor on a fixed period and
//! pushes what it reads into the widgets, which in turn tell the display
//! about whatever actually changed.
//!
//! Timing is cooperative: nothing runs unless `tick` is called, and a
//! refresh always finishes before the next one is scheduled.

use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::clock::Clock;
use crate::config::PanelConfig;
use crate::display::Display;
use crate::error::PanelError;
use crate::input::{Input, PanelCommand};
use crate::lamp::Lamp;
use crate::layout::{PanelLayout, UpdateMode};
use crate::processor::{AddressRegister, DisplayRegister, Gate, SharedProcessor};
use crate::register::Register;
use crate::selector::{Rotation, Selector};

pub struct PanelController<'a> {
    display: &'a mut dyn Display,
    processor: Option<SharedProcessor>,
    gates: Vec<(Gate, Lamp)>,
    registers: Vec<(Register, UpdateMode)>,
    selector: Selector,
    positions: Vec<AddressRegister>,
    refresh_period: Duration,
    /// when the next refresh runs; `None` once shut down
    refresh_due: Option<Duration>,
    refreshes: u64,
}

impl<'a> PanelController<'a> {
    pub fn new(
        layout: &PanelLayout,
        config: &PanelConfig,
        processor: SharedProcessor,
        display: &'a mut dyn Display,
    ) -> Result<PanelController<'a>, PanelError> {
        config.validate()?;

        let gates = layout
            .gates
            .iter()
            .map(|g| {
                let levels = g.kind.levels(layout.gate_levels);
                (g.gate, Lamp::new(g.lamp, g.kind, levels))
            })
            .collect();
        let registers = layout
            .registers
            .iter()
            .map(|spec| (Register::from_spec(spec, layout.gate_levels), spec.mode))
            .collect();

        let mut selector = Selector::new(
            layout.selector.knob,
            layout.selector.angles.clone(),
            config.selector_step(),
        );
        let positions = layout.selector.positions.clone();

        let start = processor
            .borrow()
            .mar_selector()
            .and_then(|reg| positions.iter().position(|p| *p == reg))
            .unwrap_or(config.selector_start);
        selector.set_position(start, display);

        // the listener must not keep the processor alive past shutdown
        let weak = Rc::downgrade(&processor);
        let listener_positions = positions.clone();
        selector.set_change_listener(Box::new(move |position| {
            let Some(reg) = listener_positions.get(position) else {
                return;
            };
            if let Some(processor) = weak.upgrade() {
                processor.borrow_mut().set_mar_selector(*reg);
            }
        }));

        debug!(
            lamps = layout.lamp_count(),
            registers = layout.registers.len(),
            selector = start,
            "panel built"
        );

        Ok(PanelController {
            display,
            processor: Some(processor),
            gates,
            registers,
            selector,
            positions,
            refresh_period: config.refresh_period(),
            refresh_due: Some(Duration::ZERO),
            refreshes: 0,
        })
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn register(&self, name: DisplayRegister) -> Option<&Register> {
        self.registers
            .iter()
            .map(|(r, _)| r)
            .find(|r| r.name() == name)
    }

    pub fn gate(&self, gate: Gate) -> Option<&Lamp> {
        self.gates.iter().find(|(g, _)| *g == gate).map(|(_, l)| l)
    }

    /// address register the MAR selector currently points at
    pub fn selected(&self) -> Option<AddressRegister> {
        self.positions.get(self.selector.position()).copied()
    }

    /// refreshes run so far
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    pub fn is_shut_down(&self) -> bool {
        self.refresh_due.is_none()
    }

    /// earliest moment anything on the panel wants to run
    pub fn next_deadline(&self) -> Option<Duration> {
        match (self.refresh_due, self.selector.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// run whatever is due at `now`, then push the frame out
    pub fn tick(&mut self, now: Duration) -> Result<(), PanelError> {
        self.selector.tick(now, self.display);
        if let Some(due) = self.refresh_due {
            if now >= due {
                self.refresh();
                self.refresh_due = Some(now + self.refresh_period);
            }
        }
        self.display.present()?;
        Ok(())
    }

    /// Read the processor into every widget. Does nothing if there is no
    /// processor any more.
    pub fn refresh(&mut self) {
        let Some(processor) = self.processor.as_ref() else {
            trace!("refresh skipped, no processor");
            return;
        };
        let selected = self.positions.get(self.selector.position()).copied();

        let mar_value = {
            let p = processor.borrow();
            for (gate, lamp) in self.gates.iter_mut() {
                lamp.set(p.gate_glow(*gate), self.display);
            }

            let mut mar_value = None;
            for (register, mode) in self.registers.iter_mut() {
                match mode {
                    UpdateMode::Glow => {
                        let glow = p.register_glow(register.name());
                        if glow.len() != register.bit_count() {
                            trace!(
                                register = ?register.name(),
                                got = glow.len(),
                                want = register.bit_count(),
                                "glow length mismatch"
                            );
                        }
                        register.update_glow(glow, self.display);
                    }
                    UpdateMode::Value => {
                        if let Some(reg) = selected {
                            let value = p.address_value(reg);
                            register.update(value, self.display);
                            if register.name() == DisplayRegister::Mar {
                                mar_value = Some(value);
                            }
                        }
                    }
                }
            }
            mar_value
        };

        if let Some(value) = mar_value {
            processor.borrow_mut().set_mar_display(value);
        }
        self.refreshes += 1;
    }

    /// turn the MAR selector to `position`, animating through the stops
    pub fn move_selector(&mut self, position: usize, now: Duration) {
        if self.is_shut_down() {
            return;
        }
        self.selector.move_to(position, now, self.display);
    }

    pub fn step_selector(&mut self, rotation: Rotation, now: Duration) {
        if self.is_shut_down() {
            return;
        }
        self.selector.step(rotation, now, self.display);
    }

    /// apply one user command; true if the panel should stop
    pub fn apply(&mut self, command: PanelCommand, now: Duration) -> bool {
        match command {
            PanelCommand::Quit => return true,
            PanelCommand::StepSelector(rotation) => self.step_selector(rotation, now),
            PanelCommand::SelectPosition(position) => self.move_selector(position, now),
        }
        false
    }

    /// Drive the panel from `clock` until a Quit command, or until `limit`
    /// has passed if one is given. `on_frame` runs before every tick with the
    /// current time. The panel is shut down on the way out.
    pub fn run<C: Clock>(
        &mut self,
        input: &mut dyn Input,
        clock: &C,
        limit: Option<Duration>,
        mut on_frame: impl FnMut(Duration),
    ) -> Result<(), PanelError> {
        let result = self.run_loop(input, clock, limit, &mut on_frame);
        self.shutdown();
        result
    }

    fn run_loop<C: Clock>(
        &mut self,
        input: &mut dyn Input,
        clock: &C,
        limit: Option<Duration>,
        on_frame: &mut dyn FnMut(Duration),
    ) -> Result<(), PanelError> {
        let stop_at = limit.map(|l| clock.now() + l);
        loop {
            let now = clock.now();
            if stop_at.map_or(false, |s| now >= s) {
                info!(refreshes = self.refreshes, "run limit reached");
                return Ok(());
            }
            while let Some(command) = input.poll_command()? {
                if self.apply(command, now) {
                    info!(refreshes = self.refreshes, "quit requested");
                    return Ok(());
                }
            }
            on_frame(now);
            self.tick(now)?;

            let mut wake = self.next_deadline().unwrap_or(now + self.refresh_period);
            if let Some(s) = stop_at {
                wake = wake.min(s);
            }
            clock.sleep_until(wake);
        }
    }

    /// Stop refreshing, detach the selector listener, let go of the processor
    /// and close the display. Safe to call more than once; failures are
    /// logged and otherwise ignored.
    pub fn shutdown(&mut self) {
        if self.refresh_due.take().is_none() {
            return;
        }
        self.selector.clear_change_listener();
        self.processor = None;
        if let Err(e) = self.display.close() {
            warn!(error = %e, "closing display failed");
        }
        debug!(refreshes = self.refreshes, "panel shut down");
    }
}

impl Drop for PanelController<'_> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
