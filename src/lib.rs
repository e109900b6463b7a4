//! # panel1620
//!
//! ## Design
//!
//! * show the console of an IBM 1620 from whatever a processor reports; the
//!   processor itself lives elsewhere
//! * abstract the display so can plug alternatives; starting with TUI in-console
//! * lamps only talk to the display when their visible level changes
//! * all timing comes from an injected clock, so tests don't sleep
//!
//! Pieces:
//!
//! * lamps
//!    - quantise a [0,1] glow onto a handful of brightness levels
//!    - gate lamps, coloured status lamps and toggle switches all work the same
//! * registers
//!    - a row of lamps, one per bit, 5 or 6 bits per digit (1,2,4,8,C[,F])
//!    - fed either a bit pattern (diffed, 30 bits at a time) or per-bit glow
//! * the MAR selector knob
//!    - discrete stops, turns the short way round one stop per step period
//!    - one change listener, told only where the knob comes to rest
//! * the panel controller
//!    - builds everything from a layout
//!    - polls the processor every refresh period and pushes into the widgets
//! * display, with trait for rendering
//! * input device, with trait for reading key-presses
//! * clock, with trait so time can be faked
//!
//! Model
//!
//! main
//!  |-- config, clock, display(layout), input, processor
//!  |-- panel(layout, config, processor, display)
//!  |    |-- lamps, registers, selector(listener -> processor)
//!  |    `-- refresh: processor -> lamps/registers -> display
//!  `-- run loop
//!       |-- apply input commands
//!       |-- panel.tick(now)
//!       `-- sleep until panel.next_deadline()
pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod input;
pub mod lamp;
pub mod layout;
pub mod panel;
pub mod processor;
pub mod register;
pub mod selector;

pub use error::PanelError;
