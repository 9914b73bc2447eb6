#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Terminal nozzle visualization: one coloured box per lane, lit while on.
use std::io::{self, Stdout, Write};
use std::sync::{Mutex, PoisonError};

use crossterm::{
    cursor, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use sprayer_core::{ChannelState, TransitionSink};

struct Row<W> {
    out: W,
    states: Vec<ChannelState>,
}

/// Redraws a single terminal line on every lane transition.
pub struct NozzleVis<W: Write + Send = Stdout> {
    row: Mutex<Row<W>>,
}

impl NozzleVis<Stdout> {
    pub fn stdout(lanes: usize) -> io::Result<Self> {
        Self::new(io::stdout(), lanes)
    }
}

impl<W: Write + Send> NozzleVis<W> {
    /// Draw the initial all-off row.
    pub fn new(out: W, lanes: usize) -> io::Result<Self> {
        let mut row = Row {
            out,
            states: vec![ChannelState::Off; lanes],
        };
        draw(&mut row)?;
        Ok(Self {
            row: Mutex::new(row),
        })
    }

    pub fn states(&self) -> Vec<ChannelState> {
        self.lock().states.clone()
    }

    /// Leave the row in place and restore default colours.
    pub fn close(self) -> io::Result<W> {
        let mut row = self.row.into_inner().unwrap_or_else(PoisonError::into_inner);
        queue!(row.out, ResetColor, Print("\r\n"))?;
        row.out.flush()?;
        Ok(row.out)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Row<W>> {
        self.row.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn draw<W: Write>(row: &mut Row<W>) -> io::Result<()> {
    queue!(row.out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    for (lane, state) in row.states.iter().enumerate() {
        let bg = if state.is_on() { Color::Green } else { Color::DarkGrey };
        queue!(
            row.out,
            SetBackgroundColor(bg),
            SetForegroundColor(Color::Black),
            Print(format!(" {lane:^3} ")),
            ResetColor,
            Print(" ")
        )?;
    }
    row.out.flush()
}

impl<W: Write + Send> TransitionSink for NozzleVis<W> {
    fn update(&self, lane: usize, state: ChannelState) {
        let mut row = self.lock();
        let Some(slot) = row.states.get_mut(lane) else {
            return;
        };
        *slot = state;
        if let Err(e) = draw(&mut row) {
            tracing::debug!(error = %e, "nozzle display write failed");
        }
    }
}
