//! The tape: cells plus the active pointer, shared between the executing
//! machine and any number of readers on other threads.
//!
//! Writers take the exclusive lock for one mutation at a time, never for a
//! whole run, so readers interleave between instructions but never see a
//! half-applied cell write.

use crate::error::RuntimeError;
use std::fmt::Write as _;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// One tape cell.
pub type Cell = i64;

#[derive(Debug)]
struct TapeState {
    cells: Vec<Cell>,
    pointer: usize,
}

/// Exclusive-write handle owned by the machine.
#[derive(Debug)]
pub(crate) struct Tape {
    shared: Arc<RwLock<TapeState>>,
    size: usize,
}

impl Tape {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            shared: Arc::new(RwLock::new(TapeState {
                cells: vec![0; size],
                pointer: 0,
            })),
            size,
        }
    }

    pub(crate) fn view(&self) -> TapeView {
        TapeView {
            shared: Arc::clone(&self.shared),
            size: self.size,
        }
    }

    pub(crate) fn pointer(&self) -> usize {
        self.read().pointer
    }

    /// Move the pointer by `delta`, failing if the target leaves the tape.
    pub(crate) fn shift(&self, at: usize, delta: isize) -> Result<(), RuntimeError> {
        let mut state = self.write();
        let target = (state.pointer as isize).saturating_add(delta);
        if target < 0 || target as usize >= self.size {
            return Err(RuntimeError::TapeBounds {
                at,
                pointer: target,
                size: self.size,
            });
        }
        state.pointer = target as usize;
        Ok(())
    }

    /// Value of the cell under the pointer.
    pub(crate) fn current(&self, at: usize) -> Result<Cell, RuntimeError> {
        let state = self.read();
        state
            .cells
            .get(state.pointer)
            .copied()
            .ok_or_else(|| self.out_of_bounds(at, state.pointer))
    }

    /// Replace the cell under the pointer with `f(old)`.
    pub(crate) fn update(
        &self,
        at: usize,
        f: impl FnOnce(Cell) -> Cell,
    ) -> Result<(), RuntimeError> {
        let mut state = self.write();
        let pointer = state.pointer;
        match state.cells.get_mut(pointer) {
            Some(cell) => {
                *cell = f(*cell);
                Ok(())
            }
            None => Err(self.out_of_bounds(at, pointer)),
        }
    }

    fn out_of_bounds(&self, at: usize, pointer: usize) -> RuntimeError {
        RuntimeError::TapeBounds {
            at,
            pointer: pointer as isize,
            size: self.size,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, TapeState> {
        self.shared.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TapeState> {
        self.shared.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Read-only handle on a machine's tape.
///
/// Cheap to clone and safe to use from any thread while the machine runs.
#[derive(Debug, Clone)]
pub struct TapeView {
    shared: Arc<RwLock<TapeState>>,
    size: usize,
}

impl TapeView {
    /// Number of cells.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn pointer(&self) -> usize {
        self.read().pointer
    }

    pub fn cell(&self, index: usize) -> Option<Cell> {
        self.read().cells.get(index).copied()
    }

    /// Copy cells and pointer under a single shared lock.
    pub fn snapshot(&self) -> TapeSnapshot {
        let state = self.read();
        TapeSnapshot {
            cells: state.cells.clone(),
            pointer: state.pointer,
        }
    }

    /// Render the whole tape. See [`TapeSnapshot::render`].
    pub fn render(&self, format: CellFormat, wrap: usize) -> String {
        self.snapshot().render(format, wrap)
    }

    fn read(&self) -> RwLockReadGuard<'_, TapeState> {
        self.shared.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A consistent copy of the tape at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapeSnapshot {
    pub cells: Vec<Cell>,
    pub pointer: usize,
}

impl TapeSnapshot {
    /// Render every cell as `|value`, the active cell as `|(value)`.
    ///
    /// With `wrap > 0` lines break between cells so that no line is longer
    /// than `wrap` characters, unless a single cell is.
    pub fn render(&self, format: CellFormat, wrap: usize) -> String {
        let mut out = String::new();
        let mut line_len = 0;
        let mut piece = String::new();

        for (i, &cell) in self.cells.iter().enumerate() {
            piece.clear();
            if i == self.pointer {
                let _ = write!(piece, "|({})", format.format(cell));
            } else {
                let _ = write!(piece, "|{}", format.format(cell));
            }

            if wrap > 0 && line_len > 0 && line_len + piece.len() > wrap {
                out.push('\n');
                line_len = 0;
            }
            out.push_str(&piece);
            line_len += piece.len();
        }

        out
    }
}

/// Number base used when rendering cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellFormat {
    #[default]
    Decimal,
    Hex,
}

impl CellFormat {
    /// The next format in the display cycle.
    pub fn cycle(self) -> Self {
        match self {
            CellFormat::Decimal => CellFormat::Hex,
            CellFormat::Hex => CellFormat::Decimal,
        }
    }

    pub fn format(self, cell: Cell) -> String {
        match self {
            CellFormat::Decimal => cell.to_string(),
            CellFormat::Hex if cell < 0 => format!("-{:x}", cell.unsigned_abs()),
            CellFormat::Hex => format!("{cell:x}"),
        }
    }
}
