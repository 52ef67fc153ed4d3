//! The terminal interpreter: applies parser events to the grid, cursor,
//! attribute machine, modes, charsets and selection, and emits the ordered
//! update stream plus host responses.

mod csi;
mod dcs;
mod esc;
mod osc;

use std::mem;

use log::trace;
use rtty_vte::{C1Transmission, ParserEvent, StringKind, Utf8Decoder};
use unicode_width::UnicodeWidthChar;

use crate::attributes::Attributes;
use crate::caps::TerminalFeatures;
use crate::cell::Cell;
use crate::charset::{CharsetIndex, Charsets};
use crate::grid::{Grid, TabStops};
use crate::modes::{
    PointerTracking, PrinterState, TerminalModes,
};
use crate::printer::{NoopPrinter, PrinterController};
use crate::selection::{Selection, SelectionPoint};
use crate::update::{
    CellUpdate, ClearScope, ClipboardEntry, LineAttr, Position,
    TerminalUpdate,
};

/// Cursor state saved by DECSC and restored by DECRC.
#[derive(Debug, Clone)]
struct SavedCursor {
    position: Position,
    attrs: Attributes,
    charsets: Charsets,
    origin: bool,
    protected: bool,
}

impl Default for SavedCursor {
    fn default() -> Self {
        Self {
            position: Position::default(),
            attrs: Attributes::default(),
            charsets: Charsets::default(),
            origin: false,
            protected: false,
        }
    }
}

/// An in-flight device control string.
#[derive(Debug, Default)]
struct DcsSession {
    byte: u8,
    intermediates: Vec<u8>,
    payload: Vec<u8>,
}

/// Options accepted by the cursor-motion API.
#[derive(Debug, Default, Clone)]
pub struct MoveOptions {
    /// Move the selection focus along with the cursor instead of clearing
    /// the selection.
    pub extend_selection: bool,
    /// Anchor to use when extending with no active selection.
    pub selection_anchor: Option<SelectionPoint>,
    /// Clamp the target column to the end of the row's content.
    pub clamp_to_line_end: bool,
    /// Clamp the target row to the last row with content.
    pub clamp_to_content_row: bool,
}

/// Arguments to [`Interpreter::edit_selection`].
#[derive(Debug, Default, Clone)]
pub struct SelectionEdit {
    /// Range to replace; falls back to the active selection, then to an
    /// insertion at the cursor.
    pub selection: Option<Selection>,
    pub replacement: String,
    /// Attributes for the inserted text; active attributes otherwise.
    pub attributes_override: Option<Attributes>,
}

/// Read-only view of the terminal state.
pub struct Snapshot<'a> {
    pub rows: usize,
    pub columns: usize,
    pub cursor: Position,
    pub grid: &'a Grid,
    pub attributes: &'a Attributes,
    pub default_attributes: &'a Attributes,
    pub scroll_top: usize,
    pub scroll_bottom: usize,
    pub modes: &'a TerminalModes,
    pub pointer: PointerTracking,
    pub c1_transmission: C1Transmission,
    pub title: Option<&'a str>,
    pub clipboard: Option<&'a ClipboardEntry>,
    pub selection: Option<&'a Selection>,
    pub line_attributes: &'a [LineAttr],
    pub last_sos_pm_apc: Option<&'a (StringKind, String)>,
    pub printer: PrinterState,
    pub answerback: &'a str,
}

pub struct Interpreter {
    features: TerminalFeatures,

    grid: Grid,
    cursor: Position,
    default_attrs: Attributes,
    attrs: Attributes,
    tabs: TabStops,
    line_attrs: Vec<LineAttr>,
    scroll_top: usize,
    scroll_bottom: usize,
    charsets: Charsets,
    saved: SavedCursor,
    modes: TerminalModes,
    pointer: PointerTracking,
    c1_transmission: C1Transmission,
    title: Option<String>,
    clipboard: Option<ClipboardEntry>,
    last_sos_pm_apc: Option<(StringKind, String)>,
    selection: Option<Selection>,
    answerback: String,
    /// DECSCA protection applied to subsequently written cells.
    protected: bool,
    last_printed: Option<char>,

    printer_state: PrinterState,
    printer: Box<dyn PrinterController>,

    utf8: Utf8Decoder,
    dcs: Option<DcsSession>,

    updates: Vec<TerminalUpdate>,
    pending_cells: Vec<CellUpdate>,
}

impl Interpreter {
    #[must_use]
    pub fn new(features: TerminalFeatures) -> Self {
        let rows = features.rows;
        let columns = features.columns;

        Self {
            grid: Grid::new(rows, columns),
            cursor: Position::default(),
            default_attrs: Attributes::default(),
            attrs: Attributes::default(),
            tabs: TabStops::new(columns),
            line_attrs: vec![LineAttr::Single; rows],
            scroll_top: 0,
            scroll_bottom: rows - 1,
            charsets: Charsets::default(),
            saved: SavedCursor::default(),
            modes: TerminalModes {
                auto_wrap: features.auto_wrap,
                cursor_visible: features.cursor_visibility,
                ..TerminalModes::default()
            },
            pointer: PointerTracking::default(),
            c1_transmission: features.default_c1_transmission,
            title: None,
            clipboard: None,
            last_sos_pm_apc: None,
            selection: None,
            answerback: String::new(),
            protected: false,
            last_printed: None,
            printer_state: PrinterState::default(),
            printer: Box::new(NoopPrinter),
            utf8: Utf8Decoder::new(),
            dcs: None,
            updates: Vec::new(),
            pending_cells: Vec::new(),
            features,
        }
    }

    /// Replace the printer sink.
    pub fn set_printer(&mut self, printer: Box<dyn PrinterController>) {
        self.printer = printer;
    }

    pub fn features(&self) -> &TerminalFeatures {
        &self.features
    }

    /// A live read-only view of the terminal state.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            rows: self.grid.rows(),
            columns: self.grid.columns(),
            cursor: self.cursor,
            grid: &self.grid,
            attributes: &self.attrs,
            default_attributes: &self.default_attrs,
            scroll_top: self.scroll_top,
            scroll_bottom: self.scroll_bottom,
            modes: &self.modes,
            pointer: self.pointer,
            c1_transmission: self.c1_transmission,
            title: self.title.as_deref(),
            clipboard: self.clipboard.as_ref(),
            selection: self.selection.as_ref(),
            line_attributes: &self.line_attrs,
            last_sos_pm_apc: self.last_sos_pm_apc.as_ref(),
            printer: self.printer_state,
            answerback: &self.answerback,
        }
    }

    /// Re-initialize to capability defaults, dropping partial DCS and UTF-8
    /// state.
    pub fn reset(&mut self) {
        self.apply_defaults();
        self.updates.clear();
        self.pending_cells.clear();
    }

    fn apply_defaults(&mut self) {
        let rows = self.features.rows;
        let columns = self.features.columns;

        self.grid = Grid::new(rows, columns);
        self.cursor = Position::default();
        self.attrs = self.default_attrs;
        self.tabs = TabStops::new(columns);
        self.line_attrs = vec![LineAttr::Single; rows];
        self.scroll_top = 0;
        self.scroll_bottom = rows - 1;
        self.charsets = Charsets::default();
        self.saved = SavedCursor::default();
        self.modes = TerminalModes {
            auto_wrap: self.features.auto_wrap,
            cursor_visible: self.features.cursor_visibility,
            ..TerminalModes::default()
        };
        self.pointer = PointerTracking::default();
        self.c1_transmission = self.features.default_c1_transmission;
        self.title = None;
        self.clipboard = None;
        self.last_sos_pm_apc = None;
        self.selection = None;
        self.answerback.clear();
        self.protected = false;
        self.last_printed = None;
        self.printer_state = PrinterState::default();
        self.utf8.reset();
        self.dcs = None;
    }

    /// Apply one parser event and return the resulting updates.
    pub fn handle_event(
        &mut self,
        event: ParserEvent<'_>,
    ) -> Vec<TerminalUpdate> {
        let cursor = self.cursor;
        self.apply(event);
        self.finish(cursor)
    }

    /// Apply a batch of events; updates are returned in causal order.
    pub fn handle_events<'a, I>(&mut self, events: I) -> Vec<TerminalUpdate>
    where
        I: IntoIterator<Item = ParserEvent<'a>>,
    {
        let cursor = self.cursor;
        for event in events {
            self.apply(event);
        }
        self.finish(cursor)
    }

    fn apply(&mut self, event: ParserEvent<'_>) {
        match event {
            ParserEvent::Print(bytes) => self.print_bytes(bytes),
            ParserEvent::Execute(byte) => {
                self.flush_utf8_partial();
                self.execute(byte);
            },
            ParserEvent::EscDispatch {
                intermediates,
                byte,
            } => {
                self.flush_utf8_partial();
                esc::dispatch(self, intermediates, byte);
            },
            ParserEvent::CsiDispatch {
                prefix,
                params,
                separators,
                intermediates,
                byte,
            } => {
                self.flush_utf8_partial();
                csi::dispatch(
                    self,
                    prefix,
                    params,
                    separators,
                    intermediates,
                    byte,
                );
            },
            ParserEvent::OscDispatch(data) => {
                self.flush_utf8_partial();
                osc::dispatch(self, data);
            },
            ParserEvent::DcsHook {
                params,
                intermediates,
                byte,
            } => {
                self.flush_utf8_partial();
                dcs::hook(self, params, intermediates, byte);
            },
            ParserEvent::DcsPut(bytes) => dcs::put(self, bytes),
            ParserEvent::DcsUnhook => dcs::unhook(self),
            ParserEvent::SosPmApcDispatch { kind, data } => {
                self.flush_utf8_partial();
                self.sos_pm_apc(kind, data);
            },
            ParserEvent::Ignore(_) => {},
        }
    }

    fn finish(&mut self, cursor_before: Position) -> Vec<TerminalUpdate> {
        self.flush_cells();
        if self.cursor != cursor_before {
            self.updates.push(TerminalUpdate::Cursor {
                position: self.cursor,
            });
        }
        mem::take(&mut self.updates)
    }

    // ---- update plumbing -------------------------------------------------

    pub(crate) fn push(&mut self, update: TerminalUpdate) {
        self.flush_cells();
        self.updates.push(update);
    }

    pub(crate) fn push_cell(&mut self, row: usize, column: usize, cell: Cell) {
        self.pending_cells.push(CellUpdate { row, column, cell });
    }

    fn flush_cells(&mut self) {
        if !self.pending_cells.is_empty() {
            let cells = mem::take(&mut self.pending_cells);
            self.updates.push(TerminalUpdate::Cells { cells });
        }
    }

    // ---- print path ------------------------------------------------------

    fn print_bytes(&mut self, bytes: &[u8]) {
        if self.printer_state.controller {
            self.printer.write(bytes);
            return;
        }

        let mut scalars = Vec::with_capacity(bytes.len());
        self.utf8.decode(bytes, &mut |c| scalars.push(c));
        for c in scalars {
            self.print_char(c);
        }
    }

    fn flush_utf8_partial(&mut self) {
        if let Some(c) = self.utf8.flush() {
            self.print_char(c);
        }
    }

    pub(crate) fn print_char(&mut self, c: char) {
        // Zero-width scalars occupy no cell in this model.
        if UnicodeWidthChar::width(c) == Some(0) {
            return;
        }

        let c = self.charsets.map(c);
        let columns = self.grid.columns();

        if self.cursor.column >= columns {
            if self.modes.auto_wrap {
                self.cursor.column = 0;
                self.index();
            } else {
                self.cursor.column = columns - 1;
            }
        }

        let row = self.cursor.row;
        let column = self.cursor.column;

        if self.modes.insert && column + 1 < columns {
            let cells = self.grid[row].cells_mut();
            for idx in (column..columns - 1).rev() {
                cells[idx + 1] = cells[idx];
            }
            for idx in column + 1..columns {
                let cell = self.grid[row][idx];
                self.push_cell(row, idx, cell);
            }
        }

        let cell = Cell {
            c,
            attrs: self.attrs,
            protected: self.protected,
        };
        self.grid[row][column] = cell;
        self.push_cell(row, column, cell);
        self.last_printed = Some(c);

        self.cursor.column += 1;
        if self.cursor.column == columns && !self.modes.auto_wrap {
            self.cursor.column = columns - 1;
        }
    }

    pub(crate) fn repeat_last(&mut self, count: usize) {
        if let Some(c) = self.last_printed {
            for _ in 0..count {
                self.print_char(c);
            }
        } else {
            trace!("repeat with no preceding scalar");
        }
    }

    // ---- executed controls -----------------------------------------------

    fn execute(&mut self, byte: u8) {
        if self.printer_state.controller && !matches!(byte, 0x0e | 0x0f) {
            self.printer.write(&[byte]);
            return;
        }

        let columns = self.grid.columns();
        match byte {
            // ENQ answers with the programmed answerback string.
            0x05 => {
                if !self.answerback.is_empty() {
                    let bytes = self.answerback.clone().into_bytes();
                    self.push(TerminalUpdate::Response { bytes });
                }
            },
            0x07 => self.push(TerminalUpdate::Bell),
            0x08 => {
                self.cursor.column =
                    self.cursor.column.min(columns - 1).saturating_sub(1);
            },
            0x09 => {
                self.cursor.column =
                    self.tabs.next(self.cursor.column.min(columns - 1));
            },
            0x0a..=0x0c => {
                if self.printer_state.auto_print {
                    let mut line = self.grid[self.cursor.row].text();
                    line.push('\n');
                    self.printer.write(line.as_bytes());
                }
                self.index();
                if self.modes.linefeed_newline {
                    self.cursor.column = 0;
                }
            },
            0x0d => self.cursor.column = 0,
            0x0e => self.charsets.set_gl(CharsetIndex::G1),
            0x0f => self.charsets.set_gl(CharsetIndex::G0),
            // C1 controls arrive raw under the `execute` policy.
            0x84 => self.index(),
            0x85 => {
                self.index();
                self.cursor.column = 0;
            },
            0x88 => self.tabs.set(self.cursor.column.min(columns - 1)),
            0x8d => self.reverse_index(),
            _ => trace!("unhandled control {byte:#04x}"),
        }
    }

    // ---- vertical motion and scrolling -----------------------------------

    pub(crate) fn index(&mut self) {
        if self.cursor.row == self.scroll_bottom {
            self.scroll_up(1);
        } else if self.cursor.row + 1 < self.grid.rows() {
            self.cursor.row += 1;
        }
    }

    pub(crate) fn reverse_index(&mut self) {
        if self.cursor.row == self.scroll_top {
            self.scroll_down(1);
        } else if self.cursor.row > 0 {
            self.cursor.row -= 1;
        }
    }

    pub(crate) fn scroll_up(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        let count = count.min(self.scroll_bottom - self.scroll_top + 1);
        self.grid.scroll_up(
            self.scroll_top,
            self.scroll_bottom,
            count,
            self.attrs,
        );
        self.line_attrs[self.scroll_top..=self.scroll_bottom]
            .rotate_left(count);
        for attr in
            &mut self.line_attrs[self.scroll_bottom + 1 - count..=self.scroll_bottom]
        {
            *attr = LineAttr::Single;
        }
        self.push(TerminalUpdate::Scroll {
            amount: count as i32,
        });
    }

    pub(crate) fn scroll_down(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        let count = count.min(self.scroll_bottom - self.scroll_top + 1);
        self.grid.scroll_down(
            self.scroll_top,
            self.scroll_bottom,
            count,
            self.attrs,
        );
        self.line_attrs[self.scroll_top..=self.scroll_bottom]
            .rotate_right(count);
        for attr in
            &mut self.line_attrs[self.scroll_top..self.scroll_top + count]
        {
            *attr = LineAttr::Single;
        }
        self.push(TerminalUpdate::Scroll {
            amount: -(count as i32),
        });
    }

    /// Vertical clamp bounds; origin mode confines motion to the scroll
    /// region.
    pub(crate) fn vertical_bounds(&self) -> (usize, usize) {
        if self.modes.origin {
            (self.scroll_top, self.scroll_bottom)
        } else {
            (0, self.grid.rows() - 1)
        }
    }

    /// Absolute cursor addressing; `row`/`column` are zero based and
    /// origin-relative when origin mode is set.
    pub(crate) fn goto(&mut self, row: usize, column: usize) {
        let (min_row, max_row) = self.vertical_bounds();
        let offset = if self.modes.origin { self.scroll_top } else { 0 };
        self.cursor.row = (row + offset).clamp(min_row, max_row);
        self.cursor.column = column.min(self.grid.columns() - 1);
    }

    /// Relative vertical motion, clamped per the origin-mode bounds.
    pub(crate) fn move_rows(&mut self, delta: isize, carriage_return: bool) {
        let (min_row, max_row) = self.vertical_bounds();
        let target = self.cursor.row as isize + delta;
        self.cursor.row =
            target.clamp(min_row as isize, max_row as isize) as usize;
        if carriage_return {
            self.cursor.column = 0;
        } else {
            self.cursor.column =
                self.cursor.column.min(self.grid.columns() - 1);
        }
    }

    pub(crate) fn move_columns(&mut self, delta: isize) {
        let columns = self.grid.columns();
        let current = self.cursor.column.min(columns - 1) as isize;
        self.cursor.column =
            (current + delta).clamp(0, columns as isize - 1) as usize;
    }

    // ---- blanking helpers ------------------------------------------------

    fn blank_cell(&self) -> Cell {
        Cell::blank(self.attrs)
    }

    /// Blank a column range of one row, optionally sparing protected cells.
    /// `emit` reports every change as a cell update; erases covered by a
    /// `clear` scope mutate quietly instead.
    pub(crate) fn blank_row_range(
        &mut self,
        row: usize,
        start: usize,
        end: usize,
        selective: bool,
        emit: bool,
    ) {
        let blank = self.blank_cell();
        let end = end.min(self.grid.columns());
        for column in start..end {
            if selective && self.grid[row][column].protected {
                continue;
            }
            self.grid[row][column] = blank;
            if emit {
                self.push_cell(row, column, blank);
            }
        }
    }

    /// Re-emit whole rows after a structural edit (IL/DL).
    pub(crate) fn emit_rows(&mut self, start: usize, end: usize) {
        for row in start..=end {
            for column in 0..self.grid.columns() {
                let cell = self.grid[row][column];
                self.push_cell(row, column, cell);
            }
        }
    }

    pub(crate) fn erase_in_display(&mut self, mode: usize, selective: bool) {
        let columns = self.grid.columns();
        let rows = self.grid.rows();
        let row = self.cursor.row;
        let column = self.cursor.column.min(columns - 1);

        match mode {
            0 => {
                self.blank_row_range(row, column, columns, selective, selective);
                for below in row + 1..rows {
                    self.blank_row_range(below, 0, columns, selective, selective);
                }
                if !selective {
                    self.push(TerminalUpdate::Clear {
                        scope: ClearScope::DisplayAfterCursor,
                    });
                }
            },
            1 => {
                for above in 0..row {
                    self.blank_row_range(above, 0, columns, selective, true);
                }
                self.blank_row_range(row, 0, column + 1, selective, true);
            },
            2 => {
                for line in 0..rows {
                    self.blank_row_range(line, 0, columns, selective, selective);
                }
                if !selective {
                    self.push(TerminalUpdate::Clear {
                        scope: ClearScope::Display,
                    });
                }
                self.goto(0, 0);
            },
            _ => trace!("unhandled erase-display mode {mode}"),
        }
    }

    pub(crate) fn erase_in_line(&mut self, mode: usize, selective: bool) {
        let columns = self.grid.columns();
        let row = self.cursor.row;
        let column = self.cursor.column.min(columns - 1);

        match mode {
            0 => {
                self.blank_row_range(row, column, columns, selective, selective);
                if !selective {
                    self.push(TerminalUpdate::Clear {
                        scope: ClearScope::LineAfterCursor,
                    });
                }
            },
            1 => self.blank_row_range(row, 0, column + 1, selective, true),
            2 => {
                self.blank_row_range(row, 0, columns, selective, selective);
                if !selective {
                    self.push(TerminalUpdate::Clear {
                        scope: ClearScope::Line,
                    });
                }
            },
            _ => trace!("unhandled erase-line mode {mode}"),
        }
    }

    // ---- structural edits ------------------------------------------------

    pub(crate) fn insert_blank_chars(&mut self, count: usize) {
        let columns = self.grid.columns();
        let row = self.cursor.row;
        let column = self.cursor.column.min(columns - 1);
        let count = count.min(columns - column);

        let cells = self.grid[row].cells_mut();
        for idx in (column..columns - count).rev() {
            cells[idx + count] = cells[idx];
        }
        let blank = Cell::blank(self.attrs);
        for idx in column..column + count {
            cells[idx] = blank;
        }
        for idx in column..columns {
            let cell = self.grid[row][idx];
            self.push_cell(row, idx, cell);
        }
    }

    pub(crate) fn delete_chars(&mut self, count: usize) {
        let columns = self.grid.columns();
        let row = self.cursor.row;
        let column = self.cursor.column.min(columns - 1);
        let count = count.min(columns - column);

        let cells = self.grid[row].cells_mut();
        for idx in column..columns - count {
            cells[idx] = cells[idx + count];
        }
        let blank = Cell::blank(self.attrs);
        for idx in columns - count..columns {
            cells[idx] = blank;
        }
        for idx in column..columns {
            let cell = self.grid[row][idx];
            self.push_cell(row, idx, cell);
        }
    }

    pub(crate) fn erase_chars(&mut self, count: usize) {
        let columns = self.grid.columns();
        let row = self.cursor.row;
        let column = self.cursor.column.min(columns - 1);
        let end = (column + count).min(columns);
        self.blank_row_range(row, column, end, false, true);
    }

    pub(crate) fn insert_lines(&mut self, count: usize) {
        let row = self.cursor.row;
        if row < self.scroll_top || row > self.scroll_bottom {
            return;
        }
        let count = count.min(self.scroll_bottom - row + 1);
        self.grid
            .scroll_down(row, self.scroll_bottom, count, self.attrs);
        self.line_attrs[row..=self.scroll_bottom].rotate_right(count);
        for attr in &mut self.line_attrs[row..row + count] {
            *attr = LineAttr::Single;
        }
        self.emit_rows(row, self.scroll_bottom);
    }

    pub(crate) fn delete_lines(&mut self, count: usize) {
        let row = self.cursor.row;
        if row < self.scroll_top || row > self.scroll_bottom {
            return;
        }
        let count = count.min(self.scroll_bottom - row + 1);
        self.grid
            .scroll_up(row, self.scroll_bottom, count, self.attrs);
        self.line_attrs[row..=self.scroll_bottom].rotate_left(count);
        for attr in
            &mut self.line_attrs[self.scroll_bottom + 1 - count..=self.scroll_bottom]
        {
            *attr = LineAttr::Single;
        }
        self.emit_rows(row, self.scroll_bottom);
    }

    // ---- tabs ------------------------------------------------------------

    pub(crate) fn tab_forward(&mut self, count: usize) {
        for _ in 0..count {
            self.cursor.column = self
                .tabs
                .next(self.cursor.column.min(self.grid.columns() - 1));
        }
    }

    pub(crate) fn tab_backward(&mut self, count: usize) {
        for _ in 0..count {
            self.cursor.column = self
                .tabs
                .previous(self.cursor.column.min(self.grid.columns() - 1));
        }
    }

    pub(crate) fn tabs_mut(&mut self) -> &mut TabStops {
        &mut self.tabs
    }

    // ---- scroll region ---------------------------------------------------

    /// DECSTBM with 1-based parameters; 0 selects the default edge.
    pub(crate) fn set_scroll_region(&mut self, top: usize, bottom: usize) {
        if !self.features.scroll_regions {
            return;
        }

        let rows = self.grid.rows();
        let top = top.max(1) - 1;
        let bottom = if bottom == 0 { rows } else { bottom.min(rows) } - 1;

        if top >= bottom {
            // Malformed regions reset to the full screen.
            self.scroll_top = 0;
            self.scroll_bottom = rows - 1;
        } else {
            self.scroll_top = top;
            self.scroll_bottom = bottom;
        }

        self.push(TerminalUpdate::ScrollRegion {
            top: self.scroll_top,
            bottom: self.scroll_bottom,
        });
        self.goto(0, 0);
    }

    // ---- saved cursor, reset, resize -------------------------------------

    pub(crate) fn save_cursor(&mut self) {
        self.saved = SavedCursor {
            position: self.cursor,
            attrs: self.attrs,
            charsets: self.charsets.clone(),
            origin: self.modes.origin,
            protected: self.protected,
        };
    }

    pub(crate) fn restore_cursor(&mut self) {
        let saved = self.saved.clone();
        self.modes.origin = saved.origin;
        self.charsets = saved.charsets;
        self.attrs = saved.attrs;
        self.protected = saved.protected;

        // The scroll region may have moved since the save; with origin
        // mode restored the cursor must land inside it.
        let (min_row, max_row) = self.vertical_bounds();
        self.cursor = Position {
            row: saved.position.row.clamp(min_row, max_row),
            column: saved.position.column.min(self.grid.columns()),
        };
        self.push(TerminalUpdate::Attributes {
            attributes: self.attrs,
        });
    }

    /// RIS: full reinitialization plus the updates a renderer needs to
    /// resynchronize.
    pub(crate) fn full_reset(&mut self) {
        self.apply_defaults();
        self.push(TerminalUpdate::Clear {
            scope: ClearScope::Display,
        });
        self.push(TerminalUpdate::ScrollRegion {
            top: self.scroll_top,
            bottom: self.scroll_bottom,
        });
        self.push(TerminalUpdate::Attributes {
            attributes: self.attrs,
        });
        self.push(TerminalUpdate::CursorVisibility {
            visible: self.modes.cursor_visible,
        });
    }

    /// Change the grid dimensions, preserving content that still fits.
    pub fn resize(&mut self, rows: usize, columns: usize) -> Vec<TerminalUpdate> {
        let cursor = self.cursor;
        self.resize_grid(
            rows.max(crate::caps::MIN_ROWS),
            columns.max(crate::caps::MIN_COLUMNS),
        );
        self.finish(cursor)
    }

    pub(crate) fn resize_grid(&mut self, rows: usize, columns: usize) {
        let full_region = self.scroll_top == 0
            && self.scroll_bottom + 1 == self.grid.rows();

        self.grid.resize(rows, columns);
        self.tabs.resize(columns);
        self.line_attrs.resize(rows, LineAttr::Single);

        if full_region {
            self.scroll_top = 0;
            self.scroll_bottom = rows - 1;
        } else {
            self.scroll_bottom = self.scroll_bottom.min(rows - 1);
            self.scroll_top = self.scroll_top.min(self.scroll_bottom);
        }

        self.cursor.row = self.cursor.row.min(rows - 1);
        self.cursor.column = self.cursor.column.min(columns);

        let out_of_bounds = |point: &SelectionPoint| {
            point.row >= rows || point.column > columns
        };
        if self
            .selection
            .as_ref()
            .is_some_and(|s| out_of_bounds(&s.anchor) || out_of_bounds(&s.focus))
        {
            self.selection = None;
            self.push(TerminalUpdate::SelectionClear);
        }
    }

    // ---- selection -------------------------------------------------------

    fn clamp_selection(&self, mut selection: Selection) -> Selection {
        let rows = self.grid.rows();
        let columns = self.grid.columns();
        for point in [&mut selection.anchor, &mut selection.focus] {
            point.row = point.row.min(rows - 1);
            point.column = point.column.min(columns);
        }
        selection
    }

    pub fn set_selection(&mut self, selection: Selection) -> Vec<TerminalUpdate> {
        let cursor = self.cursor;
        let selection = self.clamp_selection(selection);
        self.selection = Some(selection);
        self.push(TerminalUpdate::SelectionSet { selection });
        self.finish(cursor)
    }

    /// Update the active selection; equal values produce no update.
    pub fn update_selection(
        &mut self,
        selection: Selection,
    ) -> Vec<TerminalUpdate> {
        let cursor = self.cursor;
        let selection = self.clamp_selection(selection);
        if self.selection != Some(selection) {
            self.selection = Some(selection);
            self.push(TerminalUpdate::SelectionUpdate { selection });
        }
        self.finish(cursor)
    }

    /// Clear the selection; a no-op when none is active.
    pub fn clear_selection(&mut self) -> Vec<TerminalUpdate> {
        let cursor = self.cursor;
        if self.selection.take().is_some() {
            self.push(TerminalUpdate::SelectionClear);
        }
        self.finish(cursor)
    }

    /// Replace the selected range (or insert at the cursor when no
    /// selection is active) and clear the selection.
    pub fn edit_selection(&mut self, edit: SelectionEdit) -> Vec<TerminalUpdate> {
        let cursor = self.cursor;
        let target = edit.selection.or(self.selection).map(|s| self.clamp_selection(s));
        let attrs = edit.attributes_override.unwrap_or(self.attrs);

        let mut write_at = self.cursor;
        if let Some(selection) = target.filter(|s| !s.is_empty()) {
            let (start, end) = selection.bounds();
            match selection.kind {
                crate::selection::SelectionKind::Normal => {
                    for row in start.row..=end.row {
                        let from = if row == start.row { start.column } else { 0 };
                        let to = if row == end.row {
                            end.column
                        } else {
                            self.grid.columns()
                        };
                        self.blank_row_range(row, from, to, false, true);
                    }
                },
                crate::selection::SelectionKind::Rectangular => {
                    let (left, right) = if start.column <= end.column {
                        (start.column, end.column)
                    } else {
                        (end.column, start.column)
                    };
                    for row in start.row..=end.row {
                        self.blank_row_range(row, left, right, false, true);
                    }
                },
            }
            write_at = start;
        }

        self.cursor = Position {
            row: write_at.row.min(self.grid.rows() - 1),
            column: write_at.column.min(self.grid.columns()),
        };
        self.write_text(&edit.replacement, attrs);

        if self.selection.take().is_some() {
            self.push(TerminalUpdate::SelectionClear);
        }
        self.finish(cursor)
    }

    /// Write host-supplied text directly, splitting on newlines; no charset
    /// mapping, no wrapping, truncated at the right edge.
    fn write_text(&mut self, text: &str, attrs: Attributes) {
        let rows = self.grid.rows();
        let columns = self.grid.columns();

        for (idx, line) in text.split('\n').enumerate() {
            if idx > 0 {
                if self.cursor.row + 1 >= rows {
                    break;
                }
                self.cursor.row += 1;
                self.cursor.column = 0;
            }
            for c in line.chars() {
                if self.cursor.column >= columns {
                    break;
                }
                let cell = Cell {
                    c,
                    attrs,
                    protected: false,
                };
                self.grid[self.cursor.row][self.cursor.column] = cell;
                self.push_cell(self.cursor.row, self.cursor.column, cell);
                self.cursor.column += 1;
            }
        }
    }

    // ---- host cursor motion ----------------------------------------------

    pub fn move_cursor_left(&mut self, opts: &MoveOptions) -> Vec<TerminalUpdate> {
        let target = Position {
            row: self.cursor.row,
            column: self.cursor.column.saturating_sub(1),
        };
        self.host_motion(target, opts)
    }

    pub fn move_cursor_right(&mut self, opts: &MoveOptions) -> Vec<TerminalUpdate> {
        let target = Position {
            row: self.cursor.row,
            column: self.cursor.column + 1,
        };
        self.host_motion(target, opts)
    }

    pub fn move_cursor_up(&mut self, opts: &MoveOptions) -> Vec<TerminalUpdate> {
        let target = Position {
            row: self.cursor.row.saturating_sub(1),
            column: self.cursor.column,
        };
        self.host_motion(target, opts)
    }

    pub fn move_cursor_down(&mut self, opts: &MoveOptions) -> Vec<TerminalUpdate> {
        let target = Position {
            row: self.cursor.row + 1,
            column: self.cursor.column,
        };
        self.host_motion(target, opts)
    }

    pub fn move_cursor_line_start(
        &mut self,
        opts: &MoveOptions,
    ) -> Vec<TerminalUpdate> {
        let target = Position {
            row: self.cursor.row,
            column: 0,
        };
        self.host_motion(target, opts)
    }

    pub fn move_cursor_line_end(
        &mut self,
        opts: &MoveOptions,
    ) -> Vec<TerminalUpdate> {
        let target = Position {
            row: self.cursor.row,
            column: self.grid[self.cursor.row].content_len(),
        };
        self.host_motion(target, opts)
    }

    pub fn move_cursor_word_left(
        &mut self,
        opts: &MoveOptions,
    ) -> Vec<TerminalUpdate> {
        let row = self.cursor.row;
        let mut column = self.cursor.column.min(self.grid.columns());

        while column > 0 && self.grid[row][column - 1].c == ' ' {
            column -= 1;
        }
        while column > 0 && self.grid[row][column - 1].c != ' ' {
            column -= 1;
        }

        self.host_motion(Position { row, column }, opts)
    }

    pub fn move_cursor_word_right(
        &mut self,
        opts: &MoveOptions,
    ) -> Vec<TerminalUpdate> {
        let row = self.cursor.row;
        let columns = self.grid.columns();
        let mut column = self.cursor.column.min(columns);

        while column < columns && self.grid[row][column].c != ' ' {
            column += 1;
        }
        while column < columns && self.grid[row][column].c == ' ' {
            column += 1;
        }

        self.host_motion(Position { row, column }, opts)
    }

    pub fn move_cursor_to(
        &mut self,
        position: Position,
        opts: &MoveOptions,
    ) -> Vec<TerminalUpdate> {
        self.host_motion(position, opts)
    }

    fn host_motion(
        &mut self,
        target: Position,
        opts: &MoveOptions,
    ) -> Vec<TerminalUpdate> {
        let cursor = self.cursor;

        let mut row = target.row.min(self.grid.rows() - 1);
        if opts.clamp_to_content_row {
            row = row.min(self.last_content_row());
        }

        let mut column = target.column.min(self.grid.columns());
        if opts.clamp_to_line_end {
            column = column.min(self.grid[row].content_len());
        }

        let position = Position { row, column };

        if opts.extend_selection {
            let anchor = opts
                .selection_anchor
                .or_else(|| self.selection.map(|s| s.anchor))
                .unwrap_or_else(|| {
                    SelectionPoint::new(cursor.row, cursor.column)
                });
            let focus = SelectionPoint::new(position.row, position.column);
            let had_selection = self.selection.is_some();
            let mut selection = Selection::new(anchor, focus);
            if let Some(existing) = self.selection {
                selection.kind = existing.kind;
                selection.status = existing.status;
            }

            if had_selection {
                if self.selection != Some(selection) {
                    self.selection = Some(selection);
                    self.push(TerminalUpdate::SelectionUpdate { selection });
                }
            } else {
                self.selection = Some(selection);
                self.push(TerminalUpdate::SelectionSet { selection });
            }
        } else if self.selection.take().is_some() {
            self.push(TerminalUpdate::SelectionClear);
        }

        self.cursor = position;
        self.finish(cursor)
    }

    fn last_content_row(&self) -> usize {
        (0..self.grid.rows())
            .rev()
            .find(|&row| self.grid[row].content_len() > 0)
            .unwrap_or(0)
    }

    // ---- control strings -------------------------------------------------

    fn sos_pm_apc(&mut self, kind: StringKind, data: &[u8]) {
        if !self.features.sos_pm_apc {
            return;
        }
        let text = String::from_utf8_lossy(data).into_owned();
        self.last_sos_pm_apc = Some((kind, text.clone()));
        self.push(TerminalUpdate::SosPmApc {
            control: kind.into(),
            data: text,
        });
    }

    // ---- responses -------------------------------------------------------

    /// Emit a control-sequence response; the introducer follows the C1
    /// transmission mode.
    pub(crate) fn respond_csi(&mut self, tail: &str) {
        let mut bytes = match self.c1_transmission {
            C1Transmission::SevenBit => vec![0x1b, b'['],
            C1Transmission::EightBit => vec![0x9b],
        };
        bytes.extend_from_slice(tail.as_bytes());
        self.push(TerminalUpdate::Response { bytes });
    }

    pub(crate) fn report_primary_da(&mut self) {
        let tail = self.features.primary_da.clone();
        self.respond_csi(&tail);
    }

    pub(crate) fn report_secondary_da(&mut self) {
        let tail = self.features.secondary_da.clone();
        self.respond_csi(&tail);
    }

    pub(crate) fn report_cursor_position(&mut self) {
        // Saturate: the cursor can sit above the region when origin mode
        // was toggled around a region change.
        let row = if self.modes.origin {
            self.cursor.row.saturating_sub(self.scroll_top)
        } else {
            self.cursor.row
        };
        let column = self.cursor.column.min(self.grid.columns() - 1);
        let tail = format!("{};{}R", row + 1, column + 1);
        self.respond_csi(&tail);
    }
}
