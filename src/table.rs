//! Table grid bookkeeping for format parsers.
//!
//! Flow documents spell out every grid position: a cell spanning several
//! columns or rows is followed by covered-cell markers for the positions it
//! occupies. Most input formats only give the spans, so [`TableModel`] works
//! out where the markers go. A parser calls [`TableModel::open_row`] and
//! [`TableModel::open_cell`] alongside the matching collector calls and emits
//! one `collect_covered_table_cell` per reported position. The [`Fill`]s
//! from [`TableModel::close_row`] finish the row.

/// Where a cell lands in its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPlacement {
    /// Grid column of the cell.
    pub column: usize,
    /// Columns the cell actually spans. Narrower than requested when the
    /// cell would run into a position held by a row span from above.
    pub col_span: usize,
    /// Positions covered by cells from earlier rows, to emit before the cell.
    pub covered_before: usize,
    /// Extra columns spanned by this cell, to emit after it.
    pub covered_after: usize,
}

/// What goes at a row position no cell of the row was placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// Nothing spans the position; emit an empty cell.
    EmptyCell,
    /// A row span from above holds the position; emit a covered-cell marker.
    Covered,
}

/// Row/column span tracker for one table.
#[derive(Debug, Clone, Default)]
pub struct TableModel {
    /// Remaining rows below the current one that each column is covered for.
    below: Vec<u32>,
    /// Columns of the current row already taken.
    taken: Vec<bool>,
    column: usize,
    rows: usize,
    width: usize,
}

impl TableModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the next row.
    pub fn open_row(&mut self) {
        self.taken = self.below.iter().map(|&n| n > 0).collect();
        for n in &mut self.below {
            *n = n.saturating_sub(1);
        }
        self.column = 0;
        self.rows += 1;
    }

    /// Place a cell spanning `col_span` columns and `row_span` rows. Spans
    /// of zero count as one.
    pub fn open_cell(&mut self, col_span: u32, row_span: u32) -> CellPlacement {
        let col_span = col_span.max(1) as usize;
        let row_span = row_span.max(1);

        let mut covered_before = 0;
        while self.is_taken(self.column) {
            self.column += 1;
            covered_before += 1;
        }

        let column = self.column;
        let free = (column..column + col_span)
            .take_while(|&c| !self.is_taken(c))
            .count();
        if free < col_span {
            log::debug!(
                target: "folio::import",
                "cell at column {column} narrowed from {col_span} to {free} columns"
            );
        }
        let col_span = free;
        let end = column + col_span;
        if self.below.len() < end {
            self.below.resize(end, 0);
        }
        if self.taken.len() < end {
            self.taken.resize(end, false);
        }
        for c in column..end {
            self.below[c] = self.below[c].max(row_span - 1);
            self.taken[c] = true;
        }
        self.column = end;
        self.width = self.width.max(end);

        CellPlacement {
            column,
            col_span,
            covered_before,
            covered_after: col_span - 1,
        }
    }

    /// Finish the row; returns what to emit at its end, up to the last
    /// position a row span from above holds. Free positions before it get
    /// empty cells so that later markers keep their columns.
    pub fn close_row(&mut self) -> Vec<Fill> {
        let last = match self.taken.iter().rposition(|&taken| taken) {
            Some(last) if last >= self.column => last,
            _ => return Vec::new(),
        };
        let fills = (self.column..=last)
            .map(|c| if self.is_taken(c) { Fill::Covered } else { Fill::EmptyCell })
            .collect();
        self.column = last + 1;
        fills
    }

    /// Rows opened so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Widest row so far, in grid columns.
    pub fn columns(&self) -> usize {
        self.width
    }

    fn is_taken(&self, column: usize) -> bool {
        self.taken.get(column).copied().unwrap_or(false)
    }
}
