/// Contiguous slice of the work list dispatched together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRange {
    pub index: usize,
    pub start_row: usize,
    pub end_row: usize,
}

impl BatchRange {
    pub fn row_count(&self) -> usize {
        self.end_row - self.start_row
    }

    /// A full batch holds exactly `width` rows; only the final one can be short.
    pub fn is_full(&self, width: usize) -> bool {
        self.row_count() == width
    }
}

pub struct RowBatcher {
    width: usize,
}

impl RowBatcher {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
        }
    }

    pub fn calculate_batches(&self, total_rows: usize) -> Vec<BatchRange> {
        let mut batches = Vec::with_capacity(total_rows.div_ceil(self.width));
        let mut start = 0;
        let mut index = 0;

        while start < total_rows {
            let end = (start + self.width).min(total_rows);
            batches.push(BatchRange {
                index,
                start_row: start,
                end_row: end,
            });
            start = end;
            index += 1;
        }

        batches
    }

    pub fn width(&self) -> usize {
        self.width
    }
}
