use std::fmt;
use std::time::{Duration, Instant};

/// Live counter for a translation run.
#[derive(Debug, Clone)]
pub struct Progress {
    pub rows_processed: usize,
    pub rows_total: usize,
    pub batches_completed: usize,
    start: Instant,
}

impl Progress {
    pub fn new(rows_total: usize) -> Self {
        Self {
            rows_processed: 0,
            rows_total,
            batches_completed: 0,
            start: Instant::now(),
        }
    }

    pub fn advance(&mut self, rows: usize) {
        self.rows_processed = (self.rows_processed + rows).min(self.rows_total);
        self.batches_completed += 1;
    }

    pub fn fraction(&self) -> f32 {
        if self.rows_total > 0 {
            self.rows_processed as f32 / self.rows_total as f32
        } else {
            0.0
        }
    }

    pub fn eta(&self) -> Option<Duration> {
        self.eta_after(self.start.elapsed())
    }

    fn eta_after(&self, elapsed: Duration) -> Option<Duration> {
        if self.rows_processed == 0 {
            return None;
        }
        let per_row = elapsed.as_secs_f64() / self.rows_processed as f64;
        let remaining = self.rows_total.saturating_sub(self.rows_processed);
        Some(Duration::from_secs_f64(per_row * remaining as f64))
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} messages ({:.1}%)",
            self.rows_processed,
            self.rows_total,
            self.fraction() * 100.0
        )?;
        if let Some(eta) = self.eta() {
            write!(f, ", eta {}s", eta.as_secs())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_rows_and_batches() {
        let mut progress = Progress::new(12);
        assert_eq!(progress.fraction(), 0.0);
        assert!(progress.eta().is_none());

        progress.advance(5);
        progress.advance(5);
        assert_eq!(progress.rows_processed, 10);
        assert_eq!(progress.batches_completed, 2);

        progress.advance(5);
        assert_eq!(progress.rows_processed, 12);
        assert_eq!(progress.fraction(), 1.0);
    }

    #[test]
    fn eta_scales_with_remaining_rows() {
        let mut progress = Progress::new(10);
        progress.advance(5);
        assert_eq!(
            progress.eta_after(Duration::from_secs(10)),
            Some(Duration::from_secs(10))
        );
    }

    #[test]
    fn empty_run_is_zero_percent() {
        assert_eq!(Progress::new(0).to_string(), "0/0 messages (0.0%)");
    }
}
