//! Aggregate load progress.

/// Counts completed loads. Failures count as completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    loaded: usize,
    total: usize,
}

impl LoadProgress {
    pub fn new(total: usize) -> Self {
        Self { loaded: 0, total }
    }

    /// Record one completed item and return the new ratio.
    pub fn complete_one(&mut self) -> f32 {
        self.loaded = (self.loaded + 1).min(self.total);
        self.ratio()
    }

    /// Completion ratio in `[0, 1]`. An empty set is already complete.
    pub fn ratio(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        (self.loaded as f32 / self.total as f32).min(1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.loaded >= self.total
    }

    pub fn loaded(&self) -> usize {
        self.loaded
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set_reports_one() {
        let progress = LoadProgress::new(0);
        assert_eq!(progress.ratio(), 1.0);
        assert!(progress.is_complete());
    }

    #[test]
    fn test_ratio_after_each_completion() {
        let mut progress = LoadProgress::new(4);
        assert_eq!(progress.ratio(), 0.0);
        assert_eq!(progress.complete_one(), 0.25);
        assert_eq!(progress.complete_one(), 0.5);
        assert_eq!(progress.complete_one(), 0.75);
        assert!(!progress.is_complete());
        assert_eq!(progress.complete_one(), 1.0);
        assert!(progress.is_complete());
    }

    #[test]
    fn test_extra_completions_stay_capped() {
        let mut progress = LoadProgress::new(1);
        progress.complete_one();
        assert_eq!(progress.complete_one(), 1.0);
        assert_eq!(progress.loaded(), 1);
    }
}
