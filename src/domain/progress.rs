use log::info;

/// Track progress of a batch fetch
pub struct FetchProgress {
    label: String,
    total: usize,
    fetched: usize,
    cached: usize,
    missing: usize,
}

impl FetchProgress {
    pub fn new(label: &str, total: usize) -> Self {
        Self {
            label: label.to_string(),
            total,
            fetched: 0,
            cached: 0,
            missing: 0,
        }
    }

    pub fn add_cached(&mut self, count: usize) {
        self.cached += count;
        self.log_progress();
    }

    pub fn increment_fetched(&mut self) {
        self.fetched += 1;
        self.log_progress();
    }

    pub fn increment_missing(&mut self) {
        self.missing += 1;
        self.log_progress();
    }

    pub fn current_count(&self) -> usize {
        self.fetched + self.cached + self.missing
    }

    pub fn missing(&self) -> usize {
        self.missing
    }

    fn log_progress(&self) {
        let current = self.current_count();
        if should_log(current, self.total) {
            info!(
                "  → {} progress: {}/{} ({} new, {} cached, {} missing)",
                self.label, current, self.total, self.fetched, self.cached, self.missing
            );
        }
    }
}

fn should_log(current: usize, total: usize) -> bool {
    is_milestone(current) || is_complete(current, total)
}

fn is_milestone(count: usize) -> bool {
    count % 10 == 0
}

fn is_complete(current: usize, total: usize) -> bool {
    current == total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_every_outcome() {
        let mut progress = FetchProgress::new("beatmaps", 5);
        progress.add_cached(2);
        progress.increment_fetched();
        progress.increment_fetched();
        progress.increment_missing();

        assert_eq!(progress.current_count(), 5);
        assert_eq!(progress.missing(), 1);
    }
}
