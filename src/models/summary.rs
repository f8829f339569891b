use std::time::Duration;

/// Rows written per resource, in processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    counts: Vec<(String, usize)>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a count, replacing any earlier count for the same resource.
    pub fn record(&mut self, resource: &str, rows: usize) {
        match self.counts.iter_mut().find(|(name, _)| name == resource) {
            Some((_, count)) => *count = rows,
            None => self.counts.push((resource.to_string(), rows)),
        }
    }

    pub fn get(&self, resource: &str) -> Option<usize> {
        self.counts
            .iter()
            .find(|(name, _)| name == resource)
            .map(|(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }
}

/// Outcome of one sync run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: RunSummary,
    pub duration: Duration,
    /// Resources whose fetch or write failed.
    pub failures: Vec<String>,
}
