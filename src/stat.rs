use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Stats {
    pub costs: usize,
    pub time_us: usize,
    pub expanded_nodes: usize,
    pub generated_nodes: usize,
    pub duplicate_nodes: usize,
    pub merged_parents: usize,
    pub arena_records: usize,
}

impl Stats {
    pub fn print(&self) {
        info!(
            "Cost {:?} Time(microseconds) {:?} Expanded nodes {:?} Generated nodes {:?} Duplicates {:?} Merged parents {:?} Arena records {:?}",
            self.costs,
            self.time_us,
            self.expanded_nodes,
            self.generated_nodes,
            self.duplicate_nodes,
            self.merged_parents,
            self.arena_records
        );
    }

    /// Fold another run's counters into this one.
    pub fn absorb(&mut self, other: &Stats) {
        self.costs += other.costs;
        self.time_us += other.time_us;
        self.expanded_nodes += other.expanded_nodes;
        self.generated_nodes += other.generated_nodes;
        self.duplicate_nodes += other.duplicate_nodes;
        self.merged_parents += other.merged_parents;
        self.arena_records += other.arena_records;
    }
}
