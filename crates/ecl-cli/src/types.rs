use ecl_model::LoincCode;

/// Outcome of one primary code within a batch run.
#[derive(Debug)]
pub struct BatchRow {
    pub primary: LoincCode,
    pub name: String,
    pub experiments: usize,
    pub failed_queries: usize,
    pub status: CodeStatus,
}

#[derive(Debug)]
pub enum CodeStatus {
    Ok,
    /// Some queries failed but the analysis completed.
    Partial,
    /// The whole analysis aborted; carries the error kind.
    Failed(String),
}

#[derive(Debug, Default)]
pub struct BatchResult {
    pub rows: Vec<BatchRow>,
    pub failed_codes: usize,
    pub failed_queries: usize,
}

impl BatchResult {
    /// Anything failed anywhere: the process should exit non-zero.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed_codes > 0 || self.failed_queries > 0
    }
}
