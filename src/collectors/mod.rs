pub mod checks;
pub mod containers;
pub mod system;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskUsage {
    pub used_gb: u64,
    pub total_gb: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryUsage {
    pub used_mb: u64,
    pub total_mb: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSnapshot {
    pub disk: Option<DiskUsage>,
    pub memory: Option<MemoryUsage>,
    pub temperature: Option<String>,
}
