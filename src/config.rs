/// Snapshot format version; bump when the on-disk graph layout changes
pub const SNAPSHOT_VERSION: u32 = 1;

/// Progress update interval (tick every N records / dequeued nodes)
pub const PROGRESS_INTERVAL: u64 = 10_000;

/// Consecutive non-improving sweeps before diameter estimation stops
pub const DIAMETER_STALL_LIMIT: u32 = 5;

/// Buffer size for snapshot and working-table reads and writes
pub const IO_BUF_SIZE: usize = 256 * 1024;

/// File name of the persisted page catalog (id, decoded title)
pub const PAGES_FILE: &str = "pages.tsv";

/// File name of the forward graph snapshot
pub const GRAPH_FILE: &str = "graph.bin";

/// File name of the reversed graph snapshot
pub const GRAPH_REVERSE_FILE: &str = "graph_reverse.bin";
