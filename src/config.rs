/// Low enough that a chain of eager calls stops before it overflows the 2 MiB stack of a
/// spawned thread, even unoptimized.
pub const DEFAULT_MAX_DEPTH: usize = 128;


#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Deepest nesting of eager (non-tail) calls before a run is aborted.
    pub max_depth: usize,
    /// Bounces a single trampoline run may follow. `None` lets tail loops run forever.
    pub max_bounces: Option<u64>,
}
impl Default for Config {
    fn default()->Self {
        Config {
            max_depth: DEFAULT_MAX_DEPTH,
            max_bounces: None,
        }
    }
}
