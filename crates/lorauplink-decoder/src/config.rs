use std::time::Duration;

/// Resource budgets for decoder scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Wall-clock budget per decode call. Default: 10 ms.
    pub timeout: Duration,
    /// Interpreter stack budget in bytes; bounds call depth. Default: 256 KiB.
    pub stack_limit: usize,
    /// Interpreter heap cap in bytes. Default: 8 MiB.
    pub memory_limit: usize,
    /// Function invoked with `(fPort, bytes)`. Must be a plain identifier.
    pub entry_point: String,
    /// Maximum script file size accepted by [`crate::load_script`]. Default: 256 KiB.
    pub max_script_size: usize,
    /// Maximum nesting of the returned object. Default: 16.
    pub max_result_depth: usize,
    /// Maximum number of values converted from the result, counting every
    /// path through shared sub-objects. Default: 4096.
    pub max_result_values: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(10),
            stack_limit: 256 * 1024,
            memory_limit: 8 * 1024 * 1024,
            entry_point: "Decode".to_string(),
            max_script_size: 256 * 1024,
            max_result_depth: 16,
            max_result_values: 4096,
        }
    }
}
