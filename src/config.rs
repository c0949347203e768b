/// Where the generated program places its data.
///
/// Every address handed out during a compilation is derived from these bases:
/// declared symbols grow upwards from `data_start`, scalar temporaries from
/// `temp_start` and array literals from `array_start`. The runtime call stack
/// keeps its pointer in the `stack_pointer` cell and starts at `stack_base`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryLayout {
    pub data_start: usize,
    pub temp_start: usize,
    pub array_start: usize,
    pub stack_pointer: usize,
    pub stack_base: usize,
    pub word_size: usize,
}

impl MemoryLayout {
    /// Layout with a custom temporaries base; the array region follows it at twice the address.
    pub fn with_temp_start(temp_start: usize) -> Self {
        Self {
            temp_start,
            array_start: temp_start * 2,
            ..Self::default()
        }
    }
}

impl Default for MemoryLayout {
    fn default() -> Self {
        Self {
            data_start: 100,
            temp_start: 1500,
            array_start: 3000,
            stack_pointer: 500,
            stack_base: 8000,
            word_size: 4,
        }
    }
}
