use crate::error::Fault;

/// Number of addressable words.
pub const MEMORY_MAX: usize = 512;

/// Word-addressed main memory.
///
/// Cells are loaded with 16-bit words but `store` writes whatever the accumulator holds, so
/// they are kept as `i64`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Memory {
    mem: Box<[i64; MEMORY_MAX]>,
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            mem: Box::new([0; MEMORY_MAX]),
        }
    }

    /// Memory holding `words` from address `orig` onwards.
    pub fn with_image(orig: usize, words: &[u16]) -> Result<Self, Fault> {
        let mut memory = Memory::new();
        let end = orig + words.len();
        if end > MEMORY_MAX {
            return Err(Fault::OutOfBounds {
                addr: MEMORY_MAX as i64,
            });
        }
        for (cell, word) in memory.mem[orig..end].iter_mut().zip(words) {
            *cell = i64::from(*word);
        }
        Ok(memory)
    }

    fn index(addr: i64) -> Result<usize, Fault> {
        usize::try_from(addr)
            .ok()
            .filter(|idx| *idx < MEMORY_MAX)
            .ok_or(Fault::OutOfBounds { addr })
    }

    pub fn get(&self, addr: i64) -> Result<i64, Fault> {
        Ok(self.mem[Self::index(addr)?])
    }

    pub fn set(&mut self, addr: i64, value: i64) -> Result<(), Fault> {
        self.mem[Self::index(addr)?] = value;
        Ok(())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
