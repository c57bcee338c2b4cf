use miette::{bail, Result};

/// Assembled program: one word per statement, loaded from the program origin onwards.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct Image {
    words: Vec<u16>,
}

impl Image {
    pub fn new(words: Vec<u16>) -> Self {
        Image { words }
    }

    pub fn words(&self) -> &[u16] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Binary image: contiguous words in native byte order.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.words.iter().flat_map(|word| word.to_ne_bytes()).collect()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 2 != 0 {
            bail!("File is not aligned to 16 bits")
        }
        let words = bytes
            .chunks_exact(2)
            .map(|word| u16::from_ne_bytes([word[0], word[1]]))
            .collect();
        Ok(Image { words })
    }
}
