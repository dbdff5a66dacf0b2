/// Fixed-length bitset packed into `u64` words.
///
/// Unlike a growable set, the length is explicit: bits past `len` never read as set and
/// [`BitSet::resize`] is the only way the set gets longer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BitSet {
    words: Vec<u64>,
    len: u32,
}

impl BitSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_len(len: u32) -> Self {
        let mut set = Self::new();
        set.resize(len);
        set
    }

    /// Number of addressable bits
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Grow or shrink to `len` bits. Newly exposed bits are cleared.
    pub fn resize(&mut self, len: u32) {
        let words = (len as usize).div_ceil(64);
        self.words.resize(words, 0);
        if len < self.len {
            // clear the tail of the last word so a later grow exposes zeroes
            let tail = len % 64;
            if tail != 0 {
                if let Some(last) = self.words.last_mut() {
                    *last &= (1u64 << tail) - 1;
                }
            }
        }
        self.len = len;
    }

    pub fn set(&mut self, index: u32) {
        assert!(index < self.len, "bit {index} out of range {}", self.len);
        self.words[(index / 64) as usize] |= 1 << (index % 64);
    }

    pub fn clear(&mut self, index: u32) {
        if index < self.len {
            self.words[(index / 64) as usize] &= !(1 << (index % 64));
        }
    }

    pub fn contains(&self, index: u32) -> bool {
        if index >= self.len {
            return false;
        }
        self.words[(index / 64) as usize] & (1 << (index % 64)) != 0
    }

    /// Number of set bits
    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|word| word.count_ones()).sum()
    }

    /// First cleared bit at or after `start`, scanning forward only.
    pub fn first_clear_from(&self, start: u32) -> Option<u32> {
        if start >= self.len {
            return None;
        }
        let mut word_index = (start / 64) as usize;
        // mask off the bits below `start` in the first word by pretending they are set
        let mut word = self.words[word_index] | ((1u64 << (start % 64)) - 1);
        loop {
            if word != u64::MAX {
                let index = word_index as u32 * 64 + (!word).trailing_zeros();
                return (index < self.len).then_some(index);
            }
            word_index += 1;
            if word_index >= self.words.len() {
                return None;
            }
            word = self.words[word_index];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear() {
        let mut set = BitSet::with_len(130);
        set.set(0);
        set.set(64);
        set.set(129);
        assert!(set.contains(0));
        assert!(set.contains(64));
        assert!(set.contains(129));
        assert!(!set.contains(1));
        assert_eq!(set.count_ones(), 3);

        set.clear(64);
        assert!(!set.contains(64));
        assert_eq!(set.count_ones(), 2);
    }

    #[test]
    fn test_out_of_range_reads_as_clear() {
        let set = BitSet::with_len(10);
        assert!(!set.contains(10));
        assert!(!set.contains(1000));
    }

    #[test]
    fn test_first_clear_from() {
        let mut set = BitSet::with_len(128);
        for i in 0..70 {
            set.set(i);
        }
        assert_eq!(set.first_clear_from(0), Some(70));
        assert_eq!(set.first_clear_from(71), Some(71));
        set.clear(3);
        assert_eq!(set.first_clear_from(0), Some(3));
        assert_eq!(set.first_clear_from(4), Some(70));
    }

    #[test]
    fn test_first_clear_from_full() {
        let mut set = BitSet::with_len(64);
        for i in 0..64 {
            set.set(i);
        }
        assert_eq!(set.first_clear_from(0), None);
        assert_eq!(set.first_clear_from(64), None);
    }

    #[test]
    fn test_first_clear_respects_len() {
        let mut set = BitSet::with_len(3);
        set.set(0);
        set.set(1);
        set.set(2);
        // bits 3..63 of the word are clear but past len
        assert_eq!(set.first_clear_from(0), None);
    }

    #[test]
    fn test_shrink_then_grow_exposes_zeroes() {
        let mut set = BitSet::with_len(64);
        set.set(40);
        set.resize(32);
        set.resize(64);
        assert!(!set.contains(40));
    }
}
