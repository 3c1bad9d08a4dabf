use std::ops::Range;

const WORD_BITS:usize = u64::BITS as usize;

// packed bit vector with a fixed length, bit i lives in words[i/64] at i%64
// bits past `size` in the last word are kept at 0
#[derive(Clone,Debug,PartialEq,Eq,Default)]
pub struct BitSet {
    size:usize,
    words:Vec<u64>
}

impl BitSet {
    pub fn new() -> Self {
        Self {size:0,words:vec![]}
    }
    pub fn with_capacity(capacity:usize) -> Self {
        if capacity == 0 {return Self::new()}
        Self {
            size:0,
            words:Vec::with_capacity(capacity.div_ceil(WORD_BITS))
        }
    }
    // a vector of `size` bits all set to `bit`
    pub fn filled(size:usize,bit:bool) -> Self {
        let fill = if bit {u64::MAX} else {0};
        let mut set = Self {size,words:vec![fill;size.div_ceil(WORD_BITS)]};
        set.clear_tail();
        set
    }
    fn clear_tail(&mut self) {
        let used = self.size % WORD_BITS;
        if used == 0 {return}
        if let Some(last) = self.words.last_mut() {
            *last &= (1u64 << used) - 1;
        }
    }
    pub fn len(&self) -> usize {
        self.size
    }
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
    pub fn push_bit(&mut self, bit:bool) {
        if self.size % WORD_BITS == 0 {
            self.words.push(0);
        }
        self.size += 1;
        let index = self.size - 1;
        if bit {
            self.words[index / WORD_BITS] |= 1u64 << (index % WORD_BITS);
        }
    }
    pub fn get_at(&self,index:usize) -> Option<bool> {
        if index >= self.size {return None}
        let word = self.words.get(index / WORD_BITS)?;
        Some(word >> (index % WORD_BITS) & 1 == 1)
    }
    pub fn store_at(&mut self,index:usize,bit:bool) -> Option<()> {
        if index >= self.size {return None}
        let word = self.words.get_mut(index / WORD_BITS)?;
        let mask = 1u64 << (index % WORD_BITS);
        if bit {
            *word |= mask;
        }else{
            *word &= !mask;
        }
        Some(())
    }
    // stores `bit` on the whole range, or nothing if the range leaves the set
    pub fn store_range(&mut self,range:Range<usize>,bit:bool) -> Option<()> {
        if range.end > self.size || range.start > range.end {return None}
        for index in range {
            self.store_at(index, bit)?;
        }
        Some(())
    }
    // false for an out of bounds range, true for an empty in-bounds range
    pub fn all_in(&self,range:Range<usize>,bit:bool) -> bool {
        if range.end > self.size || range.start > range.end {return false}
        range.into_iter().all(|index| self.get_at(index) == Some(bit))
    }
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
    pub fn count_zeros(&self) -> usize {
        self.size - self.count_ones()
    }
    // in-place logical AND, None when lengths differ
    pub fn and_assign(&mut self,rhs:&BitSet) -> Option<()> {
        if self.size != rhs.size {return None}
        for (left,right) in self.words.iter_mut().zip(rhs.words.iter()) {
            *left &= *right;
        }
        Some(())
    }
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.size).map(move |index| self.words[index / WORD_BITS] >> (index % WORD_BITS) & 1 == 1)
    }
    // maximal runs of consecutive `bit`, as (start,len), in ascending order
    pub fn runs(&self,bit:bool) -> Vec<(usize,usize)> {
        let mut runs = vec![];
        let mut start = None;
        for (index,current) in self.iter().enumerate() {
            match (current == bit,start) {
                (true,None) => start = Some(index),
                (false,Some(s)) => {
                    runs.push((s,index - s));
                    start = None;
                },
                _ => {}
            }
        }
        if let Some(s) = start {
            runs.push((s,self.size - s));
        }
        runs
    }
    // number of adjacent positions holding different bits
    pub fn transitions(&self) -> usize {
        if self.size < 2 {return 0}
        self.iter().zip(self.iter().skip(1)).filter(|(a,b)| a != b).count()
    }
    pub fn last_index_of(&self,bit:bool) -> Option<usize> {
        (0..self.size).rev().find(|index| self.get_at(*index) == Some(bit))
    }
}

impl FromIterator<bool> for BitSet {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut set = Self::with_capacity(iter.size_hint().0);
        for bit in iter {
            set.push_bit(bit);
        }
        set
    }
}

impl<T:AsRef<[bool]>> From<T> for BitSet {
    fn from(value: T) -> Self {
        value.as_ref().iter().copied().collect()
    }
}
