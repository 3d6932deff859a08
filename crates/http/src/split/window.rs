/// Fixed-length lookback over the most recent input bytes, used only to detect a delimiter.
///
/// The window never holds segment content for long: a byte leaves it either as part of a
/// delimiter match (and is dropped) or because a newer byte displaced it (and is then known not to
/// start a match).
#[derive(Debug)]
pub(crate) struct RingWindow {
    bytes: Box<[u8]>,
    start: usize,
    len: usize,
}

impl RingWindow {
    pub(crate) fn new(capacity: usize) -> Self {
        Self { bytes: vec![0; capacity].into_boxed_slice(), start: 0, len: 0 }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Appends `byte`, returning the oldest byte if the window was full.
    pub(crate) fn push(&mut self, byte: u8) -> Option<u8> {
        let capacity = self.capacity();
        if self.len == capacity {
            let oldest = self.bytes[self.start];
            self.bytes[self.start] = byte;
            self.start = (self.start + 1) % capacity;
            Some(oldest)
        } else {
            self.bytes[(self.start + self.len) % capacity] = byte;
            self.len += 1;
            None
        }
    }

    /// Returns true if the window is full and equals `pattern`, oldest byte first.
    pub(crate) fn matches(&self, pattern: &[u8]) -> bool {
        let capacity = self.capacity();
        self.len == capacity
            && pattern.len() == capacity
            && pattern.iter().enumerate().all(|(i, byte)| self.bytes[(self.start + i) % capacity] == *byte)
    }

    /// Iterates the window content, oldest byte first.
    pub(crate) fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        let capacity = self.capacity();
        (0..self.len).map(move |i| self.bytes[(self.start + i) % capacity])
    }

    pub(crate) fn clear(&mut self) {
        self.start = 0;
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displaces_oldest_when_full() {
        let mut window = RingWindow::new(3);

        assert_eq!(window.push(b'a'), None);
        assert_eq!(window.push(b'b'), None);
        assert_eq!(window.push(b'c'), None);
        assert_eq!(window.push(b'd'), Some(b'a'));
        assert_eq!(window.push(b'e'), Some(b'b'));

        assert_eq!(window.iter().collect::<Vec<_>>(), b"cde".to_vec());
        assert!(window.matches(b"cde"));
        assert!(!window.matches(b"dec"));
    }

    #[test]
    fn partial_window_never_matches() {
        let mut window = RingWindow::new(2);
        window.push(b'-');

        assert_eq!(window.iter().count(), 1);
        assert!(!window.matches(b"--"));

        window.push(b'-');
        assert!(window.matches(b"--"));

        window.clear();
        assert_eq!(window.iter().count(), 0);
        assert!(!window.matches(b"--"));
    }
}
