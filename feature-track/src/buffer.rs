use crate::{ConfigError, FrameRecord};
use std::collections::VecDeque;

/// A fixed capacity, oldest-first sequence of frames.
///
/// Pushing into a full buffer evicts the oldest frame first, so the buffer never
/// holds more than `capacity` frames no matter how long the input stream is.
#[derive(Debug, Clone)]
pub struct FrameBuffer<F = FrameRecord> {
    frames: VecDeque<F>,
    capacity: usize,
}

impl<F> FrameBuffer<F> {
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Appends `frame` as the latest frame.
    ///
    /// If the buffer is full, the oldest frame is removed before appending and returned.
    pub fn push(&mut self, frame: F) -> Option<F> {
        let evicted = if self.frames.len() >= self.capacity {
            self.frames.pop_front()
        } else {
            None
        };
        self.frames.push_back(frame);
        evicted
    }

    /// Pushes `frame` like [`FrameBuffer::push`] and borrows it back as the latest frame.
    pub fn push_latest(&mut self, frame: F) -> (Option<F>, &mut F) {
        let evicted = self.push(frame);
        let latest = self.frames.len() - 1;
        (evicted, &mut self.frames[latest])
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn oldest(&self) -> Option<&F> {
        self.frames.front()
    }

    pub fn latest(&self) -> Option<&F> {
        self.frames.back()
    }

    pub fn latest_mut(&mut self) -> Option<&mut F> {
        self.frames.back_mut()
    }

    /// The frame pushed right before the latest one.
    pub fn second_latest(&self) -> Option<&F> {
        self.frames
            .len()
            .checked_sub(2)
            .and_then(|ix| self.frames.get(ix))
    }

    /// Borrows the second latest frame and the latest frame together.
    ///
    /// This is `None` until two frames are resident.
    pub fn latest_pair_mut(&mut self) -> Option<(&F, &mut F)> {
        let frames = self.frames.make_contiguous();
        match frames {
            [.., previous, current] => Some((&*previous, current)),
            _ => None,
        }
    }

    /// Iterates from the oldest to the latest frame.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &F> + ExactSizeIterator + '_ {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(
            FrameBuffer::<u32>::new(0).unwrap_err(),
            ConfigError::ZeroCapacity
        );
    }

    #[test]
    fn evicts_oldest_first() {
        let mut buffer = FrameBuffer::new(2).unwrap();
        assert_eq!(buffer.push(0), None);
        assert_eq!(buffer.second_latest(), None);
        assert_eq!(buffer.push(1), None);
        assert_eq!(buffer.second_latest(), Some(&0));
        assert_eq!(buffer.push(2), Some(0));
        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(buffer.latest(), Some(&2));
        assert_eq!(buffer.second_latest(), Some(&1));
    }

    #[test]
    fn pair_requires_two_frames() {
        let mut buffer = FrameBuffer::new(3).unwrap();
        buffer.push(String::from("a"));
        assert!(buffer.latest_pair_mut().is_none());
        buffer.push(String::from("b"));
        buffer.push(String::from("c"));
        buffer.push(String::from("d"));
        let (previous, current) = buffer.latest_pair_mut().unwrap();
        assert_eq!(previous, "c");
        current.push('!');
        assert_eq!(buffer.latest().map(String::as_str), Some("d!"));
        assert_eq!(buffer.oldest().map(String::as_str), Some("b"));
    }

    #[quickcheck]
    fn holds_the_most_recent_frames(capacity: u8, frames: Vec<u32>) -> bool {
        let capacity = capacity as usize % 8 + 1;
        let mut buffer = FrameBuffer::new(capacity).unwrap();
        frames.iter().enumerate().all(|(k, &frame)| {
            buffer.push(frame);
            let expected_len = (k + 1).min(capacity);
            let expected = &frames[k + 1 - expected_len..=k];
            buffer.len() == expected_len
                && buffer.len() <= capacity
                && buffer.iter().copied().eq(expected.iter().copied())
        })
    }
}
