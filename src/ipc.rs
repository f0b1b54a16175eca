//! # Message Queue
//!
//! Bounded FIFO used by the producer/consumer demo. Single-owner, no interior
//! locking: the demo (and the simulation as a whole) is single-threaded, so
//! explicit ownership is the synchronization.

use std::collections::VecDeque;
use std::error::Error;
use std::fmt;

/// Returned by [`MessageQueue::send`] when the queue is at capacity; carries
/// the rejected message back to the caller.
pub struct QueueFull<T>(pub T);

// Like std's mpsc::SendError, the message itself is not printed.
impl<T> fmt::Debug for QueueFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueueFull(..)")
    }
}

impl<T> fmt::Display for QueueFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("message queue is full")
    }
}

impl<T> Error for QueueFull<T> {}

/// Bounded FIFO message queue.
#[derive(Debug)]
pub struct MessageQueue<T> {
    buf: VecDeque<T>,
    capacity: usize,
}

impl<T> MessageQueue<T> {
    /// Queue holding at most `capacity` messages.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a message, or hand it back when the queue is full.
    pub fn send(&mut self, msg: T) -> Result<(), QueueFull<T>> {
        if self.buf.len() >= self.capacity {
            return Err(QueueFull(msg));
        }
        self.buf.push_back(msg);
        Ok(())
    }

    /// Take the oldest message, if any.
    pub fn recv(&mut self) -> Option<T> {
        self.buf.pop_front()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.buf.len() >= self.capacity
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut q = MessageQueue::with_capacity(4);
        q.send(1).unwrap();
        q.send(2).unwrap();
        q.send(3).unwrap();

        assert_eq!(q.recv(), Some(1));
        assert_eq!(q.recv(), Some(2));
        assert_eq!(q.recv(), Some(3));
        assert_eq!(q.recv(), None);
    }

    #[test]
    fn test_send_rejects_when_full() {
        let mut q = MessageQueue::with_capacity(2);
        q.send("a").unwrap();
        q.send("b").unwrap();
        assert!(q.is_full());

        let rejected = q.send("c").unwrap_err();
        assert_eq!(rejected.0, "c");
        assert_eq!(q.len(), 2);

        q.recv();
        assert!(q.send("c").is_ok());
    }
}
