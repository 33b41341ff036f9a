//! Single-producer, single-consumer channel where only the newest value
//! matters. The producer never blocks: publishing into a full slot throws
//! the stale value away. A slow consumer therefore skips intermediate
//! values but always sees the most recent one.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Creates a connected publisher/subscriber pair.
pub fn channel<T>() -> (Publisher<T>, Subscriber<T>) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let connected = Arc::new(AtomicBool::new(true));
    (
        Publisher {
            tx,
            stale: rx.clone(),
            connected: connected.clone(),
        },
        Subscriber { rx, connected },
    )
}

/// Producing half.
#[derive(Debug)]
pub struct Publisher<T> {
    tx: Sender<T>,
    // Lets the producer evict a value the consumer has not taken yet.
    stale: Receiver<T>,
    // Cleared when the subscriber is dropped; `stale` keeps the channel
    // itself from ever disconnecting.
    connected: Arc<AtomicBool>,
}

impl<T> Publisher<T> {
    /// Replaces any pending value with `value`.
    ///
    /// Returns `false` once the subscriber has been dropped.
    pub fn publish(&self, value: T) -> bool {
        if !self.is_connected() {
            return false;
        }
        let mut value = value;
        loop {
            match self.tx.try_send(value) {
                Ok(()) => return true,
                Err(TrySendError::Full(rejected)) => {
                    let _ = self.stale.try_recv();
                    value = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }

    /// True while the subscriber is alive.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

/// Consuming half.
#[derive(Debug)]
pub struct Subscriber<T> {
    rx: Receiver<T>,
    connected: Arc<AtomicBool>,
}

impl<T> Drop for Subscriber<T> {
    fn drop(&mut self) {
        self.connected.store(false, Ordering::Release);
    }
}

impl<T> Subscriber<T> {
    /// The newest unread value, without blocking.
    pub fn latest(&self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(value) => Some(value),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Waits up to `timeout` for a value.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_value_wins() {
        let (publisher, subscriber) = channel();
        for i in 0..10 {
            assert!(publisher.publish(i));
        }
        assert_eq!(subscriber.latest(), Some(9));
        assert_eq!(subscriber.latest(), None);
    }

    #[test]
    fn publish_after_subscriber_dropped() {
        let (publisher, subscriber) = channel();
        assert!(publisher.is_connected());
        drop(subscriber);
        assert!(!publisher.is_connected());
        assert!(!publisher.publish(1));
        assert!(!publisher.publish(2), "stays disconnected");
    }

    #[test]
    fn producer_thread_notices_dropped_subscriber() {
        let (publisher, subscriber) = channel();
        let producer = std::thread::spawn(move || {
            let mut sent = 0;
            while publisher.publish(sent) {
                sent += 1;
                std::thread::sleep(Duration::from_millis(1));
            }
            sent
        });
        std::thread::sleep(Duration::from_millis(20));
        drop(subscriber);
        assert!(producer.join().unwrap() > 0);
    }

    #[test]
    fn consumer_on_another_thread_sees_final_value() {
        let (publisher, subscriber) = channel();
        let producer = std::thread::spawn(move || {
            for i in 0..1000 {
                publisher.publish(i);
            }
        });
        producer.join().unwrap();
        assert_eq!(subscriber.recv_timeout(Duration::from_secs(1)), Ok(999));
    }
}
