//! Single-value, single-use channel between one sender and one receiver,
//! with disconnect detection on both sides.
//!
//! Unlike the C-ABI shape this protocol is drawn from (explicit
//! `sender_free`/`receiver_free` calls), the Rust surface ties those
//! calls to `Drop`: dropping a [`Sender`] or [`Receiver`] without using it
//! runs the same state transition automatically.

use super::condvar::CondVar;
use super::mutex::Mutex;
use alloc::sync::Arc;
use core::fmt;

enum State<T> {
    Empty,
    Value(T),
    SenderDropped,
    ReceiverDropped,
    Consumed,
}

struct Inner<T> {
    state: Mutex<State<T>>,
    cv: CondVar,
}

/// Creates a connected sender/receiver pair for a single value of `T`.
pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
    let inner = Arc::new(Inner {
        state: Mutex::new(State::Empty),
        cv: CondVar::new(),
    });
    (
        Sender {
            inner: inner.clone(),
        },
        Receiver { inner },
    )
}

/// The sending half of a [`channel`].
pub struct Sender<T> {
    inner: Arc<Inner<T>>,
}

/// The receiving half of a [`channel`].
pub struct Receiver<T> {
    inner: Arc<Inner<T>>,
}

/// Returned by [`Sender::send`] when the receiver was already dropped.
/// Carries the value back so the caller does not lose it.
pub struct SendError<T>(pub T);

impl<T> fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SendError(..)")
    }
}

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("sending on a channel whose receiver was dropped")
    }
}

/// Returned by [`Receiver::recv`] when the sender was dropped without
/// ever sending a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecvError;

impl fmt::Display for RecvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("receiving on a channel whose sender was dropped without sending")
    }
}

impl<T> Sender<T> {
    /// Sends `v`, consuming the sender. Fails if the receiver was already
    /// dropped, handing `v` back in the error.
    pub fn send(self, v: T) -> Result<(), SendError<T>> {
        let mut g = self.inner.state.lock();
        if matches!(*g, State::ReceiverDropped) {
            return Err(SendError(v));
        }
        *g = State::Value(v);
        drop(g);
        self.inner.cv.wake_one();
        // The sender half is consumed; skip the SenderDropped transition
        // that `Drop` would otherwise run.
        core::mem::forget(self);
        Ok(())
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        let mut g = self.inner.state.lock();
        if matches!(*g, State::Empty) {
            *g = State::SenderDropped;
            drop(g);
            // Wakes a receiver blocked in `recv`, which re-checks and
            // observes the sender is gone. A sender itself never blocks,
            // so there is nothing else parked here to wake.
            self.inner.cv.wake_one();
        }
    }
}

impl<T> Receiver<T> {
    /// Blocks until a value arrives or the sender is dropped.
    pub fn recv(self) -> Result<T, RecvError> {
        let mut g = self.inner.state.lock();
        loop {
            match &*g {
                State::Value(_) => {
                    let State::Value(v) = core::mem::replace(&mut *g, State::Consumed) else {
                        unreachable!()
                    };
                    core::mem::forget(self);
                    return Ok(v);
                }
                State::SenderDropped => {
                    core::mem::forget(self);
                    return Err(RecvError);
                }
                State::Empty => {
                    g = self.inner.cv.wait(g);
                }
                State::ReceiverDropped | State::Consumed => unreachable!(
                    "receiver observes its own terminal states only after consuming them"
                ),
            }
        }
    }

    /// Takes the value if one is already available, without blocking.
    pub fn try_recv(&self) -> Option<Result<T, RecvError>> {
        let mut g = self.inner.state.lock();
        match &*g {
            State::Value(_) => {
                let State::Value(v) = core::mem::replace(&mut *g, State::Consumed) else {
                    unreachable!()
                };
                Some(Ok(v))
            }
            State::SenderDropped => Some(Err(RecvError)),
            State::Empty => None,
            State::ReceiverDropped | State::Consumed => unreachable!(),
        }
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        let mut g = self.inner.state.lock();
        if !matches!(*g, State::Consumed) {
            *g = State::ReceiverDropped;
        }
        // No wake needed: a sender never blocks in `send`.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn send_then_recv_round_trip() {
        let (tx, rx) = channel::<u32>();
        tx.send(42).unwrap();
        assert_eq!(rx.recv().unwrap(), 42);
    }

    #[test]
    fn recv_blocks_until_send() {
        let (tx, rx) = channel::<u32>();
        let t = thread::spawn(move || rx.recv().unwrap());
        thread::sleep(Duration::from_millis(20));
        tx.send(7).unwrap();
        assert_eq!(t.join().unwrap(), 7);
    }

    #[test]
    fn send_after_receiver_dropped_fails_and_returns_value() {
        let (tx, rx) = channel::<u32>();
        drop(rx);
        match tx.send(9) {
            Err(SendError(v)) => assert_eq!(v, 9),
            Ok(()) => panic!("expected send to fail"),
        }
    }

    #[test]
    fn recv_after_sender_dropped_without_sending_fails() {
        let (tx, rx) = channel::<u32>();
        drop(tx);
        assert_eq!(rx.recv(), Err(RecvError));
    }

    #[test]
    fn blocked_receiver_wakes_to_disconnect_error_when_sender_drops() {
        let (tx, rx) = channel::<u32>();
        let t = thread::spawn(move || rx.recv());
        thread::sleep(Duration::from_millis(20));
        drop(tx);
        assert_eq!(t.join().unwrap(), Err(RecvError));
    }

    #[test]
    fn try_recv_does_not_block() {
        let (tx, rx) = channel::<u32>();
        assert!(rx.try_recv().is_none());
        tx.send(3).unwrap();
        assert_eq!(rx.try_recv().unwrap().unwrap(), 3);
    }
}
