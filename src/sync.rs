//! Channels to broadcast messages to all their receivers

use std::fmt;
use std::time::Duration;

use crossbeam_channel::{Receiver as RawReceiver, Sender as RawSender};
use parking_lot::Mutex;
use tracing::{debug, error, trace};

use crate::error::ContractViolation;

pub use crossbeam_channel::{RecvTimeoutError, TryRecvError};

/// Capacity used when the hint passed to [`Broadcaster::new`] is zero.
///
/// [`Broadcaster::new`]: struct.Broadcaster.html#method.new
pub const DEFAULT_CAPACITY: usize = 32;

/// A registry of outputs that all receive every value sent to it.
///
/// Outputs are added with [`add_chan`], values are delivered to every output
/// with [`send`], and [`close`] ends every output for good.
/// See the crate level documentation for examples.
///
/// [`add_chan`]: #method.add_chan
/// [`send`]: #method.send
/// [`close`]: #method.close
pub struct Broadcaster<T> {
    state: Mutex<State<T>>,
    capacity: usize,
    buffer: usize,
}

// `outputs` and `active` only change together, under the same lock.
// Once `active` is false `outputs` is empty and stays that way.
struct State<T> {
    outputs: Vec<RawSender<T>>,
    active: bool,
}

impl<T> Broadcaster<T> {
    /// Creates an active broadcaster whose outputs are rendezvous channels.
    ///
    /// A `capacity_hint` of zero is replaced by [`DEFAULT_CAPACITY`].
    ///
    /// [`DEFAULT_CAPACITY`]: constant.DEFAULT_CAPACITY.html
    pub fn new(capacity_hint: usize) -> Self {
        Self::with_output_buffer(capacity_hint, 0)
    }

    /// Creates an active broadcaster whose outputs can each hold `buffer`
    /// values before a send has to wait for the reader.
    pub fn with_output_buffer(capacity_hint: usize, buffer: usize) -> Self {
        let capacity = if capacity_hint == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity_hint
        };
        Self {
            state: Mutex::new(State {
                outputs: Vec::with_capacity(capacity),
                active: true,
            }),
            capacity,
            buffer,
        }
    }

    /// The capacity the output registry was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Per-output buffer size, 0 for rendezvous outputs.
    pub fn output_buffer(&self) -> usize {
        self.buffer
    }

    /// Registers a new output and returns its receiving end.
    ///
    /// # Panics
    /// If the broadcaster has been closed.
    pub fn add_chan(&self) -> Receiver<T> {
        self.try_add_chan().unwrap_or_else(|v| violated(v))
    }

    /// Like [`add_chan`](#method.add_chan) but hands the violation back.
    pub fn try_add_chan(&self) -> Result<Receiver<T>, ContractViolation> {
        let (tx, rx) = crossbeam_channel::bounded(self.buffer);
        let mut state = self.state.lock();
        if !state.active {
            return Err(ContractViolation::AddAfterClose);
        }
        state.outputs.push(tx);
        debug!(outputs = state.outputs.len(), "output added");
        Ok(Receiver { rx })
    }

    /// Closes every output and retires the broadcaster.
    ///
    /// Every receiver sees the end of its stream once it has drained what
    /// was already buffered for it. Closing a broadcaster with no outputs is
    /// fine.
    ///
    /// # Panics
    /// If the broadcaster was already closed.
    pub fn close(&self) {
        self.try_close().unwrap_or_else(|v| violated(v))
    }

    /// Like [`close`](#method.close) but hands the violation back.
    pub fn try_close(&self) -> Result<(), ContractViolation> {
        let mut state = self.state.lock();
        if !state.active {
            return Err(ContractViolation::DoubleClose);
        }
        let closed = state.outputs.len();
        // Dropping the only sender of each output is what closes it.
        state.outputs = Vec::new();
        state.active = false;
        debug!(outputs = closed, "broadcaster closed");
        Ok(())
    }

    /// Number of registered outputs.
    ///
    /// # Panics
    /// If the broadcaster has been closed.
    pub fn len(&self) -> usize {
        self.try_len().unwrap_or_else(|v| violated(v))
    }

    /// Like [`len`](#method.len) but hands the violation back.
    pub fn try_len(&self) -> Result<usize, ContractViolation> {
        let state = self.state.lock();
        if !state.active {
            return Err(ContractViolation::LenAfterClose);
        }
        Ok(state.outputs.len())
    }

    /// Whether no outputs are registered.
    ///
    /// # Panics
    /// If the broadcaster has been closed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the broadcaster still accepts outputs and values.
    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }
}

impl<T: Clone> Broadcaster<T> {
    /// Delivers `value` to every registered output, in registration order.
    ///
    /// The whole broadcast happens under the registry lock, so no output can
    /// be added and the broadcaster cannot be closed halfway through. Each
    /// handoff waits until the output has room (or, for rendezvous outputs,
    /// until its reader takes the value), so a slow or absent reader stalls
    /// the broadcast and every other call on this broadcaster until it
    /// catches up. Outputs whose receiver was dropped are skipped.
    ///
    /// # Panics
    /// If the broadcaster has been closed or has no outputs.
    pub fn send(&self, value: T) {
        self.try_send(value).unwrap_or_else(|v| violated(v))
    }

    /// Like [`send`](#method.send) but hands the violation back.
    pub fn try_send(&self, value: T) -> Result<(), ContractViolation> {
        let state = self.state.lock();
        if !state.active {
            return Err(ContractViolation::SendAfterClose);
        }
        let (last, rest) = state
            .outputs
            .split_last()
            .ok_or(ContractViolation::SendWithoutOutputs)?;

        for (index, tx) in rest.iter().enumerate() {
            if tx.send(value.clone()).is_err() {
                trace!(output = index, "receiver dropped, value discarded");
            }
        }
        if last.send(value).is_err() {
            trace!(output = rest.len(), "receiver dropped, value discarded");
        }
        Ok(())
    }

    /// Broadcasts every item of `into_iter`, one [`send`](#method.send) each.
    pub fn send_all<I: IntoIterator<Item = T>>(&self, into_iter: I) {
        for item in into_iter {
            self.send(item);
        }
    }
}

impl<T> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<T> fmt::Debug for Broadcaster<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Broadcaster")
            .field("active", &state.active)
            .field("outputs", &state.outputs.len())
            .field("capacity", &self.capacity)
            .field("buffer", &self.buffer)
            .finish()
    }
}

// Raised outside the lock so a violation never leaves it held.
#[cold]
#[track_caller]
fn violated(violation: ContractViolation) -> ! {
    error!(operation = violation.operation(), "{}", violation);
    panic!("{}", violation)
}

/// The receiving end of one broadcaster output.
///
/// Only the broadcaster can send into or close the output. Iterating yields
/// values until the broadcaster is closed.
pub struct Receiver<T> {
    rx: RawReceiver<T>,
}

impl<T> Receiver<T> {
    /// Blocks until a value arrives, or returns `None` once the output is
    /// closed and drained.
    pub fn recv(&self) -> Option<T> {
        self.rx.recv().ok()
    }

    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.rx.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Values currently buffered for this output.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl<T> Iterator for Receiver<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.recv()
    }
}

impl<T> fmt::Debug for Receiver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver").field("buffered", &self.rx.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn zero_hint_uses_default_capacity() {
        let b = Broadcaster::<u32>::new(0);
        assert_eq!(b.capacity(), DEFAULT_CAPACITY);
        assert_eq!(b.len(), 0);
        assert!(b.is_empty());
        assert!(b.is_active());

        assert_eq!(Broadcaster::<u32>::new(4).capacity(), 4);
    }

    #[test]
    fn sending() {
        let b = Broadcaster::with_output_buffer(0, 4);
        let mut rx = b.add_chan();
        b.send(1);
        b.send(2);

        assert_eq!(Some(1), rx.next());
        assert_eq!(Some(2), rx.next());
        assert_eq!(Err(TryRecvError::Empty), rx.try_recv());
    }

    #[test]
    fn send_all() {
        let b = Broadcaster::with_output_buffer(0, 1000);
        let mut rx = b.add_chan();
        b.send_all(0..1000);
        for i in 0..1000 {
            assert_eq!(rx.next(), Some(i));
        }
    }

    #[test]
    fn multiple_receivers() {
        let b = Broadcaster::with_output_buffer(0, 8);
        let rx = b.add_chan();
        let rx2 = b.add_chan();
        b.send(1);
        b.send(2);
        let rx3 = b.add_chan();
        b.send(3);
        b.close();

        assert_eq!(rx.collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(rx2.collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(rx3.collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn rendezvous_send_waits_for_readers() {
        let b = Broadcaster::new(0);
        let readers: Vec<_> = (0..3)
            .map(|_| {
                let rx = b.add_chan();
                thread::spawn(move || rx.collect::<Vec<&str>>())
            })
            .collect();

        b.send("x");
        b.close();

        for reader in readers {
            assert_eq!(reader.join().unwrap(), vec!["x"]);
        }
    }

    #[test]
    fn close_ends_every_receiver() {
        let b = Broadcaster::<u8>::new(0);
        let rx1 = b.add_chan();
        let rx2 = b.add_chan();
        b.close();

        assert!(!b.is_active());
        assert_eq!(rx1.recv(), None);
        assert_eq!(rx2.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn close_without_outputs() {
        let b = Broadcaster::<u8>::new(0);
        assert_eq!(b.try_close(), Ok(()));
        assert!(!b.is_active());
    }

    #[test]
    fn violations_are_reported() {
        let b = Broadcaster::<u8>::new(0);
        assert_eq!(b.try_send(1), Err(ContractViolation::SendWithoutOutputs));

        b.close();
        assert_eq!(b.try_close(), Err(ContractViolation::DoubleClose));
        assert_eq!(b.try_send(1), Err(ContractViolation::SendAfterClose));
        assert_eq!(b.try_len(), Err(ContractViolation::LenAfterClose));
        assert_eq!(
            b.try_add_chan().map(|_| ()),
            Err(ContractViolation::AddAfterClose)
        );
        assert!(!b.is_active());
    }

    #[test]
    #[should_panic(expected = "already been closed")]
    fn double_close_panics() {
        let b = Broadcaster::<u8>::new(0);
        b.close();
        b.close();
    }

    #[test]
    #[should_panic(expected = "no outputs")]
    fn send_without_outputs_panics() {
        Broadcaster::new(0).send(5u8);
    }

    #[test]
    fn dropped_receiver_is_skipped() {
        let b = Broadcaster::new(0);
        drop(b.add_chan());
        let rx = b.add_chan();
        let reader = thread::spawn(move || rx.recv());

        b.send(7);
        assert_eq!(reader.join().unwrap(), Some(7));
        assert_eq!(b.len(), 2);
    }
}
