use multi_chan::*;

use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Clone)]
struct SideEffectDrop(u32, &'static AtomicU32);
impl Drop for SideEffectDrop {
    fn drop(&mut self) {
        self.1.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn dropping() {
    static DROPS: AtomicU32 = AtomicU32::new(0);
    let tx = Broadcaster::with_output_buffer(0, 10);
    let rxs: Vec<_> = (0..3).map(|_| tx.add_chan()).collect();
    for _ in 0..10 {
        tx.send(SideEffectDrop(1, &DROPS));
    }
    tx.close();
    assert_eq!(DROPS.load(Ordering::SeqCst), 0);
    drop(rxs);
    // One copy per output per send
    assert_eq!(DROPS.load(Ordering::SeqCst), 30);
}

#[test]
fn dropping_after_recv() {
    static DROPS: AtomicU32 = AtomicU32::new(0);
    let tx = Broadcaster::with_output_buffer(0, 10);
    let mut rx = tx.add_chan();
    let rx2 = tx.add_chan();
    for _ in 0..10 {
        tx.send(SideEffectDrop(1, &DROPS));
    }

    rx.nth(2);
    assert_eq!(DROPS.load(Ordering::SeqCst), 3);

    drop(rx);
    drop(tx);
    drop(rx2);
    assert_eq!(DROPS.load(Ordering::SeqCst), 20);
}

#[test]
fn dropping_the_broadcaster_ends_its_outputs() {
    let tx = Broadcaster::<u8>::new(0);
    let rx = tx.add_chan();
    drop(tx);
    assert_eq!(rx.recv(), None);
}

#[test]
fn dropped_receivers_do_not_stall_a_send() {
    static DROPS: AtomicU32 = AtomicU32::new(0);
    let tx = Broadcaster::new(0);
    for _ in 0..4 {
        drop(tx.add_chan());
    }
    tx.send(SideEffectDrop(1, &DROPS));
    assert_eq!(tx.len(), 4);
    assert_eq!(DROPS.load(Ordering::SeqCst), 4);
}
