use futures::{
    channel::oneshot::{channel, Receiver, Sender},
    future::Shared,
    FutureExt,
};

/// Make a one-shot completion latch. The setter is consumed by [LatchSetter::set], so the latch
/// can't be set twice. [Latch] can be cloned to wait from any number of tasks
pub fn latch() -> (LatchSetter, Latch) {
    let (sender, receiver) = channel();

    (LatchSetter(sender), Latch(receiver.shared()))
}

/// Producer side of a latch
pub struct LatchSetter(Sender<()>);

impl LatchSetter {
    /// Release all waiters
    pub fn set(self) {
        // Nobody is waiting if all latch handles are dropped
        let _ = self.0.send(());
    }
}

/// Waiting side of a latch
#[derive(Clone)]
pub struct Latch(Shared<Receiver<()>>);

impl Latch {
    /// Wait until the latch is set. Returns `false` if the setter was dropped without setting it
    pub async fn wait(&self) -> bool {
        self.0.clone().await.is_ok()
    }

    /// `true` if the latch has been set. Doesn't block
    pub fn is_set(&self) -> bool {
        matches!(self.0.clone().now_or_never(), Some(Ok(())))
    }
}
