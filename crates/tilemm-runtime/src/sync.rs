use async_channel::{Receiver, Sender};
use core::future::Future;

/// Create a connected [signal](CompletionSignal) and [token](CompletionToken) pair.
///
/// The signal is handed to whoever observes the completion (usually a device callback), the
/// token stays with the control thread that waits on it.
pub fn completion_channel() -> (CompletionSignal, CompletionToken) {
    let (sender, receiver) = async_channel::bounded(1);
    (
        CompletionSignal { sender },
        CompletionToken { receiver },
    )
}

/// Producer half of a one-shot completion. Consumed when fired.
#[derive(Debug)]
pub struct CompletionSignal {
    sender: Sender<()>,
}

impl CompletionSignal {
    /// Fire the signal.
    pub fn complete(self) {
        // This might fail if the token was dropped, which only means nobody waits on it.
        let _ = self.sender.try_send(());
    }
}

/// Consumer half of a one-shot completion. Consumed when waited on.
#[derive(Debug)]
pub struct CompletionToken {
    receiver: Receiver<()>,
}

/// Returned when a token can never fire because its signal was dropped without completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("The completion signal was dropped before it fired")]
pub struct SignalDropped;

impl CompletionToken {
    /// Whether the signal already fired.
    pub fn is_complete(&self) -> bool {
        !self.receiver.is_empty()
    }

    /// Future resolving when the signal fires.
    pub fn completion(self) -> impl Future<Output = Result<(), SignalDropped>> + Send {
        async move { self.receiver.recv().await.map_err(|_| SignalDropped) }
    }

    /// Block the current thread until the signal fires. There is no timeout.
    pub fn wait(self) -> Result<(), SignalDropped> {
        tilemm_common::future::block_on(self.completion())
    }
}
