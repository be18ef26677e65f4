use core::future::Future;
use core::pin::Pin;

/// A boxed future that can be sent across threads.
pub type DynFut<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Block until the [future](Future) is completed and returns the result.
///
/// There is no timeout: a future that never resolves blocks the calling thread forever.
pub fn block_on<O>(fut: impl Future<Output = O>) -> O {
    futures_lite::future::block_on(fut)
}
