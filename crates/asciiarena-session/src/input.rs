//! Where player actions come from.

use std::future::Future;

use tokio::sync::mpsc;

/// A source of player actions for the action emitter.
///
/// The emitter awaits `next_action` in a loop and sends whatever it
/// returns. An implementation that has nothing more to send should stay
/// pending rather than return. The emitter stops on its own when the
/// match finishes.
///
/// ```rust,ignore
/// struct AlwaysFire;
///
/// impl ActionSource for AlwaysFire {
///     async fn next_action(&mut self) -> u32 {
///         tokio::time::sleep(Duration::from_millis(50)).await;
///         FIRE
///     }
/// }
/// ```
pub trait ActionSource: Send {
    fn next_action(&mut self) -> impl Future<Output = u32> + Send;
}

/// Actions pushed by another task, for example a keyboard reader.
///
/// Once every sender is dropped, the source goes quiet for good.
impl ActionSource for mpsc::Receiver<u32> {
    async fn next_action(&mut self) -> u32 {
        match self.recv().await {
            Some(action) => action,
            None => std::future::pending().await,
        }
    }
}

impl ActionSource for mpsc::UnboundedReceiver<u32> {
    async fn next_action(&mut self) -> u32 {
        match self.recv().await {
            Some(action) => action,
            None => std::future::pending().await,
        }
    }
}
