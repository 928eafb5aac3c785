//! Action emitter: sends player actions on the control channel during a
//! match.

use asciiarena_match::Match;
use asciiarena_protocol::{Codec, Message, PlayerAction};
use asciiarena_transport::Connection;

use crate::{ActionSource, SessionError};

/// Sends one `PlayerAction` per action the source yields, stamped with
/// the latest frame id the match has applied.
///
/// Runs on the session task, alongside the frame listener's task.
pub struct ActionEmitter<'a, C, K> {
    conn: &'a C,
    codec: &'a K,
    game: &'a Match,
}

impl<'a, C, K> ActionEmitter<'a, C, K>
where
    C: Connection,
    K: Codec,
{
    pub fn new(conn: &'a C, codec: &'a K, game: &'a Match) -> Self {
        Self { conn, codec, game }
    }

    /// Emits actions until the match finishes. Returns how many were sent.
    ///
    /// An action that the source produces after the match has finished is
    /// never sent.
    pub async fn run<S: ActionSource>(&self, input: &mut S) -> Result<u64, SessionError> {
        let mut sent = 0u64;
        loop {
            let action = tokio::select! {
                biased;
                () = self.game.finished() => break,
                action = input.next_action() => action,
            };
            if self.game.is_finished() {
                break;
            }

            let frame_id = self.game.frame_id();
            let message = Message::PlayerAction(PlayerAction { frame_id, action });
            let bytes = self.codec.encode(&message)?;
            self.conn.send(&bytes).await?;
            sent += 1;

            tracing::trace!(frame_id, action, "action sent");
        }

        tracing::debug!(sent, "action emitter stopped");
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use asciiarena_protocol::{FrameUpdate, JsonCodec, MapSnapshot};
    use asciiarena_transport::{Delivery, TransportError};
    use tokio::sync::mpsc;

    use super::*;

    /// Records every sent message.
    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<Vec<u8>>>,
    }

    impl Recorder {
        fn actions(&self) -> Vec<PlayerAction> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|bytes| match JsonCodec.decode(bytes).unwrap() {
                    Message::PlayerAction(action) => action,
                    other => panic!("unexpected message {other:?}"),
                })
                .collect()
        }
    }

    impl Connection for Recorder {
        async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push(data.to_vec());
            Ok(())
        }

        async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
            std::future::pending().await
        }

        async fn close(&self) -> Result<(), TransportError> {
            Ok(())
        }

        fn delivery(&self) -> Delivery {
            Delivery::ReliableOrdered
        }
    }

    fn game() -> Match {
        Match::new(MapSnapshot {
            width: 1,
            height: 1,
            cells: vec![0],
            seed: 0,
        })
    }

    #[tokio::test]
    async fn test_actions_carry_latest_frame_id() {
        let conn = Recorder::default();
        let game = game();
        let (tx, mut rx) = mpsc::unbounded_channel::<u32>();

        game.apply_frame(FrameUpdate { frame_id: 4 });
        tx.send(1).unwrap();
        tx.send(2).unwrap();

        let emitter = ActionEmitter::new(&conn, &JsonCodec, &game);

        // Let the two queued actions go out, then finish the match.
        let stopper = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            game.apply_frame(FrameUpdate { frame_id: 9 });
            tx.send(3).unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            game.finish();
        };
        let (sent, ()) = tokio::join!(emitter.run(&mut rx), stopper);

        assert_eq!(sent.unwrap(), 3);
        let actions = conn.actions();
        assert_eq!(
            actions,
            vec![
                PlayerAction { frame_id: 4, action: 1 },
                PlayerAction { frame_id: 4, action: 2 },
                PlayerAction { frame_id: 9, action: 3 },
            ]
        );
    }

    #[tokio::test]
    async fn test_finished_match_sends_nothing() {
        let conn = Recorder::default();
        let game = game();
        let (tx, mut rx) = mpsc::unbounded_channel::<u32>();
        tx.send(1).unwrap();
        game.finish();

        let sent = ActionEmitter::new(&conn, &JsonCodec, &game)
            .run(&mut rx)
            .await
            .unwrap();

        assert_eq!(sent, 0);
        assert!(conn.actions().is_empty());
    }

    #[tokio::test]
    async fn test_quiet_source_stops_when_match_finishes() {
        let conn = Recorder::default();
        let game = game();
        let (_tx, mut rx) = mpsc::unbounded_channel::<u32>();

        let finisher = {
            let game = game.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                game.finish();
            })
        };

        let sent = tokio::time::timeout(
            Duration::from_secs(1),
            ActionEmitter::new(&conn, &JsonCodec, &game).run(&mut rx),
        )
        .await
        .expect("emitter should stop once the match finishes")
        .unwrap();

        finisher.await.unwrap();
        assert_eq!(sent, 0);
    }
}
