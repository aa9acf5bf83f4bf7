//! Per-connection writer task
//!
//! ## 責務
//!
//! - `Outbox` に積まれたメッセージを一つずつソケットへ書き出す
//! - 同じメッセージのフレーム間にペーシング用の待機を入れる
//!
//! ## 設計ノート
//!
//! 書き込みはこのタスクだけが行うため、あるコネクション上で
//! 二つのメッセージのフレームが混ざることはありません。
//! 書き込みに失敗するとタスクは終了し、以降の `Outbox::push` は失敗します。
//! キューは [`OUTBOX_CAPACITY`] 件までで、読み取らないピアのキューが
//! 一杯になると `push` が失敗し、そのセッションは配送不能として外されます。

use std::{io, time::Duration};

use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::mpsc,
    task::JoinHandle,
};

use crate::domain::{EncodedMessage, Outbox};

/// Messages that may wait for one connection before it counts as unreachable
pub const OUTBOX_CAPACITY: usize = 256;

/// Spawn the writer task for one connection.
///
/// The task ends when every `Outbox` clone is dropped (after draining the
/// queue) or on the first write error.
pub fn spawn_writer<W>(writer: W, pacing: Duration) -> (Outbox, JoinHandle<()>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(OUTBOX_CAPACITY);
    let handle = tokio::spawn(writer_loop(rx, writer, pacing));
    (Outbox::new(tx), handle)
}

async fn writer_loop<W>(
    mut rx: mpsc::Receiver<EncodedMessage>,
    mut writer: W,
    pacing: Duration,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        if let Err(e) = write_message(&mut writer, &message, pacing).await {
            tracing::warn!("Failed to write frames to connection: {}", e);
            return;
        }
    }

    if let Err(e) = writer.shutdown().await {
        tracing::debug!("Failed to shut down connection writer: {}", e);
    }
}

/// Write every frame of one message in order, pausing `pacing` between frames
pub async fn write_message<W>(writer: &mut W, frames: &[Vec<u8>], pacing: Duration) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    for (i, frame) in frames.iter().enumerate() {
        if i > 0 && !pacing.is_zero() {
            tokio::time::sleep(pacing).await;
        }
        writer.write_all(frame).await?;
    }
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, duplex};

    use super::*;

    #[tokio::test]
    async fn test_writer_writes_messages_in_order() {
        // テスト項目: キューに積んだ順にフレームが書き出される
        // given (前提条件):
        let (client, mut server) = duplex(1024);
        let (outbox, handle) = spawn_writer(client, Duration::from_millis(1));

        // when (操作):
        outbox
            .push(vec![b"ab".to_vec(), b"cd".to_vec()].into())
            .unwrap();
        outbox.push(vec![b"ef".to_vec()].into()).unwrap();
        drop(outbox);
        handle.await.unwrap();

        // then (期待する結果):
        let mut received = Vec::new();
        server.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"abcdef");
    }

    #[tokio::test]
    async fn test_writer_stops_on_write_error() {
        // テスト項目: 書き込みに失敗するとタスクが終了し、以降の push は失敗する
        // given (前提条件):
        let (client, server) = duplex(64);
        drop(server);
        let (outbox, handle) = spawn_writer(client, Duration::ZERO);

        // when (操作):
        outbox.push(vec![b"lost".to_vec()].into()).unwrap();
        handle.await.unwrap();

        // then (期待する結果):
        assert!(outbox.push(vec![b"late".to_vec()].into()).is_err());
    }

    #[tokio::test]
    async fn test_stalled_peer_overflows_outbox() {
        // テスト項目: 読み取らないピアではキューが一杯になり、push が失敗して溢れが通知される
        // given (前提条件):
        let (client, _server) = duplex(8);
        let (outbox, handle) = spawn_writer(client, Duration::ZERO);

        // when (操作):
        let failures = (0..OUTBOX_CAPACITY + 2)
            .filter(|_| outbox.push(vec![vec![b'x'; 64]].into()).is_err())
            .count();

        // then (期待する結果):
        assert!(failures >= 1);
        assert!(
            tokio::time::timeout(Duration::from_secs(1), outbox.overflowed())
                .await
                .is_ok()
        );
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_only_between_frames() {
        // テスト項目: ペーシングはフレーム間にのみ入り、最後のフレームの後には入らない
        // given (前提条件):
        let mut sink = Vec::new();
        let frames = vec![b"1".to_vec(), b"2".to_vec(), b"3".to_vec()];
        let start = tokio::time::Instant::now();

        // when (操作):
        write_message(&mut sink, &frames, Duration::from_millis(10))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(sink, b"123");
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(20) && elapsed < Duration::from_millis(30));
    }
}
