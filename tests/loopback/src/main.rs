fn main() {
    println!("Run `cargo test -p loopback` to execute the end-to-end relay tests.");
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, UnixStream};
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use linkspan_relay::{RelayConfig, TransportMode, run};
    use linkspan_rendezvous::{RendezvousEndpoint, Role};

    /// A long interval that keeps a poll pump quiet for a test's lifetime.
    const QUIET: Duration = Duration::from_secs(60);

    fn relay_config(channel: PathBuf, shared: PathBuf, poll_interval: Duration) -> RelayConfig {
        RelayConfig {
            channel_path: channel,
            remote_addr: String::new(),
            shared_file: shared,
            poll_interval,
        }
    }

    /// Claims `channel` as the local consumer app would, then streams every
    /// delivery made through it.
    async fn consumer(channel: PathBuf) -> mpsc::UnboundedReceiver<Vec<u8>> {
        let endpoint = RendezvousEndpoint::acquire(channel).await.unwrap();
        assert_eq!(endpoint.role(), Role::Hub);

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Ok(mut conn) = endpoint.accept().await {
                let mut bytes = Vec::new();
                if conn.read_to_end(&mut bytes).await.is_ok() {
                    let _ = tx.send(bytes);
                }
            }
        });
        rx
    }

    async fn produce(channel: &std::path::Path, bytes: &[u8]) {
        let mut conn = UnixStream::connect(channel).await.unwrap();
        conn.write_all(bytes).await.unwrap();
    }

    /// Collects deliveries until `expected` bytes have arrived.
    async fn collect(rx: &mut mpsc::UnboundedReceiver<Vec<u8>>, expected: usize) -> Vec<u8> {
        let mut all = Vec::new();
        while all.len() < expected {
            let batch = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("delivery should arrive")
                .expect("delivery channel closed");
            all.extend_from_slice(&batch);
        }
        all
    }

    #[tokio::test]
    async fn file_relay_carries_producer_bytes_to_remote_consumer() {
        let dir = tempfile::tempdir().unwrap();
        let shared = dir.path().join("shared.txt");
        let cancel = CancellationToken::new();

        // "Host A": the producer-side relay claims its channel first and
        // becomes hub, so it appends local bytes to the shared file. Its
        // poll pump is kept quiet so host A consumes nothing itself.
        let channel_a = dir.path().join("a.sock");
        tokio::spawn(run(
            TransportMode::File,
            relay_config(channel_a.clone(), shared.clone(), QUIET),
            cancel.clone(),
        ));
        tokio::time::sleep(Duration::from_millis(100)).await;

        // "Host B": the consumer app owns the channel; the relay started
        // afterward negotiates spoke and only polls the shared file.
        let channel_b = dir.path().join("b.sock");
        let mut deliveries = consumer(channel_b.clone()).await;
        tokio::spawn(run(
            TransportMode::File,
            relay_config(channel_b, shared, Duration::from_millis(100)),
            cancel.clone(),
        ));
        tokio::time::sleep(Duration::from_millis(100)).await;

        produce(&channel_a, b"hello").await;
        produce(&channel_a, b"world").await;

        // Same bytes, same order, one record per producer chunk.
        let all = collect(&mut deliveries, 12).await;
        assert_eq!(all, b"hello\nworld\n");

        cancel.cancel();
    }

    #[tokio::test]
    async fn stream_relay_carries_producer_bytes_across_a_bridge() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();

        // Stand-in for the remote link: accept both relays and cross-pipe
        // their connections.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let remote_addr = listener.local_addr().unwrap().to_string();

        // "Host A": producer-side hub relay.
        let channel_a = dir.path().join("a.sock");
        let mut config_a = relay_config(channel_a.clone(), dir.path().join("unused"), QUIET);
        config_a.remote_addr = remote_addr.clone();
        tokio::spawn(run(TransportMode::Stream, config_a, cancel.clone()));
        let (conn_a, _) = listener.accept().await.unwrap();

        // "Host B": consumer app owns the channel, relay joins as spoke.
        let channel_b = dir.path().join("b.sock");
        let mut deliveries = consumer(channel_b.clone()).await;
        let mut config_b = relay_config(channel_b, dir.path().join("unused"), QUIET);
        config_b.remote_addr = remote_addr;
        tokio::spawn(run(TransportMode::Stream, config_b, cancel.clone()));
        let (conn_b, _) = listener.accept().await.unwrap();

        // Bridge the two "hosts".
        let (a_read, a_write) = conn_a.into_split();
        let (b_read, b_write) = conn_b.into_split();
        tokio::spawn(async move {
            let mut a_read = a_read;
            let mut b_write = b_write;
            let _ = tokio::io::copy(&mut a_read, &mut b_write).await;
        });
        tokio::spawn(async move {
            let mut b_read = b_read;
            let mut a_write = a_write;
            let _ = tokio::io::copy(&mut b_read, &mut a_write).await;
        });
        tokio::time::sleep(Duration::from_millis(100)).await;

        produce(&channel_a, b"over the wire").await;

        let all = collect(&mut deliveries, 13).await;
        assert_eq!(all, b"over the wire");

        cancel.cancel();
    }

    #[tokio::test]
    async fn remote_close_leaves_local_producers_serviced() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let channel = dir.path().join("a.sock");
        let mut config = relay_config(channel.clone(), dir.path().join("unused"), QUIET);
        config.remote_addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(run(TransportMode::Stream, config, cancel.clone()));
        let (mut remote, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        produce(&channel, b"first").await;
        let mut buf = [0u8; 5];
        remote.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"first");

        // Half-close: the relay's outbound pump sees end-of-stream and
        // ends. The inbound pump must keep servicing new producers.
        remote.shutdown().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        produce(&channel, b"second").await;
        let mut buf = [0u8; 6];
        remote.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"second");

        cancel.cancel();
    }

    #[tokio::test]
    async fn racing_relays_settle_into_one_hub() {
        let dir = tempfile::tempdir().unwrap();
        let channel = dir.path().join("race.sock");

        let mut handles = Vec::new();
        for _ in 0..4 {
            let channel = channel.clone();
            handles.push(tokio::spawn(async move {
                RendezvousEndpoint::acquire(channel).await.unwrap()
            }));
        }

        // Endpoints stay alive until every claimant has settled; dropping
        // a winner would unlink the socket mid-race.
        let mut endpoints = Vec::new();
        for handle in handles {
            endpoints.push(handle.await.unwrap());
        }
        let hubs = endpoints.iter().filter(|e| e.role() == Role::Hub).count();
        assert_eq!(hubs, 1);
    }
}
