//! # RPC Worker
//!
//! One OS thread owns the [`RpcService`] and therefore the wallet. HTTP
//! handlers send envelopes over a channel and await a oneshot reply, so
//! requests are executed strictly one at a time. Between requests the thread
//! refreshes the wallet on a fixed interval and checks whether a
//! `stop_wallet` call asked the server to shut down.
//!
//! The wallet is stored when the thread exits, whatever the reason.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tokio::sync::{oneshot, watch};

use solace_wallet::config::{REFRESH_INTERVAL, STOP_POLL_INTERVAL};
use solace_wallet::engine::WalletEngine;
use solace_wallet::rpc::{JsonRpcRequest, JsonRpcResponse, RpcService};

use crate::metrics::SharedMetrics;

enum Message {
    Call {
        request: JsonRpcRequest,
        reply: oneshot::Sender<JsonRpcResponse>,
    },
    Shutdown,
}

/// Sending side of the worker queue. Cheap to clone.
#[derive(Clone)]
pub struct WorkerHandle {
    tx: Sender<Message>,
}

impl WorkerHandle {
    /// Queues `request` and waits for its response. `None` once the worker
    /// has exited.
    pub async fn call(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let (reply, response) = oneshot::channel();
        self.tx.send(Message::Call { request, reply }).ok()?;
        response.await.ok()
    }

    /// Asks the worker to store the wallet and exit after the current request.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Message::Shutdown);
    }
}

/// How often the worker refreshes and polls.
#[derive(Debug, Clone, Copy)]
pub struct WorkerTiming {
    pub refresh_interval: Duration,
    pub poll_interval: Duration,
}

impl Default for WorkerTiming {
    fn default() -> Self {
        Self {
            refresh_interval: REFRESH_INTERVAL,
            poll_interval: STOP_POLL_INTERVAL,
        }
    }
}

/// Starts the worker thread. `stopped` is set to `true` when the thread
/// exits because the wallet asked to stop.
pub fn spawn<E: WalletEngine + 'static>(
    service: RpcService<E>,
    metrics: SharedMetrics,
    timing: WorkerTiming,
    stopped: watch::Sender<bool>,
) -> std::io::Result<(WorkerHandle, JoinHandle<()>)> {
    let (tx, rx) = mpsc::channel();
    let join = thread::Builder::new()
        .name("wallet-rpc-worker".into())
        .spawn(move || run(service, rx, metrics, timing, stopped))?;
    Ok((WorkerHandle { tx }, join))
}

fn run<E: WalletEngine + 'static>(
    mut service: RpcService<E>,
    rx: Receiver<Message>,
    metrics: SharedMetrics,
    timing: WorkerTiming,
    stopped: watch::Sender<bool>,
) {
    tracing::info!("wallet worker started");
    if let Some(height) = service.height() {
        metrics.wallet_height.set(height as i64);
    }
    let mut last_refresh = Instant::now();

    loop {
        match rx.recv_timeout(timing.poll_interval) {
            Ok(Message::Call { request, reply }) => {
                let (response, report) = service.handle_with_report(request);
                metrics.observe_call(&report);
                if reply.send(response).is_err() {
                    tracing::debug!(method = %report.method, "caller went away before the reply");
                }
            }
            Ok(Message::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                tracing::info!("wallet worker shutting down");
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        if service.stop_requested() {
            tracing::info!("stop requested through rpc");
            stopped.send_replace(true);
            break;
        }

        if last_refresh.elapsed() >= timing.refresh_interval {
            refresh(&mut service, &metrics);
            last_refresh = Instant::now();
        }
    }

    if let Err(err) = service.store() {
        tracing::error!(error = %err, "failed to store wallet on exit");
    }
    tracing::info!("wallet worker stopped");
}

fn refresh<E: WalletEngine + 'static>(service: &mut RpcService<E>, metrics: &SharedMetrics) {
    metrics.wallet_refresh_total.inc();
    match service.refresh() {
        Ok(()) => {
            if let Some(height) = service.height() {
                metrics.wallet_height.set(height as i64);
                tracing::debug!(height, "wallet refreshed");
            }
        }
        Err(err) => {
            metrics.wallet_refresh_failures_total.inc();
            tracing::error!(error = %err, "wallet refresh failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::WalletMetrics;
    use serde_json::json;
    use solace_wallet::address::Network;
    use solace_wallet::config::RpcOptions;
    use solace_wallet::engine::MemoryWallet;
    use std::sync::Arc;

    fn fast() -> WorkerTiming {
        WorkerTiming {
            refresh_interval: Duration::from_millis(20),
            poll_interval: Duration::from_millis(5),
        }
    }

    fn request(method: &str) -> JsonRpcRequest {
        serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1, "method": method})).unwrap()
    }

    fn start(
        wallet: MemoryWallet,
        timing: WorkerTiming,
    ) -> (WorkerHandle, JoinHandle<()>, SharedMetrics, watch::Receiver<bool>) {
        let metrics = Arc::new(WalletMetrics::new());
        let (stopped_tx, stopped_rx) = watch::channel(false);
        let service = RpcService::new(wallet, RpcOptions::default());
        let (handle, join) = spawn(service, Arc::clone(&metrics), timing, stopped_tx).unwrap();
        (handle, join, metrics, stopped_rx)
    }

    async fn join(handle: JoinHandle<()>) {
        tokio::task::spawn_blocking(move || handle.join())
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn requests_are_answered_and_counted() {
        let (handle, thread, metrics, _) =
            start(MemoryWallet::dev(Network::Testnet), WorkerTiming::default());

        let response = handle.call(request("getheight")).await.unwrap();
        assert_eq!(response.result.unwrap()["height"], 200);
        assert_eq!(metrics.wallet_height.get(), 200);
        assert_eq!(
            metrics
                .rpc_requests_total
                .with_label_values(&["getheight"])
                .get(),
            1
        );

        handle.shutdown();
        join(thread).await;
        assert!(handle.call(request("getheight")).await.is_none());
    }

    #[tokio::test]
    async fn refreshes_between_requests() {
        let (handle, thread, metrics, _) = start(MemoryWallet::dev(Network::Testnet), fast());
        tokio::time::sleep(Duration::from_millis(200)).await;

        let response = handle.call(request("getheight")).await.unwrap();
        let height = response.result.unwrap()["height"].as_u64().unwrap();
        assert!(height > 200);
        assert!(metrics.wallet_refresh_total.get() > 0);
        assert_eq!(metrics.wallet_refresh_failures_total.get(), 0);

        handle.shutdown();
        join(thread).await;
    }

    #[tokio::test]
    async fn refresh_failures_are_not_fatal() {
        let mut wallet = MemoryWallet::dev(Network::Testnet);
        wallet.set_daemon_busy(true);
        let (handle, thread, metrics, _) = start(wallet, fast());
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(metrics.wallet_refresh_failures_total.get() > 0);
        assert!(handle.call(request("getheight")).await.is_some());

        handle.shutdown();
        join(thread).await;
    }

    #[tokio::test]
    async fn stop_wallet_ends_the_worker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.json");
        let mut wallet = MemoryWallet::dev(Network::Testnet);
        wallet.set_path(path.clone());
        let (handle, thread, _, mut stopped) = start(wallet, WorkerTiming::default());

        let response = handle.call(request("stop_wallet")).await.unwrap();
        assert!(response.error.is_none());
        stopped.wait_for(|s| *s).await.unwrap();
        join(thread).await;

        assert!(path.exists());
        assert!(handle.call(request("getheight")).await.is_none());
    }
}
