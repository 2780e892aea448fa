//! The Executor Link: the controller listens on a TCP port; the Executor
//! dials in. Tasks are written as length-prefixed frames; Replies read off
//! the same connection are forwarded, in arrival order, to `inbound_tx` —
//! the workflow dispatcher decides what each one means, this module only
//! owns getting bytes on and off the wire.
//!
//! Mirrors the Bridge Link's shape (own the connection, reconnect
//! forever, hand inbound messages off through a channel) rather than the
//! worker bridge's request/response correlation: the workflow here is
//! reply-driven, not request/response — a handler reacting to a
//! `read_py_files` Reply issues the next Task and returns, and it's the
//! *next* Reply to arrive that drives the next handler, not a waiter
//! blocked on this one.

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use actl_types::{ControllerError, Reply, Task};

use crate::framed::{read_frame, write_frame};

/// Handle for sending a Task to the Executor. Fire-and-forget: the
/// resulting Reply arrives later on the `inbound_tx` channel passed to
/// [`spawn`], not as a return value here.
#[derive(Debug, Clone)]
pub struct ExecutorHandle {
    outbound_tx: mpsc::Sender<Task>,
}

impl ExecutorHandle {
    pub async fn send(&self, task: Task) -> Result<(), ControllerError> {
        self.outbound_tx
            .send(task)
            .await
            .map_err(|_| ControllerError::Transport("executor connection closed".to_string()))
    }
}

/// Bind `port` and run the accept-and-serve loop forever, reconnecting
/// whenever the Executor's connection drops. Exactly one accepted peer at
/// a time is sufficient per the protocol.
pub async fn spawn(port: u16, inbound_tx: mpsc::UnboundedSender<Reply>) -> Result<ExecutorHandle, std::io::Error> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    log::info!("listening for executor on port {port}");

    let (outbound_tx, outbound_rx) = mpsc::channel::<Task>(64);
    tokio::spawn(accept_loop(listener, outbound_rx, inbound_tx));

    Ok(ExecutorHandle { outbound_tx })
}

async fn accept_loop(
    listener: TcpListener,
    mut outbound_rx: mpsc::Receiver<Task>,
    inbound_tx: mpsc::UnboundedSender<Reply>,
) {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                log::warn!("executor accept failed: {e}");
                continue;
            }
        };
        log::info!("executor connected from {addr}");

        serve_connection(stream, &mut outbound_rx, &inbound_tx).await;
        log::warn!("executor connection lost, waiting for reconnect");
    }
}

async fn serve_connection(
    stream: TcpStream,
    outbound_rx: &mut mpsc::Receiver<Task>,
    inbound_tx: &mpsc::UnboundedSender<Reply>,
) {
    let (mut read_half, mut write_half) = stream.into_split();

    let reply_tx = inbound_tx.clone();
    let mut reader = tokio::spawn(async move {
        loop {
            match read_frame::<_, Reply>(&mut read_half).await {
                Ok(Some(reply)) => {
                    if reply_tx.send(reply).is_err() {
                        break;
                    }
                }
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("executor read error: {e}");
                    break;
                }
            }
        }
    });

    loop {
        tokio::select! {
            biased;
            _ = &mut reader => break,
            task = outbound_rx.recv() => {
                match task {
                    Some(task) => {
                        if write_frame(&mut write_half, &task).await.is_err() {
                            log::warn!("executor write error, dropping connection");
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    reader.abort();
}
