//! Stream handles for a remote command started over SSH.
//!
//! [`ExecStreams`] is what the caller holds; the matching [`StreamSink`] is
//! fed by the task relaying the SSH channel. The two halves are joined by
//! unbounded queues so a caller reading only stdout never stalls the relay
//! on a full stderr.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::{Buf, Bytes};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf};
use tokio::sync::{mpsc, oneshot};

/// Input destined for the remote command's stdin.
#[derive(Debug)]
pub(crate) enum StdinEvent {
    Data(Bytes),
    Eof,
}

/// Writable handle for the remote command's standard input.
///
/// `shutdown` sends EOF to the remote side.
#[derive(Debug)]
pub struct InputStream {
    tx: mpsc::UnboundedSender<StdinEvent>,
    eof_sent: bool,
}

impl AsyncWrite for InputStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.eof_sent {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "stdin already shut down",
            )));
        }
        match self.tx.send(StdinEvent::Data(Bytes::copy_from_slice(buf))) {
            Ok(()) => Poll::Ready(Ok(buf.len())),
            Err(_) => Poll::Ready(Err(io::ErrorKind::BrokenPipe.into())),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if !self.eof_sent {
            self.eof_sent = true;
            // The relay may already be gone; nothing left to signal then.
            let _ = self.tx.send(StdinEvent::Eof);
        }
        Poll::Ready(Ok(()))
    }
}

/// Readable handle for the remote command's stdout or stderr.
///
/// Reads return EOF once the remote side has closed the channel.
#[derive(Debug)]
pub struct OutputStream {
    rx: mpsc::UnboundedReceiver<Bytes>,
    pending: Bytes,
}

impl OutputStream {
    fn new(rx: mpsc::UnboundedReceiver<Bytes>) -> Self {
        Self {
            rx,
            pending: Bytes::new(),
        }
    }
}

impl AsyncRead for OutputStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            if !this.pending.is_empty() {
                let n = this.pending.len().min(buf.remaining());
                buf.put_slice(&this.pending[..n]);
                this.pending.advance(n);
                return Poll::Ready(Ok(()));
            }

            match ready!(this.rx.poll_recv(cx)) {
                Some(chunk) => this.pending = chunk,
                None => return Poll::Ready(Ok(())),
            }
        }
    }
}

/// The three standard streams of a remote command, plus its exit status.
#[derive(Debug)]
pub struct ExecStreams {
    /// Remote standard input.
    pub stdin: InputStream,

    /// Remote standard output.
    pub stdout: OutputStream,

    /// Remote standard error.
    pub stderr: OutputStream,

    exit_rx: Option<oneshot::Receiver<u32>>,
    exit_status: Option<u32>,
}

impl ExecStreams {
    /// Create connected caller and relay halves.
    pub(crate) fn pipe() -> (Self, StreamSink) {
        let (stdin_tx, stdin_rx) = mpsc::unbounded_channel();
        let (stdout_tx, stdout_rx) = mpsc::unbounded_channel();
        let (stderr_tx, stderr_rx) = mpsc::unbounded_channel();
        let (exit_tx, exit_rx) = oneshot::channel();

        let streams = Self {
            stdin: InputStream {
                tx: stdin_tx,
                eof_sent: false,
            },
            stdout: OutputStream::new(stdout_rx),
            stderr: OutputStream::new(stderr_rx),
            exit_rx: Some(exit_rx),
            exit_status: None,
        };
        let sink = StreamSink {
            stdin_rx,
            stdout_tx,
            stderr_tx,
            exit_tx: Some(exit_tx),
        };
        (streams, sink)
    }

    /// Wait for the remote exit status.
    ///
    /// Returns `None` if the channel closed without reporting one.
    pub async fn exit_status(&mut self) -> Option<u32> {
        if self.exit_status.is_none() {
            if let Some(rx) = self.exit_rx.take() {
                self.exit_status = rx.await.ok();
            }
        }
        self.exit_status
    }

    /// Read stdout to the end as (lossy) UTF-8.
    pub async fn read_stdout_to_string(mut self) -> io::Result<String> {
        let mut data = Vec::new();
        self.stdout.read_to_end(&mut data).await?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Split into stdin, stdout and stderr.
    pub fn into_parts(self) -> (InputStream, OutputStream, OutputStream) {
        (self.stdin, self.stdout, self.stderr)
    }
}

/// Relay-side half of [`ExecStreams`].
#[derive(Debug)]
pub(crate) struct StreamSink {
    stdin_rx: mpsc::UnboundedReceiver<StdinEvent>,
    stdout_tx: mpsc::UnboundedSender<Bytes>,
    stderr_tx: mpsc::UnboundedSender<Bytes>,
    exit_tx: Option<oneshot::Sender<u32>>,
}

impl StreamSink {
    /// Forward a stdout chunk. Dropped silently if the reader is gone.
    pub(crate) fn stdout(&self, data: &[u8]) {
        let _ = self.stdout_tx.send(Bytes::copy_from_slice(data));
    }

    /// Forward a stderr chunk. Dropped silently if the reader is gone.
    pub(crate) fn stderr(&self, data: &[u8]) {
        let _ = self.stderr_tx.send(Bytes::copy_from_slice(data));
    }

    /// Record the exit status. Only the first call has an effect.
    pub(crate) fn exit(&mut self, status: u32) {
        if let Some(tx) = self.exit_tx.take() {
            let _ = tx.send(status);
        }
    }

    /// Next piece of input written by the caller, `None` once every
    /// stdin handle is dropped.
    pub(crate) async fn next_input(&mut self) -> Option<StdinEvent> {
        self.stdin_rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    use super::*;

    #[tokio::test]
    async fn test_stdout_lines_are_verbatim() {
        let (streams, mut sink) = ExecStreams::pipe();
        sink.stdout(b"/vol/vol0/lun0  10g (10737418240) (r/w, online, mapped)\n");
        sink.stdout(b"/vol/vol0/lun1   5g (5368709120)");
        sink.stdout(b" (r/w, offline)\n");
        sink.exit(0);
        drop(sink);

        let (_, stdout, _) = streams.into_parts();
        let mut lines = BufReader::new(stdout).lines();
        assert_eq!(
            lines.next_line().await.unwrap().as_deref(),
            Some("/vol/vol0/lun0  10g (10737418240) (r/w, online, mapped)")
        );
        assert_eq!(
            lines.next_line().await.unwrap().as_deref(),
            Some("/vol/vol0/lun1   5g (5368709120) (r/w, offline)")
        );
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stderr_is_separate() {
        let (streams, sink) = ExecStreams::pipe();
        sink.stdout(b"out\n");
        sink.stderr(b"lun: not found\n");
        drop(sink);

        let (_, mut stdout, mut stderr) = streams.into_parts();
        let mut err = String::new();
        stderr.read_to_string(&mut err).await.unwrap();
        let mut out = String::new();
        stdout.read_to_string(&mut out).await.unwrap();

        assert_eq!(out, "out\n");
        assert_eq!(err, "lun: not found\n");
    }

    #[tokio::test]
    async fn test_exit_status() {
        let (mut streams, mut sink) = ExecStreams::pipe();
        sink.exit(3);
        sink.exit(9);
        assert_eq!(streams.exit_status().await, Some(3));
        assert_eq!(streams.exit_status().await, Some(3));
    }

    #[tokio::test]
    async fn test_missing_exit_status() {
        let (mut streams, sink) = ExecStreams::pipe();
        drop(sink);
        assert_eq!(streams.exit_status().await, None);
    }

    #[tokio::test]
    async fn test_stdin_forwarding_and_eof() {
        let (mut streams, mut sink) = ExecStreams::pipe();
        streams.stdin.write_all(b"yes\n").await.unwrap();
        streams.stdin.shutdown().await.unwrap();

        match sink.next_input().await {
            Some(StdinEvent::Data(data)) => assert_eq!(&data[..], b"yes\n"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(sink.next_input().await, Some(StdinEvent::Eof)));
        assert!(streams.stdin.write_all(b"late").await.is_err());
    }

    #[tokio::test]
    async fn test_read_stdout_to_string() {
        let (streams, sink) = ExecStreams::pipe();
        sink.stdout(b"lun show all\n");
        drop(sink);
        assert_eq!(streams.read_stdout_to_string().await.unwrap(), "lun show all\n");
    }
}
