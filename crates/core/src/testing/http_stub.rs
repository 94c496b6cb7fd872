//! One-shot HTTP server for exercising HTTP clients.

use std::io;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// The request received by [`serve_once`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// Request line and headers.
    pub head: String,
    pub body: String,
}

/// Accept a single connection on localhost, answer it with `status` and
/// `body`, and hand back the request.
///
/// Returns the base URL (`http://127.0.0.1:<port>`) and a handle resolving
/// to the captured request.
pub async fn serve_once(
    status: &str,
    body: &str,
) -> io::Result<(String, JoinHandle<io::Result<CapturedRequest>>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let url = format!("http://{}", listener.local_addr()?);
    let status = status.to_string();
    let body = body.as_bytes().to_vec();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await?;
        let mut received = Vec::new();
        let mut buf = [0u8; 4096];

        let head_end = loop {
            if let Some(pos) = received.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            let n = socket.read(&mut buf).await?;
            if n == 0 {
                break received.len();
            }
            received.extend_from_slice(&buf[..n]);
        };

        let head = String::from_utf8_lossy(&received[..head_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        while received.len() < head_end + content_length {
            let n = socket.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
        }
        let request_body = String::from_utf8_lossy(&received[head_end..]).to_string();

        let response_head = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n",
            status,
            body.len()
        );
        socket.write_all(response_head.as_bytes()).await?;
        socket.write_all(&body).await?;
        let _ = socket.shutdown().await;

        Ok::<_, io::Error>(CapturedRequest {
            head,
            body: request_body,
        })
    });

    Ok((url, handle))
}
