//! Loopback HTTP and HTTPS servers for exercising the real transport.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;

/// Maps a request path to a raw HTTP/1.1 response.
pub type Route = Arc<dyn Fn(&str) -> String + Send + Sync>;

pub fn status(code: u16) -> String {
    format!(
        "HTTP/1.1 {} Fixture\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        code
    )
}

pub fn redirect(location: &str) -> String {
    format!(
        "HTTP/1.1 301 Moved Permanently\r\nLocation: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        location
    )
}

/// Plain HTTP server answering every connection through `route`.
pub async fn spawn_http(route: Route) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let route = route.clone();
            tokio::spawn(async move { respond(socket, &*route).await });
        }
    });

    addr
}

/// HTTPS server with a freshly generated self-signed certificate for
/// `localhost`, answering every request with `code`.
pub async fn spawn_https(code: u16) -> SocketAddr {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let identity = native_tls::Identity::from_pkcs8(
        cert.pem().as_bytes(),
        key_pair.serialize_pem().as_bytes(),
    )
    .unwrap();
    let acceptor =
        tokio_native_tls::TlsAcceptor::from(native_tls::TlsAcceptor::new(identity).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                // Clients that reject the certificate abort the handshake.
                if let Ok(stream) = acceptor.accept(socket).await {
                    respond(stream, &|_: &str| status(code)).await;
                }
            });
        }
    });

    addr
}

async fn respond<S>(mut stream: S, route: &(dyn Fn(&str) -> String + Send + Sync))
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; 8192];
    let mut read = 0;

    loop {
        let n = match stream.read(&mut buf[read..]).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        read += n;
        if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
        if read == buf.len() {
            return;
        }
    }

    let head = String::from_utf8_lossy(&buf[..read]);
    let path = head.split_whitespace().nth(1).unwrap_or("/");
    let response = route(path);

    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}
