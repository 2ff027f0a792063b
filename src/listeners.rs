use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener as StdTcpListener};
use tokio::net::TcpListener;

// Binds the server listener. A host of "*" binds the wildcard address,
// preferring an IPv6 dual-stack socket and falling back to IPv4-only when
// that is not available.
pub async fn create_listener(host: &str, port: u16) -> std::io::Result<(String, TcpListener)> {
    if host == "*" {
        return wildcard_listener(port);
    }

    let addr = format!("{}:{}", host, port);
    tracing::info!("Binding server to {}...", addr);
    let listener = TcpListener::bind(&addr).await?;
    Ok((addr, listener))
}

fn wildcard_listener(port: u16) -> std::io::Result<(String, TcpListener)> {
    let v6_addr = SocketAddr::from((Ipv6Addr::UNSPECIFIED, port));
    tracing::info!("Binding server to {} (IPv6 + IPv4 dual-stack)...", v6_addr);
    match bind_wildcard(Domain::IPV6, v6_addr) {
        Ok(listener) => return Ok((v6_addr.to_string(), listener)),
        Err(e) => {
            tracing::warn!(
                "Failed to bind dual-stack listener: {}. Falling back to IPv4.",
                e
            );
        }
    }

    let v4_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    tracing::info!("Binding server to {} (IPv4)...", v4_addr);
    let listener = bind_wildcard(Domain::IPV4, v4_addr)?;
    Ok((v4_addr.to_string(), listener))
}

fn bind_wildcard(domain: Domain, addr: SocketAddr) -> std::io::Result<TcpListener> {
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    if addr.is_ipv6() {
        // Dual-stack is best effort; some systems only allow IPv6-only sockets.
        if let Err(e) = socket.set_only_v6(false) {
            tracing::warn!(
                "Failed to enable dual-stack mode: {}. Continuing with IPv6 only.",
                e
            );
        }
    }

    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1024)?;

    // Tokio requires a non-blocking socket
    socket.set_nonblocking(true)?;

    let std_listener: StdTcpListener = socket.into();
    TcpListener::from_std(std_listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_loopback_ephemeral_port() {
        let (addr, listener) = create_listener("127.0.0.1", 0).await.unwrap();
        assert_eq!(addr, "127.0.0.1:0");
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_wildcard_binds_on_some_stack() {
        let (_, listener) = create_listener("*", 0).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }
}
