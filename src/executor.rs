use std::time::Duration;

use slp::{ServerStatus, StatusRequest};

/// Queries `host:port`, turning any failure into the offline record.
pub async fn probe(host: String, port: u16, timeout: Duration) -> ServerStatus {
    let request = StatusRequest::new(host, port).with_timeout(timeout);
    match slp::tokio::get_status(&request).await {
        Ok(status) => {
            debug!(
                host = request.host(),
                port,
                players = status.players().online,
                "server online"
            );
            status
        }
        Err(error) => {
            warn!(host = request.host(), port, %error, "server status query failed");
            ServerStatus::offline(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use slp::{OFFLINE_MOTD, Players, UNKNOWN_VERSION};
    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn refused_connection_is_offline() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let status = probe("127.0.0.1".to_owned(), port, Duration::from_secs(1)).await;
        assert!(!status.online());
        assert_eq!(status.players(), Players { online: 0, max: 0 });
        assert_eq!(status.version(), UNKNOWN_VERSION);
        assert_eq!(status.motd(), OFFLINE_MOTD);
        assert_eq!(status.error(), Some("connection refused"));
        assert_eq!(status.favicon(), None);
    }
}
