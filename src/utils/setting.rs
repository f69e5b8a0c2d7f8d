// Probe remote endpoints
use tokio::net::TcpStream;

/// Checks that the database backup endpoint accepts TCP connections.
///
/// The address must be in host:port form; the probe connects and drops the
/// stream. There is no cheap application-level handshake on the backup
/// protocol, so a successful connect is the strongest check available.
pub async fn check_backup_endpoint(address: &str) -> bool {
    let valid_form = address
        .rsplit_once(':')
        .map(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok())
        .unwrap_or(false);
    if !valid_form {
        eprintln!("❌ Backup endpoint '{}' is not in host:port form", address);
        return false;
    }

    match TcpStream::connect(address).await {
        Ok(_) => {
            println!("✅ Successfully connected to {}", address);
            true
        }
        Err(e) => {
            eprintln!("❌ Failed to connect to {}: {}", address, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_check_backup_endpoint_reachable() -> anyhow::Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?.to_string();

        assert!(check_backup_endpoint(&address).await);
        Ok(())
    }

    #[tokio::test]
    async fn test_check_backup_endpoint_unreachable() -> anyhow::Result<()> {
        // Bind to grab a free port, then drop the listener so the connect
        // is refused.
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?.to_string();
        drop(listener);

        assert!(!check_backup_endpoint(&address).await);
        Ok(())
    }

    #[tokio::test]
    async fn test_check_backup_endpoint_malformed_address() {
        assert!(!check_backup_endpoint("no-port-here").await);
        assert!(!check_backup_endpoint("host:not-a-port").await);
        assert!(!check_backup_endpoint(":6362").await);
    }
}
