//! LAN address discovery and QR code for the startup banner.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use qrcode::render::unicode::Dense1x2;
use qrcode::types::QrError;
use qrcode::QrCode;
use tokio::net::UdpSocket;
use tracing::debug;

/// First non-loopback IPv4 address of this host, as chosen by the routing
/// table. Connecting a UDP socket sends no packets.
pub async fn local_ipv4() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await.ok()?;
    if let Err(e) = socket.connect((Ipv4Addr::new(192, 0, 2, 1), 9)).await {
        debug!(error = %e, "No IPv4 route for LAN discovery");
        return None;
    }

    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_loopback() && !ip.is_unspecified() => Some(ip),
        _ => None,
    }
}

/// URL other devices on the same network should open.
pub fn lan_url(bound: SocketAddr, lan_ip: Option<Ipv4Addr>) -> String {
    let host = if bound.ip().is_unspecified() {
        lan_ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "localhost".to_string())
    } else {
        bound.ip().to_string()
    };
    format!("http://{}:{}", host, bound.port())
}

/// Terminal QR code for `url`, two modules per character row. Light and
/// dark are inverted so it scans on a dark terminal background.
pub fn render_qr(url: &str) -> Result<String, QrError> {
    let code = QrCode::new(url.as_bytes())?;
    Ok(code
        .render::<Dense1x2>()
        .dark_color(Dense1x2::Light)
        .light_color(Dense1x2::Dark)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_bind_uses_lan_ip() {
        let bound: SocketAddr = "0.0.0.0:5000".parse().unwrap();
        assert_eq!(
            lan_url(bound, Some(Ipv4Addr::new(192, 168, 1, 20))),
            "http://192.168.1.20:5000"
        );
    }

    #[test]
    fn test_wildcard_bind_without_lan_falls_back() {
        let bound: SocketAddr = "0.0.0.0:5000".parse().unwrap();
        assert_eq!(lan_url(bound, None), "http://localhost:5000");
    }

    #[test]
    fn test_specific_bind_is_used_verbatim() {
        let bound: SocketAddr = "10.0.0.5:8080".parse().unwrap();
        assert_eq!(
            lan_url(bound, Some(Ipv4Addr::new(192, 168, 1, 20))),
            "http://10.0.0.5:8080"
        );
    }

    #[test]
    fn test_qr_is_a_square_block() {
        let qr = render_qr("http://192.168.1.20:5000").unwrap();
        let rows: Vec<&str> = qr.lines().collect();
        assert!(!rows.is_empty());

        let width = rows[0].chars().count();
        assert!(rows.iter().all(|row| row.chars().count() == width));
        // Two modules per row, so roughly half as many rows as columns.
        assert_eq!(rows.len(), (width + 1) / 2);
        assert!(qr.chars().all(|c| matches!(c, ' ' | '\u{2580}' | '\u{2584}' | '\u{2588}' | '\n')));
    }

    #[test]
    fn test_qr_rejects_oversized_payload() {
        let url = format!("http://{}", "a".repeat(8000));
        assert!(render_qr(&url).is_err());
    }
}
