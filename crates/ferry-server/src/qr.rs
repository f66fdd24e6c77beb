//! QR code rendering and LAN address discovery.

use std::net::UdpSocket;

use qrcode::QrCode;
use qrcode::render::svg;

/// Best-effort LAN IP discovery.
///
/// Opens a UDP socket "towards" a public address — no packet is sent — and
/// reads back the local address the OS picked for the route. Falls back to
/// loopback when the machine has no route at all.
#[must_use]
pub fn local_ip() -> String {
    UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("8.8.8.8:80")?;
            socket.local_addr()
        })
        .map_or_else(|_| "127.0.0.1".to_owned(), |addr| addr.ip().to_string())
}

/// The URL phones should open, as encoded in the QR code.
#[must_use]
pub fn server_url(ip: &str, port: u16) -> String {
    format!("http://{ip}:{port}")
}

/// Render `url` as an SVG QR code.
pub fn qr_svg(url: &str) -> Result<String, qrcode::types::QrError> {
    let code = QrCode::new(url.as_bytes())?;
    Ok(code.render::<svg::Color>().min_dimensions(240, 240).build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_ip_is_parseable() {
        let ip = local_ip();
        assert!(ip.parse::<std::net::IpAddr>().is_ok());
    }

    #[test]
    fn server_url_format() {
        assert_eq!(server_url("192.168.1.10", 5000), "http://192.168.1.10:5000");
    }

    #[test]
    fn qr_renders_svg() {
        let svg = qr_svg("http://192.168.1.10:5000").unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("</svg>"));
    }

    #[test]
    fn qr_of_empty_string_still_renders() {
        assert!(qr_svg("").is_ok());
    }
}
