//! InfluxDB 1.x HTTP writer.

use reqwest::blocking::Client as BlockingClient;
use tracing::{debug, trace};

use crate::config::InfluxSettings;
use crate::point::{Batch, FieldEncoding, render_batch};
use crate::writer::{PointWriter, TransportError};

/// Longest response body kept in a [`TransportError::Rejected`].
const MAX_ERROR_BODY: usize = 512;

/// Writes batches to `{url}/write` at nanosecond precision.
///
/// The HTTP client is created once and reused across cycles.
pub struct InfluxWriter {
    http: BlockingClient,
    write_url: String,
    database: String,
    user: Option<String>,
    password: Option<String>,
    encoding: FieldEncoding,
}

impl InfluxWriter {
    pub fn new(settings: &InfluxSettings, encoding: FieldEncoding) -> Result<Self, TransportError> {
        let write_url = format!("{}/write", settings.url.trim_end_matches('/'));
        let http = BlockingClient::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("buddymon/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| TransportError::Http {
                url: write_url.clone(),
                source,
            })?;

        debug!(url = %write_url, database = %settings.database, "InfluxDB writer created");

        Ok(Self {
            http,
            write_url,
            database: settings.database.clone(),
            user: settings.user.clone(),
            password: settings.password.clone(),
            encoding,
        })
    }

    pub fn write_url(&self) -> &str {
        &self.write_url
    }
}

impl PointWriter for InfluxWriter {
    fn write(&mut self, batch: &Batch) -> Result<(), TransportError> {
        let body = render_batch(batch, self.encoding);
        trace!(bytes = body.len(), points = batch.len(), "sending batch");

        let mut request = self
            .http
            .post(&self.write_url)
            .query(&[("db", self.database.as_str()), ("precision", "ns")])
            .body(body);
        if let Some(user) = &self.user {
            request = request.basic_auth(user, self.password.as_deref());
        }

        let response = request.send().map_err(|source| TransportError::Http {
            url: self.write_url.clone(),
            source,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let mut body = response.text().unwrap_or_default().trim().to_string();
        if body.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|&i| body.is_char_boundary(i))
                .unwrap_or(0);
            body.truncate(cut);
        }
        Err(TransportError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::buddyinfo::parse_buddyinfo;
    use crate::collector::mock::TYPICAL_BUDDYINFO;
    use crate::point::{Tags, assemble};
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    /// Serves one HTTP request with `response` and returns the raw request.
    fn serve_once(response: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some((name, value)) = line.split_once(':')
                    && name.eq_ignore_ascii_case("content-length")
                {
                    content_length = value.trim().parse().unwrap();
                }
                let done = line == "\r\n";
                head.push_str(&line);
                if done {
                    break;
                }
            }

            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).unwrap();

            let mut stream = stream;
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();

            head + &String::from_utf8(body).unwrap()
        });

        (url, handle)
    }

    fn settings(url: String, user: Option<&str>) -> InfluxSettings {
        InfluxSettings {
            url,
            database: "buddyinfo".to_string(),
            user: user.map(str::to_string),
            password: user.map(|_| "secret".to_string()),
            timeout: Duration::from_secs(5),
        }
    }

    fn typical_batch() -> Batch {
        let records = parse_buddyinfo(TYPICAL_BUDDYINFO).unwrap();
        assemble(&records, "buddyinfo", &Tags::new(), 1_700_000_000_000_000_000)
    }

    #[test]
    fn test_write_url_strips_trailing_slash() {
        let writer = InfluxWriter::new(
            &settings("http://localhost:8086/".to_string(), None),
            FieldEncoding::Text,
        )
        .unwrap();
        assert_eq!(writer.write_url(), "http://localhost:8086/write");
    }

    #[test]
    fn test_write_success() {
        let (url, server) =
            serve_once("HTTP/1.1 204 No Content\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let mut writer =
            InfluxWriter::new(&settings(url, Some("buddy")), FieldEncoding::Integer).unwrap();

        writer.write(&typical_batch()).unwrap();

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /write?db=buddyinfo&precision=ns HTTP/1.1\r\n"));
        assert!(
            request
                .to_ascii_lowercase()
                .contains("authorization: basic ynvkzhk6c2vjcmv0")
        );
        assert!(request.contains("buddyinfo,node=0,zone=DMA 1p=1u,"));
        assert!(request.contains("buddyinfo,node=1,zone=Normal 1p=3888u,"));
        assert!(request.trim_end().ends_with(" 1700000000000000003"));
    }

    #[test]
    fn test_write_without_credentials_sends_no_auth() {
        let (url, server) =
            serve_once("HTTP/1.1 204 No Content\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let mut writer = InfluxWriter::new(&settings(url, None), FieldEncoding::Text).unwrap();

        writer.write(&typical_batch()).unwrap();

        let request = server.join().unwrap();
        assert!(!request.to_ascii_lowercase().contains("authorization:"));
    }

    #[test]
    fn test_write_rejected() {
        let (url, server) = serve_once(
            "HTTP/1.1 401 Unauthorized\r\nContent-Type: application/json\r\nContent-Length: 32\r\nConnection: close\r\n\r\n{\"error\":\"authorization failed\"}",
        );
        let mut writer =
            InfluxWriter::new(&settings(url, Some("buddy")), FieldEncoding::Text).unwrap();

        let err = writer.write(&typical_batch()).unwrap_err();
        server.join().unwrap();

        match err {
            TransportError::Rejected { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "{\"error\":\"authorization failed\"}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_write_connection_refused() {
        // Bind and drop to get a local port with nothing listening.
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let mut writer = InfluxWriter::new(
            &settings(format!("http://127.0.0.1:{port}"), None),
            FieldEncoding::Text,
        )
        .unwrap();

        let err = writer.write(&typical_batch()).unwrap_err();
        assert!(matches!(err, TransportError::Http { .. }));
    }
}
