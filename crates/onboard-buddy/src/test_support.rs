//! One-shot localhost HTTP responder for exercising the real reqwest paths.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// Answer a single request with `status` and `body`. Returns the base URL and
/// a handle that yields the raw request once it has been served.
pub(crate) fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let base_url = format!("http://{}", listener.local_addr().expect("local addr"));
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept connection");
        let mut reader = BufReader::new(stream);
        let mut request = String::new();
        let mut content_length = 0usize;

        loop {
            let mut line = String::new();
            reader.read_line(&mut line).expect("read request line");
            if let Some((name, value)) = line.split_once(':') {
                if name.trim().eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
            let headers_done = line == "\r\n" || line.is_empty();
            request.push_str(&line);
            if headers_done {
                break;
            }
        }

        let mut payload = vec![0u8; content_length];
        reader.read_exact(&mut payload).expect("read request body");
        request.push_str(&String::from_utf8_lossy(&payload));

        let mut stream = reader.into_inner();
        stream.write_all(response.as_bytes()).expect("write response");
        stream.flush().expect("flush response");
        request
    });

    (base_url, handle)
}
