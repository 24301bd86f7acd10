#![allow(dead_code)]

pub mod test_server {
    use brrt_pipeline::dispatcher::Endpoint;
    use brrt_pipeline::server::{HttpServer, PipelineService, ServerHandle};
    use std::net::{SocketAddr, TcpListener};
    use std::sync::{Arc, Once};

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }

    /// Running server bound to a random local port; stopped on drop.
    pub struct TestServer {
        handle: Option<ServerHandle>,
        addr: SocketAddr,
    }

    impl TestServer {
        pub fn start(endpoint: Arc<dyn Endpoint>) -> Self {
            setup_may_runtime();
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let addr = listener.local_addr().unwrap();
            drop(listener);

            let handle = HttpServer(PipelineService::new(endpoint))
                .start(addr)
                .unwrap();
            handle.wait_ready().unwrap();
            Self {
                handle: Some(handle),
                addr,
            }
        }

        pub fn addr(&self) -> SocketAddr {
            self.addr
        }
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            if let Some(handle) = self.handle.take() {
                handle.stop();
            }
        }
    }
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Parsed raw HTTP/1.1 response.
    #[derive(Debug)]
    pub struct RawResponse {
        pub status: u16,
        pub headers: Vec<(String, String)>,
        pub body: Vec<u8>,
    }

    impl RawResponse {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }

        pub fn json(&self) -> serde_json::Value {
            serde_json::from_slice(&self.body).unwrap()
        }
    }

    /// Send a raw request and read until the response is complete per Content-Length.
    pub fn send_request(addr: &SocketAddr, req: &str) -> RawResponse {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        stream.write_all(req.as_bytes()).unwrap();

        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(resp) = parse_complete(&buf) {
                        return resp;
                    }
                }
                Err(e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read failed: {e}"),
            }
        }
        parse_complete(&buf).unwrap_or_else(|| {
            panic!(
                "incomplete response: {:?}",
                String::from_utf8_lossy(&buf)
            )
        })
    }

    fn parse_complete(buf: &[u8]) -> Option<RawResponse> {
        let head_end = buf.windows(4).position(|w| w == b"\r\n\r\n")?;
        let head = std::str::from_utf8(&buf[..head_end]).ok()?;
        let mut lines = head.split("\r\n");
        let status = lines.next()?.split_whitespace().nth(1)?.parse().ok()?;
        let headers: Vec<(String, String)> = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        let len = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.parse::<usize>().ok())
            .unwrap_or(0);
        let body_start = head_end + 4;
        if buf.len() < body_start + len {
            return None;
        }
        Some(RawResponse {
            status,
            headers,
            body: buf[body_start..body_start + len].to_vec(),
        })
    }

    /// `POST` with a JSON body and `Connection: close`.
    pub fn post_json(
        addr: &SocketAddr,
        path: &str,
        body: &str,
        extra_headers: &str,
    ) -> RawResponse {
        let req = format!(
            "POST {path} HTTP/1.1\r\n\
             Host: localhost\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             {extra_headers}\
             Connection: close\r\n\r\n\
             {body}",
            body.len()
        );
        send_request(addr, &req)
    }
}
