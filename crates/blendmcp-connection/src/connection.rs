use crate::error::{BridgeError, is_timeout_kind, is_unreachable_kind};
use crate::protocol::{Command, Response};
use blendmcp_script::{ScriptBuilder, parse_result};
use serde_json::{Value, json};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9876;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const INFO_SCRIPT: &str = r#"info = {
    "version": bpy.app.version_string,
    "build_date": bpy.app.build_date.decode('utf-8'),
    "build_time": bpy.app.build_time.decode('utf-8'),
    "build_platform": bpy.app.build_platform.decode('utf-8'),
    "current_file": bpy.data.filepath,
    "scene_name": bpy.context.scene.name
}

print("RESULT:", json.dumps(info))"#;

/// Anything that can carry one command to Blender and bring back one
/// response. The socket client is the production implementation; tests
/// substitute in-memory transports.
pub trait CommandTransport {
    fn send_command(&self, command: &Command) -> Result<Response, BridgeError>;

    /// Sends `ping` and reports whether Blender answered with success.
    fn test_connection(&self) -> bool {
        match self.send_command(&Command::ping()) {
            Ok(response) => response.is_success(),
            Err(err) => {
                warn!("Blender connection test failed: {err}");
                false
            }
        }
    }

    fn execute_script(&self, script: &str) -> Result<Response, BridgeError> {
        self.send_command(&Command::execute_code(script))
    }

    /// Version and build metadata of the running Blender. Output that cannot
    /// be parsed yields an `{"error": ...}` placeholder instead of an error.
    fn blender_info(&self) -> Result<Value, BridgeError> {
        let mut builder = ScriptBuilder::new();
        builder.add_import("bpy").add_import("json").add_code(INFO_SCRIPT);

        let response = self.execute_script(&builder.build())?;
        if response.is_success() {
            if let Some(info @ Value::Object(_)) = parse_result(&response.output()) {
                return Ok(info);
            }
        }
        Ok(json!({"error": "Failed to get Blender info"}))
    }
}

impl<T: CommandTransport + ?Sized> CommandTransport for &T {
    fn send_command(&self, command: &Command) -> Result<Response, BridgeError> {
        (**self).send_command(command)
    }
}

/// Socket client for the Blender addon: one TCP connection per command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlenderConnection {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for BlenderConnection {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl BlenderConnection {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn refused(&self) -> BridgeError {
        BridgeError::ConnectionRefused {
            host: self.host.clone(),
            port: self.port,
        }
    }

    fn connect(&self) -> Result<TcpStream, BridgeError> {
        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|_| self.refused())?
            .collect();

        let mut last_err: Option<io::Error> = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => return Ok(stream),
                Err(err) => last_err = Some(err),
            }
        }

        match last_err {
            Some(err) if is_timeout_kind(err.kind()) => Err(BridgeError::Timeout {
                after: self.connect_timeout,
            }),
            Some(err) if !is_unreachable_kind(err.kind()) => Err(BridgeError::Communication(err)),
            _ => Err(self.refused()),
        }
    }

    /// Reads bytes until the first newline or until the peer closes,
    /// bounding the whole read by `self.timeout`.
    fn read_line(&self, stream: &mut TcpStream, started: Instant) -> Result<String, BridgeError> {
        let mut buf = Vec::new();
        let mut chunk = [0_u8; 4096];

        loop {
            let remaining = self
                .timeout
                .checked_sub(started.elapsed())
                .filter(|left| !left.is_zero())
                .ok_or(BridgeError::Timeout {
                    after: self.timeout,
                })?;
            stream
                .set_read_timeout(Some(remaining))
                .map_err(BridgeError::Communication)?;

            match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    let slice = &chunk[..n];
                    if let Some(newline) = slice.iter().position(|b| *b == b'\n') {
                        buf.extend_from_slice(&slice[..newline]);
                        break;
                    }
                    buf.extend_from_slice(slice);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) if is_timeout_kind(err.kind()) => {
                    return Err(BridgeError::Timeout {
                        after: self.timeout,
                    });
                }
                Err(err) => return Err(BridgeError::Communication(err)),
            }
        }

        if buf.iter().all(u8::is_ascii_whitespace) {
            return Err(BridgeError::NoResponse);
        }
        String::from_utf8(buf).map_err(|err| {
            BridgeError::Communication(io::Error::new(io::ErrorKind::InvalidData, err))
        })
    }
}

impl CommandTransport for BlenderConnection {
    fn send_command(&self, command: &Command) -> Result<Response, BridgeError> {
        let line = command.encode_line().map_err(BridgeError::Encode)?;
        debug!(target: "blendmcp::connection", kind = %command.kind, addr = %self.address(), "sending command");

        let mut stream = self.connect()?;
        let started = Instant::now();
        stream
            .set_write_timeout(Some(self.timeout))
            .map_err(BridgeError::Communication)?;
        stream.write_all(line.as_bytes()).map_err(|err| {
            if is_timeout_kind(err.kind()) {
                BridgeError::Timeout {
                    after: self.timeout,
                }
            } else {
                BridgeError::Communication(err)
            }
        })?;
        stream.flush().map_err(BridgeError::Communication)?;

        let raw = self.read_line(&mut stream, started)?;
        let response = Response::decode_line(&raw).map_err(BridgeError::InvalidResponse)?;
        debug!(target: "blendmcp::connection", status = %response.status, elapsed_ms = started.elapsed().as_millis() as u64, "received response");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::{BlenderConnection, CommandTransport, DEFAULT_PORT};
    use crate::error::BridgeError;
    use crate::protocol::{Command, Response};
    use serde_json::json;
    use std::cell::RefCell;
    use std::time::Duration;

    struct Scripted {
        reply: Result<Response, fn() -> BridgeError>,
        seen: RefCell<Vec<Command>>,
    }

    impl CommandTransport for Scripted {
        fn send_command(&self, command: &Command) -> Result<Response, BridgeError> {
            self.seen.borrow_mut().push(command.clone());
            match &self.reply {
                Ok(response) => Ok(response.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn replying(status: &str, result: &str) -> Scripted {
        Scripted {
            reply: Ok(Response {
                status: status.to_string(),
                result: Some(json!(result)),
                ..Response::default()
            }),
            seen: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn defaults() {
        let conn = BlenderConnection::default();
        assert_eq!(conn.address(), format!("localhost:{DEFAULT_PORT}"));
        assert_eq!(conn.timeout, Duration::from_secs(30));
        assert_eq!(conn.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn ping_success_and_failure() {
        let ok = replying("success", "");
        assert!(ok.test_connection());
        assert_eq!(ok.seen.borrow()[0], Command::ping());

        let not_ok = replying("error", "");
        assert!(!not_ok.test_connection());

        let broken = Scripted {
            reply: Err(|| BridgeError::NoResponse),
            seen: RefCell::new(Vec::new()),
        };
        assert!(!broken.test_connection());
    }

    #[test]
    fn execute_script_wraps_code() {
        let transport = replying("success", "out");
        let response = transport.execute_script("print('x')").expect("send should work");
        assert_eq!(response.output(), "out");
        assert_eq!(transport.seen.borrow()[0], Command::execute_code("print('x')"));
    }

    #[test]
    fn blender_info_parses_result_line() {
        let transport = replying(
            "success",
            "RESULT: {'version': '4.1.0', 'scene_name': 'Scene'}\n",
        );
        let info = transport.blender_info().expect("info should work");
        assert_eq!(info, json!({"version": "4.1.0", "scene_name": "Scene"}));

        let sent = transport.seen.borrow();
        let code = sent[0].params["code"].as_str().expect("code is a string");
        assert!(code.starts_with("import bpy\nimport json\n\n"));
        assert!(code.contains("print(\"RESULT:\", json.dumps(info))"));
    }

    #[test]
    fn blender_info_placeholder_on_unparseable_output() {
        for transport in [
            replying("success", "no marker"),
            replying("success", "RESULT: <bpy_struct>"),
            replying("error", "RESULT: {'version': '4.1.0'}"),
        ] {
            let info = transport.blender_info().expect("info should not fail");
            assert_eq!(info, json!({"error": "Failed to get Blender info"}));
        }
    }

    #[test]
    fn blender_info_propagates_transport_errors() {
        let transport = Scripted {
            reply: Err(|| BridgeError::NoResponse),
            seen: RefCell::new(Vec::new()),
        };
        assert!(matches!(transport.blender_info(), Err(BridgeError::NoResponse)));
    }
}
