//! UDP syslog sink (RFC 3164 framing)
//!
//! Each formatted event becomes one datagram:
//! `<PRI>Mmm dd hh:mm:ss TAG[PID]: message`.

use std::io::{self, Write};
use std::net::UdpSocket;
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

/// `user-level messages` facility
const FACILITY_USER: u8 = 1;

/// Map a tracing level to a syslog severity
pub fn severity(level: &Level) -> u8 {
    match *level {
        Level::ERROR => 3,
        Level::WARN => 4,
        Level::INFO => 6,
        Level::DEBUG | Level::TRACE => 7,
    }
}

/// [`MakeWriter`] sending one datagram per event to a syslog server
#[derive(Debug)]
pub struct SyslogMakeWriter {
    socket: UdpSocket,
    tag: String,
    pid: u32,
}

impl SyslogMakeWriter {
    /// Bind an ephemeral local socket and connect it to `server:port`
    pub fn connect(server: &str, port: u16, tag: impl Into<String>) -> io::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        socket.connect((server, port))?;

        Ok(Self {
            socket,
            tag: tag.into(),
            pid: std::process::id(),
        })
    }

    fn message(&self, severity: u8) -> SyslogMessage<'_> {
        SyslogMessage {
            sink: self,
            severity,
            buf: Vec::new(),
        }
    }
}

impl<'a> MakeWriter<'a> for SyslogMakeWriter {
    type Writer = SyslogMessage<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        self.message(severity(&Level::INFO))
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        self.message(severity(meta.level()))
    }
}

/// Buffer for one event, sent when dropped
pub struct SyslogMessage<'a> {
    sink: &'a SyslogMakeWriter,
    severity: u8,
    buf: Vec<u8>,
}

impl Write for SyslogMessage<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for SyslogMessage<'_> {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }

        let body = String::from_utf8_lossy(&self.buf);
        let packet = format!(
            "<{}>{} {}[{}]: {}",
            FACILITY_USER * 8 + self.severity,
            chrono::Local::now().format("%b %e %H:%M:%S"),
            self.sink.tag,
            self.sink.pid,
            body.trim_end()
        );
        // Syslog delivery is best effort.
        let _ = self.sink.socket.send(packet.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_severity_mapping() {
        assert_eq!(severity(&Level::ERROR), 3);
        assert_eq!(severity(&Level::WARN), 4);
        assert_eq!(severity(&Level::INFO), 6);
        assert_eq!(severity(&Level::TRACE), 7);
    }

    #[test]
    fn test_event_is_sent_as_one_datagram() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        server.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let port = server.local_addr().unwrap().port();

        let sink = SyslogMakeWriter::connect("127.0.0.1", port, "ha-test").unwrap();
        {
            let mut writer = sink.make_writer();
            writer.write_all(b"node srvnode-1 ").unwrap();
            writer.write_all(b"is online\n").unwrap();
        }

        let mut buf = [0u8; 512];
        let n = server.recv(&mut buf).unwrap();
        let packet = std::str::from_utf8(&buf[..n]).unwrap();

        assert!(packet.starts_with("<14>"), "{}", packet);
        assert!(
            packet.ends_with(&format!("ha-test[{}]: node srvnode-1 is online", std::process::id())),
            "{}",
            packet
        );
    }
}
