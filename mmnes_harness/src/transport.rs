use std::io;
use std::io::{BufRead, Write};
use log::{debug, info, trace};
use crate::command::Command;
use crate::dispatcher::dispatch;
use crate::harness_error::HarnessError;
use crate::response::Response;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Quit,
    EndOfInput,
}

/// Line-delimited JSON over a reader/writer pair: one response per input line, in order.
pub struct Transport<R: BufRead, W: Write> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> Transport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Transport { reader, writer }
    }

    #[cfg(test)]
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Serve commands until `quit` or end of input. Only I/O failures on the writer or reader escape.
    pub fn run(&mut self, session: &mut Session) -> io::Result<SessionEnd> {
        self.send(&Response::Ready)?;
        info!("harness ready");

        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            if self.reader.read_until(b'\n', &mut buffer)? == 0 {
                debug!("end of input");
                return Ok(SessionEnd::EndOfInput);
            }

            let response = Transport::<R, W>::handle_line(session, &buffer);
            self.send(&response)?;

            if response == Response::Quit {
                return Ok(SessionEnd::Quit);
            }
        }
    }

    fn handle_line(session: &mut Session, raw: &[u8]) -> Response {
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim_end_matches('\n').trim_end_matches('\r'),
            Err(e) => return Response::from(HarnessError::invalid_json(e)),
        };
        trace!("<- {}", line);

        match Command::parse(line) {
            Ok(command) => dispatch(session, &command),
            Err(error) => Response::from(error),
        }
    }

    fn send(&mut self, response: &Response) -> io::Result<()> {
        let json = response.to_json().map_err(io::Error::other)?;
        trace!("-> {}", json);

        writeln!(self.writer, "{}", json)?;
        self.writer.flush()
    }
}
