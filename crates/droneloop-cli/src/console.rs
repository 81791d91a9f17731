//! Terminal implementation of [`OperatorConsole`].

use std::io::Write;

use async_trait::async_trait;
use colored::Colorize;
use droneloop_kernel::OperatorConsole;
use droneloop_types::DroneError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

/// Line-based console over stdout and an async line reader (stdin by
/// default).
pub struct TerminalConsole<R = BufReader<Stdin>> {
    lines: Lines<R>,
}

impl TerminalConsole {
    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> TerminalConsole<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

fn io_error(e: std::io::Error) -> DroneError {
    DroneError::OperatorIo(e.to_string())
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> OperatorConsole for TerminalConsole<R> {
    fn display(&mut self, line: &str) {
        println!("  {line}");
    }

    async fn prompt(&mut self, prompt: &str) -> Result<Option<String>, DroneError> {
        print!("  {} ", format!("{prompt} ›").bold().cyan());
        std::io::stdout().flush().map_err(io_error)?;
        self.lines.next_line().await.map_err(io_error)
    }
}
