//! Line-based operator I/O.

use async_trait::async_trait;
use droneloop_types::DroneError;

/// The human operator's terminal.
///
/// Single operator, single session: there is never more than one
/// outstanding prompt.
#[async_trait]
pub trait OperatorConsole: Send {
    /// Show a line of output to the operator.
    fn display(&mut self, line: &str);

    /// Show `prompt` and wait for one line of input.
    ///
    /// Returns `Ok(None)` when the input stream has ended.
    async fn prompt(&mut self, prompt: &str) -> Result<Option<String>, DroneError>;
}
