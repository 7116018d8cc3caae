use crate::error::{Error, Result};
use crate::routing::{Command, Dispatcher, Value, accept_array};

use std::time::Duration;

impl Dispatcher {
    /// BLPOP on a single list.
    ///
    /// A shard that does not hold the list blocks for `timeout` and answers
    /// nil, so only an array reply proves ownership. Discovery therefore takes
    /// the full `timeout` on every round where some shard stays empty.
    /// A zero `timeout` blocks forever on servers that hold nothing.
    ///
    /// # Returns
    /// * The popped element.
    /// * `Error::Timeout` if nothing was popped, whether or not the key was
    ///   already mapped.
    pub async fn blpop(&self, key: &str, timeout: Duration) -> Result<Vec<u8>> {
        let cmd = Command::new("BLPOP", key).arg(timeout_arg(timeout));

        match self.dispatch_with(cmd, accept_array()).await {
            Ok(Value::Array(items)) => popped_element(items),
            Ok(Value::Nil) | Err(Error::NoMappingDetermined { .. }) => Err(Error::Timeout {
                key: key.to_string(),
            }),
            Ok(other) => Err(Error::UnexpectedReply(format!(
                "BLPOP returned {:?}",
                other
            ))),
            Err(e) => Err(e),
        }
    }
}

/// Seconds as the server expects them: `5`, `0.5`.
fn timeout_arg(timeout: Duration) -> String {
    format!("{}", timeout.as_secs_f64())
}

/// BLPOP answers `[list, element]`.
fn popped_element(items: Vec<Value>) -> Result<Vec<u8>> {
    match items.into_iter().nth(1) {
        Some(Value::Bulk(element)) => Ok(element),
        other => Err(Error::UnexpectedReply(format!(
            "BLPOP element was {:?}",
            other
        ))),
    }
}
