use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Streams whitespace-separated tokens out of a reader, one line at a time.
///
/// Neither the description nor the parameter format has separators beyond
/// whitespace, so a token's meaning depends only on its position.
pub struct Tokens<R> {
    reader: R,
    pending: VecDeque<String>,
    consumed: usize,
}

impl<R: BufRead> Tokens<R> {
    pub fn new(reader: R) -> Tokens<R> {
        Tokens { reader, pending: VecDeque::new(), consumed: 0 }
    }

    /// Tokens handed out so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Next raw token, or `None` at end of stream.
    pub fn next_token(&mut self) -> Result<Option<String>> {
        while self.pending.is_empty() {
            let mut line = String::new();
            let read = self.reader.read_line(&mut line).map_err(|e| match e.kind() {
                io::ErrorKind::InvalidData => {
                    Error::malformed(format!("text after token {} is not valid UTF-8", self.consumed))
                }
                _ => Error::Io(e),
            })?;
            if read == 0 {
                return Ok(None);
            }
            self.pending.extend(line.split_whitespace().map(str::to_owned));
        }
        self.consumed += 1;
        Ok(self.pending.pop_front())
    }

    /// Next token parsed as `T`; running out is an error naming `what`.
    pub fn expect<T: FromStr>(&mut self, what: &str) -> Result<T> {
        let position = self.consumed + 1;
        let token = self.next_token()?.ok_or_else(|| {
            Error::malformed(format!("stream ended at token {position}, expected {what}"))
        })?;
        token.parse().map_err(|_| {
            Error::malformed(format!("token {position} ({token:?}) is not a valid {what}"))
        })
    }

    /// Fails if anything but whitespace is left.
    pub fn finish(mut self, what: &str) -> Result<()> {
        let read = self.consumed;
        match self.next_token()? {
            None => Ok(()),
            Some(token) => Err(Error::malformed(format!(
                "{what}: unexpected trailing token {token:?} after {read} tokens"
            ))),
        }
    }
}
