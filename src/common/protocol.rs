//! # Response Protocol
//!
//! The request frame carries the raw image bytes untouched. The response frame
//! starts with a status tag so a client can tell a result from a failure:
//!
//! ```text
//! success: [0x00] [PNG bytes ...]
//! failure: [0x01] [error code: u8] [UTF-8 message ...]
//! ```

/// Tag byte of a successful response.
pub const TAG_OK: u8 = 0x00;
/// Tag byte of an error response.
pub const TAG_ERROR: u8 = 0x01;

/// Failure categories reported in an error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    Transport = 1,
    Decode = 2,
    Encode = 3,
    Timeout = 4,
    Internal = 5,
}

impl ErrorCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(ErrorCode::Transport),
            2 => Some(ErrorCode::Decode),
            3 => Some(ErrorCode::Encode),
            4 => Some(ErrorCode::Timeout),
            5 => Some(ErrorCode::Internal),
            _ => None,
        }
    }
}

/// Payload of the single response frame sent per connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// PNG-encoded binary edge mask.
    Edges(Vec<u8>),
    /// The request could not be served.
    Failure { code: ErrorCode, message: String },
}

impl Response {
    /// Serialize into a response frame payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Response::Edges(png) => {
                let mut bytes = Vec::with_capacity(1 + png.len());
                bytes.push(TAG_OK);
                bytes.extend_from_slice(png);
                bytes
            }
            Response::Failure { code, message } => {
                let mut bytes = Vec::with_capacity(2 + message.len());
                bytes.push(TAG_ERROR);
                bytes.push(*code as u8);
                bytes.extend_from_slice(message.as_bytes());
                bytes
            }
        }
    }

    /// Parse a response frame payload.
    ///
    /// Invalid UTF-8 in an error message is replaced rather than rejected;
    /// the code is what matters to the caller.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        match bytes.split_first() {
            Some((&TAG_OK, png)) => Ok(Response::Edges(png.to_vec())),
            Some((&TAG_ERROR, rest)) => {
                let (&raw_code, message) = rest
                    .split_first()
                    .ok_or_else(|| "error response without a code".to_string())?;
                let code = ErrorCode::from_u8(raw_code)
                    .ok_or_else(|| format!("unknown error code {}", raw_code))?;
                Ok(Response::Failure {
                    code,
                    message: String::from_utf8_lossy(message).into_owned(),
                })
            }
            Some((tag, _)) => Err(format!("unknown response tag {:#04x}", tag)),
            None => Err("empty response".to_string()),
        }
    }
}
