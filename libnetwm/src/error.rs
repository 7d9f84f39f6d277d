use std::error::Error as StdError;
use std::fmt;

/// `NetwmResult<T>` provides a simplified result type with a common error type
pub type NetwmResult<T> = std::result::Result<T, ErrorWrapper>;

/// NetwmError defines all the internal errors that `libnetwm` might return
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum NetwmError {
    AtomNotInterned(String),
    InvalidDirection(u32),
    InvalidWinState(String),
    InvalidWinType(String),
    NoSuchScreen(usize),
    WindowNotManaged(u32),
}
impl std::error::Error for NetwmError {}
impl fmt::Display for NetwmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            NetwmError::AtomNotInterned(ref err) => write!(f, "mandatory atom {} could not be interned", err),
            NetwmError::InvalidDirection(ref err) => write!(f, "invalid move resize direction was given: {}", err),
            NetwmError::InvalidWinState(ref err) => write!(f, "invalid state was given: {}", err),
            NetwmError::InvalidWinType(ref err) => write!(f, "invalid type was given: {}", err),
            NetwmError::NoSuchScreen(ref err) => write!(f, "screen {} does not exist", err),
            NetwmError::WindowNotManaged(ref err) => write!(f, "window {:#x} is not managed yet", err),
        }
    }
}

/// ErrorWrapper provides wrapper around all the underlying library dependencys that `libnetwm` uses
/// such that we can easily surface all errors from `libnetwm` in a single easy way.
#[derive(Debug)]
pub enum ErrorWrapper {
    Netwm(NetwmError),

    // std::str::Utf8Error
    Utf8(std::str::Utf8Error),

    // x11rb errors
    Connect(x11rb::errors::ConnectError),
    Connection(x11rb::errors::ConnectionError),
    Reply(x11rb::errors::ReplyError),
}
impl ErrorWrapper {
    /// Implemented directly on the `Error` type to reduce casting required
    pub fn is<T: StdError + 'static>(&self) -> bool {
        self.as_ref().is::<T>()
    }

    /// Implemented directly on the `Error` type to reduce casting required
    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.as_ref().downcast_ref::<T>()
    }

    /// Returns the protocol level error if this is one
    pub fn netwm(&self) -> Option<&NetwmError> {
        match self {
            ErrorWrapper::Netwm(err) => Some(err),
            _ => None,
        }
    }
}
impl StdError for ErrorWrapper {}

impl fmt::Display for ErrorWrapper {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ErrorWrapper::Netwm(ref err) => write!(f, "{}", err),
            ErrorWrapper::Utf8(ref err) => write!(f, "{}", err),
            ErrorWrapper::Connect(ref err) => write!(f, "{}", err),
            ErrorWrapper::Connection(ref err) => write!(f, "{}", err),
            ErrorWrapper::Reply(ref err) => write!(f, "{}", err),
        }
    }
}

impl AsRef<dyn StdError> for ErrorWrapper {
    fn as_ref(&self) -> &(dyn StdError + 'static) {
        match *self {
            ErrorWrapper::Netwm(ref err) => err,
            ErrorWrapper::Utf8(ref err) => err,
            ErrorWrapper::Connect(ref err) => err,
            ErrorWrapper::Connection(ref err) => err,
            ErrorWrapper::Reply(ref err) => err,
        }
    }
}

impl From<NetwmError> for ErrorWrapper {
    fn from(err: NetwmError) -> ErrorWrapper {
        ErrorWrapper::Netwm(err)
    }
}

impl From<std::str::Utf8Error> for ErrorWrapper {
    fn from(err: std::str::Utf8Error) -> ErrorWrapper {
        ErrorWrapper::Utf8(err)
    }
}

// x11rb errors
//--------------------------------------------------------------------------------------------------
impl From<x11rb::errors::ConnectError> for ErrorWrapper {
    fn from(err: x11rb::errors::ConnectError) -> ErrorWrapper {
        ErrorWrapper::Connect(err)
    }
}

impl From<x11rb::errors::ConnectionError> for ErrorWrapper {
    fn from(err: x11rb::errors::ConnectionError) -> ErrorWrapper {
        ErrorWrapper::Connection(err)
    }
}

impl From<x11rb::errors::ReplyError> for ErrorWrapper {
    fn from(err: x11rb::errors::ReplyError) -> ErrorWrapper {
        ErrorWrapper::Reply(err)
    }
}
