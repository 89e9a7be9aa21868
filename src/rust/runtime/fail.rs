// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use ::libc::{
    c_int,
    EAGAIN,
    EBADMSG,
    EINVAL,
    EIO,
    EMSGSIZE,
    ENOBUFS,
    EPROTO,
};
use ::std::{
    error,
    fmt,
    io,
};

//==============================================================================
// Structures
//==============================================================================

/// Kinds of failures reported by a control block.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailKind {
    /// An argument is out of its valid range.
    InvalidArgument,
    /// A message needs more fragments than the fragment field can count.
    TooManyFragments,
    /// An incoming datagram is truncated or carries an unknown command.
    MalformedInput,
    /// An incoming datagram belongs to another conversation.
    ForeignConversation,
    /// No complete message is available yet.
    WouldBlock,
    /// The caller's buffer cannot hold the next message.
    BufferTooSmall,
    /// Any other I/O related failure.
    Io,
}

/// Failure
#[derive(Clone)]
pub struct Fail {
    /// Error code.
    pub errno: c_int,
    /// Cause.
    pub cause: String,
}

//==============================================================================
// Associate Functions
//==============================================================================

/// Associate Functions for Failures
impl Fail {
    /// Creates a new Failure
    pub fn new(errno: i32, cause: &str) -> Self {
        Self {
            errno,
            cause: cause.to_string(),
        }
    }

    /// Creates a failure of the given kind.
    pub fn from_kind(kind: FailKind, cause: &str) -> Self {
        Self::new(kind.errno(), cause)
    }

    /// Classifies the target failure.
    pub fn kind(&self) -> FailKind {
        match self.errno {
            EINVAL => FailKind::InvalidArgument,
            EMSGSIZE => FailKind::TooManyFragments,
            EBADMSG => FailKind::MalformedInput,
            EPROTO => FailKind::ForeignConversation,
            EAGAIN => FailKind::WouldBlock,
            ENOBUFS => FailKind::BufferTooSmall,
            _ => FailKind::Io,
        }
    }
}

impl FailKind {
    /// Error code used for failures of the target kind.
    pub fn errno(self) -> c_int {
        match self {
            FailKind::InvalidArgument => EINVAL,
            FailKind::TooManyFragments => EMSGSIZE,
            FailKind::MalformedInput => EBADMSG,
            FailKind::ForeignConversation => EPROTO,
            FailKind::WouldBlock => EAGAIN,
            FailKind::BufferTooSmall => ENOBUFS,
            FailKind::Io => EIO,
        }
    }
}

//==============================================================================
// Trait Implementations
//==============================================================================

/// Display Trait Implementation for Failures
impl fmt::Display for Fail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error {:?}: {:?}", self.errno, self.cause)
    }
}

/// Debug trait Implementation for Failures
impl fmt::Debug for Fail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error {:?} ({:?}): {:?}", self.errno, self.kind(), self.cause)
    }
}

/// Error Trait Implementation for Failures
impl error::Error for Fail {}

/// Conversion Trait Implementation for Fail
impl From<io::Error> for Fail {
    fn from(_: io::Error) -> Self {
        Self {
            errno: EIO,
            cause: "I/O error".to_string(),
        }
    }
}

//==============================================================================
// Unit Tests
//==============================================================================
