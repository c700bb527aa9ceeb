use alloc::string::String;
use core::fmt::{Debug, Display};

macro_rules! enum_variant_stringify {
    ($self:expr, [$($var:ident),+]) => {
        match $self {
            $(
               $var => stringify!($var),
            )+
            _ => "",
        }
    }
}

pub trait CromixErrorConvertible: Debug {
    /// Wraps a device error. Device errors are always reported as an unavailable block.
    fn into_cromix_error(self) -> CromixError<Self>
    where
        Self: Sized,
    {
        return CromixError::BlockUnavailable(self);
    }
}

/// Errors that abort the operation in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CromixError<E> {
    InvalidFilesystem,
    InvalidBlockSize,
    InodeOutOfBounds(u16),
    InodeNotFound(String),
    NotADirectory(String),
    IsADirectory(String),
    FreeListExhausted,
    NoFreeInode,
    StructuralCorruption(u32),
    FileTooLarge,
    InvalidFileName,
    EntryExists(String),
    UnknownGeometry(String),
    DeviceTooSmall,
    HostError(String),
    BlockUnavailable(E),
}

impl<E: Display> core::fmt::Display for CromixError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use CromixError::*;

        match self {
            BlockUnavailable(e) => write!(f, "Block unavailable: {}", e),
            InodeOutOfBounds(n) => write!(f, "Inode {} is out of bounds", n),
            InodeNotFound(path) => write!(f, "No such file or directory: {}", path),
            NotADirectory(path) => write!(f, "Not a directory: {}", path),
            IsADirectory(path) => write!(f, "Is a directory: {}", path),
            StructuralCorruption(block) => write!(f, "Structural corruption at block {}", block),
            EntryExists(name) => write!(f, "An entry named \"{}\" already exists", name),
            UnknownGeometry(label) => write!(f, "Unknown geometry: {}", label),
            HostError(message) => write!(f, "Host error: {}", message),
            _ => write!(
                f,
                "{}",
                enum_variant_stringify!(
                    self,
                    [
                        InvalidFilesystem,
                        InvalidBlockSize,
                        FreeListExhausted,
                        NoFreeInode,
                        FileTooLarge,
                        InvalidFileName,
                        DeviceTooSmall
                    ]
                )
            ),
        }
    }
}
