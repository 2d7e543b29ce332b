use std::ffi::NulError;

use pgtrack_abi::ValueType;
use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, TrackError>;

#[derive(ThisError, Debug)]
pub enum TrackError {
    #[error("IO Error")]
    IoError(#[from] std::io::Error),
    #[error("DlOpen Error")]
    DlOpenError(#[from] dlopen2::Error),
    #[error("Null Error")]
    NulError(#[from] NulError),
    #[error("{0}: not a pg_track module (magic 0x{1:08x})")]
    BadMagic(String, u32),
    #[error("{0}: module requires ABI version {1}, host implements {2}")]
    UnsupportedAbi(String, u32, u32),
    #[error("{0}: ABI layout mismatch in {1}")]
    LayoutMismatch(String, &'static str),
    #[error("module manifest is malformed: {0}")]
    BadManifest(&'static str),
    #[error("function '{0}' registered more than once")]
    DuplicateFunction(String),
    #[error("no function registered under name '{0}'")]
    UnknownFunction(String),
    #[error("{0}: takes {1} arguments, {2} given")]
    ArityMismatch(String, usize, usize),
    #[error("{0}: argument {1} must be {2:?}")]
    ArgumentTypeMismatch(String, usize, ValueType),
    #[error("{0}: declared to return {1:?} but produced {2:?}")]
    ReturnTypeMismatch(String, ValueType, ValueType),
    #[error("{0}: returned a null datum")]
    NullDatum(String),
    #[error("cannot parse '{1}' as {0:?}")]
    InvalidArgument(ValueType, String),
}
