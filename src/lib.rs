#![forbid(unsafe_code)]

//! Pack a directory tree into a single container file and back.
//!
//! The default container is a line-oriented text file that stays readable
//! in any editor; a length-prefixed framed layout is available for trees
//! whose contents should not be scanned for markers.

pub mod logging;
pub mod pack;

pub use pack::{
    extract, pack, unpack, verify, Container, Content, Entry, Layout, PackError, PackOptions,
    PackResult, ParseMode, UnpackOptions,
};
