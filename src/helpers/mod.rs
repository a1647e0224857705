//! Low-level readers for the legacy Excel container and record formats.
pub(crate) mod biff8;
pub(crate) mod cfb;
pub(crate) mod string;
