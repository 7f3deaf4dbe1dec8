//! Infrastructure adapters. Storage for attachment files lives here.

pub mod storage;
