// This is free and unencumbered software released into the public domain.

#![deny(unsafe_code)]

extern crate alloc;

pub mod cli;
pub mod shared;
