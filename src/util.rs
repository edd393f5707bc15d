//! Small helpers that don't belong to any particular part of the emulator.

pub mod bit_splitter;
