//! Framing methods that mark where one serialized event ends in a byte
//! stream.

mod character_delimited;
mod newline_delimited;

pub use character_delimited::CharacterDelimitedEncoder;
pub use newline_delimited::NewlineDelimitedEncoder;
