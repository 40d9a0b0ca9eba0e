//! matscript: compiler and runtime decoder for material scripts.
//!
//! Source text is lexed, parsed and translated into a compact binary stream
//! ([`compiler`]); the [`runtime`] decodes that stream back into the object
//! graph described in [`resource`].

pub mod compiler;
pub mod opcode;
pub mod resource;
pub mod runtime;
pub mod script;
pub mod translate;
pub mod wire;
