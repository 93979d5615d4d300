// lemur-vm - Call frames for the VM
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Call frames.
//!
//! A frame is the activation record of one in-progress call: the closure
//! being executed, the instruction pointer into its bytecode, and the
//! base pointer marking where the frame's locals start on the value stack.

use std::rc::Rc;

use lemur_core::code::Instructions;
use lemur_core::value::Closure;

/// A call frame on the VM's frame stack.
#[derive(Debug)]
pub struct Frame {
    pub closure: Rc<Closure>,
    /// Byte offset into the closure's instructions. Starts at -1 so the
    /// dispatch loop's pre-increment lands on byte 0.
    pub ip: i64,
    /// Stack index of the frame's first local slot. Parameters occupy
    /// `base_pointer..base_pointer + num_parameters`.
    pub base_pointer: usize,
}

impl Frame {
    /// Create a frame for a closure about to run.
    #[must_use]
    pub fn new(closure: Rc<Closure>, base_pointer: usize) -> Frame {
        Frame {
            closure,
            ip: -1,
            base_pointer,
        }
    }

    /// The instruction stream this frame executes.
    #[must_use]
    pub fn instructions(&self) -> &Instructions {
        &self.closure.func.instructions
    }
}
