//! The turn pipeline: where model output meets the client.
//!
//! One turn flows like this:
//!
//! 1. **Open** the turn on the injected [`ModelSource`](veilstream_core::ModelSource)
//! 2. **Filter** every text chunk through the turn's own `StreamFilter`
//! 3. **Describe** tool calls as `tool_usage` frames
//! 4. **Encode** each frame as one wire line, in order
//! 5. **Finish** with a flush and a `meta` frame, or an `error` frame
//!
//! The pipeline never shares a filter between turns and holds no global state.

pub mod describe;
pub mod scripted;
pub mod turn;

pub use describe::describe_tool;
pub use scripted::{ScriptStep, ScriptedSource};
pub use turn::TurnStreamer;
