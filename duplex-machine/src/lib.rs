//! # Duplex state machine
//!
//! Flat state machine used by the duplex call handlers.
//!
//! A machine is a chain of stages. Each stage is an async function, which receives the current state
//! and either loops with a new state ([control::Control::Loop]) or hands a value over to the next stage
//! ([control::Control::Return]). A stage may suspend at any point, so a handler can keep a live call
//! inside its state and await socket reads in between transitions.
//!
//! # Examples
//! ```rust
//! use duplex_machine::{control::Control, machine::Machine};
//!
//! async fn up_to_45(value: i32) -> Control<i32, i32> {
//!     if value < 45 {
//!         Control::Loop(value + 1)
//!     } else {
//!         Control::Return(value)
//!     }
//! }
//!
//! fn hello(value: i32) -> String {
//!     format!("Hello {value}!")
//! }
//!
//! async fn example() {
//!     let mach = Machine::init(42).then(up_to_45).ret(hello);
//!
//!     assert_eq!("Hello 45!", mach.await);
//! }
//! ```
pub mod control;
pub mod machine;
pub mod stage;

pub use control::Control;
pub use machine::Machine;
