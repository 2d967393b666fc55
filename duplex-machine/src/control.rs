/// Control value returned by a machine stage
pub enum Control<State, Ret> {
    /// Run the same stage again with a new state
    Loop(State),
    /// Leave the stage, handing the value to the next one
    Return(Ret),
}

impl<State, Ret> Control<State, Ret> {
    /// `true` if the stage is going to run again
    pub fn is_loop(&self) -> bool {
        matches!(self, Control::Loop(_))
    }
}
