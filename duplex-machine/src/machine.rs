use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures::Future;

use crate::{control::Control, stage::Stage};

/// State machine constructor
pub struct Machine<St> {
    state: Option<St>,
}

impl<St: Send + 'static> Machine<St> {
    /// Init machine with a **state**
    pub fn init(state: St) -> Self {
        Self { state: Some(state) }
    }

    /// Add machine stage
    pub fn then<NRet, NFut>(self, func: fn(St) -> NFut) -> Stage<St, NRet, NFut>
    where
        NRet: 'static,
        NFut: Future<Output = Control<St, NRet>> + Send + 'static,
    {
        Stage::chain(Box::pin(self), func)
    }
}

impl<St> Future for Machine<St> {
    type Output = St;

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.state.take() {
            Some(state) => Poll::Ready(state),
            None => panic!("Machine polled after completion"),
        }
    }
}

impl<St> Unpin for Machine<St> {}
