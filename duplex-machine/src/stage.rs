use std::{
    marker::PhantomData,
    pin::Pin,
    task::{Context, Poll},
};

use futures::{Future, FutureExt};

use crate::control::Control;

type PrevFuture<St> = Pin<Box<dyn Future<Output = St> + Send>>;

enum Progress<St, Fut> {
    /// Waiting for the previous stage to hand over its value
    Prev(PrevFuture<St>),
    /// Current step future. Kept across polls, so a step may suspend
    Step(Pin<Box<Fut>>),
    Done,
}

/// Machine stage. Runs `func` until it returns [Control::Return]
pub struct Stage<St, Ret, Fut>
where
    Fut: Future<Output = Control<St, Ret>>,
{
    progress: Progress<St, Fut>,
    func: fn(St) -> Fut,
    _ret: PhantomData<fn() -> Ret>,
}

impl<St: 'static, Ret: 'static, Fut> Stage<St, Ret, Fut>
where
    Fut: Future<Output = Control<St, Ret>> + Send + 'static,
{
    pub(crate) fn chain(prev: PrevFuture<St>, func: fn(St) -> Fut) -> Self {
        Self {
            progress: Progress::Prev(prev),
            func,
            _ret: PhantomData,
        }
    }

    /// Add machine stage, which receives the return value of the current one
    pub fn then<NRet, NFut>(self, func: fn(Ret) -> NFut) -> Stage<Ret, NRet, NFut>
    where
        NRet: 'static,
        NFut: Future<Output = Control<Ret, NRet>> + Send + 'static,
    {
        Stage::chain(Box::pin(self), func)
    }

    /// Handle final machine result
    pub fn ret<NRet>(self, func: fn(Ret) -> NRet) -> impl Future<Output = NRet> + Send
    where
        NRet: 'static,
    {
        self.map(move |value| func(value))
    }
}

impl<St, Ret, Fut> Future for Stage<St, Ret, Fut>
where
    Fut: Future<Output = Control<St, Ret>>,
{
    type Output = Ret;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        loop {
            let control = match &mut this.progress {
                Progress::Prev(prev) => match prev.as_mut().poll(cx) {
                    Poll::Ready(state) => {
                        this.progress = Progress::Step(Box::pin((this.func)(state)));
                        continue;
                    }
                    Poll::Pending => return Poll::Pending,
                },
                Progress::Step(step) => match step.as_mut().poll(cx) {
                    Poll::Ready(control) => control,
                    Poll::Pending => return Poll::Pending,
                },
                Progress::Done => panic!("Stage polled after completion"),
            };

            match control {
                Control::Loop(state) => this.progress = Progress::Step(Box::pin((this.func)(state))),
                Control::Return(ret) => {
                    this.progress = Progress::Done;
                    return Poll::Ready(ret);
                }
            }
        }
    }
}

impl<St, Ret, Fut> Unpin for Stage<St, Ret, Fut> where Fut: Future<Output = Control<St, Ret>> {}
