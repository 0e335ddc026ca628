use futures::{
    future::{BoxFuture, FutureExt},
    task::{waker_ref, ArcWake},
};
use futures_channel::oneshot;
use queues::{IsQueue, Queue};
use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, PoisonError},
    task::{Context, Poll},
};

use crate::{TbError, TbResult};

type ReadyQueue = Arc<Mutex<Queue<Arc<Task>>>>;

/// Single-threaded executor for the tasks of one scenario.
///
/// Woken tasks are queued and polled by [`Executor::run_until_stalled`]; the
/// kernel calls it once per simulation phase.
#[derive(Clone)]
pub(crate) struct Executor {
    ready: ReadyQueue,
}

impl Executor {
    pub fn new() -> Self {
        Self {
            ready: Arc::new(Mutex::new(Queue::new())),
        }
    }

    pub fn spawn(
        &self,
        future: impl Future<Output = TbResult> + Send + 'static,
        name: &str,
    ) -> JoinHandle {
        let (tx, rx) = oneshot::channel::<TbResult>();
        let task = Arc::new(Task {
            future: Mutex::new(Some(future.boxed())),
            state: Mutex::new(TaskState::Pending),
            join_tx: Mutex::new(Some(tx)),
            ready: self.ready.clone(),
        });
        schedule(&task);
        JoinHandle {
            name: name.to_string(),
            task: Some(task),
            join_rx: rx,
        }
    }

    pub fn run_until_stalled(&self) {
        while let Some(task) = self.next_task() {
            task.process();
        }
    }

    fn next_task(&self) -> Option<Arc<Task>> {
        // lock only for the pop, a polled task may reschedule itself
        let mut queue = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        queue.remove().ok()
    }

    /// Drops every queued task.
    pub fn clear(&self) {
        *self.ready.lock().unwrap_or_else(PoisonError::into_inner) = Queue::new();
    }
}

fn schedule(task: &Arc<Task>) {
    let mut queue = task.ready.lock().unwrap_or_else(PoisonError::into_inner);
    // Queue::add only fails on capacity-bounded queues
    let _ = queue.add(task.clone());
}

#[derive(PartialEq, Clone, Copy, Debug)]
enum TaskState {
    Pending,
    Done,
    Cancelled,
}

pub struct Task {
    future: Mutex<Option<BoxFuture<'static, TbResult>>>,
    state: Mutex<TaskState>,
    join_tx: Mutex<Option<oneshot::Sender<TbResult>>>,
    ready: ReadyQueue,
}

impl Task {
    pub fn cancel(&self) {
        // executor drops the future on its next wake-up
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = TaskState::Cancelled;
    }

    fn state(&self) -> TaskState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn process(self: &Arc<Self>) {
        match self.state() {
            TaskState::Pending => {}
            TaskState::Cancelled => {
                // dropping the sender resolves the JoinHandle with Cancelled
                self.future.lock().unwrap_or_else(PoisonError::into_inner).take();
                self.join_tx.lock().unwrap_or_else(PoisonError::into_inner).take();
                return;
            }
            // stale wake-up from a trigger registered before completion
            TaskState::Done => return,
        }

        let mut fut_slot = self.future.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(mut fut) = fut_slot.take() else {
            return;
        };
        let waker = waker_ref(self);
        let context = &mut Context::from_waker(&waker);
        match fut.as_mut().poll(context) {
            Poll::Pending => *fut_slot = Some(fut),
            Poll::Ready(result) => {
                drop(fut_slot);
                *self.state.lock().unwrap_or_else(PoisonError::into_inner) = TaskState::Done;
                let tx = self
                    .join_tx
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                if let Some(tx) = tx {
                    // nobody waiting on the result is fine
                    let _ = tx.send(result);
                }
            }
        }
    }
}

impl ArcWake for Task {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        if arc_self.state() == TaskState::Pending {
            schedule(arc_self);
        }
    }
}

/// Handle to a spawned task. Awaiting it yields the task's result.
pub struct JoinHandle {
    name: String,
    task: Option<Arc<Task>>,
    join_rx: oneshot::Receiver<TbResult>,
}

impl JoinHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel();
        }
    }

    /// Non-blocking check used by the kernel's run loop.
    pub(crate) fn try_result(&mut self) -> Option<TbResult> {
        match self.join_rx.try_recv() {
            Ok(result) => result,
            Err(_) => Some(Err(TbError::Cancelled(self.name.clone()))),
        }
    }
}

impl Future for JoinHandle {
    type Output = TbResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.join_rx.poll_unpin(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(TbError::Cancelled(self.name.clone()))),
            Poll::Pending => Poll::Pending,
        }
    }
}
