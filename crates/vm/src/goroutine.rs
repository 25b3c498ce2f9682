//! Goroutines: one OS thread and one machine per `go` statement.

use crate::builtins;
use crate::error::RuntimeError;
use crate::instruction::{Instr, Item};
use crate::machine::{Machine, Shared};
use crate::waitgroup::Context;
use golite_common::{Builtin, CommandRef, Env, Value};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Bookkeeping for every goroutine spawned during one run.
#[derive(Default)]
pub(crate) struct Goroutines {
    next_id: AtomicU64,
    handles: Mutex<Vec<JoinHandle<()>>>,
    failures: Mutex<Vec<(u64, RuntimeError)>>,
}

impl Goroutines {
    /// Join every goroutine, including ones spawned by goroutines while
    /// joining.
    pub(crate) fn join_all(&self) {
        loop {
            let handles = std::mem::take(&mut *self.handles.lock());
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if handle.join().is_err() {
                    tracing::warn!("goroutine panicked");
                }
            }
        }
    }

    /// Join the goroutines whose threads have already ended, keeping the
    /// handle list proportional to the goroutines still running.
    fn reap_finished(&self) {
        let finished: Vec<_> = {
            let mut handles = self.handles.lock();
            let (done, running) = std::mem::take(&mut *handles)
                .into_iter()
                .partition(|handle: &JoinHandle<()>| handle.is_finished());
            *handles = running;
            done
        };
        for handle in finished {
            if handle.join().is_err() {
                tracing::warn!("goroutine panicked");
            }
        }
    }

    #[cfg(test)]
    fn pending_handles(&self) -> usize {
        self.handles.lock().len()
    }

    /// The earliest recorded failure.
    pub(crate) fn first_failure(&self) -> Option<(u64, RuntimeError)> {
        self.failures.lock().first().cloned()
    }

    fn record_failure(&self, id: u64, error: RuntimeError) {
        self.failures.lock().push((id, error));
    }
}

enum Task {
    Closure { body: CommandRef, env: Env },
    Builtin { builtin: Builtin, args: Vec<Value> },
}

/// Decrements the wait-group when the goroutine's thread ends, however it
/// ends.
struct Completion {
    shared: Arc<Shared>,
    id: u64,
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.shared.wait_group.finished();
        tracing::debug!(id = self.id, "goroutine finished");
    }
}

impl Machine {
    pub(crate) fn exec_go(&mut self, arity: usize) -> Result<(), RuntimeError> {
        let args = self.pop_args(arity)?;
        let callee = self.pop()?;
        spawn(&self.shared, callee, args)?;
        self.push(Value::Undefined);
        Ok(())
    }
}

/// Start `callee(args)` on a new thread and return its id.
pub(crate) fn spawn(
    shared: &Arc<Shared>,
    callee: Value,
    args: Vec<Value>,
) -> Result<u64, RuntimeError> {
    let task = match callee {
        Value::Closure(closure) => Task::Closure {
            body: closure.body.clone(),
            env: shared.globals.extend(&closure.params, args)?,
        },
        Value::Builtin(builtin) => {
            if args.len() != builtin.arity {
                return Err(RuntimeError::ArityMismatch {
                    expected: builtin.arity,
                    received: args.len(),
                });
            }
            Task::Builtin { builtin, args }
        }
        other => {
            return Err(RuntimeError::type_error(format!(
                "cannot start a goroutine on a value of type {}",
                other.type_name()
            )))
        }
    };

    shared.goroutines.reap_finished();
    let id = shared.goroutines.next_id.fetch_add(1, Ordering::Relaxed) + 1;
    shared.wait_group.started();
    let thread_shared = Arc::clone(shared);
    let spawned = thread::Builder::new()
        .name(format!("goroutine-{id}"))
        .spawn(move || run_task(thread_shared, id, task));
    match spawned {
        Ok(handle) => {
            shared.goroutines.handles.lock().push(handle);
            tracing::debug!(id, "goroutine spawned");
            Ok(id)
        }
        Err(err) => {
            shared.wait_group.abandoned();
            Err(RuntimeError::SpawnFailed {
                message: err.to_string(),
            })
        }
    }
}

fn run_task(shared: Arc<Shared>, id: u64, task: Task) {
    let _completion = Completion {
        shared: Arc::clone(&shared),
        id,
    };
    let result = match task {
        Task::Closure { body, env } => {
            let control = vec![Item::Instr(Instr::Mark), Item::Cmd(body)];
            Machine::new(Arc::clone(&shared), env, control)
                .in_goroutine()
                .run()
                .map(drop)
        }
        Task::Builtin { builtin, args } => {
            builtins::invoke(&shared, Context::Goroutine, &builtin, args).map(drop)
        }
    };
    if let Err(error) = result {
        tracing::warn!(id, %error, "goroutine failed");
        shared.goroutines.record_failure(id, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::builtin_env;
    use crate::config::VmConfig;
    use crate::output::BufferSink;
    use golite_common::command::{blk, call, lam, nam};
    use golite_common::Closure;

    fn shared(sink: &BufferSink) -> Arc<Shared> {
        Arc::new(Shared::new(
            VmConfig::default(),
            Arc::new(sink.clone()),
            builtin_env(),
        ))
    }

    fn closure(params: &[&str], body: CommandRef) -> Value {
        match &*lam(params, body) {
            golite_common::Command::Lam { prms, body } => Value::Closure(Arc::new(Closure {
                params: prms.clone(),
                body: body.clone(),
                env: builtin_env(),
            })),
            other => panic!("expected lam, got {other:?}"),
        }
    }

    #[test]
    fn goroutine_runs_closure_with_arguments() {
        let sink = BufferSink::new();
        let shared = shared(&sink);
        let f = closure(&["x"], blk(vec![call("print", vec![nam("x")])]));
        let id = spawn(&shared, f, vec![Value::Int(5)]).unwrap();
        assert_eq!(id, 1);
        shared.goroutines.join_all();
        assert_eq!(sink.lines(), vec!["5"]);
        assert_eq!(shared.wait_group.running(), 0);
        assert!(shared.goroutines.first_failure().is_none());
    }

    #[test]
    fn builtin_arity_fails_in_spawner() {
        let sink = BufferSink::new();
        let shared = shared(&sink);
        let print = builtin_env().lookup("print").unwrap();
        assert_eq!(
            spawn(&shared, print, vec![]),
            Err(RuntimeError::ArityMismatch {
                expected: 1,
                received: 0
            })
        );
        assert_eq!(shared.wait_group.running(), 0);
    }

    #[test]
    fn failure_is_recorded() {
        let sink = BufferSink::new();
        let shared = shared(&sink);
        let f = closure(&[], blk(vec![call("print", vec![nam("missing")])]));
        let id = spawn(&shared, f, vec![]).unwrap();
        shared.goroutines.join_all();
        assert_eq!(
            shared.goroutines.first_failure(),
            Some((
                id,
                RuntimeError::UnboundName {
                    name: "missing".into()
                }
            ))
        );
    }

    #[test]
    fn completion_counts_down() {
        let sink = BufferSink::new();
        let shared = shared(&sink);
        shared.wait_group.add(1).unwrap();
        let f = closure(&[], blk(vec![call("print", vec![nam("print")])]));
        spawn(&shared, f, vec![]).unwrap();
        assert_eq!(shared.wait_group.wait(), Ok(()));
        shared.goroutines.join_all();
        assert_eq!(sink.lines(), vec!["<builtin: print>"]);
    }

    #[test]
    fn finished_handles_are_reaped_on_spawn() {
        let sink = BufferSink::new();
        let shared = shared(&sink);
        let f = closure(&[], blk(vec![]));
        for _ in 0..50 {
            spawn(&shared, f.clone(), vec![]).unwrap();
        }
        while shared.wait_group.running() > 0 {
            std::thread::yield_now();
        }
        // The completion guard counts down before the thread exits.
        while shared.goroutines.handles.lock().iter().any(|h| !h.is_finished()) {
            std::thread::yield_now();
        }
        spawn(&shared, f, vec![]).unwrap();
        assert_eq!(shared.goroutines.pending_handles(), 1);
        shared.goroutines.join_all();
        assert_eq!(shared.goroutines.pending_handles(), 0);
    }

    #[test]
    fn goroutine_waiting_on_itself_deadlocks_after_close() {
        let sink = BufferSink::new();
        let shared = shared(&sink);
        shared.wait_group.add(1).unwrap();
        let f = closure(&[], blk(vec![call("waitGroupWait", vec![])]));
        let id = spawn(&shared, f, vec![]).unwrap();
        shared.wait_group.close();
        shared.goroutines.join_all();
        assert_eq!(
            shared.goroutines.first_failure(),
            Some((id, RuntimeError::Deadlock { counter: 1 }))
        );
        assert_eq!(shared.wait_group.counter(), 0);
    }
}
