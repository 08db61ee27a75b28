use std::collections::BTreeSet;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;

use log::{debug, error, trace, warn};
use procmat_descriptors::package::PackageDesc;
use procmat_descriptors::{PackageError, deserialize_xml};

use crate::rendering::backend::{RenderBackend, RenderCallbacks, RenderMode, RenderOptions, RunMode};
use crate::rendering::common::types::GraphJob;
use crate::rendering::worker::synthesis::synthesize;
use crate::util::ids::RenderUid;

struct Batch {
    uid: RenderUid,
    mode: RenderMode,
    jobs: Vec<GraphJob>,
}

struct WorkerState {
    last_uid: u32,
    pending: BTreeSet<RenderUid>,
    callbacks: Option<Arc<dyn RenderCallbacks>>,
    options: RenderOptions,
}

struct WorkerShared {
    state: Mutex<WorkerState>,
    batch_done: Condvar,
}

impl WorkerShared {
    fn lock(&self) -> MutexGuard<'_, WorkerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Renders batches on the "Procedural Renderer" thread, see the module docs.
pub struct WorkerRenderer {
    shared: Arc<WorkerShared>,
    staged: Mutex<Vec<GraphJob>>,
    sender: Mutex<Option<Sender<Batch>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerRenderer {
    pub fn new() -> std::io::Result<Self> {
        let shared = Arc::new(WorkerShared {
            state: Mutex::new(WorkerState {
                last_uid: 0,
                pending: BTreeSet::new(),
                callbacks: None,
                options: RenderOptions::UNLIMITED,
            }),
            batch_done: Condvar::new(),
        });

        let (sender, receiver) = channel();
        let worker_shared = shared.clone();
        let thread = std::thread::Builder::new()
            .name("Procedural Renderer".into())
            .spawn(move || run_worker(worker_shared, receiver))?;

        Ok(Self {
            shared,
            staged: Mutex::new(Vec::new()),
            sender: Mutex::new(Some(sender)),
            thread: Mutex::new(Some(thread)),
        })
    }

    pub fn options(&self) -> RenderOptions {
        self.shared.lock().options
    }

    fn next_uid(state: &mut WorkerState) -> RenderUid {
        state.last_uid = state.last_uid.wrapping_add(1);
        if state.last_uid == 0 {
            state.last_uid = 1;
        }
        RenderUid(state.last_uid)
    }

    fn wait_for(&self, uid: RenderUid) {
        let mut state = self.shared.lock();
        while state.pending.contains(&uid) {
            state = self
                .shared
                .batch_done
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }
}

fn run_worker(shared: Arc<WorkerShared>, receiver: Receiver<Batch>) {
    for batch in receiver {
        let callbacks = shared.lock().callbacks.clone();
        trace!("Rendering batch {} with {} graph(s)", batch.uid, batch.jobs.len());

        match callbacks {
            Some(callbacks) => {
                for job in &batch.jobs {
                    for output in &job.outputs {
                        let result = synthesize(job, output);
                        callbacks.output_computed(batch.uid, batch.mode, job.graph, output.index, result);
                    }
                }
            }
            None => warn!("Batch {} finished without registered callbacks", batch.uid),
        }

        shared.lock().pending.remove(&batch.uid);
        shared.batch_done.notify_all();
    }

    debug!("Procedural Renderer: channel closed, shutting down");
}

impl RenderBackend for WorkerRenderer {
    fn load_package(&self, data: &[u8]) -> Result<PackageDesc, PackageError> {
        let package: PackageDesc = deserialize_xml(data)?;
        package.validate()?;
        Ok(package)
    }

    fn set_callbacks(&self, callbacks: Arc<dyn RenderCallbacks>) {
        self.shared.lock().callbacks = Some(callbacks);
    }

    fn set_options(&self, options: RenderOptions) {
        debug!("Render options: {:?}", options);
        self.shared.lock().options = options;
    }

    fn push(&self, job: GraphJob) {
        self.staged
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(job);
    }

    fn run(&self, run_mode: RunMode, mode: RenderMode) -> RenderUid {
        let jobs = std::mem::take(&mut *self.staged.lock().unwrap_or_else(|poisoned| poisoned.into_inner()));
        if jobs.is_empty() {
            return RenderUid::INVALID;
        }

        let uid = {
            let mut state = self.shared.lock();
            let uid = Self::next_uid(&mut state);
            state.pending.insert(uid);
            uid
        };

        let sent = match self
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
        {
            Some(sender) => sender.send(Batch { uid, mode, jobs }).is_ok(),
            None => false,
        };

        if !sent {
            error!("Procedural Renderer is gone, dropping batch {}", uid);
            self.shared.lock().pending.remove(&uid);
            return RenderUid::INVALID;
        }

        if run_mode == RunMode::Synchronous {
            self.wait_for(uid);
        }

        uid
    }

    fn is_pending(&self, uid: RenderUid) -> bool {
        self.shared.lock().pending.contains(&uid)
    }

    fn flush(&self) {
        let mut state = self.shared.lock();
        while !state.pending.is_empty() {
            state = self
                .shared
                .batch_done
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }
}

impl Drop for WorkerRenderer {
    fn drop(&mut self) {
        // closing the channel ends the worker loop once the remaining batches are done
        self.sender
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        if let Some(thread) = self
            .thread
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        {
            if thread.join().is_err() {
                error!("Procedural Renderer thread panicked");
            }
        }
    }
}
