use std::sync::Arc;
use std::thread;

use log::{debug, warn};
use parking_lot::Mutex;

pub type Job = Box<dyn FnOnce() + Send + 'static>;

// Runs jobs off the calling thread
pub trait Executor: Send + Sync {
    fn execute(&self, name: &str, job: Job);
}

// Spawns one named thread per job
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadExecutor;

impl Executor for ThreadExecutor {
    fn execute(&self, name: &str, job: Job) {
        // The job must run even if no thread can be spawned, otherwise
        // whoever waits for it would wait forever
        let slot = Arc::new(Mutex::new(Some(job)));
        let worker_slot = Arc::clone(&slot);
        let spawned = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                if let Some(job) = worker_slot.lock().take() {
                    job()
                }
            });
        match spawned {
            Ok(_) => debug!("Started {} thread", name),
            Err(e) => {
                warn!("Could not spawn {} thread: {}. Running inline", name, e);
                let job = slot.lock().take();
                if let Some(job) = job {
                    job()
                }
            }
        }
    }
}
