use zoon::Task;
use zoon::futures_util::task::{LocalFutureObj, LocalSpawn, SpawnError};

/// Spawns onto the browser microtask queue through [`zoon::Task`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TaskSpawner;

impl LocalSpawn for TaskSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        Task::start(future);
        Ok(())
    }
}
