use std::time::Duration;

use anyhow::Result;
use common::{Assignment, MapReduce, Task, TaskId};
use tokio::time::sleep;
use tracing::{info, warn};

pub const DEFAULT_SNOOZE_TIME: Duration = Duration::from_secs(1);

/// Contrato del transporte visto desde el worker: pedir una tarea y
/// ackear una tarea terminada.
pub trait Delivery {
    async fn get_task(&self) -> Result<Task>;
    async fn done_task(&self, task_id: TaskId) -> Result<()>;
}

/// Loop de polling de un solo hilo: pide una tarea, la despacha por tipo
/// y vuelve a empezar.
pub struct Worker<D> {
    engine: MapReduce,
    delivery: D,
    snooze_time: Duration,
}

impl<D: Delivery> Worker<D> {
    pub fn new(engine: MapReduce, delivery: D) -> Self {
        Worker {
            engine,
            delivery,
            snooze_time: DEFAULT_SNOOZE_TIME,
        }
    }

    /// Cuánto dormir cuando el coordinator responde SNOOZE.
    pub fn with_snooze(mut self, snooze_time: Duration) -> Self {
        self.snooze_time = snooze_time;
        self
    }

    /// Corre hasta recibir ABORT. Un error de transporte en get_task
    /// termina el loop; un ack fallido solo salta la persistencia de esa
    /// iteración.
    pub async fn run(&self) -> Result<()> {
        loop {
            let task = self.delivery.get_task().await?;
            match task.assignment {
                Assignment::Map => self.run_map(&task).await,
                Assignment::Reduce => self.run_reduce(&task).await,
                Assignment::Snooze => sleep(self.snooze_time).await,
                Assignment::Abort => {
                    info!("abort: no queda trabajo, saliendo");
                    return Ok(());
                }
            }
        }
    }

    async fn run_map(&self, task: &Task) {
        let partitions = match self.engine.map_and_shuffle(&task.file, task.n_reduce) {
            Ok(partitions) => partitions,
            Err(e) => {
                warn!("no se pudo leer {}: {e}", task.file);
                return;
            }
        };

        // el ack va antes del commit: si falla, no se persiste nada
        if let Err(e) = self.delivery.done_task(task.id).await {
            warn!("ack de la tarea {} falló: {e}", task.id);
            return;
        }
        self.engine.store_map(&partitions);
    }

    async fn run_reduce(&self, task: &Task) {
        let records = match self.engine.read_map(&task.file) {
            Ok(records) => records,
            Err(e) => {
                warn!("no se pudo leer la partición {}: {e}", task.file);
                return;
            }
        };
        let output = self.engine.reduce(records);

        if let Err(e) = self.delivery.done_task(task.id).await {
            warn!("ack de la tarea {} falló: {e}", task.id);
            return;
        }
        if let Err(e) = self.engine.store_reduce(task.n_reduce, &output) {
            warn!("no se pudo escribir mr-out-{}: {e}", task.n_reduce);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::fs;
    use std::sync::Mutex;

    use anyhow::bail;
    use common::{apps, Coordinator};

    use super::*;

    /// Entrega un guion fijo de tareas y registra los acks recibidos.
    struct ScriptedDelivery {
        tasks: Mutex<VecDeque<Task>>,
        acks: Mutex<Vec<TaskId>>,
        fail_acks: bool,
    }

    impl ScriptedDelivery {
        fn new(tasks: Vec<Task>) -> Self {
            ScriptedDelivery {
                tasks: Mutex::new(tasks.into()),
                acks: Mutex::new(Vec::new()),
                fail_acks: false,
            }
        }

        fn failing_acks(tasks: Vec<Task>) -> Self {
            ScriptedDelivery {
                fail_acks: true,
                ..ScriptedDelivery::new(tasks)
            }
        }
    }

    impl Delivery for ScriptedDelivery {
        async fn get_task(&self) -> Result<Task> {
            let mut tasks = self.tasks.lock().unwrap();
            Ok(tasks
                .pop_front()
                .unwrap_or_else(|| Task::control(Assignment::Abort)))
        }

        async fn done_task(&self, task_id: TaskId) -> Result<()> {
            if self.fail_acks {
                bail!("task {task_id} not found");
            }
            self.acks.lock().unwrap().push(task_id);
            Ok(())
        }
    }

    /// Adaptador en proceso: el worker habla directo con el coordinator.
    struct LocalDelivery {
        coordinator: Coordinator,
    }

    impl Delivery for LocalDelivery {
        async fn get_task(&self) -> Result<Task> {
            Ok(self.coordinator.get_task())
        }

        async fn done_task(&self, task_id: TaskId) -> Result<()> {
            self.coordinator.done_task(task_id)?;
            Ok(())
        }
    }

    fn map_task(id: TaskId, file: &str, n_reduce: u32) -> Task {
        Task {
            id,
            assignment: Assignment::Map,
            file: file.to_string(),
            n_reduce,
        }
    }

    fn wordcount_engine(dir: &std::path::Path) -> MapReduce {
        let (mapf, reducef) = apps::lookup("wordcount").unwrap();
        MapReduce::new(mapf, reducef).with_dir(dir)
    }

    #[tokio::test]
    async fn map_task_acks_then_persists() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("in.txt"), "foo bar").unwrap();

        let delivery = ScriptedDelivery::new(vec![map_task(1, "in.txt", 2)]);
        let worker = Worker::new(wordcount_engine(dir.path()), delivery);
        worker.run().await.unwrap();

        assert_eq!(*worker.delivery.acks.lock().unwrap(), vec![1]);
        assert!(dir.path().join("mr-map-1").exists());
        assert!(dir.path().join("mr-map-2").exists());
    }

    #[tokio::test]
    async fn failed_ack_skips_persistence() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("in.txt"), "foo bar").unwrap();

        let delivery = ScriptedDelivery::failing_acks(vec![map_task(1, "in.txt", 2)]);
        let worker = Worker::new(wordcount_engine(dir.path()), delivery);
        worker.run().await.unwrap();

        assert!(!dir.path().join("mr-map-1").exists());
        assert!(!dir.path().join("mr-map-2").exists());
    }

    #[tokio::test]
    async fn unreadable_input_is_skipped_without_ack() {
        let dir = tempfile::tempdir().unwrap();

        let delivery = ScriptedDelivery::new(vec![map_task(1, "no-existe.txt", 2)]);
        let worker = Worker::new(wordcount_engine(dir.path()), delivery);
        worker.run().await.unwrap();

        assert!(worker.delivery.acks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_partition_leaves_reduce_unacked() {
        let dir = tempfile::tempdir().unwrap();

        let reduce = Task {
            id: 2,
            assignment: Assignment::Reduce,
            file: "mr-map-1".to_string(),
            n_reduce: 1,
        };
        let delivery = ScriptedDelivery::new(vec![reduce]);
        let worker = Worker::new(wordcount_engine(dir.path()), delivery);
        worker.run().await.unwrap();

        assert!(worker.delivery.acks.lock().unwrap().is_empty());
        assert!(!dir.path().join("mr-out-1").exists());
    }

    #[tokio::test]
    async fn wordcount_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "foo bar").unwrap();
        fs::write(dir.path().join("b.txt"), "bar baz").unwrap();

        let files = vec![
            dir.path().join("a.txt").to_string_lossy().to_string(),
            dir.path().join("b.txt").to_string_lossy().to_string(),
        ];
        let coordinator = Coordinator::new(files, 2);

        let delivery = LocalDelivery {
            coordinator: coordinator.clone(),
        };
        let worker = Worker::new(wordcount_engine(dir.path()), delivery);
        worker.run().await.unwrap();

        assert!(coordinator.done());

        // "bar" y "baz" caen en la partición 1, "foo" en la 2
        let out1 = fs::read_to_string(dir.path().join("mr-out-1")).unwrap();
        let out2 = fs::read_to_string(dir.path().join("mr-out-2")).unwrap();
        assert_eq!(out1, "bar 2\nbaz 1\n");
        assert_eq!(out2, "foo 1\n");
    }
}
