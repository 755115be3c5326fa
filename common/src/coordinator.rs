use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::task::{Assignment, Task, TaskId};

pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(10);

/// DoneTask sobre un id desconocido, o cuyo lease ya fue reclamado por timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskNotFound(pub TaskId);

impl fmt::Display for TaskNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task {} not found", self.0)
    }
}

impl std::error::Error for TaskNotFound {}

/// Estado protegido por el lock: cola de despacho, leases abiertos y el
/// contador de tareas MAP sin ack (en cola o leased).
struct Inner {
    queue: VecDeque<Task>,
    leases: HashMap<TaskId, Task>,
    map_outstanding: u32,
}

/// Coordinator del job: reparte tareas, reclama leases vencidos y detecta
/// cuándo no queda trabajo. Clonar comparte el mismo estado.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Mutex<Inner>>,
    done: Arc<AtomicBool>,
    task_timeout: Duration,
}

impl Coordinator {
    /// Crea el coordinator: una tarea MAP por archivo (ids 1..=M) y después
    /// R tareas REDUCE (ids M+1..=M+R), cada una dueña de "mr-map-{k}".
    pub fn new(files: Vec<String>, n_reduce: u32) -> Self {
        let mut queue = VecDeque::with_capacity(files.len() + n_reduce as usize);
        let map_outstanding = files.len() as u32;

        let mut task_id: TaskId = 0;
        for file in files {
            task_id += 1;
            queue.push_back(Task {
                id: task_id,
                assignment: Assignment::Map,
                file,
                n_reduce,
            });
        }
        for k in 1..=n_reduce {
            task_id += 1;
            queue.push_back(Task {
                id: task_id,
                assignment: Assignment::Reduce,
                file: format!("mr-map-{k}"),
                n_reduce: k,
            });
        }

        // sin archivos y sin particiones no hay trabajo que repartir
        let done = queue.is_empty();

        Coordinator {
            inner: Arc::new(Mutex::new(Inner {
                queue,
                leases: HashMap::new(),
                map_outstanding,
            })),
            done: Arc::new(AtomicBool::new(done)),
            task_timeout: DEFAULT_TASK_TIMEOUT,
        }
    }

    /// Cambia el plazo antes de reasignar una tarea sin ack.
    pub fn with_timeout(mut self, task_timeout: Duration) -> Self {
        self.task_timeout = task_timeout;
        self
    }

    /// Entrega la siguiente tarea, o una directiva de control:
    /// - ABORT si ya no queda trabajo,
    /// - SNOOZE si la cola está vacía o el head es un REDUCE todavía
    ///   bloqueado por tareas MAP sin ack.
    ///
    /// La tarea devuelta es una copia; el lease queda abierto y un timer lo
    /// reclama si el ack no llega a tiempo. Debe llamarse dentro de un
    /// runtime de tokio.
    pub fn get_task(&self) -> Task {
        if self.done.load(Ordering::SeqCst) {
            return Task::control(Assignment::Abort);
        }

        let mut inner = self.inner.lock().unwrap();

        if inner.map_outstanding > 0
            && matches!(inner.queue.front(), Some(t) if t.assignment == Assignment::Reduce)
        {
            // la fase map todavía no cierra
            return Task::control(Assignment::Snooze);
        }
        let Some(task) = inner.queue.pop_front() else {
            return Task::control(Assignment::Snooze);
        };
        inner.leases.insert(task.id, task.clone());
        drop(inner);

        debug!("tarea {} ({:?}) asignada", task.id, task.assignment);

        let reclaimer = self.clone();
        let task_id = task.id;
        tokio::spawn(async move {
            sleep(reclaimer.task_timeout).await;
            reclaimer.reclaim(task_id);
        });

        task
    }

    /// Marca una tarea como terminada. Retirarla es definitivo: un segundo
    /// ack sobre el mismo id, o un ack tardío de un lease ya reclamado,
    /// devuelve TaskNotFound.
    pub fn done_task(&self, task_id: TaskId) -> Result<(), TaskNotFound> {
        let mut inner = self.inner.lock().unwrap();
        let Some(task) = inner.leases.remove(&task_id) else {
            return Err(TaskNotFound(task_id));
        };
        if task.assignment == Assignment::Map {
            inner.map_outstanding -= 1;
        }
        if inner.queue.is_empty() && inner.leases.is_empty() {
            self.done.store(true, Ordering::SeqCst);
        }
        drop(inner);

        debug!("tarea {} retirada", task_id);
        Ok(())
    }

    /// Lectura sin lock del latch de terminación.
    pub fn done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// Vence el lease si sigue abierto y reencola la tarea. Los MAP vuelven
    /// al frente de la cola porque bloquean la fase reduce; los REDUCE van
    /// al final. Si el ack llegó antes no hay lease y no pasa nada.
    fn reclaim(&self, task_id: TaskId) {
        let mut inner = self.inner.lock().unwrap();
        let Some(task) = inner.leases.remove(&task_id) else {
            return;
        };
        if task.assignment == Assignment::Map {
            inner.queue.push_front(task);
        } else {
            inner.queue.push_back(task);
        }
        drop(inner);

        warn!("lease de la tarea {} vencido, reencolando", task_id);
    }
}
