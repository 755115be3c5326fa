use std::env;

use serde::{Deserialize, Serialize};

use crate::task::{Assignment, Task, TaskId};

/// Rutas HTTP de los dos métodos del protocolo.
pub const GET_TASK_PATH: &str = "/rpc/RPCServer.GetTask";
pub const DONE_TASK_PATH: &str = "/rpc/RPCServer.DoneTask";

/// URL base del coordinator.
/// - En Docker: COORDINATOR_URL=http://coordinator:8080
/// - Si no está definida, usa http://localhost:8080 (para pruebas locales)
pub fn coordinator_base_url() -> String {
    env::var("COORDINATOR_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

/// Respuesta de RPCServer.GetTask. El request va vacío.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTaskReply {
    #[serde(rename = "taskID")]
    pub task_id: TaskId,
    #[serde(rename = "nReduce")]
    pub n_reduce: u32,
    pub filename: String,
    pub assignment: Assignment,
}

/// Request de RPCServer.DoneTask. La respuesta va vacía.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoneTaskArgs {
    #[serde(rename = "taskID")]
    pub task_id: TaskId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoneTaskReply {}

impl From<Task> for GetTaskReply {
    fn from(task: Task) -> Self {
        GetTaskReply {
            task_id: task.id,
            n_reduce: task.n_reduce,
            filename: task.file,
            assignment: task.assignment,
        }
    }
}

impl From<GetTaskReply> for Task {
    fn from(reply: GetTaskReply) -> Self {
        Task {
            id: reply.task_id,
            assignment: reply.assignment,
            file: reply.filename,
            n_reduce: reply.n_reduce,
        }
    }
}
