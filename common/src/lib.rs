pub mod apps;
pub mod coordinator;
pub mod engine;
pub mod protocol;
pub mod task;

pub use coordinator::{Coordinator, TaskNotFound};
pub use engine::{ihash, KeyValue, MapFn, MapReduce, ReduceFn};
pub use protocol::{
    DoneTaskArgs, DoneTaskReply, GetTaskReply, DONE_TASK_PATH, GET_TASK_PATH,
};
pub use task::{Assignment, Task, TaskId};
