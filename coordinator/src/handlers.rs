use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use common::{
    Coordinator, DoneTaskArgs, DoneTaskReply, GetTaskReply, DONE_TASK_PATH, GET_TASK_PATH,
};
use tracing::debug;

pub fn build_router(coordinator: Coordinator) -> Router {
    Router::new()
        .route(GET_TASK_PATH, post(get_task))
        .route(DONE_TASK_PATH, post(done_task))
        .with_state(coordinator)
}

/* ---------------- handlers HTTP ---------------- */

// Entrega la siguiente tarea (o SNOOZE/ABORT). Nunca falla en esta capa.
async fn get_task(State(coordinator): State<Coordinator>) -> Json<GetTaskReply> {
    let task = coordinator.get_task();
    debug!("GetTask -> id={} {:?}", task.id, task.assignment);
    Json(GetTaskReply::from(task))
}

// Ack de una tarea. Un lease desconocido o ya reclamado da 404.
async fn done_task(
    State(coordinator): State<Coordinator>,
    Json(args): Json<DoneTaskArgs>,
) -> Result<Json<DoneTaskReply>, (StatusCode, String)> {
    match coordinator.done_task(args.task_id) {
        Ok(()) => Ok(Json(DoneTaskReply {})),
        Err(e) => Err((StatusCode::NOT_FOUND, e.to_string())),
    }
}
