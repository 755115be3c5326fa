use anyhow::{bail, Result};
use common::{DoneTaskArgs, GetTaskReply, Task, TaskId, DONE_TASK_PATH, GET_TASK_PATH};
use reqwest::{Client, StatusCode};

use crate::worker::Delivery;

/// Cliente HTTP del coordinator. Cada llamada es un request/reply
/// independiente; solo viajan los campos primitivos de la tarea.
pub struct HttpDelivery {
    client: Client,
    base_url: String,
}

impl HttpDelivery {
    pub fn new(base_url: String) -> Self {
        HttpDelivery {
            client: Client::new(),
            base_url,
        }
    }
}

impl Delivery for HttpDelivery {
    async fn get_task(&self) -> Result<Task> {
        let reply: GetTaskReply = self
            .client
            .post(format!("{}{}", self.base_url, GET_TASK_PATH))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(Task::from(reply))
    }

    async fn done_task(&self, task_id: TaskId) -> Result<()> {
        let res = self
            .client
            .post(format!("{}{}", self.base_url, DONE_TASK_PATH))
            .json(&DoneTaskArgs { task_id })
            .send()
            .await?;

        if res.status() == StatusCode::NOT_FOUND {
            let msg = res.text().await.unwrap_or_default();
            bail!("ack rechazado: {msg}");
        }
        res.error_for_status()?;
        Ok(())
    }
}
