mod export;
mod helpers;
mod task;
mod weight;

pub(crate) use export::{cmd_export, cmd_import};
pub(crate) use task::{cmd_task_add, cmd_task_done, cmd_task_list};
pub(crate) use weight::{cmd_weight_add, cmd_weight_list, cmd_weight_unit};
