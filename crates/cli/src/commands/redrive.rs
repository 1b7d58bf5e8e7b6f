use crate::commands::{open_pool, prepare, CommandFailure, CommandResult};
use foody_db::migrations;
use foody_db::repositories::SqlSuggestionQueue;

/// Makes dead-lettered suggestion requests visible again with a fresh
/// receive count.
pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("redrive") {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let queue = SqlSuggestionQueue::new(pool.clone(), config.queue.max_receive_count);
        let redriven = queue
            .redrive_dead_letters()
            .await
            .map_err(|error| ("queue_redrive", error.to_string(), 6u8))?;

        pool.close().await;
        Ok::<u64, CommandFailure>(redriven)
    });

    match result {
        Ok(redriven) => CommandResult::success(
            "redrive",
            format!("requeued {redriven} dead-lettered suggestion request(s)"),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("redrive", error_class, message, exit_code)
        }
    }
}
