//! Manual run command

use crate::app::OutputFormat;
use crate::output::print_run_result;
use anyhow::Result;
use dbopt_core::error::exit_codes;
use dbopt_core::AppContext;

pub async fn run(ctx: &AppContext, format: OutputFormat) -> Result<i32> {
    let result = ctx.scheduler().trigger_manual().await;
    print_run_result(&result, format)?;

    Ok(if result.is_success() {
        exit_codes::SUCCESS
    } else {
        exit_codes::RUN_FAILED
    })
}
