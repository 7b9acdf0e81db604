mod cli;
mod commands;

use onboard_buddy::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
