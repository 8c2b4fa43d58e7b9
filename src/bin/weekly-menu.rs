use std::process::ExitCode;

use weekly_menu::MenuError;

fn main() -> ExitCode {
    match weekly_menu::app::run(std::env::args().skip(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<MenuError>() {
                Some(menu_err) => eprintln!("weekly-menu: {} failed: {}", menu_err.stage(), menu_err),
                None => eprintln!("weekly-menu: {err}"),
            }
            ExitCode::FAILURE
        }
    }
}
