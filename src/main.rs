//! studyrepo binary entry point.

use studyrepo::ui::output;

fn main() {
    if let Err(err) = studyrepo::cli::run() {
        output::error(format!("{:#}", err));
        std::process::exit(1);
    }
}
