use clap::Parser;

use workfarm::args::NodeManagerArgs;
use workfarm::error::AppResult;
use workfarm::logger::init_logging;

fn main() -> AppResult<()> {
    let args = NodeManagerArgs::parse();
    init_logging(args.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(workfarm::manager::run(args))
}
