use clap::Parser;
use miette::Result;
use warehouse::cli::commands;
use warehouse::cli::helpers::open_controller;
use warehouse::cli::{Cli, Commands};
use warehouse::core::{logging, Config};
use warehouse::entities::MovementKind;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    // Install miette's fancy error handler for diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    let config = Config::load(global.config.as_deref())?;
    logging::init(config.log_level());

    let controller = open_controller(&global, &config)?;
    let result = match cli.command {
        Commands::Register(args) => commands::register::run(args, &controller, &global),
        Commands::Search(args) => commands::search::run(args, &controller, &global),
        Commands::Find(args) => commands::find::run(args, &controller, &global),
        Commands::Show(args) => commands::show::run(args, &controller, &global),
        Commands::In(args) => {
            commands::stock::run(args, MovementKind::Replenishment, &controller, &global)
        }
        Commands::Out(args) => {
            commands::stock::run(args, MovementKind::Withdrawal, &controller, &global)
        }
        Commands::History(args) => commands::history::run(args, &controller, &global),
        Commands::List(cmd) => commands::list::run(cmd, &controller, &global),
    };
    controller.close();
    result
}
