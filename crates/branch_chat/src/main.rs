use std::io::{self, Write};
use std::sync::Arc;

use branch_chat::app::App;
use branch_chat::commands::HELP_TEXT;
use branch_chat::controller::ChatController;
use branch_chat::{providers, repl};
use rabbithole::{logging, EnvConfig};
use state_store::FileStateStore;
use tracing::info;

fn main() -> io::Result<()> {
    let config = EnvConfig::from_env();
    logging::init(&config);

    let provider = providers::provider_from_env(&config).map_err(io::Error::other)?;
    let profile = provider.profile();

    let cwd = std::env::current_dir()?;
    let state_path = config.state_path_or_default(&cwd);
    info!(path = %state_path.display(), provider = %profile.provider_id, "starting branch-chat");
    let store = Arc::new(FileStateStore::new(state_path));

    let controller = ChatController::new(provider, store, config.persist_debounce);
    let mut app = App::new(controller);

    let mut stdout = io::stdout();
    writeln!(
        stdout,
        "branch-chat ({} / {})\n{HELP_TEXT}",
        profile.provider_id, profile.model_id
    )?;

    let input = repl::spawn_stdin_reader()?;
    repl::run(&mut app, &input, &mut stdout)
}
