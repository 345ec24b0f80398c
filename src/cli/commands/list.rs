//! `ciphercell list`: display items in a table.

use crate::cli::output;
use crate::cli::{unlock, Cli, Context};
use crate::errors::Result;

/// Execute the `list` command.
pub async fn execute(cli: &Cli, search: Option<&str>) -> Result<()> {
    let ctx = Context::load(cli)?;
    let session = ctx.open_session().await?;
    unlock(&session).await?;

    let items = match search {
        Some(query) => session.search(query).await?,
        None => session.items().await?,
    };
    session.logout().await;

    output::info(&format!("{} item(s)", items.len()));
    output::print_items_table(&items);

    Ok(())
}
